//! Opaque platform identifiers.

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, From,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

string_id!(
    /// Author of tracked content.
    UserId
);

string_id!(
    /// A piece of user-submitted content whose score is tracked.
    PostId
);

string_id!(
    /// Community the badge lives in.
    CommunityId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_ordering() {
        let a = UserId::from("t2_a");
        let b = UserId::new(String::from("t2_b"));

        assert_eq!(a.to_string(), "t2_a");
        assert!(a < b);
        assert_eq!(b.as_str(), "t2_b");
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = PostId::from("t3_xyz");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"t3_xyz\"");

        let back: PostId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
