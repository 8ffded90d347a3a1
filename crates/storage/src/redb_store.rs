//! redb-based score store.
//!
//! This module provides [`RedbScoreStore`], a persistent score store
//! backed by the redb embedded database.

use std::collections::BTreeMap;
use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};
use stonks_primitives::{PostId, RankedShares, Score, ShareRecord, Shares, Timestamp, UserId};
use tracing::debug;

use crate::{ScoreStore, StoreError, StoreResult, rank_order};

/// Key: (owner, post). Value: stored score.
const POSTS_TABLE: TableDefinition<(&str, &str), i64> = TableDefinition::new("posts");

/// Key: user. Value: first-seen timestamp.
const FIRST_SEEN_TABLE: TableDefinition<&str, u64> = TableDefinition::new("user_first_seen");

/// Key: user. Value: queue timestamp.
const QUEUE_TABLE: TableDefinition<&str, u64> = TableDefinition::new("user_queue");

/// Key: (queue timestamp, user). Secondary index giving queue order.
const QUEUE_ORDER_TABLE: TableDefinition<(u64, &str), ()> =
    TableDefinition::new("user_queue_order");

/// Key: user. Value: postcard-encoded [`ShareRecord`].
const SHARES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("shares");

/// redb-based score store.
///
/// Every write runs in its own transaction. Thread-safe for concurrent
/// reads and writes.
pub struct RedbScoreStore {
    db: Database,
}

impl RedbScoreStore {
    /// Open or create a score store at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = Database::create(path)?;

        // Create every table up front so read transactions never miss one.
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(POSTS_TABLE)?;
            let _ = write_txn.open_table(FIRST_SEEN_TABLE)?;
            let _ = write_txn.open_table(QUEUE_TABLE)?;
            let _ = write_txn.open_table(QUEUE_ORDER_TABLE)?;
            let _ = write_txn.open_table(SHARES_TABLE)?;
        }
        write_txn.commit()?;

        debug!("Opened redb score store");
        Ok(Self { db })
    }
}

fn encode_record(record: &ShareRecord) -> StoreResult<Vec<u8>> {
    postcard::to_allocvec(record).map_err(|e| StoreError::Decode(e.to_string()))
}

fn decode_record(bytes: &[u8]) -> StoreResult<ShareRecord> {
    postcard::from_bytes(bytes).map_err(|e| StoreError::Decode(e.to_string()))
}

impl ScoreStore for RedbScoreStore {
    fn record_post(&self, owner: &UserId, post: &PostId, score: Score) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(POSTS_TABLE)?;
            table.insert((owner.as_str(), post.as_str()), score)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn record_posts(&self, owner: &UserId, posts: &BTreeMap<PostId, Score>) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(POSTS_TABLE)?;
            for (post, score) in posts {
                table.insert((owner.as_str(), post.as_str()), *score)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    fn post_score(&self, owner: &UserId, post: &PostId) -> StoreResult<Option<Score>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(POSTS_TABLE)?;
        Ok(table
            .get((owner.as_str(), post.as_str()))?
            .map(|score| score.value()))
    }

    fn tracked_posts(&self, owner: &UserId) -> StoreResult<BTreeMap<PostId, Score>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(POSTS_TABLE)?;

        let mut posts = BTreeMap::new();
        for entry in table.range((owner.as_str(), "")..)? {
            let (key, score) = entry?;
            let (entry_owner, post) = key.value();
            if entry_owner != owner.as_str() {
                break;
            }
            posts.insert(PostId::from(post), score.value());
        }
        Ok(posts)
    }

    fn first_seen(&self, user: &UserId) -> StoreResult<Option<Timestamp>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(FIRST_SEEN_TABLE)?;
        Ok(table.get(user.as_str())?.map(|at| at.value()))
    }

    fn mark_first_seen(&self, user: &UserId, at: Timestamp) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(FIRST_SEEN_TABLE)?;
            let exists = table.get(user.as_str())?.is_some();
            if !exists {
                table.insert(user.as_str(), at)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    fn enqueue(&self, user: &UserId, at: Timestamp) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut queue = write_txn.open_table(QUEUE_TABLE)?;
            let mut order = write_txn.open_table(QUEUE_ORDER_TABLE)?;

            let previous = queue.insert(user.as_str(), at)?.map(|old| old.value());
            if let Some(previous) = previous {
                order.remove((previous, user.as_str()))?;
            }
            order.insert((at, user.as_str()), ())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn queue_position(&self, user: &UserId) -> StoreResult<Option<Timestamp>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(QUEUE_TABLE)?;
        Ok(table.get(user.as_str())?.map(|at| at.value()))
    }

    fn queue_entries(&self) -> StoreResult<Vec<(UserId, Timestamp)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(QUEUE_ORDER_TABLE)?;

        let mut entries = Vec::new();
        for entry in table.iter()? {
            let (key, _) = entry?;
            let (at, user) = key.value();
            entries.push((UserId::from(user), at));
        }
        Ok(entries)
    }

    fn set_shares(&self, user: &UserId, display_name: &str, shares: Shares) -> StoreResult<()> {
        let bytes = encode_record(&ShareRecord {
            display_name: display_name.to_owned(),
            shares,
        })?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SHARES_TABLE)?;
            table.insert(user.as_str(), bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn shares(&self, user: &UserId) -> StoreResult<Option<ShareRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(SHARES_TABLE)?;
        match table.get(user.as_str())? {
            Some(bytes) => Ok(Some(decode_record(bytes.value())?)),
            None => Ok(None),
        }
    }

    fn ranked_shares(&self, min_shares: Shares) -> StoreResult<Vec<RankedShares>> {
        let read_txn = self.db.begin_read()?;
        let shares = read_txn.open_table(SHARES_TABLE)?;
        let first_seen = read_txn.open_table(FIRST_SEEN_TABLE)?;

        let mut rows = Vec::new();
        for entry in shares.iter()? {
            let (user, bytes) = entry?;
            let record = decode_record(bytes.value())?;
            if record.shares < min_shares {
                continue;
            }
            let user = user.value();
            let seen = first_seen.get(user)?.map(|at| at.value());
            rows.push((
                RankedShares {
                    user_id: UserId::from(user),
                    display_name: record.display_name,
                    shares: record.shares,
                },
                seen,
            ));
        }

        rank_order(&mut rows);
        Ok(rows.into_iter().map(|(row, _)| row).collect())
    }
}

impl From<redb::DatabaseError> for StoreError {
    fn from(err: redb::DatabaseError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(err: redb::TransactionError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<redb::TableError> for StoreError {
    fn from(err: redb::TableError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(err: redb::StorageError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(err: redb::CommitError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}
