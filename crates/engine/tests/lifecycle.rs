use std::sync::Arc;

use stonks_engine::{
    BadgeAction, CycleOutcome, Engine, EventSource, IngestOutcome, LeaderboardPage,
    PostDeleteEvent, PostSubmitEvent, Settings, SubmittedPost,
};
use stonks_primitives::{CommunityId, PostId, UserId};
use stonks_storage::{RedbScoreStore, ScoreStore};
use stonks_test_utils::{BadgeCall, ManualClock, MockPlatform};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

fn submission(post: &PostId, author: &UserId, created_at: u64) -> PostSubmitEvent {
    PostSubmitEvent {
        post: Some(SubmittedPost {
            id: post.clone(),
            score: 1,
            created_at,
        }),
        author: Some(author.clone()),
        community: Some(CommunityId::from("stonks")),
    }
}

#[tokio::test]
async fn submissions_batches_and_restart() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stonks.redb");

    let platform = Arc::new(MockPlatform::new("stonks"));
    let alice = platform.add_user("t2_alice", "alice");
    let bob = platform.add_user("t2_bob", "bob");
    let settings = Settings {
        accepting_new_submissions: true,
        ..Default::default()
    };

    {
        let store = RedbScoreStore::open(&path).unwrap();
        let engine = Engine::new(store, platform.clone(), ManualClock::new(1_000));

        let a1 = platform.add_post("t3_a1", &alice, 1);
        let a2 = platform.add_post("t3_a2", &alice, 1);
        let b1 = platform.add_post("t3_b1", &bob, 1);
        for (post, author, at) in [(&a1, &alice, 10), (&b1, &bob, 20), (&a2, &alice, 30)] {
            let outcome = engine
                .on_post_submit(&settings, submission(post, author, at))
                .await
                .unwrap();
            assert!(matches!(
                outcome,
                IngestOutcome::Updated(CycleOutcome::Updated { shares: 0, .. })
            ));
        }

        platform.set_score(&a1, 120);
        platform.set_score(&a2, 35);
        platform.set_score(&b1, 60);
        engine.clock().advance(60_000);

        let report = engine.run_batch(&settings).await;
        assert_eq!(report.queued, 2);
        assert_eq!(report.updated, 2);
        assert!(report.failed.is_empty());

        assert_eq!(platform.badge(&alice).unwrap().text, ":stonks: 15 shares");
        assert_eq!(platform.badge(&bob).unwrap().text, ":stonks: 6 shares");

        // Scores dropping on the platform never lower what was credited.
        platform.set_score(&a1, 3);
        engine.clock().advance(60_000);
        engine.run_batch(&settings).await;
        assert_eq!(engine.scores().shares(&alice, 0), 15);
    }

    // Reopen: everything survives.
    let store = RedbScoreStore::open(&path).unwrap();
    let engine = Engine::new(store, platform.clone(), ManualClock::new(500_000));
    assert_eq!(engine.scores().store().first_seen(&alice).unwrap(), Some(10));

    let board = engine.leaderboard(settings.leaderboard_min_score);
    let ranked: Vec<_> = board.iter().map(|e| (e.rank, e.display_name.as_str(), e.shares)).collect();
    assert_eq!(ranked, vec![(1, "alice", 15), (2, "bob", 6)]);

    let page = LeaderboardPage::paginate(&board, 1, settings.leaderboard_page_size);
    assert_eq!(page.max_page, 1);
    assert_eq!(page.entries.len(), 2);

    // Bob deletes his only post: shares and badge go away.
    let b1 = PostId::from("t3_b1");
    platform.update_post(&b1, |post| {
        post.author = None;
        post.deleted = true;
    });
    platform.clear_calls();
    let outcome = engine
        .on_post_delete(
            &settings,
            PostDeleteEvent {
                author: Some(bob.clone()),
                community: Some(CommunityId::from("stonks")),
                source: EventSource::User,
            },
        )
        .await
        .unwrap();
    assert_eq!(
        outcome,
        IngestOutcome::Updated(CycleOutcome::Updated {
            shares: 0,
            badge: BadgeAction::Remove
        })
    );
    assert_eq!(
        platform.calls(),
        vec![BadgeCall::Remove(bob.clone(), CommunityId::from("stonks"))]
    );
    assert_eq!(engine.leaderboard(1).len(), 1);
}

#[tokio::test]
async fn foreign_badges_are_left_alone() {
    init_tracing();
    let store = Arc::new(stonks_storage::MemoryScoreStore::new());
    let platform = Arc::new(MockPlatform::new("stonks"));
    let engine = Engine::new(store.clone(), platform.clone(), ManualClock::new(5));

    let user = platform.add_user("t2_mod", "moddy");
    let post = platform.add_post("t3_1", &user, 90);
    store.mark_first_seen(&user, 1).unwrap();
    store.enqueue(&user, 1).unwrap();
    store.record_post(&user, &post, 0).unwrap();
    platform.put_badge(&user, "Moderator", Some("mod"));

    let report = engine.run_batch(&Settings::default()).await;
    assert_eq!(report.updated, 1);
    assert_eq!(platform.badge(&user).unwrap().text, "Moderator");
    assert_eq!(engine.scores().shares(&user, 0), 9);
    assert_eq!(store.queue_position(&user).unwrap(), Some(5));

    let overwrite = Settings {
        badge_overwrite: true,
        ..Default::default()
    };
    engine.run_batch(&overwrite).await;
    assert_eq!(platform.badge(&user).unwrap().text, ":stonks: 9 shares");
}
