//! Presence tracking scenarios: multi-session aggregation, snapshot
//! broadcasting, and the client-side cache

use integration_tests::TestWorld;
use parley_cache::SyncChannel;
use parley_core::Snowflake;
use parley_sync::{PresenceBroadcaster, PresenceChange, PresenceRegistry};
use std::sync::Arc;

const ALICE: Snowflake = Snowflake::new(11);
const BOB: Snowflake = Snowflake::new(22);

fn presence_snapshot_count(world: &TestWorld) -> usize {
    world
        .transport
        .published_count(|channel, _| matches!(channel, SyncChannel::Presence))
}

#[tokio::test]
async fn test_two_sessions_one_user_stays_online_until_last_close() {
    let world = TestWorld::new();
    let registry = Arc::new(PresenceRegistry::new());
    let broadcaster = PresenceBroadcaster::new(registry.clone(), world.transport.clone());

    let mut observer = world.client(BOB);

    // First session: transition, broadcast
    let change = broadcaster.session_connected(ALICE, "s1").await;
    assert_eq!(change, PresenceChange::CameOnline);

    // Second session: no transition, no broadcast
    let change = broadcaster.session_connected(ALICE, "s2").await;
    assert_eq!(change, PresenceChange::Unchanged);
    assert_eq!(presence_snapshot_count(&world), 1);

    observer.drain().await;
    assert!(observer.client.is_user_active(ALICE));

    // Closing one of two sessions keeps the user online
    broadcaster.session_disconnected(ALICE, "s1").await;
    observer.drain().await;
    assert!(observer.client.is_user_active(ALICE));
    assert_eq!(presence_snapshot_count(&world), 1);

    // Closing the last session takes them offline and broadcasts
    broadcaster.session_disconnected(ALICE, "s2").await;
    observer.drain().await;
    assert!(!observer.client.is_user_active(ALICE));
    assert_eq!(presence_snapshot_count(&world), 2);
}

#[tokio::test]
async fn test_snapshots_are_full_sets_not_diffs() {
    let world = TestWorld::new();
    let registry = Arc::new(PresenceRegistry::new());
    let broadcaster = PresenceBroadcaster::new(registry, world.transport.clone());
    let mut observer = world.client(ALICE);

    broadcaster.session_connected(ALICE, "a1").await;
    broadcaster.session_connected(BOB, "b1").await;
    broadcaster.session_disconnected(ALICE, "a1").await;

    // Each published snapshot is self-contained; the last one alone
    // determines the observer's state
    observer.drain().await;
    assert!(!observer.client.is_user_active(ALICE));
    assert!(observer.client.is_user_active(BOB));
}

#[tokio::test]
async fn test_duplicate_disconnect_signals_do_not_rebroadcast() {
    let world = TestWorld::new();
    let registry = Arc::new(PresenceRegistry::new());
    let broadcaster = PresenceBroadcaster::new(registry, world.transport.clone());

    broadcaster.session_connected(ALICE, "s1").await;
    broadcaster.session_disconnected(ALICE, "s1").await;
    assert_eq!(presence_snapshot_count(&world), 2);

    // The transport may re-deliver a disconnect; the registry absorbs it
    let change = broadcaster.session_disconnected(ALICE, "s1").await;
    assert_eq!(change, PresenceChange::Unchanged);
    assert_eq!(presence_snapshot_count(&world), 2);
}

#[tokio::test]
async fn test_late_observer_catches_up_on_next_transition() {
    let world = TestWorld::new();
    let registry = Arc::new(PresenceRegistry::new());
    let broadcaster = PresenceBroadcaster::new(registry, world.transport.clone());

    // Alice connects before the observer exists; that snapshot is lost
    broadcaster.session_connected(ALICE, "a1").await;

    let mut observer = world.client(BOB);
    observer.drain().await;
    assert!(!observer.client.is_user_active(ALICE));

    // The next transition carries the full set, healing the gap
    broadcaster.session_connected(BOB, "b1").await;
    observer.drain().await;
    assert!(observer.client.is_user_active(ALICE));
    assert!(observer.client.is_user_active(BOB));
}
