//! End-to-end conversation synchronization scenarios over the in-memory
//! store and transport fakes

use integration_tests::TestWorld;
use parley_cache::{ReceivedMessage, SyncChannel};
use parley_core::{MessageBody, Snowflake, SyncEvent};

const ALICE: Snowflake = Snowflake::new(11);
const BOB: Snowflake = Snowflake::new(22);
const MALLORY: Snowflake = Snowflake::new(33);

#[tokio::test]
async fn test_send_is_applied_locally_and_echo_deduplicated() {
    let world = TestWorld::new();
    let conv = world.direct_conversation(ALICE, BOB);
    let mut alice = world.client(ALICE);

    alice.client.open_conversation(conv).await.unwrap();

    let sent = alice
        .client
        .send_message(conv, MessageBody::text("hello bob"))
        .await
        .unwrap();

    // Applied optimistically, before any event delivery
    let local = alice.client.messages(conv).unwrap();
    assert_eq!(local.len(), 1);
    assert_eq!(local[0].id, sent.id);

    // The echoed create event is a duplicate and changes nothing
    alice.drain().await;
    assert_eq!(alice.client.messages(conv).unwrap().len(), 1);
}

#[tokio::test]
async fn test_message_propagates_to_open_peer() {
    let world = TestWorld::new();
    let conv = world.direct_conversation(ALICE, BOB);
    let alice = world.client(ALICE);
    let mut bob = world.client(BOB);

    alice.client.open_conversation(conv).await.unwrap();
    bob.client.open_conversation(conv).await.unwrap();

    let sent = alice
        .client
        .send_message(conv, MessageBody::text("hello bob"))
        .await
        .unwrap();

    bob.drain().await;
    let bobs_view = bob.client.messages(conv).unwrap();
    assert_eq!(bobs_view.len(), 1);
    assert_eq!(bobs_view[0].id, sent.id);
}

#[tokio::test]
async fn test_duplicate_create_leaves_one_entry() {
    let world = TestWorld::new();
    let conv = world.direct_conversation(ALICE, BOB);
    let alice = world.client(ALICE);
    alice.client.open_conversation(conv).await.unwrap();

    let message = parley_core::Message::new(
        world.ids.generate(),
        conv,
        BOB,
        MessageBody::text("delivered twice"),
    );
    let event = ReceivedMessage::from_event(
        SyncChannel::conversation(conv),
        SyncEvent::message_created(message.clone()),
    );

    alice.client.router().handle(event.clone()).await;
    alice.client.router().handle(event).await;

    let view = alice.client.messages(conv).unwrap();
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].id, message.id);
}

#[tokio::test]
async fn test_delete_arriving_before_create_wins() {
    let world = TestWorld::new();
    let conv = world.direct_conversation(ALICE, BOB);
    let alice = world.client(ALICE);
    alice.client.open_conversation(conv).await.unwrap();

    let message = parley_core::Message::new(
        world.ids.generate(),
        conv,
        BOB,
        MessageBody::text("never to be seen"),
    );

    let delete = ReceivedMessage::from_event(
        SyncChannel::conversation(conv),
        SyncEvent::message_deleted(message.id, conv),
    );
    let create = ReceivedMessage::from_event(
        SyncChannel::conversation(conv),
        SyncEvent::message_created(message),
    );

    alice.client.router().handle(delete).await;
    alice.client.router().handle(create).await;

    assert!(alice.client.messages(conv).unwrap().is_empty());
}

#[tokio::test]
async fn test_no_event_reaches_a_closed_view() {
    let world = TestWorld::new();
    let conv = world.direct_conversation(ALICE, BOB);
    let alice = world.client(ALICE);

    let handle = alice.client.open_conversation(conv).await.unwrap();
    alice.client.close_conversation(handle).await.unwrap();

    let message = parley_core::Message::new(
        world.ids.generate(),
        conv,
        BOB,
        MessageBody::text("too late"),
    );
    let event = ReceivedMessage::from_event(
        SyncChannel::conversation(conv),
        SyncEvent::message_created(message),
    );
    alice.client.router().handle(event).await;

    // The view is gone, and nothing was resurrected by the late event
    assert!(alice.client.messages(conv).is_err());
    assert!(!alice.client.channels().is_open(conv));
}

#[tokio::test]
async fn test_close_unsubscribes_only_after_last_handle() {
    let world = TestWorld::new();
    let conv = world.direct_conversation(ALICE, BOB);
    let alice = world.client(ALICE);

    let first = alice.client.open_conversation(conv).await.unwrap();
    let second = alice.client.open_conversation(conv).await.unwrap();

    let channel_name = SyncChannel::conversation(conv).name();
    assert!(world.transport.subscribed().contains(&channel_name));

    alice.client.close_conversation(first).await.unwrap();
    assert!(world.transport.subscribed().contains(&channel_name));

    alice.client.close_conversation(second).await.unwrap();
    assert!(!world.transport.subscribed().contains(&channel_name));
}

#[tokio::test]
async fn test_optimistic_delete_rolls_back_on_store_failure() {
    let world = TestWorld::new();
    let conv = world.direct_conversation(ALICE, BOB);
    let mut alice = world.client(ALICE);
    alice.client.open_conversation(conv).await.unwrap();

    alice
        .client
        .send_message(conv, MessageBody::text("first"))
        .await
        .unwrap();
    let target = alice
        .client
        .send_message(conv, MessageBody::text("second"))
        .await
        .unwrap();
    alice
        .client
        .send_message(conv, MessageBody::text("third"))
        .await
        .unwrap();
    alice.drain().await;

    world.store.set_fail_writes(true);
    let err = alice
        .client
        .delete_message(conv, target.id)
        .await
        .unwrap_err();
    assert!(err.is_retryable());

    // Rolled back at its original position
    let view = alice.client.messages(conv).unwrap();
    assert_eq!(view.len(), 3);
    assert_eq!(view[1].id, target.id);

    // The retry succeeds and the entry stays gone
    world.store.set_fail_writes(false);
    alice.client.delete_message(conv, target.id).await.unwrap();
    let view = alice.client.messages(conv).unwrap();
    assert_eq!(view.len(), 2);
    assert!(view.iter().all(|m| m.id != target.id));
}

#[tokio::test]
async fn test_delete_propagates_to_peer() {
    let world = TestWorld::new();
    let conv = world.direct_conversation(ALICE, BOB);
    let alice = world.client(ALICE);
    let mut bob = world.client(BOB);

    alice.client.open_conversation(conv).await.unwrap();
    bob.client.open_conversation(conv).await.unwrap();

    let sent = alice
        .client
        .send_message(conv, MessageBody::text("retracted"))
        .await
        .unwrap();
    bob.drain().await;
    assert_eq!(bob.client.messages(conv).unwrap().len(), 1);

    alice.client.delete_message(conv, sent.id).await.unwrap();
    bob.drain().await;
    assert!(bob.client.messages(conv).unwrap().is_empty());
}

#[tokio::test]
async fn test_only_the_sender_may_delete() {
    let world = TestWorld::new();
    let conv = world.direct_conversation(ALICE, BOB);
    let alice = world.client(ALICE);
    let mut bob = world.client(BOB);

    alice.client.open_conversation(conv).await.unwrap();
    bob.client.open_conversation(conv).await.unwrap();

    let sent = alice
        .client
        .send_message(conv, MessageBody::text("mine"))
        .await
        .unwrap();
    bob.drain().await;

    let err = bob.client.delete_message(conv, sent.id).await.unwrap_err();
    assert!(err.is_permission());

    // The optimistic removal was rolled back
    assert_eq!(bob.client.messages(conv).unwrap().len(), 1);
}

#[tokio::test]
async fn test_non_participant_cannot_open() {
    let world = TestWorld::new();
    let conv = world.direct_conversation(ALICE, BOB);
    let mallory = world.client(MALLORY);

    let err = mallory.client.open_conversation(conv).await.unwrap_err();
    assert!(err.is_permission());
    assert!(!mallory.client.channels().is_open(conv));

    // No subscription leaked
    let channel_name = SyncChannel::conversation(conv).name();
    assert!(!world.transport.subscribed().contains(&channel_name));
}

#[tokio::test]
async fn test_empty_body_is_rejected() {
    let world = TestWorld::new();
    let conv = world.direct_conversation(ALICE, BOB);
    let alice = world.client(ALICE);
    alice.client.open_conversation(conv).await.unwrap();

    let err = alice
        .client
        .send_message(conv, MessageBody::text("   "))
        .await
        .unwrap_err();
    assert!(!err.is_retryable());
    assert!(alice.client.messages(conv).unwrap().is_empty());
}

#[tokio::test]
async fn test_open_seeds_existing_history() {
    let world = TestWorld::new();
    let conv = world.direct_conversation(ALICE, BOB);
    let alice = world.client(ALICE);
    alice.client.open_conversation(conv).await.unwrap();

    for text in ["one", "two", "three"] {
        alice
            .client
            .send_message(conv, MessageBody::text(text))
            .await
            .unwrap();
    }

    // A peer opening later seeds the full history in creation order
    let bob = world.client(BOB);
    bob.client.open_conversation(conv).await.unwrap();
    let view = bob.client.messages(conv).unwrap();
    assert_eq!(view.len(), 3);
    assert_eq!(view[0].body.text.as_deref(), Some("one"));
    assert_eq!(view[2].body.text.as_deref(), Some("three"));
}
