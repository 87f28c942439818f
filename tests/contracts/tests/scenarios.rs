//! End-to-end scenarios for the composition and synchronization core,
//! exercised through the runtime and the in-memory channel.

use std::time::Duration;
use tagchat_client::config::ClientConfig;
use tagchat_client::runtime::InputCommand;
use tagchat_contracts::{echo_message, Harness};
use tagchat_protocol::events::{ClientEvent, ServerEvent};
use tagchat_protocol::{
    Message, MessageOrigin, OverlayAnchor, Segment, Suggestion, SuggestionKind, Trigger,
};
use tokio::sync::oneshot;

fn edited(text: &str) -> InputCommand {
    InputCommand::TextEdited {
        text: text.into(),
        anchor: OverlayAnchor::default(),
    }
}

async fn open_conversation(harness: &mut Harness, id: &str) {
    harness.command(InputCommand::OpenConversation(Some(id.into())));
    match harness.next_client_event().await {
        ClientEvent::LoadMessages { conversation_id } => assert_eq!(conversation_id, id),
        other => panic!("expected load-messages, got {other:?}"),
    }
}

#[tokio::test]
async fn message_appears_only_after_the_echo_and_duplicates_are_absorbed() {
    let mut harness = Harness::start().unwrap();
    open_conversation(&mut harness, "c1").await;
    harness.push(ServerEvent::MessagesLoaded {
        conversation_id: "c1".into(),
        messages: Vec::new(),
    });
    harness.wait_for(|s| !s.is_loading).await;

    harness.command(edited("hello there"));
    harness.command(InputCommand::Send);

    let outgoing = match harness.next_client_event().await {
        ClientEvent::SendMessage(outgoing) => outgoing,
        other => panic!("expected send-message, got {other:?}"),
    };
    assert_eq!(outgoing.conversation_id, "c1");
    assert_eq!(outgoing.content, "hello there");

    // No optimistic insert: the composer cleared but the list is empty.
    let snapshot = harness.wait_for(|s| s.full_text.is_empty()).await;
    assert!(snapshot.messages.is_empty());

    let echo = echo_message("m1", "c1", "hello there", Vec::new());
    harness.push(ServerEvent::NewMessage(echo.clone()));
    let snapshot = harness.wait_for(|s| s.messages.len() == 1).await;
    assert_eq!(snapshot.messages[0].id, "m1");

    // A duplicate delivery of the same echo changes nothing.
    harness.push(ServerEvent::NewMessage(echo));
    let snapshot = harness.settle_with_typing("c1", true).await;
    assert_eq!(snapshot.messages.len(), 1);
}

#[tokio::test]
async fn empty_composer_send_emits_nothing() {
    let mut harness = Harness::start().unwrap();
    open_conversation(&mut harness, "c1").await;

    harness.command(InputCommand::Send);
    harness.command(edited("   "));
    harness.command(InputCommand::Send);

    harness.expect_no_client_event(Duration::from_millis(80)).await;
}

#[tokio::test]
async fn late_history_for_a_superseded_conversation_is_discarded() {
    let mut harness = Harness::start().unwrap();
    open_conversation(&mut harness, "c1").await;
    open_conversation(&mut harness, "c2").await;

    harness.push(ServerEvent::MessagesLoaded {
        conversation_id: "c1".into(),
        messages: vec![echo_message("m1", "c1", "stale history", Vec::new())],
    });
    harness.push(ServerEvent::MessagesLoaded {
        conversation_id: "c2".into(),
        messages: vec![echo_message("m2", "c2", "fresh history", Vec::new())],
    });

    let snapshot = harness.wait_for(|s| !s.is_loading).await;
    assert_eq!(snapshot.active_conversation.as_deref(), Some("c2"));
    let ids: Vec<&str> = snapshot.messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["m2"]);
}

#[tokio::test]
async fn suggestion_requests_are_debounced_and_responses_correlated() {
    let mut harness = Harness::start().unwrap();
    open_conversation(&mut harness, "c1").await;

    harness.command(edited("#ru"));
    match harness.next_client_event().await {
        ClientEvent::AutocompleteRequest { query, trigger } => {
            assert_eq!(query, "ru");
            assert_eq!(trigger, Trigger::Hash);
        }
        other => panic!("expected autocomplete-request, got {other:?}"),
    }

    harness.command(edited("#rust"));
    match harness.next_client_event().await {
        ClientEvent::AutocompleteRequest { query, .. } => assert_eq!(query, "rust"),
        other => panic!("expected autocomplete-request, got {other:?}"),
    }

    // The slow answer for the superseded query must not be rendered.
    harness.push(ServerEvent::AutocompleteResponse {
        suggestions: vec![Suggestion {
            id: "h9".into(),
            name: "ruby".into(),
            kind: SuggestionKind::Hashtag,
            avatar: None,
        }],
        query: "ru".into(),
        trigger: Trigger::Hash,
    });
    let snapshot = harness.settle_with_typing("c1", true).await;
    assert!(snapshot.suggestions.items.is_empty());
    assert!(snapshot.suggestions.is_loading);

    harness.push(ServerEvent::AutocompleteResponse {
        suggestions: vec![Suggestion {
            id: "h1".into(),
            name: "rust".into(),
            kind: SuggestionKind::Hashtag,
            avatar: None,
        }],
        query: "rust".into(),
        trigger: Trigger::Hash,
    });
    let snapshot = harness.wait_for(|s| !s.suggestions.items.is_empty()).await;
    assert_eq!(snapshot.suggestions.items[0].name, "rust");
    assert!(!snapshot.suggestions.is_loading);
}

#[tokio::test]
async fn empty_query_requests_skip_the_debounce() {
    let mut harness = Harness::start_with(
        ClientConfig::default().with_suggestion_debounce(Duration::from_secs(30)),
    )
    .unwrap();
    open_conversation(&mut harness, "c1").await;

    // With a 30s debounce, only the empty-query fast path can deliver this.
    harness.command(edited("@"));
    match harness.next_client_event().await {
        ClientEvent::AutocompleteRequest { query, trigger } => {
            assert_eq!(query, "");
            assert_eq!(trigger, Trigger::At);
        }
        other => panic!("expected autocomplete-request, got {other:?}"),
    }
}

#[tokio::test]
async fn escape_cancels_the_pending_debounce() {
    let mut harness = Harness::start_with(
        ClientConfig::default().with_suggestion_debounce(Duration::from_millis(30)),
    )
    .unwrap();
    open_conversation(&mut harness, "c1").await;

    harness.command(edited("#ru"));
    harness.command(InputCommand::Escape);

    harness.expect_no_client_event(Duration::from_millis(120)).await;
    let snapshot = harness.settle_with_typing("c1", true).await;
    assert!(!snapshot.suggestions.is_open);
}

#[tokio::test]
async fn selecting_a_mention_builds_the_expected_segments() {
    let mut harness = Harness::start().unwrap();
    open_conversation(&mut harness, "c1").await;

    harness.command(edited("Hello @jo"));
    match harness.next_client_event().await {
        ClientEvent::AutocompleteRequest { query, trigger } => {
            assert_eq!(query, "jo");
            assert_eq!(trigger, Trigger::At);
        }
        other => panic!("expected autocomplete-request, got {other:?}"),
    }

    harness.push(ServerEvent::AutocompleteResponse {
        suggestions: vec![Suggestion {
            id: "u1".into(),
            name: "John".into(),
            kind: SuggestionKind::User,
            avatar: None,
        }],
        query: "jo".into(),
        trigger: Trigger::At,
    });
    harness.wait_for(|s| !s.suggestions.items.is_empty()).await;

    harness.command(InputCommand::Confirm);
    let snapshot = harness.wait_for(|s| !s.segments.is_empty()).await;
    assert_eq!(
        snapshot.segments,
        vec![
            Segment::Text { content: "Hello ".into() },
            Segment::Mention {
                content: "john".into(),
                id: "u1".into(),
                name: "John".into(),
            },
        ]
    );
    assert_eq!(snapshot.trailing_text, "");
    assert_eq!(snapshot.full_text, "Hello @john");
    assert!(!snapshot.suggestions.is_open);

    // Enter now sends, since the overlay is closed.
    harness.command(InputCommand::Confirm);
    let outgoing = match harness.next_client_event().await {
        ClientEvent::SendMessage(outgoing) => outgoing,
        other => panic!("expected send-message, got {other:?}"),
    };
    assert_eq!(outgoing.content, "Hello @john");
    assert_eq!(outgoing.segments.len(), 2);
}

#[tokio::test]
async fn typing_indicator_is_scoped_to_the_active_conversation() {
    let mut harness = Harness::start().unwrap();
    open_conversation(&mut harness, "c1").await;

    harness.push(ServerEvent::BotTyping {
        conversation_id: "c2".into(),
        is_typing: true,
    });
    harness.push(ServerEvent::BotTyping {
        conversation_id: "c1".into(),
        is_typing: true,
    });
    let snapshot = harness.wait_for(|s| s.is_bot_typing).await;
    assert_eq!(snapshot.active_conversation.as_deref(), Some("c1"));
}

#[tokio::test]
async fn pushes_for_other_conversations_never_leak_in() {
    let mut harness = Harness::start().unwrap();
    open_conversation(&mut harness, "c1").await;

    harness.push(ServerEvent::NewMessage(echo_message(
        "m9",
        "c2",
        "wrong room",
        Vec::new(),
    )));
    let snapshot = harness.settle_with_typing("c1", true).await;
    assert!(snapshot.messages.is_empty());
}

#[tokio::test]
async fn deleting_the_active_conversation_clears_the_view() {
    let mut harness = Harness::start().unwrap();
    open_conversation(&mut harness, "c1").await;
    harness.push(ServerEvent::NewMessage(echo_message("m1", "c1", "hi", Vec::new())));
    harness.wait_for(|s| s.messages.len() == 1).await;

    harness.push(ServerEvent::ConversationDeleted { conversation_id: "c1".into() });
    let snapshot = harness
        .wait_for(|s| s.active_conversation.is_none())
        .await;
    assert!(snapshot.messages.is_empty());
}

#[tokio::test]
async fn history_error_clears_loading_and_shows_nothing() {
    let mut harness = Harness::start().unwrap();
    open_conversation(&mut harness, "c1").await;

    harness.push(ServerEvent::MessagesError { error: "backend down".into() });
    let snapshot = harness.wait_for(|s| !s.is_loading).await;
    assert!(snapshot.messages.is_empty());
}

#[tokio::test]
async fn shutdown_tears_down_the_subscription() {
    let harness = Harness::start().unwrap();
    assert_eq!(harness.channel.subscriber_count(), 1);

    harness.client.shutdown().await.unwrap();
    assert_eq!(harness.channel.subscriber_count(), 0);
}

#[tokio::test]
async fn shutdown_acknowledges_through_the_provided_channel() {
    let harness = Harness::start().unwrap();
    let (done_tx, done_rx) = oneshot::channel();
    harness.command(InputCommand::Shutdown(done_tx));
    done_rx.await.expect("runtime should acknowledge shutdown");
}

#[tokio::test]
async fn full_text_round_trips_through_the_echo() {
    let mut harness = Harness::start().unwrap();
    open_conversation(&mut harness, "c1").await;

    harness.command(edited("#r"));
    harness.next_client_event().await;
    harness.push(ServerEvent::AutocompleteResponse {
        suggestions: vec![Suggestion {
            id: "h1".into(),
            name: "rust".into(),
            kind: SuggestionKind::Hashtag,
            avatar: None,
        }],
        query: "r".into(),
        trigger: Trigger::Hash,
    });
    harness.wait_for(|s| !s.suggestions.items.is_empty()).await;
    harness.command(InputCommand::SelectSuggestion(0));
    harness.command(edited("is great"));
    harness.command(InputCommand::Send);

    let outgoing = match harness.next_client_event().await {
        ClientEvent::SendMessage(outgoing) => outgoing,
        other => panic!("expected send-message, got {other:?}"),
    };
    assert_eq!(outgoing.content, "#rust is great");

    // The service records and broadcasts; the client renders the echo.
    let recorded = Message {
        id: "m1".into(),
        origin: MessageOrigin::User,
        content: outgoing.content.clone(),
        segments: outgoing.segments.clone(),
        current_text: outgoing.current_text.clone(),
        timestamp: outgoing.timestamp.clone(),
        conversation_id: Some(outgoing.conversation_id.clone()),
    };
    harness.push(ServerEvent::NewMessage(recorded));
    let snapshot = harness.wait_for(|s| s.messages.len() == 1).await;
    assert_eq!(snapshot.messages[0].content, "#rust is great");
    assert_eq!(
        snapshot.messages[0].segments,
        vec![Segment::Hashtag { content: "rust".into(), id: "h1".into() }]
    );
}
