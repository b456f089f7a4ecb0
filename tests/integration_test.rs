use clinchat::api::mock_client::{sse_data, MockApiClient};
use clinchat::config::Config;
use clinchat::state::{
    ConversationController, SendOutcome, StoreUpdate, StreamReducer, ThreadStore,
};
use clinchat::types::{Message, Role};
use parking_lot::Mutex;
use serde_json::json;
use std::time::Duration;

#[test]
fn test_config_validation_rejects_non_http_urls() {
    let config = Config {
        api_url: "ftp://localhost:5000/api".to_string(),
        ..Config::default()
    };

    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_rejects_blank_default_title() {
    let config = Config {
        default_thread_title: "   ".to_string(),
        ..Config::default()
    };

    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_allows_remote_https_endpoint() {
    let config = Config {
        api_url: "https://assistant.example.org/api".to_string(),
        ..Config::default()
    };

    assert!(config.validate().is_ok());
}

#[test]
fn test_reducer_writes_only_to_its_bound_message() {
    let store = Mutex::new(ThreadStore::new());
    let user = Message::provisional("t-1", Role::User, "Any triage tools?".to_string());
    let placeholder = Message::provisional("t-1", Role::Assistant, String::new());
    let target = placeholder.id.clone();
    {
        let mut guard = store.lock();
        guard.set_active_thread(Some("t-1".to_string()));
        guard.append_message(user.clone());
        guard.append_in_flight(placeholder);
    }

    let mut reducer = StreamReducer::new(target.clone());
    let body = [
        sse_data(&json!({"node": "supervisor", "data": {"route": "tool_finder"}})),
        sse_data(&json!({"node": "tool_finder", "data": {"response": "Try"}})),
        sse_data(&json!({"node": "tool_finder", "data": {"response": "Try Nuance DAX."}})),
        "data: [DONE]\n\n".to_string(),
    ]
    .concat();
    let (head, tail) = body.as_bytes().split_at(body.len() / 2);
    reducer.ingest(head, &store);
    reducer.ingest(tail, &store);
    let summary = reducer.finish(&store);

    assert_eq!(summary.events, 3);
    assert!(summary.saw_done);

    let guard = store.lock();
    let reply = guard.message(&target).expect("placeholder still visible");
    assert_eq!(reply.content, "Try Nuance DAX.");
    assert_eq!(reply.route.as_deref(), Some("tool_finder"));
    assert_eq!(guard.message(&user.id).map(|m| m.content.as_str()), Some("Any triage tools?"));
}

#[test]
fn test_reducer_update_for_missing_target_is_dropped() {
    let store = Mutex::new(ThreadStore::new());
    let mut reducer = StreamReducer::new("temp-gone");

    reducer.ingest(
        sse_data(&json!({"data": {"response": "orphan"}})).as_bytes(),
        &store,
    );

    assert!(store.lock().messages().is_empty());
    assert_eq!(reducer.accumulator().content(), "orphan");
}

#[tokio::test]
async fn test_full_conversation_against_mock_backend() {
    let backend = MockApiClient::new();
    let controller = ConversationController::new(backend.clone(), &Config::default());
    let mut updates = controller.subscribe();

    let thread = controller.create_thread().await.expect("thread created");
    assert_eq!(thread.title, "New Chat");
    assert_eq!(controller.active_thread_id().as_deref(), Some(thread.id.as_str()));

    backend.enqueue_stream(vec![
        sse_data(&json!({"node": "supervisor", "data": {"route": "org_matcher"}})),
        sse_data(&json!({
            "node": "org_matcher",
            "data": {
                "response": "Mayo Clinic runs a similar pilot.",
                "confidence": {"routing": 0.9, "retrieval": 0.7, "response": 0.8, "overall": 0.8}
            }
        })),
        "data: [DONE]\n\n".to_string(),
    ]);

    let outcome = controller
        .send_message("Who else is piloting ambient scribes?".to_string())
        .await;
    assert_eq!(outcome, SendOutcome::Completed);
    assert!(!controller.is_busy());

    let messages = controller.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert!(messages[0].is_provisional());
    assert_eq!(messages[1].content, "Mayo Clinic runs a similar pilot.");
    assert_eq!(messages[1].route.as_deref(), Some("org_matcher"));
    assert_eq!(messages[1].confidence.map(|c| c.overall), Some(0.8));

    // The backend retitles the thread from the first query; the refresh picks it up.
    let refreshed = tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            if controller.threads()[0].title != "New Chat" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(refreshed.is_ok(), "thread list was not refreshed");
    assert_eq!(
        controller.threads()[0].title,
        "Who else is piloting ambient scribes?"
    );

    let mut seen = Vec::new();
    while let Ok(update) = updates.try_recv() {
        seen.push(update);
    }
    assert!(seen.contains(&StoreUpdate::ThreadsReplaced));
    assert!(seen
        .iter()
        .any(|update| matches!(update, StoreUpdate::MessageUpdated { .. })));
}
