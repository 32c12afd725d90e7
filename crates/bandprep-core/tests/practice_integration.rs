//! Integration tests for the practice flow against a mocked completion API.

use std::sync::Arc;

use bandprep_core::storage::{ApiConfig, HISTORY_KEY, SESSION_KEY};
use bandprep_core::{
    Database, EvaluationOutcome, GeminiClient, KvStore, PracticeError, PracticeService, TaskKind,
    TimerState,
};
use mockito::Matcher;

const PATH: &str = "/models/gemini-2.5-pro:generateContent";

fn service_for(server: &mockito::ServerGuard) -> (Arc<Database>, PracticeService) {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let config = ApiConfig {
        base_url: server.url(),
        ..ApiConfig::default()
    };
    let client = Arc::new(GeminiClient::new(&config).unwrap());
    let service = PracticeService::open(db.clone(), client);
    service.secrets().set("test-key").unwrap();
    (db, service)
}

fn candidate(text: &str) -> String {
    serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": text }] } }]
    })
    .to_string()
}

#[tokio::test]
async fn test_quota_error_leaves_history_unchanged() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", PATH)
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"message":"quota exceeded"}}"#)
        .create_async()
        .await;

    let (db, service) = service_for(&server);
    service
        .start_manual_task(TaskKind::ShortTask, "Write to your manager.")
        .unwrap();

    let response = "word ".repeat(160);
    let err = service.submit(&response, false).await.unwrap_err();
    match err {
        PracticeError::Remote { message } => assert_eq!(message, "quota exceeded"),
        other => panic!("expected Remote, got {other:?}"),
    }

    assert!(db.get(HISTORY_KEY).unwrap().is_none());
    assert!(db.get(SESSION_KEY).unwrap().is_some());
    assert_eq!(service.state(), TimerState::Running);
}

#[tokio::test]
async fn test_generate_then_submit_records_history() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", PATH)
        .match_query(Matcher::Any)
        .match_body(Matcher::Regex("Generate an authentic".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(candidate("You recently stayed at a hotel. Write a letter to the manager."))
        .create_async()
        .await;
    let evaluation = server
        .mock("POST", PATH)
        .match_query(Matcher::Any)
        .match_body(Matcher::Regex("contains exactly 160 words".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(candidate(
            "Here you go:\n{\"bandScore\":7,\"taskAchievement\":\"All points covered.\"}",
        ))
        .create_async()
        .await;

    let (db, service) = service_for(&server);
    let session = service.generate_task(TaskKind::ShortTask).await.unwrap();
    assert!(session.task.content().starts_with("You recently stayed"));

    let outcome = service.submit(&"word ".repeat(160), false).await.unwrap();
    evaluation.assert_async().await;
    match &outcome {
        EvaluationOutcome::Parsed(result) => {
            assert_eq!(result.band_score, Some(7.0));
            assert_eq!(result.task_achievement, "All points covered.");
        }
        other => panic!("expected Parsed, got {other:?}"),
    }

    assert_eq!(service.state(), TimerState::Idle);
    assert!(db.get(SESSION_KEY).unwrap().is_none());
    let history = service.history().load();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].task_kind, TaskKind::ShortTask);
    assert_eq!(history[0].band_score, Some(7.0));
}

#[tokio::test]
async fn test_missing_key_never_calls_remote() {
    let mut server = mockito::Server::new_async().await;
    let never = server
        .mock("POST", PATH)
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let (_, service) = service_for(&server);
    service.secrets().clear().unwrap();
    service.start_manual_task(TaskKind::LongTask, "Essay").unwrap();

    let err = service.submit("text", true).await.unwrap_err();
    assert!(matches!(err, PracticeError::MissingSecret));
    never.assert_async().await;
}
