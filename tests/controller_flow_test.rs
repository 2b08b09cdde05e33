mod common;

use common::{Call, Scripted, ScriptedApi};
use question_batch_submit::error::AppError;
use question_batch_submit::models::{ExportFormat, ProcessRequest, QaResult, SubmissionPayload};
use question_batch_submit::orchestrator::App;
use question_batch_submit::{Config, PollState, QaController, SubmitReport};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

const INTERVAL: Duration = Duration::from_secs(5);

fn controller(api: &Arc<ScriptedApi>) -> QaController {
    QaController::new(api.clone(), INTERVAL)
}

#[tokio::test(start_paused = true)]
async fn test_async_batch_resolves_after_running_ticks() {
    let api = ScriptedApi::new();
    api.push_submission(Scripted::ok(json!({"job_id": "j1", "question_count": 2})));
    api.push_status("j1", json!({"status": "running"}));
    api.push_status("j1", json!({"status": "running"}));
    api.push_status(
        "j1",
        json!({"status": "completed", "results": [{"question": "A?", "answer": "x"}]}),
    );

    let ctl = controller(&api);
    ctl.add_questions_bulk("A?\nB?").unwrap();

    let report = ctl.submit_batch(true).await.unwrap();
    assert_eq!(
        report,
        SubmitReport::Polling {
            job_id: "j1".to_string(),
            expected_count: Some(2),
        }
    );
    assert!(ctl.questions().is_empty());
    assert_eq!(
        api.calls()[0],
        Call::Process(ProcessRequest::Batch {
            questions: vec!["A?".to_string(), "B?".to_string()],
            use_batch_api: true,
        })
    );

    let state = ctl.wait_until_settled().await;
    assert_eq!(
        state,
        PollState::Resolved {
            job_id: "j1".to_string(),
            result_count: 1,
        }
    );
    assert_eq!(ctl.results().as_slice(), &[QaResult::new("A?", "x")]);

    // 终态之后不再轮询
    time::sleep(INTERVAL * 4).await;
    assert_eq!(api.status_calls("j1"), 3);
    assert!(!ctl.is_polling());
}

#[tokio::test(start_paused = true)]
async fn test_new_submission_cancels_previous_poll() {
    let api = ScriptedApi::new();
    api.push_submission(Scripted::ok(json!({"job_id": "a"})));
    api.push_submission(Scripted::ok(json!({"job_id": "b"})));

    let ctl = controller(&api);
    ctl.add_question("A?").unwrap();
    ctl.submit_batch(true).await.unwrap();
    ctl.add_question("B?").unwrap();
    ctl.submit_batch(true).await.unwrap();

    time::sleep(Duration::from_secs(16)).await;

    assert_eq!(api.status_calls("a"), 0);
    assert_eq!(api.status_calls("b"), 3);
    assert_eq!(ctl.poll_state().job_id(), Some("b"));
}

#[tokio::test(start_paused = true)]
async fn test_late_response_of_superseded_submission_is_discarded() {
    let api = ScriptedApi::new();
    api.push_submission(
        Scripted::ok(json!({"results": [{"question": "A?", "answer": "stale"}]}))
            .after(Duration::from_secs(10)),
    );
    api.push_submission(Scripted::ok(
        json!({"results": [{"question": "B?", "answer": "fresh"}]}),
    ));

    let ctl = Arc::new(controller(&api));

    let first = tokio::spawn({
        let ctl = ctl.clone();
        async move { ctl.submit_text("A?").await }
    });
    time::sleep(Duration::from_millis(1)).await;

    let second = ctl.submit_text("B?").await.unwrap();
    assert_eq!(second, SubmitReport::Completed { result_count: 1 });

    let first = first.await.unwrap().unwrap();
    assert_eq!(first, SubmitReport::Superseded);
    assert_eq!(ctl.results().as_slice(), &[QaResult::new("B?", "fresh")]);
}

#[tokio::test]
async fn test_single_question_returns_immediately() {
    let api = ScriptedApi::new();
    api.push_submission(Scripted::ok(json!({
        "question": "1+1=?",
        "answer": "2",
        "token_usage": {"prompt_tokens": 5, "completion_tokens": 1, "total_tokens": 6}
    })));

    let ctl = controller(&api);
    let report = ctl.submit_text("  1+1=?  ").await.unwrap();

    assert_eq!(report, SubmitReport::Completed { result_count: 1 });
    assert_eq!(
        api.calls(),
        vec![Call::Process(ProcessRequest::Single {
            question: "1+1=?".to_string()
        })]
    );
    assert_eq!(ctl.poll_state(), PollState::Idle);
    assert_eq!(ctl.total_usage().total_tokens, 6);
    assert!(ctl.can_export());
}

#[tokio::test]
async fn test_blank_question_is_rejected_locally() {
    let api = ScriptedApi::new();
    let ctl = controller(&api);

    let err = ctl.submit_text("   ").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = ctl.submit_batch(false).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert!(api.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_blank_submission_leaves_running_poll_alone() {
    let api = ScriptedApi::new();
    api.push_submission(Scripted::ok(json!({"job_id": "j1"})));

    let ctl = controller(&api);
    ctl.add_question("A?").unwrap();
    ctl.submit_batch(true).await.unwrap();
    assert!(ctl.is_polling());

    let err = ctl
        .submit(SubmissionPayload::Text("  ".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let err = ctl.submit_batch(true).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert!(ctl.is_polling());
    assert_eq!(ctl.poll_state().job_id(), Some("j1"));
    assert_eq!(api.calls().len(), 1);

    time::sleep(INTERVAL * 2 + Duration::from_secs(1)).await;
    assert_eq!(api.status_calls("j1"), 2);
}

#[tokio::test]
async fn test_export_with_empty_results_makes_no_request() {
    let api = ScriptedApi::new();
    let ctl = controller(&api);

    let artifact = ctl.export(ExportFormat::Pdf).await.unwrap();

    assert!(artifact.is_none());
    assert_eq!(api.export_calls(), 0);
}

#[tokio::test]
async fn test_transport_error_keeps_batch_and_results() {
    let api = ScriptedApi::new();
    api.push_submission(Scripted::err(AppError::transport_failed(
        "/process",
        "connection refused",
    )));

    let ctl = controller(&api);
    ctl.add_questions_bulk("A?\nB?").unwrap();

    let err = ctl.submit_batch(false).await.unwrap_err();

    assert!(err.is_transport());
    assert_eq!(ctl.questions().len(), 2);
    assert!(ctl.results().is_empty());
    assert_eq!(ctl.poll_state(), PollState::Idle);
}

#[tokio::test]
async fn test_unrecognized_response_is_protocol_error() {
    let api = ScriptedApi::new();
    api.push_submission(Scripted::ok(json!({"status": "ok"})));

    let ctl = controller(&api);
    let err = ctl.submit_text("A?").await.unwrap_err();

    assert!(matches!(err, AppError::Protocol { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_job_error_stops_polling_and_keeps_results() {
    let api = ScriptedApi::new();
    api.push_submission(Scripted::ok(
        json!({"results": [{"question": "A?", "answer": "a"}]}),
    ));
    api.push_submission(Scripted::ok(json!({"job_id": "j2"})));
    api.push_status("j2", json!({"status": "failed", "error": "model overloaded"}));

    let ctl = controller(&api);
    ctl.submit_text("A?").await.unwrap();
    ctl.add_question("B?").unwrap();
    ctl.submit_batch(true).await.unwrap();

    let state = ctl.wait_until_settled().await;
    assert_eq!(
        state,
        PollState::Failed {
            job_id: "j2".to_string(),
            message: "model overloaded".to_string(),
        }
    );
    assert_eq!(ctl.results().as_slice(), &[QaResult::new("A?", "a")]);

    time::sleep(INTERVAL * 3).await;
    assert_eq!(api.status_calls("j2"), 1);
}

#[tokio::test]
async fn test_export_then_download() {
    let api = ScriptedApi::new();
    api.push_submission(Scripted::ok(json!({"results": [
        {"question": "A?", "answer": "a"},
        {"question": "B?", "answer": "b"}
    ]})));
    api.push_export(Scripted::ok(json!({"file_url": "/download/qa_result.docx"})));
    api.put_file("/download/qa_result.docx", b"docx-bytes");

    let ctl = controller(&api);
    ctl.add_questions_bulk("A?\nB?").unwrap();
    ctl.submit_batch(false).await.unwrap();

    let artifact = ctl.export(ExportFormat::Docx).await.unwrap().unwrap();
    assert_eq!(artifact.download_url, "http://qa.test/download/qa_result.docx");
    assert!(api.calls().contains(&Call::Export {
        count: 2,
        format: ExportFormat::Docx,
    }));

    let dir = tempfile::tempdir().unwrap();
    let saved = ctl.download(&artifact, dir.path()).await.unwrap();

    assert_eq!(saved, dir.path().join("qa_result.docx"));
    assert_eq!(std::fs::read(&saved).unwrap(), b"docx-bytes");
}

#[tokio::test]
async fn test_export_without_file_url_is_protocol_error() {
    let api = ScriptedApi::new();
    api.push_submission(Scripted::ok(
        json!({"results": [{"question": "A?", "answer": "a"}]}),
    ));
    api.push_export(Scripted::ok(json!({"error": "render failed"})));

    let ctl = controller(&api);
    ctl.submit_text("A?").await.unwrap();

    let err = ctl.export(ExportFormat::Pdf).await.unwrap_err();
    assert!(matches!(err, AppError::Protocol { .. }));
}

#[tokio::test]
async fn test_question_file_upload_with_numeric_job_id() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("questions.txt");
    let content: Vec<String> = (1..=12).map(|i| format!("第{}题?", i)).collect();
    std::fs::write(&path, content.join("\n")).unwrap();

    let api = ScriptedApi::new();
    api.push_submission(Scripted::ok(json!({"job_id": 42, "question_count": 12})));

    let ctl = controller(&api);
    let report = ctl.submit_file(&path, true).await.unwrap();

    assert_eq!(
        report,
        SubmitReport::Polling {
            job_id: "42".to_string(),
            expected_count: Some(12),
        }
    );
    assert_eq!(
        api.calls(),
        vec![Call::ProcessFile {
            filename: "questions.txt".to_string(),
            use_batch_api: true,
        }]
    );
    ctl.cancel_polling();
}

#[tokio::test]
async fn test_question_file_can_feed_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("questions.txt");
    std::fs::write(&path, "A?\n\n  B?  \nA?\n").unwrap();

    let api = ScriptedApi::new();
    let ctl = controller(&api);

    let added = ctl.load_file_into_batch(&path).await.unwrap();

    assert_eq!(added, 3);
    let texts: Vec<String> = ctl.questions().into_iter().map(|q| q.text).collect();
    assert_eq!(texts, vec!["A?", "B?", "A?"]);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_image_upload_and_extension_check() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("page.png");
    std::fs::write(&image, [0x89, b'P', b'N', b'G']).unwrap();
    let not_image = dir.path().join("page.bmp");
    std::fs::write(&not_image, [0u8; 4]).unwrap();

    let api = ScriptedApi::new();
    api.push_submission(Scripted::ok(
        json!({"question": "图中题目", "answer": "42"}),
    ));

    let ctl = controller(&api);

    let err = ctl.submit_image(&not_image).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(api.calls().is_empty());

    let report = ctl.submit_image(&image).await.unwrap();
    assert_eq!(report, SubmitReport::Completed { result_count: 1 });
    assert_eq!(
        api.calls(),
        vec![Call::ProcessImage {
            filename: "page.png".to_string(),
            size: 4,
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_app_run_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let log_file = dir.path().join("output.txt");
    let download_dir = dir.path().join("exports");

    let api = ScriptedApi::new();
    api.push_submission(Scripted::ok(json!({"job_id": "j9"})));
    api.push_status(
        "j9",
        json!({"status": "completed", "results": [{"question": "A?", "answer": "x"}]}),
    );
    api.push_export(Scripted::ok(json!({"file_url": "/download/result.pdf"})));
    api.put_file("/download/result.pdf", b"%PDF");

    let config = Config {
        question: Some("A?".to_string()),
        export_format: Some("pdf".to_string()),
        download_dir: download_dir.to_string_lossy().into_owned(),
        output_log_file: log_file.to_string_lossy().into_owned(),
        ..Config::default()
    };

    let app = App::with_controller(config, controller(&api));
    app.run().await.unwrap();

    assert_eq!(app.controller().results().len(), 1);
    assert_eq!(
        std::fs::read(download_dir.join("result.pdf")).unwrap(),
        b"%PDF"
    );
    let log = std::fs::read_to_string(&log_file).unwrap();
    assert!(log.contains("题目 1: A?"));
}
