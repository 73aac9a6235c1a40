use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use quiz_core::model::{
    AnswerSelection, AttemptRecordError, ModuleId, QuestionId, ResultId, TestId,
};
use storage::repository::{
    AnalyticsRepository, ModuleRepository, ProgressRepository, StorageError,
    SubmissionRepository, TestRepository,
};
use storage::{BackendConfig, HttpBackend};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone)]
struct Recorded {
    request_line: String,
    authorization: Option<String>,
    body: String,
}

type Routes = HashMap<&'static str, (u16, String)>;

/// Minimal HTTP/1.1 responder serving canned JSON by path.
async fn serve(routes: Routes) -> (String, Arc<Mutex<Vec<Recorded>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorded = Arc::new(Mutex::new(Vec::new()));
    let routes = Arc::new(routes);

    let log = Arc::clone(&recorded);
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let routes = Arc::clone(&routes);
            let log = Arc::clone(&log);
            tokio::spawn(async move { respond(stream, &routes, &log).await });
        }
    });

    (format!("http://{addr}/api"), recorded)
}

async fn respond(mut stream: TcpStream, routes: &Routes, log: &Mutex<Vec<Recorded>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let header = |name: &str| {
        head.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.eq_ignore_ascii_case(name).then(|| value.trim().to_owned())
        })
    };
    let content_length: usize = header("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let request_line = head.lines().next().unwrap_or_default().to_owned();
    let path = request_line.split_whitespace().nth(1).unwrap_or_default();
    log.lock().unwrap().push(Recorded {
        request_line: request_line.clone(),
        authorization: header("authorization"),
        body: String::from_utf8_lossy(&buf[header_end..]).to_string(),
    });

    let (status, body) = routes
        .get(path)
        .cloned()
        .unwrap_or((404, "{}".to_owned()));
    let response = format!(
        "HTTP/1.1 {status} X\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await.unwrap();
}

fn backend(base: &str) -> HttpBackend {
    HttpBackend::new(&BackendConfig::new(base).unwrap().with_token("secret")).unwrap()
}

const TEST_JSON: &str = r#"{
    "id": "t1",
    "title": "Capitals",
    "questions": [
        { "id": "q1", "question": "France?", "options": ["Paris", "Rome"] },
        { "id": "q2", "question": "Italy?", "options": ["Paris", "Rome"] }
    ]
}"#;

#[tokio::test]
async fn loads_test_and_submits_answers() {
    let routes = Routes::from([
        ("/api/test/t1", (200, TEST_JSON.to_owned())),
        (
            "/api/test/passing/submit-test",
            (200, r#"{ "resultId": "r42" }"#.to_owned()),
        ),
    ]);
    let (base, recorded) = serve(routes).await;
    let http = backend(&base);

    let test = http.get_test(&TestId::new("t1")).await.unwrap();
    assert_eq!(test.title(), "Capitals");
    assert_eq!(test.len(), 2);

    let mut selection = AnswerSelection::new();
    selection.select(&test, &QuestionId::new("q1"), 0).unwrap();
    selection.select(&test, &QuestionId::new("q2"), 1).unwrap();
    let payload = selection.to_payload(&test).unwrap();

    let result_id = http.submit_test(&payload).await.unwrap();
    assert_eq!(result_id, ResultId::new("r42"));

    let recorded = recorded.lock().unwrap().clone();
    assert_eq!(recorded.len(), 2);
    assert!(recorded[1].request_line.starts_with("POST /api/test/passing/submit-test"));
    assert_eq!(recorded[1].authorization.as_deref(), Some("Bearer secret"));
    let body: serde_json::Value = serde_json::from_str(&recorded[1].body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "testId": "t1",
            "answers": [
                { "questionId": "q1", "selectedAnswer": 0 },
                { "questionId": "q2", "selectedAnswer": 1 }
            ]
        })
    );
}

#[tokio::test]
async fn statuses_map_to_storage_errors() {
    let routes = Routes::from([
        ("/api/progress/module/m1", (503, "{}".to_owned())),
        (
            "/api/module/m2",
            (200, r#"{ "id": "m2", "title": "Maps", "tests": [{ "id": "t1", "title": "Capitals" }] }"#.to_owned()),
        ),
    ]);
    let (base, _) = serve(routes).await;
    let http = backend(&base);

    assert!(matches!(
        http.module_progress(&ModuleId::new("m1")).await,
        Err(StorageError::Status(503))
    ));
    assert!(matches!(
        http.get_test(&TestId::new("missing")).await,
        Err(StorageError::NotFound)
    ));
    let outline = http.get_module(&ModuleId::new("m2")).await.unwrap();
    assert_eq!(outline.tests[0].id, TestId::new("t1"));
}

#[tokio::test]
async fn out_of_contract_attempt_is_rejected() {
    let attempt = r#"{
        "resultId": "r1",
        "score": 3,
        "totalQuestions": 2,
        "percentage": 150,
        "completedAt": "2024-03-01T10:00:00Z",
        "answers": []
    }"#;
    let routes = Routes::from([("/api/progress/test/r1", (200, attempt.to_owned()))]);
    let (base, _) = serve(routes).await;

    let err = backend(&base)
        .get_result(&ResultId::new("r1"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidRecord(_)));
}

#[tokio::test]
async fn malformed_attempts_are_invalid_records() {
    let no_percentage = r#"{
        "resultId": "r1",
        "score": 2,
        "totalQuestions": 3,
        "completedAt": "2024-03-01T10:00:00Z"
    }"#;
    let null_percentage = r#"{
        "testTitle": "Capitals",
        "attempts": [{
            "resultId": "r2",
            "score": 1,
            "totalQuestions": 2,
            "percentage": null,
            "completedAt": "2024-03-01T10:00:00Z"
        }]
    }"#;
    let routes = Routes::from([
        ("/api/progress/test/r1", (200, no_percentage.to_owned())),
        ("/api/progress/test/result/t1", (200, null_percentage.to_owned())),
    ]);
    let (base, _) = serve(routes).await;
    let http = backend(&base);

    let err = http.get_result(&ResultId::new("r1")).await.unwrap_err();
    assert!(
        matches!(err, StorageError::InvalidRecord(AttemptRecordError::Malformed(_))),
        "{err:?}"
    );
    let err = http.test_history(&TestId::new("t1")).await.unwrap_err();
    assert!(
        matches!(err, StorageError::InvalidRecord(AttemptRecordError::Malformed(_))),
        "{err:?}"
    );
}

#[tokio::test]
async fn reads_history_overall_and_analytics() {
    let history = r#"{
        "testTitle": "Capitals",
        "attempts": [
            { "resultId": "r1", "score": 1, "totalQuestions": 2, "percentage": 50,
              "completedAt": "2024-03-01T10:00:00Z" },
            { "resultId": "r2", "score": 2, "totalQuestions": 2, "percentage": 100,
              "completedAt": "2024-03-02T10:00:00Z" }
        ]
    }"#;
    let overall = r#"{ "averagePercentage": 72.5, "testsTaken": 4 }"#;
    let analytics = r#"{
        "weakTopics": [
            { "topic": "Rivers", "mistakes": 1, "recommendation": "Revise rivers" },
            { "topic": "Capitals", "mistakes": 3 }
        ],
        "lowScoreTests": [{ "testId": "t2", "title": "Rivers", "percentage": 40 }],
        "recommendations": ["Retake Rivers"],
        "motivation": "  "
    }"#;
    let routes = Routes::from([
        ("/api/progress/test/result/t1", (200, history.to_owned())),
        ("/api/progress/overall", (200, overall.to_owned())),
        ("/api/analytics", (200, analytics.to_owned())),
    ]);
    let (base, recorded) = serve(routes).await;
    let http = backend(&base);

    let summary = http.test_history(&TestId::new("t1")).await.unwrap();
    assert_eq!(summary.test_title, "Capitals");
    assert_eq!(summary.attempts.len(), 2);
    assert_eq!(
        summary.best_attempt().map(|a| a.result_id().as_str()),
        Some("r2")
    );

    let stats = http.overall().await.unwrap();
    assert_eq!(stats.average.value(), 72.5);
    assert_eq!(stats.tests_taken, 4);

    let report = http.analytics().await.unwrap();
    let topics: Vec<_> = report
        .weak_topics_by_mistakes()
        .iter()
        .map(|t| t.topic.as_str())
        .collect();
    assert_eq!(topics, ["Capitals", "Rivers"]);
    assert_eq!(report.low_score_tests[0].test_id, Some(TestId::new("t2")));
    assert_eq!(report.low_score_tests[0].percentage.value(), 40.0);
    assert_eq!(report.motivation, None);

    let recorded = recorded.lock().unwrap().clone();
    assert!(recorded.iter().all(|r| r.request_line.starts_with("GET ")));
    assert!(
        recorded
            .iter()
            .all(|r| r.authorization.as_deref() == Some("Bearer secret"))
    );
}
