use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

use quiz_platform::{
    build_router, config::Config, error::Result, services::generator_service::TextGenerator,
    AppState,
};

const PASSWORD: &str = "correct horse battery staple";

struct StubGenerator {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

fn quiz_payload(count: usize) -> String {
    let letters = ["A", "B", "C", "D"];
    let questions: Vec<JsonValue> = (0..count)
        .map(|i| {
            json!({
                "question": format!("Question {}?", i + 1),
                "options": ["A. first", "B. second", "C. third", "D. fourth"],
                "correct": letters[i % 4],
                "explanation": format!("Explanation {}", i + 1)
            })
        })
        .collect();
    format!("```json\n{}\n```", json!({ "questions": questions }))
}

struct TestApp {
    app: Router,
    generator: Arc<StubGenerator>,
    data_dir: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.data_dir);
    }
}

fn setup_app(reply: String) -> TestApp {
    let data_dir = std::env::temp_dir().join(format!("quiz_api_{}", uuid::Uuid::new_v4()));
    let config = Config {
        server_address: "127.0.0.1:0".into(),
        data_dir: data_dir.clone(),
        gemini_api_key: "test-key".into(),
        gemini_model: "gemini-2.5-flash".into(),
        gemini_api_base: "http://localhost/".into(),
        instructor_password: PASSWORD.into(),
        jwt_secret: "test_secret_key".into(),
        session_ttl_hours: 1,
        generation_timeout_secs: 5,
        question_count: 10,
        public_rps: 1000,
        login_max_failures: 3,
        login_window_secs: 60,
    };
    let generator = Arc::new(StubGenerator {
        reply,
        prompts: Mutex::new(vec![]),
    });
    let app = build_router(AppState::with_generator(config, generator.clone()));
    TestApp {
        app,
        generator,
        data_dir,
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, JsonValue) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
    (status, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: JsonValue) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        json_request("POST", "/api/instructor/login", None, json!({ "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn create_quiz(
    app: &Router,
    token: &str,
    start: chrono::DateTime<Utc>,
    end: chrono::DateTime<Utc>,
) -> (StatusCode, JsonValue) {
    send(
        app,
        json_request(
            "POST",
            "/api/instructor/quiz",
            Some(token),
            json!({
                "topic": "SQL Injection",
                "start_time": start.to_rfc3339(),
                "end_time": end.to_rfc3339(),
            }),
        ),
    )
    .await
}

#[tokio::test]
async fn instructor_and_student_flow_end_to_end() {
    let t = setup_app(quiz_payload(10));
    let app = &t.app;

    let (status, _) = send(app, get_request("/api/quiz", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let token = login(app).await;
    let now = Utc::now();
    let (status, body) = create_quiz(app, &token, now - Duration::hours(1), now + Duration::hours(1)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total_questions"], 10);
    assert_eq!(body["preview"].as_array().unwrap().len(), 3);

    let prompts = t.generator.prompts.lock().unwrap().clone();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("SQL Injection"));

    let (status, body) = send(app, get_request("/api/quiz", None)).await;
    assert_eq!(status, StatusCode::OK);
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 10);
    assert_eq!(questions[0]["number"], 1);
    assert!(questions[0].get("correct").is_none());
    assert!(questions[0].get("explanation").is_none());

    let mut answers: Vec<JsonValue> = (0..10)
        .map(|i| json!(["A. first", "B. second", "C. third", "D. fourth"][i % 4]))
        .collect();
    answers[9] = JsonValue::Null;
    let (status, _) = send(
        app,
        json_request(
            "POST",
            "/api/quiz/submit",
            None,
            json!({ "student_name": "Ada Lovelace", "answers": answers }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, results) = send(app, get_request("/api/instructor/results", Some(&token))).await;
    assert_eq!(results["total"], 0);

    answers[9] = json!("A. first");
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/quiz/submit",
            None,
            json!({ "student_name": "Ada Lovelace", "answers": answers }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["student_name"], "Ada_Lovelace");
    assert_eq!(body["score"], 9);
    assert_eq!(body["total"], 10);
    assert!(body["result_id"].as_str().unwrap().starts_with("results_Ada_Lovelace_"));

    let (status, results) = send(app, get_request("/api/instructor/results", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results["total"], 1);
    assert_eq!(results["rows"][0]["student"], "Ada_Lovelace");
    assert_eq!(results["rows"][0]["score"], 9);

    let resp = app
        .clone()
        .oneshot(get_request("/api/instructor/results/export", Some(&token)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn instructor_routes_require_a_session() {
    let t = setup_app(quiz_payload(2));
    let app = &t.app;

    let (status, _) = send(app, get_request("/api/instructor/results", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(app, get_request("/api/instructor/results", Some("forged"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        app,
        json_request("POST", "/api/instructor/login", None, json!({ "password": "admin123" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn login_from(client: [u8; 4], password: &str) -> Request<Body> {
    let mut req = json_request(
        "POST",
        "/api/instructor/login",
        None,
        json!({ "password": password }),
    );
    req.extensions_mut()
        .insert(ConnectInfo(SocketAddr::from((client, 40000))));
    req
}

#[tokio::test]
async fn failed_logins_are_throttled_per_client() {
    let t = setup_app(quiz_payload(2));
    let app = &t.app;
    let attacker = [203, 0, 113, 9];
    let instructor = [192, 168, 1, 20];

    for _ in 0..3 {
        let (status, _) = send(app, login_from(attacker, "guess")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, _) = send(app, login_from(attacker, PASSWORD)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let (status, body) = send(app, login_from(instructor, PASSWORD)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());
}

#[tokio::test]
async fn expired_quiz_rejects_students() {
    let t = setup_app(quiz_payload(2));
    let app = &t.app;
    let token = login(app).await;

    let now = Utc::now();
    let (status, _) = create_quiz(app, &token, now - Duration::hours(2), now - Duration::seconds(1)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(app, get_request("/api/quiz", None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "quiz_expired");
    assert!(body.get("questions").is_none());

    let (status, _) = send(
        app,
        json_request(
            "POST",
            "/api/quiz/submit",
            None,
            json!({ "student_name": "Late", "answers": ["A. first", "B. second"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn future_quiz_is_not_started() {
    let t = setup_app(quiz_payload(2));
    let app = &t.app;
    let token = login(app).await;

    let now = Utc::now();
    let (status, _) = create_quiz(app, &token, now + Duration::hours(1), now + Duration::hours(2)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(app, get_request("/api/quiz", None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "quiz_not_started");
}

#[tokio::test]
async fn malformed_generation_is_reported_and_not_saved() {
    let t = setup_app("I'm sorry, I can't produce JSON today.".to_string());
    let app = &t.app;
    let token = login(app).await;

    let now = Utc::now();
    let (status, body) = create_quiz(app, &token, now - Duration::hours(1), now + Duration::hours(1)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("regenerate"));

    let (status, _) = send(app, get_request("/api/instructor/quiz", Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn inverted_window_and_blank_topic_are_bad_requests() {
    let t = setup_app(quiz_payload(2));
    let app = &t.app;
    let token = login(app).await;

    let now = Utc::now();
    let (status, _) = create_quiz(app, &token, now + Duration::hours(1), now).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        app,
        json_request(
            "POST",
            "/api/instructor/quiz",
            Some(&token),
            json!({ "topic": "   ", "start_time": "2025-01-01 09:00", "end_time": "2025-01-01 10:00" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(t.generator.prompts.lock().unwrap().is_empty());
}

fn upload_request(token: &str, topic: &str, file: Option<(&str, &str)>) -> Request<Body> {
    let now = Utc::now();
    let boundary = "quizboundary";
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"topic\"\r\n\r\n{topic}\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"start_time\"\r\n\r\n{start}\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"end_time\"\r\n\r\n{end}\r\n",
        b = boundary,
        topic = topic,
        start = (now - Duration::hours(1)).to_rfc3339(),
        end = (now + Duration::hours(1)).to_rfc3339(),
    );
    if let Some((name, text)) = file {
        body.push_str(&format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n\
             Content-Type: text/plain\r\n\r\n{text}\r\n",
            b = boundary,
            name = name,
            text = text,
        ));
    }
    body.push_str(&format!("--{}--\r\n", boundary));

    Request::builder()
        .method("POST")
        .uri("/api/instructor/quiz/upload")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn upload_uses_document_text() {
    let t = setup_app(quiz_payload(4));
    let app = &t.app;
    let token = login(app).await;

    let req = upload_request(
        &token,
        "Network Security",
        Some(("notes.txt", "Stateful firewalls track connections.")),
    );
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["total_questions"], 4);

    let prompts = t.generator.prompts.lock().unwrap().clone();
    assert!(prompts[0].contains("MAIN TOPIC:\nNetwork Security"));
    assert!(prompts[0].contains("Stateful firewalls track connections."));
}

#[tokio::test]
async fn upload_enforces_the_same_limits_as_json_creation() {
    let t = setup_app(quiz_payload(4));
    let app = &t.app;
    let token = login(app).await;
    let long_topic = "x".repeat(501);

    let (status, _) = send(app, upload_request(&token, &long_topic, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let now = Utc::now();
    let (status, _) = send(
        app,
        json_request(
            "POST",
            "/api/instructor/quiz",
            Some(&token),
            json!({
                "topic": long_topic,
                "start_time": (now - Duration::hours(1)).to_rfc3339(),
                "end_time": (now + Duration::hours(1)).to_rfc3339(),
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(t.generator.prompts.lock().unwrap().is_empty());
}
