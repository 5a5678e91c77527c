pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::services::{
    auth_service::AuthService,
    generator_service::{GeminiClient, QuizGenerator, TextGenerator},
    quiz_service::QuizService,
    quiz_store::FileQuizStore,
    result_store::FileResultStore,
};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub quiz_service: QuizService,
    pub auth_service: AuthService,
}

impl AppState {
    /// State backed by the Gemini API and the configured data directory.
    pub fn new(config: Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.generation_timeout_secs);
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        let gemini = GeminiClient::new(
            config.gemini_api_key.clone(),
            &config.gemini_model,
            &config.gemini_api_base,
            http_client,
            timeout,
        )?;

        Ok(Self::with_generator(config, Arc::new(gemini)))
    }

    /// State using the given generation backend; stores live under `config.data_dir`.
    pub fn with_generator(config: Config, backend: Arc<dyn TextGenerator>) -> Self {
        let generator = QuizGenerator::new(
            backend,
            config.question_count,
            Duration::from_secs(config.generation_timeout_secs),
        );
        let quiz_service = QuizService::new(
            generator,
            Arc::new(FileQuizStore::new(&config.data_dir)),
            Arc::new(FileResultStore::new(&config.data_dir)),
        );
        let auth_service = AuthService::new(
            &config.instructor_password,
            &config.jwt_secret,
            config.session_ttl_hours,
            config.login_max_failures,
            Duration::from_secs(config.login_window_secs),
        );

        Self {
            config: Arc::new(config),
            quiz_service,
            auth_service,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let instructor_api = Router::new()
        .route(
            "/api/instructor/quiz",
            get(routes::instructor::get_quiz).post(routes::instructor::create_quiz),
        )
        .route(
            "/api/instructor/quiz/upload",
            post(routes::instructor::upload_quiz),
        )
        .route(
            "/api/instructor/results",
            get(routes::instructor::list_results),
        )
        .route(
            "/api/instructor/results/export",
            get(routes::export::export_marks),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_instructor,
        ));

    let student_api = Router::new()
        .route("/api/quiz", get(routes::student::get_quiz))
        .route("/api/quiz/submit", post(routes::student::submit))
        .layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::new_rps_state(state.config.public_rps),
            middleware::rate_limit::rps_middleware,
        ));

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/instructor/login", post(routes::instructor::login))
        .merge(instructor_api)
        .merge(student_api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
