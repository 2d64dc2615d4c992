use askama::Template;
use axum::extract::{Extension, MatchedPath, State};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::{HeaderName, StatusCode};
use axum::response::Html;
use axum::{Router, routing::get};
use migration::MigratorTrait;
use sea_orm::Database;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::{MakeSpan, TraceLayer};
use tracing::Span;
use utoipa::ToSchema;

use crate::cascade::web::create_cascade_router;
use crate::cascade::{CascadeService, Choice};
use crate::config::Config;
use crate::contact::FieldErrors;
use crate::contact::web::create_contact_router;
use crate::location::web::create_location_router;
use crate::notify::ConnectionRegistry;
use crate::notify::web::create_notify_router;
use crate::product::web::create_product_router;
use crate::render::{DualRender, ResponseMode};
use crate::status::web::create_status_router;
use crate::task::web::create_task_router;
use crate::task::{Task, TaskService};

pub mod api;

const GENERIC_ERROR_MESSAGE: &str =
    "An unexpected error occurred while processing your request. Please try again later.";

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<sea_orm::DatabaseConnection>,
    pub notifier: Arc<ConnectionRegistry>,
    /// Randomly perturb system statuses on every poll.
    pub simulate_status: bool,
}

impl AppState {
    pub fn new(db: sea_orm::DatabaseConnection, config: &Config) -> Self {
        Self {
            db: Arc::new(db),
            notifier: Arc::new(ConnectionRegistry::new(config.notification_capacity)),
            simulate_status: config.simulate_status,
        }
    }
}

/// Custom error type for web handler operations.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Represents an error during template rendering.
    /// The specific `askama::Error` is captured as the source of this error.
    #[error("Template rendering failed")]
    Template(#[from] askama::Error),
    /// Storage failure. Never shown to the caller.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("{0}")]
    NotFound(String),
    /// A single invalid input, e.g. a blank task title.
    #[error("{0}")]
    Invalid(String),
    /// Field-level problems of a submitted form.
    #[error("{} invalid field(s)", .0.len())]
    Validation(FieldErrors),
}

impl WebError {
    /// Logs the error at a level matching who is at fault.
    pub fn log(&self) {
        match self {
            WebError::Template(_) | WebError::Database(_) => {
                tracing::error!("Request failed: {}", self)
            }
            WebError::NotFound(_) | WebError::Invalid(_) | WebError::Validation(_) => {
                tracing::debug!("Request rejected: {}", self)
            }
        }
    }

    /// The message shown to the caller.
    fn public_message(&self) -> String {
        match self {
            WebError::Template(_) | WebError::Database(_) => GENERIC_ERROR_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }
}

/// Error body of a failed request.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    success: bool,
    error: String,
}

/// Error body of a rejected form, keyed by field name.
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidationErrorResponse {
    success: bool,
    errors: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ErrorPayload {
    Error(ErrorResponse),
    Validation(ValidationErrorResponse),
}

#[derive(Template)]
#[template(path = "partials/alert.html")]
struct AlertTemplate<'a> {
    message: &'a str,
}

#[derive(Template)]
#[template(path = "partials/form_errors.html")]
struct FormErrorsTemplate<'a> {
    errors: &'a FieldErrors,
}

impl DualRender for WebError {
    fn status(&self) -> StatusCode {
        match self {
            WebError::NotFound(_) => StatusCode::NOT_FOUND,
            WebError::Invalid(_) | WebError::Validation(_) => StatusCode::BAD_REQUEST,
            WebError::Template(_) | WebError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn payload(&self) -> impl Serialize + '_ {
        match self {
            WebError::Validation(errors) => ErrorPayload::Validation(ValidationErrorResponse {
                success: false,
                errors: errors
                    .iter()
                    .map(|(field, message)| (field.to_string(), message.clone()))
                    .collect(),
            }),
            _ => ErrorPayload::Error(ErrorResponse {
                success: false,
                error: self.public_message(),
            }),
        }
    }

    fn fragment(&self) -> askama::Result<String> {
        match self {
            WebError::Validation(errors) => FormErrorsTemplate { errors }.render(),
            _ => AlertTemplate {
                message: &self.public_message(),
            }
            .render(),
        }
    }
}

impl axum::response::IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!(
                "<h1>Internal Server Error</h1><p>{}</p>",
                GENERIC_ERROR_MESSAGE
            )),
        )
            .into_response()
    }
}

/// Span maker that keeps query strings out of the request logs.
///
/// Live search queries may contain names and email addresses.
#[derive(Clone, Debug)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let matched_path = request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str);
        tracing::info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
            matched_path,
        )
    }
}

/// Every pattern route, negotiating its response mode per request.
pub fn create_pattern_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(create_cascade_router(state.clone()))
        .merge(create_task_router(state.clone()))
        .merge(create_contact_router(state.clone()))
        .merge(create_product_router(state.clone()))
        .merge(create_status_router(state.clone()))
        .merge(create_location_router(state))
}

/// Builds the whole application.
///
/// Pattern routes are served three times: unprefixed with negotiation, under
/// `/api` as JSON and under `/htmx` as HTML fragments.
pub fn create_app(state: Arc<AppState>) -> Router {
    let patterns = create_pattern_router(state.clone());

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_check_handler))
        .route("/api-docs/openapi.json", get(api::openapi_handler))
        .with_state(state.clone())
        .merge(create_notify_router(state))
        .merge(patterns.clone())
        .nest(
            "/api",
            patterns
                .clone()
                .layer(Extension(ResponseMode::Structured)),
        )
        .nest("/htmx", patterns.layer(Extension(ResponseMode::Fragment)))
        .layer(
            ServiceBuilder::new()
                .layer(SetSensitiveRequestHeadersLayer::new([AUTHORIZATION, COOKIE]))
                .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
                .layer(CorsLayer::new().expose_headers([
                    HeaderName::from_static("hx-retarget"),
                    HeaderName::from_static("hx-reswap"),
                ])),
        )
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let state = Arc::new(AppState::new(db, &config));
    let notifier = state.notifier.clone();
    let app = create_app(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(notifier))
        .await?;
    tracing::info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal(notifier: Arc<ConnectionRegistry>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for the shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
    notifier.drain().await;
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

#[tracing::instrument(skip(state))]
pub async fn index_handler(State(state): State<Arc<AppState>>) -> Result<Html<String>, WebError> {
    let countries = CascadeService::new(&state.db).list_countries().await?;
    let tasks = TaskService::new(&state.db).list_tasks().await?;

    let template = IndexTemplate {
        countries: &countries,
        tasks: &tasks,
    };
    template.render().map(Html).map_err(WebError::from)
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    countries: &'a [Choice],
    tasks: &'a [Task],
}
