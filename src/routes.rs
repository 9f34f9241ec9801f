use std::sync::Arc;

use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::render::render_widget;
use crate::widget::VideosWidget;

pub struct AppState {
    pub widget: Arc<VideosWidget>,
    /// Cancelled on shutdown; also cancels refreshes started from the page.
    pub shutdown: CancellationToken,
}

// Template structs
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub title: String,
    pub widget: String,
    pub refreshing: bool,
}

#[derive(Template)]
#[template(path = "refresh_button.html")]
pub struct RefreshButtonTemplate {
    pub refreshing: bool,
}

// Custom error type
pub struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error: {}", self.0),
        )
            .into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        AppError(err.into())
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/widget", get(widget))
        .route("/refresh", post(refresh))
        .route("/refresh/status", get(refresh_status))
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn render_current(widget: &VideosWidget) -> Result<String, AppError> {
    let snapshot = widget.snapshot().await;
    Ok(render_widget(&snapshot, widget.config(), Utc::now())?)
}

// Route handlers
pub async fn index(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    let widget = render_current(&state.widget).await?;

    Ok(IndexTemplate {
        title: state.widget.config().title.clone(),
        widget,
        refreshing: state.widget.is_refreshing(),
    })
}

pub async fn widget(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    Ok(Html(render_current(&state.widget).await?))
}

pub async fn refresh(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, AppError> {
    // Spawn the refresh task
    let widget = state.widget.clone();
    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        widget.update(&shutdown).await;
    });

    // Return refreshing state immediately
    Ok(RefreshButtonTemplate { refreshing: true })
}

pub async fn refresh_status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let refreshing = state.widget.is_refreshing();
    Ok(RefreshButtonTemplate { refreshing })
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}
