use crate::chat::Conversation;
use anyhow::Result;
use axum::{
    extract::{Form, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tower_http::cors::CorsLayer;

// -----------------------------------------------
// API REQUEST/RESPONSE MODELS
// -----------------------------------------------

/// Inbound SMS/WhatsApp gateway form post
#[derive(Debug, Deserialize)]
pub struct WebhookForm {
    #[serde(rename = "From")]
    pub from: String,

    #[serde(rename = "Body", default)]
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    pub user_id: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub processing_time_ms: Option<u64>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T, start_time: Instant) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            processing_time_ms: Some(start_time.elapsed().as_millis() as u64),
        }
    }

    fn err(error: impl Into<String>, start_time: Instant) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            processing_time_ms: Some(start_time.elapsed().as_millis() as u64),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub user_id: String,
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub user_id: String,
    pub removed: bool,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub active_sessions: usize,
    pub uptime_secs: u64,
}

// -----------------------------------------------
// APPLICATION STATE
// -----------------------------------------------

#[derive(Clone)]
pub struct AppState {
    conversation: Conversation,
    started_at: Instant,
}

impl AppState {
    pub fn new(conversation: Conversation) -> Self {
        Self {
            conversation,
            started_at: Instant::now(),
        }
    }
}

// -----------------------------------------------
// API HANDLERS
// -----------------------------------------------

/// GET / - Liveness text
async fn home() -> &'static str {
    "✅ option-scout webhook is running."
}

/// GET /api/health
async fn health(State(app_state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let start_time = Instant::now();
    let active_sessions = app_state.conversation.store().len().await;

    Json(ApiResponse::ok(
        HealthResponse {
            active_sessions,
            uptime_secs: app_state.started_at.elapsed().as_secs(),
        },
        start_time,
    ))
}

/// POST /whatsapp - One conversational turn, answered as TwiML
async fn whatsapp_webhook(
    State(app_state): State<AppState>,
    Form(form): Form<WebhookForm>,
) -> impl IntoResponse {
    let start_time = Instant::now();
    let reply = app_state.conversation.handle_turn(&form.from, &form.body).await;

    tracing::info!(
        user = %form.from,
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "webhook turn handled"
    );

    ([(header::CONTENT_TYPE, "text/xml")], twiml_message(&reply))
}

/// POST /api/turn - One conversational turn, answered as JSON
async fn post_turn(
    State(app_state): State<AppState>,
    Json(request): Json<TurnRequest>,
) -> (StatusCode, Json<ApiResponse<TurnResponse>>) {
    let start_time = Instant::now();

    if request.user_id.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::err("user_id must not be empty", start_time)),
        );
    }

    let reply = app_state.conversation.handle_turn(&request.user_id, &request.text).await;

    (
        StatusCode::OK,
        Json(ApiResponse::ok(
            TurnResponse {
                user_id: request.user_id,
                reply,
            },
            start_time,
        )),
    )
}

/// DELETE /api/sessions/{user_id} - Forget a user's conversation
async fn reset_session(
    State(app_state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<ApiResponse<ResetResponse>> {
    let start_time = Instant::now();
    let removed = app_state.conversation.store().reset(&user_id).await;

    tracing::info!(user = %user_id, removed, "session reset requested");

    Json(ApiResponse::ok(ResetResponse { user_id, removed }, start_time))
}

// -----------------------------------------------
// HELPER FUNCTIONS
// -----------------------------------------------

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap a reply in the gateway's XML envelope
pub fn twiml_message(message: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>\n    <Message>{}</Message>\n</Response>",
        escape_xml(message)
    )
}

// -----------------------------------------------
// SERVER SETUP
// -----------------------------------------------

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/api/health", get(health))
        .route("/whatsapp", post(whatsapp_webhook))
        .route("/api/turn", post(post_turn))
        .route("/api/sessions/{user_id}", delete(reset_session))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

pub async fn start_server(port: u16, conversation: Conversation) -> Result<()> {
    let app = build_router(AppState::new(conversation));

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(%addr, "option-scout server listening");
    println!("🚀 option-scout running on http://{}", addr);
    println!("📋 Available endpoints:");
    println!("   GET    /");
    println!("   GET    /api/health");
    println!("   POST   /whatsapp            (form: From, Body)");
    println!("   POST   /api/turn            (json: user_id, text)");
    println!("   DELETE /api/sessions/{{user_id}}");
    println!();

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twiml_escapes_markup() {
        let xml = twiml_message("Strike <52> & 'up'");
        assert!(xml.contains("<Message>Strike &lt;52&gt; &amp; &apos;up&apos;</Message>"));
        assert!(xml.starts_with("<?xml"));
    }
}
