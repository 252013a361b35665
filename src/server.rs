use std::{any::Any, collections::HashMap, sync::Arc, time::Instant};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{ConnectInfo, DefaultBodyLimit, Query, Request, State},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::{Value, json};
use tower_http::catch_panic::CatchPanicLayer;

use crate::{
    discord::{DeliveryOutcome, DiscordClient, Notification, Source},
    fields,
    validate::{self, ValidationError},
};

pub const DEFAULT_BODY_LIMIT: usize = 5 * 1024 * 1024;

/// Log target of the one-line-per-request access log.
pub const ACCESS_LOG_TARGET: &str = "access";

const HEALTH_MESSAGE: &str = "Message server is running and ready to access connections !!";

/// Response envelope for everything except the plain `"OK"` acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RespMessage {
    pub success: bool,
    pub message: String,
    pub data: Option<Value>,
}

impl RespMessage {
    fn failure(status: StatusCode, message: String, data: Option<Value>) -> Response {
        let body = Self {
            success: false,
            message,
            data,
        };
        (status, Json(body)).into_response()
    }
}

/// Startup settings that shape the router.
#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    pub secure_headers: bool,
    pub body_limit: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            secure_headers: true,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

#[derive(Debug)]
pub struct AppState {
    pub discord: DiscordClient,
}

pub fn router(discord: DiscordClient, options: ServerOptions) -> Router {
    let state = Arc::new(AppState { discord });
    let mut app = Router::new()
        .route("/health-check", get(health_check))
        .route("/flowroute", post(flowroute_callback))
        .route("/voipms", get(voipms_callback))
        .with_state(state);
    if options.secure_headers {
        app = app.layer(middleware::from_fn(security_headers));
    }
    recover(app.layer(DefaultBodyLimit::max(options.body_limit)))
        .layer(middleware::from_fn(log_request))
}

/// Turns a panicking handler into a 500 response instead of a dropped connection.
fn recover(app: Router) -> Router {
    app.layer(CatchPanicLayer::custom(panic_response))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("<non-string panic>");
    log::error!("Handler panicked: {detail}");
    RespMessage::failure(
        StatusCode::INTERNAL_SERVER_ERROR,
        String::from("internal server error"),
        None,
    )
}

async fn health_check() -> Json<RespMessage> {
    Json(RespMessage {
        success: true,
        message: HEALTH_MESSAGE.to_owned(),
        data: None,
    })
}

async fn flowroute_callback(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let raw = String::from_utf8_lossy(&body);
    let fields = fields::format_or_fallback(&raw, Source::Flowroute.includes_timestamp());
    let notification = Notification::new(Source::Flowroute, fields);
    dispatch(state, notification).await
}

/// Query parameters as sent by VoIP.ms, re-shaped for formatting.
#[derive(Debug, Serialize)]
struct VoipmsMessage<'a> {
    to: &'a str,
    from: &'a str,
    message: &'a str,
    id: &'a str,
    timestamp: &'a str,
}

async fn voipms_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let [to, from, message, id, date] =
        match validate::required(&params, ["to", "from", "message", "id", "date"]) {
            Ok(values) => values,
            Err(e) => return validation_failure(&e),
        };
    let msg = VoipmsMessage {
        to,
        from,
        message,
        id,
        timestamp: date,
    };
    let fields = match serde_json::to_string(&msg) {
        Ok(raw) => fields::format_or_fallback(&raw, Source::Voipms.includes_timestamp()),
        Err(e) => {
            return RespMessage::failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), None);
        }
    };
    let notification = Notification::new(Source::Voipms, fields);
    dispatch(state, notification).await
}

fn validation_failure(err: &ValidationError) -> Response {
    log::warn!("Rejecting VoIP.ms callback: {err}");
    RespMessage::failure(
        StatusCode::BAD_REQUEST,
        err.to_string(),
        Some(json!({ "missing": err.missing })),
    )
}

/// Delivers on a separate task so a dropped inbound connection does not cancel the outbound call.
async fn dispatch(state: Arc<AppState>, notification: Notification) -> Response {
    let task = tokio::spawn(async move { state.discord.deliver(&notification).await });
    let outcome = task.await.unwrap_or_else(|e| DeliveryOutcome::Failed {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: format!("delivery task failed: {e}"),
    });
    match outcome {
        DeliveryOutcome::Delivered => (StatusCode::OK, Json("OK")).into_response(),
        DeliveryOutcome::Failed { status, message } => RespMessage::failure(status, message, None),
    }
}

async fn security_headers(request: Request, next: Next) -> Response {
    const HEADERS: [(&str, &str); 3] = [
        ("x-xss-protection", "1; mode=block"),
        ("x-content-type-options", "nosniff"),
        ("x-frame-options", "SAMEORIGIN"),
    ];

    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    for (name, value) in HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    response
}

async fn log_request(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let remote = request
        .extensions()
        .get::<ConnectInfo<std::net::SocketAddr>>()
        .map_or_else(|| String::from("-"), |info| info.0.to_string());

    let response = next.run(request).await;

    log::info!(
        target: ACCESS_LOG_TARGET,
        "{remote} {method} {uri} -> {} in {:?}",
        response.status().as_u16(),
        start.elapsed(),
    );
    response
}
