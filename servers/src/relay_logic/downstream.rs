use crate::relay_logic::config::Config;
use crate::relay_logic::model::{ClientMessage, PingRecord, PingRequest};
use crate::relay_logic::state::AppState;
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_server::tls_rustls::RustlsConfig;
use chrono::Utc;
use futures_util::StreamExt;
use lib_common::model::ServerEvent;
use lib_common::parsers::fields;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;

static NEXT_CLIENT_ID: AtomicUsize = AtomicUsize::new(1);

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/status", get(status_handler))
        .route("/api/server/push", post(push_handler))
        .route("/api/server/pull", get(pull_handler))
        .route("/api/ping", post(ping_handler))
        .route("/api/logs", get(logs_handler))
        .route("/api/discord/stats", get(stats_handler))
        .route("/api/discord/queue", get(queue_handler))
        .route("/api/discord/pause", post(pause_handler))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

pub async fn run(
    config: Config,
    app_state: AppState,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let app = router(app_state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port()));

    if let Some((cert_path, key_path)) = config.tls_paths() {
        let tls_config = RustlsConfig::from_pem_file(&cert_path, &key_path)
            .await
            .with_context(|| format!("loading TLS certificate {}", cert_path.display()))?;

        let handle = axum_server::Handle::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            shutdown.recv().await.ok();
            log::info!("Downstream server shutting down.");
            shutdown_handle.graceful_shutdown(Some(Duration::from_secs(5)));
        });

        log::info!("Downstream server listening on https://{}", addr);
        axum_server::bind_rustls(addr, tls_config)
            .handle(handle)
            .serve(app.into_make_service())
            .await
            .context("TLS server failed")?;
    } else {
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("binding {}", addr))?;
        log::info!("Downstream server listening on http://{}", addr);
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.recv().await.ok();
                log::info!("Downstream server shutting down.");
            })
            .await
            .context("HTTP server failed")?;
    }
    Ok(())
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn status_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "online",
        "queue_size": state.queue().len(),
        "websocket_clients": state.dispatcher().client_count(),
        "timestamp": now_rfc3339(),
    }))
}

/// External producers push an already-normalized event; it skips the filter.
/// Malformed fields are dropped and the high-value flag is recomputed; an event
/// with nothing left is refused.
async fn push_handler(State(state): State<AppState>, body: Bytes) -> (StatusCode, Json<Value>) {
    if body.iter().all(u8::is_ascii_whitespace) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "message": "No data provided" })),
        );
    }

    let mut event: ServerEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "message": format!("Invalid server JSON: {}", e) })),
            );
        }
    };

    fields::sanitize_event(&mut event);
    if event.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "message": "Server data has no usable fields" })),
        );
    }

    let receipt = state.pipeline.relay(&event);
    log::info!(
        "Server pushed over HTTP: {} (queue size {})",
        event.name.as_deref().unwrap_or("<unnamed>"),
        receipt.queue_size
    );
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Server added to queue",
            "queue_size": receipt.queue_size,
        })),
    )
}

async fn pull_handler(State(state): State<AppState>) -> Json<Value> {
    let entry = state.queue().pop_oldest();
    Json(json!({
        "status": "success",
        "data": entry.map(|e| e.event),
        "queue_size": state.queue().len(),
    }))
}

async fn ping_handler(State(state): State<AppState>, body: Bytes) -> Json<Value> {
    let request: PingRequest = serde_json::from_slice(&body).unwrap_or_default();
    let timestamp = now_rfc3339();
    state.record_ping(PingRecord {
        source: request.source.unwrap_or_else(|| "unknown".to_string()),
        timestamp: timestamp.clone(),
    });
    Json(json!({ "success": true, "message": "Pong", "timestamp": timestamp }))
}

async fn logs_handler(State(state): State<AppState>) -> Json<Value> {
    let logs = state.recent_pings();
    Json(json!({ "count": logs.len(), "logs": logs }))
}

async fn stats_handler(State(state): State<AppState>) -> Json<Value> {
    let queue = state.queue();
    let stats = state.pipeline.stats().snapshot(queue.overflow_drops());
    let upstream = state.upstream.snapshot().await;
    Json(json!({
        "success": true,
        "stats": {
            "counters": stats,
            "queue_size": queue.len(),
            "websocket_clients": state.dispatcher().client_count(),
            "upstream": upstream,
        },
    }))
}

async fn queue_handler(State(state): State<AppState>) -> Json<Value> {
    let rows: Vec<Value> = state
        .queue()
        .snapshot()
        .into_iter()
        .map(|row| {
            let mut value = serde_json::to_value(&row.event).unwrap_or_else(|_| json!({}));
            if let Some(obj) = value.as_object_mut() {
                obj.insert("timestamp".into(), json!(row.enqueued_wall.to_rfc3339()));
                obj.insert("age_seconds".into(), json!(row.age.as_secs_f64()));
                obj.insert("time_remaining".into(), json!(row.time_remaining.as_secs_f64()));
            }
            value
        })
        .collect();
    Json(json!({ "success": true, "total": rows.len(), "queue": rows }))
}

/// Replaces the desktop hotkey: flips the upstream pause flag.
async fn pause_handler(State(state): State<AppState>) -> Json<Value> {
    let paused = state.upstream.toggle_pause();
    Json(json!({ "success": true, "paused": paused }))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

fn handle_client_text(client_id: &str, text: &str) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Status { status }) => log::info!("Client {} status: {}", client_id, status),
        Ok(ClientMessage::Log { message }) => log::info!("Client {} log: {}", client_id, message),
        Err(_) => log::debug!("Client {} sent unrecognised frame: {}", client_id, text),
    }
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let client_id = format!("ws-{}", NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed));
    let mut subscription = state.dispatcher().register(&client_id);
    log::info!("Client {} connected", client_id);

    loop {
        tokio::select! {
            biased;
            // Removal wins over any line already queued for this client.
            _ = subscription.cancelled.cancelled() => break,
            line = subscription.lines.recv() => {
                let Some(line) = line else { break };
                if socket.send(Message::Text(line.to_string().into())).await.is_err() {
                    break; // client disconnected
                }
            }
            msg = socket.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => handle_client_text(&client_id, text.as_str()),
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.dispatcher().unregister(&client_id);
    log::info!("Client {} disconnected", client_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_common::configs::RelayConfig;

    fn state() -> AppState {
        AppState::new(RelayConfig::default())
    }

    #[tokio::test]
    async fn test_push_then_pull_drains_fifo() {
        let state = state();
        for name in ["first", "second"] {
            let body = Bytes::from(format!(r#"{{"name":"{name}","money":1.5,"players":"2/8"}}"#));
            let (status, Json(resp)) = push_handler(State(state.clone()), body).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(resp["success"], true);
        }

        let Json(resp) = pull_handler(State(state.clone())).await;
        assert_eq!(resp["data"]["name"], "first");
        assert_eq!(resp["queue_size"], 1);

        let Json(resp) = pull_handler(State(state.clone())).await;
        assert_eq!(resp["data"]["name"], "second");

        let Json(resp) = pull_handler(State(state)).await;
        assert!(resp["data"].is_null());
        assert_eq!(resp["queue_size"], 0);
    }

    #[tokio::test]
    async fn test_push_rejects_empty_and_invalid_bodies() {
        let state = state();
        let (status, _) = push_handler(State(state.clone()), Bytes::new()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, Json(resp)) = push_handler(State(state.clone()), Bytes::from_static(b"{oops")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["success"], false);
        assert!(state.queue().is_empty());
    }

    #[tokio::test]
    async fn test_push_refuses_empty_events_and_cleans_fields() {
        let state = state();
        let (status, Json(resp)) = push_handler(State(state.clone()), Bytes::from_static(b"{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp["success"], false);

        let body = Bytes::from_static(br#"{"money":-5.0,"job_id":"nope","players":"9","is_10m_plus":true}"#);
        let (status, _) = push_handler(State(state.clone()), body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(state.queue().is_empty());

        let body = Bytes::from_static(br#"{"name":"Foo","money":2.0,"players":"1/2/3","is_10m_plus":true}"#);
        let (status, _) = push_handler(State(state.clone()), body).await;
        assert_eq!(status, StatusCode::OK);
        let queued = state.queue().pop_oldest().unwrap().event;
        assert_eq!(queued.name.as_deref(), Some("Foo"));
        assert_eq!(queued.players, None);
        assert!(!queued.is_high_value);
    }

    #[tokio::test]
    async fn test_push_is_broadcast_to_listeners() {
        let state = state();
        let mut sub = state.dispatcher().register("listener");
        let body = Bytes::from_static(br#"{"name":"Foo","money":15.0,"is_10m_plus":true}"#);
        push_handler(State(state.clone()), body).await;

        let line = sub.lines.try_recv().unwrap();
        assert_eq!(&*line, "name=Foo|money=15.0|players=|job_id=|script=|is_10m_plus=true");
    }

    #[tokio::test]
    async fn test_ping_and_logs() {
        let state = state();
        let Json(resp) = ping_handler(State(state.clone()), Bytes::from_static(br#"{"source":"roblox"}"#)).await;
        assert_eq!(resp["message"], "Pong");
        ping_handler(State(state.clone()), Bytes::new()).await;

        let Json(resp) = logs_handler(State(state)).await;
        assert_eq!(resp["count"], 2);
        assert_eq!(resp["logs"][0]["source"], "roblox");
        assert_eq!(resp["logs"][1]["source"], "unknown");
    }

    #[tokio::test]
    async fn test_queue_view_has_age_and_remaining() {
        let state = state();
        state.pipeline.relay(&ServerEvent {
            name: Some("Foo".into()),
            ..Default::default()
        });

        let Json(resp) = queue_handler(State(state)).await;
        assert_eq!(resp["total"], 1);
        let row = &resp["queue"][0];
        assert_eq!(row["name"], "Foo");
        assert!(row["age_seconds"].as_f64().unwrap() >= 0.0);
        assert!(row["time_remaining"].as_f64().unwrap() <= 10.0);
    }

    #[tokio::test]
    async fn test_pause_toggles_and_stats_report_it() {
        let state = state();
        let Json(resp) = pause_handler(State(state.clone())).await;
        assert_eq!(resp["paused"], true);

        let Json(resp) = stats_handler(State(state.clone())).await;
        assert_eq!(resp["stats"]["upstream"]["paused"], true);
        assert_eq!(resp["stats"]["upstream"]["status"], "disconnected");
        assert_eq!(resp["stats"]["counters"]["servers_sent"], 0);

        let Json(resp) = pause_handler(State(state)).await;
        assert_eq!(resp["paused"], false);
    }

    #[tokio::test]
    async fn test_status_reports_online() {
        let Json(resp) = status_handler(State(state())).await;
        assert_eq!(resp["status"], "online");
        assert_eq!(resp["websocket_clients"], 0);
    }
}
