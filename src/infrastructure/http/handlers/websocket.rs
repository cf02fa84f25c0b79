//! WebSocket Handler - 播放事件推送

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::infrastructure::http::state::AppState;

/// Session WebSocket：推送 StateChanged / Progress / Highlight / SessionClosed
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_session_socket(socket, session_id, state))
}

async fn handle_session_socket(socket: WebSocket, session_id: String, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    if !state.session_manager.is_valid(&session_id) {
        tracing::warn!(session_id = %session_id, "WebSocket connection rejected: invalid session");
        let _ = sender.close().await;
        return;
    }

    let mut event_rx = state.event_publisher.register_session(&session_id);

    tracing::info!(session_id = %session_id, "WebSocket connected");

    let forward_id = session_id.clone();
    let mut forward_task = tokio::spawn(async move {
        loop {
            let event = match event_rx.recv().await {
                Ok(event) => event,
                // 进度事件可以丢，继续转发最新的
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(session_id = %forward_id, skipped = skipped, "WebSocket subscriber lagged");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let msg = match serde_json::to_string(&event) {
                Ok(json) => Message::Text(json),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize event");
                    continue;
                }
            };

            if let Err(e) = sender.send(msg).await {
                tracing::debug!(session_id = %forward_id, error = %e, "Failed to send WebSocket message");
                break;
            }
        }
        let _ = sender.close().await;
    });

    // 客户端消息只用于保活
    let receive_id = session_id.clone();
    let session_manager = state.session_manager.clone();
    let mut receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!(session_id = %receive_id, "WebSocket closed by client");
                    break;
                }
                Ok(_) => session_manager.touch(&receive_id),
                Err(e) => {
                    tracing::debug!(session_id = %receive_id, error = %e, "WebSocket error");
                    break;
                }
            }
        }
    });

    // 等待被中止的任务结束，确保接收器已释放再清理通道
    tokio::select! {
        _ = &mut forward_task => {
            receive_task.abort();
            let _ = receive_task.await;
        }
        _ = &mut receive_task => {
            forward_task.abort();
            let _ = forward_task.await;
        }
    }

    state.event_publisher.prune_session(&session_id);
    tracing::info!(session_id = %session_id, "WebSocket disconnected");
}
