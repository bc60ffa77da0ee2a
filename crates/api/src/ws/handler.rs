use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};

use crate::state::AppState;
use crate::ws::manager::StateFrame;

/// GET /api/v1/ws
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_client(socket, state))
}

async fn serve_client(socket: WebSocket, state: AppState) {
    let initial = StateFrame {
        summary: state.registry.aggregator().snapshot(),
        targets: state.registry.snapshots(),
    };
    let (id, mut frames) = match state.ws_manager.join(&initial).await {
        Ok(joined) => joined,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize initial state");
            return;
        }
    };
    tracing::info!(conn_id = %id, targets = initial.targets.len(), "Event-stream client joined");

    let (mut sink, mut inbound) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            if sink.send(Message::from(frame)).await.is_err() {
                break;
            }
        }
    });

    // Inbound frames carry nothing; writes go through PUT /pvs/{name}.
    while let Some(received) = inbound.next().await {
        match received {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %id, error = %e, "Event-stream receive error");
                break;
            }
        }
    }

    state.ws_manager.leave(&id).await;
    writer.abort();
    tracing::info!(conn_id = %id, "Event-stream client left");
}
