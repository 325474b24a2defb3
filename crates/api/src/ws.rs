use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use tokio::sync::broadcast::error::RecvError;

use crate::{feed::ServerEvent, state::AppState};

pub async fn events_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| stream_events(socket, state))
}

async fn stream_events(mut socket: WebSocket, state: AppState) {
    let mut events = state.subscribe_events();
    let connected = ServerEvent::Connected {
        run_id: state.active_run_id().await,
    };
    if send_event(&mut socket, &connected).await.is_err() {
        return;
    }
    tracing::debug!("event stream client connected");

    loop {
        tokio::select! {
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | None => return,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => return,
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if send_event(&mut socket, &event).await.is_err() {
                            return;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "event stream client lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => return,
                }
            }
        }
    }
}

async fn send_event(socket: &mut WebSocket, event: &ServerEvent) -> Result<(), ()> {
    let payload = event_json(event)?;
    socket.send(Message::Text(payload)).await.map_err(|_| ())
}

fn event_json(event: &ServerEvent) -> Result<String, ()> {
    serde_json::to_string(event).map_err(|err| {
        tracing::warn!(error = %err, "failed to serialize server event");
    })
}
