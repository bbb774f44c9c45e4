//! Arena: a minimal Greenroom deployment.
//!
//! Runs a coordinator with default lobby rules plus a 20 second round
//! limit, so a round always cycles back to the lobby even without a
//! game server reporting results. Point any WebSocket client at
//! port 8080 and watch the lobby traffic in plain JSON.

use std::time::Duration;

use greenroom::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), GreenroomError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = RoomConfig {
        round_limit: Some(Duration::from_secs(20)),
        ..RoomConfig::default()
    };

    tracing::info!("starting arena coordinator on 0.0.0.0:8080");

    let server = GreenroomServerBuilder::new()
        .bind("0.0.0.0:8080")
        .room_config(config)
        .build(OpenAdmission)
        .await?;

    server.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    type Ws = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn start() -> String {
        let config = RoomConfig {
            grace: Duration::from_millis(100),
            round_limit: Some(Duration::from_secs(20)),
            ..RoomConfig::default()
        };
        let server = GreenroomServerBuilder::new()
            .bind("127.0.0.1:0")
            .room_config(config)
            .build(OpenAdmission)
            .await
            .unwrap();
        let addr = server.local_addr().to_string();
        tokio::spawn(async move {
            let _ = server.run().await;
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        addr
    }

    async fn ws(addr: &str) -> Ws {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .unwrap();
        ws
    }

    async fn recv(ws: &mut Ws) -> Envelope<ServerMessage> {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout")
            .unwrap()
            .unwrap();
        serde_json::from_slice(&msg.into_data()).unwrap()
    }

    async fn send(ws: &mut Ws, msg: &ClientMessage) {
        let bytes = serde_json::to_vec(msg).unwrap();
        ws.send(Message::Binary(bytes.into())).await.unwrap();
    }

    // Smoke test: two clients connect, ready up, and a round starts.
    #[tokio::test]
    async fn test_ready_cycle_starts_round() {
        let addr = start().await;
        let mut p1 = ws(&addr).await;
        assert!(matches!(
            recv(&mut p1).await.message,
            ServerMessage::Init { host: true, .. }
        ));

        let mut p2 = ws(&addr).await;
        assert!(matches!(
            recv(&mut p2).await.message,
            ServerMessage::Init { host: false, .. }
        ));

        send(&mut p1, &ClientMessage::Ready).await;
        send(&mut p2, &ClientMessage::Ready).await;

        loop {
            if matches!(recv(&mut p2).await.message, ServerMessage::GameStart)
            {
                break;
            }
        }
    }
}
