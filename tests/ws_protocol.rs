//! End-to-end WebSocket protocol tests against a running server.

use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

use parley_gateway::core::llm::{
    BaseLlm, ChatMessage, GenerationDelta, GenerationStream, LlmFactory, LlmResult,
    ToolDefinition,
};
use parley_gateway::{AppState, ServerConfig, routes};

/// Factory whose clients replay a fixed delta script per generation.
struct ScriptedFactory {
    scripts: Mutex<Vec<Vec<GenerationDelta>>>,
}

impl ScriptedFactory {
    fn new(scripts: Vec<Vec<GenerationDelta>>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts),
        })
    }
}

struct ScriptedLlm {
    scripts: Mutex<Vec<Vec<GenerationDelta>>>,
}

#[async_trait]
impl BaseLlm for ScriptedLlm {
    async fn submit(
        &self,
        _messages: Vec<ChatMessage>,
        _tools: &[ToolDefinition],
    ) -> LlmResult<GenerationStream> {
        let mut scripts = self.scripts.lock();
        let deltas = if scripts.is_empty() {
            Vec::new()
        } else {
            scripts.remove(0)
        };
        let items: Vec<LlmResult<GenerationDelta>> = deltas.into_iter().map(Ok).collect();
        Ok(Box::pin(futures::stream::iter(items)))
    }

    fn provider_info(&self) -> &'static str {
        "scripted"
    }
}

impl LlmFactory for ScriptedFactory {
    fn create(&self) -> LlmResult<Box<dyn BaseLlm>> {
        let scripts = std::mem::take(&mut *self.scripts.lock());
        Ok(Box::new(ScriptedLlm {
            scripts: Mutex::new(scripts),
        }))
    }
}

type WsClient = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Boot a server with the given generation scripts and connect one call.
async fn connect_call(scripts: Vec<Vec<GenerationDelta>>) -> WsClient {
    let state = AppState::with_llm_factory(
        ServerConfig::default(),
        ScriptedFactory::new(scripts),
    )
    .unwrap();
    let app = routes::create_app(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let url = format!("ws://{addr}/llm-websocket/test-call");
    let (client, _response) = tokio_tungstenite::connect_async(&url).await.unwrap();
    client
}

/// Next text frame as JSON, skipping transport-level frames.
async fn recv_json(client: &mut WsClient) -> Value {
    loop {
        match client.next().await.expect("connection closed").unwrap() {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

async fn send_json(client: &mut WsClient, value: Value) {
    client
        .send(Message::Text(value.to_string().into()))
        .await
        .unwrap();
}

#[tokio::test]
async fn config_frame_arrives_first() {
    let mut client = connect_call(vec![]).await;

    let config = recv_json(&mut client).await;
    assert_eq!(config["response_type"], "config");
    assert_eq!(config["config"]["auto_reconnect"], true);
    assert_eq!(config["config"]["call_details"], true);
}

#[tokio::test]
async fn call_details_triggers_greeting_on_reserved_window() {
    let mut client = connect_call(vec![]).await;
    let _config = recv_json(&mut client).await;

    send_json(
        &mut client,
        json!({
            "interaction_type": "call_details",
            "call": {
                "call_id": "test-call",
                "from_number": "+15550177",
                "metadata": {"twilio_call_sid": "CA123"}
            }
        }),
    )
    .await;

    let greeting = recv_json(&mut client).await;
    assert_eq!(greeting["response_type"], "response");
    assert_eq!(greeting["response_id"], 0);
    assert_eq!(greeting["content_complete"], true);
    assert_eq!(greeting["end_call"], false);
    assert!(
        greeting["content"]
            .as_str()
            .unwrap()
            .contains("How may I assist you")
    );
}

#[tokio::test]
async fn ping_pong_echoes_timestamp() {
    let mut client = connect_call(vec![]).await;
    let _config = recv_json(&mut client).await;

    send_json(
        &mut client,
        json!({"interaction_type": "ping_pong", "timestamp": 42}),
    )
    .await;

    let pong = recv_json(&mut client).await;
    assert_eq!(pong["response_type"], "ping_pong");
    assert_eq!(pong["timestamp"], 42);
}

#[tokio::test]
async fn response_required_streams_partials_then_terminal() {
    let script = vec![vec![
        GenerationDelta::Text("Our hours".to_string()),
        GenerationDelta::Text(" are nine to five.".to_string()),
    ]];
    let mut client = connect_call(script).await;
    let _config = recv_json(&mut client).await;

    send_json(
        &mut client,
        json!({
            "interaction_type": "response_required",
            "response_id": 1,
            "transcript": [
                {"role": "user", "content": "What are your hours?"}
            ]
        }),
    )
    .await;

    let first = recv_json(&mut client).await;
    assert_eq!(first["response_id"], 1);
    assert_eq!(first["content"], "Our hours");
    assert_eq!(first["content_complete"], false);

    let second = recv_json(&mut client).await;
    assert_eq!(second["content"], " are nine to five.");
    assert_eq!(second["content_complete"], false);

    let terminal = recv_json(&mut client).await;
    assert_eq!(terminal["response_id"], 1);
    assert_eq!(terminal["content"], "");
    assert_eq!(terminal["content_complete"], true);
    assert_eq!(terminal["end_call"], false);
}

#[tokio::test]
async fn update_only_produces_no_frames() {
    let script = vec![vec![GenerationDelta::Text("Hello again.".to_string())]];
    let mut client = connect_call(script).await;
    let _config = recv_json(&mut client).await;

    send_json(
        &mut client,
        json!({
            "interaction_type": "update_only",
            "transcript": [
                {"role": "user", "content": "partial speech"}
            ]
        }),
    )
    .await;

    // The next frame must belong to the later turn, not the update.
    send_json(
        &mut client,
        json!({
            "interaction_type": "response_required",
            "response_id": 2,
            "transcript": [
                {"role": "user", "content": "hello?"}
            ]
        }),
    )
    .await;

    let frame = recv_json(&mut client).await;
    assert_eq!(frame["response_id"], 2);
    assert_eq!(frame["content"], "Hello again.");
}

#[tokio::test]
async fn binary_frame_closes_with_protocol_violation() {
    let mut client = connect_call(vec![]).await;
    let _config = recv_json(&mut client).await;

    client
        .send(Message::Binary(vec![0x01, 0x02, 0x03].into()))
        .await
        .unwrap();

    loop {
        match client.next().await.expect("expected close frame").unwrap() {
            Message::Close(Some(frame)) => {
                assert_eq!(u16::from(frame.code), 1007);
                break;
            }
            Message::Close(None) => panic!("close frame carried no code"),
            _ => continue,
        }
    }
}

#[tokio::test]
async fn undecodable_event_closes_with_protocol_violation() {
    let mut client = connect_call(vec![]).await;
    let _config = recv_json(&mut client).await;

    client
        .send(Message::Text("{\"interaction_type\": \"mystery\"}".into()))
        .await
        .unwrap();

    loop {
        match client.next().await.expect("expected close frame").unwrap() {
            Message::Close(Some(frame)) => {
                assert_eq!(u16::from(frame.code), 1007);
                break;
            }
            Message::Close(None) => panic!("close frame carried no code"),
            _ => continue,
        }
    }
}
