//! Websocket connection to the Gemini Live endpoint.
//!
//! Outgoing microphone chunks are written straight to the socket. Incoming
//! frames are buffered by a reader task until the shell polls for them with
//! its output clock.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::config::GenAiSettings;
use crate::core::audio::PcmBlob;
use crate::services::voice::{LiveSetup, VoiceError, VoiceTransport};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Serialize)]
struct SetupFrame<'a> {
    setup: &'a LiveSetup,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RealtimeInputFrame<'a> {
    realtime_input: MediaChunks<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MediaChunks<'a> {
    media_chunks: [&'a PcmBlob; 1],
}

struct Connection {
    sink: SplitSink<Socket, Message>,
    inbound: mpsc::UnboundedReceiver<String>,
    reader: JoinHandle<()>,
}

/// Live voice transport over a websocket
pub struct LiveVoiceTransport {
    url: String,
    api_key: String,
    connection: Mutex<Option<Connection>>,
}

impl LiveVoiceTransport {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            connection: Mutex::new(None),
        }
    }

    pub fn from_settings(settings: &GenAiSettings) -> Self {
        Self::new(settings.live_url.clone(), settings.api_key.clone())
    }

    fn endpoint(&self) -> Result<String, VoiceError> {
        if self.api_key.trim().is_empty() {
            return Err(VoiceError::Transport("API key not configured".to_string()));
        }
        Ok(format!("{}?key={}", self.url, urlencoding::encode(&self.api_key)))
    }
}

fn transport_error(e: tungstenite::Error) -> VoiceError {
    VoiceError::Transport(e.to_string())
}

/// Buffer text frames until the server hangs up
async fn read_frames(mut stream: SplitStream<Socket>, tx: mpsc::UnboundedSender<String>) {
    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            // the live endpoint sends JSON in binary frames too
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!("Dropping non-UTF-8 live frame: {}", e);
                    continue;
                }
            },
            Ok(Message::Close(frame)) => {
                tracing::info!("Live server closed the connection: {:?}", frame);
                break;
            }
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!("Live connection failed: {}", e);
                break;
            }
        };

        if tx.send(text).is_err() {
            break;
        }
    }
}

#[async_trait]
impl VoiceTransport for LiveVoiceTransport {
    async fn open(&self, setup: &LiveSetup) -> Result<(), VoiceError> {
        let endpoint = self.endpoint()?;
        let (socket, _) = connect_async(endpoint.as_str()).await.map_err(transport_error)?;
        let (mut sink, stream) = socket.split();

        let hello = serde_json::to_string(&SetupFrame { setup })?;
        sink.send(Message::Text(hello)).await.map_err(transport_error)?;

        let (tx, inbound) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_frames(stream, tx));

        let previous = self
            .connection
            .lock()
            .await
            .replace(Connection { sink, inbound, reader });
        if let Some(previous) = previous {
            previous.reader.abort();
        }

        tracing::info!("Live voice connection open with {}", setup.model);
        Ok(())
    }

    async fn send_audio(&self, chunk: &PcmBlob) -> Result<(), VoiceError> {
        let frame = serde_json::to_string(&RealtimeInputFrame {
            realtime_input: MediaChunks { media_chunks: [chunk] },
        })?;

        let mut connection = self.connection.lock().await;
        let connection = connection
            .as_mut()
            .ok_or_else(|| VoiceError::Transport("connection closed".to_string()))?;
        connection
            .sink
            .send(Message::Text(frame))
            .await
            .map_err(transport_error)
    }

    async fn drain(&self) -> Vec<String> {
        let mut connection = self.connection.lock().await;
        let Some(connection) = connection.as_mut() else {
            return Vec::new();
        };

        let mut messages = Vec::new();
        while let Ok(message) = connection.inbound.try_recv() {
            messages.push(message);
        }
        messages
    }

    async fn close(&self) {
        let Some(mut connection) = self.connection.lock().await.take() else {
            return;
        };

        if let Err(e) = connection.sink.send(Message::Close(None)).await {
            tracing::debug!("Close frame not delivered: {}", e);
        }
        connection.reader.abort();
        tracing::info!("Live voice connection closed");
    }
}

impl Drop for LiveVoiceTransport {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.get_mut().take() {
            connection.reader.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audio::encode_pcm;
    use crate::core::prompts::LIVE_AUDIO_MODEL;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_hdr_async;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

    const INTERRUPTED: &str = r#"{"serverContent":{"interrupted":true}}"#;

    /// Local live endpoint: records the query string and the first two client
    /// frames, answers with one server message, then waits for the close frame
    async fn live_server() -> (String, JoinHandle<(Option<String>, Vec<String>)>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut query = None;
            let capture = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                query = req.uri().query().map(str::to_string);
                Ok(resp)
            };
            let mut socket = accept_hdr_async(tcp, capture).await.unwrap();

            let mut received = Vec::new();
            while received.len() < 2 {
                match socket.next().await {
                    Some(Ok(Message::Text(text))) => received.push(text),
                    Some(Ok(_)) => continue,
                    _ => break,
                }
            }

            socket.send(Message::Text(INTERRUPTED.to_string())).await.unwrap();
            while let Some(Ok(frame)) = socket.next().await {
                if frame.is_close() {
                    break;
                }
            }
            (query, received)
        });

        (format!("ws://{}/live", addr), server)
    }

    #[tokio::test]
    async fn test_streams_setup_and_audio_over_socket() {
        let (url, server) = live_server().await;
        let transport = LiveVoiceTransport::new(url, "test-key");

        transport.open(&LiveSetup::assistant()).await.unwrap();
        transport.send_audio(&encode_pcm(&[0.0, 0.5])).await.unwrap();

        let mut messages = Vec::new();
        for _ in 0..200 {
            messages = transport.drain().await;
            if !messages.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(messages, vec![INTERRUPTED.to_string()]);

        transport.close().await;
        let (query, received) = server.await.unwrap();

        assert_eq!(query.as_deref(), Some("key=test-key"));
        let setup: serde_json::Value = serde_json::from_str(&received[0]).unwrap();
        assert_eq!(setup["setup"]["model"], format!("models/{}", LIVE_AUDIO_MODEL));
        let audio: serde_json::Value = serde_json::from_str(&received[1]).unwrap();
        assert_eq!(audio["realtimeInput"]["mediaChunks"][0]["data"], "AAAAQA==");
        assert_eq!(audio["realtimeInput"]["mediaChunks"][0]["mimeType"], "audio/pcm;rate=16000");
    }

    #[tokio::test]
    async fn test_missing_key_never_connects() {
        let transport = LiveVoiceTransport::new("ws://127.0.0.1:9/live", " ");

        let err = transport.open(&LiveSetup::assistant()).await.unwrap_err();
        assert!(matches!(err, VoiceError::Transport(ref msg) if msg.contains("API key")));
        assert!(transport.drain().await.is_empty());
        assert!(matches!(
            transport.send_audio(&encode_pcm(&[0.0])).await,
            Err(VoiceError::Transport(_))
        ));
    }
}
