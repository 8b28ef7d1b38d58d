use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};

use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::{debug, info, warn};
use rst_common::with_tokio::tokio::net::TcpStream;
use rst_common::with_tokio::tokio::sync::Mutex;
use rst_common::with_tokio::tokio::task::JoinHandle;
use rst_common::with_tokio::tokio::{self, time::timeout};

use tokio_tungstenite::tungstenite::Message as Frame;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::connection::types::ConnectionError;

use super::{InboundRouter, TransportDriver};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// An open socket: the write half and the task reading the other half
struct OpenSocket {
    writer: SplitSink<Socket, Frame>,
    reader: JoinHandle<()>,
}

impl OpenSocket {
    fn is_alive(&self) -> bool {
        !self.reader.is_finished()
    }
}

impl Drop for OpenSocket {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// `SocketDriver` keeps at most one websocket open to the partner
///
/// The socket is opened lazily by the first `send`. The async mutex around it
/// makes concurrent first sends wait for the same connect instead of racing.
pub struct SocketDriver {
    endpoint: String,
    router: Arc<InboundRouter>,
    connect_timeout: Duration,
    write_timeout: Duration,
    socket: Mutex<Option<OpenSocket>>,
}

impl SocketDriver {
    pub fn new(
        endpoint: &str,
        router: Arc<InboundRouter>,
        connect_timeout: Duration,
        write_timeout: Duration,
    ) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            router,
            connect_timeout,
            write_timeout,
            socket: Mutex::new(None),
        }
    }

    pub async fn is_open(&self) -> bool {
        self.socket
            .lock()
            .await
            .as_ref()
            .is_some_and(|socket| socket.is_alive())
    }

    async fn open(&self) -> Result<OpenSocket, ConnectionError> {
        debug!("[socket] opening: {}", self.endpoint);

        let (stream, _) = timeout(self.connect_timeout, connect_async(self.endpoint.as_str()))
            .await
            .map_err(|_| {
                ConnectionError::TransportError(format!(
                    "connect to {} timed out",
                    self.endpoint
                ))
            })?
            .map_err(|err| ConnectionError::TransportError(err.to_string()))?;

        let (writer, stream) = stream.split();
        let reader = tokio::spawn(read_frames(stream, self.router.clone()));

        info!("[socket] opened: {}", self.endpoint);
        Ok(OpenSocket { writer, reader })
    }
}

/// `read_frames` processes inbound frames one at a time, in the order the
/// transport delivered them
async fn read_frames(mut stream: SplitStream<Socket>, router: Arc<InboundRouter>) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Frame::Text(text)) => router.route_logged(text.as_bytes()).await,
            Ok(Frame::Binary(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => router.route_logged(text.as_bytes()).await,
                Err(err) => {
                    warn!("[socket] binary frame is not utf-8 text: {}", err);
                    router.report(&ConnectionError::DecodeError(err.to_string()));
                }
            },
            Ok(Frame::Close(_)) => {
                debug!("[socket] closed by peer");
                break;
            }
            Ok(_) => {}
            Err(err) => {
                warn!("[socket] stream error: {}", err);
                router.report(&ConnectionError::TransportError(err.to_string()));
                break;
            }
        }
    }
}

#[async_trait]
impl TransportDriver for SocketDriver {
    async fn send(&self, packed: Vec<u8>) -> Result<(), ConnectionError> {
        let mut guard = self.socket.lock().await;

        if guard.as_ref().is_some_and(|socket| !socket.is_alive()) {
            debug!("[socket] previous socket is gone, reopening");
            *guard = None;
        }

        if guard.is_none() {
            *guard = Some(self.open().await?);
        }

        let socket = guard
            .as_mut()
            .ok_or_else(|| ConnectionError::TransportError("socket is not open".to_string()))?;

        let written = timeout(self.write_timeout, socket.writer.send(Frame::Binary(packed))).await;
        match written {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => {
                *guard = None;
                Err(ConnectionError::TransportError(err.to_string()))
            }
            Err(_) => {
                *guard = None;
                Err(ConnectionError::TransportError(
                    "socket write timed out".to_string(),
                ))
            }
        }
    }

    fn needs_return_route_poll(&self) -> bool {
        false
    }

    async fn close(&self) {
        let socket = self.socket.lock().await.take();
        if let Some(mut socket) = socket {
            if let Err(err) = socket.writer.close().await {
                debug!("[socket] close: {}", err);
            }
            info!("[socket] closed: {}", self.endpoint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use rst_common::standard::serde_json::json;
    use rst_common::with_tokio::tokio::net::TcpListener;
    use rst_common::with_tokio::tokio::time::sleep;

    use tokio_tungstenite::accept_async;

    use crate::connection::message::Message;
    use crate::connection::transport::testing::*;
    use crate::connection::types::ConnectionID;

    fn driver(endpoint: &str, router: Arc<InboundRouter>) -> SocketDriver {
        SocketDriver::new(
            endpoint,
            router,
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
    }

    fn router_with(
        endpoint: &str,
        handler: Option<Arc<ChannelHandler>>,
        reporter: Option<Arc<CollectingReporter>>,
    ) -> Arc<InboundRouter> {
        Arc::new(InboundRouter::new(
            ConnectionID::generate(),
            local_codec(endpoint),
            handler.map(|h| h as Arc<dyn crate::connection::types::InboundHandler>),
            reporter.map(|r| r as Arc<dyn crate::connection::types::ErrorReporter>),
        ))
    }

    /// A partner that answers every envelope with a text and a binary reply
    async fn spawn_partner(accepted: Arc<AtomicUsize>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let (tcp, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => break,
                };
                accepted.fetch_add(1, Ordering::SeqCst);

                tokio::spawn(async move {
                    let mut ws = accept_async(tcp).await.unwrap();
                    let codec = partner_codec();

                    while let Some(Ok(frame)) = ws.next().await {
                        let Frame::Binary(bytes) = frame else {
                            continue;
                        };

                        let incoming = codec.open(&bytes).await.unwrap();
                        let seq = incoming.get_field("seq").cloned().unwrap_or(json!(0));

                        let text_reply = Message::from_value(json!({"seq": seq, "frame": "text"})).unwrap();
                        let packed = codec.seal(text_reply).await.unwrap();
                        ws.send(Frame::Text(String::from_utf8(packed).unwrap()))
                            .await
                            .unwrap();

                        let binary_reply =
                            Message::from_value(json!({"seq": seq, "frame": "binary"})).unwrap();
                        let packed = codec.seal(binary_reply).await.unwrap();
                        ws.send(Frame::Binary(packed)).await.unwrap();
                    }
                });
            }
        });

        format!("ws://{}", addr)
    }

    /// A partner that closes the socket after the first envelope
    async fn spawn_closing_partner(accepted: Arc<AtomicUsize>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((tcp, _)) = listener.accept().await {
                accepted.fetch_add(1, Ordering::SeqCst);

                tokio::spawn(async move {
                    let mut ws = accept_async(tcp).await.unwrap();
                    if let Some(Ok(_)) = ws.next().await {
                        let _ = ws.close(None).await;
                    }
                });
            }
        });

        format!("ws://{}", addr)
    }

    #[tokio::test]
    async fn test_send_and_receive_frames_in_order() {
        let accepted = Arc::new(AtomicUsize::new(0));
        let endpoint = spawn_partner(accepted.clone()).await;

        let (handler, mut rx) = ChannelHandler::new();
        let router = router_with(&endpoint, Some(handler), None);
        let driver = driver(&endpoint, router.clone());

        let message = Message::from_value(json!({"seq": 1})).unwrap();
        let packed = router.codec().seal(message).await.unwrap();
        driver.send(packed).await.unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.get_field("frame"), Some(&json!("text")));
        assert_eq!(second.get_field("frame"), Some(&json!("binary")));
        assert_eq!(second.get_field("seq"), Some(&json!(1)));

        assert!(driver.is_open().await);
        assert!(!driver.needs_return_route_poll());
        driver.close().await;
        assert!(!driver.is_open().await);
    }

    #[tokio::test]
    async fn test_concurrent_sends_share_one_socket() {
        let accepted = Arc::new(AtomicUsize::new(0));
        let endpoint = spawn_partner(accepted.clone()).await;

        let (handler, mut rx) = ChannelHandler::new();
        let router = router_with(&endpoint, Some(handler), None);
        let driver = Arc::new(driver(&endpoint, router.clone()));

        let mut tasks = Vec::new();
        for seq in 0..4 {
            let driver = driver.clone();
            let router = router.clone();
            tasks.push(tokio::spawn(async move {
                let message = Message::from_value(json!({"seq": seq})).unwrap();
                let packed = router.codec().seal(message).await.unwrap();
                driver.send(packed).await
            }));
        }

        for task in tasks {
            assert!(task.await.unwrap().is_ok());
        }

        for _ in 0..8 {
            assert!(rx.recv().await.is_some());
        }
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reopens_after_peer_close() {
        let accepted = Arc::new(AtomicUsize::new(0));
        let endpoint = spawn_closing_partner(accepted.clone()).await;

        let router = router_with(&endpoint, None, None);
        let driver = driver(&endpoint, router.clone());

        let packed = router.codec().seal(Message::new("test/1.0/one")).await.unwrap();
        driver.send(packed).await.unwrap();

        for _ in 0..50 {
            if !driver.is_open().await {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
        assert!(!driver.is_open().await);

        let packed = router.codec().seal(Message::new("test/1.0/two")).await.unwrap();
        driver.send(packed).await.unwrap();
        assert_eq!(accepted.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_connect_failure_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("ws://{}", listener.local_addr().unwrap());
        drop(listener);

        let router = router_with(&endpoint, None, None);
        let driver = driver(&endpoint, router);

        let sent = driver.send(b"payload".to_vec()).await;
        assert!(matches!(
            sent.unwrap_err(),
            ConnectionError::TransportError(_)
        ));
        assert!(!driver.is_open().await);
    }

    #[tokio::test]
    async fn test_broken_inbound_frame_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("ws://{}", listener.local_addr().unwrap());

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(tcp).await.unwrap();
            if let Some(Ok(_)) = ws.next().await {
                ws.send(Frame::Text("garbage".to_string())).await.unwrap();
                ws.send(Frame::Binary(vec![0xff, 0xfe])).await.unwrap();

                let reply = partner_codec().seal(Message::new("test/1.0/ok")).await.unwrap();
                ws.send(Frame::Binary(reply)).await.unwrap();
            }
            while ws.next().await.is_some() {}
        });

        let (handler, mut rx) = ChannelHandler::new();
        let reporter = Arc::new(CollectingReporter::default());
        let router = router_with(&endpoint, Some(handler), Some(reporter.clone()));
        let driver = driver(&endpoint, router.clone());

        let packed = router.codec().seal(Message::new("test/1.0/hello")).await.unwrap();
        driver.send(packed).await.unwrap();

        // the reader survives both broken frames
        let received = rx.recv().await.unwrap();
        assert_eq!(received.get_kind(), Some("test/1.0/ok".to_string()));

        let errors = reporter.errors.lock().unwrap().clone();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ConnectionError::CryptoError(_)));
        assert!(matches!(errors[1], ConnectionError::DecodeError(_)));
    }
}
