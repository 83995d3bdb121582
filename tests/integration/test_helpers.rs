// tests/integration/test_helpers.rs

//! Test helpers: a recording session listener and a fake debuggee that
//! connects to the bridge over loopback.

use mobdebug_bridge::config::Config;
use mobdebug_bridge::{BridgeError, DebugServer, SessionListener};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing_subscriber::EnvFilter;

/// Upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(2);

/// Records every callback the bridge makes.
#[derive(Default)]
pub struct RecordingListener {
    pub events: Mutex<Vec<(i32, Vec<String>)>>,
    pub faults: Mutex<Vec<BridgeError>>,
    pub connected: AtomicUsize,
    pub disconnected: AtomicUsize,
}

impl RecordingListener {
    pub fn events(&self) -> Vec<(i32, Vec<String>)> {
        self.events.lock().clone()
    }

    pub fn faults(&self) -> Vec<BridgeError> {
        self.faults.lock().clone()
    }

    pub fn disconnects(&self) -> usize {
        self.disconnected.load(Ordering::SeqCst)
    }
}

impl SessionListener for RecordingListener {
    fn handle_resp(&self, code: i32, params: &[String]) {
        self.events.lock().push((code, params.to_vec()));
    }

    fn handle_fault(&self, error: &BridgeError) {
        self.faults.lock().push(error.clone());
    }

    fn on_connected(&self, _peer: SocketAddr) {
        self.connected.fetch_add(1, Ordering::SeqCst);
    }

    fn on_disconnected(&self) {
        self.disconnected.fetch_add(1, Ordering::SeqCst);
    }
}

/// A config bound to an ephemeral loopback port with a short poll interval
/// and no response timeout.
pub fn test_config() -> Config {
    Config {
        port: 0,
        poll_interval_ms: 2,
        response_timeout_ms: 0,
        ..Config::default()
    }
}

pub fn init_tracing() {
    // Ignore the error if another test already installed a subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("warn"))
        .with_test_writer()
        .try_init();
}

/// A bridge that has been started but not yet connected to.
pub struct TestBridge {
    pub server: DebugServer,
    pub listener: Arc<RecordingListener>,
    pub addr: SocketAddr,
}

impl TestBridge {
    pub async fn start() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: Config) -> Self {
        init_tracing();
        let listener = Arc::new(RecordingListener::default());
        let server = DebugServer::new(config, listener.clone());
        let addr = server.start().await.expect("bridge should start");
        Self {
            server,
            listener,
            addr,
        }
    }

    /// Connects a fake debuggee and waits until the bridge is streaming.
    pub async fn attach(&self) -> Debuggee {
        let stream = TcpStream::connect(self.addr)
            .await
            .expect("debuggee should connect");
        let listener = self.listener.clone();
        wait_until(move || listener.connected.load(Ordering::SeqCst) == 1).await;
        Debuggee::new(stream)
    }

    /// Connects and consumes the start directive.
    pub async fn attach_running(&self) -> Debuggee {
        let mut debuggee = self.attach().await;
        assert_eq!(debuggee.expect_line().await, "RUN");
        debuggee
    }
}

/// The debuggee end of the socket.
pub struct Debuggee {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Debuggee {
    fn new(stream: TcpStream) -> Self {
        let (read_half, writer) = stream.into_split();
        Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        }
    }

    /// Reads the next line the bridge wrote.
    pub async fn expect_line(&mut self) -> String {
        tokio::time::timeout(WAIT, self.lines.next_line())
            .await
            .expect("timed out waiting for a line from the bridge")
            .expect("read from bridge failed")
            .expect("bridge closed the connection")
    }

    /// Asserts the bridge writes nothing for `window`.
    pub async fn expect_silence(&mut self, window: Duration) {
        if let Ok(line) = tokio::time::timeout(window, self.lines.next_line()).await {
            panic!("expected silence, got {:?}", line);
        }
    }

    /// Waits for the bridge to close its end of the socket.
    pub async fn expect_eof(&mut self) {
        let next = tokio::time::timeout(WAIT, self.lines.next_line())
            .await
            .expect("timed out waiting for EOF");
        assert!(
            matches!(next, Ok(None) | Err(_)),
            "expected EOF, got {:?}",
            next
        );
    }

    /// Sends one newline-terminated unit to the bridge.
    pub async fn send(&mut self, unit: &str) {
        self.writer
            .write_all(format!("{unit}\n").as_bytes())
            .await
            .expect("write to bridge failed");
    }
}

/// Polls `condition` until it holds, failing the test after `WAIT`.
pub async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached in time"
        );
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
}
