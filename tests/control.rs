//! Log protocol against a live control on loopback.

use std::net::Ipv4Addr;

use futures::future::join_all;
use skymap::registry::Registry;
use skymap::{Control, Listener, ServerConfig};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

const INFO: &str = "Brisbane tower, runway 01";

async fn start_control() -> u16 {
    let listener = Listener::bind(&ServerConfig::default()).await.unwrap();
    let port = listener.local_port();
    listener.spawn(Control::new(INFO), Registry::shared());
    port
}

struct Conn {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Conn {
    async fn open(port: u16) -> Self {
        let stream = TcpStream::connect((Ipv4Addr::LOCALHOST, port)).await.unwrap();
        let (rd, writer) = stream.into_split();
        Self {
            reader: BufReader::new(rd),
            writer,
        }
    }

    async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
    }

    async fn recv(&mut self) -> Option<String> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line).await.unwrap();
        (n > 0).then(|| line.trim_end_matches('\n').to_string())
    }

    async fn visit(&mut self, aircraft: &str) {
        self.send(aircraft).await;
        assert_eq!(self.recv().await.as_deref(), Some(INFO));
    }

    /// Send `log`, read through the `.` line and check the server hung up.
    async fn log(mut self) -> Vec<String> {
        self.send("log").await;
        let mut lines = Vec::new();
        loop {
            match self.recv().await.as_deref() {
                Some(".") => break,
                Some(line) => lines.push(line.to_string()),
                None => panic!("connection closed before '.'"),
            }
        }
        assert_eq!(self.recv().await, None, "server should close after log");
        lines
    }
}

#[tokio::test]
async fn empty_log_is_just_a_dot() {
    let port = start_control().await;
    assert!(Conn::open(port).await.log().await.is_empty());
}

#[tokio::test]
async fn visits_are_answered_and_logged_in_order() {
    let port = start_control().await;
    let mut conn = Conn::open(port).await;
    conn.visit("CD456").await;
    conn.visit("AB123").await;
    assert_eq!(conn.log().await, ["AB123", "CD456"]);
}

#[tokio::test]
async fn repeat_visits_are_all_kept() {
    let port = start_control().await;
    for _ in 0..2 {
        Conn::open(port).await.visit("QF1").await;
    }
    Conn::open(port).await.visit("AB123").await;
    assert_eq!(Conn::open(port).await.log().await, ["AB123", "QF1", "QF1"]);
}

#[tokio::test]
async fn malformed_visits_are_ignored() {
    let port = start_control().await;
    let mut conn = Conn::open(port).await;
    conn.send("QF:1").await;
    conn.send("").await;
    conn.writer.write_all(b"QF2\r\n").await.unwrap();
    conn.visit("VH-ABC").await;
    assert_eq!(conn.log().await, ["VH-ABC"]);
}

#[tokio::test]
async fn only_exact_log_ends_the_session() {
    let port = start_control().await;
    let mut conn = Conn::open(port).await;
    conn.visit("LOG").await;
    conn.visit("log ").await;
    assert_eq!(conn.log().await, ["LOG", "log "]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_visits_are_not_lost() {
    const N: usize = 64;
    let port = start_control().await;

    let planes = (0..N).map(|i| async move {
        let mut conn = Conn::open(port).await;
        conn.visit(&format!("QF{:03}", N - i)).await;
    });
    join_all(planes).await;

    let log = Conn::open(port).await.log().await;
    let mut expected: Vec<String> = (1..=N).map(|i| format!("QF{i:03}")).collect();
    expected.sort();
    assert_eq!(log, expected);
}
