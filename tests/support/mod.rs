//! Scripted fake server and line codec for exercising the engine over a
//! real unix socket.

use std::path::PathBuf;

use pulsewire::{
    ClientConfig, Connection, Volume,
    error::ServerErrorCode,
    introspect::{DeviceState, ServerInfo, SinkInfo},
    proto::{CodecError, Command, EventRecord, FrameCodec, Inbound, PROTOCOL_VERSION, Reply, Tag},
};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{
        UnixListener, UnixStream,
        unix::{OwnedReadHalf, OwnedWriteHalf},
    },
};

pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Serialize)]
struct ClientFrameRef<'a> {
    tag: u32,
    command: &'a Command,
}

#[derive(Deserialize)]
struct ClientFrame {
    tag: u32,
    command: Command,
}

#[derive(Serialize, Deserialize)]
enum ServerFrame {
    Reply { tag: u32, reply: Reply },
    Error { tag: u32, code: u32 },
    Event { event: EventRecord },
}

/// Newline-delimited JSON frames. A stand-in for the real tagstruct
/// codec that satisfies the same contract.
pub struct LineCodec;

impl FrameCodec for LineCodec {
    fn encode(&self, tag: Tag, command: &Command) -> Result<Vec<u8>, CodecError> {
        let frame = ClientFrameRef {
            tag: tag.0,
            command,
        };
        let mut bytes =
            serde_json::to_vec(&frame).map_err(|err| CodecError::Encode(err.to_string()))?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    fn decode(&self, buf: &mut Vec<u8>) -> Result<Option<Inbound>, CodecError> {
        let Some(newline) = buf.iter().position(|&b| b == b'\n') else {
            return Ok(None);
        };
        let line: Vec<u8> = buf.drain(..=newline).collect();
        let frame: ServerFrame = serde_json::from_slice(&line[..line.len() - 1])
            .map_err(|err| CodecError::Malformed(err.to_string()))?;
        Ok(Some(match frame {
            ServerFrame::Reply { tag, reply } => Inbound::Reply {
                tag: Tag(tag),
                reply,
            },
            ServerFrame::Error { tag, code } => Inbound::ServerError {
                tag: Tag(tag),
                code: ServerErrorCode(code),
            },
            ServerFrame::Event { event } => Inbound::Event(event),
        }))
    }
}

/// Server side of one accepted client connection.
pub struct ServerConn {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl ServerConn {
    fn new(stream: UnixStream) -> Self {
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    pub async fn read_command(&mut self) -> (Tag, Command) {
        let mut line = Vec::new();
        let n = self
            .reader
            .read_until(b'\n', &mut line)
            .await
            .expect("server read");
        assert!(n > 0, "client closed the connection");
        let frame: ClientFrame =
            serde_json::from_slice(&line[..line.len() - 1]).expect("client frame");
        (Tag(frame.tag), frame.command)
    }

    /// Reads until the client closes its end.
    pub async fn expect_disconnect(&mut self) {
        let mut line = Vec::new();
        loop {
            line.clear();
            let n = self
                .reader
                .read_until(b'\n', &mut line)
                .await
                .expect("server read");
            if n == 0 {
                return;
            }
        }
    }

    pub async fn send_reply(&mut self, tag: Tag, reply: Reply) {
        self.send_frame(&ServerFrame::Reply { tag: tag.0, reply }).await;
    }

    pub async fn send_error(&mut self, tag: Tag, code: u32) {
        self.send_frame(&ServerFrame::Error { tag: tag.0, code }).await;
    }

    pub async fn send_event(&mut self, event: EventRecord) {
        self.send_frame(&ServerFrame::Event { event }).await;
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.expect("server write");
        self.writer.flush().await.expect("server flush");
    }

    async fn send_frame(&mut self, frame: &ServerFrame) {
        let mut bytes = serde_json::to_vec(frame).expect("encode server frame");
        bytes.push(b'\n');
        self.send_raw(&bytes).await;
    }
}

/// Encode one server reply frame the way the fake server does; for
/// exercising the codec contract directly.
pub fn encode_server_reply(tag: Tag, reply: Reply) -> Vec<u8> {
    let mut bytes =
        serde_json::to_vec(&ServerFrame::Reply { tag: tag.0, reply }).expect("encode reply");
    bytes.push(b'\n');
    bytes
}

/// Decode one client command frame the way the fake server does.
pub fn decode_client_frame(bytes: &[u8]) -> (Tag, Command) {
    let line = bytes.strip_suffix(b"\n").expect("newline-terminated frame");
    let frame: ClientFrame = serde_json::from_slice(line).expect("client frame");
    (Tag(frame.tag), frame.command)
}

/// Accept one client without touching the handshake.
pub async fn accept_raw(listener: &UnixListener) -> ServerConn {
    let (stream, _) = listener.accept().await.expect("accept");
    ServerConn::new(stream)
}

/// Accept one client and walk it through the auth and client-name
/// handshake.
pub async fn accept_with_handshake(listener: &UnixListener) -> ServerConn {
    let (stream, _) = listener.accept().await.expect("accept");
    let mut conn = ServerConn::new(stream);

    let (tag, command) = conn.read_command().await;
    match command {
        Command::Auth {
            protocol_version, ..
        } => assert_eq!(protocol_version, PROTOCOL_VERSION),
        other => panic!("expected auth, got {other:?}"),
    }
    conn.send_reply(
        tag,
        Reply::AuthAck {
            protocol_version: PROTOCOL_VERSION,
        },
    )
    .await;

    let (tag, command) = conn.read_command().await;
    assert!(
        matches!(command, Command::SetClientName { .. }),
        "expected client name, got {command:?}"
    );
    conn.send_reply(tag, Reply::ClientNameAck { client_index: 1 }).await;

    conn
}

pub fn bind_server() -> (TempDir, PathBuf, UnixListener) {
    init_tracing();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("native");
    let listener = UnixListener::bind(&path).expect("bind");
    (dir, path, listener)
}

pub fn test_config(path: &PathBuf, dir: &TempDir) -> ClientConfig {
    // explicit missing cookie keeps the real user cookie out of the test
    ClientConfig::new("pulsewire-test")
        .with_server(path)
        .with_cookie(dir.path().join("cookie"))
}

/// Bind, connect and complete the handshake: the common test opening.
pub async fn connect_pair() -> (TempDir, Connection, ServerConn) {
    let (dir, path, listener) = bind_server();
    let accept = tokio::spawn(async move { accept_with_handshake(&listener).await });
    let connection = Connection::connect(test_config(&path, &dir), Box::new(LineCodec))
        .await
        .expect("connect");
    let server = accept.await.expect("server task");
    (dir, connection, server)
}

pub fn sink_fixture(index: u32, name: &str) -> SinkInfo {
    SinkInfo {
        index,
        name: name.to_owned(),
        description: format!("Test sink {name}"),
        state: DeviceState::Running,
        volume: Volume::normal(2),
        mute: false,
        owner_module: None,
        monitor_source: Some(format!("{name}.monitor")),
        ports: Vec::new(),
        active_port: None,
    }
}

pub fn server_info_fixture() -> ServerInfo {
    ServerInfo {
        name: "pulseaudio".to_owned(),
        version: "17.0".to_owned(),
        user_name: "test".to_owned(),
        host_name: "testhost".to_owned(),
        default_sink: Some("alsa_output.test".to_owned()),
        default_source: None,
        sample_rate: 48_000,
        channels: 2,
    }
}
