use std::io;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::{
    connection::{ConnectionState, StateCell},
    error::PulseError,
    proto::{Command, FrameCodec, Inbound, PROTOCOL_VERSION, Reply, Tag},
};

use super::{
    dispatcher::{Claimed, Dispatcher, PendingRequest, TagAllocator},
    events::{EventFanout, ListenerSender},
    transport::Transport,
};

const READ_CHUNK: usize = 4096;

/// Messages from the connection handle to the reactor.
pub(crate) enum EngineMsg {
    /// Submit a tagged command and suspend the sender on `reply`
    Submit {
        tag: Tag,
        command: Command,
        reply: oneshot::Sender<Result<Reply, PulseError>>,
    },
    /// Release the pending slot of a waiter that went away
    Cancel { tag: Tag },
    /// Attach a new event listener
    Listen {
        listener: ListenerSender,
        ack: oneshot::Sender<()>,
    },
    /// Graceful shutdown
    Close { ack: oneshot::Sender<()> },
}

enum Shutdown {
    Graceful(Option<oneshot::Sender<()>>),
    Fatal(PulseError),
}

/// Single-threaded driver owning the transport and all protocol state.
///
/// Every suspension point of the system multiplexes through the loop in
/// [`drive`](Reactor::drive): callers suspend on oneshot replies, event
/// listeners on their fan-out channels, and the loop itself only on
/// socket readiness and the message channel. Frames are processed in
/// strict arrival order within one drain pass, so reply resolution never
/// starves event delivery or vice versa.
pub(crate) struct Reactor {
    transport: Transport,
    codec: Box<dyn FrameCodec>,
    messages: mpsc::UnboundedReceiver<EngineMsg>,
    dispatcher: Dispatcher,
    events: EventFanout,
    state: StateCell,
    inbound: Vec<u8>,
    outbound: Vec<u8>,
}

impl Reactor {
    pub(crate) fn new(
        transport: Transport,
        codec: Box<dyn FrameCodec>,
        messages: mpsc::UnboundedReceiver<EngineMsg>,
        state: StateCell,
    ) -> Self {
        Self {
            transport,
            codec,
            messages,
            dispatcher: Dispatcher::default(),
            events: EventFanout::new(),
            state,
            inbound: Vec::new(),
            outbound: Vec::new(),
        }
    }

    /// Drive the protocol handshake to the Ready state.
    ///
    /// Runs before the reactor task is spawned, so the round-trips are
    /// sequential: auth first, then the client name announcement.
    ///
    /// # Errors
    /// Any failure surfaces as [`PulseError::Connect`] to the caller of
    /// `connect`.
    pub(crate) async fn handshake(
        &mut self,
        tags: &TagAllocator,
        client_name: &str,
        cookie: Vec<u8>,
    ) -> Result<(), PulseError> {
        let auth = Command::Auth {
            protocol_version: PROTOCOL_VERSION,
            cookie,
        };
        match self.roundtrip(tags.next(), auth).await? {
            Reply::AuthAck { protocol_version } => {
                debug!(server_protocol = protocol_version, "handshake accepted");
            }
            other => {
                return Err(PulseError::connect(format!(
                    "handshake reply of unexpected shape: {:?}",
                    other.kind()
                )));
            }
        }

        self.state.set(ConnectionState::Authenticating);
        let name = Command::SetClientName {
            name: client_name.to_owned(),
        };
        match self.roundtrip(tags.next(), name).await? {
            Reply::ClientNameAck { client_index } => {
                debug!(client_index, "authenticated");
            }
            other => {
                return Err(PulseError::connect(format!(
                    "client name reply of unexpected shape: {:?}",
                    other.kind()
                )));
            }
        }

        self.state.set(ConnectionState::Ready);
        Ok(())
    }

    async fn roundtrip(&mut self, tag: Tag, command: Command) -> Result<Reply, PulseError> {
        let frame = self
            .codec
            .encode(tag, &command)
            .map_err(PulseError::connect)?;
        self.outbound.extend_from_slice(&frame);
        while !self.outbound.is_empty() {
            self.flush_outbound().map_err(PulseError::connect)?;
            if self.outbound.is_empty() {
                break;
            }
            self.transport
                .writable()
                .await
                .map_err(PulseError::connect)?;
        }

        loop {
            match self.codec.decode(&mut self.inbound) {
                Ok(Some(Inbound::Reply { tag: reply_tag, reply })) if reply_tag == tag => {
                    return Ok(reply);
                }
                Ok(Some(Inbound::ServerError { tag: reply_tag, code })) if reply_tag == tag => {
                    return Err(PulseError::connect(format!(
                        "server refused handshake: {code}"
                    )));
                }
                Ok(Some(other)) => {
                    return Err(PulseError::connect(format!(
                        "unexpected frame during handshake: {other:?}"
                    )));
                }
                Ok(None) => {
                    self.transport
                        .readable()
                        .await
                        .map_err(PulseError::connect)?;
                    self.fill_inbound().map_err(PulseError::connect)?;
                }
                Err(err) => return Err(PulseError::connect(err)),
            }
        }
    }

    /// Run the reactor until the connection ends, then settle every
    /// outstanding waiter and listener.
    pub(crate) async fn run(mut self) {
        match self.drive().await {
            Shutdown::Graceful(ack) => {
                debug!(
                    pending = self.dispatcher.in_flight(),
                    "closing connection"
                );
                self.state.set(ConnectionState::Closing);
                self.dispatcher.fail_all();
                self.events.finish_graceful();
                self.state.set(ConnectionState::Closed);
                if let Some(ack) = ack {
                    let _ = ack.send(());
                }
            }
            Shutdown::Fatal(error) => {
                warn!(%error, "connection failed");
                self.state.set(ConnectionState::Closing);
                self.dispatcher.fail_all();
                self.events.finish_fatal();
                self.state.set(ConnectionState::Closed);
            }
        }
    }

    async fn drive(&mut self) -> Shutdown {
        loop {
            tokio::select! {
                message = self.messages.recv() => match message {
                    Some(EngineMsg::Submit { tag, command, reply }) => {
                        if let Err(shutdown) = self.handle_submit(tag, command, reply) {
                            return shutdown;
                        }
                    }
                    Some(EngineMsg::Cancel { tag }) => self.dispatcher.cancel(tag),
                    Some(EngineMsg::Listen { listener, ack }) => {
                        self.events.register(listener);
                        let _ = ack.send(());
                    }
                    Some(EngineMsg::Close { ack }) => return Shutdown::Graceful(Some(ack)),
                    // every handle is gone; nobody is left to observe
                    None => return Shutdown::Graceful(None),
                },
                ready = self.transport.readable() => {
                    if let Err(err) = ready {
                        warn!(%err, "readiness poll failed");
                        return Shutdown::Fatal(PulseError::ConnectionClosed);
                    }
                    if let Err(shutdown) = self.drain_inbound() {
                        return shutdown;
                    }
                }
                ready = self.transport.writable(), if !self.outbound.is_empty() => {
                    if let Err(err) = ready {
                        warn!(%err, "readiness poll failed");
                        return Shutdown::Fatal(PulseError::ConnectionClosed);
                    }
                    if let Err(error) = self.flush_outbound() {
                        return Shutdown::Fatal(error);
                    }
                }
            }
        }
    }

    fn handle_submit(
        &mut self,
        tag: Tag,
        command: Command,
        reply: oneshot::Sender<Result<Reply, PulseError>>,
    ) -> Result<(), Shutdown> {
        let expect = command.reply_kind();
        let subscribe = command.subscription_mask();
        match self.codec.encode(tag, &command) {
            Ok(frame) => {
                trace!(%tag, ?expect, bytes = frame.len(), "request submitted");
                self.outbound.extend_from_slice(&frame);
                self.dispatcher.register(
                    tag,
                    PendingRequest {
                        expect,
                        reply,
                        subscribe,
                    },
                );
            }
            Err(err) => {
                // nothing reached the wire; only this request fails
                let _ = reply.send(Err(PulseError::protocol(err)));
                return Ok(());
            }
        }
        self.flush_outbound().map_err(Shutdown::Fatal)
    }

    /// Read every available byte, then decode and process complete
    /// frames strictly in arrival order.
    fn drain_inbound(&mut self) -> Result<(), Shutdown> {
        self.fill_inbound().map_err(Shutdown::Fatal)?;
        loop {
            match self.codec.decode(&mut self.inbound) {
                Ok(Some(frame)) => self.process_frame(frame)?,
                Ok(None) => return Ok(()),
                Err(err) => return Err(Shutdown::Fatal(PulseError::protocol(err))),
            }
        }
    }

    fn process_frame(&mut self, frame: Inbound) -> Result<(), Shutdown> {
        match frame {
            Inbound::Reply { tag, reply } => match self.dispatcher.claim(tag) {
                Claimed::Pending(request) => {
                    if reply.kind() != request.expect {
                        let _ = request.reply.send(Err(PulseError::ConnectionClosed));
                        return Err(Shutdown::Fatal(PulseError::protocol(format!(
                            "reply {tag} has shape {:?}, expected {:?}",
                            reply.kind(),
                            request.expect
                        ))));
                    }
                    if let Some(mask) = request.subscribe {
                        self.events.set_mask(mask);
                    }
                    let _ = request.reply.send(Ok(reply));
                }
                Claimed::Cancelled => {
                    trace!(%tag, "late reply for cancelled request discarded");
                }
                Claimed::Unknown => {
                    return Err(Shutdown::Fatal(PulseError::protocol(format!(
                        "reply for unknown tag {tag}"
                    ))));
                }
            },
            Inbound::ServerError { tag, code } => match self.dispatcher.claim(tag) {
                Claimed::Pending(request) => {
                    let _ = request.reply.send(Err(PulseError::Operation(code)));
                }
                Claimed::Cancelled => {
                    trace!(%tag, "late error for cancelled request discarded");
                }
                Claimed::Unknown => {
                    return Err(Shutdown::Fatal(PulseError::protocol(format!(
                        "error frame for unknown tag {tag}"
                    ))));
                }
            },
            Inbound::Event(event) => self.events.dispatch(event),
        }
        Ok(())
    }

    fn fill_inbound(&mut self) -> Result<(), PulseError> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.transport.try_read(&mut chunk) {
                // server-initiated disconnect
                Ok(0) => return Err(PulseError::ConnectionClosed),
                Ok(n) => self.inbound.extend_from_slice(&chunk[..n]),
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(err) => {
                    warn!(%err, "transport read failed");
                    return Err(PulseError::ConnectionClosed);
                }
            }
        }
    }

    fn flush_outbound(&mut self) -> Result<(), PulseError> {
        while !self.outbound.is_empty() {
            match self.transport.try_write(&self.outbound) {
                Ok(0) => return Err(PulseError::ConnectionClosed),
                Ok(n) => {
                    self.outbound.drain(..n);
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(err) => {
                    warn!(%err, "transport write failed");
                    return Err(PulseError::ConnectionClosed);
                }
            }
        }
        Ok(())
    }
}
