use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
};

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::{
    config::ClientConfig,
    engine::{
        dispatcher::TagAllocator,
        events::EventListener,
        reactor::{EngineMsg, Reactor},
        transport::Transport,
    },
    error::PulseError,
    introspect::{
        CardInfo, ClientInfo, ModuleInfo, ServerInfo, SinkInfo, SinkInputInfo, SourceInfo,
        SourceOutputInfo,
    },
    proto::{Command, FrameCodec, Reply, SubscriptionMask, Tag},
    volume::Volume,
};

/// Lifecycle state of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport yet
    Disconnected,
    /// Socket open, protocol handshake in flight
    Connecting,
    /// Handshake accepted, credentials being confirmed
    Authenticating,
    /// Operations may be issued
    Ready,
    /// Tearing down: pending requests failing, listeners ending
    Closing,
    /// Terminal; create a new connection to retry
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Authenticating => "authenticating",
            ConnectionState::Ready => "ready",
            ConnectionState::Closing => "closing",
            ConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Lock-free lifecycle cell shared between the handle and the reactor.
#[derive(Clone)]
pub(crate) struct StateCell(Arc<AtomicU8>);

impl StateCell {
    pub(crate) fn new(state: ConnectionState) -> Self {
        Self(Arc::new(AtomicU8::new(state as u8)))
    }

    pub(crate) fn set(&self, state: ConnectionState) {
        self.0.store(state as u8, Ordering::Release);
    }

    pub(crate) fn get(&self) -> ConnectionState {
        match self.0.load(Ordering::Acquire) {
            0 => ConnectionState::Disconnected,
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Authenticating,
            3 => ConnectionState::Ready,
            4 => ConnectionState::Closing,
            _ => ConnectionState::Closed,
        }
    }
}

fn unexpected_reply(reply: &Reply) -> PulseError {
    PulseError::protocol(format!("unexpected reply shape: {:?}", reply.kind()))
}

macro_rules! query {
    ($self:ident, $operation:literal, $command:expr, $variant:ident) => {
        match $self.request($operation, $command).await? {
            Reply::$variant(value) => Ok(value),
            other => Err(unexpected_reply(&other)),
        }
    };
}

/// A live session with the sound server.
///
/// Exactly one connection per session: created by
/// [`connect`](Connection::connect), destroyed by
/// [`close`](Connection::close), drop, or a fatal error. All operations are fallible and must be checked; once
/// the connection reaches [`ConnectionState::Closed`] it never recovers.
///
/// Concurrent logical operations — several `execute` futures in flight,
/// several event listeners — are multiplexed through a single reactor
/// task that owns the socket; nothing here takes a lock.
pub struct Connection {
    engine: mpsc::UnboundedSender<EngineMsg>,
    tags: TagAllocator,
    state: StateCell,
}

impl Connection {
    /// Connect to the sound server and authenticate.
    ///
    /// Resolves the server socket from `config`, performs the protocol
    /// handshake and client-name announcement, and spawns the reactor
    /// task that owns the socket from then on.
    ///
    /// # Errors
    /// Returns [`PulseError::Connect`] when the socket is unreachable or
    /// the server rejects the handshake or credentials.
    pub async fn connect(
        config: ClientConfig,
        codec: Box<dyn FrameCodec>,
    ) -> Result<Self, PulseError> {
        let socket = config.resolve_socket()?;
        let cookie = config.load_cookie();
        let transport = Transport::open(&socket).await?;

        let state = StateCell::new(ConnectionState::Connecting);
        let tags = TagAllocator::new();
        let (engine_tx, engine_rx) = mpsc::unbounded_channel();
        let mut reactor = Reactor::new(transport, codec, engine_rx, state.clone());

        if let Err(err) = reactor.handshake(&tags, &config.name, cookie).await {
            state.set(ConnectionState::Closed);
            return Err(err);
        }

        tokio::spawn(reactor.run());
        debug!(client = %config.name, "connection ready");
        Ok(Self {
            engine: engine_tx,
            tags,
            state,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state.get()
    }

    /// Whether operations may currently be issued.
    pub fn is_ready(&self) -> bool {
        self.state.get() == ConnectionState::Ready
    }

    /// Close the connection.
    ///
    /// Pending requests fail with [`PulseError::ConnectionClosed`]; event
    /// listeners end without an error. Idempotent: closing an already
    /// closing or closed connection is a no-op. Dropping the handle
    /// closes too, without waiting for the teardown.
    pub async fn close(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.engine.send(EngineMsg::Close { ack: ack_tx }).is_ok() {
            let _ = ack_rx.await;
        }
    }

    /// Replace the event subscription mask.
    ///
    /// A normal request through the dispatcher; on success every active
    /// listener keeps receiving events, now gated by the new mask. An
    /// empty mask turns event delivery off.
    ///
    /// # Errors
    /// Fails like any other operation; the previous mask stays in effect.
    pub async fn subscribe(&self, mask: SubscriptionMask) -> Result<(), PulseError> {
        self.request_ack("subscribe", Command::Subscribe { mask }).await
    }

    /// Attach a new event listener.
    ///
    /// The listener observes every event matching the subscription mask
    /// from this point on, independently of other listeners. Dropping it
    /// cancels only this cursor; the subscription itself stays.
    ///
    /// # Errors
    /// Returns [`PulseError::State`] when the connection is not ready.
    pub async fn listen(&self) -> Result<EventListener, PulseError> {
        self.ensure_ready("listen")?;
        let (listener_tx, listener_rx) = mpsc::unbounded_channel();
        let (ack_tx, ack_rx) = oneshot::channel();
        self.engine
            .send(EngineMsg::Listen {
                listener: listener_tx,
                ack: ack_tx,
            })
            .map_err(|_| self.state_error("listen"))?;
        let _ = ack_rx.await;
        Ok(EventListener::new(listener_rx))
    }

    /// Subscribe and listen in one call.
    ///
    /// The listener is attached before the mask is sent, so no event
    /// confirmed under the new mask can be missed.
    ///
    /// # Errors
    /// Fails when the connection is not ready or the server rejects the
    /// subscription.
    pub async fn subscribe_events(
        &self,
        mask: SubscriptionMask,
    ) -> Result<EventListener, PulseError> {
        let listener = self.listen().await?;
        self.subscribe(mask).await?;
        Ok(listener)
    }

    /// Server state summary.
    pub async fn server_info(&self) -> Result<ServerInfo, PulseError> {
        query!(self, "server_info", Command::GetServerInfo, ServerInfo)
    }

    /// All sinks.
    pub async fn sink_list(&self) -> Result<Vec<SinkInfo>, PulseError> {
        query!(self, "sink_list", Command::GetSinkList, SinkList)
    }

    /// One sink by index.
    pub async fn sink_info(&self, index: u32) -> Result<SinkInfo, PulseError> {
        query!(self, "sink_info", Command::GetSinkInfo { index }, Sink)
    }

    /// One sink by name.
    pub async fn sink_info_by_name(&self, name: &str) -> Result<SinkInfo, PulseError> {
        let name = name.to_owned();
        query!(self, "sink_info_by_name", Command::GetSinkInfoByName { name }, Sink)
    }

    /// All sources.
    pub async fn source_list(&self) -> Result<Vec<SourceInfo>, PulseError> {
        query!(self, "source_list", Command::GetSourceList, SourceList)
    }

    /// One source by index.
    pub async fn source_info(&self, index: u32) -> Result<SourceInfo, PulseError> {
        query!(self, "source_info", Command::GetSourceInfo { index }, Source)
    }

    /// One source by name.
    pub async fn source_info_by_name(&self, name: &str) -> Result<SourceInfo, PulseError> {
        let name = name.to_owned();
        query!(self, "source_info_by_name", Command::GetSourceInfoByName { name }, Source)
    }

    /// All cards.
    pub async fn card_list(&self) -> Result<Vec<CardInfo>, PulseError> {
        query!(self, "card_list", Command::GetCardList, CardList)
    }

    /// One card by index.
    pub async fn card_info(&self, index: u32) -> Result<CardInfo, PulseError> {
        query!(self, "card_info", Command::GetCardInfo { index }, Card)
    }

    /// One card by name.
    pub async fn card_info_by_name(&self, name: &str) -> Result<CardInfo, PulseError> {
        let name = name.to_owned();
        query!(self, "card_info_by_name", Command::GetCardInfoByName { name }, Card)
    }

    /// All clients connected to the server.
    pub async fn client_list(&self) -> Result<Vec<ClientInfo>, PulseError> {
        query!(self, "client_list", Command::GetClientList, ClientList)
    }

    /// One client by index.
    pub async fn client_info(&self, index: u32) -> Result<ClientInfo, PulseError> {
        query!(self, "client_info", Command::GetClientInfo { index }, Client)
    }

    /// All loaded modules.
    pub async fn module_list(&self) -> Result<Vec<ModuleInfo>, PulseError> {
        query!(self, "module_list", Command::GetModuleList, ModuleList)
    }

    /// One module by index.
    pub async fn module_info(&self, index: u32) -> Result<ModuleInfo, PulseError> {
        query!(self, "module_info", Command::GetModuleInfo { index }, Module)
    }

    /// All playback streams.
    pub async fn sink_input_list(&self) -> Result<Vec<SinkInputInfo>, PulseError> {
        query!(self, "sink_input_list", Command::GetSinkInputList, SinkInputList)
    }

    /// One playback stream by index.
    pub async fn sink_input_info(&self, index: u32) -> Result<SinkInputInfo, PulseError> {
        query!(self, "sink_input_info", Command::GetSinkInputInfo { index }, SinkInput)
    }

    /// All record streams.
    pub async fn source_output_list(&self) -> Result<Vec<SourceOutputInfo>, PulseError> {
        query!(self, "source_output_list", Command::GetSourceOutputList, SourceOutputList)
    }

    /// One record stream by index.
    pub async fn source_output_info(&self, index: u32) -> Result<SourceOutputInfo, PulseError> {
        query!(self, "source_output_info", Command::GetSourceOutputInfo { index }, SourceOutput)
    }

    /// Set sink volume.
    pub async fn set_sink_volume(&self, index: u32, volume: Volume) -> Result<(), PulseError> {
        volume.validate()?;
        self.request_ack("set_sink_volume", Command::SetSinkVolume { index, volume })
            .await
    }

    /// Set source volume.
    pub async fn set_source_volume(&self, index: u32, volume: Volume) -> Result<(), PulseError> {
        volume.validate()?;
        self.request_ack("set_source_volume", Command::SetSourceVolume { index, volume })
            .await
    }

    /// Set playback stream volume.
    pub async fn set_sink_input_volume(
        &self,
        index: u32,
        volume: Volume,
    ) -> Result<(), PulseError> {
        volume.validate()?;
        self.request_ack(
            "set_sink_input_volume",
            Command::SetSinkInputVolume { index, volume },
        )
        .await
    }

    /// Set record stream volume.
    pub async fn set_source_output_volume(
        &self,
        index: u32,
        volume: Volume,
    ) -> Result<(), PulseError> {
        volume.validate()?;
        self.request_ack(
            "set_source_output_volume",
            Command::SetSourceOutputVolume { index, volume },
        )
        .await
    }

    /// Mute or unmute a sink.
    pub async fn set_sink_mute(&self, index: u32, mute: bool) -> Result<(), PulseError> {
        self.request_ack("set_sink_mute", Command::SetSinkMute { index, mute })
            .await
    }

    /// Mute or unmute a source.
    pub async fn set_source_mute(&self, index: u32, mute: bool) -> Result<(), PulseError> {
        self.request_ack("set_source_mute", Command::SetSourceMute { index, mute })
            .await
    }

    /// Mute or unmute a playback stream.
    pub async fn set_sink_input_mute(&self, index: u32, mute: bool) -> Result<(), PulseError> {
        self.request_ack("set_sink_input_mute", Command::SetSinkInputMute { index, mute })
            .await
    }

    /// Mute or unmute a record stream.
    pub async fn set_source_output_mute(&self, index: u32, mute: bool) -> Result<(), PulseError> {
        self.request_ack(
            "set_source_output_mute",
            Command::SetSourceOutputMute { index, mute },
        )
        .await
    }

    /// Make the named sink the default.
    pub async fn set_default_sink(&self, name: &str) -> Result<(), PulseError> {
        self.request_ack(
            "set_default_sink",
            Command::SetDefaultSink {
                name: name.to_owned(),
            },
        )
        .await
    }

    /// Make the named source the default.
    pub async fn set_default_source(&self, name: &str) -> Result<(), PulseError> {
        self.request_ack(
            "set_default_source",
            Command::SetDefaultSource {
                name: name.to_owned(),
            },
        )
        .await
    }

    /// Switch a card to the named profile.
    pub async fn set_card_profile(&self, index: u32, profile: &str) -> Result<(), PulseError> {
        self.request_ack(
            "set_card_profile",
            Command::SetCardProfile {
                index,
                profile: profile.to_owned(),
            },
        )
        .await
    }

    /// Switch a sink to the named port.
    pub async fn set_sink_port(&self, index: u32, port: &str) -> Result<(), PulseError> {
        self.request_ack(
            "set_sink_port",
            Command::SetSinkPort {
                index,
                port: port.to_owned(),
            },
        )
        .await
    }

    /// Switch a source to the named port.
    pub async fn set_source_port(&self, index: u32, port: &str) -> Result<(), PulseError> {
        self.request_ack(
            "set_source_port",
            Command::SetSourcePort {
                index,
                port: port.to_owned(),
            },
        )
        .await
    }

    /// Move a playback stream to another sink.
    pub async fn move_sink_input(&self, index: u32, sink: u32) -> Result<(), PulseError> {
        self.request_ack("move_sink_input", Command::MoveSinkInput { index, sink })
            .await
    }

    /// Move a record stream to another source.
    pub async fn move_source_output(&self, index: u32, source: u32) -> Result<(), PulseError> {
        self.request_ack(
            "move_source_output",
            Command::MoveSourceOutput { index, source },
        )
        .await
    }

    /// Suspend or resume a sink.
    pub async fn suspend_sink(&self, index: u32, suspend: bool) -> Result<(), PulseError> {
        self.request_ack("suspend_sink", Command::SuspendSink { index, suspend })
            .await
    }

    /// Suspend or resume a source.
    pub async fn suspend_source(&self, index: u32, suspend: bool) -> Result<(), PulseError> {
        self.request_ack("suspend_source", Command::SuspendSource { index, suspend })
            .await
    }

    /// Load a module; resolves to the new module's index.
    pub async fn load_module(&self, name: &str, argument: &str) -> Result<u32, PulseError> {
        let command = Command::LoadModule {
            name: name.to_owned(),
            argument: argument.to_owned(),
        };
        query!(self, "load_module", command, ModuleIndex)
    }

    /// Unload a module.
    pub async fn unload_module(&self, index: u32) -> Result<(), PulseError> {
        self.request_ack("unload_module", Command::UnloadModule { index })
            .await
    }

    /// Execute one command: allocate a tag, hand the command to the
    /// reactor, suspend until the matching reply arrives. Dropping the
    /// returned future releases the pending slot immediately; the
    /// already-sent command is not retracted and its eventual reply is
    /// discarded.
    async fn request(
        &self,
        operation: &'static str,
        command: Command,
    ) -> Result<Reply, PulseError> {
        self.ensure_ready(operation)?;
        let tag = self.tags.next();
        let (reply_tx, reply_rx) = oneshot::channel();
        self.engine
            .send(EngineMsg::Submit {
                tag,
                command,
                reply: reply_tx,
            })
            .map_err(|_| self.state_error(operation))?;

        let mut cancel = CancelGuard {
            tag,
            engine: &self.engine,
            armed: true,
        };
        let outcome = reply_rx.await;
        cancel.armed = false;
        match outcome {
            Ok(result) => result,
            // reactor went away without resolving us
            Err(_) => Err(PulseError::ConnectionClosed),
        }
    }

    async fn request_ack(
        &self,
        operation: &'static str,
        command: Command,
    ) -> Result<(), PulseError> {
        match self.request(operation, command).await? {
            Reply::Ack => Ok(()),
            other => Err(unexpected_reply(&other)),
        }
    }

    fn ensure_ready(&self, operation: &'static str) -> Result<(), PulseError> {
        if self.state.get() == ConnectionState::Ready {
            Ok(())
        } else {
            Err(self.state_error(operation))
        }
    }

    fn state_error(&self, operation: &'static str) -> PulseError {
        PulseError::State {
            operation,
            state: self.state.get(),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // best-effort close; the reactor settles waiters and listeners
        let (ack, _) = oneshot::channel();
        let _ = self.engine.send(EngineMsg::Close { ack });
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}

struct CancelGuard<'a> {
    tag: Tag,
    engine: &'a mpsc::UnboundedSender<EngineMsg>,
    armed: bool,
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let _ = self.engine.send(EngineMsg::Cancel { tag: self.tag });
        }
    }
}
