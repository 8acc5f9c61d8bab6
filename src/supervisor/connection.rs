// Connection Supervisor
// Listens for network status events, decides when to (re)open a
// transport session, runs the exchange loop, and abandons to wait for
// the next status event on any failure. The next qualifying status
// event is the sole retry trigger; there are no timers.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, EndpointConfig, SocketKind};
use crate::protocol::LightControlCodec;
use crate::runtime::{EventScheduler, RuntimeContext, SchedulerHandle, Task};
use crate::transport::{
    resolver, LinkState, NetStatus, NetworkInterface, StatusListener, TransportError,
    TransportSession, RECEIVE_BUFFER_SIZE,
};

use super::state::ConnectionState;

/// Owner of the single connection state machine. At most one transport
/// session exists at any time; a new one is opened only after the
/// previous one has been fully closed.
pub struct ConnectionSupervisor {
    config: EndpointConfig,
    codec: LightControlCodec,
    interface: Arc<dyn NetworkInterface>,
    ctx: Arc<RuntimeContext>,
    scheduler: EventScheduler,
    link: LinkState,
    state: ConnectionState,
    session: Option<TransportSession>,
    resolved: Option<SocketAddr>,
}

impl ConnectionSupervisor {
    /// Validates the configured transport pairing before any network
    /// activity; an invalid pairing refuses to construct.
    pub fn new(
        config: EndpointConfig,
        interface: Arc<dyn NetworkInterface>,
        ctx: Arc<RuntimeContext>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let codec = LightControlCodec::new(config.group());
        Ok(Self {
            codec,
            config,
            interface,
            ctx,
            scheduler: EventScheduler::new(),
            link: LinkState::new(),
            state: ConnectionState::Idle,
            session: None,
            resolved: None,
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn resolved_address(&self) -> Option<SocketAddr> {
        self.resolved
    }

    /// Handle for posting tasks from outside the cooperative loop.
    pub fn scheduler(&self) -> SchedulerHandle {
        self.scheduler.handle()
    }

    /// Register the status listener and kick off interface bring-up.
    /// The bring-up result itself arrives as status events; a rejected
    /// kickoff only means we keep waiting for them.
    pub async fn setup(&mut self) {
        self.transition(ConnectionState::NetworkAttaching);
        let listener = StatusListener::new(self.scheduler.handle(), self.link.clone());
        self.interface.attach(listener);
        if let Err(e) = self.interface.connect().await {
            warn!(error = %e, "interface bring-up kickoff failed; waiting for status events");
        }
    }

    /// Dispatch cooperative tasks until a Shutdown task arrives.
    pub async fn run(&mut self) {
        info!(
            scheme = %self.config.scheme(),
            socket = %self.config.kind(),
            "dispatching cooperative task queue"
        );
        while let Some(task) = self.step().await {
            if matches!(task, Task::Shutdown) {
                info!("shutdown requested");
                break;
            }
        }
    }

    /// Run the next queued task to completion and return it.
    pub async fn step(&mut self) -> Option<Task> {
        let task = self.scheduler.next().await?;
        self.handle(task).await;
        Some(task)
    }

    /// Execute one cooperative task. All state mutation happens here,
    /// never in the notification context.
    pub async fn handle(&mut self, task: Task) {
        match task {
            Task::Status(status) => self.on_status(status),
            Task::OpenSession => self.open_session().await,
            Task::Shutdown => self.abandon_session("shutting down"),
        }
    }

    fn on_status(&mut self, status: NetStatus) {
        debug!(state = %self.state, %status, "network status changed");
        match status {
            NetStatus::Connecting => {}
            NetStatus::LocalAddressAssigned => {}
            NetStatus::GlobalAddressAssigned | NetStatus::DeviceReady => match self.state {
                ConnectionState::NetworkAttaching | ConnectionState::Disconnected => {
                    self.transition(ConnectionState::NetworkUp);
                    // Defer the socket work to its own task so it runs in
                    // cooperative context, not inside the status handler.
                    self.scheduler.handle().post(Task::OpenSession);
                }
                ConnectionState::NetworkUp => {
                    debug!("link already up; open task pending");
                }
                _ => {
                    debug!(state = %self.state, "redundant link-up report ignored");
                }
            },
            NetStatus::Disconnected => {
                warn!("network interface lost its link");
                self.abandon_session("link down");
            }
        }
    }

    /// Open the session and drive it through resolve/connect into the
    /// exchange loop. Every failure abandons locally; the next status
    /// event restarts from the top.
    async fn open_session(&mut self) {
        if self.state != ConnectionState::NetworkUp {
            debug!(state = %self.state, "stale open request ignored");
            return;
        }
        if self.session.is_some() {
            warn!("open requested while a session exists; ignoring");
            return;
        }

        self.transition(ConnectionState::SocketOpening);
        info!(profile = %self.interface.profile(), "opening {} socket", self.config.kind());

        let mut session = match TransportSession::open(&self.config, self.interface.as_ref()).await
        {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "socket open failed");
                self.abandon_session("open failed");
                return;
            }
        };

        match self.config.kind() {
            SocketKind::CellularNonIp => {}
            SocketKind::Udp => {
                self.transition(ConnectionState::Resolving);
                match self.cached_or_resolve().await {
                    Ok(addr) => self.resolved = Some(addr),
                    Err(e) => {
                        warn!(error = %e, "address resolution failed");
                        session.close();
                        self.abandon_session("resolve failed");
                        return;
                    }
                }
            }
            SocketKind::Tcp => {
                self.transition(ConnectionState::Resolving);
                let addr = match self.cached_or_resolve().await {
                    Ok(addr) => addr,
                    Err(e) => {
                        warn!(error = %e, "address resolution failed");
                        session.close();
                        self.abandon_session("resolve failed");
                        return;
                    }
                };
                self.resolved = Some(addr);
                self.transition(ConnectionState::Connecting);
                if let Err(e) = session.connect(addr).await {
                    warn!(error = %e, peer = %addr, "connect failed");
                    session.close();
                    self.abandon_session("connect failed");
                    return;
                }
            }
        }

        info!(session = %session.id(), "session established; entering exchange loop");
        self.session = Some(session);
        self.transition(ConnectionState::Running);
        self.run_loop().await;
    }

    /// Resolution is cached across the session's lifetime and cleared on
    /// every Disconnected transition, so a reconnect re-resolves an
    /// endpoint that may have moved.
    async fn cached_or_resolve(&mut self) -> Result<SocketAddr, TransportError> {
        if let Some(addr) = self.resolved {
            return Ok(addr);
        }
        let addr = resolver::resolve(self.config.host(), self.config.port()).await?;
        info!(host = self.config.host(), address = %addr, "endpoint resolved");
        Ok(addr)
    }

    /// Steady-state send-then-receive cycle. Each round advertises the
    /// toggled light state; the echoed command drives the actuator. Any
    /// transport failure leaves the loop and abandons the session.
    async fn run_loop(&mut self) {
        let mut buf = [0u8; RECEIVE_BUFFER_SIZE];
        loop {
            if !self.link.is_up() {
                info!("link flag dropped; leaving exchange loop");
                break;
            }

            let state = self.ctx.toggle_light();
            let frame = self.codec.message(state).encode_framed();
            let dest = self.resolved;

            let Some(session) = self.session.as_mut() else {
                break;
            };
            if let Err(e) = session.send(&frame, dest).await {
                warn!(error = %e, "send failed");
                break;
            }

            match session.receive(&mut buf).await {
                Ok((len, _from)) => match self.codec.decode_bytes(&buf[..len]) {
                    Ok(msg) => self.ctx.apply_light(msg.state()),
                    Err(e) if e.is_ignorable() => {
                        debug!(error = %e, "frame for another group dropped")
                    }
                    Err(e) => warn!(error = %e, "unusable frame dropped"),
                },
                Err(e) => {
                    warn!(error = %e, "receive failed");
                    break;
                }
            }

            if !self.config.pacing().is_zero() {
                sleep(self.config.pacing()).await;
            }
        }
        self.abandon_session("exchange loop ended");
    }

    /// Local abandon: close the socket if open, drop the cached address
    /// and fall back to waiting for the next qualifying status event.
    fn abandon_session(&mut self, reason: &str) {
        if let Some(session) = self.session.take() {
            info!(session = %session.id(), reason, "closing session");
            session.close();
        }
        self.resolved = None;
        if self.state != ConnectionState::Disconnected {
            self.transition(ConnectionState::Disconnected);
        }
    }

    fn transition(&mut self, to: ConnectionState) {
        if !self.state.can_transition_to(to) {
            warn!(from = %self.state, to = %to, "transition outside the state table refused");
            return;
        }
        debug!(from = %self.state, to = %to, "state transition");
        self.state = to;
    }
}
