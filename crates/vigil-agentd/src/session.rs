//! Agent session lifecycle.
//!
//! A [`Session`] is the server-side end of one connected agent. It owns three
//! tasks: a receiver draining inbound frames into the bus, a sender
//! multiplexing bus deliveries into outbound frames, and a supervisor that
//! runs the cleanup routine once the session is cancelled. Construction
//! publishes a switch-burial keepalive so any watchdog left over from a
//! previous connection is re-armed with current thresholds.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::config::{SendPolicy, SessionConfig};
use crate::error::SessionError;
use crate::metrics::{
    AGENT_SESSIONS, ERROR_LABEL_RING_REMOVE, ERROR_LABEL_START, ERROR_LABEL_STORE_INTERNAL,
    EVENT_BYTES, EVENT_TYPE_CHECK, EVENT_TYPE_CHECK_AND_METRICS, EVENT_TYPE_METRICS,
    SESSION_ERRORS, WEBSOCKET_ERRORS,
};
use crate::subscriptions::{agent_consumer_id, diff, sort_subscriptions};
use vigil_bus::topics::{
    entity_config_topic, subscription_topic, TOPIC_EVENT_RAW, TOPIC_KEEPALIVE, TOPIC_KEEPALIVE_RAW,
};
use vigil_bus::{BusMessage, BusReceiver, MessageBus, Subscription};
use vigil_core::{
    add_entity_subscription, Check, Entity, EntityConfig, Event, ENTITY_AGENT_CLASS,
    ENTITY_SUBSCRIPTION_PREFIX, KEEPALIVE_CHECK_NAME, SWITCH_BURIAL_SENTINEL,
};
use vigil_ring::{ring_key, Ring, RingPool};
use vigil_store::{EntityConfigStore, StoreError, WatchAction, WatchEvent};
use vigil_transport::{Message, MessageType, Transport, TransportError};

/// Capacity of the check request channel. Sized for the fan-in burst when a
/// session joins many subscriptions at once.
pub const CHECK_CHANNEL_CAPACITY: usize = 100;

/// Capacity of the entity-config update channel. Watch events are rare.
pub const ENTITY_CONFIG_CHANNEL_CAPACITY: usize = 10;

/// Bound on the close-frame plus close call during shutdown.
const CLOSE_GRACE_PERIOD: Duration = Duration::from_secs(10);

/// Bound on each ring removal during shutdown, independent of session
/// cancellation so cleanup still runs when the session context is gone.
const RING_REMOVE_TIMEOUT: Duration = Duration::from_secs(1);

/// The keepalive published at construction time. The burial sentinel tells
/// the keepalive watchdog to discard any switch left over from a previous
/// connection of this entity, so the next real keepalive re-creates it with
/// possibly-changed thresholds.
fn switch_burial_event(cfg: &SessionConfig) -> Event {
    let mut event = Event {
        timestamp: SWITCH_BURIAL_SENTINEL,
        entity: Some(Entity::agent(
            &cfg.agent_name,
            &cfg.namespace,
            cfg.subscriptions.clone(),
        )),
        check: Some(Check::new(KEEPALIVE_CHECK_NAME, &cfg.namespace)),
        ..Event::default()
    };
    event.metadata.namespace = cfg.namespace.clone();
    event
}

/// Subscription state shared between the sender, bootstrap and shutdown.
/// One lock covers the list, the handle map and the deregister flag so
/// reconciliation is atomic with respect to shutdown.
struct SubscriptionState {
    /// Current subscription names, sorted and free of empty strings.
    subscriptions: Vec<String>,
    /// Bus topic to live subscription handle. The entity-config topic is
    /// tracked separately.
    handles: HashMap<String, Box<dyn Subscription>>,
    /// Whether the entity deregisters on disconnect, in which case its ring
    /// memberships are dropped during shutdown.
    deregister: bool,
}

/// The receivers handed to the sender task when it starts.
struct SenderChannels {
    entity_rx: mpsc::Receiver<BusMessage>,
    check_rx: mpsc::Receiver<BusMessage>,
}

/// What the sender does with one multiplexer wakeup.
enum SenderStep {
    Send(Message),
    Skip,
    Terminate,
}

/// One connected agent's server-side session.
pub struct Session {
    cfg: SessionConfig,
    transport: Arc<dyn Transport>,
    bus: Arc<dyn MessageBus>,
    store: Arc<dyn EntityConfigStore>,
    ring_pool: Option<Arc<dyn RingPool>>,
    /// Bus consumer identifier, unique per session.
    consumer_id: String,
    state: tokio::sync::Mutex<SubscriptionState>,
    /// Write capability of the check channel, handed to the bus for each
    /// check subscription. Dropped during shutdown to close the channel.
    check_tx: parking_lot::Mutex<Option<BusReceiver>>,
    /// Write capability of the entity-config channel.
    entity_tx: parking_lot::Mutex<Option<BusReceiver>>,
    /// Read ends of both channels, taken once by the sender task.
    inbound: parking_lot::Mutex<Option<SenderChannels>>,
    /// Single-slot holder for the entity-config topic subscription, drained
    /// once during shutdown.
    entity_config_sub: parking_lot::Mutex<Option<Box<dyn Subscription>>>,
    cancel: CancellationToken,
    /// Tracks the receiver and sender pair.
    tasks: TaskTracker,
    /// Tracks the supervisor running the cleanup routine.
    stop_tasks: TaskTracker,
}

impl Session {
    /// Build a session for a handshaken transport.
    ///
    /// Publishes the switch-burial keepalive; failure to publish fails
    /// construction and no other side effect has happened yet. The session
    /// does nothing further until [`start`](Self::start).
    pub async fn new(
        cfg: SessionConfig,
        transport: Arc<dyn Transport>,
        bus: Arc<dyn MessageBus>,
        store: Arc<dyn EntityConfigStore>,
        ring_pool: Option<Arc<dyn RingPool>>,
    ) -> Result<Arc<Self>, SessionError> {
        info!(
            namespace = %cfg.namespace,
            agent = %cfg.agent_name,
            addr = %cfg.agent_addr,
            user = %cfg.user,
            subscriptions = ?cfg.subscriptions,
            "agent connected"
        );

        bus.publish(
            TOPIC_KEEPALIVE,
            BusMessage::Event(Box::new(switch_burial_event(&cfg))),
        )
        .await?;

        let (check_tx, check_rx) = mpsc::channel(CHECK_CHANNEL_CAPACITY);
        let (entity_tx, entity_rx) = mpsc::channel(ENTITY_CONFIG_CHANNEL_CAPACITY);
        let consumer_id = agent_consumer_id(&cfg.namespace, &cfg.agent_name);
        let subscriptions = sort_subscriptions(cfg.subscriptions.clone());

        let tasks = TaskTracker::new();
        tasks.close();
        let stop_tasks = TaskTracker::new();
        stop_tasks.close();

        Ok(Arc::new(Self {
            cfg,
            transport,
            bus,
            store,
            ring_pool,
            consumer_id,
            state: tokio::sync::Mutex::new(SubscriptionState {
                subscriptions,
                handles: HashMap::new(),
                deregister: false,
            }),
            check_tx: parking_lot::Mutex::new(Some(check_tx)),
            entity_tx: parking_lot::Mutex::new(Some(entity_tx)),
            inbound: parking_lot::Mutex::new(Some(SenderChannels {
                entity_rx,
                check_rx,
            })),
            entity_config_sub: parking_lot::Mutex::new(None),
            cancel: CancellationToken::new(),
            tasks,
            stop_tasks,
        }))
    }

    /// Start the session: spawn the sender, receiver and supervisor, then
    /// bootstrap the entity configuration and check subscriptions.
    ///
    /// The session stops when `parent` is cancelled, when the transport
    /// fails, or when its entity is deleted. On error the caller must
    /// [`stop`](Self::stop) and discard the session.
    pub async fn start(self: Arc<Self>, parent: &CancellationToken) -> Result<(), SessionError> {
        gauge!(AGENT_SESSIONS, "namespace" => self.cfg.namespace.clone()).increment(1.0);

        let session = Arc::clone(&self);
        self.tasks.spawn(async move {
            session.sender_loop().await;
            session.cancel.cancel();
        });

        let session = Arc::clone(&self);
        self.tasks.spawn(async move {
            Arc::clone(&session).receiver_loop().await;
            session.cancel.cancel();
        });

        let session = Arc::clone(&self);
        let parent = parent.clone();
        self.stop_tasks.spawn(async move {
            tokio::select! {
                () = parent.cancelled() => {}
                () = session.cancel.cancelled() => {}
            }
            session.cancel.cancel();
            session.shutdown().await;
        });

        match self.bootstrap().await {
            Ok(()) => Ok(()),
            Err(err) => {
                counter!(SESSION_ERRORS, "error" => ERROR_LABEL_START).increment(1);
                Err(err)
            }
        }
    }

    /// Stop the session and block until its tasks and cleanup routine have
    /// finished. Safe to call more than once.
    pub async fn stop(&self) {
        self.cancel.cancel();
        self.tasks.wait().await;
        self.stop_tasks.wait().await;
    }

    /// Snapshot of the current subscription names, sorted.
    pub async fn subscriptions(&self) -> Vec<String> {
        self.state.lock().await.subscriptions.clone()
    }

    /// Subscribe to the entity-config topic, publish the stored entity
    /// configuration (or the not-found placeholder), and join the configured
    /// check subscriptions.
    async fn bootstrap(&self) -> Result<(), SessionError> {
        let topic = entity_config_topic(&self.cfg.namespace, &self.cfg.agent_name);
        debug!(
            agent = %self.cfg.agent_name,
            namespace = %self.cfg.namespace,
            topic = %topic,
            "subscribing to entity config topic"
        );

        let Some(receiver) = self.entity_tx.lock().clone() else {
            // Already shut down; nothing left to bootstrap.
            return Ok(());
        };
        let subscription = match self.bus.subscribe(&topic, &self.consumer_id, receiver).await {
            Ok(subscription) => subscription,
            Err(err) => {
                error!(topic = %topic, error = %err, "error starting entity config subscription");
                return Err(err.into());
            }
        };
        *self.entity_config_sub.lock() = Some(subscription);

        match self
            .store
            .get(&self.cfg.namespace, &self.cfg.agent_name)
            .await
        {
            Err(StoreError::NotFound { .. }) => {
                debug!(agent = %self.cfg.agent_name, "no entity config found");

                // Tell the agent no configuration exists; it may then
                // register its local one.
                let placeholder = EntityConfig::not_found_placeholder(&self.cfg.namespace);
                let watch = WatchEvent::new(WatchAction::Create, placeholder);
                if let Err(err) = self
                    .bus
                    .publish(&topic, BusMessage::EntityConfigWatch(Box::new(watch)))
                    .await
                {
                    error!(error = %err, "error publishing entity config");
                    return Err(err.into());
                }
            }
            Err(err) => {
                error!(error = %err, "error querying the entity config");
                return Err(err.into());
            }
            Ok(mut stored) => {
                debug!(agent = %self.cfg.agent_name, "an entity config was found");

                // The backend is talking to the agent again; the agent is no
                // longer the configuration owner.
                stored.clear_agent_managed();

                // The stored subscriptions supersede whatever the agent
                // declared at handshake.
                let adopted = sort_subscriptions(stored.subscriptions.clone());

                let watch = WatchEvent::new(WatchAction::Update, stored);
                if let Err(err) = self
                    .bus
                    .publish(&topic, BusMessage::EntityConfigWatch(Box::new(watch)))
                    .await
                {
                    error!(error = %err, "error publishing entity config");
                    return Err(err.into());
                }

                self.state.lock().await.subscriptions = adopted;
            }
        }

        let subscriptions = self.state.lock().await.subscriptions.clone();
        self.subscribe(&subscriptions).await
    }

    /// Inbound loop: drain frames from the transport and dispatch them.
    async fn receiver_loop(self: Arc<Self>) {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let message = tokio::select! {
                () = self.cancel.cancelled() => break,
                received = self.transport.receive() => match received {
                    Ok(message) => message,
                    Err(err) => {
                        if self.cancel.is_cancelled() {
                            break;
                        }
                        record_transport_error("recv", &err);
                        match err {
                            TransportError::Connection(_) | TransportError::Closed(_) => {
                                warn!(
                                    addr = %self.cfg.agent_addr,
                                    agent = %self.cfg.agent_name,
                                    error = %err,
                                    "stopping session"
                                );
                            }
                            TransportError::Other(_) => {
                                error!(error = %err, "recv error");
                            }
                        }
                        break;
                    }
                },
            };

            let deadline = Duration::from_secs(self.cfg.write_timeout_secs);
            match tokio::time::timeout(deadline, self.dispatch(&message)).await {
                Err(_elapsed) => {
                    // The handler overran its budget; treat the session as
                    // wedged rather than keep reading behind it.
                    if !self.cancel.is_cancelled() {
                        warn!(
                            message_type = %message.message_type,
                            "timed out handling message"
                        );
                    }
                    break;
                }
                Ok(Err(err)) => {
                    if self.cancel.is_cancelled() {
                        break;
                    }
                    error!(
                        message_type = %message.message_type,
                        error = %err,
                        "error handling message"
                    );
                    if err.is_fatal() {
                        counter!(SESSION_ERRORS, "error" => ERROR_LABEL_STORE_INTERNAL)
                            .increment(1);
                        error!("internal error - stopping session");
                        let session = Arc::clone(&self);
                        tokio::spawn(async move { session.stop().await });
                    }
                }
                Ok(Ok(())) => {}
            }
        }
        info!("shutting down agent session: stopping receiver");
    }

    async fn dispatch(&self, message: &Message) -> Result<(), SessionError> {
        match &message.message_type {
            MessageType::Keepalive => self.handle_keepalive(&message.payload).await,
            MessageType::Event => self.handle_event(&message.payload).await,
            other => Err(SessionError::UnknownMessageType(other.to_string())),
        }
    }

    /// Validate a keepalive and relay it to the keepalive topic.
    async fn handle_keepalive(&self, payload: &[u8]) -> Result<(), SessionError> {
        let mut keepalive: Event = self.cfg.codec.decode(payload)?;
        keepalive.validate()?;

        // Not covered by structural validation: a zero timestamp means the
        // agent never populated it.
        if keepalive.timestamp == 0 {
            return Err(SessionError::InvalidKeepaliveTimestamp);
        }

        if let Some(entity) = keepalive.entity.as_mut() {
            let subscriptions = std::mem::take(&mut entity.subscriptions);
            entity.subscriptions = add_entity_subscription(&entity.metadata.name, subscriptions);
        }

        self.bus
            .publish(TOPIC_KEEPALIVE, BusMessage::Event(Box::new(keepalive)))
            .await?;
        Ok(())
    }

    /// Validate a telemetry event and relay it to the raw event topics.
    async fn handle_event(&self, payload: &[u8]) -> Result<(), SessionError> {
        let mut event: Event = self.cfg.codec.decode(payload)?;
        event.validate()?;

        if let Some(entity) = event.entity.as_mut() {
            let subscriptions = std::mem::take(&mut entity.subscriptions);
            entity.subscriptions = add_entity_subscription(&entity.metadata.name, subscriptions);
        }

        let payload_bytes = payload.len() as f64;
        if event.has_check() {
            if event.has_metrics() {
                histogram!(EVENT_BYTES, "event_type" => EVENT_TYPE_CHECK_AND_METRICS)
                    .record(payload_bytes);
            } else {
                histogram!(EVENT_BYTES, "event_type" => EVENT_TYPE_CHECK).record(payload_bytes);
            }
            if event.is_keepalive() {
                self.bus
                    .publish(TOPIC_KEEPALIVE_RAW, BusMessage::Event(Box::new(event)))
                    .await?;
                return Ok(());
            }
        } else if event.has_metrics() {
            histogram!(EVENT_BYTES, "event_type" => EVENT_TYPE_METRICS).record(payload_bytes);
        }

        self.bus
            .publish(TOPIC_EVENT_RAW, BusMessage::Event(Box::new(event)))
            .await?;
        Ok(())
    }

    /// Outbound loop: multiplex entity-config updates and check requests
    /// into transport frames.
    async fn sender_loop(&self) {
        let Some(SenderChannels {
            mut entity_rx,
            mut check_rx,
        }) = self.inbound.lock().take()
        else {
            error!("sender channels already taken, refusing to start a second sender");
            return;
        };

        loop {
            let step = self.next_step(&mut entity_rx, &mut check_rx).await;
            let message = match step {
                SenderStep::Send(message) => message,
                SenderStep::Skip => continue,
                SenderStep::Terminate => break,
            };

            debug!(
                message_type = %message.message_type,
                payload_size = message.payload.len(),
                "session - sending message"
            );
            if let Err(err) = self.transport.send(message).await {
                if self.cancel.is_cancelled() {
                    break;
                }
                record_transport_error("send", &err);
                if let TransportError::Other(_) = err {
                    error!(error = %err, "send error");
                }
                break;
            }
        }
        info!("shutting down agent session: stopping sender");
    }

    async fn next_step(
        &self,
        entity_rx: &mut mpsc::Receiver<BusMessage>,
        check_rx: &mut mpsc::Receiver<BusMessage>,
    ) -> SenderStep {
        match self.cfg.send_policy {
            SendPolicy::Unbiased => tokio::select! {
                () = self.cancel.cancelled() => SenderStep::Terminate,
                update = entity_rx.recv() => self.on_entity_update(update).await,
                request = check_rx.recv() => self.on_check_request(request),
            },
            SendPolicy::EntityConfigFirst => tokio::select! {
                biased;
                () = self.cancel.cancelled() => SenderStep::Terminate,
                update = entity_rx.recv() => self.on_entity_update(update).await,
                request = check_rx.recv() => self.on_check_request(request),
            },
        }
    }

    /// React to one entity-config watch delivery.
    async fn on_entity_update(&self, update: Option<BusMessage>) -> SenderStep {
        let Some(message) = update else {
            if !self.cancel.is_cancelled() {
                error!("entity config updates channel closed, terminating session");
            }
            return SenderStep::Terminate;
        };
        let watch = match message {
            BusMessage::EntityConfigWatch(watch) => watch,
            other => {
                error!(
                    kind = other.kind(),
                    "session received unexpected message over the entity config channel"
                );
                return SenderStep::Skip;
            }
        };
        let WatchEvent { action, entity } = *watch;

        match action {
            WatchAction::Delete => return SenderStep::Terminate,
            WatchAction::Unknown => {
                error!("session received unknown watch event");
                return SenderStep::Skip;
            }
            WatchAction::Create | WatchAction::Update => {}
        }

        let Some(mut entity) = entity else {
            error!("session received nil entity in watch event");
            return SenderStep::Skip;
        };

        debug!(
            action = %action,
            entity = %entity.metadata.name,
            namespace = %entity.metadata.namespace,
            "entity update received"
        );

        if entity.entity_class != ENTITY_AGENT_CLASS {
            warn!(
                entity_class = %entity.entity_class,
                "misconfigured entity class, updating entity to be an agent"
            );
            entity.entity_class = ENTITY_AGENT_CLASS.into();

            if let Err(err) = self.store.create_or_update(&entity).await {
                counter!(SESSION_ERRORS, "error" => err.to_string()).increment(1);
                error!(error = %err, "could not update the entity config");
            }

            // The corrected record comes back as its own watch event; that
            // one is forwarded to the agent, this one is not.
            return SenderStep::Skip;
        }

        let (added, removed) = {
            let mut state = self.state.lock().await;
            state.deregister = entity.deregister;
            let old = sort_subscriptions(state.subscriptions.clone());
            let new = sort_subscriptions(entity.subscriptions.clone());
            let (added, removed) = diff(&old, &new);
            state.subscriptions = new;
            (added, removed)
        };
        if !added.is_empty() {
            debug!(count = added.len(), subscriptions = ?added, "found new subscriptions");
            // Failures are logged inside; the entity update is still
            // forwarded and the next reconciliation retries.
            let _ = self.subscribe(&added).await;
        }
        if !removed.is_empty() {
            debug!(
                count = removed.len(),
                subscriptions = ?removed,
                "found subscriptions to unsubscribe from"
            );
            self.unsubscribe(&removed).await;
        }

        if entity.is_agent_managed() {
            debug!("not sending entity config update, entity is managed by its agent");
            return SenderStep::Skip;
        }

        match self.cfg.codec.encode(&entity) {
            Ok(payload) => SenderStep::Send(Message::new(MessageType::EntityConfig, payload)),
            Err(err) => {
                error!(error = %err, "session failed to serialize entity config");
                SenderStep::Skip
            }
        }
    }

    /// React to one check-request delivery.
    fn on_check_request(&self, request: Option<BusMessage>) -> SenderStep {
        let Some(message) = request else {
            if !self.cancel.is_cancelled() {
                error!("check channel closed, terminating session");
            }
            return SenderStep::Terminate;
        };
        let request = match message {
            BusMessage::CheckRequest(request) => request,
            other => {
                error!(
                    kind = other.kind(),
                    "session received non-request over the check channel"
                );
                return SenderStep::Skip;
            }
        };

        match self.cfg.codec.encode(&*request) {
            Ok(payload) => SenderStep::Send(Message::new(MessageType::CheckRequest, payload)),
            Err(err) => {
                error!(error = %err, "session failed to serialize check request");
                SenderStep::Skip
            }
        }
    }

    /// Join every named check subscription the session is not already in.
    async fn subscribe(&self, names: &[String]) -> Result<(), SessionError> {
        let mut state = self.state.lock().await;

        for name in names {
            if name.is_empty() {
                continue;
            }

            let topic = subscription_topic(&self.cfg.namespace, name);
            if state.handles.contains_key(&topic) {
                debug!(
                    agent = %self.cfg.agent_name,
                    subscription = %name,
                    "ignoring subscription, session is already subscribed"
                );
                continue;
            }

            let Some(receiver) = self.check_tx.lock().clone() else {
                // Shutdown already closed the check channel.
                break;
            };

            debug!(agent = %self.cfg.agent_name, subscription = %name, "subscribing");
            match self.bus.subscribe(&topic, &self.consumer_id, receiver).await {
                Ok(handle) => {
                    state.handles.insert(topic, handle);
                }
                Err(err) => {
                    error!(
                        agent = %self.cfg.agent_name,
                        subscription = %name,
                        error = %err,
                        "could not subscribe"
                    );
                    return Err(err.into());
                }
            }
        }

        Ok(())
    }

    /// Leave every named check subscription, then drop ring memberships when
    /// the entity deregisters on disconnect.
    async fn unsubscribe(&self, names: &[String]) {
        let mut state = self.state.lock().await;

        for name in names {
            let topic = subscription_topic(&self.cfg.namespace, name);
            if let Some(handle) = state.handles.remove(&topic) {
                if let Err(err) = handle.cancel().await {
                    error!(
                        agent = %self.cfg.agent_name,
                        subscription = %name,
                        error = %err,
                        "session shutdown: unable to unsubscribe"
                    );
                    // Keep the handle so a later pass can retry the cancel.
                    state.handles.insert(topic, handle);
                    continue;
                }
                debug!(
                    agent = %self.cfg.agent_name,
                    subscription = %name,
                    "session shutdown: successfully unsubscribed"
                );
            } else {
                error!(
                    agent = %self.cfg.agent_name,
                    subscription = %name,
                    "session shutdown: session was not subscribed"
                );
            }
        }

        let Some(ring_pool) = &self.ring_pool else {
            return;
        };
        if !state.deregister {
            // The entity is expected to rejoin shortly; leave its ring
            // memberships alone.
            return;
        }

        for name in names {
            // Entity subscriptions don't get rings.
            if name.starts_with(ENTITY_SUBSCRIPTION_PREFIX) {
                continue;
            }

            // Failures here are counted, never logged: this path runs on
            // every disconnect and would flood the logs at cluster scale.
            let ring: Arc<dyn Ring> = ring_pool.get(&ring_key(&self.cfg.namespace, name));
            match tokio::time::timeout(RING_REMOVE_TIMEOUT, ring.remove(&self.cfg.agent_name)).await
            {
                Ok(Ok(())) => {}
                Ok(Err(_)) => {
                    counter!(SESSION_ERRORS, "error" => ERROR_LABEL_RING_REMOVE).increment(1);
                }
                Err(_elapsed) => {
                    // The coordination backend is unresponsive; give up on
                    // the remaining removals.
                    counter!(SESSION_ERRORS, "error" => ERROR_LABEL_RING_REMOVE).increment(1);
                    return;
                }
            }
        }
    }

    /// The cleanup routine, run exactly once by the supervisor.
    async fn shutdown(&self) {
        let close = async {
            // Ask the agent to close its end before dropping ours, unless
            // the connection is already gone.
            if !self.transport.closed() {
                if self.transport.send_close_message().await.is_err() {
                    counter!(WEBSOCKET_ERRORS, "op" => "send", "error" => "SendCloseMessage")
                        .increment(1);
                    warn!("unexpected error while sending a close message to the agent");
                }
            }
            if let Err(err) = self.transport.close().await {
                counter!(WEBSOCKET_ERRORS, "op" => "close", "error" => "CloseSession").increment(1);
                error!(error = %err, "error closing session");
            }
        };
        if tokio::time::timeout(CLOSE_GRACE_PERIOD, close).await.is_err() {
            warn!(agent = %self.cfg.agent_name, "transport close timed out");
        }

        gauge!(AGENT_SESSIONS, "namespace" => self.cfg.namespace.clone()).decrement(1.0);

        let entity_config_sub = self.entity_config_sub.lock().take();
        if let Some(subscription) = entity_config_sub {
            if let Err(err) = subscription.cancel().await {
                error!(error = %err, "unable to unsubscribe from message bus");
            }
        }

        let subscriptions = self.state.lock().await.subscriptions.clone();
        self.unsubscribe(&subscriptions).await;

        // Close the outbound channels, entity config first, then checks.
        drop(self.entity_tx.lock().take());
        drop(self.check_tx.lock().take());
    }
}

/// Count a transport failure under its op and classification.
fn record_transport_error(op: &'static str, err: &TransportError) {
    let label = match err {
        TransportError::Connection(_) => "ConnectionError",
        TransportError::Closed(_) => "ClosedError",
        TransportError::Other(_) => "UnknownError",
    };
    counter!(WEBSOCKET_ERRORS, "op" => op, "error" => label).increment(1);
}
