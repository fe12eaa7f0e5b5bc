//! Reconnecting WebSocket JSON-RPC transport.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chainsock_core::{HealthStatus, JsonRpcRequest, JsonRpcResponse, RpcTransport, TransportError};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::channel::Channel;
use crate::connector::{Connection, Connector, WsConnector};
use crate::failure::ConnectionFailure;
use crate::policy::{Decision, ReconnectConfig, ReconnectPolicy};
use crate::queue::{Pending, RequestQueue};

/// Configuration for [`WsTransport`].
#[derive(Debug, Clone)]
pub struct WsTransportConfig {
    /// Bound on sending a request and on receiving its response.
    pub request_timeout: Duration,
    /// How long an idle loop waits on the queue before re-checking the
    /// stop signal.
    pub queue_poll: Duration,
    /// Delay `close()` waits for the loop to finish its current exchange.
    pub close_grace: Duration,
    pub reconnect: ReconnectConfig,
}

impl Default for WsTransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(15),
            queue_poll: Duration::from_secs(1),
            close_grace: Duration::from_secs(1),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// How a single exchange ended when the connection survived it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exchange {
    /// The correlated response was delivered.
    Answered,
    /// The item was failed with a message-level error.
    Failed,
}

const HEALTH_UNKNOWN: u8 = 0;
const HEALTH_HEALTHY: u8 = 1;
const HEALTH_DEGRADED: u8 = 2;
const HEALTH_UNHEALTHY: u8 = 3;

/// JSON-RPC over a single persistent connection.
///
/// Callers enqueue requests and await a [`Channel`]; one background loop
/// ([`WsTransport::run`]) owns the connection and serves the queue in FIFO
/// order, one exchange at a time, matching each response to its request by
/// `id`.
///
/// # Delivery
/// Delivery is at-least-once. A request in flight when the connection drops
/// is put back at the head of the queue with its original `id` and sent
/// again after reconnecting, so the node may see it twice.
pub struct WsTransport<C: Connector = WsConnector> {
    url: String,
    connector: C,
    config: WsTransportConfig,
    queue: RequestQueue,
    stop: watch::Sender<bool>,
    /// Set once the transport has stopped permanently.
    stopped: Mutex<Option<String>>,
    health: AtomicU8,
}

impl WsTransport<WsConnector> {
    /// WebSocket transport for `url` (`ws://host:port` or any `ws(s)://` URL).
    pub fn new(url: impl Into<String>, config: WsTransportConfig) -> Self {
        Self::with_connector(url, WsConnector, config)
    }
}

impl<C: Connector> WsTransport<C> {
    pub fn with_connector(url: impl Into<String>, connector: C, config: WsTransportConfig) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            url: url.into(),
            connector,
            config,
            queue: RequestQueue::new(),
            stop,
            stopped: Mutex::new(None),
            health: AtomicU8::new(HEALTH_UNKNOWN),
        }
    }

    /// Spawn [`WsTransport::run`] on the current runtime.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<Result<(), ConnectionFailure>> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run().await })
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn config(&self) -> &WsTransportConfig {
        &self.config
    }

    /// Requests waiting for the connection.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// `Some(reason)` once the transport has stopped permanently.
    pub fn stop_reason(&self) -> Option<String> {
        self.stopped_slot().clone()
    }

    fn stopped_slot(&self) -> MutexGuard<'_, Option<String>> {
        self.stopped.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_health(&self, health: u8) {
        self.health.store(health, Ordering::Relaxed);
    }

    fn closing(&self) -> bool {
        *self.stop.borrow()
    }

    /// Queue a request without waiting for it.
    ///
    /// Fails immediately once the transport has stopped permanently.
    pub fn enqueue(&self, request: JsonRpcRequest) -> Result<Channel<JsonRpcResponse>, TransportError> {
        // Held across the push so a concurrent shutdown drains this item.
        let stopped = self.stopped_slot();
        if let Some(reason) = stopped.as_ref() {
            return Err(TransportError::Stopped {
                reason: reason.clone(),
            });
        }
        let channel = Channel::new();
        self.queue.push_back(Pending {
            request,
            channel: channel.clone(),
        });
        Ok(channel)
    }

    /// Signal the loop to exit after its current exchange and wait the
    /// grace delay. Requests still queued stay pending.
    pub async fn close(&self) {
        tracing::debug!(url = %self.url, "WS close requested");
        self.stop.send_replace(true);
        time::sleep(self.config.close_grace).await;
    }

    /// Drive the connection until closed or stopped.
    ///
    /// Returns `Ok(())` after [`WsTransport::close`], or the failure that
    /// stopped the transport permanently.
    pub async fn run(&self) -> Result<(), ConnectionFailure> {
        let policy = ReconnectPolicy::new(self.config.reconnect.clone());
        let mut stop = self.stop.subscribe();
        let mut failures: u32 = 0;

        loop {
            if self.closing() {
                return Ok(());
            }
            let failure = match self.connector.connect(&self.url).await {
                Ok(mut conn) => {
                    tracing::info!(url = %self.url, "WS connected");
                    self.set_health(if failures == 0 { HEALTH_HEALTHY } else { HEALTH_DEGRADED });
                    match self.serve(&mut conn, &mut failures).await {
                        Ok(()) => {
                            conn.close().await;
                            tracing::info!(url = %self.url, "WS transport closed");
                            return Ok(());
                        }
                        Err(failure) => failure,
                    }
                }
                Err(failure) => failure,
            };

            failures += 1;
            match policy.decide(&failure, failures) {
                Decision::Reconnect { after } => {
                    self.set_health(HEALTH_DEGRADED);
                    tracing::warn!(
                        url = %self.url,
                        error = %failure,
                        failures,
                        "WS connection lost, reconnecting in {after:?}"
                    );
                    tokio::select! {
                        _ = time::sleep(after) => {}
                        _ = stop.changed() => return Ok(()),
                    }
                }
                Decision::Stop => {
                    tracing::error!(
                        url = %self.url,
                        error = %failure,
                        failures,
                        "WS transport stopped"
                    );
                    self.shutdown(&failure);
                    return Err(failure);
                }
            }
        }
    }

    /// Serve queued requests over `conn` until it fails or a close is
    /// requested.
    async fn serve<Conn: Connection>(
        &self,
        conn: &mut Conn,
        failures: &mut u32,
    ) -> Result<(), ConnectionFailure> {
        let mut stop = self.stop.subscribe();
        loop {
            if *stop.borrow_and_update() {
                return Ok(());
            }
            let item = tokio::select! {
                item = self.queue.pop(self.config.queue_poll) => item,
                _ = stop.changed() => continue,
            };
            let Some(item) = item else { continue };
            if self.exchange(conn, item).await? == Exchange::Answered {
                *failures = 0;
            }
        }
    }

    /// One request/response cycle. Message-level errors fail only `item`;
    /// connection-level errors are returned after requeueing it.
    async fn exchange<Conn: Connection>(
        &self,
        conn: &mut Conn,
        item: Pending,
    ) -> Result<Exchange, ConnectionFailure> {
        let payload = match serde_json::to_string(&item.request) {
            Ok(p) => p,
            Err(e) => {
                item.channel
                    .set_error(TransportError::Message(format!("encode request: {e}")));
                return Ok(Exchange::Failed);
            }
        };

        let timeout = self.config.request_timeout;
        let timed_out = ConnectionFailure::Timeout {
            ms: timeout.as_millis() as u64,
        };
        tracing::debug!(id = %item.request.id, method = %item.request.method, "WS send");
        match time::timeout(timeout, conn.send_text(payload)).await {
            Ok(Ok(())) => {}
            Ok(Err(failure)) => return Err(self.requeue(item, failure)),
            Err(_) => return Err(self.requeue(item, timed_out)),
        }

        let deadline = Instant::now() + timeout;
        loop {
            let text = match time::timeout_at(deadline, conn.recv_text()).await {
                Ok(Ok(text)) => text,
                Ok(Err(failure)) => return Err(self.requeue(item, failure)),
                Err(_) => return Err(self.requeue(item, timed_out)),
            };

            let value: Value = match serde_json::from_str(&text) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(id = %item.request.id, error = %e, "malformed WS payload");
                    item.channel
                        .set_error(TransportError::Message(format!("decode response: {e}")));
                    return Ok(Exchange::Failed);
                }
            };
            if value.get("id").is_none() {
                tracing::debug!("ignoring WS message without id");
                continue;
            }
            let response: JsonRpcResponse = match serde_json::from_value(value) {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(id = %item.request.id, error = %e, "malformed JSON-RPC response");
                    item.channel
                        .set_error(TransportError::Message(format!("decode response: {e}")));
                    return Ok(Exchange::Failed);
                }
            };
            if response.id != item.request.id {
                tracing::debug!(
                    expected = %item.request.id,
                    got = %response.id,
                    "ignoring uncorrelated response"
                );
                continue;
            }
            item.channel.set_value(response);
            return Ok(Exchange::Answered);
        }
    }

    /// Hand an in-flight item back to the queue, except after a "message
    /// too big" closure where redelivery cannot succeed.
    fn requeue(&self, item: Pending, failure: ConnectionFailure) -> ConnectionFailure {
        if failure.is_message_too_big() {
            item.channel
                .set_error(TransportError::WebSocket(failure.to_string()));
        } else {
            tracing::debug!(id = %item.request.id, "requeueing in-flight request");
            self.queue.push_front(item);
        }
        failure
    }

    /// Stop permanently: later calls fail and everything queued is failed.
    fn shutdown(&self, failure: &ConnectionFailure) {
        let reason = failure.to_string();
        *self.stopped_slot() = Some(reason.clone());
        self.set_health(HEALTH_UNHEALTHY);
        for item in self.queue.drain() {
            item.channel.set_error(TransportError::Stopped {
                reason: reason.clone(),
            });
        }
    }
}

#[async_trait]
impl<C: Connector> RpcTransport for WsTransport<C> {
    async fn send(&self, req: JsonRpcRequest) -> Result<JsonRpcResponse, TransportError> {
        let channel = self.enqueue(req)?;
        channel.get().await
    }

    fn health(&self) -> HealthStatus {
        match self.health.load(Ordering::Relaxed) {
            HEALTH_HEALTHY => HealthStatus::Healthy,
            HEALTH_DEGRADED => HealthStatus::Degraded,
            HEALTH_UNHEALTHY => HealthStatus::Unhealthy,
            _ => HealthStatus::Unknown,
        }
    }

    fn url(&self) -> &str {
        &self.url
    }
}
