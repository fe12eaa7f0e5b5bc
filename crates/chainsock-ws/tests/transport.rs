//! Transport behaviour over scripted in-memory connections.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chainsock_core::{JsonRpcRequest, JsonRpcResponse, RpcId, RpcTransport, TransportError};
use chainsock_ws::{
    Connection, ConnectionFailure, Connector, ReconnectConfig, WsTransport, WsTransportConfig,
};
use serde_json::json;

/// How a scripted connection answers.
#[derive(Clone, Copy)]
enum Plan {
    /// Reply `result = method` with the request's id.
    Echo,
    /// Accept the send, then drop with close code 1006.
    DropOnRecv,
    /// Answer the first request with garbage, then echo.
    GarbageFirst,
    /// Send a reply for some other id before the real one.
    NoiseFirst,
    /// Answer the first request with garbage, then drop with 1006.
    GarbageThenDrop,
    /// Answer the first request, then drop with 1006.
    EchoOnceThenDrop,
    /// Accept sends and never reply.
    Silent,
    /// Close with 1009 instead of replying.
    TooBig,
}

type SentLog = Arc<Mutex<Vec<JsonRpcRequest>>>;

struct ScriptedConnector {
    plans: Mutex<VecDeque<Result<Plan, ConnectionFailure>>>,
    fallback: Result<Plan, ConnectionFailure>,
    connects: AtomicUsize,
    sent: SentLog,
}

impl ScriptedConnector {
    fn new(plans: Vec<Result<Plan, ConnectionFailure>>) -> Self {
        Self {
            plans: Mutex::new(plans.into()),
            fallback: Ok(Plan::Echo),
            connects: AtomicUsize::new(0),
            sent: Arc::default(),
        }
    }

    fn always(outcome: Result<Plan, ConnectionFailure>) -> Self {
        Self {
            fallback: outcome,
            ..Self::new(vec![])
        }
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Conn = ScriptedConnection;

    async fn connect(&self, _url: &str) -> Result<ScriptedConnection, ConnectionFailure> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let next = self
            .plans
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        let plan = next?;
        Ok(ScriptedConnection {
            plan,
            replies: VecDeque::new(),
            served: 0,
            sent: self.sent.clone(),
        })
    }
}

struct ScriptedConnection {
    plan: Plan,
    replies: VecDeque<String>,
    served: usize,
    sent: SentLog,
}

fn echo(req: &JsonRpcRequest) -> String {
    serde_json::to_string(&JsonRpcResponse::success(req.id.clone(), json!(req.method))).unwrap()
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn send_text(&mut self, text: String) -> Result<(), ConnectionFailure> {
        let req: JsonRpcRequest = serde_json::from_str(&text).unwrap();
        self.sent.lock().unwrap().push(req.clone());
        match self.plan {
            Plan::Echo => self.replies.push_back(echo(&req)),
            Plan::DropOnRecv | Plan::Silent | Plan::TooBig => {}
            Plan::GarbageFirst | Plan::GarbageThenDrop if self.served == 0 => {
                self.replies.push_back("not json".into())
            }
            Plan::GarbageFirst => self.replies.push_back(echo(&req)),
            Plan::EchoOnceThenDrop if self.served == 0 => self.replies.push_back(echo(&req)),
            Plan::GarbageThenDrop | Plan::EchoOnceThenDrop => {}
            Plan::NoiseFirst => {
                let other = JsonRpcRequest::new(RpcId::random(), "noise", vec![]);
                self.replies.push_back(echo(&other));
                self.replies.push_back(echo(&req));
            }
        }
        self.served += 1;
        Ok(())
    }

    async fn recv_text(&mut self) -> Result<String, ConnectionFailure> {
        if let Some(reply) = self.replies.pop_front() {
            return Ok(reply);
        }
        match self.plan {
            Plan::DropOnRecv | Plan::GarbageThenDrop | Plan::EchoOnceThenDrop => {
                Err(ConnectionFailure::Closed {
                    code: 1006,
                    reason: "abnormal closure".into(),
                })
            }
            Plan::TooBig => Err(ConnectionFailure::Closed {
                code: 1009,
                reason: "message too big".into(),
            }),
            _ => futures::future::pending().await,
        }
    }

    async fn close(&mut self) {}
}

fn fast_config(fail_threshold: u32) -> WsTransportConfig {
    WsTransportConfig {
        request_timeout: Duration::from_millis(200),
        queue_poll: Duration::from_millis(20),
        close_grace: Duration::from_millis(50),
        reconnect: ReconnectConfig {
            fail_threshold,
            backoff: Duration::from_millis(10),
            restart: true,
        },
    }
}

fn request(method: &str) -> JsonRpcRequest {
    JsonRpcRequest::with_random_id(method, vec![])
}

#[tokio::test]
async fn queued_requests_are_sent_fifo_and_correlated() {
    let transport = Arc::new(WsTransport::with_connector(
        "ws://node",
        ScriptedConnector::new(vec![]),
        fast_config(10),
    ));
    let methods = ["eth_blockNumber", "eth_gasPrice", "eth_coinbase"];
    let requests: Vec<JsonRpcRequest> = methods.iter().map(|m| request(m)).collect();
    let channels: Vec<_> = requests
        .iter()
        .map(|r| transport.enqueue(r.clone()).unwrap())
        .collect();

    let handle = transport.spawn();
    for (channel, method) in channels.iter().zip(methods) {
        let resp = channel.get().await.unwrap();
        assert_eq!(resp.into_result().unwrap(), json!(method));
    }

    let sent: Vec<RpcId> = transport
        .connector_sent()
        .iter()
        .map(|r| r.id.clone())
        .collect();
    let expected: Vec<RpcId> = requests.iter().map(|r| r.id.clone()).collect();
    assert_eq!(sent, expected);

    transport.close().await;
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn dropped_request_is_redelivered_once_with_same_id() {
    let connector = ScriptedConnector::new(vec![Ok(Plan::DropOnRecv), Ok(Plan::Echo)]);
    let transport = Arc::new(WsTransport::with_connector("ws://node", connector, fast_config(10)));
    let handle = transport.spawn();

    let req = request("eth_blockNumber");
    let resp = transport.send(req.clone()).await.unwrap();
    assert_eq!(resp.id, req.id);

    let sent = transport.connector_sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|r| r.id == req.id));
    assert_eq!(transport.connects(), 2);

    transport.close().await;
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn uncorrelated_responses_are_ignored() {
    let connector = ScriptedConnector::new(vec![Ok(Plan::NoiseFirst)]);
    let transport = Arc::new(WsTransport::with_connector("ws://node", connector, fast_config(10)));
    let handle = transport.spawn();

    let req = request("eth_gasPrice");
    let resp = transport.send(req.clone()).await.unwrap();
    assert_eq!(resp.id, req.id);
    assert_eq!(resp.into_result().unwrap(), json!("eth_gasPrice"));

    transport.close().await;
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn malformed_payload_fails_only_that_request() {
    let connector = ScriptedConnector::new(vec![Ok(Plan::GarbageFirst)]);
    let transport = Arc::new(WsTransport::with_connector("ws://node", connector, fast_config(10)));
    let handle = transport.spawn();

    let first = transport.send(request("eth_accounts")).await;
    assert!(matches!(first, Err(TransportError::Message(_))));
    let second = transport.send(request("eth_coinbase")).await.unwrap();
    assert_eq!(second.into_result().unwrap(), json!("eth_coinbase"));
    assert_eq!(transport.connects(), 1);

    transport.close().await;
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn malformed_replies_do_not_reset_failure_count() {
    let transport = Arc::new(WsTransport::with_connector(
        "ws://node",
        ScriptedConnector::always(Ok(Plan::GarbageThenDrop)),
        fast_config(2),
    ));
    let channels: Vec<_> = (0..8)
        .map(|_| transport.enqueue(request("eth_blockNumber")).unwrap())
        .collect();

    let result = transport.spawn().await.unwrap();
    assert!(matches!(result, Err(ConnectionFailure::Closed { code: 1006, .. })));
    assert_eq!(transport.connects(), 2);
    assert!(transport.stop_reason().is_some());

    for channel in &channels[..2] {
        assert!(matches!(channel.try_get(), Some(Err(TransportError::Message(_)))));
    }
    for channel in &channels[2..] {
        assert!(matches!(
            channel.try_get(),
            Some(Err(TransportError::Stopped { .. }))
        ));
    }
}

#[tokio::test]
async fn successful_cycle_resets_failure_count() {
    let connector = ScriptedConnector::new(vec![
        Ok(Plan::DropOnRecv),
        Ok(Plan::EchoOnceThenDrop),
        Ok(Plan::EchoOnceThenDrop),
    ]);
    let transport = Arc::new(WsTransport::with_connector("ws://node", connector, fast_config(2)));
    let methods = ["eth_blockNumber", "eth_gasPrice", "eth_coinbase"];
    let channels: Vec<_> = methods
        .iter()
        .map(|m| transport.enqueue(request(m)).unwrap())
        .collect();

    let handle = transport.spawn();
    for (channel, method) in channels.iter().zip(methods) {
        let resp = channel.get().await.unwrap();
        assert_eq!(resp.into_result().unwrap(), json!(method));
    }
    assert_eq!(transport.connects(), 4);
    assert!(transport.stop_reason().is_none());

    transport.close().await;
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn timeout_requeues_and_reconnects() {
    let connector = ScriptedConnector::new(vec![Ok(Plan::Silent)]);
    let transport = Arc::new(WsTransport::with_connector("ws://node", connector, fast_config(10)));
    let handle = transport.spawn();

    let req = request("eth_syncing");
    let resp = transport.send(req.clone()).await.unwrap();
    assert_eq!(resp.id, req.id);

    let sent = transport.connector_sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|r| r.id == req.id));
    assert_eq!(transport.connects(), 2);

    transport.close().await;
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
async fn message_too_big_fails_in_flight_request_and_stops() {
    let transport = Arc::new(WsTransport::with_connector(
        "ws://node",
        ScriptedConnector::new(vec![Ok(Plan::TooBig)]),
        fast_config(10),
    ));
    let in_flight = transport.enqueue(request("eth_sendRawTransaction")).unwrap();
    let queued = transport.enqueue(request("eth_blockNumber")).unwrap();

    let result = transport.spawn().await.unwrap();
    assert!(matches!(result, Err(ConnectionFailure::Closed { code: 1009, .. })));
    assert!(matches!(in_flight.try_get(), Some(Err(TransportError::WebSocket(_)))));
    assert!(matches!(
        queued.try_get(),
        Some(Err(TransportError::Stopped { .. }))
    ));
    assert_eq!(transport.connector_sent().len(), 1);
    assert_eq!(transport.connects(), 1);
}

#[tokio::test]
async fn fatal_failure_stops_and_fails_queued_requests() {
    let fatal = ConnectionFailure::Closed {
        code: 1011,
        reason: "internal error".into(),
    };
    let transport = Arc::new(WsTransport::with_connector(
        "ws://node",
        ScriptedConnector::always(Err(fatal.clone())),
        fast_config(10),
    ));
    let queued = transport.enqueue(request("eth_blockNumber")).unwrap();

    let result = transport.spawn().await.unwrap();
    assert_eq!(result, Err(fatal));
    assert!(matches!(
        queued.try_get(),
        Some(Err(TransportError::Stopped { .. }))
    ));
    assert!(matches!(
        transport.send(request("eth_gasPrice")).await,
        Err(TransportError::Stopped { .. })
    ));
    assert_eq!(transport.connects(), 1);
}

#[tokio::test]
async fn tolerable_failures_trip_at_threshold() {
    let transport = Arc::new(WsTransport::with_connector(
        "ws://node",
        ScriptedConnector::always(Err(ConnectionFailure::Handshake("refused".into()))),
        fast_config(3),
    ));
    let result = transport.spawn().await.unwrap();
    assert!(matches!(result, Err(ConnectionFailure::Handshake(_))));
    assert_eq!(transport.connects(), 3);
    assert!(transport.stop_reason().is_some());
}

#[tokio::test]
async fn without_restart_first_failure_ends_run() {
    let mut config = fast_config(10);
    config.reconnect.restart = false;
    let transport = Arc::new(WsTransport::with_connector(
        "ws://node",
        ScriptedConnector::always(Err(ConnectionFailure::Handshake("refused".into()))),
        config,
    ));
    assert!(transport.spawn().await.unwrap().is_err());
    assert_eq!(transport.connects(), 1);
}

#[tokio::test]
async fn close_leaves_queued_requests_pending() {
    let transport = Arc::new(WsTransport::with_connector(
        "ws://node",
        ScriptedConnector::new(vec![]),
        fast_config(10),
    ));
    transport.close().await;
    let handle = transport.spawn();
    assert!(handle.await.unwrap().is_ok());

    let queued = transport.enqueue(request("eth_syncing")).unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(queued.try_get().is_none());
    assert_eq!(transport.queued(), 1);
}

/// Test-only access to the scripted connector's bookkeeping.
trait ScriptedExt {
    fn connector_sent(&self) -> Vec<JsonRpcRequest>;
    fn connects(&self) -> usize;
}

impl ScriptedExt for WsTransport<ScriptedConnector> {
    fn connector_sent(&self) -> Vec<JsonRpcRequest> {
        self.connector().sent.lock().unwrap().clone()
    }

    fn connects(&self) -> usize {
        self.connector().connects.load(Ordering::SeqCst)
    }
}
