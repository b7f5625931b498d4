//! In-memory port implementations shared by the service tests.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use roombridge_domain::error::BridgeError;
use roombridge_domain::id::DeviceId;
use roombridge_domain::topology::TopologyRegistry;

use crate::ports::{
    Connection, DeviceConnector, DeviceLink, HubPublisher, InboundMessage, QoS, TopologyStore,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

impl Published {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

fn failure(reason: &str) -> BridgeError {
    BridgeError::Transport(reason.to_string().into())
}

#[derive(Clone, Default)]
pub struct RecordingPublisher {
    published: Arc<Mutex<Vec<Published>>>,
    subscriptions: Arc<Mutex<HashMap<String, mpsc::Sender<InboundMessage>>>>,
    failing: Arc<Mutex<bool>>,
}

impl RecordingPublisher {
    pub fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }

    pub fn on_topic(&self, topic: &str) -> Vec<Published> {
        self.published()
            .into_iter()
            .filter(|p| p.topic == topic)
            .collect()
    }

    pub fn clear(&self) {
        self.published.lock().unwrap().clear();
    }

    pub fn fail_publishes(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn subscribed(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.subscriptions.lock().unwrap().keys().cloned().collect();
        topics.sort();
        topics
    }
}

impl HubPublisher for RecordingPublisher {
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: QoS,
        retain: bool,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        let result = if *self.failing.lock().unwrap() {
            Err(failure("hub unreachable"))
        } else {
            self.published.lock().unwrap().push(Published {
                topic: topic.to_string(),
                payload,
                qos,
                retain,
            });
            Ok(())
        };
        async { result }
    }

    fn subscribe(
        &self,
        topic: &str,
        sink: mpsc::Sender<InboundMessage>,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        self.subscriptions
            .lock()
            .unwrap()
            .insert(topic.to_string(), sink);
        async { Ok(()) }
    }
}

#[derive(Clone, Default)]
pub struct RecordingLink {
    published: Arc<Mutex<Vec<Published>>>,
    filters: Arc<Mutex<Vec<String>>>,
    rejecting: Arc<Mutex<bool>>,
}

impl RecordingLink {
    /// A link whose broker refuses every subscription.
    pub fn rejecting_subscriptions() -> Self {
        let link = Self::default();
        *link.rejecting.lock().unwrap() = true;
        link
    }

    pub fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }

    pub fn filters(&self) -> Vec<String> {
        self.filters.lock().unwrap().clone()
    }
}

impl DeviceLink for RecordingLink {
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: QoS,
        retain: bool,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        self.published.lock().unwrap().push(Published {
            topic: topic.to_string(),
            payload,
            qos,
            retain,
        });
        async { Ok(()) }
    }

    fn subscribe(
        &self,
        filter: &str,
        _qos: QoS,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        let result = if *self.rejecting.lock().unwrap() {
            Err(failure("subscription refused"))
        } else {
            self.filters.lock().unwrap().push(filter.to_string());
            Ok(())
        };
        async { result }
    }
}

/// Connector that fails a scripted number of times before handing out
/// connections backed by a [`RecordingLink`].
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    failures: Arc<Mutex<usize>>,
    attempts: Arc<Mutex<usize>>,
    link: RecordingLink,
    senders: Arc<Mutex<VecDeque<mpsc::Sender<InboundMessage>>>>,
}

impl ScriptedConnector {
    pub fn failing(times: usize) -> Self {
        let connector = Self::default();
        *connector.failures.lock().unwrap() = times;
        connector
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }

    /// Connector handing out `link` on every successful attempt.
    pub fn with_link(link: RecordingLink) -> Self {
        Self {
            link,
            ..Self::default()
        }
    }

    /// Sender feeding the oldest still-open connection.
    pub fn take_sender(&self) -> Option<mpsc::Sender<InboundMessage>> {
        self.senders.lock().unwrap().pop_front()
    }
}

impl DeviceConnector for ScriptedConnector {
    type Link = RecordingLink;

    fn connect(
        &self,
    ) -> impl Future<Output = Result<Connection<Self::Link>, BridgeError>> + Send {
        *self.attempts.lock().unwrap() += 1;
        let mut failures = self.failures.lock().unwrap();
        let result = if *failures > 0 {
            *failures -= 1;
            Err(failure("connection refused"))
        } else {
            let (tx, rx) = mpsc::channel(16);
            self.senders.lock().unwrap().push_back(tx);
            Ok(Connection {
                link: self.link.clone(),
                inbound: rx,
            })
        };
        async { result }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    snapshots: Arc<Mutex<HashMap<DeviceId, TopologyRegistry>>>,
    saves: Arc<Mutex<usize>>,
    failing_saves: Arc<Mutex<usize>>,
}

impl InMemoryStore {
    pub fn with(device_id: &DeviceId, topology: TopologyRegistry) -> Self {
        let store = Self::default();
        store
            .snapshots
            .lock()
            .unwrap()
            .insert(device_id.clone(), topology);
        store
    }

    pub fn get(&self, device_id: &DeviceId) -> Option<TopologyRegistry> {
        self.snapshots.lock().unwrap().get(device_id).cloned()
    }

    /// Save attempts, failed ones included.
    pub fn saves(&self) -> usize {
        *self.saves.lock().unwrap()
    }

    /// Make the next `times` saves fail.
    pub fn fail_next_saves(&self, times: usize) {
        *self.failing_saves.lock().unwrap() = times;
    }
}

impl TopologyStore for InMemoryStore {
    fn load(
        &self,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<Option<TopologyRegistry>, BridgeError>> + Send {
        let result = self.get(device_id);
        async { Ok(result) }
    }

    fn save(
        &self,
        device_id: &DeviceId,
        topology: &TopologyRegistry,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        *self.saves.lock().unwrap() += 1;
        let mut failing = self.failing_saves.lock().unwrap();
        let result = if *failing > 0 {
            *failing -= 1;
            Err(BridgeError::Storage("disk full".to_string().into()))
        } else {
            self.snapshots
                .lock()
                .unwrap()
                .insert(device_id.clone(), topology.clone());
            Ok(())
        };
        async { result }
    }
}
