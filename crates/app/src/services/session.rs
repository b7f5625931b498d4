//! Device session — the per-robot orchestration of ingest and commands.
//!
//! A session owns the [`DeviceModel`] of one robot behind a
//! [`tokio::sync::Mutex`]. The device loop ([`DeviceSession::run`]) and the
//! hub command loop ([`DeviceSession::run_commands`]) run as separate tasks
//! sharing the session, so only one of them mutates the model at a time.

use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard, RwLock, mpsc, oneshot};

use roombridge_domain::command::{COMMAND_TOPIC, OutboundCommand, Translation};
use roombridge_domain::delta::DeltaMessage;
use roombridge_domain::discovery::encode;
use roombridge_domain::error::BridgeError;
use roombridge_domain::id::DeviceId;
use roombridge_domain::ingest::IngestReport;
use roombridge_domain::model::{CommandRoute, DeviceModel};
use roombridge_domain::time::now;

use crate::ports::{DeviceConnector, DeviceLink, HubPublisher, InboundMessage, QoS, TopologyStore};
use crate::services::supervisor::ConnectionSupervisor;
use crate::services::synchronizer::Synchronizer;

/// Topic filter subscribed on every device connection.
pub const DEVICE_FILTER: &str = "#";

/// Prefix of the device topics that carry shadow deltas.
pub const SHADOW_PREFIX: &str = "$aws";

/// Tunables of a [`DeviceSession`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Mirror every device payload under `<base>/raw/`.
    pub forward_raw: bool,
    /// Pause between `stop` and `dock` when returning a cleaning robot.
    pub dock_delay: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            forward_raw: true,
            dock_delay: Duration::from_secs(15),
        }
    }
}

/// Everything the bridge does for one robot.
pub struct DeviceSession<P, S, L> {
    device_id: DeviceId,
    model: Mutex<DeviceModel>,
    publisher: P,
    synchronizer: Synchronizer<P>,
    store: S,
    link: RwLock<Option<L>>,
    command_sink: mpsc::Sender<InboundMessage>,
    options: SessionOptions,
}

impl<P, S, L> DeviceSession<P, S, L>
where
    P: HubPublisher + Clone,
    S: TopologyStore,
    L: DeviceLink,
{
    /// Create a session. Hub commands for this device are routed to
    /// `command_sink`, which the caller drains with
    /// [`run_commands`](Self::run_commands).
    pub fn new(
        model: DeviceModel,
        publisher: P,
        store: S,
        command_sink: mpsc::Sender<InboundMessage>,
        options: SessionOptions,
    ) -> Self {
        Self {
            device_id: model.device().id.clone(),
            model: Mutex::new(model),
            synchronizer: Synchronizer::new(publisher.clone()),
            publisher,
            store,
            link: RwLock::new(None),
            command_sink,
            options,
        }
    }

    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Lock the model, for inspection.
    pub async fn model(&self) -> MutexGuard<'_, DeviceModel> {
        self.model.lock().await
    }

    /// Restore the persisted topology, subscribe every command topic and
    /// announce the entities.
    ///
    /// A snapshot that cannot be loaded is logged and the session starts
    /// with an empty topology.
    #[tracing::instrument(skip(self), fields(device_id = %self.device_id))]
    pub async fn start(&self) {
        let mut model = self.model.lock().await;
        match self.store.load(&self.device_id).await {
            Ok(Some(topology)) => {
                let created = model.restore_topology(topology);
                tracing::info!(
                    maps = model.topology().map_count(),
                    switches = created.len(),
                    "topology restored"
                );
            }
            Ok(None) => tracing::info!("no topology snapshot, starting empty"),
            Err(err) => tracing::warn!(%err, "failed to load topology snapshot, starting empty"),
        }
        for topic in model.command_topics() {
            self.subscribe_command(&topic).await;
        }
        self.synchronizer.sync(&mut model).await;
    }

    /// Drive the device connection forever: connect, pump deltas until the
    /// link drops, then back off and connect again with the same supervisor.
    ///
    /// `ready` fires once, after the first connection is subscribed.
    pub async fn run<C>(
        &self,
        mut supervisor: ConnectionSupervisor<C>,
        mut ready: Option<oneshot::Sender<()>>,
    ) where
        C: DeviceConnector<Link = L>,
    {
        loop {
            let connection = supervisor.establish().await;
            if let Err(err) = self.attach(connection.link).await {
                tracing::warn!(%err, device_id = %self.device_id, "device subscription failed");
                supervisor.backoff().await;
                continue;
            }
            if let Some(ready) = ready.take() {
                let _ = ready.send(());
            }
            self.pump_device(connection.inbound).await;
            self.detach().await;
            tracing::warn!(device_id = %self.device_id, "device connection lost");
            supervisor.backoff().await;
        }
    }

    /// Drain hub commands until every sender is gone.
    pub async fn run_commands(&self, mut commands: mpsc::Receiver<InboundMessage>) {
        while let Some(message) = commands.recv().await {
            self.handle_hub_command(message).await;
        }
    }

    /// Use `link` for outbound device commands and subscribe to the robot's
    /// topics.
    ///
    /// # Errors
    ///
    /// Returns the link's error when the subscription fails; the link is not
    /// kept in that case.
    pub async fn attach(&self, link: L) -> Result<(), BridgeError> {
        link.subscribe(DEVICE_FILTER, QoS::AtMostOnce).await?;
        *self.link.write().await = Some(link);
        Ok(())
    }

    /// Forget the current link.
    pub async fn detach(&self) {
        *self.link.write().await = None;
    }

    async fn pump_device(&self, mut inbound: mpsc::Receiver<InboundMessage>) {
        while let Some(message) = inbound.recv().await {
            self.handle_device_message(message).await;
        }
    }

    /// Process one payload received from the robot.
    #[tracing::instrument(skip(self, message), fields(device_id = %self.device_id, topic = %message.topic))]
    pub async fn handle_device_message(&self, message: InboundMessage) {
        if !message.topic.starts_with(SHADOW_PREFIX) {
            tracing::debug!("not a shadow topic, ignored");
            return;
        }
        self.ingest(&message.payload).await;

        if self.options.forward_raw {
            let topic = self.model.lock().await.scheme().raw_topic(&message.topic);
            if let Err(err) = self
                .publisher
                .publish(&topic, message.payload, QoS::ExactlyOnce, false)
                .await
            {
                tracing::warn!(%err, raw_topic = %topic, "raw forward failed");
            }
        }
    }

    async fn ingest(&self, payload: &[u8]) {
        let delta = match DeltaMessage::parse(payload) {
            Ok(delta) => delta,
            Err(err) => {
                tracing::warn!(%err, "dropping malformed delta");
                return;
            }
        };

        let mut model = self.model.lock().await;
        let report = model.apply(delta.reported());
        log_report(&report);

        for topic in &report.created_switches {
            self.subscribe_command(topic).await;
        }
        if let Err(err) = self.store.save(&self.device_id, model.topology()).await {
            tracing::warn!(%err, "failed to persist topology");
        }
        self.synchronizer.sync(&mut model).await;
    }

    /// Process one message received on a command topic of this device.
    #[tracing::instrument(skip(self, message), fields(device_id = %self.device_id, topic = %message.topic))]
    pub async fn handle_hub_command(&self, message: InboundMessage) {
        let payload = String::from_utf8_lossy(&message.payload);
        let mut model = self.model.lock().await;
        match model.route_command(&message.topic, &payload) {
            Ok(CommandRoute::Vacuum(request)) => {
                let translation = model.translate(request, now());
                drop(model);
                self.dispatch(translation).await;
            }
            Ok(CommandRoute::EntityUpdated) => {
                self.synchronizer.sync(&mut model).await;
            }
            Err(err) => {
                tracing::warn!(%err, payload = %payload, "hub command rejected");
            }
        }
    }

    async fn dispatch(&self, translation: Translation) {
        match translation {
            Translation::Immediate(command) => self.send_device(&command).await,
            Translation::StopThenDock { stop, dock } => {
                self.send_device(&stop).await;
                self.schedule_dock(dock).await;
            }
            Translation::Unsupported => {
                tracing::warn!("command not supported by the device");
            }
        }
    }

    async fn send_device(&self, command: &OutboundCommand) {
        let Some(link) = self.link.read().await.clone() else {
            tracing::warn!(command = command.command, "device not connected, command dropped");
            return;
        };
        publish_command(&link, command).await;
    }

    async fn schedule_dock(&self, dock: OutboundCommand) {
        let Some(link) = self.link.read().await.clone() else {
            tracing::warn!("device not connected, dock dropped");
            return;
        };
        let delay = self.options.dock_delay;
        tracing::info!(delay_secs = delay.as_secs(), "dock scheduled after stop");
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            publish_command(&link, &dock).await;
        });
    }

    async fn subscribe_command(&self, topic: &str) {
        if let Err(err) = self
            .publisher
            .subscribe(topic, self.command_sink.clone())
            .await
        {
            tracing::warn!(%err, topic, "command subscription failed");
        }
    }
}

async fn publish_command<L: DeviceLink>(link: &L, command: &OutboundCommand) {
    match link
        .publish(COMMAND_TOPIC, encode(command), QoS::AtMostOnce, false)
        .await
    {
        Ok(()) => tracing::info!(command = command.command, "command sent to device"),
        Err(err) => tracing::warn!(%err, command = command.command, "device command failed"),
    }
}

fn log_report(report: &IngestReport) {
    if report.topology_changed() {
        tracing::info!(
            maps_created = report.maps_created,
            regions_changed = report.regions_changed,
            switches_created = report.created_switches.len(),
            "topology updated"
        );
    }
    if let Some(map_id) = &report.orphan_map {
        tracing::warn!(%map_id, "regions reported for unknown map, ignored");
    }
    for (region_id, tag) in &report.skipped_regions {
        tracing::warn!(%region_id, %tag, "region with unknown type skipped");
    }
    if let Some(phase) = &report.unknown_phase {
        tracing::debug!(%phase, "unknown mission phase");
    }
}
