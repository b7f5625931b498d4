//! # roombridged
//!
//! Composition root: the only crate that knows about every adapter.
//!
//! ## Responsibilities
//! - Load configuration (file + env overrides)
//! - Initialise tracing
//! - Connect to the hub broker
//! - Build one [`DeviceSession`] per configured robot and run its device
//!   and command loops
//! - Wait for every robot to connect once, then idle until a shutdown
//!   signal

mod config;

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use roombridge_adapter_mqtt::{HubClient, RoombaConnector, RoombaLink};
use roombridge_adapter_storage_json::JsonTopologyStore;
use roombridge_app::services::{BackoffLadder, ConnectionSupervisor, DeviceSession};
use roombridge_domain::device::DeviceInfo;
use roombridge_domain::id::DeviceId;
use roombridge_domain::model::DeviceModel;

use crate::config::Config;

/// Hub commands buffered per device.
const COMMAND_QUEUE: usize = 32;

type Session = DeviceSession<HubClient, JsonTopologyStore, RoombaLink>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.logging.filter);

    tracing::info!(
        broker = %config.hub.broker_host,
        port = config.hub.broker_port,
        devices = config.devices.len(),
        "starting roombridged"
    );
    if config.devices.is_empty() {
        tracing::warn!("no device configured, only the hub connection will run");
    }

    let (hub, hub_task) = HubClient::connect(&config.hub)
        .await
        .context("failed to connect to the hub broker")?;
    let store = JsonTopologyStore::new(config.storage.data_dir.clone());
    let scheme = config.hub.topic_scheme();
    let options = config.session_options();

    let mut tasks = JoinSet::new();
    let mut ready = Vec::with_capacity(config.devices.len());
    for device in &config.devices {
        let info = DeviceInfo::new(DeviceId::new(device.username.as_str()), device.address.as_str())
            .with_context(|| format!("invalid device at {}", device.address))?;
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE);
        let session: Arc<Session> = Arc::new(DeviceSession::new(
            DeviceModel::new(info, scheme.clone()),
            hub.clone(),
            store.clone(),
            command_tx,
            options.clone(),
        ));
        session.start().await;

        let supervisor = ConnectionSupervisor::new(
            RoombaConnector::new(device.clone()),
            BackoffLadder::default(),
            device.address.clone(),
        );
        let (ready_tx, ready_rx) = oneshot::channel();
        ready.push(ready_rx);

        let commands = Arc::clone(&session);
        tasks.spawn(async move { commands.run_commands(command_rx).await });
        tasks.spawn(async move { session.run(supervisor, Some(ready_tx)).await });
    }

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    tokio::select! {
        () = wait_ready(ready) => {
            tracing::info!(devices = config.devices.len(), "all devices connected");
            (&mut shutdown).await;
        }
        () = &mut shutdown => {}
    }

    tracing::info!("shutting down");
    tasks.abort_all();
    hub_task.abort();
    Ok(())
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|err| {
        eprintln!("invalid log filter {filter:?}: {err}, falling back to info");
        EnvFilter::new("info")
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Resolve once every device session reported its first connection.
///
/// A session whose task ended before connecting is not waited for.
async fn wait_ready(ready: Vec<oneshot::Receiver<()>>) {
    for receiver in ready {
        let _ = receiver.await;
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received ctrl-c"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
