//! Synchronizer — publishes whatever the entities flagged as dirty.

use roombridge_domain::discovery::ONLINE;
use roombridge_domain::entity::{EntityKind, HubEntity};
use roombridge_domain::model::DeviceModel;

use crate::ports::{HubPublisher, QoS};

/// Counters of one synchronization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub published: usize,
    pub failed: usize,
}

/// Pushes entity payloads to the hub.
///
/// Every hub publication is retained with QoS 0. A failed publish is logged
/// and its flag is cleared anyway; the next change sets it again.
pub struct Synchronizer<P> {
    publisher: P,
}

impl<P: HubPublisher> Synchronizer<P> {
    /// Create a synchronizer publishing through `publisher`.
    pub fn new(publisher: P) -> Self {
        Self { publisher }
    }

    /// Run one pass over every entity of `model`, vacuum first.
    ///
    /// Per entity: config, state and attributes when dirty, then the
    /// availability marker. Publishing the vacuum config marks the config of
    /// every other entity dirty, so that they pick up the new device
    /// descriptor in the same pass.
    #[tracing::instrument(skip_all, fields(device_id = %model.device().id))]
    pub async fn sync(&self, model: &mut DeviceModel) -> SyncReport {
        let mut report = SyncReport::default();
        let mut cascade = false;
        let (device, entities) = model.entities_mut();

        for mut entity in entities {
            if cascade {
                entity.core_mut().mark_config_dirty();
            }
            let dirty = entity.core().dirty();

            if dirty.config {
                let payload = entity.config_payload(device);
                self.send(&mut report, &entity.core().topics.config, payload)
                    .await;
                entity.core_mut().clear_config_dirty();
                cascade |= entity.kind() == EntityKind::Vacuum;
            }
            if dirty.state {
                let payload = entity.state_payload();
                self.send(&mut report, &entity.core().topics.state, payload)
                    .await;
                entity.core_mut().clear_state_dirty();
            }
            if dirty.attributes {
                let payload = entity.attributes_payload();
                self.send(&mut report, &entity.core().topics.attributes, payload)
                    .await;
                entity.core_mut().clear_attributes_dirty();
            }
            self.send(
                &mut report,
                &entity.core().topics.availability,
                ONLINE.as_bytes().to_vec(),
            )
            .await;
        }

        tracing::debug!(
            published = report.published,
            failed = report.failed,
            "entities synchronized"
        );
        report
    }

    async fn send(&self, report: &mut SyncReport, topic: &str, payload: Vec<u8>) {
        match self
            .publisher
            .publish(topic, payload, QoS::AtMostOnce, true)
            .await
        {
            Ok(()) => report.published += 1,
            Err(err) => {
                report.failed += 1;
                tracing::warn!(%err, topic, "hub publish failed");
            }
        }
    }
}
