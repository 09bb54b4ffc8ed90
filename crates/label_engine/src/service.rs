use tracing::info;

use crate::backend::{ActorId, LabelHost, TargetSnapshot, TargetSource};
use crate::config::{ConfigError, LabelConfig};
use crate::math::Vec3;
use crate::sync::{LabelSyncEngine, SyncReport, UpdateOutcome};

/// Event-facing wrapper the host calls from its join/leave/tick/move hooks.
#[derive(Debug, Clone)]
pub struct LabelService {
    engine: LabelSyncEngine,
    config: LabelConfig,
    tick: u64,
}

impl LabelService {
    pub fn new(config: LabelConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            engine: LabelSyncEngine::from_config(&config),
            config,
            tick: 0,
        })
    }

    pub fn engine(&self) -> &LabelSyncEngine {
        &self.engine
    }

    pub fn config(&self) -> &LabelConfig {
        &self.config
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Tracks every actor already present and settles visibility for each viewer.
    pub fn startup<H: LabelHost + ?Sized>(&mut self, host: &mut H) {
        for target in host.live_targets() {
            self.engine.ensure(&target, host);
        }
        for viewer in host.viewers() {
            self.engine
                .apply_visibility(viewer.id, viewer.wants_labels, host);
        }
        info!(
            tracked = self.engine.tracked_count(),
            update_ticks = self.config.effective_update_ticks(),
            update_on_move = self.config.update_on_move,
            "label_service_started"
        );
    }

    pub fn on_target_join<H: LabelHost + ?Sized>(&mut self, target: &TargetSnapshot, host: &mut H) {
        self.engine.ensure(target, host);
        let wants_show = viewer_wants_labels(&*host, target.id);
        self.engine.apply_visibility(target.id, wants_show, host);
    }

    pub fn on_target_leave<H: LabelHost + ?Sized>(&mut self, id: ActorId, host: &mut H) -> bool {
        self.engine.remove(id, host)
    }

    /// Runs a batch sync every `update_ticks` ticks; returns `None` on the ticks in between.
    pub fn on_tick<H: LabelHost + ?Sized>(&mut self, host: &mut H) -> Option<SyncReport> {
        self.tick = self.tick.saturating_add(1);
        if self.tick % u64::from(self.config.effective_update_ticks()) != 0 {
            return None;
        }
        Some(self.engine.sync_all(host))
    }

    pub fn on_target_moved<H: LabelHost + ?Sized>(
        &mut self,
        target: &TargetSnapshot,
        from: Vec3,
        to: Vec3,
        host: &mut H,
    ) -> Option<UpdateOutcome> {
        if !self.config.update_on_move {
            return None;
        }
        if from.distance_squared(to) < self.config.move_threshold_sq {
            return None;
        }
        Some(self.engine.update(target, host))
    }

    pub fn on_viewer_preference_changed<H: LabelHost + ?Sized>(
        &mut self,
        viewer: ActorId,
        wants_show: bool,
        host: &mut H,
    ) -> usize {
        self.engine.apply_visibility(viewer, wants_show, host)
    }

    pub fn shutdown<H: LabelHost + ?Sized>(&mut self, host: &mut H) -> usize {
        let removed = self.engine.shutdown_all(host);
        info!(removed, "label_service_stopped");
        removed
    }
}

fn viewer_wants_labels<S: TargetSource + ?Sized>(source: &S, id: ActorId) -> bool {
    source
        .viewers()
        .iter()
        .find(|viewer| viewer.id == id)
        .is_some_and(|viewer| viewer.wants_labels)
}
