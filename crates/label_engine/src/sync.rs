use std::collections::HashMap;

use tracing::{debug, error, info, warn};

use crate::backend::{ActorId, BackendError, LabelBackend, LabelHandle, LabelHost, TargetSnapshot};
use crate::config::LabelConfig;
use crate::content::ContentBuilder;
use crate::layout::LabelLayout;
use crate::visibility::propagate_new_label;

/// Live label objects of one target plus the text they were last built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    lines: Vec<LabelHandle>,
    last_rendered: Vec<String>,
}

impl LabelSet {
    pub fn handles(&self) -> &[LabelHandle] {
        &self.lines
    }

    pub fn last_rendered(&self) -> &[String] {
        &self.last_rendered
    }

    pub fn row_count(&self) -> usize {
        self.lines.len()
    }

    fn is_consistent(&self) -> bool {
        self.lines.len() == self.last_rendered.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Content unchanged; existing objects were moved in place.
    Repositioned { rows: usize },
    /// Content changed; every object was destroyed and respawned.
    Rebuilt { rows: usize },
    /// The host refused a spawn mid-rebuild; the target is left with no objects and retries
    /// on its next update.
    RebuildAborted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub ensured: usize,
    pub rebuilt: usize,
    pub repositioned: usize,
    pub aborted: usize,
    pub pruned: Vec<ActorId>,
}

#[derive(Debug, Clone)]
pub struct LabelSyncEngine {
    layout: LabelLayout,
    content: ContentBuilder,
    pub(crate) sets: HashMap<ActorId, LabelSet>,
}

impl LabelSyncEngine {
    pub fn new(layout: LabelLayout, content: ContentBuilder) -> Self {
        Self {
            layout,
            content,
            sets: HashMap::new(),
        }
    }

    pub fn from_config(config: &LabelConfig) -> Self {
        Self::new(config.layout(), config.content_builder())
    }

    pub fn layout(&self) -> &LabelLayout {
        &self.layout
    }

    pub fn is_tracked(&self, id: ActorId) -> bool {
        self.sets.contains_key(&id)
    }

    pub fn label_set(&self, id: ActorId) -> Option<&LabelSet> {
        self.sets.get(&id)
    }

    pub fn tracked_count(&self) -> usize {
        self.sets.len()
    }

    pub fn tracked_ids(&self) -> Vec<ActorId> {
        let mut ids: Vec<ActorId> = self.sets.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Starts tracking `target` with a single blank row-0 object. Returns `false` when the
    /// target was already tracked.
    pub fn ensure<H: LabelHost + ?Sized>(&mut self, target: &TargetSnapshot, host: &mut H) -> bool {
        if self.sets.contains_key(&target.id) {
            return false;
        }

        let mut set = LabelSet::default();
        let position = self.layout.anchor_position(&target.pose, 0);
        match host.spawn_label(position, "") {
            Ok(handle) => {
                propagate_new_label(target.id, handle, host);
                set.lines.push(handle);
                set.last_rendered.push(String::new());
            }
            Err(error) => {
                warn!(target = target.id.0, error = %error, "label_placeholder_spawn_failed");
            }
        }
        self.sets.insert(target.id, set);
        debug!(target = target.id.0, "label_target_tracked");
        true
    }

    pub fn update<H: LabelHost + ?Sized>(
        &mut self,
        target: &TargetSnapshot,
        host: &mut H,
    ) -> UpdateOutcome {
        let conditions = host.active_conditions(target.id);
        let desired = self
            .content
            .build_lines(target.name.as_deref(), &conditions);

        let set = self.sets.entry(target.id).or_default();
        if set.last_rendered != desired {
            return self.rebuild(target, desired, host);
        }

        for (row, handle) in set.lines.iter().enumerate() {
            let position = self.layout.anchor_position(&target.pose, row);
            if let Err(error) = host.teleport(*handle, position) {
                log_backend_failure("teleport", target.id, &error);
            }
        }
        report_if_inconsistent(target.id, set);
        UpdateOutcome::Repositioned {
            rows: set.lines.len(),
        }
    }

    fn rebuild<H: LabelHost + ?Sized>(
        &mut self,
        target: &TargetSnapshot,
        desired: Vec<String>,
        host: &mut H,
    ) -> UpdateOutcome {
        let previous = self.sets.remove(&target.id).unwrap_or_default();
        release_handles(target.id, previous.lines, host);

        let mut lines = Vec::with_capacity(desired.len());
        for (row, text) in desired.iter().enumerate() {
            let position = self.layout.anchor_position(&target.pose, row);
            let handle = match host.spawn_label(position, "") {
                Ok(handle) => handle,
                Err(error) => return self.abort_rebuild(target.id, row, &error, lines, host),
            };
            lines.push(handle);
            if let Err(error) = host.set_text(handle, text) {
                return self.abort_rebuild(target.id, row, &error, lines, host);
            }
            propagate_new_label(target.id, handle, host);
        }

        let set = LabelSet {
            lines,
            last_rendered: desired,
        };
        report_if_inconsistent(target.id, &set);
        let rows = set.lines.len();
        self.sets.insert(target.id, set);
        debug!(target = target.id.0, rows, "label_set_rebuilt");
        UpdateOutcome::Rebuilt { rows }
    }

    fn abort_rebuild<H: LabelHost + ?Sized>(
        &mut self,
        target: ActorId,
        row: usize,
        error: &BackendError,
        spawned: Vec<LabelHandle>,
        host: &mut H,
    ) -> UpdateOutcome {
        warn!(target = target.0, row, error = %error, "label_rebuild_aborted");
        release_handles(target, spawned, host);
        self.sets.insert(target, LabelSet::default());
        UpdateOutcome::RebuildAborted
    }

    /// Destroys every object of `id` and forgets it. Returns `false` if it was not tracked.
    pub fn remove<B: LabelBackend + ?Sized>(&mut self, id: ActorId, backend: &mut B) -> bool {
        let Some(set) = self.sets.remove(&id) else {
            return false;
        };
        release_handles(id, set.lines, backend);
        debug!(target = id.0, "label_target_removed");
        true
    }

    pub fn shutdown_all<B: LabelBackend + ?Sized>(&mut self, backend: &mut B) -> usize {
        let ids = self.tracked_ids();
        for id in &ids {
            self.remove(*id, backend);
        }
        self.sets.clear();
        ids.len()
    }

    /// Drops state for tracked ids the host no longer reports as live.
    pub fn sweep<H: LabelHost + ?Sized>(&mut self, host: &mut H) -> Vec<ActorId> {
        let stale: Vec<ActorId> = self
            .tracked_ids()
            .into_iter()
            .filter(|id| !host.is_live(*id))
            .collect();
        for id in &stale {
            self.remove(*id, host);
        }
        if !stale.is_empty() {
            info!(pruned = stale.len(), "label_targets_swept");
        }
        stale
    }

    /// One batch pass: ensure and update every live target, then sweep.
    pub fn sync_all<H: LabelHost + ?Sized>(&mut self, host: &mut H) -> SyncReport {
        let mut report = SyncReport::default();
        for target in host.live_targets() {
            if self.ensure(&target, host) {
                report.ensured += 1;
            }
            match self.update(&target, host) {
                UpdateOutcome::Repositioned { .. } => report.repositioned += 1,
                UpdateOutcome::Rebuilt { .. } => report.rebuilt += 1,
                UpdateOutcome::RebuildAborted => report.aborted += 1,
            }
        }
        report.pruned = self.sweep(host);
        report
    }
}

fn release_handles<B: LabelBackend + ?Sized>(
    target: ActorId,
    handles: Vec<LabelHandle>,
    backend: &mut B,
) {
    for handle in handles {
        if let Err(error) = backend.destroy_label(handle) {
            log_backend_failure("destroy", target, &error);
        }
    }
}

pub(crate) fn log_backend_failure(operation: &'static str, target: ActorId, error: &BackendError) {
    match error {
        BackendError::StaleHandle(_) => {
            debug!(operation, target = target.0, error = %error, "label_handle_stale");
        }
        BackendError::Rejected { .. } => {
            warn!(operation, target = target.0, error = %error, "label_operation_rejected");
        }
    }
}

fn report_if_inconsistent(target: ActorId, set: &LabelSet) {
    if !set.is_consistent() {
        error!(
            target = target.0,
            handles = set.lines.len(),
            rendered = set.last_rendered.len(),
            "label_set_inconsistent"
        );
        debug_assert!(false, "label set row count diverged from rendered text");
    }
}
