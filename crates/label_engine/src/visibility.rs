use tracing::debug;

use crate::backend::{ActorId, LabelHandle, LabelHost};
use crate::sync::{log_backend_failure, LabelSyncEngine};

/// Whether `viewer` may see the labels of `target`. A target never sees its own labels.
pub fn label_visible(
    viewer: ActorId,
    target: ActorId,
    viewer_authorized: bool,
    viewer_wants_show: bool,
) -> bool {
    viewer != target && viewer_authorized && viewer_wants_show
}

/// Brings a freshly spawned object of `target` in line with every known viewer.
pub fn propagate_new_label<H: LabelHost + ?Sized>(target: ActorId, handle: LabelHandle, host: &mut H) {
    for viewer in host.viewers() {
        let visible = label_visible(
            viewer.id,
            target,
            host.is_authorized(viewer.id),
            viewer.wants_labels,
        );
        if let Err(error) = host.set_visible(viewer.id, handle, visible) {
            log_backend_failure("set_visible", target, &error);
        }
    }
}

impl LabelSyncEngine {
    /// Re-evaluates every tracked object for one viewer. Returns how many objects ended up
    /// shown to that viewer.
    pub fn apply_visibility<H: LabelHost + ?Sized>(
        &self,
        viewer: ActorId,
        wants_show: bool,
        host: &mut H,
    ) -> usize {
        let authorized = host.is_authorized(viewer);
        let mut shown = 0;
        for target in self.tracked_ids() {
            let Some(set) = self.sets.get(&target) else {
                continue;
            };
            let visible = label_visible(viewer, target, authorized, wants_show);
            for handle in set.handles() {
                match host.set_visible(viewer, *handle, visible) {
                    Ok(()) if visible => shown += 1,
                    Ok(()) => {}
                    Err(error) => log_backend_failure("set_visible", target, &error),
                }
            }
        }
        debug!(viewer = viewer.0, wants_show, authorized, shown, "label_visibility_applied");
        shown
    }
}
