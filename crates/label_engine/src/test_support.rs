use std::collections::{BTreeSet, HashMap, HashSet};

use crate::backend::{
    ActorId, BackendError, LabelBackend, LabelHandle, TargetSnapshot, TargetSource, ViewerState,
};
use crate::content::ActiveCondition;
use crate::layout::Pose;
use crate::math::Vec3;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FakeLabel {
    pub position: Vec3,
    pub text: String,
    pub visible_to: BTreeSet<ActorId>,
}

/// In-memory host that records every label operation.
#[derive(Debug, Default)]
pub(crate) struct FakeHost {
    pub labels: HashMap<LabelHandle, FakeLabel>,
    pub targets: Vec<TargetSnapshot>,
    pub conditions: HashMap<ActorId, Vec<ActiveCondition>>,
    pub viewers: Vec<ViewerState>,
    pub authorized: HashSet<ActorId>,
    pub destroyed: Vec<LabelHandle>,
    pub spawn_count: usize,
    pub teleport_count: usize,
    /// Spawns allowed before every further spawn is rejected.
    pub spawn_budget: Option<usize>,
    /// When set, every `set_text` call is rejected.
    pub reject_set_text: bool,
    next_index: u32,
}

impl FakeHost {
    pub fn add_actor(&mut self, id: u64, eye_position: Vec3) -> TargetSnapshot {
        let target = TargetSnapshot {
            id: ActorId(id),
            name: Some(format!("actor{id}")),
            pose: Pose::new(eye_position, Vec3::new(0.0, 0.0, 1.0)),
        };
        self.targets.push(target.clone());
        self.viewers.push(ViewerState {
            id: ActorId(id),
            wants_labels: false,
        });
        target
    }

    pub fn target(&self, id: u64) -> TargetSnapshot {
        self.targets
            .iter()
            .find(|target| target.id == ActorId(id))
            .cloned()
            .expect("target exists")
    }

    pub fn move_actor(&mut self, id: u64, eye_position: Vec3) -> TargetSnapshot {
        let target = self
            .targets
            .iter_mut()
            .find(|target| target.id == ActorId(id))
            .expect("target exists");
        target.pose.eye_position = eye_position;
        target.clone()
    }

    pub fn set_conditions(&mut self, id: u64, conditions: Vec<ActiveCondition>) {
        self.conditions.insert(ActorId(id), conditions);
    }

    pub fn opt_in(&mut self, id: u64) {
        self.authorized.insert(ActorId(id));
        for viewer in &mut self.viewers {
            if viewer.id == ActorId(id) {
                viewer.wants_labels = true;
            }
        }
    }

    pub fn disconnect(&mut self, id: u64) {
        self.targets.retain(|target| target.id != ActorId(id));
        self.viewers.retain(|viewer| viewer.id != ActorId(id));
    }

    /// Removes an object behind the engine's back, as a host cleanup would.
    pub fn forget_label(&mut self, handle: LabelHandle) {
        self.labels.remove(&handle);
    }

    pub fn text_of(&self, handle: LabelHandle) -> Option<&str> {
        self.labels.get(&handle).map(|label| label.text.as_str())
    }

    pub fn is_visible_to(&self, handle: LabelHandle, viewer: u64) -> bool {
        self.labels
            .get(&handle)
            .is_some_and(|label| label.visible_to.contains(&ActorId(viewer)))
    }

    fn label_mut(&mut self, handle: LabelHandle) -> Result<&mut FakeLabel, BackendError> {
        self.labels
            .get_mut(&handle)
            .ok_or(BackendError::StaleHandle(handle))
    }
}

impl LabelBackend for FakeHost {
    fn spawn_label(&mut self, position: Vec3, text: &str) -> Result<LabelHandle, BackendError> {
        if let Some(budget) = self.spawn_budget.as_mut() {
            if *budget == 0 {
                return Err(BackendError::Rejected {
                    reason: "spawn budget exhausted".to_string(),
                });
            }
            *budget -= 1;
        }
        let handle = LabelHandle {
            index: self.next_index,
            generation: 0,
        };
        self.next_index += 1;
        self.spawn_count += 1;
        self.labels.insert(
            handle,
            FakeLabel {
                position,
                text: text.to_string(),
                visible_to: BTreeSet::new(),
            },
        );
        Ok(handle)
    }

    fn destroy_label(&mut self, handle: LabelHandle) -> Result<(), BackendError> {
        self.labels
            .remove(&handle)
            .ok_or(BackendError::StaleHandle(handle))?;
        self.destroyed.push(handle);
        Ok(())
    }

    fn set_text(&mut self, handle: LabelHandle, text: &str) -> Result<(), BackendError> {
        if self.reject_set_text {
            return Err(BackendError::Rejected {
                reason: "text updates disabled".to_string(),
            });
        }
        self.label_mut(handle)?.text = text.to_string();
        Ok(())
    }

    fn teleport(&mut self, handle: LabelHandle, position: Vec3) -> Result<(), BackendError> {
        self.label_mut(handle)?.position = position;
        self.teleport_count += 1;
        Ok(())
    }

    fn set_visible(
        &mut self,
        viewer: ActorId,
        handle: LabelHandle,
        visible: bool,
    ) -> Result<(), BackendError> {
        let label = self.label_mut(handle)?;
        if visible {
            label.visible_to.insert(viewer);
        } else {
            label.visible_to.remove(&viewer);
        }
        Ok(())
    }
}

impl TargetSource for FakeHost {
    fn live_targets(&self) -> Vec<TargetSnapshot> {
        self.targets.clone()
    }

    fn is_live(&self, id: ActorId) -> bool {
        self.targets.iter().any(|target| target.id == id)
    }

    fn active_conditions(&self, id: ActorId) -> Vec<ActiveCondition> {
        self.conditions.get(&id).cloned().unwrap_or_default()
    }

    fn viewers(&self) -> Vec<ViewerState> {
        self.viewers.clone()
    }

    fn is_authorized(&self, viewer: ActorId) -> bool {
        self.authorized.contains(&viewer)
    }
}
