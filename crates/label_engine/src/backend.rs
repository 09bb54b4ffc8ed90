use thiserror::Error;

use crate::content::ActiveCondition;
use crate::layout::Pose;
use crate::math::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u64);

/// Opaque reference to a host-side label object.
///
/// `generation` lets hosts that recycle slots reject handles to an object that has already
/// been removed instead of silently acting on its successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LabelHandle {
    pub index: u32,
    pub generation: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("label object {0:?} no longer exists")]
    StaleHandle(LabelHandle),
    #[error("host rejected label operation: {reason}")]
    Rejected { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetSnapshot {
    pub id: ActorId,
    pub name: Option<String>,
    pub pose: Pose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerState {
    pub id: ActorId,
    pub wants_labels: bool,
}

/// Entity-management side of the host: creates, moves and shows label objects.
pub trait LabelBackend {
    /// Spawns a non-physical label object. It must start hidden for every viewer.
    fn spawn_label(&mut self, position: Vec3, text: &str) -> Result<LabelHandle, BackendError>;
    fn destroy_label(&mut self, handle: LabelHandle) -> Result<(), BackendError>;
    fn set_text(&mut self, handle: LabelHandle, text: &str) -> Result<(), BackendError>;
    fn teleport(&mut self, handle: LabelHandle, position: Vec3) -> Result<(), BackendError>;
    fn set_visible(
        &mut self,
        viewer: ActorId,
        handle: LabelHandle,
        visible: bool,
    ) -> Result<(), BackendError>;
}

/// Read side of the host simulation.
pub trait TargetSource {
    fn live_targets(&self) -> Vec<TargetSnapshot>;
    fn is_live(&self, id: ActorId) -> bool;
    fn active_conditions(&self, id: ActorId) -> Vec<ActiveCondition>;
    fn viewers(&self) -> Vec<ViewerState>;
    fn is_authorized(&self, viewer: ActorId) -> bool;
}

pub trait LabelHost: LabelBackend + TargetSource {}

impl<T: LabelBackend + TargetSource> LabelHost for T {}
