mod backend;
mod config;
mod content;
mod layout;
mod math;
mod names;
mod service;
mod sync;
mod visibility;

#[cfg(test)]
mod test_support;

pub use backend::{
    ActorId, BackendError, LabelBackend, LabelHandle, LabelHost, TargetSnapshot, TargetSource,
    ViewerState,
};
pub use config::{ConfigError, LabelConfig, Language, DEFAULT_MOVE_THRESHOLD_SQ, DEFAULT_TICKS_PER_SECOND};
pub use content::{
    format_remaining, roman_numeral, ActiveCondition, ConditionDuration, ConditionKind,
    ContentBuilder, UNBOUNDED_DURATION_TEXT,
};
pub use layout::{
    forward_flat, right_of, LabelLayout, Pose, DEGENERATE_FACING_EPSILON_SQ, FALLBACK_FORWARD,
};
pub use math::Vec3;
pub use names::{condition_display_name, no_effects_placeholder};
pub use service::LabelService;
pub use sync::{LabelSet, LabelSyncEngine, SyncReport, UpdateOutcome};
pub use visibility::{label_visible, propagate_new_label};
