use crate::math::Vec3;

/// Squared horizontal facing length under which the facing is treated as straight up/down.
pub const DEGENERATE_FACING_EPSILON_SQ: f64 = 1e-6;
pub const FALLBACK_FORWARD: Vec3 = Vec3::new(0.0, 0.0, 1.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub eye_position: Vec3,
    pub facing: Vec3,
}

impl Pose {
    pub fn new(eye_position: Vec3, facing: Vec3) -> Self {
        Self {
            eye_position,
            facing,
        }
    }
}

/// Anchor layout for a stack of label rows.
///
/// Row 0 sits `top_up` above the eye, shifted by `offset_right`/`offset_forward` in the
/// horizontal basis of the facing direction. Every following row is `step_down` lower, so
/// adding or removing trailing rows never moves earlier ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelLayout {
    pub offset_right: f64,
    pub offset_forward: f64,
    pub top_up: f64,
    pub step_down: f64,
}

impl Default for LabelLayout {
    fn default() -> Self {
        Self {
            offset_right: 0.0,
            offset_forward: 0.0,
            top_up: 1.90,
            step_down: 0.20,
        }
    }
}

impl LabelLayout {
    pub fn anchor_position(&self, pose: &Pose, row: usize) -> Vec3 {
        self.top_anchor(pose) - Vec3::new(0.0, self.step_down * row as f64, 0.0)
    }

    pub fn top_anchor(&self, pose: &Pose) -> Vec3 {
        let forward = forward_flat(pose.facing);
        let right = right_of(forward);
        pose.eye_position
            + right * self.offset_right
            + forward * self.offset_forward
            + Vec3::new(0.0, self.top_up, 0.0)
    }
}

pub fn forward_flat(facing: Vec3) -> Vec3 {
    let flat = Vec3::new(facing.x, 0.0, facing.z);
    // NaN compares false here, so a non-finite facing also lands on the fallback.
    if !(flat.length_squared() >= DEGENERATE_FACING_EPSILON_SQ) {
        return FALLBACK_FORWARD;
    }
    flat.normalize_or(FALLBACK_FORWARD)
}

pub fn right_of(forward_flat: Vec3) -> Vec3 {
    Vec3::new(-forward_flat.z, 0.0, forward_flat.x).normalize_or(Vec3::new(-1.0, 0.0, 0.0))
}
