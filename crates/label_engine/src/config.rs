use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::ContentBuilder;
use crate::layout::LabelLayout;

pub const DEFAULT_TICKS_PER_SECOND: u32 = 20;
pub const DEFAULT_MOVE_THRESHOLD_SQ: f64 = 1.0e-6;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ja,
    En,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LabelConfig {
    pub offset_right: f64,
    pub offset_forward: f64,
    pub top_up: f64,
    pub step_down: f64,
    pub show_name: bool,
    pub language: Language,
    pub ticks_per_second: u32,
    pub update_ticks: u32,
    pub update_on_move: bool,
    pub move_threshold_sq: f64,
}

impl Default for LabelConfig {
    fn default() -> Self {
        let layout = LabelLayout::default();
        Self {
            offset_right: layout.offset_right,
            offset_forward: layout.offset_forward,
            top_up: layout.top_up,
            step_down: layout.step_down,
            show_name: false,
            language: Language::default(),
            ticks_per_second: DEFAULT_TICKS_PER_SECOND,
            update_ticks: 1,
            update_on_move: true,
            move_threshold_sq: DEFAULT_MOVE_THRESHOLD_SQ,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("ticks_per_second must be at least 1")]
    ZeroTicksPerSecond,
}

impl LabelConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let numeric = [
            ("offset_right", self.offset_right),
            ("offset_forward", self.offset_forward),
            ("top_up", self.top_up),
            ("step_down", self.step_down),
            ("move_threshold_sq", self.move_threshold_sq),
        ];
        for (field, value) in numeric {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }
        if self.ticks_per_second == 0 {
            return Err(ConfigError::ZeroTicksPerSecond);
        }
        Ok(())
    }

    pub fn layout(&self) -> LabelLayout {
        LabelLayout {
            offset_right: self.offset_right,
            offset_forward: self.offset_forward,
            top_up: self.top_up,
            step_down: self.step_down,
        }
    }

    pub fn content_builder(&self) -> ContentBuilder {
        ContentBuilder {
            show_name: self.show_name,
            language: self.language,
            ticks_per_second: self.ticks_per_second.max(1),
        }
    }

    /// Update cadence in ticks; never below 1.
    pub fn effective_update_ticks(&self) -> u32 {
        self.update_ticks.max(1)
    }
}
