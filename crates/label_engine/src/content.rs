use std::borrow::Cow;

use crate::config::{Language, DEFAULT_TICKS_PER_SECOND};
use crate::names::{condition_display_name, no_effects_placeholder};

static ROMAN_NUMERALS: [&str; 11] = ["", "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X"];
pub const UNBOUNDED_DURATION_TEXT: &str = "∞";

/// Raw condition identifier as reported by the host, e.g. `SPEED`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConditionKind(pub String);

impl ConditionKind {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionDuration {
    Ticks(i64),
    Unbounded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveCondition {
    pub kind: ConditionKind,
    /// Display level, 1 for the weakest tier.
    pub intensity: u32,
    pub remaining: ConditionDuration,
}

impl ActiveCondition {
    pub fn new(kind: impl Into<String>, intensity: u32, remaining: ConditionDuration) -> Self {
        Self {
            kind: ConditionKind::new(kind),
            intensity,
            remaining,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentBuilder {
    pub show_name: bool,
    pub language: Language,
    pub ticks_per_second: u32,
}

impl Default for ContentBuilder {
    fn default() -> Self {
        Self {
            show_name: false,
            language: Language::default(),
            ticks_per_second: DEFAULT_TICKS_PER_SECOND,
        }
    }
}

impl ContentBuilder {
    /// Desired label text for a target, top row first.
    pub fn build_lines(&self, name: Option<&str>, conditions: &[ActiveCondition]) -> Vec<String> {
        let mut lines = Vec::with_capacity(conditions.len().max(1) + 1);
        if self.show_name {
            if let Some(name) = name {
                lines.push(name.to_string());
            }
        }

        if conditions.is_empty() {
            lines.push(no_effects_placeholder(self.language).to_string());
            return lines;
        }

        for condition in conditions {
            lines.push(self.condition_line(condition));
        }
        lines
    }

    pub fn condition_line(&self, condition: &ActiveCondition) -> String {
        let raw = condition.kind.as_str();
        let name = condition_display_name(self.language, raw).unwrap_or(raw);
        let remaining = match condition.remaining {
            ConditionDuration::Ticks(ticks) => format_remaining(ticks, self.ticks_per_second),
            ConditionDuration::Unbounded => UNBOUNDED_DURATION_TEXT.to_string(),
        };
        format!("{name} {} {remaining}", roman_numeral(condition.intensity))
    }
}

pub fn roman_numeral(level: u32) -> Cow<'static, str> {
    match ROMAN_NUMERALS.get(level as usize) {
        Some(numeral) if level > 0 => Cow::Borrowed(*numeral),
        _ => Cow::Owned(level.to_string()),
    }
}

/// `m:ss` for a tick count, floored to whole seconds and clamped at zero.
pub fn format_remaining(ticks: i64, ticks_per_second: u32) -> String {
    let seconds = (ticks / i64::from(ticks_per_second.max(1))).max(0);
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
