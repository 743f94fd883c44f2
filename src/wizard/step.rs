//! Step identifiers and descriptors.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ordered step key.
///
/// Whole numbers are top-level steps; decimals are sub-steps (27.1 sits between
/// 27 and 28). Comparison is numeric, so `1` and `1.0` are the same step, but
/// the declared scale is kept for display (`1.0` renders as `1.0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(Decimal);

impl StepId {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// A top-level step.
    pub fn whole(n: u32) -> Self {
        Self(Decimal::from(n))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Whether this id has a fractional part.
    pub fn is_sub_step(&self) -> bool {
        !self.0.fract().is_zero()
    }

    /// The top-level step this id belongs to (27.2 → 27).
    pub fn major(&self) -> StepId {
        Self(self.0.trunc())
    }
}

impl From<u32> for StepId {
    fn from(n: u32) -> Self {
        Self::whole(n)
    }
}

impl From<Decimal> for StepId {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StepId {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Empty step id".to_string());
        }
        Decimal::from_str(trimmed)
            .map(Self)
            .map_err(|e| format!("Invalid step id {trimmed:?}: {e}"))
    }
}

/// One step of a flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDescriptor {
    pub id: StepId,
    /// Short name shown in the step indicator.
    pub label: String,
    /// Heading shown above the step content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl StepDescriptor {
    pub fn new(id: impl Into<StepId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}
