//! Non-fatal findings collected while a graph is assembled.
//!
//! Fatal problems are returned as errors by the module that detects them.
//! Everything recorded here is a warning: it is logged, counted, and
//! resolution carries on.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::warn;

/// What kind of warning was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
  /// The same edge was declared twice with identical settings.
  RedundantEdge,
  /// The same edge was declared twice with different settings.
  ConflictingEdge,
  /// A configuration declared a dependency on itself; the edge was dropped.
  SelfEdge,
}

impl fmt::Display for WarningKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      WarningKind::RedundantEdge => "redundant-edge",
      WarningKind::ConflictingEdge => "conflicting-edge",
      WarningKind::SelfEdge => "self-edge",
    };
    f.write_str(name)
  }
}

/// A single recorded warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
  pub kind: WarningKind,
  pub message: String,
}

impl fmt::Display for Warning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "warning[{}]: {}", self.kind, self.message)
  }
}

/// Ordered log of warnings with per-kind counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
  warnings: Vec<Warning>,
}

impl Diagnostics {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a warning and emit it through `tracing`.
  pub fn warn(&mut self, kind: WarningKind, message: impl Into<String>) {
    let message = message.into();
    warn!(%kind, "{}", message);
    self.warnings.push(Warning { kind, message });
  }

  /// All warnings, in the order they were recorded.
  pub fn warnings(&self) -> &[Warning] {
    &self.warnings
  }

  /// Number of warnings of one kind.
  pub fn count(&self, kind: WarningKind) -> usize {
    self.warnings.iter().filter(|w| w.kind == kind).count()
  }

  /// Warning counts keyed by kind.
  pub fn counts(&self) -> BTreeMap<WarningKind, usize> {
    let mut counts = BTreeMap::new();
    for warning in &self.warnings {
      *counts.entry(warning.kind).or_insert(0) += 1;
    }
    counts
  }

  pub fn len(&self) -> usize {
    self.warnings.len()
  }

  pub fn is_empty(&self) -> bool {
    self.warnings.is_empty()
  }

  /// Append the warnings of another collection.
  pub fn merge(&mut self, other: Diagnostics) {
    self.warnings.extend(other.warnings);
  }
}
