//! Types for dependency resolution.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::FALLBACK_PARALLELISM;
use crate::graph::ConfigId;
use crate::ordered::{OrderConflict, OrderedSet};

/// Errors that abort a resolution pass.
///
/// `Clone` so a memoized failure can be handed to every caller that asks
/// for the same configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
  /// The id does not belong to the resolver's graph.
  #[error("unknown configuration {0}")]
  UnknownConfiguration(ConfigId),

  /// A configuration compiles or links against an executable.
  #[error("{dependent} cannot depend on executable {dependency} except for build ordering")]
  InvalidExecutableDependency { dependent: String, dependency: String },

  /// Two dependencies requested different link positions for the same library.
  #[error("while resolving {configuration}: {source}")]
  OrderConflict {
    configuration: String,
    #[source]
    source: OrderConflict,
  },

  /// The worker pool could not be started.
  #[error("failed to start resolver thread pool: {0}")]
  ThreadPool(String),
}

/// Resolver settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
  /// Worker threads used by [`Resolver::resolve_all`](super::Resolver::resolve_all).
  /// `1` resolves on the calling thread.
  pub parallelism: usize,
}

impl Default for ResolveOptions {
  fn default() -> Self {
    Self {
      parallelism: num_cpus(),
    }
  }
}

impl ResolveOptions {
  /// Deterministic, caller-thread resolution.
  pub fn single_threaded() -> Self {
    Self { parallelism: 1 }
  }

  pub fn with_parallelism(parallelism: usize) -> Self {
    Self {
      parallelism: parallelism.max(1),
    }
  }
}

fn num_cpus() -> usize {
  std::thread::available_parallelism()
    .map(|p| p.get())
    .unwrap_or(FALLBACK_PARALLELISM)
}

/// Everything one configuration inherits from its dependency closure.
///
/// Dependency lists are sorted by link order, then project name, then
/// target. Path and file collections keep discovery order, adjusted by
/// explicit order keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedSet {
  /// Every reachable configuration: public ones first, then private ones.
  pub dependencies: Vec<ConfigId>,
  /// Reachable through at least one path of public edges only.
  pub public_dependencies: Vec<ConfigId>,
  /// Reachable, but only through paths containing a private edge.
  pub private_dependencies: Vec<ConfigId>,
  /// Must be built first, but contributes no headers or libraries.
  pub build_order_only: Vec<ConfigId>,

  pub include_paths: OrderedSet<String>,
  pub defines: OrderedSet<String>,
  pub library_paths: OrderedSet<String>,
  pub library_files: OrderedSet<String>,
  pub copy_files: OrderedSet<String>,
}

impl ResolvedSet {
  /// Whether nothing at all was inherited.
  pub fn is_empty(&self) -> bool {
    self.dependencies.is_empty()
      && self.include_paths.is_empty()
      && self.defines.is_empty()
      && self.library_paths.is_empty()
      && self.library_files.is_empty()
      && self.copy_files.is_empty()
  }
}
