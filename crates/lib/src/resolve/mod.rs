//! Dependency closure resolution.
//!
//! This module turns a [`Graph`] into one [`ResolvedSet`] per configuration.
//! It handles:
//! - Path-state traversal of each configuration's closure
//! - Link-boundary cutting and contribution rules
//! - Memoization with one guard per configuration
//! - Parallel resolution of a whole graph on a worker pool
//!
//! Results are deterministic: resolving single-threaded or on any number
//! of workers yields identical sets.

mod link;
mod types;
mod walk;

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::graph::{ConfigId, Graph};

use link::Accumulator;

pub use types::{ResolveError, ResolveOptions, ResolvedSet};

type Slot = OnceLock<Result<Arc<ResolvedSet>, ResolveError>>;

/// Resolves configurations of one graph, computing each at most once.
///
/// Safe to share between threads: concurrent requests for the same
/// configuration wait for the first one and receive the same result.
#[derive(Debug)]
pub struct Resolver {
  graph: Arc<Graph>,
  options: ResolveOptions,
  cache: Vec<Slot>,
}

impl Resolver {
  pub fn new(graph: impl Into<Arc<Graph>>, options: ResolveOptions) -> Self {
    let graph = graph.into();
    let cache = (0..graph.len()).map(|_| OnceLock::new()).collect();
    Self { graph, options, cache }
  }

  pub fn graph(&self) -> &Graph {
    &self.graph
  }

  pub fn options(&self) -> &ResolveOptions {
    &self.options
  }

  /// Whether `id` has already been resolved (successfully or not).
  pub fn is_resolved(&self, id: ConfigId) -> bool {
    self.cache.get(id.0).is_some_and(|slot| slot.get().is_some())
  }

  /// Resolve one configuration, or return the memoized result.
  ///
  /// # Errors
  ///
  /// Returns `UnknownConfiguration` for an id outside the graph, and any
  /// error raised while resolving. Failures are memoized too.
  pub fn resolve(&self, id: ConfigId) -> Result<Arc<ResolvedSet>, ResolveError> {
    let slot = self.cache.get(id.0).ok_or(ResolveError::UnknownConfiguration(id))?;
    slot.get_or_init(|| self.compute(id).map(Arc::new)).clone()
  }

  fn compute(&self, id: ConfigId) -> Result<ResolvedSet, ResolveError> {
    let mut acc = Accumulator::new(&self.graph, id);
    for reach in walk::walk(&self.graph, id) {
      acc.apply(&reach)?;
    }
    let set = acc.finish();

    debug!(
      configuration = %self.graph.describe(id),
      dependencies = set.dependencies.len(),
      public = set.public_dependencies.len(),
      include_paths = set.include_paths.len(),
      library_files = set.library_files.len(),
      "resolved configuration"
    );
    Ok(set)
  }

  /// Resolve every configuration of the graph.
  ///
  /// Uses a worker pool of `parallelism` threads, or the calling thread when
  /// `parallelism` is 1.
  ///
  /// # Errors
  ///
  /// The first error in configuration id order aborts the pass.
  pub fn resolve_all(&self) -> Result<BTreeMap<ConfigId, Arc<ResolvedSet>>, ResolveError> {
    let ids: Vec<ConfigId> = self.graph.ids().collect();
    info!(
      configurations = ids.len(),
      parallelism = self.options.parallelism,
      "starting dependency resolution"
    );

    let results: Vec<Result<Arc<ResolvedSet>, ResolveError>> = if self.options.parallelism <= 1 {
      ids.iter().map(|&id| self.resolve(id)).collect()
    } else {
      let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(self.options.parallelism)
        .thread_name(|i| format!("linkset-resolve-{}", i))
        .build()
        .map_err(|e| ResolveError::ThreadPool(e.to_string()))?;
      pool.install(|| ids.par_iter().map(|&id| self.resolve(id)).collect())
    };

    let resolved = ids
      .into_iter()
      .zip(results)
      .map(|(id, result)| result.map(|set| (id, set)))
      .collect::<Result<BTreeMap<_, _>, _>>()?;

    info!(configurations = resolved.len(), "dependency resolution complete");
    Ok(resolved)
  }
}
