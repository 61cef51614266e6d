//! Path-state traversal of a configuration's dependency closure.
//!
//! Instead of enumerating paths, the walk carries a small [`PathState`]
//! along each edge and visits every (configuration, state) pair once.
//! Two paths reaching the same configuration with the same state are
//! interchangeable, so this yields exactly the distinct ways a
//! configuration is reached, in bounded time even on a cyclic graph.

use std::collections::HashSet;

use tracing::trace;

use crate::graph::{ConfigId, DependencyEdge, Graph, OutputKind, PropagationFlags};

/// What is known about one path from the root to a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PathState {
  /// Flags set on every edge of the path.
  pub flags: PropagationFlags,
  /// The path is a single edge declared by the root.
  pub immediate: bool,
  /// Every edge of the path is public.
  pub public_to_root: bool,
  /// Every edge after the first one is public.
  pub public_to_immediate: bool,
  /// The path passes through a configuration that performs its own link step.
  pub through_link_boundary: bool,
}

impl PathState {
  /// State of a root's own edge.
  pub fn immediate(edge: &DependencyEdge) -> Self {
    let public = edge.visibility.is_public();
    Self {
      flags: edge.flags,
      immediate: true,
      public_to_root: public,
      public_to_immediate: public,
      through_link_boundary: false,
    }
  }

  /// State after following `edge` out of a configuration of kind `via`.
  pub fn extend(self, via: OutputKind, edge: &DependencyEdge) -> Self {
    let public = edge.visibility.is_public();
    Self {
      flags: self.flags & edge.flags,
      immediate: false,
      public_to_root: self.public_to_root && public,
      public_to_immediate: (self.immediate || self.public_to_immediate) && public,
      through_link_boundary: self.through_link_boundary || via.is_link_boundary(),
    }
  }

  /// Whether the reached configuration's headers are visible to the root.
  pub fn exposes_includes(&self) -> bool {
    self.flags.include && (self.immediate || self.public_to_immediate)
  }
}

/// One distinct way a configuration is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Reach {
  pub node: ConfigId,
  pub state: PathState,
}

/// Every distinct (configuration, state) reachable from `root`.
///
/// Depth-first, following dependencies in declaration order. The root
/// itself is never reported.
pub(crate) fn walk(graph: &Graph, root: ConfigId) -> Vec<Reach> {
  let mut visited: HashSet<(ConfigId, PathState)> = HashSet::new();
  let mut reached = Vec::new();

  let mut stack: Vec<Reach> = graph
    .dependencies(root)
    .iter()
    .rev()
    .map(|(node, edge)| Reach {
      node: *node,
      state: PathState::immediate(edge),
    })
    .collect();

  while let Some(reach) = stack.pop() {
    if reach.node == root || !visited.insert((reach.node, reach.state)) {
      continue;
    }
    reached.push(reach);

    let via = graph[reach.node].output;
    for (next, edge) in graph.dependencies(reach.node).iter().rev() {
      stack.push(Reach {
        node: *next,
        state: reach.state.extend(via, edge),
      });
    }
  }

  trace!(root = %root, states = reached.len(), "walked dependency closure");
  reached
}
