//! Configuration graph.
//!
//! A [`Graph`] is the immutable input of the resolver: every configuration
//! of every project, and the declared edges between them. Graphs are
//! assembled with a [`GraphBuilder`], which enforces the structural rules:
//! - one configuration per (project, target)
//! - one edge per (source, target), re-declarations handled by [`DuplicateEdgePolicy`]
//! - no self-edges (dropped with a warning)
//! - no cycles

mod types;

pub use types::{
  ConfigId, Configuration, DependencyEdge, OutputKind, ProjectId, PropagationFlags, Target, TargetSelector, Visibility,
};

use std::collections::HashMap;
use std::ops::Index;

use petgraph::Direction;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use crate::diagnostics::{Diagnostics, WarningKind};

/// Errors that make a graph unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
  /// Two configurations share a project and target.
  #[error("duplicate configuration {key}")]
  DuplicateConfiguration { key: String },

  /// An edge refers to a configuration id that was never added.
  #[error("unknown configuration {0}")]
  UnknownConfiguration(ConfigId),

  /// An edge was re-declared with different settings under [`DuplicateEdgePolicy::Error`].
  #[error("conflicting declarations of {from} -> {to}: {first} vs {second}")]
  ConflictingEdge {
    from: String,
    to: String,
    first: String,
    second: String,
  },

  /// The dependency edges form a cycle.
  #[error("dependency cycle detected: {chain}")]
  CycleDetected { chain: String },
}

/// How a re-declared edge with different settings is handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateEdgePolicy {
  /// Keep the first declaration, warn about the later one.
  #[default]
  FirstWins,
  /// Replace with the later declaration, warn about it.
  LastWins,
  /// Refuse the graph.
  Error,
}

/// Options for graph assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphOptions {
  pub duplicate_edges: DuplicateEdgePolicy,
}

/// Immutable configuration graph.
#[derive(Debug)]
pub struct Graph {
  /// Node weights are the configuration ids; node index == id.
  graph: DiGraph<ConfigId, DependencyEdge>,
  configurations: Vec<Configuration>,
  by_identity: HashMap<(ProjectId, Target), ConfigId>,
  /// Outgoing edges per configuration, in declaration order.
  outgoing: Vec<Vec<(ConfigId, DependencyEdge)>>,
}

impl Graph {
  /// Number of configurations.
  pub fn len(&self) -> usize {
    self.configurations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.configurations.is_empty()
  }

  /// Number of edges that survived assembly.
  pub fn edge_count(&self) -> usize {
    self.graph.edge_count()
  }

  /// All configuration ids in insertion order.
  pub fn ids(&self) -> impl Iterator<Item = ConfigId> + '_ {
    (0..self.configurations.len()).map(ConfigId)
  }

  /// Look up a configuration.
  pub fn get(&self, id: ConfigId) -> Option<&Configuration> {
    self.configurations.get(id.0)
  }

  /// Find the configuration of `project` built for `target`.
  pub fn find(&self, project: &ProjectId, target: &Target) -> Option<ConfigId> {
    self.by_identity.get(&(project.clone(), target.clone())).copied()
  }

  /// Human-readable identity of a configuration, or its id if unknown.
  pub fn describe(&self, id: ConfigId) -> String {
    self.get(id).map(Configuration::key).unwrap_or_else(|| id.to_string())
  }

  /// Direct dependencies of `id`, in declaration order.
  pub fn dependencies(&self, id: ConfigId) -> &[(ConfigId, DependencyEdge)] {
    self.outgoing.get(id.0).map(Vec::as_slice).unwrap_or(&[])
  }

  /// Configurations that declare a direct dependency on `id`.
  pub fn dependents(&self, id: ConfigId) -> Vec<ConfigId> {
    if id.0 >= self.configurations.len() {
      return Vec::new();
    }

    let mut dependents: Vec<ConfigId> = self
      .graph
      .neighbors_directed(NodeIndex::new(id.0), Direction::Incoming)
      .map(|idx| self.graph[idx])
      .collect();
    dependents.sort();
    dependents
  }

  /// Configurations ordered so that every dependency precedes its dependents.
  ///
  /// [`GraphBuilder::build`] rejects cycles, so the sort cannot fail on a
  /// built graph.
  pub fn build_order(&self) -> Vec<ConfigId> {
    // Edges point from dependent to dependency, so the reversed toposort is the build order.
    toposort(&self.graph, None)
      .map(|sorted| sorted.into_iter().rev().map(|idx| self.graph[idx]).collect())
      .unwrap_or_default()
  }
}

impl Index<ConfigId> for Graph {
  type Output = Configuration;

  fn index(&self, id: ConfigId) -> &Configuration {
    &self.configurations[id.0]
  }
}

/// Assembles a [`Graph`], recording warnings along the way.
#[derive(Debug, Default)]
pub struct GraphBuilder {
  options: GraphOptions,
  configurations: Vec<Configuration>,
  by_identity: HashMap<(ProjectId, Target), ConfigId>,
  /// Declared edges in declaration order. Replaced edges keep their slot.
  edges: Vec<(ConfigId, ConfigId, DependencyEdge)>,
  edge_slots: HashMap<(ConfigId, ConfigId), usize>,
  diagnostics: Diagnostics,
  next_declaration: usize,
}

impl GraphBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_options(options: GraphOptions) -> Self {
    Self {
      options,
      ..Self::default()
    }
  }

  /// Add a configuration and return its id.
  pub fn add_configuration(&mut self, configuration: Configuration) -> Result<ConfigId, GraphError> {
    let identity = (configuration.project.clone(), configuration.target.clone());
    if self.by_identity.contains_key(&identity) {
      return Err(GraphError::DuplicateConfiguration {
        key: configuration.key(),
      });
    }

    let id = ConfigId(self.configurations.len());
    trace!(id = %id, key = %configuration.key(), "added configuration");
    self.by_identity.insert(identity, id);
    self.configurations.push(configuration);
    Ok(id)
  }

  /// Find an already added configuration.
  pub fn find(&self, project: &ProjectId, target: &Target) -> Option<ConfigId> {
    self.by_identity.get(&(project.clone(), target.clone())).copied()
  }

  /// Whether any configuration of `project` has been added.
  pub fn has_project(&self, project: &ProjectId) -> bool {
    self.by_identity.keys().any(|(p, _)| p == project)
  }

  /// Human-readable identity of an added configuration, or its id if unknown.
  pub fn describe(&self, id: ConfigId) -> String {
    self
      .configurations
      .get(id.0)
      .map(Configuration::key)
      .unwrap_or_else(|| id.to_string())
  }

  /// Declare that `from` depends on `to`.
  pub fn add_dependency(
    &mut self,
    from: ConfigId,
    to: ConfigId,
    visibility: Visibility,
    flags: PropagationFlags,
  ) -> Result<(), GraphError> {
    for id in [from, to] {
      if id.0 >= self.configurations.len() {
        return Err(GraphError::UnknownConfiguration(id));
      }
    }

    let edge = DependencyEdge {
      visibility,
      flags,
      declaration_index: self.next_declaration,
    };
    self.next_declaration += 1;

    if from == to {
      self
        .diagnostics
        .warn(WarningKind::SelfEdge, format!("{} declares a dependency on itself; ignored", self.describe(from)));
      return Ok(());
    }

    let Some(&slot) = self.edge_slots.get(&(from, to)) else {
      self.edge_slots.insert((from, to), self.edges.len());
      self.edges.push((from, to, edge));
      return Ok(());
    };

    let existing = self.edges[slot].2;
    let (from_key, to_key) = (self.describe(from), self.describe(to));
    if existing.same_settings(&edge) {
      self.diagnostics.warn(
        WarningKind::RedundantEdge,
        format!("{} -> {} declared more than once ({} {})", from_key, to_key, visibility, flags),
      );
      return Ok(());
    }

    let first = format!("{} {}", existing.visibility, existing.flags);
    let second = format!("{} {}", visibility, flags);
    match self.options.duplicate_edges {
      DuplicateEdgePolicy::Error => Err(GraphError::ConflictingEdge {
        from: from_key,
        to: to_key,
        first,
        second,
      }),
      DuplicateEdgePolicy::FirstWins => {
        self.diagnostics.warn(
          WarningKind::ConflictingEdge,
          format!("{} -> {}: kept {}, ignored {}", from_key, to_key, first, second),
        );
        Ok(())
      }
      DuplicateEdgePolicy::LastWins => {
        self.diagnostics.warn(
          WarningKind::ConflictingEdge,
          format!("{} -> {}: replaced {} with {}", from_key, to_key, first, second),
        );
        // The replacement keeps the original slot so sibling order is unchanged.
        self.edges[slot].2 = DependencyEdge {
          declaration_index: existing.declaration_index,
          ..edge
        };
        Ok(())
      }
    }
  }

  /// Finish assembly.
  ///
  /// # Errors
  ///
  /// Returns `CycleDetected` naming the configurations of the first cycle found.
  pub fn build(self) -> Result<(Graph, Diagnostics), GraphError> {
    let mut graph = DiGraph::with_capacity(self.configurations.len(), self.edges.len());
    for id in 0..self.configurations.len() {
      graph.add_node(ConfigId(id));
    }
    for (from, to, edge) in &self.edges {
      graph.add_edge(NodeIndex::new(from.0), NodeIndex::new(to.0), *edge);
    }

    if toposort(&graph, None).is_err() {
      let chain = describe_cycle(&graph, &self.configurations);
      return Err(GraphError::CycleDetected { chain });
    }

    debug!(
      configurations = self.configurations.len(),
      edges = graph.edge_count(),
      warnings = self.diagnostics.len(),
      "graph assembled"
    );

    let mut outgoing: Vec<Vec<(ConfigId, DependencyEdge)>> = vec![Vec::new(); self.configurations.len()];
    for (from, to, edge) in &self.edges {
      outgoing[from.0].push((*to, *edge));
    }
    for deps in &mut outgoing {
      deps.sort_by_key(|(_, edge)| edge.declaration_index);
    }

    let built = Graph {
      graph,
      configurations: self.configurations,
      by_identity: self.by_identity,
      outgoing,
    };
    Ok((built, self.diagnostics))
  }
}

/// Name the members of the smallest strongly connected component with more than one node.
fn describe_cycle(graph: &DiGraph<ConfigId, DependencyEdge>, configurations: &[Configuration]) -> String {
  let mut cycles: Vec<Vec<ConfigId>> = tarjan_scc(graph)
    .into_iter()
    .filter(|component| component.len() > 1)
    .map(|component| {
      let mut ids: Vec<ConfigId> = component.into_iter().map(|idx| graph[idx]).collect();
      ids.sort();
      ids
    })
    .collect();
  cycles.sort_by_key(|ids| (ids.len(), ids.first().copied()));

  let Some(members) = cycles.into_iter().next() else {
    return String::from("<unknown>");
  };

  let mut names: Vec<String> = members.iter().map(|id| configurations[id.0].key()).collect();
  if let Some(first) = names.first().cloned() {
    names.push(first);
  }
  names.join(" -> ")
}
