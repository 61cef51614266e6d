//! linkset-lib: dependency closure resolution for build descriptions
//!
//! This crate computes, for every configuration of a project graph, what it
//! inherits from its dependencies:
//! - `Graph`: configurations and annotated dependency edges, validated on build
//! - `GraphDescription` / `ProjectRegistry`: the two ways of declaring a graph
//! - `Resolver`: memoized, parallel resolution into `ResolvedSet`s
//! - `OrderedSet`: deduplicated ordered collections safe to read concurrently

pub mod consts;
pub mod describe;
pub mod diagnostics;
pub mod graph;
pub mod ordered;
pub mod project;
pub mod resolve;
pub mod util;

pub use describe::{ConfigurationDecl, DependencyDecl, DescribeError, GraphDescription};
pub use diagnostics::{Diagnostics, Warning, WarningKind};
pub use graph::{
  ConfigId, Configuration, DependencyEdge, DuplicateEdgePolicy, Graph, GraphBuilder, GraphError, GraphOptions,
  OutputKind, ProjectId, PropagationFlags, Target, TargetSelector, Visibility,
};
pub use ordered::{OrderConflict, OrderedSet, OrderedValue};
pub use project::{Configurator, ProjectDescriptor, ProjectRegistry};
pub use resolve::{ResolveError, ResolveOptions, ResolvedSet, Resolver};
