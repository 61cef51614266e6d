//! Turning reached configurations into compile and link inputs.
//!
//! Each [`Reach`] produced by the walk is applied to an [`Accumulator`].
//! What a reached configuration contributes depends on its output kind and
//! on the state of the path that reached it:
//!
//! | output          | library inputs                                   | build-order only          |
//! |-----------------|--------------------------------------------------|---------------------------|
//! | static library  | own archive + manual libraries, before any link boundary | when reached order-only, before any link boundary |
//! | dynamic library | import library, if immediate, public, or before any link boundary | when reached order-only, if immediate, public, or before any link boundary |
//! | executable      | nothing (order-only dependencies only)           | when reached order-only   |
//! | export          | manual libraries, before any link boundary       | never                     |
//! | none            | manual libraries, before any link boundary       | when immediate and order-only |
//!
//! A configuration is build-order only if no path to it carries headers or
//! libraries.

use std::collections::HashSet;

use crate::graph::{ConfigId, Configuration, Graph, OutputKind};

use super::types::{ResolveError, ResolvedSet};
use super::walk::Reach;

/// Collects the contributions of every reach of one root.
pub(crate) struct Accumulator<'g> {
  graph: &'g Graph,
  root: ConfigId,
  root_output: OutputKind,
  reached: HashSet<ConfigId>,
  public: HashSet<ConfigId>,
  /// Reached at least once with headers or libraries flowing.
  contributing: HashSet<ConfigId>,
  build_order: HashSet<ConfigId>,
  set: ResolvedSet,
}

impl<'g> Accumulator<'g> {
  pub fn new(graph: &'g Graph, root: ConfigId) -> Self {
    Self {
      graph,
      root,
      root_output: graph[root].output,
      reached: HashSet::new(),
      public: HashSet::new(),
      contributing: HashSet::new(),
      build_order: HashSet::new(),
      set: ResolvedSet::default(),
    }
  }

  /// Record what one reach contributes.
  pub fn apply(&mut self, reach: &Reach) -> Result<(), ResolveError> {
    let graph = self.graph;
    let node = &graph[reach.node];
    let state = reach.state;
    let flags = state.flags;
    let order_only = flags.is_order_only();

    self.reached.insert(reach.node);
    if state.public_to_root {
      self.public.insert(reach.node);
    }

    if !order_only {
      self.contributing.insert(reach.node);
      self.set.copy_files.extend(node.copy_files.iter().cloned());
    }

    if node.output.exposes_headers() && state.exposes_includes() {
      self.set.include_paths.extend(node.include_paths.iter().cloned());
      self.set.defines.extend(node.export_defines.iter().cloned());
    }

    let build_order = order_only && flags.order;
    match node.output {
      OutputKind::StaticLibrary => {
        if flags.link && !state.through_link_boundary {
          self.add_output_library(node);
          self.add_manual_libraries(node)?;
        }
        if build_order && !state.through_link_boundary {
          self.build_order.insert(reach.node);
        }
      }
      OutputKind::DynamicLibrary => {
        let visible = state.immediate || state.public_to_root || !state.through_link_boundary;
        if flags.link && visible {
          self.add_output_library(node);
        }
        if flags.link
          && self.root_output == OutputKind::Executable
          && let Some(runtime) = node.runtime_file()
        {
          self.set.copy_files.insert(runtime);
        }
        if build_order && visible {
          self.build_order.insert(reach.node);
        }
      }
      OutputKind::Executable => {
        if !order_only && !matches!(self.root_output, OutputKind::Executable | OutputKind::None) {
          return Err(ResolveError::InvalidExecutableDependency {
            dependent: self.graph.describe(self.root),
            dependency: node.key(),
          });
        }
        if build_order {
          self.build_order.insert(reach.node);
        }
      }
      OutputKind::Export => {
        if flags.link && !state.through_link_boundary {
          self.add_manual_libraries(node)?;
        }
      }
      OutputKind::None => {
        if flags.link && !state.through_link_boundary {
          self.add_manual_libraries(node)?;
        }
        if build_order && state.immediate {
          self.build_order.insert(reach.node);
        }
      }
    }

    Ok(())
  }

  fn add_output_library(&self, node: &Configuration) {
    if let Some(path) = &node.library_output_path {
      self.set.library_paths.insert(path.clone());
    }
    if let Some(name) = &node.library_output_name {
      self.set.library_files.insert(name.clone());
    }
  }

  fn add_manual_libraries(&self, node: &Configuration) -> Result<(), ResolveError> {
    self.set.library_paths.extend(node.library_paths.iter().cloned());
    for file in &node.library_files {
      let inserted = match file.order {
        Some(order) => self.set.library_files.insert_with_order(file.value.clone(), order),
        None => Ok(self.set.library_files.insert(file.value.clone())),
      };
      inserted.map_err(|source| ResolveError::OrderConflict {
        configuration: self.graph.describe(self.root),
        source,
      })?;
    }
    Ok(())
  }

  /// Sort the dependency lists and hand over the result.
  pub fn finish(mut self) -> ResolvedSet {
    let mut public: Vec<ConfigId> = self.public.iter().copied().collect();
    let mut private: Vec<ConfigId> = self
      .reached
      .iter()
      .copied()
      .filter(|id| !self.public.contains(id))
      .collect();
    let mut build_order: Vec<ConfigId> = self
      .build_order
      .iter()
      .copied()
      .filter(|id| !self.contributing.contains(id))
      .collect();

    for list in [&mut public, &mut private, &mut build_order] {
      sort_by_link_order(self.graph, list);
    }

    self.set.dependencies = public.iter().chain(private.iter()).copied().collect();
    self.set.public_dependencies = public;
    self.set.private_dependencies = private;
    self.set.build_order_only = build_order;
    self.set
  }
}

fn sort_by_link_order(graph: &Graph, ids: &mut [ConfigId]) {
  ids.sort_by(|a, b| {
    let (ca, cb) = (&graph[*a], &graph[*b]);
    (ca.link_order, &ca.project, &ca.target, a).cmp(&(cb.link_order, &cb.project, &cb.target, b))
  });
}
