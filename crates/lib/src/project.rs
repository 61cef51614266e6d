//! Project descriptors.
//!
//! A [`ProjectDescriptor`] is the programmatic counterpart of a
//! [`GraphDescription`]: a project id, the targets it is built for, and an
//! ordered list of configurator closures. Expanding a descriptor runs every
//! configurator, in order, once per target, against a fresh
//! [`ConfigurationDecl`].
//!
//! Derived descriptors copy the configurators of their base and append
//! their own, so base settings are applied first and can be refined.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::describe::{ConfigurationDecl, DescribeError, GraphDescription};
use crate::diagnostics::Diagnostics;
use crate::graph::{Graph, GraphOptions, OutputKind, ProjectId, Target};

/// A step that fills in one configuration of a project.
///
/// The declaration already carries its project, target and output kind.
pub type Configurator = Arc<dyn Fn(&mut ConfigurationDecl) + Send + Sync>;

/// Declares how a project is configured for each of its targets.
#[derive(Clone)]
pub struct ProjectDescriptor {
  id: ProjectId,
  output: OutputKind,
  targets: Vec<Target>,
  configurators: Vec<Configurator>,
}

impl fmt::Debug for ProjectDescriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ProjectDescriptor")
      .field("id", &self.id)
      .field("output", &self.output)
      .field("targets", &self.targets)
      .field("configurators", &self.configurators.len())
      .finish()
  }
}

impl ProjectDescriptor {
  pub fn new(id: impl Into<ProjectId>, output: OutputKind) -> Self {
    Self {
      id: id.into(),
      output,
      targets: Vec::new(),
      configurators: Vec::new(),
    }
  }

  /// A new project that starts from `base`: same output kind, targets and configurators.
  pub fn derive(id: impl Into<ProjectId>, base: &ProjectDescriptor) -> Self {
    Self {
      id: id.into(),
      output: base.output,
      targets: base.targets.clone(),
      configurators: base.configurators.clone(),
    }
  }

  pub fn id(&self) -> &ProjectId {
    &self.id
  }

  pub fn output(&self) -> OutputKind {
    self.output
  }

  pub fn targets(&self) -> &[Target] {
    &self.targets
  }

  pub fn configurator_count(&self) -> usize {
    self.configurators.len()
  }

  /// Override the output kind.
  pub fn with_output(mut self, output: OutputKind) -> Self {
    self.output = output;
    self
  }

  /// Build the project for `target` as well. Repeated targets are ignored.
  pub fn target(mut self, target: impl Into<Target>) -> Self {
    let target = target.into();
    if !self.targets.contains(&target) {
      self.targets.push(target);
    }
    self
  }

  /// Append a configurator.
  pub fn configure<F>(mut self, configurator: F) -> Self
  where
    F: Fn(&mut ConfigurationDecl) + Send + Sync + 'static,
  {
    self.configurators.push(Arc::new(configurator));
    self
  }

  /// One declaration per target, with every configurator applied in order.
  pub fn expand(&self) -> Vec<ConfigurationDecl> {
    self
      .targets
      .iter()
      .map(|target| {
        let mut decl = ConfigurationDecl::new(self.id.clone(), target.clone(), self.output);
        for configurator in &self.configurators {
          configurator(&mut decl);
        }
        decl
      })
      .collect()
  }
}

/// The set of projects known to one run.
#[derive(Debug, Default)]
pub struct ProjectRegistry {
  projects: Vec<ProjectDescriptor>,
  index: HashMap<ProjectId, usize>,
}

impl ProjectRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a project.
  ///
  /// # Errors
  ///
  /// Returns `DuplicateProject` if a project with the same id is already registered.
  pub fn register(&mut self, project: ProjectDescriptor) -> Result<(), DescribeError> {
    if self.index.contains_key(&project.id) {
      return Err(DescribeError::DuplicateProject(project.id));
    }
    self.index.insert(project.id.clone(), self.projects.len());
    self.projects.push(project);
    Ok(())
  }

  pub fn get(&self, id: &ProjectId) -> Option<&ProjectDescriptor> {
    self.index.get(id).map(|&i| &self.projects[i])
  }

  pub fn len(&self) -> usize {
    self.projects.len()
  }

  pub fn is_empty(&self) -> bool {
    self.projects.is_empty()
  }

  /// Expand every project, in registration order.
  pub fn describe(&self, options: GraphOptions) -> GraphDescription {
    let mut description = GraphDescription::new(options);
    for project in &self.projects {
      description.configurations.extend(project.expand());
    }
    debug!(
      projects = self.projects.len(),
      configurations = description.configurations.len(),
      "expanded project descriptors"
    );
    description
  }

  /// Expand every project and lower the result into a [`Graph`].
  pub fn build(&self, options: GraphOptions) -> Result<(Graph, Diagnostics), DescribeError> {
    self.describe(options).into_graph()
  }
}
