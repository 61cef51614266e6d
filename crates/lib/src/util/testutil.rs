//! Test utilities for linkset-lib.
//!
//! Helpers for assembling small configuration graphs in unit tests without
//! repeating builder boilerplate.

use crate::graph::{ConfigId, Configuration, Graph, GraphBuilder, OutputKind, PropagationFlags, Visibility};

/// A configuration for target `debug` that exports `<project>/include` and
/// produces library `<project>` in `out/<project>`.
pub fn library(project: &str, output: OutputKind) -> Configuration {
  let mut conf = Configuration::new(project, "debug", output);
  conf.include_paths.push(format!("{}/include", project));
  conf.library_output_path = Some(format!("out/{}", project));
  conf.library_output_name = Some(project.to_string());
  conf
}

/// Owned strings, for comparing against resolved collections.
pub fn strings(values: &[&str]) -> Vec<String> {
  values.iter().map(|v| v.to_string()).collect()
}

/// Graph builder that panics on invalid input.
#[derive(Debug, Default)]
pub struct Fixture {
  builder: GraphBuilder,
}

impl Fixture {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a [`library`] configuration.
  pub fn add(&mut self, project: &str, output: OutputKind) -> ConfigId {
    self.add_configuration(library(project, output))
  }

  pub fn add_configuration(&mut self, configuration: Configuration) -> ConfigId {
    self
      .builder
      .add_configuration(configuration)
      .expect("fixture configuration should be unique")
  }

  pub fn edge(&mut self, from: ConfigId, to: ConfigId, visibility: Visibility, flags: PropagationFlags) -> &mut Self {
    self
      .builder
      .add_dependency(from, to, visibility, flags)
      .expect("fixture edge should be valid");
    self
  }

  pub fn public(&mut self, from: ConfigId, to: ConfigId) -> &mut Self {
    self.edge(from, to, Visibility::Public, PropagationFlags::DEFAULT)
  }

  pub fn private(&mut self, from: ConfigId, to: ConfigId) -> &mut Self {
    self.edge(from, to, Visibility::Private, PropagationFlags::DEFAULT)
  }

  pub fn build(self) -> Graph {
    self.builder.build().expect("fixture graph should be acyclic").0
  }
}
