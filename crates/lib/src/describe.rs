//! Serializable graph descriptions.
//!
//! A [`GraphDescription`] is what the declarative phase hands to the
//! resolver: every configuration with its own attributes, plus the ordered
//! dependency declarations it made. Declarations name projects, not ids;
//! [`GraphDescription::into_graph`] resolves each one against the declared
//! configurations and feeds a [`GraphBuilder`].
//!
//! # JSON format
//!
//! ```json
//! {
//!   "options": { "duplicate_edges": "first_wins" },
//!   "configurations": [
//!     {
//!       "project": "app", "target": "debug", "output": "executable",
//!       "dependencies": [
//!         { "project": "core" },
//!         { "project": "tools", "target": "release", "flags": "only_build_order" },
//!         { "project": "gfx", "visibility": "private", "flags": { "link": false } }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::diagnostics::Diagnostics;
use crate::graph::{
  ConfigId, Configuration, Graph, GraphBuilder, GraphError, GraphOptions, OutputKind, ProjectId, PropagationFlags,
  Target, TargetSelector, Visibility,
};

/// Errors raised while loading or lowering a description.
#[derive(Debug, Error)]
pub enum DescribeError {
  /// Failed to read a description file.
  #[error("failed to read {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The description is not valid JSON for this schema.
  #[error("invalid graph description: {0}")]
  Json(#[from] serde_json::Error),

  /// A project was registered twice.
  #[error("project '{0}' is already registered")]
  DuplicateProject(ProjectId),

  /// A declaration names a project that has no configuration at all.
  #[error("{configuration} depends on unknown project '{project}'")]
  UnknownProject { configuration: String, project: ProjectId },

  /// A declaration names a project that has no configuration for the selected target.
  #[error("{configuration} depends on '{project}' for target '{target}', which is not declared")]
  UnresolvableTarget {
    configuration: String,
    project: ProjectId,
    target: Target,
  },

  /// The lowered graph was rejected.
  #[error(transparent)]
  Graph(#[from] GraphError),
}

/// A whole graph, as declared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDescription {
  #[serde(default)]
  pub options: GraphOptions,
  #[serde(default)]
  pub configurations: Vec<ConfigurationDecl>,
}

/// One configuration and the dependencies it declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationDecl {
  #[serde(flatten)]
  pub configuration: Configuration,
  /// Dependency declarations, in declaration order.
  #[serde(default)]
  pub dependencies: Vec<DependencyDecl>,
}

impl ConfigurationDecl {
  pub fn new(project: impl Into<ProjectId>, target: impl Into<Target>, output: OutputKind) -> Self {
    Self {
      configuration: Configuration::new(project, target, output),
      dependencies: Vec::new(),
    }
  }

  /// Declare a dependency on the same target of `project` with default flags.
  pub fn depend_on(&mut self, project: impl Into<ProjectId>, visibility: Visibility) -> &mut Self {
    self.depend_on_with(project, visibility, PropagationFlags::DEFAULT)
  }

  /// Declare a dependency on the same target of `project`.
  pub fn depend_on_with(
    &mut self,
    project: impl Into<ProjectId>,
    visibility: Visibility,
    flags: PropagationFlags,
  ) -> &mut Self {
    self.dependencies.push(DependencyDecl {
      project: project.into(),
      target: TargetSelector::Same,
      visibility,
      flags,
    });
    self
  }

  /// Declare a dependency on an explicit target of `project`.
  pub fn depend_on_target(
    &mut self,
    project: impl Into<ProjectId>,
    target: impl Into<Target>,
    visibility: Visibility,
    flags: PropagationFlags,
  ) -> &mut Self {
    self.dependencies.push(DependencyDecl {
      project: project.into(),
      target: TargetSelector::Named(target.into()),
      visibility,
      flags,
    });
    self
  }

  pub fn key(&self) -> String {
    self.configuration.key()
  }
}

/// A dependency as the declaring configuration wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDecl {
  pub project: ProjectId,
  #[serde(default)]
  pub target: TargetSelector,
  #[serde(default)]
  pub visibility: Visibility,
  #[serde(default, deserialize_with = "deserialize_flags")]
  pub flags: PropagationFlags,
}

/// Named flag presets accepted in place of an explicit flag object.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum FlagPreset {
  Default,
  OnlyBuildOrder,
  WithoutLinking,
  None,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagsRepr {
  Preset(FlagPreset),
  Custom(PropagationFlags),
}

fn deserialize_flags<'de, D>(deserializer: D) -> Result<PropagationFlags, D::Error>
where
  D: Deserializer<'de>,
{
  let flags = match FlagsRepr::deserialize(deserializer)? {
    FlagsRepr::Preset(FlagPreset::Default) => PropagationFlags::DEFAULT,
    FlagsRepr::Preset(FlagPreset::OnlyBuildOrder) => PropagationFlags::ONLY_BUILD_ORDER,
    FlagsRepr::Preset(FlagPreset::WithoutLinking) => PropagationFlags::WITHOUT_LINKING,
    FlagsRepr::Preset(FlagPreset::None) => PropagationFlags::NONE,
    FlagsRepr::Custom(flags) => flags,
  };
  Ok(flags)
}

impl GraphDescription {
  pub fn new(options: GraphOptions) -> Self {
    Self {
      options,
      configurations: Vec::new(),
    }
  }

  /// Append a configuration and return it for further declarations.
  pub fn push(&mut self, decl: ConfigurationDecl) -> &mut ConfigurationDecl {
    self.configurations.push(decl);
    let last = self.configurations.len() - 1;
    &mut self.configurations[last]
  }

  pub fn from_json_str(json: &str) -> Result<Self, DescribeError> {
    Ok(serde_json::from_str(json)?)
  }

  /// Load a description from a JSON file.
  pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DescribeError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| DescribeError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    let description = Self::from_json_str(&content)?;
    debug!(
      path = %path.display(),
      configurations = description.configurations.len(),
      "loaded graph description"
    );
    Ok(description)
  }

  pub fn to_json_pretty(&self) -> Result<String, DescribeError> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  /// Lower the description into a validated [`Graph`].
  ///
  /// Configurations keep their declaration order as ids. Dependency
  /// declarations are added per configuration, in the order they were made.
  ///
  /// # Errors
  ///
  /// Fails on an unknown project, an unresolvable target selector, or any
  /// [`GraphError`].
  pub fn into_graph(self) -> Result<(Graph, Diagnostics), DescribeError> {
    let mut builder = GraphBuilder::with_options(self.options);
    let mut pending: Vec<(ConfigId, Target, Vec<DependencyDecl>)> = Vec::with_capacity(self.configurations.len());
    for decl in self.configurations {
      let target = decl.configuration.target.clone();
      let id = builder.add_configuration(decl.configuration)?;
      pending.push((id, target, decl.dependencies));
    }

    for (from, declaring_target, dependencies) in pending {
      for dep in dependencies {
        let to = lookup(&builder, from, &declaring_target, &dep)?;
        builder.add_dependency(from, to, dep.visibility, dep.flags)?;
      }
    }

    Ok(builder.build()?)
  }
}

fn lookup(
  builder: &GraphBuilder,
  from: ConfigId,
  declaring_target: &Target,
  dep: &DependencyDecl,
) -> Result<ConfigId, DescribeError> {
  let configuration = || builder.describe(from);

  if !builder.has_project(&dep.project) {
    return Err(DescribeError::UnknownProject {
      configuration: configuration(),
      project: dep.project.clone(),
    });
  }

  let target = dep.target.select(declaring_target);
  builder
    .find(&dep.project, target)
    .ok_or_else(|| DescribeError::UnresolvableTarget {
      configuration: configuration(),
      project: dep.project.clone(),
      target: target.clone(),
    })
}
