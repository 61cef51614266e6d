//! Vocabulary of the configuration graph.
//!
//! These are the types the declarative phase produces and the resolver
//! consumes:
//! - [`Configuration`]: one buildable unit for one target
//! - [`DependencyEdge`]: an annotated Source -> Target relationship
//! - [`Visibility`], [`PropagationFlags`], [`OutputKind`]: edge and node attributes

use std::fmt;
use std::ops::BitAnd;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_RUNTIME_EXTENSION;
use crate::ordered::OrderedValue;

/// Dense identifier of a configuration inside one [`Graph`](super::Graph).
///
/// Ids are assigned in insertion order and never reused, which makes them a
/// stable key for caching and for deterministic iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigId(pub usize);

impl fmt::Display for ConfigId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// Stable, explicit identifier of a project.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ProjectId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<&str> for ProjectId {
  fn from(id: &str) -> Self {
    Self::new(id)
  }
}

/// Name of a build target (e.g. `"debug-x64"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Target(pub String);

impl Target {
  pub fn new(name: impl Into<String>) -> Self {
    Self(name.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<&str> for Target {
  fn from(name: &str) -> Self {
    Self::new(name)
  }
}

/// Which target of the dependency project an edge refers to.
///
/// Serialized as an optional target name: absent or `null` means
/// [`TargetSelector::Same`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<Target>", into = "Option<Target>")]
pub enum TargetSelector {
  /// The declaring configuration's own target.
  #[default]
  Same,
  /// An explicitly named target.
  Named(Target),
}

impl TargetSelector {
  /// The concrete target this selector picks for a configuration built for `declaring`.
  pub fn select<'a>(&'a self, declaring: &'a Target) -> &'a Target {
    match self {
      TargetSelector::Same => declaring,
      TargetSelector::Named(target) => target,
    }
  }
}

impl From<Option<Target>> for TargetSelector {
  fn from(target: Option<Target>) -> Self {
    match target {
      Some(target) => TargetSelector::Named(target),
      None => TargetSelector::Same,
    }
  }
}

impl From<TargetSelector> for Option<Target> {
  fn from(selector: TargetSelector) -> Self {
    match selector {
      TargetSelector::Same => None,
      TargetSelector::Named(target) => Some(target),
    }
  }
}

/// The nature of a configuration's build artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
  /// An archive of object files. No symbols are resolved when it is produced.
  StaticLibrary,
  /// A dynamically linked library with an import library.
  DynamicLibrary,
  /// A linked executable image.
  Executable,
  /// A header-only or prebuilt package that only re-exports declared paths.
  Export,
  /// No artifact (utility or header-only project).
  #[default]
  None,
}

impl OutputKind {
  /// Whether producing this artifact performs a real link step.
  ///
  /// Library forwarding is cut past such a node: whatever it linked against
  /// is already satisfied.
  pub fn is_link_boundary(self) -> bool {
    matches!(self, OutputKind::DynamicLibrary | OutputKind::Executable)
  }

  /// Whether this artifact exports headers to its dependents.
  pub fn exposes_headers(self) -> bool {
    !matches!(self, OutputKind::Executable)
  }
}

/// Whether an edge's target stays visible to configurations depending on the edge's source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
  #[default]
  Public,
  Private,
}

impl Visibility {
  pub fn is_public(self) -> bool {
    matches!(self, Visibility::Public)
  }
}

impl fmt::Display for Visibility {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Visibility::Public => f.write_str("public"),
      Visibility::Private => f.write_str("private"),
    }
  }
}

/// What an edge contributes to its source configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationFlags {
  /// Include paths and export defines flow through the edge.
  pub include: bool,
  /// Library paths and files flow through the edge.
  pub link: bool,
  /// The target must be built before the source.
  pub order: bool,
}

impl PropagationFlags {
  /// Everything propagates.
  pub const DEFAULT: Self = Self {
    include: true,
    link: true,
    order: true,
  };

  /// Build ordering only: no headers, no libraries.
  pub const ONLY_BUILD_ORDER: Self = Self {
    include: false,
    link: false,
    order: true,
  };

  /// Headers and ordering, for dependencies that must not be linked.
  pub const WITHOUT_LINKING: Self = Self {
    include: true,
    link: false,
    order: true,
  };

  /// Nothing propagates.
  pub const NONE: Self = Self {
    include: false,
    link: false,
    order: false,
  };

  /// Whether neither headers nor libraries flow.
  pub fn is_order_only(self) -> bool {
    !self.include && !self.link
  }
}

impl Default for PropagationFlags {
  fn default() -> Self {
    Self::DEFAULT
  }
}

impl BitAnd for PropagationFlags {
  type Output = Self;

  fn bitand(self, rhs: Self) -> Self {
    Self {
      include: self.include && rhs.include,
      link: self.link && rhs.link,
      order: self.order && rhs.order,
    }
  }
}

impl fmt::Display for PropagationFlags {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut parts = Vec::new();
    if self.include {
      parts.push("include");
    }
    if self.link {
      parts.push("link");
    }
    if self.order {
      parts.push("order");
    }
    if parts.is_empty() {
      f.write_str("none")
    } else {
      f.write_str(&parts.join("+"))
    }
  }
}

/// A declared Source -> Target relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
  pub visibility: Visibility,
  pub flags: PropagationFlags,
  /// Position of the declaration within the whole graph, for stable tie-breaking.
  pub declaration_index: usize,
}

impl DependencyEdge {
  /// Whether two declarations carry the same settings, ignoring declaration order.
  pub fn same_settings(&self, other: &DependencyEdge) -> bool {
    self.visibility == other.visibility && self.flags == other.flags
  }
}

/// One buildable unit of a project for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
  pub project: ProjectId,
  pub target: Target,
  #[serde(default)]
  pub output: OutputKind,

  /// Header directories exported to dependents.
  #[serde(default)]
  pub include_paths: Vec<String>,
  /// Preprocessor symbols exported alongside the include paths.
  #[serde(default)]
  pub export_defines: Vec<String>,

  /// Directory holding the produced library (or import library).
  #[serde(default)]
  pub library_output_path: Option<String>,
  /// File name of the produced library (or import library).
  #[serde(default)]
  pub library_output_name: Option<String>,
  /// Extension of a dynamic library's runtime artifact.
  #[serde(default)]
  pub output_extension: Option<String>,

  /// Manually declared extra library search paths.
  #[serde(default)]
  pub library_paths: Vec<String>,
  /// Manually declared extra library files.
  #[serde(default)]
  pub library_files: Vec<OrderedValue>,
  /// Files copied next to the final artifact of dependents.
  #[serde(default)]
  pub copy_files: Vec<String>,

  /// Sort key for resolved dependency lists.
  #[serde(default)]
  pub link_order: i32,
}

impl Configuration {
  /// Create a configuration with no artifacts and no exported paths.
  pub fn new(project: impl Into<ProjectId>, target: impl Into<Target>, output: OutputKind) -> Self {
    Self {
      project: project.into(),
      target: target.into(),
      output,
      include_paths: Vec::new(),
      export_defines: Vec::new(),
      library_output_path: None,
      library_output_name: None,
      output_extension: None,
      library_paths: Vec::new(),
      library_files: Vec::new(),
      copy_files: Vec::new(),
      link_order: 0,
    }
  }

  /// Human-readable identity, `project@target`.
  pub fn key(&self) -> String {
    format!("{}@{}", self.project, self.target)
  }

  /// Path of a dynamic library's runtime artifact, if it has an output location.
  pub fn runtime_file(&self) -> Option<String> {
    let dir = self.library_output_path.as_deref()?;
    let name = self.library_output_name.as_deref()?;
    let ext = self.output_extension.as_deref().unwrap_or(DEFAULT_RUNTIME_EXTENSION);
    Some(format!("{}/{}.{}", dir.trim_end_matches('/'), name, ext))
  }
}

impl From<String> for ProjectId {
  fn from(id: String) -> Self {
    Self(id)
  }
}

impl From<String> for Target {
  fn from(name: String) -> Self {
    Self(name)
  }
}
