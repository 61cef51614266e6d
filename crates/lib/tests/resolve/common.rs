//! Shared helpers for resolver integration tests.
//!
//! Every catalog project derives from [`base`], which makes it a static
//! library exporting `<name>/include` and producing `<name>` in
//! `<name>/lib_output`.

use std::sync::Arc;

use linkset_lib::{
  ConfigId, GraphOptions, OrderedSet, OutputKind, ProjectDescriptor, ProjectRegistry, PropagationFlags,
  ResolveOptions, ResolvedSet, Resolver, Visibility,
};

pub const TARGET: &str = "win64-debug";

const PUBLIC: Visibility = Visibility::Public;
const PRIVATE: Visibility = Visibility::Private;
const DEFAULT: PropagationFlags = PropagationFlags::DEFAULT;
const WITHOUT_LINKING: PropagationFlags = PropagationFlags::WITHOUT_LINKING;
const ONLY_BUILD_ORDER: PropagationFlags = PropagationFlags::ONLY_BUILD_ORDER;

type Dep = (&'static str, Visibility, PropagationFlags);

/// Settings shared by every catalog project.
pub fn base() -> ProjectDescriptor {
  ProjectDescriptor::new("common", OutputKind::StaticLibrary)
    .target(TARGET)
    .configure(|decl| {
      let name = decl.configuration.project.to_string();
      decl.configuration.include_paths.push(include(&name));
      decl.configuration.library_output_path = Some(lib_path(&name));
      decl.configuration.library_output_name = Some(name);
    })
}

/// A project derived from [`base`] with the given output kind and dependencies.
pub fn project(name: &str, output: OutputKind, deps: &[Dep]) -> ProjectDescriptor {
  let deps = deps.to_vec();
  ProjectDescriptor::derive(name, &base())
    .with_output(output)
    .configure(move |decl| {
      for (dep, visibility, flags) in &deps {
        decl.depend_on_with(*dep, *visibility, *flags);
      }
    })
}

fn lib(name: &str, deps: &[Dep]) -> ProjectDescriptor {
  project(name, OutputKind::StaticLibrary, deps)
}

fn dll(name: &str, deps: &[Dep]) -> ProjectDescriptor {
  project(name, OutputKind::DynamicLibrary, deps)
}

fn exe(name: &str, deps: &[Dep]) -> ProjectDescriptor {
  project(name, OutputKind::Executable, deps)
}

/// A project with no build step that forwards a prebuilt library.
fn exported(name: &str) -> ProjectDescriptor {
  let prebuilt = name.to_string();
  project(name, OutputKind::None, &[]).configure(move |decl| {
    decl.configuration.library_paths.push(lib_path(&prebuilt));
    decl.configuration.library_files.push(prebuilt.as_str().into());
  })
}

/// The reference set of projects exercised by the propagation tests.
pub fn catalog() -> Vec<ProjectDescriptor> {
  vec![
    lib("no_dependency_1", &[]),
    lib("no_dependency_2", &[]),
    lib("one_public", &[("no_dependency_1", PUBLIC, DEFAULT)]),
    lib("one_public_without_linking", &[("no_dependency_1", PUBLIC, WITHOUT_LINKING)]),
    lib("one_private", &[("no_dependency_1", PRIVATE, DEFAULT)]),
    lib(
      "one_public_one_private",
      &[("no_dependency_1", PUBLIC, DEFAULT), ("no_dependency_2", PRIVATE, DEFAULT)],
    ),
    lib(
      "two_public",
      &[("no_dependency_1", PUBLIC, DEFAULT), ("no_dependency_2", PUBLIC, DEFAULT)],
    ),
    lib(
      "two_private",
      &[("no_dependency_1", PRIVATE, DEFAULT), ("no_dependency_2", PRIVATE, DEFAULT)],
    ),
    lib("inherit_one_public", &[("one_public", PUBLIC, DEFAULT)]),
    lib("inherit_one_private", &[("one_public", PRIVATE, DEFAULT)]),
    lib("inherit_one_private_build_order", &[("one_public", PRIVATE, ONLY_BUILD_ORDER)]),
    lib("inherit_public_from_private", &[("one_private", PUBLIC, DEFAULT)]),
    lib("inherit_private_from_private", &[("one_private", PRIVATE, DEFAULT)]),
    lib("project_a", &[("inherit_one_private", PRIVATE, DEFAULT)]),
    lib("project_b", &[("inherit_one_private", PUBLIC, DEFAULT)]),
    lib("project_c", &[("inherit_one_public", PRIVATE, DEFAULT)]),
    lib("project_f", &[("inherit_public_from_private", PUBLIC, DEFAULT)]),
    dll(
      "a_dll",
      &[("no_dependency_1", PRIVATE, DEFAULT), ("no_dependency_2", PRIVATE, DEFAULT)],
    ),
    dll(
      "dll_private",
      &[("no_dependency_1", PRIVATE, DEFAULT), ("no_dependency_2", PRIVATE, DEFAULT)],
    ),
    dll(
      "dll_public",
      &[("no_dependency_1", PUBLIC, DEFAULT), ("no_dependency_2", PUBLIC, DEFAULT)],
    ),
    dll("dll_private_dll", &[("dll_private", PRIVATE, DEFAULT)]),
    dll("dll_public_dll", &[("dll_public", PUBLIC, DEFAULT)]),
    exe("exe_private", &[("dll_private", PRIVATE, DEFAULT)]),
    exe("exe_public", &[("dll_private", PUBLIC, DEFAULT)]),
    exe("exe_public_dll_inheritance", &[("dll_private_dll", PUBLIC, DEFAULT)]),
    exe("exe_double_public_dll_inheritance", &[("dll_public_dll", PUBLIC, DEFAULT)]),
    exported("exported"),
    lib("private_depend_on_exported", &[("exported", PRIVATE, DEFAULT)]),
    lib("public_depend_on_exported", &[("exported", PUBLIC, DEFAULT)]),
    lib("private_inherit_exported", &[("private_depend_on_exported", PRIVATE, DEFAULT)]),
    lib(
      "inherit_as_private_and_public",
      &[("one_public", PUBLIC, DEFAULT), ("no_dependency_1", PRIVATE, DEFAULT)],
    ),
    lib("inherit_export_as_public", &[("public_depend_on_exported", PUBLIC, DEFAULT)]),
    lib("deep_inherit_export", &[("inherit_export_as_public", PRIVATE, DEFAULT)]),
    lib(
      "duplicate_in_deep_inheritance",
      &[
        ("deep_inherit_export", PRIVATE, DEFAULT),
        ("public_depend_on_exported", PUBLIC, DEFAULT),
      ],
    ),
    lib(
      "inherit_lib_from_dll_and_lib",
      &[
        ("a_dll", PRIVATE, DEFAULT),
        ("dll_private", PRIVATE, DEFAULT),
        ("one_public", PRIVATE, DEFAULT),
      ],
    ),
    dll("no_dependency_dll", &[]),
    lib("lib_depend_on_dll", &[("no_dependency_dll", PRIVATE, DEFAULT)]),
    lib("lib_inherit_lib_and_dll_public", &[("lib_depend_on_dll", PUBLIC, DEFAULT)]),
    lib("lib_inherit_lib_and_dll_private", &[("lib_depend_on_dll", PRIVATE, DEFAULT)]),
    lib(
      "inherit_identical_from_dll",
      &[("a_dll", PRIVATE, DEFAULT), ("dll_public", PRIVATE, DEFAULT)],
    ),
    dll("dll_pub_dep_without_link", &[("no_dependency_2", PUBLIC, WITHOUT_LINKING)]),
    lib(
      "complex_dll_inheritance",
      &[
        ("one_public", PUBLIC, WITHOUT_LINKING),
        ("dll_pub_dep_without_link", PRIVATE, ONLY_BUILD_ORDER),
        ("no_dependency_1", PUBLIC, WITHOUT_LINKING),
        ("no_dependency_2", PRIVATE, ONLY_BUILD_ORDER),
      ],
    ),
    lib("inherit_complex_dll_inheritance", &[("complex_dll_inheritance", PRIVATE, DEFAULT)]),
    lib(
      "inherit_complex_dll_inheritance_and_direct",
      &[
        ("complex_dll_inheritance", PRIVATE, DEFAULT),
        ("no_dependency_2", PUBLIC, DEFAULT),
      ],
    ),
    lib("only_build_order", &[("one_public", PRIVATE, ONLY_BUILD_ORDER)]),
    lib("inherit_build_order", &[("only_build_order", PRIVATE, DEFAULT)]),
    lib(
      "inherit_and_build_order",
      &[
        ("one_private", PRIVATE, ONLY_BUILD_ORDER),
        ("inherit_private_from_private", PRIVATE, DEFAULT),
      ],
    ),
    lib(
      "pub_to_immediate_and_build_order",
      &[("one_public", PRIVATE, ONLY_BUILD_ORDER), ("one_private", PRIVATE, DEFAULT)],
    ),
  ]
}

pub fn include(name: &str) -> String {
  format!("{}/include", name)
}

pub fn lib_path(name: &str) -> String {
  format!("{}/lib_output", name)
}

/// A resolver over a set of registered projects.
pub struct World {
  pub resolver: Resolver,
}

impl World {
  pub fn new(projects: Vec<ProjectDescriptor>, options: ResolveOptions) -> Self {
    let mut registry = ProjectRegistry::new();
    for project in projects {
      registry.register(project).unwrap();
    }
    let (graph, diagnostics) = registry.build(GraphOptions::default()).unwrap();
    assert!(diagnostics.is_empty(), "unexpected warnings: {:?}", diagnostics.warnings());
    Self {
      resolver: Resolver::new(graph, options),
    }
  }

  pub fn catalog() -> Self {
    Self::new(catalog(), ResolveOptions::single_threaded())
  }

  pub fn id(&self, name: &str) -> ConfigId {
    self
      .resolver
      .graph()
      .find(&name.into(), &TARGET.into())
      .unwrap_or_else(|| panic!("no configuration for {}", name))
  }

  pub fn resolve(&self, name: &str) -> Arc<ResolvedSet> {
    self.resolver.resolve(self.id(name)).unwrap()
  }

  /// Project names of `ids`, in the given order.
  pub fn names(&self, ids: &[ConfigId]) -> Vec<String> {
    let graph = self.resolver.graph();
    ids.iter().map(|id| graph[*id].project.to_string()).collect()
  }
}

/// Contents of a collection, sorted, for order-insensitive comparisons.
pub fn sorted(set: &OrderedSet<String>) -> Vec<String> {
  let mut values = set.to_vec();
  values.sort();
  values
}

/// Owned, sorted strings.
pub fn expect(values: &[&str]) -> Vec<String> {
  let mut values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
  values.sort();
  values
}

/// Sorted include paths of the named projects.
pub fn includes(names: &[&str]) -> Vec<String> {
  let mut values: Vec<String> = names.iter().map(|n| include(n)).collect();
  values.sort();
  values
}

/// Sorted library paths of the named projects.
pub fn lib_paths(names: &[&str]) -> Vec<String> {
  let mut values: Vec<String> = names.iter().map(|n| lib_path(n)).collect();
  values.sort();
  values
}

/// `[dependencies, public, private, include paths, library paths, library files]`
pub fn shape(set: &ResolvedSet) -> [usize; 6] {
  [
    set.dependencies.len(),
    set.public_dependencies.len(),
    set.private_dependencies.len(),
    set.include_paths.len(),
    set.library_paths.len(),
    set.library_files.len(),
  ]
}
