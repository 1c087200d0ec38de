//! Resolution of the host's loaded binaries into a fixed reference set.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use loom_module::{baseline, load_module, IdentityComparer, LoadedModule, ModuleIdentity, TypeDef};
use serde::{Deserialize, Serialize};

/// A binary the host has loaded and offers as a compilation reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryHandle {
    name: String,
    location: Option<PathBuf>,
    is_dynamic: bool,
}

impl BinaryHandle {
    /// A binary backed by the file at `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let location: PathBuf = path.into();
        let name = location
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            location: Some(location),
            is_dynamic: false,
        }
    }

    /// A binary generated in memory; it has no file and is never referenced.
    pub fn dynamic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: None,
            is_dynamic: true,
        }
    }

    /// A binary whose on-disk location is unknown.
    pub fn unlocated(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: None,
            is_dynamic: false,
        }
    }

    /// Display name of the binary.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The binary's file, if it has one.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Whether the binary was generated in memory.
    pub fn is_dynamic(&self) -> bool {
        self.is_dynamic
    }

    /// The location this handle can be referenced from, or `None` when it
    /// must be skipped.
    fn usable_location(&self) -> Option<&Path> {
        if self.is_dynamic {
            return None;
        }
        let path = self.location.as_deref()?;
        if path.as_os_str().is_empty() || !path.is_file() {
            return None;
        }
        Some(path)
    }
}

/// Result of looking a type up by full name across the reference set.
#[derive(Debug)]
pub enum TypeLookup<'a> {
    /// No reference defines the type.
    NotFound,
    /// Exactly one module is selected.
    Found {
        /// Index of the defining module in [`ReferenceSet::modules`].
        module: usize,
        /// The definition.
        def: &'a TypeDef,
    },
    /// Several non-equivalent modules define the type.
    Ambiguous(Vec<&'a ModuleIdentity>),
}

/// The ordered, immutable list of modules a compiler resolves against.
///
/// Built once from the host's candidates: dynamic binaries and binaries
/// without a file are skipped, duplicate files are collapsed, and the two
/// baseline modules are appended. Cloning shares the underlying list, so
/// every compile sees exactly the same references.
#[derive(Clone, Debug)]
pub struct ReferenceSet {
    modules: Arc<[LoadedModule]>,
    types: Arc<HashMap<String, Vec<usize>>>,
    namespaces: Arc<HashSet<String>>,
}

impl ReferenceSet {
    /// Resolves `candidates` into a reference set.
    ///
    /// The candidates are consumed here; later changes to the caller's
    /// collection have no effect. Malformed candidates are dropped.
    pub fn build(candidates: impl IntoIterator<Item = BinaryHandle>) -> Self {
        let mut seen: HashSet<PathBuf> = HashSet::new();
        let mut modules: Vec<LoadedModule> = Vec::new();

        for candidate in candidates {
            let Some(path) = candidate.usable_location() else {
                tracing::debug!(
                    name = candidate.name(),
                    dynamic = candidate.is_dynamic(),
                    "skipping reference candidate without a file"
                );
                continue;
            };
            let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            if !seen.insert(key) {
                tracing::debug!(path = %path.display(), "skipping duplicate reference candidate");
                continue;
            }
            match load_module(path) {
                Ok(module) => modules.push(module),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "dropping unreadable reference candidate");
                }
            }
        }

        for base in baseline::all() {
            if modules.iter().any(|m| m.identity() == base.identity()) {
                continue;
            }
            modules.push(base);
        }

        Self::from_modules(modules)
    }

    fn from_modules(modules: Vec<LoadedModule>) -> Self {
        let mut types: HashMap<String, Vec<usize>> = HashMap::new();
        let mut namespaces: HashSet<String> = HashSet::new();
        for (index, module) in modules.iter().enumerate() {
            for def in module.types() {
                types.entry(def.full_name()).or_default().push(index);
                if let Some(ns) = &def.namespace {
                    insert_namespace_prefixes(&mut namespaces, ns);
                }
            }
        }
        Self {
            modules: modules.into(),
            types: Arc::new(types),
            namespaces: Arc::new(namespaces),
        }
    }

    /// The modules, in reference order.
    pub fn modules(&self) -> &[LoadedModule] {
        &self.modules
    }

    /// Identities of the modules, in reference order.
    pub fn identities(&self) -> Vec<ModuleIdentity> {
        self.modules.iter().map(|m| m.identity().clone()).collect()
    }

    /// Number of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Always `false`: the baselines are present in every set.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Whether any module defines a type in `namespace` or below it.
    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains(namespace)
    }

    /// Finds the module defining `full_name`, unifying equivalent identities.
    pub fn lookup(&self, full_name: &str, comparer: &IdentityComparer) -> TypeLookup<'_> {
        let Some(indices) = self.types.get(full_name) else {
            return TypeLookup::NotFound;
        };
        let identities = indices.iter().map(|&i| self.modules[i].identity());
        let Some(chosen) = comparer.unify(identities) else {
            return TypeLookup::Ambiguous(
                indices.iter().map(|&i| self.modules[i].identity()).collect(),
            );
        };
        // First module carrying the chosen identity.
        let found = indices
            .iter()
            .copied()
            .find(|&i| self.modules[i].identity() == chosen)
            .and_then(|i| self.modules[i].find_type(full_name).map(|def| (i, def)));
        match found {
            Some((module, def)) => TypeLookup::Found { module, def },
            None => TypeLookup::NotFound,
        }
    }
}

/// Adds `ns` and each of its dotted prefixes.
pub(crate) fn insert_namespace_prefixes(set: &mut HashSet<String>, ns: &str) {
    let mut end = 0;
    for (i, ch) in ns.char_indices() {
        if ch == '.' {
            set.insert(ns[..i].to_string());
        }
        end = i + ch.len_utf8();
    }
    if end > 0 {
        set.insert(ns.to_string());
    }
}
