//! Module identities and the policy for comparing them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A `major.minor.patch` module version.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct Version {
    /// Major component.
    pub major: u16,
    /// Minor component.
    pub minor: u16,
    /// Patch component.
    pub patch: u16,
}

impl Version {
    /// Creates a version.
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// The name and version that identify a module.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ModuleIdentity {
    /// Module name, e.g. `Loom.Runtime`.
    pub name: String,
    /// Module version.
    pub version: Version,
}

impl ModuleIdentity {
    /// Creates an identity.
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for ModuleIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Version={}", self.name, self.version)
    }
}

/// Decides when two references denote the same module.
///
/// Names are compared ignoring ASCII case and versions are unified: among
/// equivalent identities the highest version is preferred. This is the only
/// policy the compiler uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IdentityComparer;

impl IdentityComparer {
    /// Returns `true` when `a` and `b` name the same module, at any version.
    pub fn equivalent(&self, a: &ModuleIdentity, b: &ModuleIdentity) -> bool {
        a.name.eq_ignore_ascii_case(&b.name)
    }

    /// Picks the preferred identity out of a group, or `None` when the group
    /// contains non-equivalent identities (or is empty).
    pub fn unify<'a, I>(&self, identities: I) -> Option<&'a ModuleIdentity>
    where
        I: IntoIterator<Item = &'a ModuleIdentity>,
    {
        let mut iter = identities.into_iter();
        let mut best = iter.next()?;
        for id in iter {
            if !self.equivalent(best, id) {
                return None;
            }
            if id.version > best.version {
                best = id;
            }
        }
        Some(best)
    }
}
