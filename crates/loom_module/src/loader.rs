//! Loading module files from disk.

use std::path::{Path, PathBuf};

use crate::codec::decode_module;
use crate::error::ModuleError;
use crate::identity::ModuleIdentity;
use crate::image::{ModuleImage, TypeDef};

/// A module read from disk, or one of the built-in baselines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedModule {
    location: Option<PathBuf>,
    image: ModuleImage,
}

impl LoadedModule {
    /// Wraps an in-memory image that has no backing file.
    pub fn in_memory(image: ModuleImage) -> Self {
        Self {
            location: None,
            image,
        }
    }

    /// The file the module was loaded from, if any.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// The module's identity.
    pub fn identity(&self) -> &ModuleIdentity {
        &self.image.identity
    }

    /// The decoded image.
    pub fn image(&self) -> &ModuleImage {
        &self.image
    }

    /// Every type the module defines.
    pub fn types(&self) -> &[TypeDef] {
        &self.image.types
    }

    /// Looks up a type by full name.
    pub fn find_type(&self, full_name: &str) -> Option<&TypeDef> {
        self.image.find_type(full_name)
    }

    /// See [`ModuleImage::public_surface`].
    pub fn public_surface(&self) -> Vec<String> {
        self.image.public_surface()
    }
}

/// Reads and validates the module at `path`.
pub fn load_module(path: &Path) -> Result<LoadedModule, ModuleError> {
    let raw = std::fs::read(path).map_err(|e| ModuleError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let image = decode_module(&raw, path)?;
    Ok(LoadedModule {
        location: Some(path.to_path_buf()),
        image,
    })
}
