//! The fixed compilation settings.

use loom_module::{IdentityComparer, ModuleIdentity, OptimizationLevel, OutputKind, Version};
use loom_source::ParseOptions;

/// Settings every compile runs under.
///
/// Generated modules always share one name, are libraries, and are parsed at
/// the latest stable language version. Only the optimization level can be
/// changed, and only to add debug line tables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilerOptions {
    module_name: String,
    output_kind: OutputKind,
    optimization: OptimizationLevel,
    parse: ParseOptions,
    identity: IdentityComparer,
}

impl CompilerOptions {
    /// Name given to every generated module.
    pub const MODULE_NAME: &'static str = "GeneratedModels";

    /// Version given to every generated module.
    pub const MODULE_VERSION: Version = Version::new(1, 0, 0);

    /// Name diagnostics use for the compiled text.
    pub const SOURCE_NAME: &'static str = "GeneratedModels.cs";

    /// The fixed settings: library output, release optimization, latest parse options.
    pub fn fixed() -> Self {
        Self {
            module_name: Self::MODULE_NAME.to_string(),
            output_kind: OutputKind::Library,
            optimization: OptimizationLevel::Release,
            parse: ParseOptions::latest(),
            identity: IdentityComparer,
        }
    }

    /// Returns a copy with a different optimization level.
    pub fn with_optimization(mut self, optimization: OptimizationLevel) -> Self {
        self.optimization = optimization;
        self
    }

    /// Module name.
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Identity stamped on emitted modules.
    pub fn module_identity(&self) -> ModuleIdentity {
        ModuleIdentity::new(self.module_name.clone(), Self::MODULE_VERSION)
    }

    /// Output kind.
    pub fn output_kind(&self) -> OutputKind {
        self.output_kind
    }

    /// Optimization level.
    pub fn optimization(&self) -> OptimizationLevel {
        self.optimization
    }

    /// Parse options.
    pub fn parse_options(&self) -> ParseOptions {
        self.parse
    }

    /// Identity comparison policy.
    pub fn identity_comparer(&self) -> &IdentityComparer {
        &self.identity
    }
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self::fixed()
    }
}
