//! `loom inspect`: print a compiled module's identity and public surface.

use loom_module::{load_module, LoadedModule};

use crate::{GlobalArgs, InspectArgs};

/// Runs the `loom inspect` command.
pub fn run(args: &InspectArgs, _global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let module = load_module(&args.module)?;
    print!("{}", describe(&module));
    Ok(0)
}

fn describe(module: &LoadedModule) -> String {
    let image = module.image();
    let mut out = format!(
        "{} ({:?}, {:?})\n",
        image.identity, image.kind, image.optimization
    );
    if !image.references.is_empty() {
        out.push_str("references:\n");
        for reference in &image.references {
            out.push_str(&format!("  {reference}\n"));
        }
    }
    out.push_str("surface:\n");
    for line in module.public_surface() {
        out.push_str(&format!("  {line}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_module::{ModuleIdentity, ModuleImage, TypeDef, Version};

    #[test]
    fn describe_lists_identity_and_surface() {
        let mut image = ModuleImage::library(ModuleIdentity::new("GeneratedModels", Version::new(1, 0, 0)));
        image
            .references
            .push(ModuleIdentity::new("Loom.Runtime", Version::new(1, 0, 0)));
        image.types.push(TypeDef::class(None, "Foo", None));
        let text = describe(&LoadedModule::in_memory(image));
        assert!(text.starts_with("GeneratedModels, Version=1.0.0 (Library, Release)\n"));
        assert!(text.contains("  Loom.Runtime, Version=1.0.0\n"));
        assert!(text.contains("  public class Foo\n"));
    }
}
