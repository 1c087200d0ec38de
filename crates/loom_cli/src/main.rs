//! Loom CLI: compiles generated model sources into cached modules.
//!
//! `loom compile` runs a source file through the module cache and prints the
//! module path; `loom inspect` prints the public surface of a compiled module.

#![warn(missing_docs)]

mod compile;
mod inspect;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use loom_config::LoomConfig;
use tracing_subscriber::EnvFilter;

/// Loom: a generated-model compiler with an on-disk module cache.
#[derive(Parser, Debug)]
#[command(name = "loom", version, about = "Loom generated-model compiler")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// Path to a custom `loom.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a source file into a module, reusing a cached module if present.
    Compile(CompileArgs),
    /// Print the public surface of a compiled module.
    Inspect(InspectArgs),
}

/// Arguments for the `loom compile` subcommand.
#[derive(Parser, Debug)]
pub struct CompileArgs {
    /// Generated source file.
    pub source: PathBuf,

    /// Output module path. Derived from the source content when omitted.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Additional reference modules, on top of those in `loom.toml`.
    #[arg(short, long = "reference")]
    pub references: Vec<PathBuf>,

    /// Output format for diagnostics.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `loom inspect` subcommand.
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Compiled module file.
    pub module: PathBuf,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

impl GlobalArgs {
    /// Loads the configuration named by `--config`, else `./loom.toml` if
    /// present, else the defaults.
    pub fn load_config(&self) -> Result<LoomConfig, loom_config::ConfigError> {
        if let Some(path) = &self.config {
            return loom_config::load_config_file(Path::new(path));
        }
        let cwd = Path::new(".");
        if cwd.join(loom_config::CONFIG_FILE_NAME).is_file() {
            return loom_config::load_config(cwd);
        }
        Ok(LoomConfig::default())
    }
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        config: cli.config,
    };
    init_tracing(&global);

    let result = match cli.command {
        Command::Compile(ref args) => compile::run(args, &global),
        Command::Inspect(ref args) => inspect::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs a stderr subscriber. `RUST_LOG` overrides the flag-derived level.
fn init_tracing(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(global)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(global.color)
        .with_target(false)
        .try_init();
}

fn default_level(global: &GlobalArgs) -> &'static str {
    if global.quiet {
        "error"
    } else if global.verbose {
        "debug"
    } else {
        "warn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn global(quiet: bool, verbose: bool) -> GlobalArgs {
        GlobalArgs {
            quiet,
            verbose,
            color: false,
            config: None,
        }
    }

    #[test]
    fn parse_compile_default() {
        let cli = Cli::parse_from(["loom", "compile", "models.cs"]);
        match cli.command {
            Command::Compile(ref args) => {
                assert_eq!(args.source, PathBuf::from("models.cs"));
                assert!(args.out.is_none());
                assert!(args.references.is_empty());
                assert_eq!(args.format, ReportFormat::Text);
            }
            _ => panic!("expected Compile command"),
        }
    }

    #[test]
    fn parse_compile_with_args() {
        let cli = Cli::parse_from([
            "loom",
            "compile",
            "models.cs",
            "--out",
            "foo.bin",
            "--reference",
            "refs/Shared.lmod",
            "-r",
            "refs/Media.lmod",
            "--format",
            "json",
        ]);
        match cli.command {
            Command::Compile(ref args) => {
                assert_eq!(args.out.as_deref(), Some(Path::new("foo.bin")));
                assert_eq!(
                    args.references,
                    vec![
                        PathBuf::from("refs/Shared.lmod"),
                        PathBuf::from("refs/Media.lmod")
                    ]
                );
                assert_eq!(args.format, ReportFormat::Json);
            }
            _ => panic!("expected Compile command"),
        }
    }

    #[test]
    fn parse_inspect() {
        let cli = Cli::parse_from(["loom", "inspect", "foo.bin"]);
        match cli.command {
            Command::Inspect(ref args) => assert_eq!(args.module, PathBuf::from("foo.bin")),
            _ => panic!("expected Inspect command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["loom", "--quiet", "--color", "never", "inspect", "x"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn parse_config_flag_after_subcommand() {
        let cli = Cli::parse_from(["loom", "compile", "m.cs", "--config", "alt/loom.toml"]);
        assert_eq!(cli.config.as_deref(), Some("alt/loom.toml"));
    }

    #[test]
    fn level_follows_flags() {
        assert_eq!(default_level(&global(true, false)), "error");
        assert_eq!(default_level(&global(false, true)), "debug");
        assert_eq!(default_level(&global(false, false)), "warn");
    }

    #[test]
    fn explicit_config_file_is_loaded() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("custom.toml");
        std::fs::write(&path, "[cache]\ndir = \"modules\"\n").unwrap();
        let mut g = global(false, false);
        g.config = Some(path.to_string_lossy().into_owned());
        let config = g.load_config().unwrap();
        assert_eq!(config.cache.dir, tmp.path().join("modules"));
    }
}
