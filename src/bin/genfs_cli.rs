//! GenFS CLI - Bridge interface for build/preview tooling
//!
//! Commands: validate, resolve, graph, policy
//! Outputs JSON to stdout, logs to stderr (RUST_LOG)
//! Returns 2 when a project fails validation

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use genfs_core::{
    GenerationPass, ProjectPolicy, ProjectSession, ProjectValidator, Resolver,
};

#[derive(Parser)]
#[command(name = "genfs-cli")]
#[command(about = "GenFS CLI - Virtual project validator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a policy JSON file (built-in defaults when omitted)
    #[arg(short, long, global = true)]
    policy: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a generation pass and validate it
    Validate {
        /// JSON file holding a GenerationPass
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Resolve one import specifier against the ingested tree
    Resolve {
        #[arg(short, long)]
        input: PathBuf,

        /// Importing file
        #[arg(short, long)]
        from: String,

        /// Import specifier, e.g. @/components/Button
        #[arg(short, long)]
        specifier: String,
    },

    /// Print every local import edge
    Graph {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Print the effective policy
    Policy,
}

fn fail(message: impl std::fmt::Display) -> ExitCode {
    let output = serde_json::json!({ "success": false, "error": message.to_string() });
    println!("{}", output);
    ExitCode::FAILURE
}

fn load_pass(input: &Path) -> Result<GenerationPass, String> {
    let content = fs::read_to_string(input)
        .map_err(|e| format!("Failed to read {}: {}", input.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("Invalid generation pass: {}", e))
}

fn ingest(validator: ProjectValidator, input: &Path) -> Result<ProjectSession, String> {
    let pass = load_pass(input)?;
    let mut session = ProjectSession::new(validator);
    session.ingest(&pass).map_err(|e| e.to_string())?;
    Ok(session)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn respond<T: serde::Serialize>(value: &T) -> ExitCode {
    match print_json(value) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let policy = match &cli.policy {
        Some(file) => match ProjectPolicy::load(file) {
            Ok(p) => p,
            Err(e) => return fail(format!("Failed to load policy: {}", e)),
        },
        None => ProjectPolicy::default(),
    };

    let validator = match ProjectValidator::new(policy) {
        Ok(v) => v,
        Err(e) => return fail(e),
    };

    match cli.command {
        Commands::Validate { input } => {
            let mut session = match ingest(validator, &input) {
                Ok(s) => s,
                Err(e) => return fail(e),
            };

            match session.validate() {
                Ok(project) => match print_json(project) {
                    Ok(()) if project.passed() => ExitCode::SUCCESS,
                    Ok(()) => ExitCode::from(2),  // Validation failure
                    Err(e) => fail(e),
                },
                Err(e) => fail(e),
            }
        }

        Commands::Resolve { input, from, specifier } => {
            let session = match ingest(validator, &input) {
                Ok(s) => s,
                Err(e) => return fail(e),
            };
            let policy = session.validator().policy();
            let resolver = Resolver::with_extensions(session.tree(), &policy.resolution_extensions);
            let resolution = resolver.resolve(&from, &specifier);

            respond(&serde_json::json!({
                "from": from,
                "specifier": specifier,
                "resolved": resolution.path(),
            }))
        }

        Commands::Graph { input } => {
            let session = match ingest(validator, &input) {
                Ok(s) => s,
                Err(e) => return fail(e),
            };
            let policy = session.validator().policy();
            let edges = Resolver::with_extensions(session.tree(), &policy.resolution_extensions)
                .import_graph();
            respond(&edges)
        }

        Commands::Policy => respond(validator.policy()),
    }
}
