//! sysdl CLI — check, inspect, and synthesize system-interface catalogues.

mod commands;
mod registry_file;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sysdl", version, about = "System-interface catalogue toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a catalogue and report every defect
    Check {
        /// Catalogue file
        catalogue: PathBuf,
        /// Registry TOML file
        #[arg(long)]
        registry: PathBuf,
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List operations, parameter roles, and resource kinds
    Show {
        /// Catalogue file
        catalogue: PathBuf,
        /// Registry TOML file
        #[arg(long)]
        registry: PathBuf,
    },
    /// Synthesize one operation or an ordered sequence
    Synth {
        /// Catalogue file
        catalogue: PathBuf,
        /// Operation keys (`name` or `name@variant`), in call order
        #[arg(required = true)]
        ops: Vec<String>,
        /// Registry TOML file
        #[arg(long)]
        registry: PathBuf,
        /// RNG seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
        /// Bias scalar choices toward domain boundaries
        #[arg(long)]
        boundary: bool,
        /// Fix a scalar parameter: `name=value` (decimal or 0x hex)
        #[arg(long = "pin")]
        pins: Vec<String>,
        /// Fix a buffer's element count: `name=count`
        #[arg(long = "pin-len")]
        len_pins: Vec<String>,
        /// Deliberately violate the named parameter's constraint
        #[arg(long)]
        invalid: Option<String>,
        /// Emit assignments as JSON
        #[arg(long)]
        json: bool,
    },
    /// Registry helpers
    Registry {
        #[command(subcommand)]
        action: RegistryAction,
    },
}

#[derive(Subcommand)]
enum RegistryAction {
    /// Print a commented example registry TOML
    Template,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sysdl=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Check {
            catalogue,
            registry,
            json,
        } => commands::check::run(&catalogue, &registry, json),
        Commands::Show {
            catalogue,
            registry,
        } => commands::show::run(&catalogue, &registry),
        Commands::Synth {
            catalogue,
            ops,
            registry,
            seed,
            boundary,
            pins,
            len_pins,
            invalid,
            json,
        } => commands::synth::run(
            &catalogue,
            &registry,
            &ops,
            seed,
            boundary,
            &pins,
            &len_pins,
            invalid.as_deref(),
            json,
        ),
        Commands::Registry {
            action: RegistryAction::Template,
        } => {
            print!("{}", registry_file::template());
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}
