//! Command-line interface for the Rive compiler.

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rive_cli::commands;

#[derive(Parser)]
#[command(name = "rive")]
#[command(author, version, about = "The Rive programming language", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable stage-level compiler logging (also via RIVE_LOG).
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new Rive project
    #[command(visible_alias = "n")]
    New {
        /// Name of the project to create
        name: String,
    },

    /// Initialize a Rive project in the current directory
    Init,

    /// Compile the current project
    #[command(visible_alias = "b")]
    Build {
        /// Build with optimizations
        #[arg(long)]
        release: bool,
    },

    /// Build and execute the current project
    #[command(visible_alias = "r")]
    Run {
        /// Build with optimizations
        #[arg(long)]
        release: bool,
    },

    /// Check the current project for errors
    Check {
        /// Print the intermediate representation instead of checking only
        #[arg(long)]
        emit_rir: bool,
    },

    /// Remove the target directory
    Clean,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Some(Commands::New { name }) => commands::new::execute(&name),
        Some(Commands::Init) => commands::init::execute(),
        Some(Commands::Build { release }) => commands::build::execute(release),
        Some(Commands::Run { release }) => commands::run::execute(release),
        Some(Commands::Check { emit_rir }) => commands::check::execute(emit_rir),
        Some(Commands::Clean) => commands::clean::execute(),
        None => {
            print_usage();
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("{}: {err}", "error".red().bold());
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("RIVE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_usage() {
    println!(
        "{} {} {}",
        "Usage:".green().bold(),
        "rive".cyan().bold(),
        "[command]".cyan()
    );
    println!();
    println!("Commands:");
    println!(
        "    {}, {}    Compile the current project",
        "build".cyan().bold(),
        "b".cyan().bold()
    );
    println!(
        "    {}       Check the current project for errors",
        "check".cyan().bold()
    );
    println!(
        "    {}       Remove the target directory",
        "clean".cyan().bold()
    );
    println!(
        "    {}        Initialize a Rive project in an existing directory",
        "init".cyan().bold()
    );
    println!(
        "    {}, {}      Create a new Rive project",
        "new".cyan().bold(),
        "n".cyan().bold()
    );
    println!(
        "    {}, {}      Build and execute the current project",
        "run".cyan().bold(),
        "r".cyan().bold()
    );
    println!();
    println!(
        "See '{} {}{}' for more information on a specific command.",
        "rive help".cyan().bold(),
        "<".cyan(),
        "command>".cyan()
    );
}
