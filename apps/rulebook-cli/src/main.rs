//! Rulebook compiler binary
//!
//! Compiles a directory of rule documents into one navigable document.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rulebook_cli::{commands, Config, Overrides};
use rulebook_engine::OutputFormat;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Config file picked up from the working directory when `--config` is absent
const DEFAULT_CONFIG: &str = "rulebook.toml";

#[derive(Parser, Debug)]
#[command(name = "rulebook")]
#[command(version, about = "Compile rule documents into a single guide")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to rulebook.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile rules and write the document
    Compile(InputArgs),
    /// Check rules and manifest without writing anything
    Validate(InputArgs),
    /// Fail if the output file is not what compile would produce
    Check(InputArgs),
    /// Render a JSON document to markdown
    Render {
        /// Compiled document in JSON form
        input: PathBuf,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Directory of rule files
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Section manifest
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Output file; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format: markdown or json
    #[arg(short, long)]
    format: Option<OutputFormat>,
}

impl From<InputArgs> for Overrides {
    fn from(args: InputArgs) -> Self {
        Overrides {
            rules: args.rules,
            manifest: args.manifest,
            output: args.output,
            format: args.format,
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };

    // Logs go to stderr so stdout can carry the document
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Config::from_file(path),
        None if Path::new(DEFAULT_CONFIG).is_file() => Config::from_file(DEFAULT_CONFIG),
        None => Ok(Config::default()),
    }
}

fn run(cli: Cli) -> Result<bool> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Render { input, output } => commands::render(&input, output.as_deref()),
        Command::Compile(args) => commands::compile(&configured(config_path, args)?),
        Command::Validate(args) => commands::validate(&configured(config_path, args)?),
        Command::Check(args) => commands::check(&configured(config_path, args)?),
    }
}

fn configured(config_path: Option<&Path>, args: InputArgs) -> Result<Config> {
    let mut config = load_config(config_path)?;
    Overrides::from(args).apply(&mut config);
    Ok(config)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    tracing::debug!("rulebook v{}", env!("CARGO_PKG_VERSION"));

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
