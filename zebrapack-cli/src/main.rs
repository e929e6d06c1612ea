//! # zebrapack
//!
//! CLI tool for generating MessagePack encoders from an identities file.
//!
//! ## Usage
//!
//! ```bash
//! # Generate encoders into ./generated/zebrapack_gen.rs
//! zebrapack generate --input types.json
//!
//! # Use the plain map protocol and print instead of writing
//! zebrapack generate --input types.json --protocol msgp2 --dry-run
//!
//! # Also export a schema descriptor with a fresh schema id
//! zebrapack generate --input types.json --schema schema.json --genid
//!
//! # Schema descriptor only, to stdout
//! zebrapack schema --input types.json --dest -
//!
//! # Initialize configuration
//! zebrapack init
//! ```

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use zebrapack::{write_schema, Protocol, SchemaDest};
use zebrapack_cli::{
    config::{CliArgs, Config, ConfigManager},
    error::CliError,
    generator::EncoderGenerator,
    loader,
    writer::StagedFile,
};

#[derive(Parser)]
#[command(name = "zebrapack")]
#[command(author, version, about = "Generate MessagePack encoders with stable field ids", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProtocolArg {
    /// Zid-keyed maps with a type fingerprint
    Fast,
    /// Name-keyed maps
    Msgp2,
}

impl From<ProtocolArg> for Protocol {
    fn from(arg: ProtocolArg) -> Self {
        match arg {
            ProtocolArg::Fast => Protocol::Fast,
            ProtocolArg::Msgp2 => Protocol::Msgp2,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate encoder source from an identities file
    Generate {
        /// Identities JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory for the generated file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file name
        #[arg(long)]
        file: Option<String>,

        /// Map protocol for structs
        #[arg(short, long, value_enum)]
        protocol: Option<ProtocolArg>,

        /// Emit one write per constant instead of fusing runs
        #[arg(long)]
        no_fuse: bool,

        /// Also write a schema descriptor here ("-" for stdout)
        #[arg(long)]
        schema: Option<String>,

        /// Tag the schema descriptor with a fresh random id
        #[arg(long)]
        genid: bool,

        /// Preview changes without writing files
        #[arg(long)]
        dry_run: bool,

        /// Write output even if some identities fail
        #[arg(long)]
        keep_going: bool,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Export the schema descriptor only
    Schema {
        /// Identities JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Destination ("-" for stdout)
        #[arg(short, long, default_value = "-")]
        dest: String,

        /// Tag the descriptor with a fresh random id
        #[arg(long)]
        genid: bool,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Initialize a new zebrapack configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "zebrapack.toml")]
        output: PathBuf,

        /// Overwrite existing configuration file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e);
            match e {
                CliError::Validation(_) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Generate {
            input,
            output,
            file,
            protocol,
            no_fuse,
            schema,
            genid,
            dry_run,
            keep_going,
            config,
        } => {
            let config = ConfigManager::load(config.as_deref())?;
            let config = ConfigManager::merge_cli_args(
                config,
                &CliArgs {
                    output,
                    output_file: file,
                    protocol: protocol.map(Protocol::from),
                    fuse: no_fuse.then_some(false),
                    schema,
                    genid,
                },
            );
            cmd_generate(&input, config, dry_run, keep_going)
        }

        Commands::Schema {
            input,
            dest,
            genid,
            config,
        } => {
            let config = ConfigManager::load(config.as_deref())?;
            let config = ConfigManager::merge_cli_args(
                config,
                &CliArgs {
                    schema: Some(dest),
                    genid,
                    ..Default::default()
                },
            );
            cmd_schema(&input, config)
        }

        Commands::Init { output, force } => cmd_init(output, force),
    }
}

/// Generate command implementation.
fn cmd_generate(
    input: &PathBuf,
    config: Config,
    dry_run: bool,
    keep_going: bool,
) -> Result<(), CliError> {
    eprintln!("{}", "Loading identities...".cyan());
    let loaded = loader::load(input, &config.directives)?;
    eprintln!(
        "  Found {} identity(ies), {} after passes",
        loaded.declared.to_string().green(),
        loaded.identities.len().to_string().green()
    );

    eprintln!("{}", "Generating encoders...".cyan());
    let output_path = config.output_path();
    let generator = EncoderGenerator::new(config).with_keep_going(keep_going);

    if dry_run {
        let output = generator.generate(&loaded.identities)?;
        report_generated(&output.generated, &output.failures);
        eprintln!(
            "{} Would write to {}:",
            "[dry-run]".yellow(),
            output_path.display()
        );
        println!("{}", "─".repeat(60).dimmed());
        println!("{}", output.content);
        println!("{}", "─".repeat(60).dimmed());
    } else {
        let mut staged = StagedFile::create(&output_path)?;
        let report = generator.generate_into(&loaded.identities, staged.printer())?;
        report_generated(&report.generated, &report.failures);
        let written = staged.commit()?;
        eprintln!(
            "{} Written {} bytes to {}",
            "✓".green(),
            written.bytes,
            written.path.display()
        );
    }

    if let Some(dest) = generator.schema_dest() {
        export_schema(&generator, &loaded.resolved, &dest, dry_run)?;
    }
    Ok(())
}

fn report_generated(generated: &[String], failures: &[zebrapack::Failure]) {
    eprintln!(
        "  Generated {} identity(ies)",
        generated.len().to_string().green()
    );
    for failure in failures {
        eprintln!("  {} {}: {}", "Skipped".yellow(), failure.name, failure.error);
    }
}

/// Schema command implementation.
fn cmd_schema(input: &PathBuf, config: Config) -> Result<(), CliError> {
    let loaded = loader::load(input, &config.directives)?;
    let generator = EncoderGenerator::new(config);
    let dest = generator.schema_dest().unwrap_or(SchemaDest::Stdout);
    export_schema(&generator, &loaded.resolved, &dest, false)
}

fn export_schema(
    generator: &EncoderGenerator,
    identities: &zebrapack::Identities,
    dest: &SchemaDest,
    dry_run: bool,
) -> Result<(), CliError> {
    let schema = generator.schema(identities)?;
    if dry_run && *dest != SchemaDest::Stdout {
        eprintln!("{} Would write schema to {}", "[dry-run]".yellow(), dest);
        return Ok(());
    }
    write_schema(&schema, dest)?;
    if let SchemaDest::Path(path) = dest {
        eprintln!(
            "{} Schema with {} struct(s) written to {}",
            "✓".green(),
            schema.structs.len(),
            path.display()
        );
    }
    Ok(())
}

/// Init command implementation.
fn cmd_init(output: PathBuf, force: bool) -> Result<(), CliError> {
    if output.exists() && !force {
        eprintln!("  Use --force to overwrite");
        return Err(CliError::Validation(format!(
            "Configuration file already exists: {}",
            output.display()
        )));
    }

    let content = ConfigManager::default_config_content();
    std::fs::write(&output, content)?;

    eprintln!(
        "{} Created configuration file: {}",
        "✓".green(),
        output.display()
    );

    Ok(())
}

/// Print an error with formatting.
fn print_error(error: &CliError) {
    eprintln!("{} {}", "Error:".red().bold(), error);
}
