//! # deep-copy
//!
//! CLI tool for generating deep-copy methods for Go types.
//!
//! ## Usage
//!
//! ```bash
//! # Print DeepCopy methods for two types of the package in ./game
//! deep-copy --type Player,Basic ./game
//!
//! # Write them next to the sources, leaving Player.Ctl shallow
//! deep-copy --type Player --skip Ctl -o ./game/deepcopy_gen.go ./game
//!
//! # Value receivers and a custom method name
//! deep-copy --type Player --pointer-receiver=false --method Clone ./game
//!
//! # Fail (exit code 2) when the generated file is out of date
//! deep-copy --type Player -o ./game/deepcopy_gen.go --check ./game
//!
//! # Write a default configuration file
//! deep-copy --init
//! ```

use clap::{ArgAction, Parser};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use deep_copy::{Generation, Generator, OutputMode, TypeOracle};
use deep_copy_cli::{
    config::{parse_skip_lists, CliArgs, ConfigManager, CONFIG_FILENAME},
    error::CliError,
    loader::PackageLoader,
    scanner::SourceScanner,
    writer::{OutputWriter, WriteResult},
};

#[derive(Parser)]
#[command(name = "deep-copy")]
#[command(author, version, about = "Generate deep-copy methods for Go types", long_about = None)]
struct Cli {
    /// Go package directory, a .go file, or a glob of .go files
    #[arg(value_name = "PACKAGE", required_unless_present = "init")]
    package: Option<String>,

    /// Root type to generate a method for (repeatable, comma-separated)
    #[arg(
        long = "type",
        value_name = "NAME",
        value_delimiter = ',',
        required_unless_present = "init"
    )]
    types: Vec<String>,

    /// Comma-separated fields to copy shallowly, one occurrence per --type entry
    #[arg(long, value_name = "FIELDS")]
    skip: Vec<String>,

    /// Output file ("-" for stdout)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Generate pointer-receiver methods [default: true]
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    pointer_receiver: Option<bool>,

    /// Stop generating nested methods past this depth (0 = unlimited)
    #[arg(long, value_name = "N")]
    maxdepth: Option<usize>,

    /// Name of the generated method [default: DeepCopy]
    #[arg(long, value_name = "NAME")]
    method: Option<String>,

    /// Deep-copy unexported fields too
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    export_private: Option<bool>,

    /// Append to the output file instead of replacing it
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    append: Option<bool>,

    /// Configuration file path
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Compare the output file with freshly generated code instead of writing it
    #[arg(long)]
    check: bool,

    /// Print the generation plan to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Suppress progress output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Write a default configuration file and exit
    #[arg(
        long,
        value_name = "PATH",
        num_args = 0..=1,
        default_missing_value = CONFIG_FILENAME,
        conflicts_with_all = ["package", "types"]
    )]
    init: Option<PathBuf>,
}

/// Progress reporting on stderr; stdout may carry generated code.
struct Progress {
    quiet: bool,
}

impl Progress {
    fn step(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", message.cyan());
        }
    }

    fn detail(&self, message: String) {
        if !self.quiet {
            eprintln!("  {message}");
        }
    }

    fn warn(&self, message: String) {
        if !self.quiet {
            eprintln!("{} {}", "Warning:".yellow(), message);
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

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

fn run(cli: Cli) -> Result<(), CliError> {
    if let Some(path) = cli.init {
        return cmd_init(&path);
    }

    let progress = Progress { quiet: cli.quiet };

    let config = ConfigManager::load(cli.config.as_deref())?;
    let config = ConfigManager::merge_cli_args(
        config,
        &CliArgs {
            method: cli.method,
            pointer_receiver: cli.pointer_receiver,
            export_private: cli.export_private,
            max_depth: cli.maxdepth,
            output: cli.output,
            append: cli.append,
        },
    );
    config.validate()?;
    let destination = config.destination();

    let generator = Generator::new(config.generator_config(parse_skip_lists(&cli.skip)));

    // Scan and load the package
    let package = cli.package.unwrap_or_default();
    progress.step(&format!("Scanning {package}..."));

    // Appending keeps the destination's declarations part of the package.
    let exclude = match generator.config().mode {
        OutputMode::Truncate => destination,
        OutputMode::Append => None,
    };
    let files = SourceScanner::new(&package).with_exclude(exclude).scan()?;
    progress.detail(format!("Found {} Go file(s)", files.len().to_string().green()));

    let universe = PackageLoader::new().load(&files)?;
    progress.detail(format!(
        "Loaded package {} with {} type(s)",
        universe.package_name().green(),
        universe.len().to_string().green()
    ));

    // Plan and render
    progress.step("Generating copy methods...");

    let generation = generator.generate(&universe, &cli.types)?;

    report_generation(&progress, &generation);
    if cli.verbose {
        print_plan(&generation)?;
    }

    // Write output
    let writer = OutputWriter::new(cli.check);
    match writer.write(&generator, &generation.unit, destination)? {
        WriteResult::Written {
            path: Some(path),
            bytes,
            wrote_header,
        } => {
            let verb = if wrote_header { "Written" } else { "Appended" };
            progress.detail(format!(
                "{} {} {} bytes to {}",
                "✓".green(),
                verb,
                bytes,
                path.display()
            ));
        }
        WriteResult::Written { path: None, .. } => {}
        WriteResult::Checked {
            path,
            up_to_date: true,
        } => {
            progress.detail(format!("{} {} is up-to-date", "✓".green(), path.display()));
        }
        WriteResult::Checked {
            path,
            up_to_date: false,
        } => {
            return Err(CliError::Validation(format!(
                "{} is out of date, run deep-copy without --check to update",
                path.display()
            )));
        }
    }

    Ok(())
}

/// Summarize what was generated.
fn report_generation(progress: &Progress, generation: &Generation) {
    let report = &generation.report;
    progress.detail(format!(
        "Generated {} method(s) for {}",
        report.routines.len().to_string().green(),
        report.routines.join(", ")
    ));
    if !report.provided.is_empty() {
        progress.detail(format!(
            "Calling existing methods of {}",
            report.provided.join(", ")
        ));
    }
    for unused in &report.unused_selectors {
        progress.warn(format!(
            "skip selector {}.{} matches no field",
            unused.root, unused.field
        ));
    }
}

/// Dump the report and plan as JSON on stderr.
fn print_plan(generation: &Generation) -> Result<(), CliError> {
    let report = serde_json::to_string_pretty(&generation.report).map_err(std::io::Error::from)?;
    let plan = serde_json::to_string_pretty(&generation.plan).map_err(std::io::Error::from)?;
    eprintln!("{}", "Report:".cyan());
    eprintln!("{report}");
    eprintln!("{}", "Plan:".cyan());
    eprintln!("{plan}");
    Ok(())
}

/// Init implementation.
fn cmd_init(output: &Path) -> Result<(), CliError> {
    if output.exists() {
        return Err(CliError::Validation(format!(
            "Configuration file already exists: {}",
            output.display()
        )));
    }

    std::fs::write(output, ConfigManager::default_config_content())?;

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
