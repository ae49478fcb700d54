//! apiscope CLI
//!
//! Command-line interface for analyzing Swagger 2.0 / OpenAPI 3.x contracts
//! into a JSON analysis and a Markdown API reference.

use anyhow::{Context, Result};
use apiscope::summary::render_summary;
use apiscope::{logging, AnalyzeOptions, AppConfig, ArtifactWriter, Orchestrator, SourceLoader};
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "apiscope")]
#[command(version, about = "Analyze Swagger/OpenAPI contracts into JSON and Markdown references", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a contract and write the JSON and Markdown artifacts
    #[command(after_help = "EXAMPLES:\n  \
        # Analyze a local Swagger 2.0 file\n  \
        apiscope analyze ./petstore.yaml\n\n  \
        # Analyze a remote OpenAPI 3 document, Markdown only\n  \
        apiscope analyze https://petstore3.swagger.io/api/v3/openapi.json \\\n    \
        --no-json \\\n    \
        --ui-url https://petstore3.swagger.io\n\n  \
        # Write into a custom directory\n  \
        apiscope analyze ./openapi.json --output ./docs/api")]
    Analyze {
        /// URL or path of the contract document
        source: String,

        /// Link to an interactive documentation UI, added to the Markdown
        #[arg(long)]
        ui_url: Option<String>,

        /// Skip the JSON analysis artifact
        #[arg(long)]
        no_json: bool,

        /// Skip the Markdown reference artifact
        #[arg(long)]
        no_markdown: bool,

        /// Output directory (overrides the config file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        settings: SettingsArgs,
    },

    /// Analyze a contract and print a text summary without writing files
    #[command(after_help = "EXAMPLES:\n  \
        apiscope inspect ./petstore.yaml\n  \
        apiscope inspect https://petstore.swagger.io/v2/swagger.json")]
    Inspect {
        /// URL or path of the contract document
        source: String,

        #[command(flatten)]
        settings: SettingsArgs,
    },
}

#[derive(Args)]
struct SettingsArgs {
    /// YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Network timeout in seconds (overrides the config file)
    #[arg(long)]
    timeout: Option<u64>,

    /// Accept invalid TLS certificates from remote sources
    #[arg(long)]
    insecure: bool,
}

impl SettingsArgs {
    fn resolve(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref()).context("Failed to load config")?;
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        if self.insecure {
            config.verify_tls = false;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose)?;

    if cli.verbose {
        println!("{} Verbose mode enabled", "→".cyan());
    }

    match cli.command {
        Commands::Analyze {
            source,
            ui_url,
            no_json,
            no_markdown,
            output,
            settings,
        } => {
            let mut config = settings.resolve()?;
            if let Some(output) = output {
                config.output_dir = output;
            }
            let options = AnalyzeOptions {
                emit_json: !no_json,
                emit_markdown: !no_markdown,
                ui_url,
            };
            analyze_command(&source, &config, &options, cli.verbose)?;
        }
        Commands::Inspect { source, settings } => {
            inspect_command(&source, &settings.resolve()?)?;
        }
    }

    Ok(())
}

fn analyze_command(
    source: &str,
    config: &AppConfig,
    options: &AnalyzeOptions,
    verbose: bool,
) -> Result<()> {
    println!("{} Analyzing contract: {}", "→".cyan(), source);

    if verbose {
        println!("  Output: {}", config.output_dir.display());
        println!("  Timeout: {}s", config.timeout_secs);
        if !config.verify_tls {
            println!("  TLS verification: {}", "disabled".yellow());
        }
    }

    let loader = SourceLoader::new(config).context("Failed to create document loader")?;
    let output = Orchestrator::new(loader)
        .analyze(source, options)
        .with_context(|| format!("Failed to analyze {}", source))?;

    println!(
        "{} Detected {} with {} endpoints and {} schemas",
        "→".cyan(),
        output.dialect.to_string().yellow(),
        output.endpoint_count,
        output.schema_count
    );

    if !output.diagnostics.is_empty() {
        println!(
            "{} {} diagnostics recorded",
            "!".yellow().bold(),
            output.diagnostics.len()
        );
        if verbose {
            for diagnostic in &output.diagnostics {
                println!("  • {}", diagnostic);
            }
        }
    }

    let written = ArtifactWriter::new(config).write(&output)?;

    println!("\n{}", "✓ Analysis complete!".green().bold());
    if written.is_empty() {
        println!("  No artifacts requested");
    } else {
        println!("\n{}", "Generated files:".bold());
        for path in &written {
            println!("  📄 {}", path.display());
        }
    }

    Ok(())
}

fn inspect_command(source: &str, config: &AppConfig) -> Result<()> {
    println!("{} Inspecting contract: {}", "→".cyan(), source);

    let options = AnalyzeOptions {
        emit_json: false,
        emit_markdown: false,
        ui_url: None,
    };
    let loader = SourceLoader::new(config).context("Failed to create document loader")?;
    let output = Orchestrator::new(loader)
        .analyze(source, &options)
        .with_context(|| format!("Failed to analyze {}", source))?;

    println!("\n{}", "✓ Inspection complete!".green().bold());
    println!();
    print!("{}", render_summary(&output));

    Ok(())
}
