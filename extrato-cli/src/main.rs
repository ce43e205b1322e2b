use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use extrato_export::{ColumnPolicy, SheetFormat};
use extrato_ingest::{pdf, LineClass, StatementParser};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod convert;
mod state;

#[derive(Parser, Debug)]
#[command(name = "extrato", version, about = "Bank statement PDF to spreadsheet converter")]
struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (default: ~/.extrato/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one or more statements (PDF or extracted text) to spreadsheets
    Convert {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file, or directory when converting several inputs
        #[arg(long, short)]
        out: Option<PathBuf>,

        /// Print records and diagnostics as JSON instead of writing sheets
        #[arg(long)]
        json: bool,

        /// Leave the Saldo column out
        #[arg(long)]
        no_balance: bool,

        /// Write semicolon-separated CSV instead of .xlsx
        #[arg(long)]
        csv: bool,
    },

    /// Show how every line of a statement is classified
    Inspect {
        input: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Manage ~/.extrato/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config
    Show,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        build = env!("EXTRATO_BUILD_SHA"),
        "extrato"
    );

    match cli.command {
        Command::Convert {
            inputs,
            out,
            json,
            no_balance,
            csv,
        } => {
            let mut cfg = config::load_config(cli.config.as_deref())?;
            if no_balance {
                cfg.output.include_balance = ColumnPolicy::Never;
            }
            if csv {
                cfg.output.format = SheetFormat::Csv;
            }
            run_convert(cfg, inputs, out, json).await?;
        }

        Command::Inspect { input, json } => {
            let cfg = config::load_config(cli.config.as_deref())?;
            let parser = StatementParser::new(&cfg.parser).context("compile parser")?;
            let lines = pdf::read_statement_lines(&input)?;
            let inspected = parser.inspect(lines);

            if json {
                println!("{}", serde_json::to_string_pretty(&inspected)?);
            } else {
                for i in &inspected {
                    let detail = match &i.class {
                        LineClass::Transaction { fields } => format!("[{}]", fields.tier),
                        _ => String::new(),
                    };
                    println!(
                        "{:>3}:{:<4} {:<12}{:<10} {}",
                        i.line.page + 1,
                        i.line.line + 1,
                        i.class.label(),
                        detail,
                        i.line.text
                    );
                }
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config(cli.config.as_deref())?;
                print!("{}", toml::to_string_pretty(&cfg)?);
            }
        },
    }

    Ok(())
}

async fn run_convert(
    cfg: config::Config,
    inputs: Vec<PathBuf>,
    out: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    if let Some(dir) = out.as_deref().filter(|_| inputs.len() > 1) {
        std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    }

    let parser = Arc::new(StatementParser::new(&cfg.parser).context("compile parser")?);
    let jobs = convert::plan_jobs(&inputs, out.as_deref(), cfg.output.format.extension());
    let results = convert::convert_all(parser, Arc::new(cfg.output), jobs, json).await;

    let mut reports = Vec::new();
    let mut failed = 0usize;
    for (job, result) in results {
        match result {
            Ok(report) => {
                if let Some(output) = &report.output {
                    println!(
                        "{} -> {} ({})",
                        job.input.display(),
                        output.display(),
                        report.summary
                    );
                }
                reports.push(report);
            }
            Err(e) => {
                error!("{e:#}");
                failed += 1;
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    if failed > 0 {
        bail!("{failed} of {} statements failed", inputs.len());
    }
    Ok(())
}
