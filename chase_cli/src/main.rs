use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chart_parser::ParseOptions;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use log::LevelFilter;

mod replay;

#[derive(Debug, Parser)]
#[command(name = "chase")]
#[command(about = "Chart parser and chase game replay CLI", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a .chart file and write it as JSON
    Parse {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Extra instrument/difficulty section to read
        #[arg(long = "section")]
        sections: Vec<String>,
    },
    /// Print metadata, tempo and note counts
    Inspect { input: PathBuf },
    /// Judge recorded inputs against a chart
    Replay {
        chart: PathBuf,
        #[arg(long)]
        inputs: PathBuf,
        #[arg(long, default_value = chart_schema::EXPERT_SINGLE)]
        difficulty: String,
        #[arg(long, value_enum, default_value_t = ModeArg::Single)]
        mode: ModeArg,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum ModeArg {
    Single,
    Differential,
    FixedRate,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Parse {
            input,
            output,
            sections,
        } => {
            let options = sections
                .into_iter()
                .fold(ParseOptions::default(), |opts, name| opts.with_section(name));
            let chart = chart_parser::parse_file_with_options(&input, &options)
                .with_context(|| format!("parse failed: {}", input.display()))?;

            let json = serde_json::to_string_pretty(&chart).context("failed to serialize chart")?;
            let out_path = output.unwrap_or_else(|| default_output_path(&input));
            fs::write(&out_path, json)
                .with_context(|| format!("failed to write: {}", out_path.display()))?;
        }
        Command::Inspect { input } => {
            let chart = chart_parser::parse_file(&input)
                .with_context(|| format!("parse failed: {}", input.display()))?;
            print!("{}", replay::describe(&chart));
        }
        Command::Replay {
            chart,
            inputs,
            difficulty,
            mode,
            config,
        } => {
            let args = replay::ReplayArgs {
                chart,
                inputs,
                difficulty,
                mode,
                config,
            };
            replay::run(&args)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    // RUST_LOG, when set, overrides the flag.
    let _ = env_logger::builder()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

fn default_output_path(input: &Path) -> PathBuf {
    let mut out = input.to_path_buf();
    out.set_extension("chart.json");
    out
}
