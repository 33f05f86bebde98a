use clap::{Parser, Subcommand};
use log::debug;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use vrs_writer::{config::WriterConfig, inspect, pack, VERSION};

#[derive(Parser, Clone, Debug)]
#[command(version = VERSION, about = "Write and inspect multi-stream record files")]
pub struct Cli {
    #[clap(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Print the streams and records of a file
    Inspect {
        file: PathBuf,

        /// Print the summary as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Build a file from a JSON manifest
    Pack {
        manifest: PathBuf,
        output: PathBuf,

        /// Writer configuration file (default: writer.json in the config directory)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the output in place instead of through a renamed temporary file
        #[arg(long, default_value_t = false)]
        no_atomic: bool,
    },
}

fn main() -> Result<()> {
    let args = Cli::parse();

    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();
    debug!("{:?}", args);

    match args.command {
        Command::Inspect { file, json } => {
            let summary = inspect::summarize(&file).into_diagnostic()?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&summary).into_diagnostic()?
                );
            } else {
                print!("{}", summary);
            }
        }
        Command::Pack {
            manifest,
            output,
            config,
            no_atomic,
        } => {
            let mut writer_config = match config {
                Some(path) => WriterConfig::load(&path),
                None => WriterConfig::load_default(),
            }
            .into_diagnostic()?;
            if no_atomic {
                writer_config.atomic = false;
            }

            let loaded = pack::Manifest::load(&manifest).into_diagnostic()?;
            let base_dir = manifest.parent().map(PathBuf::from).unwrap_or_default();
            let count = pack::pack(&loaded, &base_dir, &output, writer_config).into_diagnostic()?;
            println!("{} records written to {}", count, output.display());
        }
    }

    Ok(())
}
