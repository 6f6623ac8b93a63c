//! haloconv - iterated convolution over row bands.
//!
//! ```bash
//! # Blur three times with four workers, printing the elapsed time
//! haloconv run photo.png blur1 4 3 --timed
//!
//! # Sweep worker and iteration counts
//! haloconv bench photo.png 8 10
//!
//! # Run a job described in YAML
//! haloconv config job.yaml
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use common::log_setup::setup_logging;
use haloconv::bench::{run_case, sweep};
use haloconv::io::result_file_name;
use haloconv::{convolve_file, EngineConfig, ErrorKind, HaloSync, KernelPreset, RunConfig};

#[derive(Parser)]
#[command(name = "haloconv")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Also write rolling log files into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Filter one image
    Run {
        image: PathBuf,
        kernel: KernelPreset,
        workers: usize,
        iterations: usize,

        /// Output file (default: result.ppm)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, default_value_t = HaloSync::Relaxed)]
        sync: HaloSync,

        /// Print the elapsed milliseconds
        #[arg(long)]
        timed: bool,
    },

    /// Time blur1 over a sweep of worker and iteration counts
    Bench {
        image: PathBuf,
        max_workers: usize,
        max_iterations: usize,

        /// Directory for the result_{workers}_{iterations}.ppm files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Run a job described in a YAML file
    Config { path: PathBuf },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = setup_logging(&cli.log_level, cli.log_dir.as_deref()) {
        return report(&ErrorKind::InvalidConfiguration.to_string(), &err);
    }

    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let kind = err
                .downcast_ref::<haloconv::Error>()
                .map(|e| e.kind().to_string())
                .unwrap_or_else(|| "error".to_string());
            report(&kind, &err)
        }
    }
}

fn report(kind: &str, err: &anyhow::Error) -> ExitCode {
    eprintln!("error[{}]: {:#}", kind, err);
    ExitCode::FAILURE
}

fn execute(command: Command) -> Result<()> {
    match command {
        Command::Run {
            image,
            kernel,
            workers,
            iterations,
            output,
            sync,
            timed,
        } => {
            let output = output.unwrap_or_else(|| PathBuf::from(result_file_name(None)));
            let config = EngineConfig::new(workers, iterations).with_sync(sync);

            let started = Instant::now();
            convolve_file(&image, &kernel.kernel(), config, &output)?;
            if timed {
                println!("{}", started.elapsed().as_millis());
            }
        }

        Command::Bench {
            image,
            max_workers,
            max_iterations,
            output_dir,
        } => {
            let kernel = KernelPreset::Blur1.kernel();
            for case in sweep(max_workers, max_iterations) {
                let elapsed = run_case(&image, &output_dir, &kernel, case)?;
                println!(
                    "{} {} {}",
                    case.workers,
                    case.iterations,
                    elapsed.as_millis()
                );
            }
        }

        Command::Config { path } => {
            let job = RunConfig::from_yaml_file(&path)?;
            let kernel = job
                .kernel
                .build()
                .with_context(|| format!("Invalid kernel in '{}'", path.display()))?;
            let output = job
                .output
                .unwrap_or_else(|| PathBuf::from(result_file_name(None)));
            convolve_file(&job.input, &kernel, job.engine, &output)?;
        }
    }

    Ok(())
}
