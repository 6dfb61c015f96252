// Command-line entry point for glint.

use std::path::PathBuf;
use std::process;

use clap::Parser;

use glint::application::{self, InstrumentConfig};
use glint::infrastructure::concurrency;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Coverage profile produced by the test run (go test -coverprofile)
    #[arg(short, long)]
    coverage: PathBuf,

    /// Module path prefix of the file names inside the profile
    #[arg(short, long)]
    module: String,

    /// Directory holding the profiled source tree
    #[arg(short = 'i', long)]
    src: PathBuf,

    /// Output root for the instrumented tree
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Identifier called by every inserted sentinel statement
    #[arg(short = 'f', long, default_value = "panic")]
    func: String,

    /// Worker count; defaults to all cores
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Write a JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = concurrency::init_thread_pool(cli.jobs) {
        eprintln!("glint: {:#}", e);
        process::exit(1);
    }

    let config = InstrumentConfig {
        coverage: cli.coverage,
        module: cli.module,
        src_dir: cli.src,
        out_dir: cli.out,
        sentinel: cli.func,
    };

    match application::run(&config) {
        Ok(summary) => {
            eprintln!(
                "glint: instrumented {} files ({} fully covered, {} statements wrapped)",
                summary.files_instrumented, summary.files_skipped, summary.statements_wrapped
            );
            if let Some(path) = &cli.report {
                if let Err(e) = application::write_report(path, &summary) {
                    eprintln!("glint: {:#}", e);
                    process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("glint: {:#}", e);
            process::exit(1);
        }
    }
}
