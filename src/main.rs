use anyhow::{Context, Result};
use clap::Parser;
use logstat::{analyzer, report, sources, AnalysisSummary};
use rayon::prelude::*;
use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};
use tracing_subscriber::EnvFilter;

mod bar;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Log file, or a directory of log files. Prompted for when omitted.
    path: Option<PathBuf>,

    /// Entries kept in top_ips and top_longest
    #[clap(long, default_value_t = analyzer::DEFAULT_TOP)]
    top: usize,

    /// Extension of the files picked up from a directory
    #[clap(long, default_value = "log")]
    extension: String,

    /// Files analyzed in parallel (0: one per CPU)
    #[clap(long, default_value_t = 1)]
    jobs: usize,

    /// Print the statistics without writing the JSON files
    #[clap(long)]
    dry_run: bool,
}

fn prompt_path() -> Result<PathBuf> {
    let term = console::Term::stdout();
    term.write_str("Enter path to a log directory or file: ")?;
    let input = if term.is_term() {
        term.read_line()
    } else {
        let mut input = String::new();
        std::io::stdin().read_line(&mut input).map(|_| input)
    }
    .context("read path failed")?;
    Ok(PathBuf::from(input.trim()))
}

fn analyze_all(args: &Cli, files: &[PathBuf]) -> Vec<Result<AnalysisSummary>> {
    let progressbar = bar::get_progress_bar(files.len() as u64, "Analyzing", None);
    let results = files
        .par_iter()
        .map(|file| {
            let res = analyzer::analyze_file(file, args.top);
            progressbar.inc(1);
            res
        })
        .collect();
    progressbar.finish_and_clear();
    results
}

/// Returns the number of files that could not be analyzed or saved
fn run(args: &Cli, path: &Path) -> Result<usize> {
    let files = sources::collect_log_files(path, &args.extension)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs)
        .build()
        .context("build thread pool failed")?;
    let results = pool.install(|| analyze_all(args, &files));

    let mut failed = 0;
    for (file, res) in files.iter().zip(results) {
        let summary = match res {
            Ok(summary) => summary,
            Err(e) => {
                tracing::error!("Skipping {}: {:#}", file.display(), e);
                failed += 1;
                continue;
            }
        };
        if let Err(e) = report::publish(file, &summary, args.dry_run) {
            tracing::error!("Saving statistics of {} failed: {:#}", file.display(), e);
            failed += 1;
        }
    }
    tracing::info!("Processed {} file(s), {} failed", files.len(), failed);
    Ok(failed)
}

fn main() -> ExitCode {
    std::env::set_var(
        "RUST_LOG",
        format!("info,{}", std::env::var("RUST_LOG").unwrap_or_default()),
    );
    let enable_color = std::env::var("NO_COLOR").is_err();
    tracing_subscriber::fmt()
        .with_thread_ids(true)
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(enable_color)
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    tracing::debug!("{:?}", args);

    let path = match &args.path {
        Some(path) => path.clone(),
        None => match prompt_path() {
            Ok(path) => path,
            Err(e) => {
                tracing::error!("{:#}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    match run(&args, &path) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
