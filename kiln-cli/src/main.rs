//! Kiln CLI - Command line interface
//!
//! Project-based execution - all configuration comes from `kiln.json`

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process;

mod config;
mod logging;
mod platform;

use crate::config::{LogConfig, Project};
use crate::logging::CLI_TARGET;
use crate::platform::print_error_with_source;
use kiln_api::{get_config, init_config, load_program, run_with_input, RunConfig, SliceStatus};

#[derive(Parser)]
#[command(
    name = "kiln",
    about = "Kiln runtime - runs compiled programs under a simulated host clock",
    version = "0.1.0"
)]
struct Cli {
    /// Project file path (default: ./kiln.json)
    #[arg(value_name = "PROJECT", default_value = "kiln.json")]
    project: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let project = match Project::read(&cli.project) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let (logger, crash_log) = logging::init(&LogConfig::from_project(&project, &cli.project));

    let entry_path = Project::resolve(&cli.project, &project.entry);
    let source = match std::fs::read_to_string(&entry_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: Cannot read entry program '{}': {}", entry_path.display(), e);
            process::exit(1);
        }
    };

    init_config(RunConfig {
        cpu: project.cpu.clone(),
        limits: project.limits.clone(),
        fixed_delta: project.host.fixed_delta,
        frame_delta: project.host.frame_delta,
        max_ticks: project.host.max_ticks,
        dump_program: project.dump_program,
        logger,
    });
    tracing::info!(target: CLI_TARGET, entry = %entry_path.display(), "running");

    let project_dir = cli.project.parent().unwrap_or(Path::new("."));
    let program = match load_program(&source) {
        Ok(program) => program,
        Err(e) => {
            print_error_with_source(&e, project_dir);
            process::exit(1);
        }
    };

    match run_with_input(program, get_config(), &project.input) {
        Ok(output) => {
            for line in &output.output {
                println!("{line}");
            }
            for nag in &output.nags {
                eprintln!("warning: {nag}");
            }
            if output.status == SliceStatus::Broken {
                eprintln!("Program aborted.");
            }
            tracing::info!(target: CLI_TARGET, ticks = output.ticks, status = ?output.status, "done");
        }
        Err(e) => {
            print_error_with_source(&e, project_dir);
            if !crash_log.is_empty() {
                eprintln!("\nrecent runtime log:\n{}", crash_log.dump());
            }
            process::exit(1);
        }
    }
}
