// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this file,
// You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2018, Olof Kraigher olof.kraigher@gmail.com

use clap::Parser;
use itertools::Itertools;
use std::path::PathBuf;
use std::process::ExitCode;
use vhdl_analyzer::{Config, Diagnostic, MessageLogger, Project, Severity, CONFIG_FILE_NAME};

/// Run vhdl analysis
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The number of threads to use. By default, the maximum is selected based on process cores
    #[arg(short = 'p', long)]
    num_threads: Option<usize>,

    /// Config file in TOML format containing libraries and settings
    #[arg(short, long, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Do not read the configuration of the home folder or of the environment
    #[arg(long)]
    no_external_config: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    if let Err(err) = rayon::ThreadPoolBuilder::new()
        .num_threads(args.num_threads.unwrap_or(0))
        .build_global()
    {
        log::warn!("Could not configure the thread pool: {err}");
    }

    let mut messages = MessageLogger;
    let mut config = Config::default();
    if !args.no_external_config {
        config.load_external_config(&mut messages);
    }
    match Config::read_file_path(&args.config) {
        Ok(project_config) => config.append(&project_config, &mut messages),
        Err(err) => {
            eprintln!("Failed to read config file: {err}");
            return ExitCode::from(2);
        }
    }

    let project = Project::from_config(&config, &mut messages);
    let diagnostics = project.analyse();
    show_diagnostics(&diagnostics);

    if diagnostics
        .iter()
        .any(|diag| diag.default_severity == Severity::Error)
    {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn show_diagnostics(diagnostics: &[Diagnostic]) {
    let diagnostics = diagnostics.iter().map(Diagnostic::show).collect_vec();
    for str in &diagnostics {
        println!("{str}");
    }

    if !diagnostics.is_empty() {
        println!("Found {} diagnostics", diagnostics.len());
    }
}
