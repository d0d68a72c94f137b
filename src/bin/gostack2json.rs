// Copyright 2025 RisingWave Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Converts a goroutine dump to JSON.
//!
//! ```text
//! go run ./app 2>&1 | gostack2json
//! gostack2json --report dump.txt
//! ```

use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use gostack_diagnose_tools::goroutine_dump::{parse, DumpReport};
use tracing::debug;

#[derive(Debug, Parser)]
#[command(name = "gostack2json", version, about = "Convert a Go goroutine dump to JSON")]
struct Cli {
    /// Dump to read; standard input when omitted
    file: Option<PathBuf>,

    /// Print JSON on a single line
    #[arg(long)]
    compact: bool,

    /// Print `{"errors": [...], "goroutines": [...]}` instead of just the goroutines
    #[arg(long)]
    report: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let input: Box<dyn Read> = match &cli.file {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        ),
        None => Box::new(io::stdin().lock()),
    };

    let (goroutines, errors) = parse(input);
    debug!(goroutines = goroutines.len(), errors = errors.len(), "parsed dump");

    let report = DumpReport::from_parsed(goroutines, &errors);
    let out = match (cli.report, cli.compact) {
        (true, true) => report.to_json()?,
        (true, false) => report.to_json_pretty()?,
        (false, true) => serde_json::to_string(&report.goroutines)?,
        (false, false) => serde_json::to_string_pretty(&report.goroutines)?,
    };
    println!("{out}");

    if !report.errors.is_empty() {
        for (i, e) in report.errors.iter().enumerate() {
            println!("error {}: {}", i + 1, e);
        }
        bail!("{} errors occurred", report.errors.len());
    }
    Ok(())
}
