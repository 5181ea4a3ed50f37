use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sapling_cli::{format_report, inspect, open_session, render, to_json, transform, CliOptions};

#[derive(Debug, Parser)]
#[command(name = "sapling", version = sapling_core::VERSION, about = "Inspect and rewrite JavaScript syntax trees")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Maximum nesting depth a traversal may reach
    #[arg(long, global = true, value_name = "DEPTH")]
    max_depth: Option<usize>,

    /// Defer scope crawling until a scope is queried
    #[arg(long, global = true)]
    noscope: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render the program as source text
    Print {
        /// AST file in JSON form
        file: PathBuf,
    },
    /// Report scopes, completion records and inferred identifier types
    Inspect {
        file: PathBuf,
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run built-in rewrite rules
    Transform {
        file: PathBuf,
        /// Rule to run (strict-mode, constant-inliner); repeatable
        #[arg(short, long = "rule", value_name = "NAME", required = true)]
        rules: Vec<String>,
        /// Emit the rewritten AST as JSON instead of source
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        sapling_core::init_tracing_with("sapling_core=debug");
    } else {
        sapling_core::init_tracing();
    }

    let options = CliOptions { max_depth: cli.max_depth, noscope: cli.noscope };

    match cli.command {
        Command::Print { file } => {
            let session = open_session(&file, &options)?;
            println!("{}", render(&session));
        }
        Command::Inspect { file, json } => {
            let mut session = open_session(&file, &options)?;
            let report = inspect(&mut session)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", format_report(&report));
            }
        }
        Command::Transform { file, rules, json } => {
            let mut session = open_session(&file, &options)?;
            let summary = transform(&mut session, &rules)?;
            if json {
                println!("{}", to_json(&session)?);
            } else {
                println!("{}", render(&session));
            }
            if cli.verbose {
                eprintln!("{} mutations from {} rules", summary.mutations, summary.rules_run);
            }
        }
    }

    Ok(())
}
