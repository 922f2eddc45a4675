mod scenarios;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use scenarios::{ScenarioResult, list_scenarios, run_scenario};

#[derive(Debug, Parser)]
#[command(name = "taskdelve-tester", version = "0.1.0")]
#[command(about = "Scripted QA scenarios for the Taskdelve progression engine")]
struct Args {
    /// Scenarios to run (comma-separated), or "all"
    #[arg(long, default_value = "all")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["console", "json"])]
    report: String,

    /// Optional path to write the report instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.list_scenarios {
        for name in list_scenarios() {
            println!("{name}");
        }
        return Ok(());
    }

    let names = expand_scenarios(&args.scenarios);
    let mut results = Vec::new();
    for name in &names {
        let result = run_scenario(name).with_context(|| format!("scenario {name:?} failed to run"))?;
        results.push(result);
    }

    match args.report.as_str() {
        "json" => write_json_report(&args, &results)?,
        _ => print_console_report(&args, &results),
    }

    if results.iter().all(ScenarioResult::passed) {
        Ok(())
    } else {
        anyhow::bail!("one or more scenarios failed")
    }
}

fn expand_scenarios(input: &str) -> Vec<String> {
    if input.trim() == "all" {
        return list_scenarios().iter().map(ToString::to_string).collect();
    }
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn print_console_report(args: &Args, results: &[ScenarioResult]) {
    let mut passed = 0usize;
    for result in results {
        let banner = if result.passed() {
            "PASS".green().bold()
        } else {
            "FAIL".red().bold()
        };
        println!("{banner} {}", result.name.bold());
        for check in &result.checks {
            if check.passed {
                passed += 1;
                if args.verbose {
                    println!("  {} {}", "ok".green(), check.label);
                }
            } else {
                println!("  {} {}", "failed".red(), check.label);
            }
        }
    }
    let total: usize = results.iter().map(|r| r.checks.len()).sum();
    println!("{passed}/{total} checks passed across {} scenarios", results.len());
}

fn write_json_report(args: &Args, results: &[ScenarioResult]) -> Result<()> {
    let rendered = serde_json::to_string_pretty(results)?;
    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating report file {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            writer.write_all(rendered.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
