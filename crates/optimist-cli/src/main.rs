//! `optimist` command-line entry point

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use optimist_cli::{init_tracing, run_scroll, run_search, run_todo, OptimistConfig};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

fn cli() -> Command {
    Command::new("optimist")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Optimistic UI controllers against simulated backends")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("info")
                .help("Log filter when RUST_LOG is unset"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs and the report as JSON"),
        )
        .subcommand(
            Command::new("todo")
                .about("Create, toggle and delete todos optimistically")
                .arg(
                    Arg::new("fail")
                        .long("fail")
                        .action(ArgAction::SetTrue)
                        .help("Turn on failure mode before toggling and deleting"),
                )
                .arg(
                    Arg::new("items")
                        .num_args(1..)
                        .default_values(["Buy milk", "Walk the dog", "Write tests"])
                        .help("Todo texts to create"),
                ),
        )
        .subcommand(Command::new("scroll").about("Scroll a paginated feed to the end"))
        .subcommand(
            Command::new("search")
                .about("Type queries into a debounced search box")
                .arg(
                    Arg::new("keystroke-ms")
                        .long("keystroke-ms")
                        .default_value("80")
                        .value_parser(value_parser!(u64))
                        .help("Delay between typed characters"),
                )
                .arg(
                    Arg::new("queries")
                        .num_args(1..)
                        .default_values(["ap", "berry", "xyz"])
                        .help("Queries to type"),
                ),
        )
}

fn strings(args: &ArgMatches, id: &str) -> Vec<String> {
    args.get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn print_report<R: Serialize>(
    report: &R,
    json: bool,
    text: impl FnOnce(&R) -> String,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", text(report));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    let json = matches.get_flag("json");
    let level = matches
        .get_one::<String>("log-level")
        .map_or("info", String::as_str);
    init_tracing(level, json)?;

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => OptimistConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => OptimistConfig::default(),
    };

    match matches.subcommand() {
        Some(("todo", args)) => {
            let items = strings(args, "items");
            let report = run_todo(&config.backend, &items, args.get_flag("fail")).await?;
            print_report(&report, json, |r| r.generate_text())?;
        }
        Some(("scroll", _)) => {
            let report = run_scroll(&config.feed).await?;
            print_report(&report, json, |r| r.generate_text())?;
        }
        Some(("search", args)) => {
            let keystroke = args.get_one::<u64>("keystroke-ms").copied().unwrap_or(80);
            let queries = strings(args, "queries");
            let report =
                run_search(&config.search, &queries, Duration::from_millis(keystroke)).await?;
            print_report(&report, json, |r| r.generate_text())?;
        }
        _ => unreachable!("subcommand is required"),
    }
    Ok(())
}
