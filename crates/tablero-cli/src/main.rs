// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use runtime::{DemoRuntime, HttpRuntime};
use std::env;
use std::path::PathBuf;

use tablero_app::detail::{CardDetailScreen, Route};
use tablero_app::ids::{CardId, QueryId};
use tablero_app::list::CardListScreen;
use tablero_tui::{ApiRuntime, ListOutcome};

const DEMO_SEED: u64 = 7;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `tablero --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    init_logging()?;

    if options.demo {
        if options.check_only {
            return Ok(());
        }
        let mut runtime = DemoRuntime::new(DEMO_SEED);
        return run_session(&mut runtime, &options, &config);
    }

    let client = tablero_api::Client::new(config.api_base_url(), config.api_timeout()?)
        .with_context(|| {
            format!(
                "invalid [api] config in {}; fix base_url/timeout values",
                options.config_path.display()
            )
        })?;

    if options.check_only {
        let org = client.ping(config.org_slug()).with_context(|| {
            format!(
                "cannot reach card service at {} as organization {:?}",
                config.api_base_url(),
                config.org_slug()
            )
        })?;
        println!("ok: {} ({})", org.name, org.slug);
        return Ok(());
    }

    let mut runtime = HttpRuntime::new(client, config.org_slug());
    run_session(&mut runtime, &options, &config)
}

/// Screen loop: an optional direct-to-detail entry, then list and detail
/// alternating until the operator quits from the list.
fn run_session<R: ApiRuntime>(
    runtime: &mut R,
    options: &CliOptions,
    config: &Config,
) -> Result<()> {
    let mut next_route = initial_route(options);

    loop {
        if let Some(route) = next_route.take() {
            let mut screen = CardDetailScreen::new(route);
            if let Some(destination) = tablero_tui::run_detail(&mut screen, runtime)? {
                log::info!("left query builder via {destination}");
            }
            continue;
        }

        let start_fav = options.fav || config.start_on_favorites();
        let mut list = CardListScreen::new(start_fav.then_some("fav"));
        match tablero_tui::run_list(&mut list, runtime)? {
            ListOutcome::Quit => return Ok(()),
            ListOutcome::Open(route) => next_route = Some(route),
        }
    }
}

fn initial_route(options: &CliOptions) -> Option<Route> {
    if options.card.is_none() && options.clone_card.is_none() && options.from_query.is_none() {
        return None;
    }
    let card = options.clone_card.or(options.card).map(CardId::new);
    let cloning = options.clone_card.is_some();
    let query = options.from_query.map(QueryId::new);
    Some(Route::from_params(card, cloning, query))
}

/// Logs go to a file so the alternate screen stays clean; `RUST_LOG`
/// controls the level as usual.
fn init_logging() -> Result<()> {
    let log_path = env::temp_dir().join("tablero.log");
    let file = std::fs::File::create(&log_path)
        .with_context(|| format!("create log file {}", log_path.display()))?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    demo: bool,
    show_help: bool,
    fav: bool,
    card: Option<i64>,
    clone_card: Option<i64>,
    from_query: Option<i64>,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        check_only: false,
        demo: false,
        show_help: false,
        fav: false,
        card: None,
        clone_card: None,
        from_query: None,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--fav" => {
                options.fav = true;
            }
            "--card" => {
                options.card = Some(parse_id_arg("--card", iter.next())?);
            }
            "--clone" => {
                options.clone_card = Some(parse_id_arg("--clone", iter.next())?);
            }
            "--from-query" => {
                options.from_query = Some(parse_id_arg("--from-query", iter.next())?);
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn parse_id_arg<S: AsRef<str>>(flag: &str, value: Option<S>) -> Result<i64> {
    let value = value.ok_or_else(|| anyhow::anyhow!("{flag} requires a numeric id"))?;
    value
        .as_ref()
        .parse()
        .with_context(|| format!("{flag} expects a numeric id, got {:?}", value.as_ref()))
}

fn print_help() {
    println!("tablero");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config and service reachability");
    println!("  --demo                   Launch against seeded in-memory data");
    println!("  --fav                    Start the list on favorites");
    println!("  --card <id>              Open a saved card in the query builder");
    println!("  --clone <id>             Open a copy of a saved card");
    println!("  --from-query <id>        Derive a card from a legacy query");
    println!("  --help                   Show this help");
}
