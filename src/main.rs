use clap::{Arg, ArgMatches, Command};
use log::LevelFilter;
use std::path::Path;
use std::process;

use mail_guardian::classify::KeywordClassifier;
use mail_guardian::config::Config;
use mail_guardian::processor::{BatchSummary, Pipeline};
use mail_guardian::store::SqliteStore;

const DEFAULT_CONFIG_PATH: &str = "mail-guardian.yaml";

fn main() {
    let matches = Command::new("mail-guardian")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Email metadata triage: admin rules, risk scoring, classification, case management")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Write a default configuration file and exit")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("database")
                .long("database")
                .value_name("FILE")
                .help("Override the configured database path"),
        )
        .arg(
            Arg::new("limit")
                .long("limit")
                .value_name("N")
                .value_parser(clap::value_parser!(u32))
                .default_value("100")
                .help("Maximum number of emails to process"),
        )
        .arg(
            Arg::new("offset")
                .long("offset")
                .value_name("N")
                .value_parser(clap::value_parser!(u32))
                .default_value("0")
                .help("Offset into the pending email set"),
        )
        .arg(
            Arg::new("email-id")
                .long("email-id")
                .value_name("ID")
                .value_parser(clap::value_parser!(i64))
                .help("Process a single email by id"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Evaluate without persisting dispositions or cases")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(path) = matches.get_one::<String>("generate-config") {
        generate_default_config(path);
        return;
    }

    let mut config = match load_config(matches.get_one::<String>("config")) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };
    if let Some(database) = matches.get_one::<String>("database") {
        config.database_path = database.clone();
    }

    if let Err(e) = run(&config, &matches) {
        eprintln!("Processing failed: {e}");
        process::exit(1);
    }
}

fn run(config: &Config, matches: &ArgMatches) -> anyhow::Result<()> {
    let limit = *matches.get_one::<u32>("limit").unwrap();
    let offset = *matches.get_one::<u32>("offset").unwrap();
    let dry_run = matches.get_flag("dry-run");

    let store = SqliteStore::open(&config.database_path)?;
    let classifier = KeywordClassifier::default();
    let pipeline = Pipeline::new(&store, &classifier, config)?;

    if let Some(&email_id) = matches.get_one::<i64>("email-id") {
        let result = pipeline.process_single(email_id, !dry_run)?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if dry_run {
        let results = pipeline.dry_run(limit, offset)?;
        let mut summary = BatchSummary::default();
        for result in &results {
            summary.record(result.disposition);
        }
        println!("{}", serde_json::to_string_pretty(&results)?);
        print_summary(&summary);
        return Ok(());
    }

    let summary = pipeline.process_batch(limit, offset)?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    println!("Email processing complete");
    println!("  Processed:      {}", summary.processed);
    println!("  Escalated:      {}", summary.escalated);
    println!("  Cleared:        {}", summary.cleared);
    println!("  Excluded:       {}", summary.excluded);
    println!("  Whitelisted:    {}", summary.whitelisted);
    println!("  Pending review: {}", summary.pending_review);
    if !summary.errors.is_empty() {
        println!("  Errors:");
        for error in &summary.errors {
            println!("    - {error}");
        }
    }
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => println!("Default configuration written to {path}"),
        Err(e) => {
            eprintln!("Error writing configuration: {e}");
            process::exit(1);
        }
    }
}

fn load_config(path: Option<&String>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => {
            if Path::new(DEFAULT_CONFIG_PATH).exists() {
                Config::from_file(DEFAULT_CONFIG_PATH)
            } else {
                log::info!("no configuration file found, using built-in defaults");
                Ok(Config::default())
            }
        }
    }
}
