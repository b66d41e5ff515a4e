use std::process;

use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use terminfeed::WebScraper;
use terminfeed::config::Config;
use terminfeed::feed::build_feed;

#[derive(Parser)]
#[command(name = "terminfeed")]
#[command(about = "Scrape the event portal and print events or an iCal feed", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the current and next month and print the normalized events
    Events {
        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Scrape the current and next month and print the iCalendar document
    Feed,
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let config = Config::from_env().unwrap_or_else(|e| {
        log::error!("Invalid configuration: {}", e);
        process::exit(1);
    });

    let scraper = WebScraper::new(&config.portal_url, config.summary_order).unwrap_or_else(|e| {
        log::error!("Error creating scraper: {}", e);
        process::exit(1);
    });

    let today = Local::now().date_naive();
    let events = scraper.scrape_events(today).await.unwrap_or_else(|e| {
        log::error!("Error scraping events: {}", e);
        process::exit(1);
    });

    match cli.command {
        Commands::Events { format } => match format {
            OutputFormat::Json => serialize_json(&events),
            OutputFormat::Text => {
                if events.is_empty() {
                    println!("No events to display.");
                } else {
                    for (i, event) in events.iter().enumerate() {
                        println!("{:>3}. {}", i + 1, event);
                    }
                }
            }
        },
        Commands::Feed => {
            print!("{}", build_feed(&events, &config.feed_name, &config.timezone));
        }
    }
}
