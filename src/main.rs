use clap::{Parser, Subcommand};
use std::io::{self, Write};
use stock_a_future_client::{
    client::StockApiClient,
    config::AppConfig,
    demo::{DemoRunner, RunOutcome},
    report,
    utils::{init_logger, MAX_LOOKBACK_DAYS},
};

#[derive(Parser)]
#[command(name = "stock-a-future")]
#[command(version, about = "Demo client for the Stock-A-Future market data API")]
pub struct Cli {
    /// API base URL (overrides STOCK_API_BASE_URL / config file)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the demonstration sequence (default)
    Demo {
        /// Stock code to query, repeatable
        #[arg(short, long = "stock")]
        stocks: Vec<String>,
        /// Maximum number of stocks to query
        #[arg(long)]
        max_stocks: Option<usize>,
        /// Daily data lookback window in days
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=i64::from(MAX_LOOKBACK_DAYS)))]
        days: Option<u32>,
    },
    /// Check server health
    Health {
        /// Ask the server to probe its upstream data source
        #[arg(long)]
        check_connection: bool,
    },
    /// Fetch daily price bars
    Daily {
        stock_code: String,
        /// Start date (YYYYMMDD)
        #[arg(long)]
        start: Option<String>,
        /// End date (YYYYMMDD)
        #[arg(long)]
        end: Option<String>,
    },
    /// Fetch technical indicators
    Indicators { stock_code: String },
    /// Fetch buy/sell predictions
    Predictions { stock_code: String },
    /// Fetch basic stock information
    Basic { stock_code: String },
    /// Search stocks by code or name
    Search {
        keyword: String,
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger()?;

    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    let command = cli.command.unwrap_or(Commands::Demo {
        stocks: Vec::new(),
        max_stocks: None,
        days: None,
    });

    let (stocks, max_stocks, days) = match &command {
        Commands::Demo {
            stocks,
            max_stocks,
            days,
        } => (stocks.clone(), *max_stocks, *days),
        _ => (Vec::new(), None, None),
    };
    config.apply_overrides(cli.base_url, stocks, max_stocks, days)?;

    let client = StockApiClient::new(config.client_config())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Demo { .. } => {
            let outcome = DemoRunner::new(&client, &config).run(&mut out).await?;
            // Every outcome exits normally; the report already explains failures
            match outcome {
                RunOutcome::Completed { stocks } => {
                    tracing::info!(stocks, "Demo run completed")
                }
                RunOutcome::ServiceUnavailable | RunOutcome::ConnectionFailed => {
                    tracing::warn!(?outcome, "Demo run stopped at health check")
                }
            }
        }
        Commands::Health { check_connection } => {
            let request = client.health_request(check_connection)?;
            dump(&client, &mut out, "Health check", request).await?;
        }
        Commands::Daily {
            stock_code,
            start,
            end,
        } => {
            let request = client.daily_request(&stock_code, start.as_deref(), end.as_deref())?;
            dump(&client, &mut out, "Daily data", request).await?;
        }
        Commands::Indicators { stock_code } => {
            let request = client.stock_request(&stock_code, "indicators")?;
            dump(&client, &mut out, "Indicators", request).await?;
        }
        Commands::Predictions { stock_code } => {
            let request = client.stock_request(&stock_code, "predictions")?;
            dump(&client, &mut out, "Predictions", request).await?;
        }
        Commands::Basic { stock_code } => {
            let request = client.stock_request(&stock_code, "basic")?;
            dump(&client, &mut out, "Stock basic", request).await?;
        }
        Commands::Search { keyword, limit } => {
            let request = client.search_request(&keyword, limit)?;
            dump(&client, &mut out, "Search", request).await?;
        }
    }

    Ok(())
}

// Single-endpoint commands print the server's JSON untouched
async fn dump<W: Write>(
    client: &StockApiClient,
    out: &mut W,
    title: &str,
    request: reqwest::Request,
) -> io::Result<()> {
    let response = client.fetch_raw(request).await;
    report::write_envelope(out, title, response)
}
