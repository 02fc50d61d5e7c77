use crate::{
    client::StockApiClient,
    config::AppConfig,
    error::ClientError,
    report,
    utils::{lookback_window, today_local, Logger},
};
use chrono::NaiveDate;
use std::io::Write;

/// How a demo run ended. None of these is an error for the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { stocks: usize },
    /// The server answered the health check but is not usable.
    ServiceUnavailable,
    /// The health check request itself failed.
    ConnectionFailed,
}

/// Runs the fixed demonstration sequence against a live server.
pub struct DemoRunner<'a> {
    client: &'a StockApiClient,
    config: &'a AppConfig,
    today: NaiveDate,
    logger: Logger,
}

impl<'a> DemoRunner<'a> {
    pub fn new(client: &'a StockApiClient, config: &'a AppConfig) -> Self {
        Self {
            client,
            config,
            today: today_local(),
            logger: Logger::new("demo"),
        }
    }

    /// Pin the date window instead of reading the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub async fn run<W: Write>(&self, out: &mut W) -> anyhow::Result<RunOutcome> {
        report::write_header(out)?;

        match self.client.health_check().await {
            Ok(health) => {
                report::write_json(out, &health.body, "Health check")?;
                if !health.is_healthy() {
                    self.logger.warn(&format!(
                        "health check returned status {} success={}",
                        health.status, health.body.success
                    ));
                    writeln!(out, "❌ API service unavailable, check the server status")?;
                    return Ok(RunOutcome::ServiceUnavailable);
                }
            }
            Err(e @ ClientError::Decode { .. }) => {
                self.logger.warn_with_error("health check returned an unexpected body", &e);
                writeln!(out, "❌ Unexpected response from health check: {}", e)?;
                return Ok(RunOutcome::ServiceUnavailable);
            }
            Err(e) => {
                self.logger.warn_with_error("health check failed", &e);
                writeln!(out, "❌ Connection failed: {}", e)?;
                writeln!(
                    out,
                    "Make sure the API server is running at {}",
                    self.client.config().base_url()
                )?;
                return Ok(RunOutcome::ConnectionFailed);
            }
        }

        let stocks = self.config.demo_stocks();
        for stock_code in stocks {
            self.run_stock(out, stock_code).await?;
        }

        report::write_footer(out)?;
        Ok(RunOutcome::Completed {
            stocks: stocks.len(),
        })
    }

    /// Daily data gates the rest; indicators and predictions fail independently.
    async fn run_stock<W: Write>(&self, out: &mut W, stock_code: &str) -> anyhow::Result<()> {
        report::write_stock_banner(out, stock_code)?;

        let (start_date, end_date) = match lookback_window(self.today, self.config.lookback_days) {
            Ok(window) => window,
            Err(e) => {
                writeln!(out, "❌ Invalid date window: {}", e)?;
                return Ok(());
            }
        };
        self.logger
            .debug(&format!("{} window {}..{}", stock_code, start_date, end_date));

        let daily = self
            .client
            .get_daily_data(stock_code, Some(&start_date), Some(&end_date))
            .await
            .and_then(|response| response.into_data());
        match daily {
            Ok(bars) => report::write_daily(out, &bars)?,
            Err(e) => {
                self.logger.warn_with_error(&format!("{} daily data", stock_code), &e);
                report::write_failure(out, "daily data", &e)?;
                return Ok(());
            }
        }

        let indicators = self
            .client
            .get_indicators(stock_code)
            .await
            .and_then(|response| response.into_data());
        match indicators {
            Ok(indicators) => report::write_indicators(out, &indicators)?,
            Err(e) => {
                self.logger.warn_with_error(&format!("{} indicators", stock_code), &e);
                report::write_failure(out, "indicators", &e)?;
            }
        }

        let predictions = self
            .client
            .get_predictions(stock_code)
            .await
            .and_then(|response| response.into_data());
        match predictions {
            Ok(set) => report::write_predictions(out, &set)?,
            Err(e) => {
                self.logger.warn_with_error(&format!("{} predictions", stock_code), &e);
                report::write_failure(out, "predictions", &e)?;
            }
        }

        Ok(())
    }
}
