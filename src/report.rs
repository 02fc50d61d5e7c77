use crate::error::ClientError;
use crate::models::{ApiResponse, DailyBar, Indicators, PredictionSet};
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};

pub const BANNER_WIDTH: usize = 50;

/// Pretty-print any serializable value. Non-ASCII text is written as-is.
pub fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T, title: &str) -> io::Result<()> {
    if !title.is_empty() {
        writeln!(out, "\n=== {} ===", title)?;
    }
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)
}

pub fn write_header<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "Stock-A-Future API Rust client demo")?;
    writeln!(out, "{}", "=".repeat(BANNER_WIDTH))
}

pub fn write_stock_banner<W: Write>(out: &mut W, stock_code: &str) -> io::Result<()> {
    let rule = "=".repeat(20);
    writeln!(out, "\n{} Stock: {} {}", rule, stock_code, rule)
}

/// `what` names the step, e.g. "daily data".
pub fn write_failure<W: Write>(out: &mut W, what: &str, error: &ClientError) -> io::Result<()> {
    match error {
        ClientError::Api(message) => writeln!(out, "❌ Failed to fetch {}: {}", what, message),
        other => writeln!(out, "❌ Error fetching {}: {}", what, other),
    }
}

pub fn write_daily<W: Write>(out: &mut W, bars: &[DailyBar]) -> io::Result<()> {
    writeln!(out, "✅ Fetched {} daily bars", bars.len())?;
    if let Some(latest) = bars.last() {
        writeln!(out, "   Latest: {}", latest.trade_date)?;
        writeln!(out, "   Close: {}", latest.close)?;
        writeln!(out, "   Change: {}%", latest.pct_chg)?;
    }
    Ok(())
}

pub fn write_indicators<W: Write>(out: &mut W, indicators: &Indicators) -> io::Result<()> {
    writeln!(out, "✅ Technical indicators:")?;

    if let Some(macd) = &indicators.macd {
        writeln!(
            out,
            "   MACD: DIF={}, DEA={}, signal={}",
            macd.dif, macd.dea, macd.signal
        )?;
    }
    if let Some(rsi) = &indicators.rsi {
        writeln!(out, "   RSI: RSI12={}, signal={}", rsi.rsi12, rsi.signal)?;
    }
    if let Some(boll) = &indicators.boll {
        writeln!(
            out,
            "   BOLL: upper={}, middle={}, lower={}",
            boll.upper, boll.middle, boll.lower
        )?;
    }
    Ok(())
}

pub fn write_predictions<W: Write>(out: &mut W, set: &PredictionSet) -> io::Result<()> {
    writeln!(
        out,
        "✅ Buy/sell predictions (confidence: {:.2}%):",
        set.confidence_or_zero() * 100.0
    )?;

    for prediction in &set.predictions {
        writeln!(
            out,
            "   {} - price: {}, probability: {:.1}%, reason: {}",
            prediction.kind,
            prediction.price,
            prediction.probability * 100.0,
            prediction.reason
        )?;
    }

    if set.predictions.is_empty() {
        writeln!(out, "   No clear buy/sell signal at the moment")?;
    }
    Ok(())
}

/// Dump a whole envelope as returned by the server, then flag a failed one.
/// Transport and decode errors are printed, never returned.
pub fn write_envelope<W: Write>(
    out: &mut W,
    title: &str,
    response: Result<ApiResponse<Value>, ClientError>,
) -> io::Result<()> {
    match response {
        Ok(response) => {
            write_json(out, &response.body, title)?;
            if !response.body.success {
                writeln!(out, "❌ {} failed: {}", title, response.body.error_message())?;
            } else if !response.is_success_status() {
                writeln!(out, "❌ {} returned HTTP {}", title, response.status)?;
            }
            Ok(())
        }
        Err(e) => write_failure(out, &title.to_lowercase(), &e),
    }
}

pub fn write_footer<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "\n{}", "=".repeat(BANNER_WIDTH))?;
    writeln!(out, "Demo finished!")?;
    writeln!(out, "\n💡 Tips:")?;
    writeln!(out, "- Make sure the server has a valid Tushare token configured")?;
    writeln!(out, "- Free accounts are rate limited, use the API sparingly")?;
    writeln!(out, "- Predictions are for reference only and are not investment advice")
}
