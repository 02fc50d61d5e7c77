use crate::error::ClientError;
use serde::{Deserialize, Deserializer, Serialize};

/// The `{success, data, error}` wrapper every endpoint answers with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    // No `default` here: it would put a `T: Default` bound on Deserialize
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// Server-provided error text, or a fallback literal.
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("Unknown error")
    }

    pub fn into_data(self) -> Result<T, ClientError> {
        if !self.success {
            return Err(ClientError::Api(self.error_message().to_string()));
        }
        self.data.ok_or(ClientError::MissingData)
    }
}

/// Decoded envelope together with the HTTP status it arrived with.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub body: Envelope<T>,
}

impl<T> ApiResponse<T> {
    pub fn is_success_status(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Both the transport status and the envelope report success.
    pub fn is_healthy(&self) -> bool {
        self.is_success_status() && self.body.success
    }

    pub fn into_data(self) -> Result<T, ClientError> {
        self.body.into_data()
    }
}

// The server's decimal type serialises as a number, but older builds sent strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            NumberOrString::Number(value) => Ok(value),
            NumberOrString::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid decimal: {:?}", text))),
        }
    }
}

fn de_decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    NumberOrString::deserialize(deserializer)?.into_f64()
}

fn de_opt_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumberOrString>::deserialize(deserializer)?
        .map(NumberOrString::into_f64)
        .transpose()
}

/// One daily price bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts_code: Option<String>,
    pub trade_date: String, // YYYYMMDD
    #[serde(default, deserialize_with = "de_opt_decimal", skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_decimal", skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_decimal", skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(deserialize_with = "de_decimal")]
    pub close: f64,
    #[serde(default, deserialize_with = "de_opt_decimal", skip_serializing_if = "Option::is_none")]
    pub pre_close: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_decimal", skip_serializing_if = "Option::is_none")]
    pub change: Option<f64>,
    #[serde(deserialize_with = "de_decimal")]
    pub pct_chg: f64,
    #[serde(default, deserialize_with = "de_opt_decimal", skip_serializing_if = "Option::is_none")]
    pub vol: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_decimal", skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Macd {
    #[serde(deserialize_with = "de_decimal")]
    pub dif: f64,
    #[serde(deserialize_with = "de_decimal")]
    pub dea: f64,
    #[serde(default, deserialize_with = "de_opt_decimal", skip_serializing_if = "Option::is_none")]
    pub histogram: Option<f64>,
    pub signal: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rsi {
    #[serde(alias = "rsi14", deserialize_with = "de_decimal")]
    pub rsi12: f64,
    pub signal: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boll {
    #[serde(deserialize_with = "de_decimal")]
    pub upper: f64,
    #[serde(deserialize_with = "de_decimal")]
    pub middle: f64,
    #[serde(deserialize_with = "de_decimal")]
    pub lower: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<String>,
}

/// Indicator snapshot. Each block is present only when the server computed it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macd: Option<Macd>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsi: Option<Rsi>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boll: Option<Boll>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "type")]
    pub kind: String, // BUY / SELL
    #[serde(deserialize_with = "de_decimal")]
    pub price: f64,
    #[serde(deserialize_with = "de_decimal")]
    pub probability: f64,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionSet {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
    /// 0..=1
    #[serde(default, deserialize_with = "de_opt_decimal")]
    pub confidence: Option<f64>,
}

impl PredictionSet {
    pub fn confidence_or_zero(&self) -> f64 {
        self.confidence.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockBasic {
    pub ts_code: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub area: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub market: String,
    #[serde(default)]
    pub list_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSearch {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub stocks: Vec<StockBasic>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_defaults_to_failure() {
        let envelope: Envelope<serde_json::Value> = serde_json::from_value(json!({})).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.error_message(), "Unknown error");
        assert!(matches!(envelope.into_data(), Err(ClientError::Api(msg)) if msg == "Unknown error"));
    }

    fn decode_envelope<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Envelope<T> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_envelope_decodes_for_any_payload_type() {
        let bars: Envelope<Vec<DailyBar>> = decode_envelope(json!({"success": true}));
        assert!(bars.data.is_none());

        let basic: Envelope<StockBasic> = decode_envelope(json!({
            "success": true,
            "data": {"ts_code": "600000.SH"}
        }));
        assert_eq!(basic.into_data().unwrap().ts_code, "600000.SH");
    }

    #[test]
    fn test_envelope_success_without_data() {
        let envelope: Envelope<Vec<DailyBar>> =
            serde_json::from_value(json!({"success": true})).unwrap();
        assert!(matches!(envelope.into_data(), Err(ClientError::MissingData)));
    }

    #[test]
    fn test_daily_bar_accepts_numeric_strings() {
        let bar: DailyBar = serde_json::from_value(json!({
            "ts_code": "000001.SZ",
            "trade_date": "20240105",
            "close": "10.52",
            "pct_chg": -1.25,
            "vol": null
        }))
        .unwrap();
        assert_eq!(bar.close, 10.52);
        assert_eq!(bar.pct_chg, -1.25);
        assert_eq!(bar.vol, None);
        assert_eq!(bar.open, None);
    }

    #[test]
    fn test_daily_bar_rejects_garbage_decimal() {
        let result: Result<DailyBar, _> = serde_json::from_value(json!({
            "trade_date": "20240105",
            "close": "n/a",
            "pct_chg": 0
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_rsi_accepts_rsi14_alias() {
        let rsi: Rsi = serde_json::from_value(json!({"rsi14": 0, "signal": "HOLD"})).unwrap();
        assert_eq!(rsi.rsi12, 0.0);
    }

    #[test]
    fn test_indicators_missing_blocks_are_none() {
        let indicators: Indicators = serde_json::from_value(json!({
            "macd": {"dif": 0.1, "dea": 0.05, "signal": "GOLDEN_CROSS"},
            "boll": null
        }))
        .unwrap();
        assert!(indicators.macd.is_some());
        assert!(indicators.rsi.is_none());
        assert!(indicators.boll.is_none());
    }

    #[test]
    fn test_prediction_set_defaults() {
        let set: PredictionSet = serde_json::from_value(json!({})).unwrap();
        assert!(set.predictions.is_empty());
        assert_eq!(set.confidence_or_zero(), 0.0);
    }

    #[test]
    fn test_api_response_health_requires_2xx() {
        let body: Envelope<serde_json::Value> =
            serde_json::from_value(json!({"success": true})).unwrap();
        let degraded = ApiResponse { status: 503, body: body.clone() };
        let healthy = ApiResponse { status: 200, body };
        assert!(!degraded.is_healthy());
        assert!(healthy.is_healthy());
    }
}
