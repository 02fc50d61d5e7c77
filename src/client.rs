use crate::{
    error::ClientError,
    models::{ApiResponse, DailyBar, Indicators, PredictionSet, StockBasic, StockSearch},
    utils::Timer,
};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_USER_AGENT: &str =
    concat!("StockAFuture-Rust-Client/", env!("CARGO_PKG_VERSION"));

const API_PREFIX: &str = "/api/v1";

/// Immutable connection settings shared by every request.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    base_url: String,
    user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Client for the Stock-A-Future REST API.
///
/// Every call is a single GET with no retries or caching. The body is decoded
/// whatever the HTTP status; callers decide what a failed envelope means.
pub struct StockApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl StockApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}{}", self.config.base_url, API_PREFIX, path)
    }

    fn stock_endpoint(&self, stock_code: &str, resource: &str) -> String {
        self.endpoint(&format!("/stocks/{}/{}", stock_code, resource))
    }

    pub fn health_request(&self, check_connection: bool) -> Result<reqwest::Request, ClientError> {
        let mut builder = self.http.get(self.endpoint("/health"));
        if check_connection {
            builder = builder.query(&[("check_connection", "true")]);
        }
        Ok(builder.build()?)
    }

    pub fn daily_request(
        &self,
        stock_code: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<reqwest::Request, ClientError> {
        let params = date_params(start_date, end_date);
        let mut builder = self.http.get(self.stock_endpoint(stock_code, "daily"));
        if !params.is_empty() {
            builder = builder.query(&params);
        }
        Ok(builder.build()?)
    }

    /// `GET /api/v1/stocks/{code}/{resource}` with no query string.
    pub fn stock_request(
        &self,
        stock_code: &str,
        resource: &str,
    ) -> Result<reqwest::Request, ClientError> {
        Ok(self.http.get(self.stock_endpoint(stock_code, resource)).build()?)
    }

    pub fn search_request(
        &self,
        keyword: &str,
        limit: Option<usize>,
    ) -> Result<reqwest::Request, ClientError> {
        let mut params = vec![("q", keyword.to_string())];
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        Ok(self.http.get(self.endpoint("/stocks/search")).query(&params).build()?)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::Request,
    ) -> Result<ApiResponse<T>, ClientError> {
        let url = request.url().to_string();
        let timer = Timer::start(&format!("GET {}", url));

        let response = self.http.execute(request).await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        timer.log_elapsed();
        debug!(%url, status, bytes = text.len(), "Received response");

        let body = serde_json::from_str(&text).map_err(|source| ClientError::Decode {
            url: url.clone(),
            source,
        })?;

        Ok(ApiResponse { status, body })
    }

    /// Execute any prepared request and keep the payload as untyped JSON, so
    /// fields the typed models leave out survive a dump.
    pub async fn fetch_raw(
        &self,
        request: reqwest::Request,
    ) -> Result<ApiResponse<Value>, ClientError> {
        self.execute(request).await
    }

    /// `GET /api/v1/health`
    pub async fn health_check(&self) -> Result<ApiResponse<Value>, ClientError> {
        self.execute(self.health_request(false)?).await
    }

    /// Health check that asks the server to probe its upstream data source.
    pub async fn health_check_with_connection(&self) -> Result<ApiResponse<Value>, ClientError> {
        self.execute(self.health_request(true)?).await
    }

    /// `GET /api/v1/stocks/{code}/daily`, dates as YYYYMMDD.
    /// Empty date strings are treated as absent.
    pub async fn get_daily_data(
        &self,
        stock_code: &str,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<ApiResponse<Vec<DailyBar>>, ClientError> {
        self.execute(self.daily_request(stock_code, start_date, end_date)?)
            .await
    }

    pub async fn get_indicators(
        &self,
        stock_code: &str,
    ) -> Result<ApiResponse<Indicators>, ClientError> {
        self.execute(self.stock_request(stock_code, "indicators")?).await
    }

    pub async fn get_predictions(
        &self,
        stock_code: &str,
    ) -> Result<ApiResponse<PredictionSet>, ClientError> {
        self.execute(self.stock_request(stock_code, "predictions")?).await
    }

    pub async fn get_stock_basic(
        &self,
        stock_code: &str,
    ) -> Result<ApiResponse<StockBasic>, ClientError> {
        self.execute(self.stock_request(stock_code, "basic")?).await
    }

    /// The server caps `limit` at 50 and defaults to 10.
    pub async fn search_stocks(
        &self,
        keyword: &str,
        limit: Option<usize>,
    ) -> Result<ApiResponse<StockSearch>, ClientError> {
        self.execute(self.search_request(keyword, limit)?).await
    }
}

fn date_params<'a>(
    start_date: Option<&'a str>,
    end_date: Option<&'a str>,
) -> Vec<(&'static str, &'a str)> {
    [("start_date", start_date), ("end_date", end_date)]
        .into_iter()
        .filter_map(|(key, value)| value.filter(|v| !v.is_empty()).map(|v| (key, v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn build_client(base_url: &str) -> StockApiClient {
        StockApiClient::new(ClientConfig::new(base_url)).unwrap()
    }

    #[test]
    fn test_trailing_slashes_are_stripped() {
        let config = ClientConfig::new("http://localhost:8080//");
        assert_eq!(config.base_url(), "http://localhost:8080");
        assert_eq!(ClientConfig::default().base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_daily_request_with_both_dates() {
        let client = build_client("http://localhost:8080/");
        let request = client
            .daily_request("000001.SZ", Some("20240101"), Some("20240111"))
            .unwrap();
        assert_eq!(request.url().path(), "/api/v1/stocks/000001.SZ/daily");
        assert_eq!(
            request.url().query(),
            Some("start_date=20240101&end_date=20240111")
        );
    }

    #[test]
    fn test_daily_request_omits_missing_and_empty_dates() {
        let client = build_client("http://localhost:8080");

        let request = client.daily_request("600000.SH", None, None).unwrap();
        assert_eq!(request.url().path(), "/api/v1/stocks/600000.SH/daily");
        assert_eq!(request.url().query(), None);

        let request = client.daily_request("600000.SH", Some(""), Some("20240111")).unwrap();
        assert_eq!(request.url().query(), Some("end_date=20240111"));

        let request = client.daily_request("600000.SH", Some("20240101"), Some("")).unwrap();
        assert_eq!(request.url().query(), Some("start_date=20240101"));
    }

    #[test]
    fn test_search_request_limit_is_optional() {
        let client = build_client("http://localhost:8080");
        let request = client.search_request("bank", None).unwrap();
        assert_eq!(request.url().path(), "/api/v1/stocks/search");
        assert_eq!(request.url().query(), Some("q=bank"));

        let request = client.search_request("bank", Some(5)).unwrap();
        assert_eq!(request.url().query(), Some("q=bank&limit=5"));
    }

    #[test]
    fn test_health_request_check_connection() {
        let client = build_client("http://localhost:8080");
        assert_eq!(client.health_request(false).unwrap().url().query(), None);
        assert_eq!(
            client.health_request(true).unwrap().url().query(),
            Some("check_connection=true")
        );
    }

    #[tokio::test]
    async fn test_default_headers_are_sent() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v1/health")
                    .header("content-type", "application/json")
                    .header("user-agent", DEFAULT_USER_AGENT);
                then.status(200).json_body(json!({"success": true}));
            })
            .await;

        let client = build_client(&server.base_url());
        let response = client.health_check().await.unwrap();

        mock.assert_async().await;
        assert!(response.is_healthy());
    }

    #[tokio::test]
    async fn test_body_is_decoded_regardless_of_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/stocks/BAD/indicators");
                then.status(400)
                    .json_body(json!({"success": false, "error": "invalid stock code"}));
            })
            .await;

        let client = build_client(&server.base_url());
        let response = client.get_indicators("BAD").await.unwrap();

        assert_eq!(response.status, 400);
        assert!(matches!(response.into_data(), Err(ClientError::Api(msg)) if msg == "invalid stock code"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/stocks/000001.SZ/predictions");
                then.status(200).body("<html>gateway timeout</html>");
            })
            .await;

        let client = build_client(&server.base_url());
        let error = client.get_predictions("000001.SZ").await.unwrap_err();

        match error {
            ClientError::Decode { url, .. } => {
                assert!(url.ends_with("/api/v1/stocks/000001.SZ/predictions"))
            }
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_transport_error() {
        let client = build_client("http://127.0.0.1:1");
        let error = client.health_check().await.unwrap_err();
        assert!(matches!(error, ClientError::Transport(_)));
    }

    #[tokio::test]
    async fn test_fetch_raw_keeps_unmodelled_fields() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/stocks/000001.SZ/indicators");
                then.status(200).json_body(json!({
                    "success": true,
                    "data": {
                        "macd": {"dif": 0.1, "dea": 0.05, "signal": "HOLD"},
                        "kdj": {"k": 55.2, "d": 50.1, "j": 65.4},
                        "ma": {"ma5": 10.2, "ma20": 10.0}
                    }
                }));
            })
            .await;

        let client = build_client(&server.base_url());
        let request = client.stock_request("000001.SZ", "indicators").unwrap();
        let response = client.fetch_raw(request).await.unwrap();

        let data = response.into_data().unwrap();
        assert_eq!(data["kdj"]["k"], json!(55.2));
        assert_eq!(data["ma"]["ma20"], json!(10.0));
    }

    #[tokio::test]
    async fn test_search_and_basic() {
        let server = MockServer::start_async().await;
        let search = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/api/v1/stocks/search")
                    .query_param("q", "平安")
                    .query_param("limit", "3");
                then.status(200).json_body(json!({
                    "success": true,
                    "data": {
                        "keyword": "平安",
                        "total": 1,
                        "stocks": [{"ts_code": "000001.SZ", "name": "平安银行"}]
                    }
                }));
            })
            .await;
        let basic = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/stocks/000001.SZ/basic");
                then.status(200).json_body(json!({
                    "success": true,
                    "data": {"ts_code": "000001.SZ", "symbol": "000001", "name": "平安银行", "industry": "银行"}
                }));
            })
            .await;

        let client = build_client(&server.base_url());
        let found = client.search_stocks("平安", Some(3)).await.unwrap().into_data().unwrap();
        let info = client.get_stock_basic("000001.SZ").await.unwrap().into_data().unwrap();

        search.assert_async().await;
        basic.assert_async().await;
        assert_eq!(found.total, 1);
        assert_eq!(found.stocks[0].name, "平安银行");
        assert_eq!(info.industry, "银行");
        assert_eq!(info.area, "");
    }
}
