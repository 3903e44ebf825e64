//! HTTP client for the ServiceNow Table API.
//!
//! One `TableClient` is built from the resolved configuration and shared by
//! every tool. Requests are plain GETs with basic auth; there are no retries.

pub mod error;
pub mod query;

pub use error::ClientError;
pub use query::TableQuery;

use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Connection settings for one instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub instance_url: String,
    pub username: String,
    pub password: String,
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            instance_url: String::new(),
            username: String::new(),
            password: String::new(),
            timeout_seconds: 30,
        }
    }
}

/// Envelope every Table API response is wrapped in.
#[derive(Debug, Deserialize)]
struct TableResponse<T> {
    result: T,
}

/// Read-only client for `/api/now/table`.
pub struct TableClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl TableClient {
    /// Create a client for the given instance.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Network(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn instance_url(&self) -> &str {
        &self.config.instance_url
    }

    /// Fetch the records of `table` matching `query`.
    pub async fn fetch_records(
        &self,
        table: &str,
        query: &TableQuery,
    ) -> Result<Vec<Value>, ClientError> {
        let url = self.table_url(&[table])?;
        let response: TableResponse<Option<Vec<Value>>> = self.get(url, query).await?;
        let records = response.result.unwrap_or_default();

        debug!("{}: {} record(s)", table, records.len());
        Ok(records)
    }

    /// Fetch a single record by sys_id. An empty result object means "not found".
    pub async fn fetch_record(
        &self,
        table: &str,
        sys_id: &str,
        query: &TableQuery,
    ) -> Result<Option<Value>, ClientError> {
        let url = self.table_url(&[table, sys_id])?;
        let response: TableResponse<Option<Value>> = self.get(url, query).await?;

        Ok(response.result.filter(|record| match record {
            Value::Object(map) => !map.is_empty(),
            Value::Null => false,
            _ => true,
        }))
    }

    fn table_url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.config.instance_url).map_err(|e| {
            ClientError::Network(format!(
                "invalid instance URL '{}': {}",
                self.config.instance_url, e
            ))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                ClientError::Network(format!(
                    "instance URL cannot be a base: {}",
                    self.config.instance_url
                ))
            })?
            .pop_if_empty()
            .extend(["api", "now", "table"])
            .extend(segments);

        Ok(url)
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        query: &TableQuery,
    ) -> Result<T, ClientError> {
        debug!("GET {} {:?}", url.path(), query.encoded());

        let mut request = self
            .http_client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&query.to_params());

        // Without credentials the instance answers 401, which is reported like any other status.
        if !self.config.username.is_empty() {
            request = request.basic_auth(&self.config.username, Some(&self.config.password));
        }

        let response = request.send().await?;
        let status = response.status();
        debug!("Response status: {}", status);

        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::from_status(status, body));
        }

        response.json::<T>().await.map_err(Into::into)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{basic_auth, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Client pointed at a mock server, shared by the tool tests.
    pub(crate) fn mock_client(server: &MockServer) -> TableClient {
        TableClient::new(ClientConfig {
            instance_url: server.uri(),
            username: "mcp.user".to_string(),
            password: "secret".to_string(),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_records_sends_query_and_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/now/table/syslog"))
            .and(basic_auth("mcp.user", "secret"))
            .and(header("accept", "application/json"))
            .and(query_param("sysparm_limit", "3"))
            .and(query_param("sysparm_query", "ORDERBYDESCsys_created_on"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": [{"message": "a"}, {"message": "b"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let query = TableQuery::new().order_by_desc("sys_created_on").limit(3);
        let records = client.fetch_records("syslog", &query).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["message"], "a");
    }

    #[tokio::test]
    async fn test_non_ok_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/now/table/wf_log"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let err = client
            .fetch_records("wf_log", &TableQuery::new())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Error: 403 - forbidden");
    }

    #[tokio::test]
    async fn test_fetch_record_empty_object_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/now/table/incident/abc123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {}})))
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let record = client
            .fetch_record("incident", "abc123", &TableQuery::new())
            .await
            .unwrap();

        assert!(record.is_none());
    }

    #[tokio::test]
    async fn test_instance_url_with_trailing_slash() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/now/table/wf_context"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = TableClient::new(ClientConfig {
            instance_url: format!("{}/", server.uri()),
            ..ClientConfig::default()
        })
        .unwrap();

        let records = client
            .fetch_records("wf_context", &TableQuery::new())
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_missing_instance_url_is_network_error() {
        let client = TableClient::new(ClientConfig::default()).unwrap();
        let err = client
            .fetch_records("syslog", &TableQuery::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Network(_)));
        assert!(err.to_string().starts_with("Error: request failed"));
    }
}
