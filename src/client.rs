//! Access to the search engine's select endpoint.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::query::native::NativeQuerySpec;

/// Executes native select requests against a collection.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Raw JSON response of `GET /{collection}/select`.
    async fn select(&self, collection: &str, query: &NativeQuerySpec) -> Result<Value>;
}

#[cfg(feature = "http")]
pub use http::HttpSolrClient;

#[cfg(feature = "http")]
mod http {
    use async_trait::async_trait;
    use log::{debug, error};
    use reqwest::{Client, Url};
    use serde_json::Value;

    use crate::client::SearchClient;
    use crate::config::BridgeConfig;
    use crate::error::{Result, SolrSqlError};
    use crate::query::native::NativeQuerySpec;
    use crate::response::{SearchResponse, normalize_response};
    use crate::schema::source::SchemaSource;

    /// HTTP client for a Solr server.
    pub struct HttpSolrClient {
        client: Client,
        base_url: String,
    }

    impl HttpSolrClient {
        pub fn new(config: &BridgeConfig) -> Result<Self> {
            config.validate()?;
            let client = Client::builder()
                .timeout(config.connection_timeout())
                .build()
                .map_err(|e| {
                    SolrSqlError::configuration(format!("failed to build HTTP client: {e}"))
                })?;
            Ok(Self {
                client,
                base_url: config.base_url().trim_end_matches('/').to_string(),
            })
        }

        pub fn base_url(&self) -> &str {
            &self.base_url
        }

        fn endpoint(&self, collection: &str, path: &str) -> String {
            format!("{}/{collection}/{path}", self.base_url)
        }

        async fn get_json(&self, endpoint: &str, params: &[(String, String)]) -> Result<Value> {
            let url = Url::parse_with_params(endpoint, params)
                .map_err(|e| SolrSqlError::configuration(format!("invalid URL {endpoint}: {e}")))?;
            debug!("GET {url}");

            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| SolrSqlError::http(format!("{endpoint}: {e}")))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| SolrSqlError::http(format!("{endpoint}: {e}")))?;

            if !status.is_success() {
                let message = serde_json::from_str::<Value>(&body)
                    .ok()
                    .and_then(|v| v["error"]["msg"].as_str().map(str::to_string))
                    .unwrap_or(body);
                error!("{endpoint} returned {status}: {message}");
                return Err(SolrSqlError::solr(format!("{status}: {message}")));
            }
            Ok(serde_json::from_str(&body)?)
        }

        /// Run a statement on the SQL handler and normalise its result set.
        pub async fn execute_sql(
            &self,
            collection: &str,
            statement: &str,
        ) -> Result<SearchResponse> {
            let raw = self
                .get_json(
                    &self.endpoint(collection, "sql"),
                    &[
                        ("stmt".to_string(), statement.to_string()),
                        ("aggregationMode".to_string(), "facet".to_string()),
                    ],
                )
                .await?;
            normalize_response(&raw)
        }
    }

    fn json_params() -> Vec<(String, String)> {
        vec![("wt".to_string(), "json".to_string())]
    }

    #[async_trait]
    impl SearchClient for HttpSolrClient {
        async fn select(&self, collection: &str, query: &NativeQuerySpec) -> Result<Value> {
            self.get_json(&self.endpoint(collection, "select"), &query.to_params())
                .await
        }
    }

    #[async_trait]
    impl SchemaSource for HttpSolrClient {
        async fn fetch_schema(&self, collection: &str) -> Result<Value> {
            self.get_json(&self.endpoint(collection, "schema"), &json_params())
                .await
        }

        async fn fetch_schema_fields(&self, collection: &str) -> Result<Value> {
            self.get_json(&self.endpoint(collection, "schema/fields"), &json_params())
                .await
        }

        async fn probe_fields(&self, collection: &str) -> Result<Value> {
            let params = [("q", "*:*"), ("rows", "0"), ("wt", "json"), ("echoParams", "all")]
                .map(|(k, v)| (k.to_string(), v.to_string()));
            self.get_json(&self.endpoint(collection, "select"), &params)
                .await
        }
    }

}
