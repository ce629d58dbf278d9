//! HTTP client for the headless CMS (Sanity-compatible content lake).
//!
//! Reads go through the templated query endpoint with `$param` bindings;
//! writes go through the mutation endpoint. Read access works without a
//! token; mutations require the write token, which is optional in config
//! so read-only deployments keep working.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct CmsClient {
    client: reqwest::Client,
    base_url: String,
    dataset: String,
    write_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct MutateRequest {
    mutations: Vec<Value>,
}

impl CmsClient {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        dataset: impl Into<String>,
        write_token: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            dataset: dataset.into(),
            write_token,
        }
    }

    pub fn from_config(client: &reqwest::Client, config: &Config) -> Self {
        Self::new(
            client.clone(),
            config.cms_api_url.trim_end_matches('/'),
            config.cms_dataset.clone(),
            config.cms_write_token.clone(),
        )
    }

    /// Whether this client holds a write credential.
    pub fn can_write(&self) -> bool {
        self.write_token.is_some()
    }

    /// Run a GROQ query with `$name` parameters bound to JSON-encoded values.
    pub async fn query(&self, groq: &str, params: &[(&str, Value)]) -> AppResult<Value> {
        let url = format!("{}/v1/data/query/{}", self.base_url, self.dataset);
        debug!("CMS query: {groq}");

        let mut query_params: Vec<(String, String)> = vec![("query".to_string(), groq.to_string())];
        for (name, value) in params {
            query_params.push((format!("${name}"), value.to_string()));
        }

        let mut request = self.client.get(&url).query(&query_params);
        if let Some(token) = &self.write_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Cms(format!("failed to reach CMS query endpoint: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Cms(format!("CMS query failed ({status}): {body}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Cms(format!("failed to parse CMS query response: {e}")))?;

        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }

    /// Fetch a single document by ID. `None` when it does not exist.
    pub async fn fetch_by_id(&self, id: &str) -> AppResult<Option<Value>> {
        let result = self
            .query("*[_id == $id][0]", &[("id", json!(id))])
            .await?;
        Ok(match result {
            Value::Null => None,
            doc => Some(doc),
        })
    }

    /// Fetch every existing document among the given IDs.
    pub async fn fetch_by_ids(&self, ids: &[String]) -> AppResult<Vec<Value>> {
        let result = self
            .query("*[_id in $ids]", &[("ids", json!(ids))])
            .await?;
        match result {
            Value::Array(docs) => Ok(docs),
            Value::Null => Ok(Vec::new()),
            other => Err(AppError::Cms(format!(
                "unexpected CMS query result shape: {other}"
            ))),
        }
    }

    /// Create or fully overwrite a document. The document must carry `_id`.
    pub async fn create_or_replace(&self, document: Value) -> AppResult<()> {
        self.mutate(vec![json!({ "createOrReplace": document })])
            .await
    }

    /// Create a document with a server-generated ID.
    pub async fn create(&self, document: Value) -> AppResult<()> {
        self.mutate(vec![json!({ "create": document })]).await
    }

    async fn mutate(&self, mutations: Vec<Value>) -> AppResult<()> {
        let token = self.write_token.as_ref().ok_or_else(|| {
            AppError::Configuration("CMS write token not configured".to_string())
        })?;

        let url = format!("{}/v1/data/mutate/{}", self.base_url, self.dataset);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {token}"))
            .json(&MutateRequest { mutations })
            .send()
            .await
            .map_err(|e| AppError::Cms(format!("failed to reach CMS mutate endpoint: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Cms(format!(
                "CMS mutation failed ({status}): {body}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer, token: Option<&str>) -> CmsClient {
        CmsClient::new(
            reqwest::Client::new(),
            server.uri(),
            "production",
            token.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn test_query_unwraps_result() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/data/query/production"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "result": { "greeting": "Halo" } })),
            )
            .mount(&server)
            .await;

        let cms = test_client(&server, None);
        let result = cms.query("*[_type == 'homeProfile'][0]", &[]).await.unwrap();
        assert_eq!(result["greeting"], "Halo");
    }

    #[tokio::test]
    async fn test_query_sends_dollar_params() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/data/query/production"))
            .and(query_param("query", "*[_id == $id][0]"))
            .and(query_param("$id", "\"home-profile-id\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": null })))
            .expect(1)
            .mount(&server)
            .await;

        let cms = test_client(&server, None);
        let doc = cms.fetch_by_id("home-profile-id").await.unwrap();
        assert!(doc.is_none());
    }

    #[tokio::test]
    async fn test_fetch_by_ids_empty_result() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/data/query/production"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": [] })))
            .mount(&server)
            .await;

        let cms = test_client(&server, None);
        let docs = cms
            .fetch_by_ids(&["a-id".to_string(), "a-en".to_string()])
            .await
            .unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_query_error_carries_status_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/data/query/production"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid GROQ"))
            .mount(&server)
            .await;

        let cms = test_client(&server, None);
        let err = cms.query("*[", &[]).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("400"), "got: {msg}");
        assert!(msg.contains("invalid GROQ"), "got: {msg}");
    }

    #[tokio::test]
    async fn test_mutate_requires_write_token() {
        let server = MockServer::start().await;
        let cms = test_client(&server, None);

        let err = cms
            .create_or_replace(json!({ "_id": "x", "_type": "homeProfile" }))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_create_or_replace_posts_mutation() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/data/mutate/production"))
            .and(header("Authorization", "Bearer sk-test"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "transactionId": "t1", "results": [] })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let cms = test_client(&server, Some("sk-test"));
        cms.create_or_replace(json!({ "_id": "home-profile-en", "_type": "homeProfile" }))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_mutation_error_propagates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/data/mutate/production"))
            .respond_with(ResponseTemplate::new(403).set_body_string("insufficient permissions"))
            .mount(&server)
            .await;

        let cms = test_client(&server, Some("sk-test"));
        let err = cms.create(json!({ "_type": "contactMessage" })).await.unwrap_err();
        assert!(err.to_string().contains("insufficient permissions"));
    }
}
