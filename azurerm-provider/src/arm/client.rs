//! ARM REST client
//!
//! Thin wrapper over `reqwest` that adds the `api-version` query parameter,
//! bearer authentication, ARM error decoding, long-running operation polling
//! and `nextLink` pagination.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::auth::TokenCredential;
use super::error::{ArmError, truncate};

pub const DEFAULT_ENDPOINT: &str = "https://management.azure.com/";

const USER_AGENT: &str = concat!("azurerm-relay/", env!("CARGO_PKG_VERSION"));
const DEFAULT_LRO_POLL_INTERVAL: Duration = Duration::from_secs(10);
const ASYNC_OPERATION_HEADER: &str = "azure-asyncoperation";
const LOCATION_HEADER: &str = "location";

/// A page of a list operation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(default)]
    pub next_link: Option<String>,
}

/// Body of an `Azure-AsyncOperation` status resource
#[derive(Debug, Deserialize)]
struct OperationStatus {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    message: String,
}

struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

/// Client for Azure Resource Manager
#[derive(Clone)]
pub struct ArmClient {
    http: reqwest::Client,
    endpoint: Url,
    credential: Arc<dyn TokenCredential>,
    lro_poll_interval: Duration,
}

impl ArmClient {
    pub fn new(
        http: reqwest::Client,
        endpoint: &str,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self, ArmError> {
        let mut endpoint = Url::parse(endpoint)?;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        Ok(Self {
            http,
            endpoint,
            credential,
            lro_poll_interval: DEFAULT_LRO_POLL_INTERVAL,
        })
    }

    /// Build the shared HTTP client
    pub fn http_client() -> Result<reqwest::Client, ArmError> {
        Ok(reqwest::Client::builder().user_agent(USER_AGENT).build()?)
    }

    /// Interval between polls of a long-running operation when the API
    /// does not send `Retry-After`
    pub fn with_lro_poll_interval(mut self, interval: Duration) -> Self {
        self.lro_poll_interval = interval;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn resource_url(&self, path: &str, api_version: &str) -> Result<Url, ArmError> {
        let mut url = self.endpoint.join(path.trim_start_matches('/'))?;
        url.query_pairs_mut().append_pair("api-version", api_version);
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<RawResponse, ArmError> {
        tracing::debug!("{} {}", method, url);

        let token = self.credential.token().await?;
        let mut request = self.http.request(method.clone(), url.clone()).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        if !status.is_success() {
            if status != StatusCode::NOT_FOUND {
                tracing::warn!("API error: {} - {}", status, truncate(&body));
            }
            return Err(ArmError::from_response(
                method.as_str(),
                url.as_str(),
                status.as_u16(),
                &body,
            ));
        }

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }

    /// GET a resource
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
    ) -> Result<T, ArmError> {
        let url = self.resource_url(path, api_version)?;
        let response = self.send(Method::GET, url, None).await?;
        Ok(serde_json::from_str(&response.body)?)
    }

    /// PUT a resource and wait for the operation to finish
    ///
    /// Returns the resource as read back after provisioning completed.
    pub async fn put<B, T>(&self, path: &str, api_version: &str, body: &B) -> Result<T, ArmError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = self.resource_url(path, api_version)?;
        let body = serde_json::to_value(body)?;
        let response = self.send(Method::PUT, url, Some(body)).await?;

        let accepted = matches!(response.status, StatusCode::CREATED | StatusCode::ACCEPTED);
        match poll_url(&response.headers) {
            Some(poll) if accepted => {
                self.wait_for_operation(poll, &response.headers).await?;
                self.get(path, api_version).await
            }
            _ if response.body.trim().is_empty() => self.get(path, api_version).await,
            _ => Ok(serde_json::from_str(&response.body)?),
        }
    }

    /// POST an action such as `listKeys`
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
    ) -> Result<T, ArmError> {
        let url = self.resource_url(path, api_version)?;
        let response = self.send(Method::POST, url, None).await?;
        Ok(serde_json::from_str(&response.body)?)
    }

    /// DELETE a resource, waiting for an accepted operation to finish
    ///
    /// A 404 is returned as `ArmError::NotFound` and left for the caller to
    /// interpret.
    pub async fn delete(&self, path: &str, api_version: &str) -> Result<(), ArmError> {
        let url = self.resource_url(path, api_version)?;
        let response = self.send(Method::DELETE, url, None).await?;

        if response.status == StatusCode::ACCEPTED {
            if let Some(poll) = poll_url(&response.headers) {
                self.wait_for_operation(poll, &response.headers).await?;
            }
        }
        Ok(())
    }

    /// GET every page of a collection, following `nextLink`
    pub async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        api_version: &str,
    ) -> Result<Vec<T>, ArmError> {
        let mut items = Vec::new();
        let mut next = Some(self.resource_url(path, api_version)?);

        while let Some(url) = next.take() {
            let response = self.send(Method::GET, url.clone(), None).await?;
            let page: ListResult<T> = serde_json::from_str(&response.body)?;
            items.extend(page.value);

            if let Some(link) = page.next_link.filter(|l| !l.is_empty()) {
                let link = Url::parse(&link)?;
                if link != url {
                    next = Some(link);
                }
            }
        }

        Ok(items)
    }

    /// Poll a long-running operation until it reaches a terminal state
    async fn wait_for_operation(&self, url: Url, initial: &HeaderMap) -> Result<(), ArmError> {
        let mut delay = retry_after(initial).unwrap_or(self.lro_poll_interval);

        loop {
            tokio::time::sleep(delay).await;

            let response = self.send(Method::GET, url.clone(), None).await?;
            delay = retry_after(&response.headers).unwrap_or(self.lro_poll_interval);

            // Location polling answers 202 until done
            if response.status == StatusCode::ACCEPTED {
                continue;
            }

            let status = serde_json::from_str::<OperationStatus>(&response.body)
                .ok()
                .and_then(|s| Some((s.status?, s.error)));
            match status {
                None => return Ok(()),
                Some((status, _)) if status.eq_ignore_ascii_case("Succeeded") => return Ok(()),
                Some((status, error))
                    if status.eq_ignore_ascii_case("Failed")
                        || status.eq_ignore_ascii_case("Canceled") =>
                {
                    return Err(ArmError::OperationFailed {
                        status,
                        message: error.map(|e| e.message).unwrap_or_default(),
                    });
                }
                Some((status, _)) => {
                    tracing::debug!("Operation still {}, polling again in {:?}", status, delay);
                }
            }
        }
    }
}

fn poll_url(headers: &HeaderMap) -> Option<Url> {
    [ASYNC_OPERATION_HEADER, LOCATION_HEADER]
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| Url::parse(value).ok())
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arm::auth::StaticToken;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const API: &str = "2021-11-01";

    fn client(server: &MockServer) -> ArmClient {
        ArmClient::new(
            reqwest::Client::new(),
            &server.uri(),
            Arc::new(StaticToken::new("test-token")),
        )
        .unwrap()
        .with_lro_poll_interval(Duration::from_millis(5))
    }

    #[tokio::test]
    async fn get_sends_api_version_and_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/subscriptions/s/thing"))
            .and(query_param("api-version", API))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "thing"})))
            .mount(&server)
            .await;

        let value: serde_json::Value = client(&server)
            .get("/subscriptions/s/thing", API)
            .await
            .unwrap();
        assert_eq!(value["name"], "thing");
    }

    #[tokio::test]
    async fn get_maps_404_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client(&server)
            .get::<serde_json::Value>("/subscriptions/s/missing", API)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn put_follows_async_operation_then_reads_back() {
        let server = MockServer::start().await;
        let operation = format!("{}/operations/op-1", server.uri());

        Mock::given(method("PUT"))
            .and(path("/subscriptions/s/thing"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("Azure-AsyncOperation", operation.as_str())
                    .set_body_json(json!({"properties": {"provisioningState": "Accepted"}})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/op-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "Succeeded"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/subscriptions/s/thing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"properties": {"provisioningState": "Succeeded"}}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let value: serde_json::Value = client(&server)
            .put("/subscriptions/s/thing", API, &json!({"location": "westeurope"}))
            .await
            .unwrap();
        assert_eq!(value["properties"]["provisioningState"], "Succeeded");
    }

    #[tokio::test]
    async fn failed_operation_is_reported() {
        let server = MockServer::start().await;
        let operation = format!("{}/operations/op-2", server.uri());

        Mock::given(method("PUT"))
            .respond_with(
                ResponseTemplate::new(202)
                    .insert_header("Azure-AsyncOperation", operation.as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/operations/op-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "Failed",
                "error": {"code": "Conflict", "message": "namespace name is taken"}
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .put::<_, serde_json::Value>("/subscriptions/s/thing", API, &json!({}))
            .await
            .unwrap_err();
        match err {
            ArmError::OperationFailed { status, message } => {
                assert_eq!(status, "Failed");
                assert_eq!(message, "namespace name is taken");
            }
            other => panic!("Expected OperationFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn list_all_follows_next_link() {
        let server = MockServer::start().await;
        let next = format!("{}/subscriptions/s/items?api-version={}&page=2", server.uri(), API);

        Mock::given(method("GET"))
            .and(path("/subscriptions/s/items"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": [3]})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/subscriptions/s/items"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"value": [1, 2], "nextLink": next})),
            )
            .mount(&server)
            .await;

        let items: Vec<i64> = client(&server)
            .list_all("/subscriptions/s/items", API)
            .await
            .unwrap();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn api_error_carries_code_and_message() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "error": {"code": "Conflict", "message": "in use"}
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .delete("/subscriptions/s/thing", API)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(409));
        assert!(err.to_string().contains("Conflict: in use"));
    }

    #[test]
    fn retry_after_is_parsed_in_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, "7".parse().unwrap());
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(7)));
    }
}
