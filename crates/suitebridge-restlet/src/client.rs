// SPDX-FileCopyrightText: 2026 Suitebridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the deployed search script.
//!
//! Provides [`RestletClient`], which builds the script URL from the backend
//! config, forwards caller credentials as request headers, and turns HTTP
//! statuses, `error` bodies and transport errors into [`BackendFailure`]s.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use suitebridge_config::BackendConfig;
use suitebridge_core::record::INTERNAL_ID_KEY;
use suitebridge_core::traits::{FetchBatch, SearchPage, SearchRequest};
use suitebridge_core::{
    BackendFailure, Credentials, FieldFetcher, FieldSet, RecordId, RecordType, SearchBackend,
    SuitebridgeError, TransportKind, WireRecord,
};
use tracing::{debug, info};

use crate::types::{
    ErrorDetail, ErrorEnvelope, FetchFieldsBody, FetchFieldsResponse, SearchBody,
    SearchMoreBody, SearchResponse, WireId,
};

/// Script endpoint path on the RESTlet host.
const RESTLET_PATH: &str = "/app/site/hosting/restlet.nl";

/// Derives the script URL, including `script` and `deploy` parameters.
///
/// `base_url` wins over the account-derived host when set.
pub fn endpoint_url(config: &BackendConfig) -> Result<String, SuitebridgeError> {
    let script = required(config.script_id.as_deref(), "backend.script_id")?;
    let deploy = required(config.deploy_id.as_deref(), "backend.deploy_id")?;
    let base = match (&config.base_url, &config.account) {
        (Some(url), _) => url.trim_end_matches('/').to_string(),
        (None, Some(account)) => format!(
            "https://{}.restlets.api.netsuite.com{RESTLET_PATH}",
            account.trim().to_ascii_lowercase().replace('_', "-")
        ),
        (None, None) => {
            return Err(SuitebridgeError::Config(
                "backend.account or backend.base_url is required".into(),
            ));
        }
    };
    let separator = if base.contains('?') { '&' } else { '?' };
    Ok(format!("{base}{separator}script={script}&deploy={deploy}"))
}

fn required<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str, SuitebridgeError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SuitebridgeError::Config(format!("{key} is required")))
}

/// Client for one deployed search script.
#[derive(Debug, Clone)]
pub struct RestletClient {
    client: reqwest::Client,
    endpoint: String,
}

impl RestletClient {
    pub fn new(config: &BackendConfig) -> Result<Self, SuitebridgeError> {
        let endpoint = endpoint_url(config)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let agent = format!("{}/{}", config.application_id, env!("CARGO_PKG_VERSION"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&agent).map_err(|e| {
                SuitebridgeError::Config(format!("invalid backend.application_id: {e}"))
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.call_timeout())
            .build()
            .map_err(|e| SuitebridgeError::Config(format!("failed to build HTTP client: {e}")))?;

        info!(
            endpoint = %endpoint,
            api_version = %config.api_version,
            "RESTlet client initialised"
        );
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POSTs `body` and decodes the success payload.
    async fn post<B, R>(&self, credentials: &Credentials, body: &B) -> Result<R, BackendFailure>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self.client.post(&self.endpoint).json(body);
        for (name, value) in credentials.expose_headers() {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(transport_failure)?;
        let status = response.status();
        let retry_after = retry_after(response.headers());
        let text = response.text().await.map_err(transport_failure)?;
        debug!(status = %status, bytes = text.len(), "RESTlet response received");

        if !status.is_success() {
            return Err(http_failure(status, &text, retry_after));
        }

        let value: Value = serde_json::from_str(&text).map_err(|e| {
            BackendFailure::fault("INVALID_JSON", format!("invalid JSON response: {e}"))
        })?;
        if let Some(error) = value.get("error").filter(|e| !e.is_null()) {
            let detail = serde_json::from_value::<ErrorDetail>(error.clone()).map_err(|e| {
                BackendFailure::fault("INVALID_JSON", format!("malformed error body: {e}"))
            })?;
            return Err(BackendFailure::fault(
                detail.code.unwrap_or_else(|| "RESTLET_ERROR".to_string()),
                detail.message,
            ));
        }
        serde_json::from_value(value).map_err(|e| {
            BackendFailure::fault("INVALID_RESPONSE", format!("unexpected response shape: {e}"))
        })
    }
}

fn transport_failure(error: reqwest::Error) -> BackendFailure {
    let kind = if error.is_timeout() {
        TransportKind::Timeout
    } else if error.is_connect() {
        TransportKind::Connect
    } else {
        TransportKind::Other
    };
    BackendFailure::Transport {
        kind,
        message: error.to_string(),
    }
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

fn http_failure(status: StatusCode, body: &str, retry_after: Option<Duration>) -> BackendFailure {
    let (code, message) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.code, envelope.error.message),
        Err(_) => (None, body.trim().to_string()),
    };
    BackendFailure::Http {
        status: status.as_u16(),
        code,
        message,
        retry_after,
    }
}

fn search_page(response: SearchResponse) -> Result<SearchPage, BackendFailure> {
    let ids = response
        .ids
        .iter()
        .map(|id| parse_id(id))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SearchPage {
        search_id: response.search_id.filter(|id| !id.is_empty()),
        total_records: response.total_records,
        total_pages: response.total_pages,
        page_index: response.page_index,
        ids,
    })
}

fn parse_id(id: &WireId) -> Result<RecordId, BackendFailure> {
    id.parse().ok_or_else(|| {
        BackendFailure::fault("INVALID_RESPONSE", format!("unparseable internal id {id:?}"))
    })
}

#[async_trait]
impl SearchBackend for RestletClient {
    async fn search(
        &self,
        credentials: &Credentials,
        request: &SearchRequest,
    ) -> Result<SearchPage, BackendFailure> {
        debug!(
            record_type = %request.record_type,
            criteria = request.criteria.len(),
            page_size = request.page_size,
            "RESTlet search"
        );
        let response: SearchResponse = self.post(credentials, &SearchBody::new(request)).await?;
        search_page(response)
    }

    async fn search_more(
        &self,
        credentials: &Credentials,
        search_id: &str,
        page_index: u32,
    ) -> Result<SearchPage, BackendFailure> {
        debug!(search_id, page_index, "RESTlet searchMore");
        let response: SearchResponse = self
            .post(credentials, &SearchMoreBody::new(search_id, page_index))
            .await?;
        search_page(response)
    }
}

#[async_trait]
impl FieldFetcher for RestletClient {
    async fn fetch_fields(
        &self,
        credentials: &Credentials,
        record_type: &RecordType,
        ids: &[RecordId],
        fields: &FieldSet,
    ) -> Result<FetchBatch, BackendFailure> {
        let body = FetchFieldsBody {
            action: "fetchFields",
            record_type,
            ids: ids.iter().map(ToString::to_string).collect(),
            fields: fields.iter().collect(),
        };
        debug!(record_type = %record_type, ids = ids.len(), fields = fields.len(), "RESTlet fetchFields");
        let response: FetchFieldsResponse = self.post(credentials, &body).await?;

        let mut batch = FetchBatch::default();
        for record in response.records {
            let id = record
                .get(INTERNAL_ID_KEY)
                .cloned()
                .and_then(|v| serde_json::from_value::<WireId>(v).ok())
                .and_then(|v| v.parse())
                .ok_or_else(|| {
                    BackendFailure::fault("INVALID_RESPONSE", "fetched record has no internalId")
                })?;
            batch.fragments.insert(id, WireRecord::new(record));
        }
        for error in response.errors {
            let id = parse_id(&error.id)?;
            batch
                .failures
                .insert(id, BackendFailure::fault(error.code, error.message));
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(base_url: &str) -> BackendConfig {
        BackendConfig {
            base_url: Some(format!("{base_url}/restlet")),
            script_id: Some("customscript_sb_search".into()),
            deploy_id: Some("customdeploy_sb_search".into()),
            ..BackendConfig::default()
        }
    }

    fn creds() -> Credentials {
        Credentials::from_headers([("NS-Email", "ops@example.test"), ("NS-Account", "TSTDRV1")])
    }

    fn request() -> SearchRequest {
        SearchRequest {
            record_type: RecordType::new("customer"),
            criteria: Vec::new(),
            page_size: 2,
            sort: None,
            body_fields_only: true,
            fast: false,
        }
    }

    #[test]
    fn endpoint_is_derived_from_account() {
        let config = BackendConfig {
            account: Some("TSTDRV_123".into()),
            script_id: Some("12".into()),
            deploy_id: Some("1".into()),
            ..BackendConfig::default()
        };
        assert_eq!(
            endpoint_url(&config).unwrap(),
            "https://tstdrv-123.restlets.api.netsuite.com/app/site/hosting/restlet.nl?script=12&deploy=1"
        );
    }

    #[test]
    fn missing_script_is_a_config_error() {
        let config = BackendConfig {
            account: Some("TSTDRV1".into()),
            ..BackendConfig::default()
        };
        let err = RestletClient::new(&config).unwrap_err();
        assert!(matches!(err, SuitebridgeError::Config(ref m) if m.contains("script_id")));
    }

    #[tokio::test]
    async fn search_posts_action_with_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/restlet"))
            .and(query_param("script", "customscript_sb_search"))
            .and(query_param("deploy", "customdeploy_sb_search"))
            .and(header("NS-Email", "ops@example.test"))
            .and(body_partial_json(json!({
                "action": "search",
                "recordType": "customer",
                "pageSize": 2,
                "bodyFieldsOnly": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "searchId": "WEBSERVICES_TSTDRV1_1",
                "totalRecords": 5,
                "totalPages": 3,
                "pageIndex": 1,
                "ids": ["10", 11]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = RestletClient::new(&config(&server.uri())).unwrap();
        let page = client.search(&creds(), &request()).await.unwrap();
        assert_eq!(page.search_id.as_deref(), Some("WEBSERVICES_TSTDRV1_1"));
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.ids, vec![RecordId(10), RecordId(11)]);
    }

    #[tokio::test]
    async fn error_body_becomes_fault() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "action": "searchMore", "pageIndex": 2 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": { "code": "INVALID_SEARCH_ID", "message": "Invalid search id" }
            })))
            .mount(&server)
            .await;

        let client = RestletClient::new(&config(&server.uri())).unwrap();
        let err = client
            .search_more(&creds(), "WEBSERVICES_TSTDRV1_1", 2)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            BackendFailure::fault("INVALID_SEARCH_ID", "Invalid search id")
        );
    }

    #[tokio::test]
    async fn rate_limit_carries_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("Retry-After", "7")
                    .set_body_json(json!({
                        "error": { "code": "SSS_REQUEST_LIMIT_EXCEEDED", "message": "slow down" }
                    })),
            )
            .mount(&server)
            .await;

        let client = RestletClient::new(&config(&server.uri())).unwrap();
        let err = client.search(&creds(), &request()).await.unwrap_err();
        assert_eq!(
            err,
            BackendFailure::Http {
                status: 429,
                code: Some("SSS_REQUEST_LIMIT_EXCEEDED".into()),
                message: "slow down".into(),
                retry_after: Some(Duration::from_secs(7)),
            }
        );
    }

    #[tokio::test]
    async fn non_json_error_keeps_body_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let client = RestletClient::new(&config(&server.uri())).unwrap();
        let err = client.search(&creds(), &request()).await.unwrap_err();
        assert!(matches!(
            err,
            BackendFailure::Http { status: 502, code: None, ref message, .. } if message == "Bad Gateway"
        ));
    }

    #[tokio::test]
    async fn fetch_fields_splits_records_and_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "action": "fetchFields",
                "recordType": "customer",
                "ids": ["1", "2", "3"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [
                    { "internalId": "1", "email": "a@example.test" },
                    { "internalId": 3, "email": "c@example.test" }
                ],
                "errors": [
                    { "id": "2", "code": "RCRD_DSNT_EXIST", "message": "missing" }
                ]
            })))
            .mount(&server)
            .await;

        let client = RestletClient::new(&config(&server.uri())).unwrap();
        let fields: FieldSet = ["internalId", "email"].into_iter().collect();
        let batch = client
            .fetch_fields(
                &creds(),
                &RecordType::new("customer"),
                &[RecordId(1), RecordId(2), RecordId(3)],
                &fields,
            )
            .await
            .unwrap();
        assert_eq!(batch.fragments.len(), 2);
        assert_eq!(
            batch.fragments[&RecordId(3)].as_value()["email"],
            "c@example.test"
        );
        assert_eq!(
            batch.failures[&RecordId(2)],
            BackendFailure::fault("RCRD_DSNT_EXIST", "missing")
        );
    }

    #[tokio::test]
    async fn refused_connection_is_a_connect_failure() {
        let client = RestletClient::new(&config("http://127.0.0.1:9")).unwrap();
        let err = client.search(&creds(), &request()).await.unwrap_err();
        assert!(matches!(
            err,
            BackendFailure::Transport {
                kind: TransportKind::Connect,
                ..
            }
        ));
    }
}
