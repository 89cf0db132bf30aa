use crate::error::ClientError;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// API generations exposed by a CDM node, rendered as the path segment after `/api/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    Internal,
    V1,
}

impl ApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::Internal => "internal",
            ApiVersion::V1 => "v1",
        }
    }
}

#[derive(Clone)]
pub enum Credentials {
    Basic { username: String, password: String },
    Token(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credentials::Token(_) => f.debug_tuple("Token").field(&"<redacted>").finish(),
        }
    }
}

#[async_trait::async_trait]
pub trait CdmClient: Send + Sync {
    async fn get(&self, api: ApiVersion, endpoint: &str) -> Result<Value, ClientError>;

    async fn post(&self, api: ApiVersion, endpoint: &str, body: &Value)
    -> Result<Value, ClientError>;

    /// Dotted software version reported by `/cluster/me`, e.g. `5.3.1-p2-1234`.
    async fn cluster_version(&self) -> Result<String, ClientError> {
        let cluster = self.get(ApiVersion::V1, "/cluster/me").await?;
        cluster
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or(ClientError::MissingField("version"))
    }
}

#[derive(Debug, Clone)]
pub struct HttpCdmClient {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

impl HttpCdmClient {
    pub fn new(
        node_ip: &str,
        credentials: Credentials,
        timeout: Duration,
        accept_invalid_certs: bool,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url(node_ip),
            credentials,
        })
    }

    fn url(&self, api: ApiVersion, endpoint: &str) -> String {
        endpoint_url(&self.base_url, api, endpoint)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Credentials::Basic { username, password } => request.basic_auth(username, Some(password)),
            Credentials::Token(token) => request.bearer_auth(token),
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, ClientError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ClientError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if body.contains("Incorrect username/password") {
                return Err(ClientError::Unauthorized);
            }
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(ClientError::from)
    }
}

#[async_trait::async_trait]
impl CdmClient for HttpCdmClient {
    async fn get(&self, api: ApiVersion, endpoint: &str) -> Result<Value, ClientError> {
        let url = self.url(api, endpoint);
        debug!(%url, "GET");
        self.send(self.client.get(url)).await
    }

    async fn post(
        &self,
        api: ApiVersion,
        endpoint: &str,
        body: &Value,
    ) -> Result<Value, ClientError> {
        let url = self.url(api, endpoint);
        debug!(%url, "POST");
        self.send(self.client.post(url).json(body)).await
    }
}

fn base_url(node_ip: &str) -> String {
    let trimmed = node_ip.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    }
}

fn endpoint_url(base_url: &str, api: ApiVersion, endpoint: &str) -> String {
    let endpoint = endpoint.trim_start_matches('/');
    format!("{base_url}/api/{}/{endpoint}", api.as_str())
}
