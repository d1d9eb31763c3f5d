use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, de::DeserializeOwned};

const DEFAULT_SUBJECT_HEADER: &str = "x-folio-subject";
const DEFAULT_ROLES_HEADER: &str = "x-folio-roles";
const ENTITLEMENT_HEADER: &str = "x-folio-entitlement";

/// HTTP client for a Folio server, acting on behalf of one subject.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    subject: Option<u64>,
    roles: Vec<String>,
    subject_header: String,
    roles_header: String,
}

/// Error body returned by the server.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub active_tokens: usize,
    pub cached_derivatives: usize,
}

/// Values the viewer page carries for the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerSession {
    pub filename: String,
    pub token: String,
    pub secret: String,
    pub entitlement: String,
    pub content_url: String,
}

/// Obfuscated bytes returned by the gateway.
#[derive(Debug)]
pub struct ContentResponse {
    pub bytes: Vec<u8>,
    pub entitlement: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).context("invalid server URL")?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            subject: None,
            roles: Vec::new(),
            subject_header: DEFAULT_SUBJECT_HEADER.to_string(),
            roles_header: DEFAULT_ROLES_HEADER.to_string(),
        })
    }

    /// Act as `subject` with the given roles. `None` is anonymous.
    pub fn with_subject(mut self, subject: Option<u64>, roles: Vec<String>) -> Self {
        self.subject = subject;
        self.roles = roles;
        self
    }

    /// Override the session header names.
    pub fn with_headers(mut self, subject_header: &str, roles_header: &str) -> Self {
        self.subject_header = subject_header.to_string();
        self.roles_header = roles_header.to_string();
        self
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).context("failed to build API URL")
    }

    fn session(&self, mut req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(subject) = self.subject {
            req = req.header(&self.subject_header, subject.to_string());
        }
        if !self.roles.is_empty() {
            req = req.header(&self.roles_header, self.roles.join(","));
        }
        req
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = self.session(req).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(err) => anyhow::bail!("API error ({}): {}: {}", status, err.code, err.message),
            Err(_) => anyhow::bail!("API error ({}): {}", status, body),
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T> {
        let body = self.send(req).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let url = self.url("/v1/health")?;
        self.send_json(self.http.get(url)).await
    }

    /// Render the viewer page for `filename`, issuing a fresh token.
    pub async fn view(&self, filename: &str) -> Result<ViewerSession> {
        let mut url = self.url("/view/")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("server URL cannot be a base"))?
            .pop_if_empty()
            .push(filename);

        let html = self.send(self.http.get(url)).await?.text().await?;
        parse_viewer(&html)
    }

    /// Redeem `token` at the gateway.
    pub async fn fetch_content(&self, token: &str) -> Result<ContentResponse> {
        self.fetch_content_at("/v1/documents/content", token).await
    }

    /// Redeem `token` at an explicit content path, as given by the viewer.
    pub async fn fetch_content_at(&self, path: &str, token: &str) -> Result<ContentResponse> {
        let url = self.url(path)?;
        let response = self
            .send(self.http.get(url).query(&[("token", token)]))
            .await?;
        let entitlement = response
            .headers()
            .get(ENTITLEMENT_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();
        Ok(ContentResponse { bytes, entitlement })
    }

    /// Fetch a file directly, bypassing the gateway.
    pub async fn get_file(&self, filename: &str) -> Result<Vec<u8>> {
        let mut url = self.url("/files/")?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("server URL cannot be a base"))?
            .pop_if_empty()
            .push(filename);
        Ok(self.send(self.http.get(url)).await?.bytes().await?.to_vec())
    }
}

/// Extract the viewer's `data-` attributes from a rendered page.
pub fn parse_viewer(html: &str) -> Result<ViewerSession> {
    let attr = |name: &str| -> Result<String> {
        let marker = format!("data-{name}=\"");
        let start = html
            .find(&marker)
            .map(|i| i + marker.len())
            .with_context(|| format!("viewer page missing data-{name}"))?;
        let end = html[start..]
            .find('"')
            .map(|i| i + start)
            .with_context(|| format!("unterminated data-{name}"))?;
        Ok(unescape_html(&html[start..end]))
    };

    Ok(ViewerSession {
        filename: attr("filename")?,
        token: attr("token")?,
        secret: attr("secret")?,
        entitlement: attr("entitlement")?,
        content_url: attr("content-url")?,
    })
}

fn unescape_html(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#123;", "{")
        .replace("&#125;", "}")
        .replace("&amp;", "&")
}
