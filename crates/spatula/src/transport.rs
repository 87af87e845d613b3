use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::prelude::*;

use async_trait::async_trait;
use flate2::read::GzDecoder;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;

use crate::config::ScraperConfig;
use crate::source::{Body, Url};

/// A failed request: a non-2xx status, a body that broke off or timed out
/// (with the status already received), or no status at all when the
/// connection itself failed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{url}: {}", describe_status(.status_code))]
pub struct HttpError {
    pub status_code: Option<u16>,
    pub url: String,
    pub text: String,
}

fn describe_status(status_code: &Option<u16>) -> String {
    match status_code {
        Some(code) => format!("HTTP {code}"),
        None => "connection failed".to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Handed to the page's error hook.
    #[error(transparent)]
    Http(#[from] HttpError),
    /// Always fatal.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// The fetching collaborator, called once per page fetch.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, url: &Url) -> Result<Response, RequestError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub url: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    content: Vec<u8>,
}

impl Response {
    pub fn new(url: impl Into<String>, status: u16, content: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            status,
            headers: BTreeMap::new(),
            content: content.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<Vec<u8>>) {
        self.content = content.into();
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.content)
    }
}

/// [`Transport`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &ScraperConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let mut builder = reqwest::ClientBuilder::new()
            .user_agent(&config.user_agent)
            .gzip(true)
            .deflate(true)
            .danger_accept_invalid_certs(!config.verify);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, url: &Url) -> Result<Response, RequestError> {
        let mut req = self.client.request(url.method.clone(), &url.url);
        for (name, value) in &url.headers {
            req = req.header(name, value);
        }
        req = match &url.data {
            Some(Body::Form(form)) => req.form(form),
            Some(Body::Json(json)) => req.json(json),
            Some(Body::Text(text)) => req.body(text.clone()),
            None => req,
        };
        if let Some(timeout) = url.timeout {
            req = req.timeout(timeout);
        }

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(e) if e.is_builder() => return Err(anyhow::Error::from(e).into()),
            Err(e) => {
                return Err(HttpError {
                    status_code: e.status().map(|s| s.as_u16()),
                    url: url.url.clone(),
                    text: e.to_string(),
                }
                .into())
            }
        };

        let status = resp.status();
        let final_url = resp.url().to_string();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.to_string(), v.to_str().ok()?.to_string())))
            .collect::<BTreeMap<_, _>>();
        let gzipped = matches!(
            headers.get(CONTENT_TYPE.as_str()).map(String::as_str),
            Some("application/x-gzip" | "application/gzip")
        );
        // a body that fails to arrive intact is a transport error like any other
        let body_error = |text: String| HttpError {
            status_code: Some(status.as_u16()),
            url: url.url.clone(),
            text,
        };
        let compressed = resp.bytes().await.map_err(|e| body_error(e.to_string()))?;
        let content = if gzipped {
            let mut gz = GzDecoder::new(&compressed[..]);
            let mut content = Vec::new();
            gz.read_to_end(&mut content).map_err(|e| body_error(e.to_string()))?;
            content
        } else {
            compressed.to_vec()
        };

        if !status.is_success() {
            return Err(HttpError {
                status_code: Some(status.as_u16()),
                url: url.url.clone(),
                text: String::from_utf8_lossy(&content).into_owned(),
            }
            .into());
        }

        Ok(Response {
            url: final_url,
            status: status.as_u16(),
            headers,
            content,
        })
    }
}
