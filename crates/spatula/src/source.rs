use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use reqwest::Method;

/// Where a page gets its data from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Url(Url),
    /// Nothing to fetch, the page extracts from its input and dependencies
    /// alone.
    Null,
}

impl Source {
    /// The fetch target, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(&url.url),
            Self::Null => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => fmt::Display::fmt(url, f),
            Self::Null => f.write_str("NullSource"),
        }
    }
}

impl From<Url> for Source {
    fn from(url: Url) -> Self {
        Self::Url(url)
    }
}

impl From<&str> for Source {
    fn from(url: &str) -> Self {
        Self::Url(Url::new(url))
    }
}

impl From<String> for Source {
    fn from(url: String) -> Self {
        Self::Url(Url::new(url))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Form(Vec<(String, String)>),
    Json(serde_json::Value),
    Text(String),
}

/// An HTTP request description, immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Url {
    pub url: String,
    pub method: Method,
    pub headers: BTreeMap<String, String>,
    pub data: Option<Body>,
    pub timeout: Option<Duration>,
}

impl Url {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            headers: BTreeMap::new(),
            data: None,
            timeout: None,
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn data(mut self, data: Body) -> Self {
        self.data = Some(data);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.method == Method::GET {
            f.write_str(&self.url)
        } else {
            write!(f, "{} {}", self.method, self.url)
        }
    }
}
