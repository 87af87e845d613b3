//! Parsed documents that selectors run against.

use std::fmt;

use scraper::{ElementRef, Html};
use sxd_document::{dom, parser, Package};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid XML: {0}")]
    Xml(String),
}

/// An HTML document, optionally anchored to the URL it was fetched from so
/// that relative links can be made absolute.
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    html: Html,
    base_url: Option<Url>,
}

impl HtmlDocument {
    /// Parsing never fails, broken markup is repaired as browsers do.
    pub fn parse(text: &str, base_url: Option<&str>) -> Self {
        Self {
            html: Html::parse_document(text),
            base_url: base_url.and_then(|u| Url::parse(u).ok()),
        }
    }

    pub fn html(&self) -> &Html {
        &self.html
    }

    pub fn root_element(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Resolves `href` against the base URL, returning it unchanged when
    /// there is no base or it doesn't join.
    pub fn absolute_url(&self, href: &str) -> String {
        self.base_url
            .as_ref()
            .and_then(|base| base.join(href).ok())
            .map(String::from)
            .unwrap_or_else(|| href.to_string())
    }
}

/// An XML document for [`crate::XPath`] queries.
pub struct XmlDocument {
    package: Package,
}

impl XmlDocument {
    pub fn parse(text: &str) -> Result<Self, DocumentError> {
        let package = parser::parse(text).map_err(|e| DocumentError::Xml(e.to_string()))?;
        Ok(Self { package })
    }

    pub fn as_document(&self) -> dom::Document<'_> {
        self.package.as_document()
    }
}

impl fmt::Debug for XmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlDocument").finish_non_exhaustive()
    }
}
