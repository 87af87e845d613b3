//! Link selectors matching hrefs against a pattern.

use std::collections::HashSet;
use std::fmt;

use regex::Regex;
use scraper::ElementRef;

use crate::css::Css;
use crate::document::HtmlDocument;
use crate::selector::{Cardinality, Selector, SelectorError};

/// Links whose absolute `href` starts with a match of `pattern`.
///
/// Each distinct href is reported once, at its first occurrence.
#[derive(Debug, Clone)]
pub struct SimilarLink {
    pattern: String,
    regex: Regex,
    links: Css,
    cardinality: Cardinality,
}

impl SimilarLink {
    pub fn new(pattern: &str) -> Result<Self, SelectorError> {
        let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|e| SelectorError::Invalid {
            selector: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
            links: Css::new("a[href]")?,
            cardinality: Cardinality::at_least(1),
        })
    }

    pub fn num_items(mut self, n: usize) -> Self {
        self.cardinality.exact = Some(n);
        self
    }

    pub fn min_items(mut self, n: usize) -> Self {
        self.cardinality.min = Some(n);
        self
    }

    pub fn max_items(mut self, n: usize) -> Self {
        self.cardinality.max = Some(n);
        self
    }

    /// Replaces the whole configured cardinality.
    pub fn cardinality_of(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }
}

impl fmt::Display for SimilarLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SimilarLink({})", self.pattern)
    }
}

impl<'a> Selector<&'a HtmlDocument> for SimilarLink {
    type Item = ElementRef<'a>;

    fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    fn get_items(&self, root: &'a HtmlDocument) -> Result<Vec<ElementRef<'a>>, SelectorError> {
        let mut seen = HashSet::new();
        let items = root
            .html()
            .select(self.links.inner())
            .filter(|element| {
                let Some(href) = element.value().attr("href") else {
                    return false;
                };
                let href = root.absolute_url(href);
                self.regex.is_match(&href) && seen.insert(href)
            })
            .collect();
        Ok(items)
    }
}
