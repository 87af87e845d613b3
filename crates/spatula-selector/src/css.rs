//! CSS selectors.

use std::fmt;

use scraper::ElementRef;

use crate::document::HtmlDocument;
use crate::selector::{Cardinality, Selector, SelectorError};

/// A CSS selector group, expecting at least one match unless configured
/// otherwise.
#[derive(Debug, Clone)]
pub struct Css {
    expr: String,
    selector: scraper::Selector,
    cardinality: Cardinality,
}

impl Css {
    pub fn new(expr: &str) -> Result<Self, SelectorError> {
        let selector = scraper::Selector::parse(expr).map_err(|e| SelectorError::Invalid {
            selector: expr.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            expr: expr.to_string(),
            selector,
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

    pub(crate) fn inner(&self) -> &scraper::Selector {
        &self.selector
    }
}

impl fmt::Display for Css {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CSS({})", self.expr)
    }
}

impl<'a> Selector<&'a HtmlDocument> for Css {
    type Item = ElementRef<'a>;

    fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    fn get_items(&self, root: &'a HtmlDocument) -> Result<Vec<ElementRef<'a>>, SelectorError> {
        Ok(root.html().select(&self.selector).collect())
    }
}

impl<'a> Selector<ElementRef<'a>> for Css {
    type Item = ElementRef<'a>;

    fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    fn get_items(&self, root: ElementRef<'a>) -> Result<Vec<ElementRef<'a>>, SelectorError> {
        Ok(root.select(&self.selector).collect())
    }
}
