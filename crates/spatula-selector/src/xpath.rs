//! XPath selectors over XML documents.

use std::fmt;

use sxd_xpath::nodeset::Node;
use sxd_xpath::{Context, Factory, Value};

use crate::document::XmlDocument;
use crate::selector::{Cardinality, Selector, SelectorError};

#[derive(Debug)]
pub struct XPath {
    expr: String,
    xpath: sxd_xpath::XPath,
    namespaces: Vec<(String, String)>,
    cardinality: Cardinality,
}

impl XPath {
    pub fn new(expr: &str) -> Result<Self, SelectorError> {
        let invalid = |reason: String| SelectorError::Invalid {
            selector: expr.to_string(),
            reason,
        };
        let xpath = Factory::new()
            .build(expr)
            .map_err(|e| invalid(e.to_string()))?
            .ok_or_else(|| invalid("empty expression".to_string()))?;
        Ok(Self {
            expr: expr.to_string(),
            xpath,
            namespaces: Vec::new(),
            cardinality: Cardinality::at_least(1),
        })
    }

    /// Binds `prefix` for use in the expression, e.g.
    /// `("sm", "http://www.sitemaps.org/schemas/sitemap/0.9")`.
    pub fn namespace(mut self, prefix: &str, uri: &str) -> Self {
        self.namespaces.push((prefix.to_string(), uri.to_string()));
        self
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

    fn evaluate<'d>(&self, node: Node<'d>) -> Result<Vec<Node<'d>>, SelectorError> {
        let mut context = Context::new();
        for (prefix, uri) in &self.namespaces {
            context.set_namespace(prefix, uri);
        }
        match self.xpath.evaluate(&context, node) {
            Ok(Value::Nodeset(nodes)) => Ok(nodes.document_order()),
            Ok(other) => Err(SelectorError::Evaluation {
                selector: self.to_string(),
                reason: format!("expected a node-set, got {other:?}"),
            }),
            Err(e) => Err(SelectorError::Evaluation {
                selector: self.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "XPath({})", self.expr)
    }
}

impl<'d> Selector<&'d XmlDocument> for XPath {
    type Item = Node<'d>;

    fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    fn get_items(&self, root: &'d XmlDocument) -> Result<Vec<Node<'d>>, SelectorError> {
        self.evaluate(root.as_document().root().into())
    }
}

impl<'d> Selector<Node<'d>> for XPath {
    type Item = Node<'d>;

    fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    fn get_items(&self, root: Node<'d>) -> Result<Vec<Node<'d>>, SelectorError> {
        self.evaluate(root)
    }
}
