pub mod css;
pub mod document;
pub mod selector;
pub mod similar_link;
pub mod xpath;

pub use crate::css::Css;
pub use crate::document::{DocumentError, HtmlDocument, XmlDocument};
pub use crate::selector::{Bound, Cardinality, Selector, SelectorError};
pub use crate::similar_link::SimilarLink;
pub use crate::xpath::XPath;

pub use scraper::ElementRef;
pub use sxd_xpath::nodeset::Node as XmlNode;
