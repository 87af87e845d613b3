mod config;
mod context;
mod error;
mod extract;
mod output;
mod page;
mod source;
mod transport;
mod workflow;

pub use config::ScraperConfig;
pub use context::PageContext;
pub use error::{skip, Error, Result};
pub use extract::{BoxedPage, Dependencies, Extracted, Item, Items};
pub use output::OutputDir;
pub use page::{Page, PageInput, PageRun, PageState};
pub use source::{Body, Source, Url};
pub use transport::{HttpError, HttpTransport, RequestError, Response, Transport};
pub use workflow::Workflow;

pub use spatula_selector as selector;
pub use spatula_selector::{
    Cardinality, Css, HtmlDocument, Selector, SelectorError, SimilarLink, XPath, XmlDocument,
};

pub use anyhow;
pub use serde_json;
