use std::collections::BTreeMap;

use once_cell::unsync::OnceCell;
use serde_json::Value;
use spatula_selector::{HtmlDocument, XmlDocument};

use crate::error::{Error, Result};
use crate::extract::{Extracted, Item};
use crate::source::Source;
use crate::transport::Response;

/// Everything a page instance knows while its hooks run: its input and
/// source, the fetched response and the results of its dependencies.
///
/// Parsed views of the response are computed on first use and cached.
pub struct PageContext<I> {
    pub(crate) target: &'static str,
    pub(crate) name: &'static str,
    pub(crate) input: Option<I>,
    pub(crate) source: Option<Source>,
    pub(crate) response: Option<Response>,
    pub(crate) dependencies: BTreeMap<String, Value>,
    html: OnceCell<HtmlDocument>,
    xml: OnceCell<XmlDocument>,
    json: OnceCell<Value>,
}

impl<I> PageContext<I> {
    pub(crate) fn new(target: &'static str, name: &'static str) -> Self {
        Self {
            target,
            name,
            input: None,
            source: None,
            response: None,
            dependencies: BTreeMap::new(),
            html: OnceCell::new(),
            xml: OnceCell::new(),
            json: OnceCell::new(),
        }
    }

    /// The `log` target of the page this context belongs to.
    pub fn logger_target(&self) -> &'static str {
        self.target
    }

    pub fn input(&self) -> Option<&I> {
        self.input.as_ref()
    }

    pub fn source(&self) -> Option<&Source> {
        self.source.as_ref()
    }

    /// Absent until a fetch succeeds, and for [`Source::Null`].
    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    /// Mutable access for postprocessing, drops any cached parse.
    pub fn response_mut(&mut self) -> Option<&mut Response> {
        self.html.take();
        self.xml.take();
        self.json.take();
        self.response.as_mut()
    }

    /// The result of the dependency declared under `name`.
    pub fn dependency(&self, name: &str) -> Option<&Value> {
        self.dependencies.get(name)
    }

    pub fn dependencies(&self) -> &BTreeMap<String, Value> {
        &self.dependencies
    }

    fn require_response(&self) -> Result<&Response> {
        self.response.as_ref().ok_or_else(|| Error::MissingResponse {
            page: self.name.to_string(),
        })
    }

    /// The response as HTML, links resolving against the source URL.
    pub fn html(&self) -> Result<&HtmlDocument> {
        let response = self.require_response()?;
        Ok(self.html.get_or_init(|| {
            let base = self.source.as_ref().and_then(Source::url);
            HtmlDocument::parse(&response.text(), base)
        }))
    }

    pub fn xml(&self) -> Result<&XmlDocument> {
        let response = self.require_response()?;
        self.xml
            .get_or_try_init(|| Ok(XmlDocument::parse(&response.text())?))
    }

    pub fn json(&self) -> Result<&Value> {
        let response = self.require_response()?;
        self.json.get_or_try_init(|| Ok(response.json()?))
    }

    /// Rows of a CSV response keyed by header, parsed lazily.
    pub fn csv_records(
        &self,
    ) -> Result<impl Iterator<Item = Result<BTreeMap<String, String>>> + '_> {
        let response = self.require_response()?;
        Ok(csv::Reader::from_reader(response.content())
            .into_deserialize::<BTreeMap<String, String>>()
            .map(|record| record.map_err(Error::from)))
    }

    /// Turns raw list entries into a lazy list of items.
    ///
    /// Entries for which `process` returns [`Error::SkipItem`] are logged and
    /// left out, any other error is yielded and ends the list for the caller.
    pub fn items<'r, T, It, F>(&'r self, items: It, mut process: F) -> Extracted<'r>
    where
        It: IntoIterator<Item = T>,
        It::IntoIter: 'r,
        F: FnMut(T) -> Result<Item> + 'r,
    {
        let target = self.target;
        Extracted::Many(Box::new(items.into_iter().filter_map(
            move |raw| match process(raw) {
                Err(Error::SkipItem(msg)) => {
                    log::info!(target: target, "SkipItem: {msg}");
                    None
                }
                result => Some(result),
            },
        )))
    }
}
