use std::any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use futures::future;
use serde_json::Value;

use crate::context::PageContext;
use crate::error::{Error, Result};
use crate::extract::{Dependencies, Extracted};
use crate::source::Source;
use crate::transport::{HttpError, RequestError, Transport};
use crate::workflow::Driver;

/// Values a page can be constructed with.
pub trait PageInput: fmt::Debug + Clone + 'static {
    /// A URL this input points at, used as the source of last resort.
    fn url(&self) -> Option<&str> {
        None
    }
}

impl PageInput for () {}

impl PageInput for String {}

impl PageInput for Value {
    fn url(&self) -> Option<&str> {
        self.get("url")?.as_str()
    }
}

impl PageInput for BTreeMap<String, String> {
    fn url(&self) -> Option<&str> {
        self.get("url").map(String::as_str)
    }
}

/// How to fetch and extract one logical page.
///
/// A definition is immutable, every fetch happens in its own [`PageRun`].
/// Only [`Page::process_page`] is required.
pub trait Page: 'static {
    type Input: PageInput;

    /// A source every instance starts with, unless one is given explicitly.
    fn source(&self) -> Option<Source> {
        None
    }

    /// Derives the source from the input, consulted when no source was given.
    /// `Ok(None)` falls back to [`PageInput::url`].
    fn source_from_input(&self, _input: &Self::Input) -> Result<Option<Source>> {
        Ok(None)
    }

    fn dependencies(&self, _input: Option<&Self::Input>) -> Dependencies {
        Dependencies::new()
    }

    /// Resolve sibling dependencies concurrently instead of one by one.
    fn concurrent_dependencies(&self) -> bool {
        false
    }

    /// Runs once after a successful fetch.
    fn postprocess_response(&self, _ctx: &mut PageContext<Self::Input>) -> Result<()> {
        Ok(())
    }

    /// Runs instead of [`Page::postprocess_response`] when the transport
    /// reports an error. Returning `Ok` makes the error a legitimate outcome,
    /// extraction then runs without a response.
    fn process_error_response(
        &self,
        _ctx: &mut PageContext<Self::Input>,
        error: HttpError,
    ) -> Result<()> {
        Err(error.into())
    }

    fn process_page<'r>(&'r self, ctx: &'r PageContext<Self::Input>) -> Result<Extracted<'r>>;

    /// The source of the next page in a paginated chain.
    fn next_source(&self, _ctx: &PageContext<Self::Input>) -> Result<Option<Source>> {
        Ok(None)
    }

    /// Input used by `spatula test` when none is provided.
    fn example_input(&self) -> Option<Self::Input> {
        None
    }

    /// Source used by `spatula test` when none is provided.
    fn example_source(&self) -> Option<Source> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Created,
    SourceResolved,
    DependenciesResolved,
    Fetched,
    Errored,
    Extracted,
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self {
            Self::Created => "created",
            Self::SourceResolved => "source-resolved",
            Self::DependenciesResolved => "dependencies-resolved",
            Self::Fetched => "fetched",
            Self::Errored => "errored",
            Self::Extracted => "extracted",
        };
        f.write_str(state)
    }
}

/// A single-use instance of a [`Page`] definition: one fetch, one extraction.
pub struct PageRun<P: Page> {
    page: Rc<P>,
    ctx: PageContext<P::Input>,
    state: PageState,
}

impl<P: Page> PageRun<P> {
    pub fn new(page: P) -> Self {
        Self::shared(Rc::new(page))
    }

    /// A new instance of an already shared definition.
    pub fn shared(page: Rc<P>) -> Self {
        let target = any::type_name::<P>();
        Self {
            page,
            ctx: PageContext::new(target, short_name(target)),
            state: PageState::Created,
        }
    }

    pub fn with_input(mut self, input: P::Input) -> Self {
        self.ctx.input = Some(input);
        self
    }

    pub fn with_source(mut self, source: impl Into<Source>) -> Self {
        self.ctx.source = Some(source.into());
        self
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn context(&self) -> &PageContext<P::Input> {
        &self.ctx
    }

    pub fn source(&self) -> Option<&Source> {
        self.ctx.source()
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    /// The `log` target, the definition's full type name.
    pub fn logger_target(&self) -> &'static str {
        self.ctx.target
    }

    /// Picks the source once: explicit, then the definition's own, then the
    /// derivation hook, then the input's URL.
    pub fn resolve_source(&mut self) -> Result<&Source> {
        let resolved = match self.ctx.source.take().or_else(|| self.page.source()) {
            Some(source) => source,
            None => {
                let derived = match &self.ctx.input {
                    Some(input) => match self.page.source_from_input(input)? {
                        Some(source) => Some(source),
                        None => input.url().map(Source::from),
                    },
                    None => None,
                };
                derived.ok_or_else(|| Error::MissingSource {
                    page: self.to_string(),
                })?
            }
        };
        if self.state == PageState::Created {
            self.state = PageState::SourceResolved;
        }
        Ok(self.ctx.source.insert(resolved))
    }

    /// Resolves the source and dependencies, then fetches and dispatches to
    /// the postprocess or error hook.
    pub async fn fetch_data(&mut self, transport: &dyn Transport) -> Result<()> {
        if !matches!(self.state, PageState::Created | PageState::SourceResolved) {
            return Err(self.lifecycle("fetch"));
        }
        self.resolve_source()?;
        self.resolve_dependencies(transport).await?;

        let target = self.ctx.target;
        let fetched = match &self.ctx.source {
            Some(Source::Url(url)) => {
                log::info!(target: target, "fetching {url} for {}", self.ctx.name);
                transport.request(url).await.map(Some)
            }
            _ => Ok(None),
        };

        match fetched {
            Ok(response) => {
                self.ctx.response = response;
                self.state = PageState::Fetched;
                self.page.postprocess_response(&mut self.ctx)
            }
            Err(RequestError::Http(error)) => {
                log::debug!(target: target, "{error}, calling error hook");
                self.state = PageState::Errored;
                self.page.process_error_response(&mut self.ctx, error)
            }
            Err(RequestError::Other(e)) => Err(e.into()),
        }
    }

    async fn resolve_dependencies(&mut self, transport: &dyn Transport) -> Result<()> {
        let mut dependencies = self.page.dependencies(self.ctx.input.as_ref()).into_inner();
        let target = self.ctx.target;

        if self.page.concurrent_dependencies() && dependencies.len() > 1 {
            let results = future::join_all(
                dependencies
                    .iter_mut()
                    .map(|(_, dependency)| dependency.resolve(transport)),
            )
            .await;
            let mut failure = None;
            for ((name, _), result) in dependencies.iter().zip(results) {
                match result {
                    Ok(value) => {
                        self.ctx.dependencies.insert(name.clone(), value);
                    }
                    Err(e) if failure.is_none() => failure = Some(e),
                    Err(e) => log::error!(target: target, "dependency {name} also failed: {e}"),
                }
            }
            if let Some(e) = failure {
                return Err(e);
            }
        } else {
            for (name, dependency) in dependencies.iter_mut() {
                log::debug!(target: target, "resolving dependency {name}: {dependency}");
                let value = dependency.resolve(transport).await?;
                self.ctx.dependencies.insert(name.clone(), value);
            }
        }

        self.state = PageState::DependenciesResolved;
        Ok(())
    }

    /// Runs the extraction, once the fetch either succeeded or was handled by
    /// the error hook.
    pub fn process_page(&mut self) -> Result<Extracted<'_>> {
        if !matches!(self.state, PageState::Fetched | PageState::Errored) {
            return Err(self.lifecycle("extract"));
        }
        self.state = PageState::Extracted;
        self.page.process_page(&self.ctx)
    }

    pub fn next_source(&self) -> Result<Option<Source>> {
        match self.state {
            PageState::Fetched | PageState::Errored | PageState::Extracted => {
                self.page.next_source(&self.ctx)
            }
            _ => Err(self.lifecycle("paginate")),
        }
    }

    /// A fresh instance of the same definition and input, bound to `source`.
    pub fn next_page(&self, source: Source) -> Self {
        let mut next = Self::shared(Rc::clone(&self.page));
        next.ctx.input = self.ctx.input.clone();
        next.with_source(source)
    }

    pub(crate) async fn resolve_value(&mut self, transport: &dyn Transport) -> Result<Value> {
        self.fetch_data(transport).await?;
        self.process_page()?.into_value(transport).await
    }

    /// Fetches, extracts and hands every item to the driver, following
    /// pagination while the driver allows it.
    pub(crate) async fn scrape_with(self, driver: &mut Driver<'_>, depth: usize) -> Result<()> {
        let mut run = self;
        loop {
            run.fetch_data(driver.transport).await?;
            match run.process_page()? {
                Extracted::Single(item) => driver.emit(item, depth).await?,
                Extracted::Many(items) => {
                    for item in items {
                        driver.emit(item?, depth).await?;
                    }
                }
            }

            let target = run.ctx.target;
            match run.next_source()? {
                Some(source) if driver.paginate => {
                    log::info!(target: target, "paginating for {run} source={source}");
                    run = run.next_page(source);
                }
                Some(source) => {
                    log::info!(
                        target: target,
                        "pagination disabled: would paginate for {run} source={source}"
                    );
                    return Ok(());
                }
                None => return Ok(()),
            }
        }
    }

    fn lifecycle(&self, action: &'static str) -> Error {
        Error::Lifecycle {
            page: self.ctx.name.to_string(),
            action,
            state: self.state,
        }
    }
}

impl<P: Page> fmt::Display for PageRun<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.ctx.name)?;
        if let Some(input) = &self.ctx.input {
            write!(f, "input={input:?}")?;
            if self.ctx.source.is_some() {
                f.write_str(" ")?;
            }
        }
        if let Some(source) = &self.ctx.source {
            write!(f, "source={source}")?;
        }
        f.write_str(")")
    }
}

fn short_name(type_name: &'static str) -> &'static str {
    let path = type_name.split('<').next().unwrap_or(type_name);
    path.rsplit("::").next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names() {
        assert_eq!(short_name("a::b::DummyPage"), "DummyPage");
        assert_eq!(short_name("DummyPage"), "DummyPage");
        assert_eq!(short_name("a::Wrapper<b::Inner>"), "Wrapper");
    }

    #[test]
    fn input_urls() {
        let value = serde_json::json!({"url": "https://example.com"});
        assert_eq!(value.url(), Some("https://example.com"));
        assert_eq!(serde_json::json!({"url": 3}).url(), None);

        let mut map = BTreeMap::new();
        map.insert("url".to_string(), "https://example.com".to_string());
        assert_eq!(map.url(), Some("https://example.com"));
        assert_eq!("https://example.com".to_string().url(), None);
    }
}
