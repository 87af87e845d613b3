use std::fmt;

use futures::future::LocalBoxFuture;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::page::{Page, PageRun};
use crate::transport::Transport;
use crate::workflow::Driver;

/// Something a page produced: data to keep, or another page to scrape in its
/// place.
pub enum Item {
    Data(Value),
    Page(BoxedPage),
}

impl Item {
    pub fn data<T: Serialize>(data: T) -> Result<Self> {
        Ok(Self::Data(serde_json::to_value(data)?))
    }

    /// The data this item stands for, scraping nested pages without
    /// following their pagination.
    pub(crate) async fn into_value(self, transport: &dyn Transport) -> Result<Value> {
        match self {
            Self::Data(value) => Ok(value),
            Self::Page(mut page) => page.resolve(transport).await,
        }
    }
}

impl From<Value> for Item {
    fn from(value: Value) -> Self {
        Self::Data(value)
    }
}

impl From<BoxedPage> for Item {
    fn from(page: BoxedPage) -> Self {
        Self::Page(page)
    }
}

impl<P: Page> From<PageRun<P>> for Item {
    fn from(run: PageRun<P>) -> Self {
        Self::Page(run.into())
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data(value) => f.debug_tuple("Data").field(value).finish(),
            Self::Page(page) => f.debug_tuple("Page").field(&page.to_string()).finish(),
        }
    }
}

pub type Items<'r> = Box<dyn Iterator<Item = Result<Item>> + 'r>;

/// What `process_page` returns: one item, or a list page's lazy items which
/// are pulled one at a time by the caller.
pub enum Extracted<'r> {
    Single(Item),
    Many(Items<'r>),
}

impl<'r> Extracted<'r> {
    pub fn single(item: impl Into<Item>) -> Self {
        Self::Single(item.into())
    }

    /// A single data item.
    pub fn data(value: impl Into<Value>) -> Self {
        Self::Single(Item::Data(value.into()))
    }

    pub fn many<It>(items: It) -> Self
    where
        It: IntoIterator<Item = Result<Item>>,
        It::IntoIter: 'r,
    {
        Self::Many(Box::new(items.into_iter()))
    }

    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many(_))
    }

    /// Lists become arrays.
    pub(crate) async fn into_value(self, transport: &dyn Transport) -> Result<Value> {
        match self {
            Self::Single(item) => item.into_value(transport).await,
            Self::Many(items) => {
                let mut values = Vec::new();
                for item in items {
                    values.push(item?.into_value(transport).await?);
                }
                Ok(Value::Array(values))
            }
        }
    }
}

impl fmt::Debug for Extracted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(item) => f.debug_tuple("Single").field(item).finish(),
            Self::Many(_) => f.write_str("Many(..)"),
        }
    }
}

pub(crate) trait DynPage {
    fn describe(&self) -> String;

    fn resolve<'a>(&'a mut self, transport: &'a dyn Transport) -> LocalBoxFuture<'a, Result<Value>>;

    fn scrape<'a, 'd>(
        self: Box<Self>,
        driver: &'a mut Driver<'d>,
        depth: usize,
    ) -> LocalBoxFuture<'a, Result<()>>;
}

impl<P: Page> DynPage for PageRun<P> {
    fn describe(&self) -> String {
        self.to_string()
    }

    fn resolve<'a>(&'a mut self, transport: &'a dyn Transport) -> LocalBoxFuture<'a, Result<Value>> {
        Box::pin(self.resolve_value(transport))
    }

    fn scrape<'a, 'd>(
        self: Box<Self>,
        driver: &'a mut Driver<'d>,
        depth: usize,
    ) -> LocalBoxFuture<'a, Result<()>> {
        Box::pin((*self).scrape_with(driver, depth))
    }
}

/// A page instance of any definition, ready to be fetched.
pub struct BoxedPage(Box<dyn DynPage>);

impl BoxedPage {
    pub(crate) fn resolve<'a>(
        &'a mut self,
        transport: &'a dyn Transport,
    ) -> LocalBoxFuture<'a, Result<Value>> {
        self.0.resolve(transport)
    }

    pub(crate) fn scrape<'a, 'd>(
        self,
        driver: &'a mut Driver<'d>,
        depth: usize,
    ) -> LocalBoxFuture<'a, Result<()>> {
        self.0.scrape(driver, depth)
    }
}

impl<P: Page> From<PageRun<P>> for BoxedPage {
    fn from(run: PageRun<P>) -> Self {
        Self(Box::new(run))
    }
}

impl fmt::Display for BoxedPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.describe())
    }
}

/// Pages that must be fetched and extracted before the declaring page, each
/// result exposed under its name. Resolved in declaration order.
#[derive(Default)]
pub struct Dependencies(Vec<(String, BoxedPage)>);

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, page: impl Into<BoxedPage>) -> Self {
        self.0.push((name.into(), page.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn into_inner(self) -> Vec<(String, BoxedPage)> {
        self.0
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.0.iter().map(|(name, page)| (name, page.to_string())))
            .finish()
    }
}
