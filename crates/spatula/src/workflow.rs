use serde_json::Value;

use crate::error::Result;
use crate::extract::{BoxedPage, Item};
use crate::output::OutputDir;
use crate::transport::Transport;

type PageProcessor = dyn Fn(Value) -> Result<Item>;

/// Runs a root page to completion, following pagination and nested pages,
/// and saves every data item as soon as it is produced.
pub struct Workflow {
    initial: BoxedPage,
    processor: Option<Box<PageProcessor>>,
    paginate: bool,
}

impl Workflow {
    pub fn new(initial: impl Into<BoxedPage>) -> Self {
        Self {
            initial: initial.into(),
            processor: None,
            paginate: true,
        }
    }

    /// Maps every item of the root page (across its pagination) to a new
    /// item, typically a detail page taking the item as input.
    pub fn with_page_processor<F>(mut self, processor: F) -> Self
    where
        F: Fn(Value) -> Result<Item> + 'static,
    {
        self.processor = Some(Box::new(processor));
        self
    }

    pub fn paginate(mut self, paginate: bool) -> Self {
        self.paginate = paginate;
        self
    }

    /// Returns how many items were saved. Items saved before an error stay
    /// on disk and are counted by `output`.
    pub async fn execute(self, transport: &dyn Transport, output: &mut OutputDir) -> Result<usize> {
        let Self {
            initial,
            processor,
            paginate,
        } = self;
        let before = output.count();
        log::info!("scraping {initial} into {}", output.path().display());

        let mut driver = Driver {
            transport,
            paginate,
            processor: processor.as_deref(),
            output,
        };
        initial.scrape(&mut driver, 0).await?;

        Ok(driver.output.count() - before)
    }
}

pub(crate) struct Driver<'d> {
    pub(crate) transport: &'d dyn Transport,
    pub(crate) paginate: bool,
    processor: Option<&'d PageProcessor>,
    output: &'d mut OutputDir,
}

impl Driver<'_> {
    /// `depth` is 0 for the root page's own items.
    pub(crate) async fn emit(&mut self, item: Item, depth: usize) -> Result<()> {
        let item = match self.processor.filter(|_| depth == 0) {
            Some(processor) => match item {
                Item::Data(value) => processor(value)?,
                page => page,
            },
            None => item,
        };
        match item {
            Item::Data(value) => {
                let path = self.output.save(&value)?;
                log::debug!("saved {}", path.display());
                Ok(())
            }
            Item::Page(page) => page.scrape(self, depth + 1).await,
        }
    }
}
