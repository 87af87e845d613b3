use std::collections::BTreeMap;
use std::io::Write;
use std::marker::PhantomData;

use futures::future::LocalBoxFuture;
use serde::de::DeserializeOwned;
use spatula::{Page, PageRun, Transport, Workflow};

use crate::dry_run::{dry_run, DryRun};

/// Something the command line can run by name.
pub trait Definition {
    /// Runs one page chain, printing its items to `out`. Returns how many
    /// items were printed.
    fn dry_run<'a>(
        &'a self,
        opts: &'a DryRun,
        transport: &'a dyn Transport,
        out: &'a mut dyn Write,
    ) -> LocalBoxFuture<'a, anyhow::Result<usize>>;

    fn workflow(&self) -> anyhow::Result<Workflow>;
}

struct PageDefinition<P, F> {
    factory: F,
    _page: PhantomData<fn() -> P>,
}

impl<P, F> Definition for PageDefinition<P, F>
where
    P: Page,
    P::Input: DeserializeOwned,
    F: Fn() -> P,
{
    fn dry_run<'a>(
        &'a self,
        opts: &'a DryRun,
        transport: &'a dyn Transport,
        out: &'a mut dyn Write,
    ) -> LocalBoxFuture<'a, anyhow::Result<usize>> {
        Box::pin(dry_run((self.factory)(), opts, transport, out))
    }

    /// A page scraped on its own, with the source it declares.
    fn workflow(&self) -> anyhow::Result<Workflow> {
        Ok(Workflow::new(PageRun::new((self.factory)())))
    }
}

struct WorkflowDefinition<F>(F);

impl<F> Definition for WorkflowDefinition<F>
where
    F: Fn() -> Workflow,
{
    fn dry_run<'a>(
        &'a self,
        _opts: &'a DryRun,
        _transport: &'a dyn Transport,
        _out: &'a mut dyn Write,
    ) -> LocalBoxFuture<'a, anyhow::Result<usize>> {
        Box::pin(async { Err(anyhow::anyhow!("workflows cannot be tested, test their pages")) })
    }

    fn workflow(&self) -> anyhow::Result<Workflow> {
        Ok((self.0)())
    }
}

/// Page and workflow definitions by name.
#[derive(Default)]
pub struct Registry {
    definitions: BTreeMap<String, Box<dyn Definition>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a page, `factory` builds its definition for every run.
    pub fn page<P, F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        P: Page,
        P::Input: DeserializeOwned,
        F: Fn() -> P + 'static,
    {
        let definition = PageDefinition {
            factory,
            _page: PhantomData,
        };
        self.definitions.insert(name.into(), Box::new(definition));
        self
    }

    pub fn workflow<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Workflow + 'static,
    {
        self.definitions
            .insert(name.into(), Box::new(WorkflowDefinition(factory)));
        self
    }

    pub fn get(&self, name: &str) -> anyhow::Result<&dyn Definition> {
        match self.definitions.get(name) {
            Some(definition) => Ok(definition.as_ref()),
            None => {
                let known = self.names().collect::<Vec<_>>().join(", ");
                anyhow::bail!("no page or workflow named {name:?}, known names: {known}")
            }
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }
}
