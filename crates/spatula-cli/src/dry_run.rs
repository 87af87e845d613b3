use std::io::Write;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use spatula::{Extracted, Item, Page, PageRun, Source, Transport};

/// How `spatula test` runs a page.
#[derive(Debug, Clone)]
pub struct DryRun {
    /// Input fields, replacing the page's example input when not empty.
    pub data: Vec<(String, String)>,
    /// Replaces the page's example source.
    pub source: Option<String>,
    pub paginate: bool,
}

impl Default for DryRun {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            source: None,
            paginate: true,
        }
    }
}

impl DryRun {
    /// Fields left out of `data` are filled with a `~field` placeholder.
    fn input<I: DeserializeOwned>(&self) -> anyhow::Result<Option<I>> {
        if self.data.is_empty() {
            return Ok(None);
        }
        let mut fields = self
            .data
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect::<Map<_, _>>();
        loop {
            match serde_json::from_value(Value::Object(fields.clone())) {
                Ok(input) => return Ok(Some(input)),
                Err(e) => match missing_field(&e) {
                    Some(name) if !fields.contains_key(&name) => {
                        log::warn!("no data for {name}, using ~{name}");
                        let placeholder = Value::String(format!("~{name}"));
                        fields.insert(name, placeholder);
                    }
                    _ => anyhow::bail!("invalid input data: {e}"),
                },
            }
        }
    }
}

fn missing_field(e: &serde_json::Error) -> Option<String> {
    let msg = e.to_string();
    let name = msg.strip_prefix("missing field `")?.split('`').next()?;
    Some(name.to_string())
}

/// Runs `page` and the pages it paginates to, printing items as they are
/// pulled. Nested pages are printed, not fetched.
pub async fn dry_run<P>(
    page: P,
    opts: &DryRun,
    transport: &dyn Transport,
    out: &mut dyn Write,
) -> anyhow::Result<usize>
where
    P: Page,
    P::Input: DeserializeOwned,
{
    let page = Rc::new(page);
    let input = match opts.input()? {
        Some(input) => Some(input),
        None => page.example_input(),
    };
    let source = match &opts.source {
        Some(source) => Some(Source::from(source.as_str())),
        None => page.example_source(),
    };

    let mut run = PageRun::shared(page);
    if let Some(input) = input {
        run = run.with_input(input);
    }
    if let Some(source) = source {
        run = run.with_source(source);
    }

    let mut count = 0;
    loop {
        run.fetch_data(transport).await?;
        match run.process_page()? {
            Extracted::Single(item) => {
                count += 1;
                print_item(out, count, item)?;
            }
            Extracted::Many(items) => {
                for item in items {
                    count += 1;
                    print_item(out, count, item?)?;
                }
            }
        }

        match run.next_source()? {
            Some(source) if opts.paginate => {
                writeln!(out, "paginating for {run} source={source}")?;
                run = run.next_page(source);
            }
            Some(source) => {
                writeln!(out, "pagination disabled: would paginate for {run} source={source}")?;
                break;
            }
            None => break,
        }
    }

    log::info!("{count} items from {}", run.context().logger_target());
    Ok(count)
}

fn print_item(out: &mut dyn Write, n: usize, item: Item) -> anyhow::Result<()> {
    match item {
        Item::Data(value) => writeln!(out, "{n}: {}", serde_json::to_string_pretty(&value)?)?,
        Item::Page(page) => writeln!(out, "{n}: {page}")?,
    }
    Ok(())
}
