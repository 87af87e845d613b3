use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use clap::Parser;
use serde_json::{json, Value};
use spatula::{
    Extracted, HttpError, Page, PageContext, PageRun, RequestError, Response, Result,
    ScraperConfig, Source, Transport, Url, Workflow,
};
use spatula_cli::{scrape, test_page, Args, Registry, SubCommand};

/// Serves `https://site/1` to `/3`, anything else is a 404.
#[derive(Default)]
struct Site {
    requested: Mutex<Vec<String>>,
}

#[async_trait]
impl Transport for Site {
    async fn request(&self, url: &Url) -> std::result::Result<Response, RequestError> {
        self.requested.lock().unwrap().push(url.url.clone());
        match url.url.as_str() {
            "https://site/1" | "https://site/2" | "https://site/3" => {
                Ok(Response::new(url.url.clone(), 200, url.url.clone()))
            }
            other => Err(HttpError {
                status_code: Some(404),
                url: other.to_string(),
                text: "not found".into(),
            }
            .into()),
        }
    }
}

/// Two items per page, three pages.
struct Chain;

fn page_number(ctx: &PageContext<BTreeMap<String, String>>) -> u32 {
    ctx.response()
        .and_then(|r| r.url.rsplit('/').next()?.parse().ok())
        .unwrap_or(0)
}

impl Page for Chain {
    type Input = BTreeMap<String, String>;

    fn process_page<'r>(
        &'r self,
        ctx: &'r PageContext<Self::Input>,
    ) -> Result<Extracted<'r>> {
        let n = page_number(ctx);
        let tag = ctx.input().and_then(|i| i.get("tag")).cloned();
        Ok(ctx.items(["a", "b"], move |item| {
            Ok(json!({ "page": n, "item": item, "tag": tag }).into())
        }))
    }

    fn next_source(&self, ctx: &PageContext<Self::Input>) -> Result<Option<Source>> {
        let n = page_number(ctx);
        Ok((n < 3).then(|| format!("https://site/{}", n + 1).into()))
    }

    fn example_source(&self) -> Option<Source> {
        Some("https://site/1".into())
    }
}

fn registry() -> Registry {
    Registry::new()
        .page("chain", || Chain)
        .workflow("chain-workflow", || {
            Workflow::new(PageRun::new(Chain).with_source("https://site/2"))
        })
}

fn parse(args: &[&str]) -> SubCommand {
    Args::try_parse_from(std::iter::once("spatula").chain(args.iter().copied()))
        .unwrap()
        .cmd
}

async fn dry(args: &[&str]) -> (anyhow::Result<usize>, String, Vec<String>) {
    let SubCommand::Test(args) = parse(args) else {
        panic!("not a test command");
    };
    let site = Site::default();
    let mut out = Vec::new();
    let count = test_page(&registry(), &args, &site, &mut out).await;
    let requested = site.requested.lock().unwrap().clone();
    (count, String::from_utf8(out).unwrap(), requested)
}

#[tokio::test]
async fn test_follows_pagination() {
    let (count, out, requested) = dry(&["test", "chain"]).await;
    assert_eq!(count.unwrap(), 6);
    assert_eq!(requested, ["https://site/1", "https://site/2", "https://site/3"]);
    assert!(out.starts_with("1: {"), "{out}");
    assert!(out.contains("\n6: {"), "{out}");
    assert!(out.contains("paginating for Chain(source=https://site/1) source=https://site/2"));
}

#[tokio::test]
async fn test_without_pagination() {
    let (count, out, requested) = dry(&["test", "chain", "--no-pagination"]).await;
    assert_eq!(count.unwrap(), 2);
    assert_eq!(requested, ["https://site/1"]);
    assert!(out.contains(
        "pagination disabled: would paginate for Chain(source=https://site/1) source=https://site/2"
    ));
}

#[tokio::test]
async fn test_with_data_and_source() {
    let (count, out, requested) =
        dry(&["test", "chain", "-d", "tag=x", "-s", "https://site/3"]).await;
    assert_eq!(count.unwrap(), 2);
    assert_eq!(requested, ["https://site/3"]);
    assert!(out.contains(r#""tag": "x""#), "{out}");
}

#[tokio::test]
async fn test_failures() {
    let (count, _, _) = dry(&["test", "chain", "-s", "https://site/404"]).await;
    let err = count.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<spatula::Error>(),
        Some(spatula::Error::Http(HttpError {
            status_code: Some(404),
            ..
        }))
    ));

    let (count, _, requested) = dry(&["test", "nope"]).await;
    assert!(count.unwrap_err().to_string().contains("chain, chain-workflow"));
    assert!(requested.is_empty());

    let (count, _, _) = dry(&["test", "chain-workflow"]).await;
    assert!(count.is_err());
}

#[tokio::test]
async fn scrape_saves_every_item() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    let SubCommand::Scrape(args) = parse(&["scrape", "chain-workflow", "-o", out.to_str().unwrap()])
    else {
        panic!("not a scrape command");
    };

    let output = scrape(&registry(), &args, &ScraperConfig::default(), &Site::default())
        .await
        .unwrap();
    assert_eq!(output.count(), 4);
    assert_eq!(output.path(), out.as_path());

    let mut pages: Vec<u64> = std::fs::read_dir(&out)
        .unwrap()
        .map(|entry| {
            let item: Value =
                serde_json::from_slice(&std::fs::read(entry.unwrap().path()).unwrap()).unwrap();
            item["page"].as_u64().unwrap()
        })
        .collect();
    pages.sort();
    assert_eq!(pages, [2, 2, 3, 3]);
}

#[tokio::test]
async fn scrape_into_dated_directory() {
    let tmp = tempfile::tempdir().unwrap();
    let conf = ScraperConfig {
        output_root: tmp.path().to_path_buf(),
        ..Default::default()
    };
    let SubCommand::Scrape(args) = parse(&["scrape", "chain"]) else {
        panic!("not a scrape command");
    };

    // a page scraped on its own uses the source it declares, Chain has none
    let err = scrape(&registry(), &args, &conf, &Site::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<spatula::Error>(),
        Some(spatula::Error::MissingSource { .. })
    ));
    // the dated directory was still created, and left empty
    let day = std::fs::read_dir(tmp.path()).unwrap().next().unwrap().unwrap();
    assert!(day.path().join("001").is_dir());
}

#[tokio::test]
async fn scrape_refuses_non_empty_output() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("old.json"), "{}").unwrap();
    let SubCommand::Scrape(args) =
        parse(&["scrape", "chain-workflow", "-o", tmp.path().to_str().unwrap()])
    else {
        panic!("not a scrape command");
    };

    let site = Site::default();
    let err = scrape(&registry(), &args, &ScraperConfig::default(), &site)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not empty"), "{err}");
    assert!(site.requested.lock().unwrap().is_empty());
}
