//! Scrapers for quotes.toscrape.com, the pages the `spatula` binary ships with.

use serde_json::{json, Value};
use spatula::{
    Css, Extracted, Item, Page, PageContext, PageRun, Result, Selector, Source, Workflow,
};

pub fn registry() -> spatula_cli::Registry {
    spatula_cli::Registry::new()
        .page("quotes", || QuoteList)
        .page("author", || AuthorDetail)
        .workflow("quotes-with-authors", || {
            Workflow::new(PageRun::new(QuoteList)).with_page_processor(|quote| {
                Ok(Item::from(PageRun::new(AuthorDetail).with_input(quote)))
            })
        })
}

/// One item per quote, paginating through `li.next`.
pub struct QuoteList;

impl Page for QuoteList {
    type Input = ();

    fn source(&self) -> Option<Source> {
        Some("https://quotes.toscrape.com/".into())
    }

    fn process_page<'r>(&'r self, ctx: &'r PageContext<()>) -> Result<Extracted<'r>> {
        let doc = ctx.html()?;
        let quotes = Css::new("div.quote")?.select(doc)?;
        let text = Css::new("span.text")?;
        let author = Css::new("small.author")?;
        let about = Css::new("a[href*='/author/']")?;
        let tags = Css::new("a.tag")?.min_items(0);

        Ok(ctx.items(quotes, move |quote| {
            let link = about.select_one(quote)?;
            let author_url = link.value().attr("href").map(|href| doc.absolute_url(href));
            Ok(json!({
                "text": text.select_one(quote)?.text().collect::<String>(),
                "author": author.select_one(quote)?.text().collect::<String>(),
                "tags": tags
                    .select(quote)?
                    .iter()
                    .map(|tag| tag.text().collect::<String>())
                    .collect::<Vec<_>>(),
                "url": author_url,
            })
            .into())
        }))
    }

    fn next_source(&self, ctx: &PageContext<()>) -> Result<Option<Source>> {
        let doc = ctx.html()?;
        let next = Css::new("li.next > a")?.max_items(1).min_items(0).select(doc)?;
        Ok(next
            .first()
            .and_then(|a| a.value().attr("href"))
            .map(|href| doc.absolute_url(href).into()))
    }
}

/// Details of the author of a quote, the input being the quote itself.
pub struct AuthorDetail;

impl Page for AuthorDetail {
    type Input = Value;

    fn process_page<'r>(&'r self, ctx: &'r PageContext<Value>) -> Result<Extracted<'r>> {
        let doc = ctx.html()?;
        let field = |expr: &str| -> Result<String> {
            let el = Css::new(expr)?.select_one(doc)?;
            Ok(el.text().collect::<String>().trim().to_string())
        };
        let mut author = json!({
            "name": field("h3.author-title")?,
            "born": field("span.author-born-date")?,
            "location": field("span.author-born-location")?,
        });
        if let Some(quote) = ctx.input() {
            author["quote"] = quote["text"].clone();
        }
        Ok(Extracted::data(author))
    }

    fn example_input(&self) -> Option<Value> {
        Some(json!({
            "text": "The world as we have created it is a process of our thinking.",
            "url": "https://quotes.toscrape.com/author/Albert-Einstein/",
        }))
    }
}
