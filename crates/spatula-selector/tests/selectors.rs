use spatula_selector::{
    Bound, Cardinality, Css, HtmlDocument, Selector, SelectorError, SimilarLink, XPath,
    XmlDocument,
};

const PAGE: &str = r#"
<html>
  <body>
    <ul id="people">
      <li><a href="/person/1">Alice</a></li>
      <li><a href="/person/2">Bob</a></li>
      <li><a href="/person/2">Bob again</a></li>
      <li><a href="https://elsewhere.org/person/3">Carol</a></li>
    </ul>
    <a class="next" href="?page=2">next</a>
  </body>
</html>
"#;

const SITEMAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/a</loc></url>
  <url><loc>https://example.com/b</loc></url>
</urlset>
"#;

fn document() -> HtmlDocument {
    HtmlDocument::parse(PAGE, Some("https://example.com/people"))
}

#[test]
fn css_on_document_and_element() {
    let doc = document();

    let items = Css::new("#people li").unwrap().select(&doc).unwrap();
    assert_eq!(items.len(), 4);

    let names: Vec<String> = items
        .into_iter()
        .map(|li| {
            let a = Css::new("a").unwrap().select_one(li).unwrap();
            a.text().collect::<String>()
        })
        .collect();
    assert_eq!(names, ["Alice", "Bob", "Bob again", "Carol"]);
}

#[test]
fn css_defaults_to_at_least_one() {
    let doc = document();
    match Css::new("table").unwrap().select(&doc) {
        Err(SelectorError::Cardinality {
            kind, expected, actual, ..
        }) => {
            assert_eq!(kind, Bound::Min);
            assert_eq!(expected, 1);
            assert_eq!(actual, 0);
        }
        other => panic!("unexpected {other:?}"),
    }

    let none = Css::new("table")
        .unwrap()
        .select_with(&doc, Cardinality::at_least(0))
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn css_bounds_never_truncate() {
    let doc = document();
    let css = Css::new("li").unwrap().max_items(2);
    assert!(css.select(&doc).is_err());
    assert_eq!(
        css.select_with(&doc, Cardinality::at_most(10))
            .unwrap()
            .len(),
        4
    );
}

#[test]
fn similar_link_dedups_and_resolves() {
    let doc = document();
    let links = SimilarLink::new(r"https://example\.com/person/\d+")
        .unwrap()
        .select(&doc)
        .unwrap();
    let hrefs: Vec<&str> = links
        .iter()
        .filter_map(|a| a.value().attr("href"))
        .collect();
    assert_eq!(hrefs, ["/person/1", "/person/2"]);
}

#[test]
fn similar_link_is_anchored() {
    let doc = document();
    let next = SimilarLink::new(r"https://example\.com/people\?page=")
        .unwrap()
        .select_one(&doc)
        .unwrap();
    assert_eq!(next.text().collect::<String>(), "next");

    assert!(SimilarLink::new("person")
        .unwrap()
        .min_items(1)
        .select(&doc)
        .is_err());
}

#[test]
fn xpath_with_namespace() {
    let doc = XmlDocument::parse(SITEMAP).unwrap();
    let xpath = XPath::new("//sm:loc")
        .unwrap()
        .namespace("sm", "http://www.sitemaps.org/schemas/sitemap/0.9")
        .num_items(2);
    let locs: Vec<String> = xpath
        .select(&doc)
        .unwrap()
        .into_iter()
        .map(|node| node.string_value())
        .collect();
    assert_eq!(locs, ["https://example.com/a", "https://example.com/b"]);

    assert!(xpath.select_with(&doc, Cardinality::exactly(3)).is_err());
}

#[test]
fn xpath_must_yield_nodes() {
    let doc = XmlDocument::parse(SITEMAP).unwrap();
    let count = XPath::new("count(//*)").unwrap();
    assert!(matches!(
        count.select(&doc),
        Err(SelectorError::Evaluation { .. })
    ));
    assert!(matches!(
        XPath::new("//["),
        Err(SelectorError::Invalid { .. })
    ));
}

#[test]
fn whole_cardinality_can_be_replaced() {
    let doc = document();
    let two = Cardinality::exactly(2);

    let css = Css::new("#people li").unwrap().cardinality_of(two);
    assert!(css.select(&doc).is_err());
    assert_eq!(<Css as Selector<&HtmlDocument>>::cardinality(&css), two);

    let links = SimilarLink::new(r"https://example\.com/person/")
        .unwrap()
        .cardinality_of(two);
    assert_eq!(links.select(&doc).unwrap().len(), 2);

    let sitemap = XmlDocument::parse(SITEMAP).unwrap();
    let locs = XPath::new("//sm:loc")
        .unwrap()
        .namespace("sm", "http://www.sitemaps.org/schemas/sitemap/0.9")
        .cardinality_of(Cardinality::any());
    assert_eq!(locs.select(&sitemap).unwrap().len(), 2);
    assert!(XPath::new("//nothing")
        .unwrap()
        .cardinality_of(Cardinality::any())
        .select(&sitemap)
        .unwrap()
        .is_empty());
}
