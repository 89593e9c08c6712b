use common::LINK_CAP;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Title, body text, and outgoing links extracted from one fetched document.
#[derive(Debug)]
pub struct HarvestedPage {
    pub title: String,
    pub text: String,
    pub outgoing_links: Vec<String>,
}

/// Extract what the replicas index from raw HTML. Outgoing links are
/// resolved against `base`, restricted to absolute http/https urls,
/// de-duplicated in document order, and capped at `LINK_CAP`.
pub fn harvest(base: &Url, html: &str) -> HarvestedPage {
    let sel_title = Selector::parse("title").expect("valid selector");
    let sel_body = Selector::parse("body").expect("valid selector");
    let sel_a = Selector::parse("a[href]").expect("valid selector");

    let doc = Html::parse_document(html);
    let title = doc
        .select(&sel_title)
        .next()
        .map(|n| n.text().collect::<String>())
        .unwrap_or_default()
        .trim()
        .to_string();
    let text = doc
        .select(&sel_body)
        .next()
        .map(|n| n.text().collect::<String>())
        .unwrap_or_default()
        .trim()
        .to_string();

    let mut seen = HashSet::new();
    let mut outgoing_links = Vec::new();
    for a in doc.select(&sel_a) {
        if outgoing_links.len() >= LINK_CAP {
            break;
        }
        let Some(href) = a.value().attr("href") else { continue };
        let Ok(resolved) = Url::parse(href).or_else(|_| base.join(href)) else { continue };
        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }
        let link = resolved.to_string();
        if seen.insert(link.clone()) {
            outgoing_links.push(link);
        }
    }

    HarvestedPage {
        title,
        text,
        outgoing_links,
    }
}
