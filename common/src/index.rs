use crate::tokenizer::tokenize;
use crate::{PageRecord, SearchHit, PAGE_SIZE, SNIPPET_LEN};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One replica's index state: page metadata, term postings, and the
/// incoming-link graph. Callers are expected to wrap this in a lock; the
/// struct itself is plain single-threaded data.
///
/// Known limitation: re-ingesting a url with changed text does not purge
/// postings built from the old text, so a page can keep matching terms it no
/// longer contains.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PageIndex {
    pages: HashMap<String, PageRecord>,
    postings: HashMap<String, HashSet<String>>,
    incoming: HashMap<String, HashSet<String>>,
}

impl PageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a page: replace its record wholesale, add it to the posting set
    /// of every token in `text`, and record it as a referrer of each outgoing
    /// link. Incoming-link entries are created eagerly (a url that has never
    /// been linked to still gets an empty referrer set) and never removed.
    pub fn ingest(&mut self, url: &str, title: &str, text: &str, outgoing: &[String]) {
        self.pages.insert(
            url.to_string(),
            PageRecord {
                title: title.to_string(),
                snippet: make_snippet(text),
                outgoing_links: outgoing.to_vec(),
            },
        );

        for token in tokenize(text) {
            self.postings.entry(token).or_default().insert(url.to_string());
        }

        self.incoming.entry(url.to_string()).or_default();
        for link in outgoing {
            self.incoming
                .entry(link.clone())
                .or_default()
                .insert(url.to_string());
        }
    }

    /// Intersection search with popularity ranking and fixed-size pagination.
    ///
    /// Any term with no postings empties the whole result (no partial
    /// matches). Hits are ordered by descending incoming-referrer count, ties
    /// by ascending url so repeated queries are reproducible. `page` is
    /// 1-indexed; pages past the end are empty. Every hit carries the
    /// pre-pagination total.
    pub fn search(&self, terms: &[String], page: usize) -> Vec<SearchHit> {
        if terms.is_empty() {
            return Vec::new();
        }

        let mut result: HashSet<&str> = HashSet::new();
        let mut first = true;
        for term in terms {
            match self.postings.get(&term.to_lowercase()) {
                None => return Vec::new(),
                Some(urls) => {
                    if first {
                        result = urls.iter().map(String::as_str).collect();
                        first = false;
                    } else {
                        result.retain(|u| urls.contains(*u));
                    }
                }
            }
        }
        if result.is_empty() {
            return Vec::new();
        }

        let total = result.len();
        let mut ranked: Vec<&str> = result.into_iter().collect();
        ranked.sort_by(|a, b| {
            self.incoming_count(b)
                .cmp(&self.incoming_count(a))
                .then_with(|| a.cmp(b))
        });

        let from = page.max(1).saturating_sub(1) * PAGE_SIZE;
        if from >= ranked.len() {
            return Vec::new();
        }
        let to = (from + PAGE_SIZE).min(ranked.len());

        ranked[from..to]
            .iter()
            .map(|url| {
                let record = self.pages.get(*url);
                let title = record
                    .map(|r| r.title.trim())
                    .filter(|t| !t.is_empty())
                    .unwrap_or(url)
                    .to_string();
                SearchHit {
                    url: (*url).to_string(),
                    title,
                    snippet: record.map(|r| r.snippet.clone()).unwrap_or_default(),
                    incoming_link_count: self.incoming_count(url),
                    total_results: total,
                }
            })
            .collect()
    }

    pub fn incoming_count(&self, url: &str) -> usize {
        self.incoming.get(url).map_or(0, HashSet::len)
    }

    /// Referrers of `url`, sorted for reproducible output. Unknown urls
    /// return empty rather than an error.
    pub fn incoming_links(&self, url: &str) -> Vec<String> {
        let mut links: Vec<String> = self
            .incoming
            .get(url)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default();
        links.sort();
        links
    }

    pub fn page(&self, url: &str) -> Option<&PageRecord> {
        self.pages.get(url)
    }

    /// Number of ingested pages (not postings, not graph nodes).
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

fn make_snippet(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= SNIPPET_LEN {
        return trimmed.to_string();
    }
    let mut snippet: String = trimmed.chars().take(SNIPPET_LEN).collect();
    snippet.push_str("...");
    snippet
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn ingest_then_search_and_link_graph() {
        let mut idx = PageIndex::new();
        idx.ingest("a", "Page A", "cats are great", &["b".to_string()]);
        idx.ingest("b", "Page B", "dogs", &[]);

        let hits = idx.search(&terms(&["cats"]), 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "a");
        assert_eq!(hits[0].incoming_link_count, 0);
        assert_eq!(hits[0].total_results, 1);
        assert_eq!(idx.incoming_links("b"), vec!["a".to_string()]);
        assert_eq!(idx.len(), 2);
    }

    #[test]
    fn intersection_requires_every_term() {
        let mut idx = PageIndex::new();
        idx.ingest("a", "", "cats and dogs", &[]);
        idx.ingest("b", "", "cats only", &[]);

        assert_eq!(idx.search(&terms(&["cats"]), 1).len(), 2);
        let both = idx.search(&terms(&["cats", "dogs"]), 1);
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].url, "a");
        // Unknown term empties the whole query, never a partial match.
        assert!(idx.search(&terms(&["cats", "zebras"]), 1).is_empty());
        assert!(idx.search(&[], 1).is_empty());
    }

    #[test]
    fn ranking_by_incoming_count_with_lexical_ties() {
        let mut idx = PageIndex::new();
        idx.ingest("a", "", "word", &[]);
        idx.ingest("b", "", "word", &[]);
        idx.ingest("c", "", "word", &["b".to_string()]);
        idx.ingest("d", "", "word", &["b".to_string(), "a".to_string()]);

        let hits = idx.search(&terms(&["word"]), 1);
        let urls: Vec<&str> = hits.iter().map(|h| h.url.as_str()).collect();
        // b has 2 referrers, a has 1, c/d tie at 0 and order lexically.
        assert_eq!(urls, vec!["b", "a", "c", "d"]);
        // Repeated calls are stable.
        let again: Vec<String> = idx
            .search(&terms(&["word"]), 1)
            .into_iter()
            .map(|h| h.url)
            .collect();
        assert_eq!(again, urls);
    }

    #[test]
    fn pagination_is_complete_and_bounded() {
        let mut idx = PageIndex::new();
        for i in 0..11 {
            idx.ingest(&format!("u{i:02}"), "", "word", &[]);
        }

        let p1 = idx.search(&terms(&["word"]), 1);
        let p2 = idx.search(&terms(&["word"]), 2);
        let p3 = idx.search(&terms(&["word"]), 3);
        assert_eq!(p1.len(), 10);
        assert_eq!(p2.len(), 1);
        assert!(p3.is_empty());
        assert!(p1.iter().chain(&p2).all(|h| h.total_results == 11));

        let mut all: Vec<String> = p1.into_iter().chain(p2).map(|h| h.url).collect();
        let full: Vec<String> = (0..11).map(|i| format!("u{i:02}")).collect();
        all.sort();
        assert_eq!(all, full);
    }

    #[test]
    fn reingest_replaces_record_but_keeps_old_postings() {
        let mut idx = PageIndex::new();
        idx.ingest("a", "Old", "stale words", &["x".to_string()]);
        idx.ingest("a", "New", "fresh words", &[]);

        let record = idx.page("a").unwrap();
        assert_eq!(record.title, "New");
        assert!(record.outgoing_links.is_empty());
        assert_eq!(idx.len(), 1);
        // Old tokens still match (documented limitation), old link edges stay.
        assert_eq!(idx.search(&terms(&["stale"]), 1).len(), 1);
        assert_eq!(idx.search(&terms(&["fresh"]), 1).len(), 1);
        assert_eq!(idx.incoming_links("x"), vec!["a".to_string()]);
    }

    #[test]
    fn title_falls_back_to_url_and_snippet_truncates() {
        let mut idx = PageIndex::new();
        let long = "x".repeat(250);
        idx.ingest("a", "  ", &long, &[]);

        let hits = idx.search(&terms(&["x".repeat(250).as_str()]), 1);
        assert_eq!(hits[0].title, "a");
        assert_eq!(hits[0].snippet.chars().count(), SNIPPET_LEN + 3);
        assert!(hits[0].snippet.ends_with("..."));

        idx.ingest("b", "", "short", &[]);
        assert_eq!(idx.page("b").unwrap().snippet, "short");
    }

    #[test]
    fn incoming_links_for_unknown_url_is_empty() {
        let idx = PageIndex::new();
        assert!(idx.incoming_links("http://nowhere").is_empty());
        assert_eq!(idx.incoming_count("http://nowhere"), 0);
    }
}
