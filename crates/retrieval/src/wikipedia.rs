//! MediaWiki retriever — search plus plain-text intro extraction.
//!
//! Policy: top-1 everywhere. The first search hit wins; a disambiguation
//! page is auto-resolved to its first listed candidate, and only if that
//! secondary fetch also fails do we surface `Ambiguous` with the
//! candidate titles. The router never re-ranks or retries — this is a
//! deliberate simplicity/latency trade-off.

use async_trait::async_trait;
use groundwire_core::error::RetrievalFailure;
use groundwire_core::retrieval::{GroundingDoc, GroundingRetriever};
use serde::Deserialize;
use tracing::{debug, warn};

const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";
const USER_AGENT: &str = concat!("groundwire/", env!("CARGO_PKG_VERSION"));

/// How many disambiguation candidates to surface on failure.
const AMBIGUOUS_CANDIDATES: usize = 5;

/// A grounding retriever backed by the MediaWiki action API.
pub struct WikipediaRetriever {
    api_url: String,
    /// Intro length in sentences (TextExtracts caps this at 10)
    sentences: u8,
    client: reqwest::Client,
}

/// Outcome of fetching a single page.
enum PageOutcome {
    Doc(GroundingDoc),
    Disambiguation(String),
}

impl WikipediaRetriever {
    /// Create a retriever against the default English Wikipedia endpoint.
    pub fn new(sentences: u8) -> Result<Self, RetrievalFailure> {
        Self::with_api_url(DEFAULT_API_URL, sentences)
    }

    /// Create a retriever against a specific MediaWiki api.php endpoint.
    pub fn with_api_url(api_url: impl Into<String>, sentences: u8) -> Result<Self, RetrievalFailure> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| RetrievalFailure::Backend(e.to_string()))?;

        Ok(Self {
            api_url: api_url.into(),
            sentences: sentences.clamp(1, 10),
            client,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<T, RetrievalFailure> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .await
            .map_err(|e| RetrievalFailure::Backend(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RetrievalFailure::Backend(format!(
                "HTTP {} from {}",
                response.status().as_u16(),
                self.api_url
            )));
        }

        response
            .json()
            .await
            .map_err(|e| RetrievalFailure::Backend(format!("Malformed API response: {e}")))
    }

    /// Full-text search, top hits by relevance.
    async fn search_titles(&self, topic: &str) -> Result<Vec<String>, RetrievalFailure> {
        let body: SearchResponse = self
            .get_json(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", topic),
                ("srlimit", "3"),
            ])
            .await?;

        Ok(body
            .query
            .map(|q| q.search.into_iter().map(|hit| hit.title).collect())
            .unwrap_or_default())
    }

    /// Fetch the plain-text intro of a page by exact title.
    async fn fetch_page(&self, title: &str) -> Result<PageOutcome, RetrievalFailure> {
        let sentences = self.sentences.to_string();
        let body: PageResponse = self
            .get_json(&[
                ("action", "query"),
                ("prop", "extracts|pageprops"),
                ("ppprop", "disambiguation"),
                ("explaintext", "1"),
                ("exsentences", sentences.as_str()),
                ("redirects", "1"),
                ("titles", title),
            ])
            .await?;

        let page = body
            .query
            .and_then(|q| q.pages.into_iter().next())
            .ok_or_else(|| RetrievalFailure::NotFound(title.to_string()))?;

        if page.missing {
            return Err(RetrievalFailure::NotFound(title.to_string()));
        }

        if page
            .pageprops
            .as_ref()
            .is_some_and(|p| p.disambiguation.is_some())
        {
            return Ok(PageOutcome::Disambiguation(page.title));
        }

        let extract = page
            .extract
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| RetrievalFailure::NotFound(title.to_string()))?;

        Ok(PageOutcome::Doc(GroundingDoc {
            title: page.title,
            body: extract,
        }))
    }

    /// List a disambiguation page's article-namespace links.
    async fn fetch_links(&self, title: &str) -> Result<Vec<String>, RetrievalFailure> {
        let body: PageResponse = self
            .get_json(&[
                ("action", "query"),
                ("prop", "links"),
                ("plnamespace", "0"),
                ("pllimit", "10"),
                ("titles", title),
            ])
            .await?;

        Ok(body
            .query
            .and_then(|q| q.pages.into_iter().next())
            .map(|p| p.links.into_iter().map(|l| l.title).collect())
            .unwrap_or_default())
    }
}

#[async_trait]
impl GroundingRetriever for WikipediaRetriever {
    async fn search(&self, topic: &str) -> Result<GroundingDoc, RetrievalFailure> {
        debug!(topic, "Searching encyclopedia");

        let hits = self.search_titles(topic).await?;
        let Some(first) = hits.first() else {
            return Err(RetrievalFailure::NoResults);
        };

        match self.fetch_page(first).await? {
            PageOutcome::Doc(doc) => Ok(doc),
            PageOutcome::Disambiguation(dab_title) => {
                debug!(title = %dab_title, "Hit a disambiguation page, taking first candidate");

                let candidates = self.fetch_links(&dab_title).await?;
                let Some(choice) = candidates.first() else {
                    return Err(RetrievalFailure::Ambiguous(vec![dab_title]));
                };

                match self.fetch_page(choice).await {
                    Ok(PageOutcome::Doc(doc)) => Ok(doc),
                    Ok(PageOutcome::Disambiguation(_)) | Err(_) => {
                        warn!(title = %dab_title, "Disambiguation auto-resolve failed");
                        Err(RetrievalFailure::Ambiguous(
                            candidates.into_iter().take(AMBIGUOUS_CANDIDATES).collect(),
                        ))
                    }
                }
            }
        }
    }
}

// --- MediaWiki API types (internal, formatversion=2) ---

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    #[serde(default)]
    query: Option<PageQuery>,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    pageprops: Option<PageProps>,
    #[serde(default)]
    links: Vec<PageLink>,
}

#[derive(Debug, Deserialize)]
struct PageProps {
    // Present (as an empty string) when the page is a disambiguation page
    #[serde(default)]
    disambiguation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PageLink {
    title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentences_clamped_to_textextracts_cap() {
        let retriever = WikipediaRetriever::new(50).unwrap();
        assert_eq!(retriever.sentences, 10);
        let retriever = WikipediaRetriever::new(0).unwrap();
        assert_eq!(retriever.sentences, 1);
    }

    #[test]
    fn parse_search_response() {
        let data = r#"{
            "batchcomplete": true,
            "query": {
                "search": [
                    {"ns": 0, "title": "Antikythera mechanism", "pageid": 2371},
                    {"ns": 0, "title": "Antikythera", "pageid": 531211}
                ]
            }
        }"#;
        let parsed: SearchResponse = serde_json::from_str(data).unwrap();
        let hits = parsed.query.unwrap().search;
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Antikythera mechanism");
    }

    #[test]
    fn parse_search_response_no_hits() {
        let data = r#"{"batchcomplete": true, "query": {"search": []}}"#;
        let parsed: SearchResponse = serde_json::from_str(data).unwrap();
        assert!(parsed.query.unwrap().search.is_empty());
    }

    #[test]
    fn parse_page_with_extract() {
        let data = r#"{
            "query": {
                "pages": [
                    {
                        "pageid": 2371,
                        "ns": 0,
                        "title": "Antikythera mechanism",
                        "extract": "The Antikythera mechanism is an ancient Greek hand-powered orrery."
                    }
                ]
            }
        }"#;
        let parsed: PageResponse = serde_json::from_str(data).unwrap();
        let page = parsed.query.unwrap().pages.into_iter().next().unwrap();
        assert!(!page.missing);
        assert!(page.extract.unwrap().contains("orrery"));
    }

    #[test]
    fn parse_missing_page() {
        let data = r#"{
            "query": {
                "pages": [
                    {"ns": 0, "title": "Xyzzyology", "missing": true}
                ]
            }
        }"#;
        let parsed: PageResponse = serde_json::from_str(data).unwrap();
        let page = parsed.query.unwrap().pages.into_iter().next().unwrap();
        assert!(page.missing);
        assert!(page.extract.is_none());
    }

    #[test]
    fn parse_disambiguation_pageprops() {
        let data = r#"{
            "query": {
                "pages": [
                    {
                        "pageid": 19337,
                        "ns": 0,
                        "title": "Mercury",
                        "pageprops": {"disambiguation": ""},
                        "extract": "Mercury commonly refers to:"
                    }
                ]
            }
        }"#;
        let parsed: PageResponse = serde_json::from_str(data).unwrap();
        let page = parsed.query.unwrap().pages.into_iter().next().unwrap();
        assert!(page.pageprops.unwrap().disambiguation.is_some());
    }

    #[test]
    fn parse_disambiguation_links() {
        let data = r#"{
            "query": {
                "pages": [
                    {
                        "pageid": 19337,
                        "ns": 0,
                        "title": "Mercury",
                        "links": [
                            {"ns": 0, "title": "Mercury (element)"},
                            {"ns": 0, "title": "Mercury (planet)"}
                        ]
                    }
                ]
            }
        }"#;
        let parsed: PageResponse = serde_json::from_str(data).unwrap();
        let page = parsed.query.unwrap().pages.into_iter().next().unwrap();
        assert_eq!(page.links.len(), 2);
        assert_eq!(page.links[0].title, "Mercury (element)");
    }
}
