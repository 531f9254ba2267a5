//! Brave Search API implementation.
//!
//! Requires an API key from https://brave.com/search/api/

use serde::Deserialize;

use super::extract_domain;
use crate::web::error::WebError;
use crate::web::types::{WebHit, WebQuery};

/// Brave Search API base URL.
const BRAVE_API_URL: &str = "https://api.search.brave.com/res/v1/web/search";

const ENGINE_NAME: &str = "Brave Search";

/// Brave caps `count` at 20.
const MAX_COUNT: usize = 20;

/// Perform a search using Brave Search API.
///
/// # Errors
/// Returns an error if the API key is missing or the request fails.
pub async fn search(
    client: &reqwest::Client,
    query: &WebQuery,
    api_key: Option<&str>,
) -> Result<Vec<WebHit>, WebError> {
    let api_key = api_key.ok_or_else(|| WebError::ApiKeyRequired(ENGINE_NAME.to_string()))?;

    let url = build_url(query)?;

    let response = client
        .get(url)
        .header("X-Subscription-Token", api_key)
        .header("Accept", "application/json")
        .send()
        .await?;

    if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(WebError::RateLimited(1_000));
    }

    if response.status() == reqwest::StatusCode::UNAUTHORIZED {
        return Err(WebError::AccessDenied("Invalid Brave API key".to_string()));
    }

    if !response.status().is_success() {
        return Err(WebError::HttpClient(format!(
            "Brave Search returned status: {}",
            response.status()
        )));
    }

    let body: BraveResponse = response.json().await?;
    Ok(parse_response(body, query.max_results))
}

/// Build the API URL with query parameters.
fn build_url(query: &WebQuery) -> Result<url::Url, WebError> {
    let mut url = url::Url::parse(BRAVE_API_URL)?;

    {
        let mut params = url.query_pairs_mut();
        params.append_pair("q", &query.query);
        params.append_pair("count", &query.max_results.min(MAX_COUNT).to_string());
        params.append_pair("safesearch", "moderate");
        if let Some(region) = &query.region {
            params.append_pair("country", region);
        }
    }

    Ok(url)
}

/// Convert the API payload into hits.
fn parse_response(body: BraveResponse, max_results: usize) -> Vec<WebHit> {
    body.web
        .map(|web| web.results)
        .unwrap_or_default()
        .into_iter()
        .filter(|r| !r.title.trim().is_empty() && !r.url.is_empty())
        .take(max_results)
        .enumerate()
        .map(|(i, r)| {
            let domain = r
                .meta_url
                .and_then(|m| m.hostname)
                .or_else(|| extract_domain(&r.url))
                .unwrap_or_default();
            WebHit {
                title: r.title.trim().to_string(),
                url: r.url,
                description: r.description.unwrap_or_default(),
                domain,
                position: i + 1,
                engine: ENGINE_NAME.to_string(),
            }
        })
        .collect()
}

// Brave API response types

#[derive(Debug, Deserialize)]
struct BraveResponse {
    web: Option<WebResults>,
}

#[derive(Debug, Deserialize)]
struct WebResults {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    description: Option<String>,
    meta_url: Option<MetaUrl>,
}

#[derive(Debug, Deserialize)]
struct MetaUrl {
    hostname: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        let query = WebQuery::new("hoodie manufacturer")
            .with_max_results(50)
            .with_region("vn");
        let url = build_url(&query).unwrap();
        let rendered = url.as_str();

        assert!(rendered.starts_with(BRAVE_API_URL));
        assert!(rendered.contains("q=hoodie+manufacturer"));
        assert!(rendered.contains("count=20"));
        assert!(rendered.contains("country=vn"));
    }

    #[test]
    fn test_parse_response() {
        let body: BraveResponse = serde_json::from_value(serde_json::json!({
            "web": {
                "results": [
                    {
                        "title": "Dhaka Threads | Knitwear Exporter",
                        "url": "https://dhakathreads.com/",
                        "description": "Hoodies from Bangladesh",
                        "meta_url": {"hostname": "dhakathreads.com"}
                    },
                    {"title": "", "url": "https://empty.example"},
                    {"title": "Second", "url": "https://www.second.example/x"}
                ]
            }
        }))
        .unwrap();

        let hits = parse_response(body, 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].domain, "dhakathreads.com");
        assert_eq!(hits[1].domain, "second.example");
        assert_eq!(hits[1].position, 2);
        assert!(hits[1].description.is_empty());
    }

    #[test]
    fn test_parse_response_without_web_section() {
        let body: BraveResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(parse_response(body, 10).is_empty());
    }

    #[tokio::test]
    async fn test_search_requires_api_key() {
        let client = reqwest::Client::new();
        let result = search(&client, &WebQuery::new("hoodie"), None).await;
        assert!(matches!(result, Err(WebError::ApiKeyRequired(_))));
    }
}
