//! DuckDuckGo search engine implementation.
//!
//! Uses DuckDuckGo HTML search (no API key required).

use scraper::{Html, Selector};

use super::extract_domain;
use crate::web::error::WebError;
use crate::web::types::{WebHit, WebQuery};

/// Base URL for DuckDuckGo HTML search.
const DDG_HTML_URL: &str = "https://html.duckduckgo.com/html/";

const ENGINE_NAME: &str = "DuckDuckGo";

/// Perform a search on DuckDuckGo.
///
/// # Errors
/// Returns an error if the search request fails or parsing fails.
pub async fn search(client: &reqwest::Client, query: &WebQuery) -> Result<Vec<WebHit>, WebError> {
    let params = build_params(query);

    let response = client.post(DDG_HTML_URL).form(&params).send().await?;

    if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(WebError::RateLimited(1_000));
    }

    if response.status() == reqwest::StatusCode::FORBIDDEN {
        return Err(WebError::AccessDenied("DuckDuckGo blocked the request".to_string()));
    }

    if !response.status().is_success() {
        return Err(WebError::HttpClient(format!(
            "DuckDuckGo returned status: {}",
            response.status()
        )));
    }

    let html = response.text().await?;
    parse_results(&html, query.max_results)
}

/// Build form parameters for DuckDuckGo search.
fn build_params(query: &WebQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("q", query.query.clone()),
        ("b", String::new()),
        ("kp", "-1".to_string()),
    ];

    if let Some(region) = &query.region {
        params.push(("kl", locale(region)));
    }

    params
}

/// DuckDuckGo `kl` locale for a two-letter region code; unknown regions search worldwide.
fn locale(region: &str) -> String {
    let region = region.to_lowercase();
    let language = match region.as_str() {
        "vn" => "vi",
        "cn" => "zh",
        "tw" => "tzh",
        "jp" => "jp",
        "kr" => "kr",
        "th" => "th",
        "tr" => "tr",
        "pt" => "pt",
        "it" => "it",
        "fr" => "fr",
        "de" => "de",
        "es" | "mx" => "es",
        "pl" => "pl",
        "ro" => "ro",
        "us" | "in" | "pk" | "id" => "en",
        "gb" => return "uk-en".to_string(),
        _ => return "wt-wt".to_string(),
    };
    format!("{region}-{language}")
}

fn selector(css: &str) -> Result<Selector, WebError> {
    Selector::parse(css).map_err(|e| WebError::HtmlParse(format!("Invalid selector: {e:?}")))
}

/// Parse DuckDuckGo HTML results.
pub(crate) fn parse_results(html: &str, max_results: usize) -> Result<Vec<WebHit>, WebError> {
    let document = Html::parse_document(html);

    let result_selector = selector(".result")?;
    let title_selector = selector(".result__a")?;
    let snippet_selector = selector(".result__snippet")?;
    let url_selector = selector(".result__url")?;

    let mut hits = Vec::new();

    for element in document.select(&result_selector) {
        if hits.len() >= max_results {
            break;
        }

        let Some(anchor) = element.select(&title_selector).next() else {
            continue;
        };

        let title = anchor.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            continue;
        }

        let url = anchor
            .value()
            .attr("href")
            .map(extract_url_from_ddg_redirect)
            .unwrap_or_default();
        if url.is_empty() {
            continue;
        }

        let description = element
            .select(&snippet_selector)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let display_url = element
            .select(&url_selector)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let domain = extract_domain(&url).unwrap_or(display_url);

        hits.push(WebHit {
            title,
            url,
            description,
            domain,
            position: hits.len() + 1,
            engine: ENGINE_NAME.to_string(),
        });
    }

    if hits.is_empty() {
        tracing::warn!("No results found in DuckDuckGo HTML response");
    }

    Ok(hits)
}

/// Extract the actual URL from DuckDuckGo's redirect URL.
fn extract_url_from_ddg_redirect(href: &str) -> String {
    // Redirects look like //duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=...
    if let Some(uddg_start) = href.find("uddg=") {
        let start = uddg_start + 5;
        let end = href[start..].find('&').map_or(href.len(), |i| start + i);
        let encoded = &href[start..end];
        urlencoding::decode(encoded)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| encoded.to_string())
    } else if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    }
}
