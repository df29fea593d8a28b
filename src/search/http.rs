use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use reqwest::blocking::Client;

use super::{ProductDetail, SearchClient, SearchCriteria, SearchPage, SearchRequest};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Blocking HTTP client for the part search backend.
pub struct HttpSearchClient {
    base_url: String,
    client: Client,
}

impl HttpSearchClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Path and query pairs for a search request.
fn search_query(request: &SearchRequest) -> (&'static str, Vec<(&'static str, String)>) {
    let (path, key, value) = match &request.criteria {
        SearchCriteria::Query(text) => ("/pcpp/search", "query", text.clone()),
        SearchCriteria::Category(kind) => ("/pcpp/parts_by_type", "product_type", kind.clone()),
    };
    (
        path,
        vec![
            (key, value),
            ("limit", request.page_size.to_string()),
            ("page", request.page.to_string()),
            ("region", request.region.clone()),
        ],
    )
}

impl SearchClient for HttpSearchClient {
    fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
        let (path, query) = search_query(request);
        debug!("GET {path} page {}", request.page);
        self.client
            .get(self.endpoint(path))
            .query(&query)
            .send()
            .context("search request failed")?
            .error_for_status()
            .context("search returned an error status")?
            .json::<SearchPage>()
            .context("failed to decode search response")
    }

    fn fetch_product(&self, url: &str) -> Result<ProductDetail> {
        debug!("GET /pcpp/product {url}");
        self.client
            .get(self.endpoint("/pcpp/product"))
            .query(&[("url", url)])
            .send()
            .context("product request failed")?
            .error_for_status()
            .context("product lookup returned an error status")?
            .json::<ProductDetail>()
            .context("failed to decode product response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(criteria: SearchCriteria) -> SearchRequest {
        SearchRequest {
            criteria,
            page: 3,
            page_size: 5,
            region: "uk".to_string(),
        }
    }

    #[test]
    fn text_queries_hit_search_endpoint() {
        let (path, query) = search_query(&request(SearchCriteria::Query("rtx 4070".to_string())));
        assert_eq!(path, "/pcpp/search");
        assert_eq!(
            query,
            vec![
                ("query", "rtx 4070".to_string()),
                ("limit", "5".to_string()),
                ("page", "3".to_string()),
                ("region", "uk".to_string()),
            ]
        );
    }

    #[test]
    fn categories_hit_parts_by_type() {
        let (path, query) = search_query(&request(SearchCriteria::Category("cpu".to_string())));
        assert_eq!(path, "/pcpp/parts_by_type");
        assert_eq!(query[0], ("product_type", "cpu".to_string()));
    }

    #[test]
    fn base_url_trailing_slash_is_ignored() {
        let client = HttpSearchClient::new("http://localhost:8000/").unwrap();
        assert_eq!(
            client.endpoint("/pcpp/search"),
            "http://localhost:8000/pcpp/search"
        );
    }
}
