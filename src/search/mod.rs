//! Remote part search. The store never talks to the network: search results
//! are translated into `Component`s before they reach the membership
//! functions.

mod http;
mod session;

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::Component;

pub use http::HttpSearchClient;
pub use session::{DetailState, SearchSession};

/// What a search is for: free text, or every part of one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    Query(String),
    /// Product-type key, e.g. `"video-card"`.
    Category(String),
}

impl SearchCriteria {
    pub fn describe(&self) -> String {
        match self {
            SearchCriteria::Query(text) => format!("\"{text}\""),
            SearchCriteria::Category(key) => format!("category {key}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub criteria: SearchCriteria,
    /// 1-based.
    pub page: u32,
    pub page_size: u32,
    pub region: String,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartSummary {
    pub name: String,
    pub url: String,
    #[serde(default = "not_available", deserialize_with = "price_text")]
    pub price: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl PartSummary {
    /// Local shape used when the part is added to a list.
    pub fn into_component(self) -> Component {
        Component {
            image: self.image.filter(|image| !image.trim().is_empty()),
            ..Component::new(self.url, self.name, self.price)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub results: Vec<PartSummary>,
    #[serde(default = "first_page")]
    pub page: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorPrice {
    pub seller: String,
    pub value: f64,
    #[serde(default)]
    pub in_stock: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub average: Option<f64>,
    pub count: Option<u32>,
}

/// Extended attributes for a single product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    pub name: String,
    #[serde(default)]
    pub specs: BTreeMap<String, String>,
    #[serde(default)]
    pub price_list: Vec<VendorPrice>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub rating: Option<Rating>,
}

impl ProductDetail {
    /// Cheapest vendor that reports stock, falling back to the cheapest
    /// overall.
    pub fn best_price(&self) -> Option<&VendorPrice> {
        let by_value = |a: &&VendorPrice, b: &&VendorPrice| a.value.total_cmp(&b.value);
        self.price_list
            .iter()
            .filter(|price| price.in_stock)
            .min_by(by_value)
            .or_else(|| self.price_list.iter().min_by(by_value))
    }
}

/// The remote collaborator. Implementations block; `SearchSession` runs them
/// off the UI thread.
pub trait SearchClient: Send + Sync {
    fn search(&self, request: &SearchRequest) -> Result<SearchPage>;
    fn fetch_product(&self, url: &str) -> Result<ProductDetail>;
}

fn not_available() -> String {
    "N/A".to_string()
}

fn first_page() -> u32 {
    1
}

/// Prices arrive as numbers, strings or null depending on the backend.
fn price_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(number)) => match number.as_f64() {
            Some(amount) => format!("{amount:.2}"),
            None => number.to_string(),
        },
        Some(serde_json::Value::String(text)) if !text.trim().is_empty() => text,
        _ => not_available(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_page_accepts_mixed_price_shapes() {
        let json = r#"{
            "results": [
                {"name": "A", "url": "https://p/a", "price": 120.5, "image": "https://i/a"},
                {"name": "B", "url": "https://p/b", "price": "$45.00"},
                {"name": "C", "url": "https://p/c", "price": null},
                {"name": "D", "url": "https://p/d"}
            ],
            "page": 2,
            "total_pages": 7
        }"#;
        let page: SearchPage = serde_json::from_str(json).unwrap();

        let prices: Vec<&str> = page.results.iter().map(|r| r.price.as_str()).collect();
        assert_eq!(prices, vec!["120.50", "$45.00", "N/A", "N/A"]);
        assert_eq!(page.page, 2);
        assert_eq!(page.total_pages, 7);
    }

    #[test]
    fn summary_becomes_component_without_overrides() {
        let summary = PartSummary {
            name: "RTX".to_string(),
            url: "https://p/rtx".to_string(),
            price: "$499.99".to_string(),
            image: Some(" ".to_string()),
        };
        let component = summary.into_component();
        assert_eq!(component.url, "https://p/rtx");
        assert_eq!(component.price, "$499.99");
        assert_eq!(component.image, None);
        assert!(component.overrides.is_empty());
    }

    #[test]
    fn best_price_prefers_stocked_vendors() {
        let detail: ProductDetail = serde_json::from_str(
            r#"{
                "name": "CPU",
                "specs": {"Cores": "8"},
                "price_list": [
                    {"seller": "Cheap", "value": 100.0, "in_stock": false},
                    {"seller": "Stocked", "value": 120.0, "in_stock": true},
                    {"seller": "Pricey", "value": 150.0, "in_stock": true}
                ],
                "rating": {"average": 4.5, "count": 12}
            }"#,
        )
        .unwrap();
        assert_eq!(detail.best_price().unwrap().seller, "Stocked");
        assert_eq!(detail.specs.get("Cores").map(String::as_str), Some("8"));

        let none_stocked = ProductDetail {
            price_list: vec![VendorPrice {
                seller: "Only".to_string(),
                value: 90.0,
                in_stock: false,
            }],
            ..detail
        };
        assert_eq!(none_stocked.best_price().unwrap().seller, "Only");
    }
}
