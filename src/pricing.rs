//! Price parsing and list totals. Prices arrive as free-form strings from the
//! search API and from user input, so every parser here degrades to "no
//! value" instead of failing.

use crate::models::{Component, ListView};

/// Extract a number from a formatted price such as `"$1,299.99"` or
/// `"€45.50 incl. VAT"`. Everything except digits and the decimal point is
/// dropped before parsing; anything that still does not parse yields `None`.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// The amount a component contributes to a total. With `prefer_custom` a
/// parseable override wins; otherwise (or when the override does not parse)
/// the listed price is used, and an unparseable listed price counts as zero.
pub fn component_price(component: &Component, prefer_custom: bool) -> f64 {
    let custom = if prefer_custom {
        component.overrides.price.as_deref().and_then(parse_price)
    } else {
        None
    };
    custom
        .or_else(|| parse_price(&component.price))
        .unwrap_or(0.0)
}

/// Total of a list's direct components (custom prices honoured) and bundles.
pub fn total_price(view: &ListView) -> f64 {
    total_price_with(view, true)
}

/// Total of a list, with the custom-price preference taken from settings.
/// Components inside a bundle are covered by the bundle's own price.
pub fn total_price_with(view: &ListView, prefer_custom: bool) -> f64 {
    let components: f64 = view
        .components
        .iter()
        .map(|component| component_price(component, prefer_custom))
        .sum();
    let bundles: f64 = view
        .bundles
        .iter()
        .map(|bundle| parse_price(&bundle.bundle.price).unwrap_or(0.0))
        .sum();
    components + bundles
}

/// Render a total the way the footer shows it, e.g. `Total: $165.50`.
pub fn format_total(currency_symbol: &str, total: f64) -> String {
    format!("Total: {currency_symbol}{total:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bundle, BundleWithComponents, ListIcon, PartList};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn view(components: Vec<Component>, bundle_prices: &[&str]) -> ListView {
        let bundles = bundle_prices
            .iter()
            .enumerate()
            .map(|(idx, price)| BundleWithComponents {
                bundle: Bundle {
                    id: idx as i64 + 1,
                    vendor: "Shop".to_string(),
                    name: format!("Kit {idx}"),
                    price: price.to_string(),
                    url: "https://shop".to_string(),
                    image: None,
                    list_id: 1,
                },
                components: Vec::new(),
            })
            .collect();
        ListView {
            list: PartList {
                id: 1,
                name: "Build".to_string(),
                icon: ListIcon::Computer,
            },
            components,
            bundles,
        }
    }

    #[test]
    fn parses_formatted_prices() {
        assert_eq!(parse_price("$120.00"), Some(120.0));
        assert_eq!(parse_price("$1,299.99"), Some(1299.99));
        assert_eq!(parse_price(" 45.5 USD"), Some(45.5));
        assert_eq!(parse_price("N/A"), None);
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("1.2.3"), None);
        assert_eq!(parse_price("."), None);
    }

    #[test]
    fn component_and_bundle_are_summed() {
        let view = view(vec![Component::new("u", "CPU", "$120.00")], &["$45.50"]);
        assert!(close(total_price(&view), 165.50));
    }

    #[test]
    fn custom_price_replaces_unparseable_listing() {
        let mut component = Component::new("u", "GPU", "N/A");
        component.overrides.price = Some("$99.99".to_string());
        let view = view(vec![component], &[]);
        assert!(close(total_price(&view), 99.99));
        assert!(close(total_price_with(&view, false), 0.0));
    }

    #[test]
    fn bad_custom_price_falls_back_to_listing() {
        let mut component = Component::new("u", "RAM", "$80");
        component.overrides.price = Some("call us".to_string());
        assert!(close(component_price(&component, true), 80.0));
    }

    #[test]
    fn malformed_prices_contribute_zero() {
        let view = view(
            vec![Component::new("u", "Case", "sold out")],
            &["free?", "$10"],
        );
        assert!(close(total_price(&view), 10.0));
    }

    #[test]
    fn totals_render_with_two_decimals() {
        assert_eq!(format_total("$", 165.5), "Total: $165.50");
        assert_eq!(format_total("kr ", 0.0), "Total: kr 0.00");
    }
}
