use crate::error::CatalogError;
use crate::models::{Category, Product};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Flat(Vec<Product>),
    Storefront(Storefront),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Storefront {
    #[serde(default)]
    coffees: Vec<Product>,
    #[serde(default)]
    beans: Vec<Product>,
}

/// Accepts either a plain product array or `{ "coffees": [...], "beans": [...] }`.
pub fn parse_catalog(raw: &str) -> Result<Vec<Product>, CatalogError> {
    let products = match serde_json::from_str::<CatalogFile>(raw) {
        Ok(CatalogFile::Flat(products)) => products,
        Ok(CatalogFile::Storefront(Storefront { coffees, beans })) => {
            let drinks = coffees
                .into_iter()
                .map(|product| with_category(product, Category::Coffee));
            let beans = beans
                .into_iter()
                .map(|product| with_category(product, Category::Bean));
            drinks.chain(beans).collect()
        }
        // untagged errors say nothing useful, retry as an array for a located message
        Err(_) => serde_json::from_str::<Vec<Product>>(raw)?,
    };

    report_duplicates(&products);
    Ok(products)
}

pub fn load_catalog(path: &Path) -> Result<Vec<Product>, CatalogError> {
    let raw = std::fs::read_to_string(path)?;
    let products = parse_catalog(&raw)?;
    info!(path = %path.display(), products = products.len(), "catalog loaded");
    Ok(products)
}

fn with_category(mut product: Product, category: Category) -> Product {
    product.category.get_or_insert(category);
    product
}

fn report_duplicates(products: &[Product]) {
    let mut seen = HashSet::new();
    for product in products {
        if !seen.insert(product.id.as_str()) {
            warn!(id = %product.id, "duplicate product id in catalog");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoastLevel;
    use std::io::Write;

    #[test]
    fn flat_array_parses_as_is() {
        let raw = r#"[
            {
                "id": "A",
                "name": "Cappuccino",
                "prices": [{"size": "M", "price": "4", "currency": "$"}],
                "averageRating": 4.5
            },
            {"id": "B", "name": "Americano", "averageRating": "3.0"}
        ]"#;

        let products = parse_catalog(raw).expect("catalog should parse");
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].min_price(), Some(4.0));
        assert_eq!(products[1].category, None);
    }

    #[test]
    fn storefront_object_assigns_default_categories() {
        let raw = r#"{
            "coffees": [{"id": "C1", "name": "Latte"}],
            "beans": [
                {"id": "B1", "name": "Robusta Beans", "roasted": "Dark Roasted"},
                {"id": "B2", "name": "Gift Box", "type": "Coffee"}
            ]
        }"#;

        let products = parse_catalog(raw).expect("catalog should parse");
        let categories: Vec<_> = products.iter().map(|product| product.category).collect();
        assert_eq!(
            categories,
            vec![Some(Category::Coffee), Some(Category::Bean), Some(Category::Coffee)]
        );
        assert_eq!(products[1].roast_level, Some(RoastLevel::Dark));
    }

    #[test]
    fn malformed_catalog_is_an_error() {
        assert!(matches!(
            parse_catalog(r#"[{"name": "no id"}]"#),
            Err(CatalogError::Parse(_))
        ));
        assert!(parse_catalog("not json").is_err());
        assert!(parse_catalog(r#"{"id": "A", "name": "Lonely"}"#).is_err());
    }

    #[test]
    fn one_sloppy_record_does_not_sink_the_catalog() {
        let raw = r#"[
            {
                "id": "A",
                "name": "Cappuccino",
                "popularity": "12",
                "prices": [{"size": "M", "price": "4"}]
            },
            {"id": "B", "name": "Americano", "prices": [{"size": "M", "currency": "$"}]},
            {"id": "C", "name": "Espresso", "averageRating": 4.1}
        ]"#;

        let products = parse_catalog(raw).expect("catalog should parse");
        assert_eq!(products.len(), 3);
        assert_eq!(products[0].popularity(), 12.0);
        assert_eq!(products[1].min_price(), Some(0.0));
        assert_eq!(products[2].average_rating, 4.1);
    }

    #[test]
    fn duplicate_ids_are_kept() {
        let raw = r#"[{"id": "A", "name": "One"}, {"id": "A", "name": "Two"}]"#;
        let products = parse_catalog(raw).expect("catalog should parse");
        assert_eq!(products.len(), 2);
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{"coffees": [{{"id": "C1", "name": "Mocha"}}]}}"#).expect("write catalog");

        let products = load_catalog(file.path()).expect("catalog should load");
        assert_eq!(products[0].name, "Mocha");

        let missing = file.path().with_extension("missing");
        assert!(matches!(load_catalog(&missing), Err(CatalogError::Io(_))));
    }
}
