use crate::models::{Product, SortBy};
use std::cmp::Ordering;

/// Stable sort into a new vector; ties keep their incoming order.
pub fn sort_products<'a>(products: &[&'a Product], sort_by: SortBy) -> Vec<&'a Product> {
    let mut ordered = products.to_vec();
    ordered.sort_by(|left, right| compare(left, right, sort_by));
    ordered
}

pub fn compare(left: &Product, right: &Product, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::Name => compare_names(&left.name, &right.name),
        SortBy::PriceLow => {
            price_or_zero(left.min_price()).total_cmp(&price_or_zero(right.min_price()))
        }
        SortBy::PriceHigh => {
            price_or_zero(right.max_price()).total_cmp(&price_or_zero(left.max_price()))
        }
        SortBy::Rating => right.average_rating.total_cmp(&left.average_rating),
        SortBy::Popularity => right.popularity().total_cmp(&left.popularity()),
    }
}

fn price_or_zero(price: Option<f64>) -> f64 {
    price.unwrap_or(0.0)
}

// case-folded first so "americano" sits next to "Americano"
fn compare_names(left: &str, right: &str) -> Ordering {
    let folded = left
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(right.chars().flat_map(char::to_lowercase));
    folded.then_with(|| left.cmp(right))
}
