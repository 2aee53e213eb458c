use crate::models::{Product, SearchFilters};

/// Applies the text, price, rating and roast constraints conjunctively.
///
/// A blank `query_text` disables the text constraint. References come back in
/// catalog order.
pub fn filter_products<'a>(
    catalog: &'a [Product],
    filters: &SearchFilters,
    query_text: &str,
) -> Vec<&'a Product> {
    let needle = query_text.trim().to_lowercase();

    catalog
        .iter()
        .filter(|product| matches_text(product, &needle))
        .filter(|product| matches_structure(product, filters))
        .collect()
}

/// Price, rating and roast constraints only; the text constraint is skipped.
pub fn filter_structural<'a>(catalog: &'a [Product], filters: &SearchFilters) -> Vec<&'a Product> {
    catalog
        .iter()
        .filter(|product| matches_structure(product, filters))
        .collect()
}

pub fn matches_text(product: &Product, lowered_needle: &str) -> bool {
    if lowered_needle.is_empty() {
        return true;
    }

    [
        &product.name,
        &product.description,
        &product.special_ingredient,
        &product.ingredients,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(lowered_needle))
}

fn matches_structure(product: &Product, filters: &SearchFilters) -> bool {
    matches_price(product, filters)
        && matches_rating(product, filters)
        && matches_roast(product, filters)
}

fn matches_price(product: &Product, filters: &SearchFilters) -> bool {
    // no prices means no min/max, which never satisfies the range
    match (product.min_price(), product.max_price()) {
        (Some(low), Some(high)) => filters.price_range().contains(low, high),
        _ => false,
    }
}

fn matches_rating(product: &Product, filters: &SearchFilters) -> bool {
    product.average_rating >= filters.min_rating()
}

fn matches_roast(product: &Product, filters: &SearchFilters) -> bool {
    let accepted = filters.roast_levels();
    if accepted.is_empty() {
        return true;
    }

    product
        .roast_level
        .is_some_and(|level| accepted.contains(&level))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{product, storefront};
    use crate::models::{PriceRange, RoastLevel, SortBy};

    fn ids<'a>(products: &[&'a Product]) -> Vec<&'a str> {
        products.iter().map(|product| product.id.as_str()).collect()
    }

    #[test]
    fn price_bounds_apply_to_min_and_max_price() {
        let catalog = vec![product("P", "Flight", 4.0, &["3", "7"])];

        let wide = SearchFilters::default().with_price_range(PriceRange::new(0.0, 10.0).unwrap());
        let narrow = SearchFilters::default().with_price_range(PriceRange::new(0.0, 5.0).unwrap());

        assert_eq!(filter_products(&catalog, &wide, "").len(), 1);
        assert!(filter_products(&catalog, &narrow, "").is_empty());
    }

    #[test]
    fn products_without_prices_are_excluded() {
        let catalog = vec![product("P", "Free Sample", 5.0, &[])];
        let filters = SearchFilters::default();
        assert!(filter_products(&catalog, &filters, "").is_empty());
    }

    #[test]
    fn text_matches_any_field_case_insensitively() {
        let catalog = storefront();
        let filters = SearchFilters::default();

        assert_eq!(ids(&filter_products(&catalog, &filters, "  STEAMED ")), vec!["A"]);
        assert_eq!(ids(&filter_products(&catalog, &filters, "hot water")), vec!["B"]);
        assert_eq!(ids(&filter_products(&catalog, &filters, "   ")), vec!["A", "B", "C"]);
    }

    #[test]
    fn roast_set_restricts_only_when_non_empty() {
        let catalog = storefront();
        let dark = SearchFilters::default().with_roast_levels([RoastLevel::Dark]);
        let light = SearchFilters::default().with_roast_levels([RoastLevel::Light]);

        assert_eq!(ids(&filter_products(&catalog, &dark, "")), vec!["C"]);
        assert!(filter_products(&catalog, &light, "").is_empty());
    }

    #[test]
    fn rating_bound_is_inclusive() {
        let catalog = storefront();
        let filters = SearchFilters::default().with_min_rating(4.0).unwrap();
        assert_eq!(ids(&filter_products(&catalog, &filters, "")), vec!["A", "C"]);
    }

    #[test]
    fn filtered_list_is_a_subset_of_the_catalog() {
        let catalog = storefront();
        let configurations = [
            SearchFilters::default(),
            SearchFilters::new(
                PriceRange::new(3.0, 4.0).unwrap(),
                0.0,
                Vec::<RoastLevel>::new(),
                SortBy::Name,
            )
            .unwrap(),
            SearchFilters::new(PriceRange::default(), 4.5, [RoastLevel::Dark], SortBy::Rating)
                .unwrap(),
        ];

        for filters in &configurations {
            for text in ["", "a", "milk", "zzz"] {
                let filtered = filter_products(&catalog, filters, text);
                let mut seen = std::collections::HashSet::new();
                for item in &filtered {
                    assert!(catalog.iter().any(|product| std::ptr::eq(product, *item)));
                    assert!(seen.insert(item.id.clone()), "duplicate {}", item.id);
                }
            }
        }
    }

    #[test]
    fn structural_filter_ignores_text() {
        let catalog = storefront();
        let filters = SearchFilters::default().with_price_range(PriceRange::new(0.0, 5.0).unwrap());
        assert_eq!(ids(&filter_structural(&catalog, &filters)), vec!["A", "B"]);
    }
}
