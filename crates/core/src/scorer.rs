use crate::models::{Product, ScoringOptions, SearchResult, SearchType};
use std::collections::HashSet;

/// Weight of a term found in the name or the special ingredient.
pub const NAME_MATCH_WEIGHT: f64 = 2.0;
/// Weight of a term found anywhere else.
pub const BODY_MATCH_WEIGHT: f64 = 1.0;
/// `1 + log10(1 + popularity) / POPULARITY_BOOST_DIVISOR` multiplies boosted scores.
pub const POPULARITY_BOOST_DIVISOR: f64 = 10.0;

/// Weighted match count of `terms` against one product, before normalization.
/// The second value is how many terms contributed.
///
/// A term found only inside a longer term that matched an equal or better
/// field adds nothing, so `"dark"` next to `"dark roasted"` counts once.
/// The category label is not scored.
pub fn raw_match_score(product: &Product, lowered_terms: &[String]) -> (f64, usize) {
    let name = product.name.to_lowercase();
    let special = product.special_ingredient.to_lowercase();
    let body = [
        product.ingredients.to_lowercase(),
        product.description.to_lowercase(),
        product.roast_label().unwrap_or_default().to_lowercase(),
    ];

    let weights: Vec<f64> = lowered_terms
        .iter()
        .map(|term| {
            if name.contains(term.as_str()) || special.contains(term.as_str()) {
                NAME_MATCH_WEIGHT
            } else if body.iter().any(|field| field.contains(term.as_str())) {
                BODY_MATCH_WEIGHT
            } else {
                0.0
            }
        })
        .collect();

    let covered = |term: &str, weight: f64| {
        lowered_terms
            .iter()
            .zip(&weights)
            .any(|(longer, &longer_weight)| {
                longer.len() > term.len() && longer_weight >= weight && longer.contains(term)
            })
    };

    lowered_terms
        .iter()
        .zip(&weights)
        .filter(|(term, weight)| **weight > 0.0 && !covered(term.as_str(), **weight))
        .fold((0.0, 0), |(score, matched), (_, weight)| (score + weight, matched + 1))
}

pub fn popularity_boost(popularity: f64) -> f64 {
    1.0 + (1.0 + popularity.max(0.0)).log10() / POPULARITY_BOOST_DIVISOR
}

pub fn score_products<'a>(
    catalog: &'a [Product],
    terms: &[String],
    search_type: SearchType,
    original_query: &str,
    options: &ScoringOptions,
) -> SearchResult<'a> {
    let candidates: Vec<&'a Product> = catalog.iter().collect();
    score_candidates(&candidates, terms, search_type, original_query, options)
}

/// Same as [`score_products`] over an already narrowed candidate list.
pub fn score_candidates<'a>(
    candidates: &[&'a Product],
    terms: &[String],
    search_type: SearchType,
    original_query: &str,
    options: &ScoringOptions,
) -> SearchResult<'a> {
    let mut result = SearchResult::empty(search_type, original_query);
    result.metadata.processed_terms = terms.to_vec();

    let mut seen = HashSet::new();
    let lowered_terms: Vec<String> = terms
        .iter()
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty() && seen.insert(term.clone()))
        .collect();
    if lowered_terms.is_empty() {
        return result;
    }

    let max_score = NAME_MATCH_WEIGHT * lowered_terms.len() as f64;
    let mut scored: Vec<(&'a Product, f64, f64)> = candidates
        .iter()
        .filter_map(|product| {
            let (raw, matched) = raw_match_score(product, &lowered_terms);
            if matched == 0 {
                return None;
            }

            let popularity = product.popularity();
            let mut score = (raw / max_score).min(1.0);
            if options.boost_popular {
                score *= popularity_boost(popularity);
            }

            (score >= options.min_relevance_score).then_some((*product, score, popularity))
        })
        .collect();

    scored.sort_by(|left, right| {
        right
            .1
            .total_cmp(&left.1)
            .then_with(|| right.2.total_cmp(&left.2))
    });

    result.metadata.total_matches = scored.len();
    scored.truncate(options.max_results);

    for (product, score, _) in scored {
        result.scores.insert(product.id.clone(), score);
        result.products.push(product);
    }

    result
}
