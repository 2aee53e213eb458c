use crate::models::Product;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightSpan<'a> {
    pub text: &'a str,
    pub highlighted: bool,
}

pub fn suggest(catalog: &[Product], partial: &str, max_suggestions: usize) -> Vec<String> {
    let needle = partial.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut suggestions = Vec::new();

    for product in catalog {
        let fields = [
            Some(product.name.as_str()),
            Some(product.ingredients.as_str()),
            Some(product.special_ingredient.as_str()),
            product.roast_label(),
        ];

        for field in fields.into_iter().flatten() {
            if suggestions.len() >= max_suggestions {
                return suggestions;
            }
            if field.to_lowercase().contains(&needle) && seen.insert(field) {
                suggestions.push(field.to_string());
            }
        }
    }

    suggestions.truncate(max_suggestions);
    suggestions
}

/// Recent searches while nothing is typed, catalog suggestions otherwise.
pub fn suggest_or_recent(
    catalog: &[Product],
    partial: &str,
    history: &[String],
    max_suggestions: usize,
) -> Vec<String> {
    if partial.trim().is_empty() {
        return history.iter().take(max_suggestions).cloned().collect();
    }
    suggest(catalog, partial, max_suggestions)
}

/// Splits `text` around case-insensitive occurrences of `query`.
///
/// Concatenating the `text` of every span gives back the input unchanged.
pub fn highlight<'a>(text: &'a str, query: &str) -> Vec<HighlightSpan<'a>> {
    let query = query.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if query.is_empty() {
        return vec![HighlightSpan {
            text,
            highlighted: false,
        }];
    }

    let mut spans = Vec::new();
    let mut plain_start = 0;
    let mut cursor = 0;

    while cursor < text.len() {
        match match_len_at(&text[cursor..], query) {
            Some(length) => {
                if plain_start < cursor {
                    spans.push(HighlightSpan {
                        text: &text[plain_start..cursor],
                        highlighted: false,
                    });
                }
                spans.push(HighlightSpan {
                    text: &text[cursor..cursor + length],
                    highlighted: true,
                });
                cursor += length;
                plain_start = cursor;
            }
            None => {
                cursor += text[cursor..].chars().next().map_or(1, char::len_utf8);
            }
        }
    }

    if plain_start < text.len() {
        spans.push(HighlightSpan {
            text: &text[plain_start..],
            highlighted: false,
        });
    }

    spans
}

// byte length of the prefix of `haystack` equal to `needle` ignoring case
fn match_len_at(haystack: &str, needle: &str) -> Option<usize> {
    let mut consumed = 0;
    let mut haystack_chars = haystack.chars();

    for expected in needle.chars() {
        let found = haystack_chars.next()?;
        if !found.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
        consumed += found.len_utf8();
    }

    (consumed > 0).then_some(consumed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::storefront;

    fn rebuild(spans: &[HighlightSpan<'_>]) -> String {
        spans.iter().map(|span| span.text).collect()
    }

    #[test]
    fn suggestions_keep_original_case_and_first_seen_order() {
        let catalog = storefront();
        assert_eq!(
            suggest(&catalog, "milk", 5),
            vec!["Milk".to_string(), "With Steamed Milk".to_string()]
        );
        assert_eq!(
            suggest(&catalog, "AR", 5),
            vec![
                "Dark Roast Beans".to_string(),
                "Arabica".to_string(),
                "Dark Roasted".to_string()
            ]
        );
    }

    #[test]
    fn suggestions_are_unique_and_truncated() {
        let mut catalog = storefront();
        catalog.extend(storefront());

        let suggestions = suggest(&catalog, "a", 3);
        assert_eq!(suggestions.len(), 3);
        let unique: HashSet<_> = suggestions.iter().collect();
        assert_eq!(unique.len(), 3);
        assert_eq!(suggest(&catalog, "   ", 3), Vec::<String>::new());
    }

    #[test]
    fn blank_input_falls_back_to_recent_searches() {
        let catalog = storefront();
        let history = vec!["mocha".to_string(), "latte".to_string(), "flat white".to_string()];
        assert_eq!(
            suggest_or_recent(&catalog, "", &history, 2),
            vec!["mocha".to_string(), "latte".to_string()]
        );
        assert_eq!(
            suggest_or_recent(&catalog, "ameri", &history, 2),
            vec!["Americano".to_string()]
        );
    }

    #[test]
    fn highlight_marks_every_occurrence() {
        let spans = highlight("Latte with LATTE art", "latte");
        assert_eq!(
            spans,
            vec![
                HighlightSpan { text: "Latte", highlighted: true },
                HighlightSpan { text: " with ", highlighted: false },
                HighlightSpan { text: "LATTE", highlighted: true },
                HighlightSpan { text: " art", highlighted: false },
            ]
        );
    }

    #[test]
    fn highlight_round_trips() {
        let samples = [
            ("Café Crème brûlée", "CRÈ"),
            ("aaaa", "aa"),
            ("Dark Roasted", "zzz"),
            ("Dark Roasted", ""),
            ("", "dark"),
            ("Flat White", "flat white extra"),
            ("日本のコーヒー", "コー"),
        ];

        for (text, query) in samples {
            let spans = highlight(text, query);
            assert_eq!(rebuild(&spans), text, "{text:?} / {query:?}");
        }
    }

    #[test]
    fn highlight_handles_multibyte_matches() {
        let spans = highlight("Café Crème", "crème");
        assert_eq!(spans.last(), Some(&HighlightSpan { text: "Crème", highlighted: true }));
    }
}
