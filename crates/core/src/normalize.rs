//! Turns voice transcripts and image analyses into canonical search terms.

use crate::models::{ImageAnalysisResult, ImageMatchMode, RoastLevel, SearchQuery, SearchType};
use std::collections::HashSet;
use tracing::debug;

const STOP_WORDS: [&str; 28] = [
    "a", "an", "the", "and", "or", "of", "with", "for", "to", "in", "on", "at", "some", "any",
    "me", "my", "i", "im", "want", "would", "like", "please", "show", "find", "get", "give",
    "is", "that",
];

const DRINK_INGREDIENTS: [(&str, &[&str]); 4] = [
    ("cappuccino", &["Espresso", "Steamed Milk", "Foam"]),
    ("latte", &["Espresso", "Steamed Milk"]),
    ("americano", &["Espresso", "Hot Water"]),
    ("macchiato", &["Espresso", "Foam"]),
];

const BEAN_ORIGINS: [(&str, &str); 4] = [
    ("arabica", "South America"),
    ("robusta", "Africa"),
    ("liberica", "West Africa"),
    ("excelsa", "Southeast Asia"),
];

/// Insertion-ordered set of non-blank terms.
#[derive(Debug, Default)]
struct TermSet {
    ordered: Vec<String>,
    seen: HashSet<String>,
}

impl TermSet {
    fn push(&mut self, term: &str) {
        let term = term.trim();
        if term.is_empty() || self.seen.contains(term) {
            return;
        }
        self.seen.insert(term.to_string());
        self.ordered.push(term.to_string());
    }

    fn push_roast(&mut self, level: RoastLevel) {
        self.push(level.word());
        self.push(level.label());
    }

    fn into_vec(self) -> Vec<String> {
        self.ordered
    }
}

pub fn terms_from_voice_transcript(transcript: &str) -> Vec<String> {
    let cleaned: String = transcript
        .to_lowercase()
        .chars()
        .filter_map(|character| {
            if character.is_alphanumeric() || character.is_whitespace() {
                Some(character)
            } else if matches!(character, '\'' | '\u{2019}') {
                None
            } else {
                Some(' ')
            }
        })
        .collect();

    let mut terms = TermSet::default();
    for token in cleaned.split_whitespace() {
        if STOP_WORDS.contains(&token) {
            continue;
        }
        terms.push(token);
        expand_spoken_token(token, &mut terms);
    }

    let terms = terms.into_vec();
    debug!(transcript, term_count = terms.len(), "normalized voice transcript");
    terms
}

fn expand_spoken_token(token: &str, terms: &mut TermSet) {
    if let Some(level) = RoastLevel::from_word(token) {
        terms.push_roast(level);
        return;
    }

    match token {
        "bean" | "beans" => terms.push("Bean"),
        "espresso" | "espressos" => terms.push("Espresso"),
        "milk" | "milky" => {
            terms.push("Milk");
            terms.push("Steamed Milk");
        }
        _ => {}
    }
}

pub fn terms_from_image_analysis(results: &[ImageAnalysisResult]) -> Vec<String> {
    let mut terms = TermSet::default();

    for result in results {
        for name in &result.suggested_names {
            terms.push(name);
        }
        terms.push(result.product_type.term());

        let characteristics = &result.characteristics;
        if let Some(roast) = &characteristics.roast_level {
            terms.push(roast);
            if let Some(level) = RoastLevel::mentioned_in(roast) {
                terms.push_roast(level);
            }
        }
        if let Some(bean_type) = &characteristics.bean_type {
            terms.push(bean_type);
            if !bean_type.to_lowercase().contains("bean") {
                terms.push(&format!("{} Bean", bean_type.trim()));
            }
        }
        if let Some(brew_method) = &characteristics.brew_method {
            terms.push(brew_method);
            expand_brew_method(brew_method, &mut terms);
        }
        if let Some(color) = &characteristics.color {
            expand_color(color, &mut terms);
        }
    }

    let first_pass = terms.ordered.clone();
    for term in &first_pass {
        let lowered = term.to_lowercase();
        for (drink, ingredients) in DRINK_INGREDIENTS {
            if lowered.contains(drink) {
                ingredients.iter().for_each(|ingredient| terms.push(ingredient));
            }
        }
        for (bean, origin) in BEAN_ORIGINS {
            if lowered.contains(bean) {
                terms.push(origin);
            }
        }
    }

    let terms = terms.into_vec();
    debug!(results = results.len(), term_count = terms.len(), "normalized image analysis");
    terms
}

fn expand_brew_method(brew_method: &str, terms: &mut TermSet) {
    let lowered = brew_method.to_lowercase();
    if lowered.contains("espresso") {
        terms.push("Espresso");
        terms.push("Strong");
    }
    if lowered.contains("steamed milk") {
        terms.push("Steamed Milk");
        terms.push("Milk");
    }
    if lowered.contains("foam") {
        terms.push("Foam");
    }
}

fn expand_color(color: &str, terms: &mut TermSet) {
    let lowered = color.to_lowercase();
    if lowered.contains("dark") {
        terms.push(RoastLevel::Dark.label());
        terms.push("Strong");
    }
    if lowered.contains("medium") {
        terms.push(RoastLevel::Medium.label());
    }
    if lowered.contains("light") {
        terms.push(RoastLevel::Light.label());
        terms.push("Mild");
    }
}

/// Deduplicated suggested names across all results, for name-only matching.
pub fn suggested_names_only(results: &[ImageAnalysisResult]) -> Vec<String> {
    let mut terms = TermSet::default();
    for name in results.iter().flat_map(|result| &result.suggested_names) {
        terms.push(name);
    }
    terms.into_vec()
}

impl SearchQuery {
    pub fn text(text: impl Into<String>) -> Self {
        SearchQuery::Text { text: text.into() }
    }

    pub fn voice(transcript: impl Into<String>) -> Self {
        SearchQuery::Voice {
            transcript: transcript.into(),
        }
    }

    pub fn image(results: Vec<ImageAnalysisResult>, mode: ImageMatchMode) -> Self {
        SearchQuery::Image { results, mode }
    }

    /// Canonical terms handed to the scorer, whatever the modality.
    pub fn terms(&self) -> Vec<String> {
        match self {
            SearchQuery::Text { text } => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    Vec::new()
                } else {
                    vec![trimmed.to_string()]
                }
            }
            SearchQuery::Voice { transcript } => terms_from_voice_transcript(transcript),
            SearchQuery::Image {
                results,
                mode: ImageMatchMode::Expanded,
            } => terms_from_image_analysis(results),
            SearchQuery::Image {
                results,
                mode: ImageMatchMode::NamesOnly,
            } => suggested_names_only(results),
        }
    }

    pub fn search_type(&self) -> SearchType {
        match self {
            SearchQuery::Text { .. } => SearchType::Text,
            SearchQuery::Voice { .. } => SearchType::Voice,
            SearchQuery::Image {
                mode: ImageMatchMode::Expanded,
                ..
            } => SearchType::Image,
            SearchQuery::Image {
                mode: ImageMatchMode::NamesOnly,
                ..
            } => SearchType::ImageNames,
        }
    }

    pub fn original_query(&self) -> String {
        match self {
            SearchQuery::Text { text } => text.trim().to_string(),
            SearchQuery::Voice { transcript } => transcript.trim().to_string(),
            SearchQuery::Image { results, .. } => suggested_names_only(results).join(", "),
        }
    }

    /// Whatever plain text is available when only substring filtering can run.
    pub fn raw_text(&self) -> String {
        match self {
            SearchQuery::Text { text } => text.trim().to_string(),
            SearchQuery::Voice { transcript } => transcript.trim().to_string(),
            SearchQuery::Image { .. } => self.terms().join(" "),
        }
    }
}
