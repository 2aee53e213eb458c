use crate::error::FilterError;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_with::skip_serializing_none;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoastLevel {
    Light,
    Medium,
    Dark,
}

impl RoastLevel {
    pub const ALL: [RoastLevel; 3] = [RoastLevel::Light, RoastLevel::Medium, RoastLevel::Dark];

    /// Label in the exact form the catalog stores it, e.g. `"Dark Roasted"`.
    pub fn label(self) -> &'static str {
        match self {
            RoastLevel::Light => "Light Roasted",
            RoastLevel::Medium => "Medium Roasted",
            RoastLevel::Dark => "Dark Roasted",
        }
    }

    pub fn word(self) -> &'static str {
        match self {
            RoastLevel::Light => "Light",
            RoastLevel::Medium => "Medium",
            RoastLevel::Dark => "Dark",
        }
    }

    pub fn from_word(word: &str) -> Option<Self> {
        match word.trim().to_lowercase().as_str() {
            "light" | "blonde" => Some(RoastLevel::Light),
            "medium" => Some(RoastLevel::Medium),
            "dark" => Some(RoastLevel::Dark),
            _ => None,
        }
    }

    /// First roast word found anywhere in a free-text description.
    pub fn mentioned_in(text: &str) -> Option<Self> {
        let lowered = text.to_lowercase();
        RoastLevel::ALL
            .into_iter()
            .find(|level| lowered.contains(&level.word().to_lowercase()))
    }
}

impl fmt::Display for RoastLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RoastLevel {
    type Err = FilterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowered = value.trim().to_lowercase();
        let word = lowered
            .strip_suffix(" roasted")
            .or_else(|| lowered.strip_suffix(" roast"))
            .unwrap_or(&lowered);
        RoastLevel::from_word(word).ok_or_else(|| FilterError::UnknownRoastLevel(value.to_string()))
    }
}

impl Serialize for RoastLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for RoastLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Coffee,
    Bean,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Coffee => "Coffee",
            Category::Bean => "Bean",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "coffee" | "drink" | "drinks" => Ok(Category::Coffee),
            "bean" | "beans" => Ok(Category::Bean),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceOption {
    #[serde(default)]
    pub size: String,
    #[serde(default, deserialize_with = "text_or_number")]
    pub price: String,
    #[serde(default)]
    pub currency: String,
}

impl PriceOption {
    pub fn amount(&self) -> f64 {
        parse_decimal(&self.price)
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub special_ingredient: String,
    #[serde(default)]
    pub ingredients: String,
    #[serde(default, alias = "roasted", deserialize_with = "lenient_parse")]
    pub roast_level: Option<RoastLevel>,
    #[serde(default)]
    pub prices: Vec<PriceOption>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub average_rating: f64,
    #[serde(default, deserialize_with = "text_or_number")]
    pub ratings_count: String,
    #[serde(default, deserialize_with = "lenient_optional_decimal")]
    pub popularity: Option<f64>,
    #[serde(default, alias = "type", deserialize_with = "lenient_parse")]
    pub category: Option<Category>,
}

impl Product {
    pub fn min_price(&self) -> Option<f64> {
        self.prices
            .iter()
            .map(PriceOption::amount)
            .min_by(|left, right| left.total_cmp(right))
    }

    pub fn max_price(&self) -> Option<f64> {
        self.prices
            .iter()
            .map(PriceOption::amount)
            .max_by(|left, right| left.total_cmp(right))
    }

    pub fn parsed_ratings_count(&self) -> u64 {
        parse_count(&self.ratings_count)
    }

    /// Precomputed popularity when present, otherwise rating times review volume.
    pub fn popularity(&self) -> f64 {
        match self.popularity {
            Some(value) if value.is_finite() => value,
            _ => self.average_rating * self.parsed_ratings_count() as f64,
        }
    }

    pub fn roast_label(&self) -> Option<&'static str> {
        self.roast_level.map(RoastLevel::label)
    }
}

/// Decimal text as stored in the catalog; anything unparsable counts as zero.
pub fn parse_decimal(text: &str) -> f64 {
    let cleaned = text.trim().trim_start_matches('$').replace(',', "");
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Integer counts may carry thousands separators (`"6,879"`).
pub fn parse_count(text: &str) -> u64 {
    let cleaned: String = text
        .chars()
        .filter(|character| !matches!(character, ',' | '_' | ' '))
        .collect();

    cleaned
        .parse::<u64>()
        .ok()
        .or_else(|| {
            cleaned
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite() && *value >= 0.0)
                .map(|value| value.trunc() as u64)
        })
        .unwrap_or(0)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
    Other(de::IgnoredAny),
}

fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<TextOrNumber>::deserialize(deserializer)? {
        Some(TextOrNumber::Text(text)) => text,
        Some(TextOrNumber::Number(number)) => number.to_string(),
        Some(TextOrNumber::Other(_)) | None => String::new(),
    })
}

fn lenient_decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    text_or_number(deserializer).map(|raw| parse_decimal(&raw))
}

fn lenient_optional_decimal<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    let raw = text_or_number(deserializer)?;
    Ok(raw
        .trim()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite()))
}

fn lenient_parse<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    Ok(text_or_number(deserializer)?.parse().ok())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    min: f64,
    max: f64,
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> Result<Self, FilterError> {
        for bound in [min, max] {
            if !bound.is_finite() || bound < 0.0 {
                return Err(FilterError::InvalidPriceBound(bound));
            }
        }
        if min > max {
            return Err(FilterError::InvertedPriceRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, low: f64, high: f64) -> bool {
        low >= self.min && high <= self.max
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self { min: 0.0, max: 50.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Name,
    PriceLow,
    PriceHigh,
    Rating,
    #[default]
    Popularity,
}

impl SortBy {
    pub fn as_str(self) -> &'static str {
        match self {
            SortBy::Name => "name",
            SortBy::PriceLow => "price_low",
            SortBy::PriceHigh => "price_high",
            SortBy::Rating => "rating",
            SortBy::Popularity => "popularity",
        }
    }
}

impl FromStr for SortBy {
    type Err = FilterError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "name" => Ok(SortBy::Name),
            "price_low" => Ok(SortBy::PriceLow),
            "price_high" => Ok(SortBy::PriceHigh),
            "rating" => Ok(SortBy::Rating),
            "popularity" => Ok(SortBy::Popularity),
            other => Err(FilterError::UnknownSort(other.to_string())),
        }
    }
}

pub const DEFAULT_MIN_RATING: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchFilters {
    price_range: PriceRange,
    min_rating: f64,
    roast_levels: BTreeSet<RoastLevel>,
    sort_by: SortBy,
}

impl SearchFilters {
    pub fn new(
        price_range: PriceRange,
        min_rating: f64,
        roast_levels: impl IntoIterator<Item = RoastLevel>,
        sort_by: SortBy,
    ) -> Result<Self, FilterError> {
        Self::default()
            .with_price_range(price_range)
            .with_min_rating(min_rating)
            .map(|filters| filters.with_roast_levels(roast_levels).with_sort(sort_by))
    }

    pub fn with_price_range(mut self, price_range: PriceRange) -> Self {
        self.price_range = price_range;
        self
    }

    pub fn with_min_rating(mut self, min_rating: f64) -> Result<Self, FilterError> {
        if !(0.0..=5.0).contains(&min_rating) {
            return Err(FilterError::InvalidRating(min_rating));
        }
        self.min_rating = min_rating;
        Ok(self)
    }

    pub fn with_roast_levels(mut self, roast_levels: impl IntoIterator<Item = RoastLevel>) -> Self {
        self.roast_levels = roast_levels.into_iter().collect();
        self
    }

    pub fn with_sort(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn price_range(&self) -> PriceRange {
        self.price_range
    }

    pub fn min_rating(&self) -> f64 {
        self.min_rating
    }

    pub fn roast_levels(&self) -> &BTreeSet<RoastLevel> {
        &self.roast_levels
    }

    pub fn sort_by(&self) -> SortBy {
        self.sort_by
    }
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            price_range: PriceRange::default(),
            min_rating: DEFAULT_MIN_RATING,
            roast_levels: BTreeSet::new(),
            sort_by: SortBy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringOptions {
    #[serde(alias = "min_relevance_score")]
    pub min_relevance_score: f64,
    #[serde(alias = "max_results")]
    pub max_results: usize,
    #[serde(alias = "boost_popular")]
    pub boost_popular: bool,
}

impl Default for ScoringOptions {
    fn default() -> Self {
        Self {
            min_relevance_score: 0.05,
            max_results: 20,
            boost_popular: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Text,
    Voice,
    Image,
    ImageNames,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMetadata {
    pub search_type: SearchType,
    pub original_query: String,
    pub processed_terms: Vec<String>,
    pub total_matches: usize,
}

#[derive(Debug, Clone)]
pub struct SearchResult<'a> {
    pub products: Vec<&'a Product>,
    pub scores: HashMap<String, f64>,
    pub metadata: SearchMetadata,
}

impl<'a> SearchResult<'a> {
    pub fn empty(search_type: SearchType, original_query: impl Into<String>) -> Self {
        Self {
            products: Vec::new(),
            scores: HashMap::new(),
            metadata: SearchMetadata {
                search_type,
                original_query: original_query.into(),
                processed_terms: Vec::new(),
                total_matches: 0,
            },
        }
    }

    pub fn score_of(&self, product_id: &str) -> Option<f64> {
        self.scores.get(product_id).copied()
    }

    pub fn product_ids(&self) -> Vec<&'a str> {
        self.products.iter().map(|product| product.id.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    #[default]
    Coffee,
    #[serde(alias = "beans")]
    Bean,
}

impl ProductType {
    pub fn term(self) -> &'static str {
        match self {
            ProductType::Coffee => "Coffee",
            ProductType::Bean => "Bean",
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Characteristics {
    pub roast_level: Option<String>,
    pub bean_type: Option<String>,
    pub brew_method: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageAnalysisResult {
    pub confidence: f64,
    pub product_type: ProductType,
    pub suggested_names: Vec<String>,
    pub characteristics: Characteristics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageAnalysisResponse {
    pub success: bool,
    pub is_coffee_related: Option<bool>,
    pub results: Vec<ImageAnalysisResult>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranscriptionResponse {
    pub success: bool,
    pub transcript: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl ImageInput {
    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let mime_type = match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("png") => "image/png",
            Some("webp") => "image/webp",
            Some("heic") => "image/heic",
            _ => "image/jpeg",
        };
        Ok(Self {
            bytes,
            mime_type: mime_type.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageMatchMode {
    /// Full synonym expansion, favours recall.
    #[default]
    Expanded,
    /// Suggested names only, favours precision.
    NamesOnly,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchQuery {
    Text {
        text: String,
    },
    Voice {
        transcript: String,
    },
    Image {
        results: Vec<ImageAnalysisResult>,
        mode: ImageMatchMode,
    },
}

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: SearchQuery,
    pub filters: Option<SearchFilters>,
    pub options: ScoringOptions,
}

impl SearchRequest {
    pub fn new(query: SearchQuery) -> Self {
        Self {
            query,
            filters: None,
            options: ScoringOptions::default(),
        }
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn with_options(mut self, options: ScoringOptions) -> Self {
        self.options = options;
        self
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_parses_catalog_json_with_text_numbers() {
        let raw = r#"{
            "id": "C1",
            "name": "Cappuccino",
            "description": "Foamy",
            "roasted": "Medium Roasted",
            "prices": [
                {"size": "S", "price": "1.38", "currency": "$"},
                {"size": "L", "price": 4.2, "currency": "$"}
            ],
            "averageRating": "4.7",
            "ratingsCount": "6,879",
            "type": "Coffee"
        }"#;

        let product: Product = serde_json::from_str(raw).expect("product should parse");
        assert_eq!(product.roast_level, Some(RoastLevel::Medium));
        assert_eq!(product.category, Some(Category::Coffee));
        assert_eq!(product.parsed_ratings_count(), 6_879);
        assert_eq!(product.min_price(), Some(1.38));
        assert_eq!(product.max_price(), Some(4.2));
        assert!((product.popularity() - 4.7 * 6_879.0).abs() < 1e-6);
    }

    #[test]
    fn malformed_numbers_count_as_zero() {
        let raw = r#"{
            "id": "X",
            "name": "Mystery",
            "roasted": "Charcoal Roasted",
            "prices": [{"size": "S", "price": "n/a"}],
            "averageRating": "great",
            "ratingsCount": "lots"
        }"#;

        let product: Product = serde_json::from_str(raw).expect("product should still parse");
        assert_eq!(product.roast_level, None);
        assert_eq!(product.min_price(), Some(0.0));
        assert_eq!(product.average_rating, 0.0);
        assert_eq!(product.parsed_ratings_count(), 0);
        assert_eq!(product.popularity(), 0.0);
    }

    #[test]
    fn loosely_typed_popularity_and_missing_price_still_parse() {
        let raw = r#"{
            "id": "Y",
            "name": "Flat White",
            "prices": [{"size": "S"}, {"size": "L", "price": "5"}],
            "averageRating": 4,
            "ratingsCount": true,
            "popularity": "1,200"
        }"#;

        let product: Product = serde_json::from_str(raw).expect("product should still parse");
        assert_eq!(product.popularity, Some(1_200.0));
        assert_eq!(product.min_price(), Some(0.0));
        assert_eq!(product.max_price(), Some(5.0));
        assert_eq!(product.parsed_ratings_count(), 0);

        let raw = r#"{
            "id": "Z",
            "name": "Mocha",
            "averageRating": 4,
            "ratingsCount": 10,
            "popularity": "high"
        }"#;
        let unreadable: Product = serde_json::from_str(raw).expect("product should still parse");
        assert_eq!(unreadable.popularity, None);
        assert_eq!(unreadable.popularity(), 40.0);
    }

    #[test]
    fn precomputed_popularity_wins() {
        let mut product = fixtures::product("P", "Latte", 4.0, &["3"]);
        product.ratings_count = "100".to_string();
        product.popularity = Some(12.0);
        assert_eq!(product.popularity(), 12.0);
    }

    #[test]
    fn price_range_rejects_inverted_bounds() {
        assert_eq!(
            PriceRange::new(10.0, 5.0),
            Err(FilterError::InvertedPriceRange { min: 10.0, max: 5.0 })
        );
        assert!(PriceRange::new(f64::NAN, 5.0).is_err());
        assert!(PriceRange::new(-1.0, 5.0).is_err());
        assert!(PriceRange::new(5.0, 5.0).is_ok());
    }

    #[test]
    fn min_rating_is_validated_not_clamped() {
        assert_eq!(
            SearchFilters::default().with_min_rating(5.5),
            Err(FilterError::InvalidRating(5.5))
        );
        let filters = SearchFilters::default()
            .with_min_rating(0.0)
            .expect("zero is a valid lower bound");
        assert_eq!(filters.min_rating(), 0.0);
    }

    #[test]
    fn roast_level_parses_label_and_bare_word() {
        assert_eq!("Dark Roasted".parse::<RoastLevel>(), Ok(RoastLevel::Dark));
        assert_eq!("light".parse::<RoastLevel>(), Ok(RoastLevel::Light));
        assert_eq!("medium roast".parse::<RoastLevel>(), Ok(RoastLevel::Medium));
        assert!("burnt".parse::<RoastLevel>().is_err());
    }

    #[test]
    fn sort_by_parses_snake_case_names() {
        assert_eq!("price_high".parse::<SortBy>(), Ok(SortBy::PriceHigh));
        assert_eq!(SortBy::default(), SortBy::Popularity);
        assert!("cheapest".parse::<SortBy>().is_err());
    }
}
