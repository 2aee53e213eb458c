use crate::models::{Product, SearchMetadata, SearchRequest, SearchResult};
use crate::traits::ProductSearcher;
use crate::SearchError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;
use url::Url;

const BACKEND: &str = "remote-search";

pub struct HttpRemoteSearcher {
    client: Arc<Client>,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpRemoteSearcher {
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self, SearchError> {
        Ok(Self {
            client: Arc::new(Client::new()),
            endpoint: Url::parse(endpoint)?,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ProductSearcher for HttpRemoteSearcher {
    async fn search<'a>(
        &self,
        catalog: &'a [Product],
        request: &SearchRequest,
    ) -> Result<SearchResult<'a>, SearchError> {
        let body = request_body(request);

        let mut call = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(api_key) = &self.api_key {
            call = call.bearer_auth(api_key);
        }

        let response = call.send().await?;
        if !response.status().is_success() {
            return Err(SearchError::BackendResponse {
                backend: BACKEND.to_string(),
                details: response.status().to_string(),
            });
        }

        let payload: Value = response.json().await?;
        resolve_response(catalog, request, &payload)
    }
}

pub(crate) fn request_body(request: &SearchRequest) -> Value {
    json!({
        "query": request.query.original_query(),
        "terms": request.query.terms(),
        "modality": request.query.search_type(),
        "options": request.options,
    })
}

/// Maps a `{products, metadata, scores}` payload back onto catalog entries.
pub(crate) fn resolve_response<'a>(
    catalog: &'a [Product],
    request: &SearchRequest,
    payload: &Value,
) -> Result<SearchResult<'a>, SearchError> {
    let listed = payload
        .pointer("/products")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchError::BackendResponse {
            backend: BACKEND.to_string(),
            details: "response has no products array".to_string(),
        })?;

    let by_id: HashMap<&str, &'a Product> = catalog
        .iter()
        .map(|product| (product.id.as_str(), product))
        .collect();

    let remote_scores = payload
        .pointer("/scores")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let mut products = Vec::new();
    let mut scores = HashMap::new();
    for raw in listed {
        let id = raw
            .pointer("/id")
            .and_then(Value::as_str)
            .or_else(|| raw.as_str())
            .unwrap_or_default();

        let Some(product) = by_id.get(id) else {
            warn!(product_id = id, "remote search returned a product outside the catalog");
            continue;
        };

        if let Some(score) = remote_scores.get(id).and_then(Value::as_f64) {
            scores.insert(product.id.clone(), score);
        }
        products.push(*product);
    }

    let metadata = match payload.pointer("/metadata") {
        Some(raw) if !raw.is_null() => serde_json::from_value::<SearchMetadata>(raw.clone())?,
        _ => SearchMetadata {
            search_type: request.query.search_type(),
            original_query: request.query.original_query(),
            processed_terms: request.query.terms(),
            total_matches: products.len(),
        },
    };

    Ok(SearchResult {
        products,
        scores,
        metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::storefront;
    use crate::models::{SearchQuery, SearchType};

    #[test]
    fn request_body_carries_terms_modality_and_options() {
        let request = SearchRequest::new(SearchQuery::voice("dark roast"));
        let body = request_body(&request);

        assert_eq!(body["query"], "dark roast");
        assert_eq!(body["modality"], "voice");
        assert_eq!(body["options"]["maxResults"], 20);
        let terms = body["terms"].as_array().expect("terms should be an array");
        assert!(terms.iter().any(|term| term == "Dark Roasted"));
    }

    #[test]
    fn response_resolves_ids_and_drops_unknown_products() {
        let catalog = storefront();
        let request = SearchRequest::new(SearchQuery::voice("beans"));
        let payload = json!({
            "products": [{"id": "C", "name": "Dark Roast Beans"}, {"id": "ghost"}, "A"],
            "scores": {"C": 0.9, "A": 0.4, "ghost": 1.0},
            "metadata": {
                "searchType": "voice",
                "originalQuery": "beans",
                "processedTerms": ["beans", "Bean"],
                "totalMatches": 3
            }
        });

        let result =
            resolve_response(&catalog, &request, &payload).expect("payload should resolve");
        assert_eq!(result.product_ids(), vec!["C", "A"]);
        assert_eq!(result.score_of("C"), Some(0.9));
        assert_eq!(result.score_of("ghost"), None);
        assert_eq!(result.metadata.total_matches, 3);
        assert!(std::ptr::eq(result.products[0], &catalog[2]));
    }

    #[test]
    fn missing_metadata_is_synthesized_from_the_request() {
        let catalog = storefront();
        let request = SearchRequest::new(SearchQuery::text("latte"));
        let payload = json!({"products": [], "scores": {}});

        let result =
            resolve_response(&catalog, &request, &payload).expect("payload should resolve");
        assert_eq!(result.metadata.search_type, SearchType::Text);
        assert_eq!(result.metadata.processed_terms, vec!["latte"]);
        assert_eq!(result.metadata.total_matches, 0);
    }

    #[test]
    fn payload_without_products_is_a_backend_error() {
        let catalog = storefront();
        let request = SearchRequest::new(SearchQuery::text("latte"));
        let result = resolve_response(&catalog, &request, &json!({"error": "quota"}));
        assert!(matches!(result, Err(SearchError::BackendResponse { .. })));
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        assert!(matches!(
            HttpRemoteSearcher::new("not a url", None),
            Err(SearchError::Url(_))
        ));
    }
}
