use crate::deadline::Deadline;
use crate::models::{ImageAnalysisResponse, ImageInput};
use crate::traits::ImageAnalyzer;
use crate::SearchError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use url::Url;

const BACKEND: &str = "image-analysis";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageAnalysisRequest {
    image_base64: String,
    mime_type: String,
}

/// Posts the image to a JSON endpoint that answers with an
/// [`ImageAnalysisResponse`].
pub struct HttpImageAnalyzer {
    client: Arc<Client>,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpImageAnalyzer {
    pub fn new(endpoint: &str, api_key: Option<String>) -> Result<Self, SearchError> {
        Ok(Self {
            client: Arc::new(Client::new()),
            endpoint: Url::parse(endpoint)?,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }
}

#[async_trait]
impl ImageAnalyzer for HttpImageAnalyzer {
    async fn analyze(
        &self,
        image: &ImageInput,
        deadline: Deadline,
    ) -> Result<ImageAnalysisResponse, SearchError> {
        if image.bytes.is_empty() {
            return Err(SearchError::Request("image is empty".to_string()));
        }

        let payload = ImageAnalysisRequest {
            image_base64: STANDARD.encode(&image.bytes),
            mime_type: image.mime_type.clone(),
        };

        let mut request = self
            .client
            .post(self.endpoint.clone())
            .timeout(deadline.remaining())
            .json(&payload);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = deadline
            .run(BACKEND, async { request.send().await.map_err(SearchError::from) })
            .await?;
        if !response.status().is_success() {
            return Err(SearchError::BackendResponse {
                backend: BACKEND.to_string(),
                details: response.status().to_string(),
            });
        }

        Ok(response.json().await?)
    }
}
