//! Thin RPC client over the external ML inference service. The core owns
//! only the request/response shape and the retry-free call site; batching,
//! model selection, and GPU scheduling all live in the service itself.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MlClientError {
    #[error("network error calling ML service: {0}")]
    Network(#[from] reqwest::Error),

    #[error("ML service returned an empty result")]
    EmptyResult,

    #[error("ML service error: {0}")]
    ServiceError(String),
}

#[derive(Debug, Deserialize)]
struct ClipResponse {
    #[serde(default)]
    vector: Option<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct TextResponse {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FaceResponse {
    #[serde(default)]
    regions: Vec<FaceRegion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FaceRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub embedding: Vec<f32>,
}

pub struct MlClient {
    http: Client,
    base_url: String,
}

impl MlClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Sends the 224x224 WEBP CLIP preprocessing output and returns its
    /// embedding vector. Fails when the response is absent or the vector
    /// is empty, matching the "nil/empty vector" fatal condition.
    pub async fn process_image_for_clip(&self, image_data: &[u8]) -> Result<Vec<f32>, MlClientError> {
        let response: ClipResponse = self.post("/v1/clip", image_data).await?;
        match response.vector {
            Some(vector) if !vector.is_empty() => Ok(vector),
            _ => Err(MlClientError::EmptyResult),
        }
    }

    pub async fn process_image_for_ocr(&self, image_data: &[u8]) -> Result<String, MlClientError> {
        let response: TextResponse = self.post("/v1/ocr", image_data).await?;
        response.text.filter(|t| !t.is_empty()).ok_or(MlClientError::EmptyResult)
    }

    pub async fn process_image_for_caption(
        &self,
        image_data: &[u8],
    ) -> Result<String, MlClientError> {
        let response: TextResponse = self.post("/v1/caption", image_data).await?;
        response.text.filter(|t| !t.is_empty()).ok_or(MlClientError::EmptyResult)
    }

    pub async fn process_image_for_face(
        &self,
        image_data: &[u8],
    ) -> Result<Vec<FaceRegion>, MlClientError> {
        let response: FaceResponse = self.post("/v1/face", image_data).await?;
        Ok(response.regions)
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        image_data: &[u8],
    ) -> Result<T, MlClientError> {
        let form = Form::new().part("image", Part::bytes(image_data.to_vec()));

        let response = self
            .http
            .post(format!("{}{path}", self.base_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MlClientError::ServiceError(format!("{status}: {body}")));
        }

        response.json::<T>().await.map_err(MlClientError::Network)
    }
}
