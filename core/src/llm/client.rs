//! Text-generation client trait and request structures

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Trait for text-generation services
///
/// Every model interaction in the pipeline goes through this single seam:
/// plan text, structured extraction, validation verdicts, replan proposals,
/// narrative reports and summarization.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for a prompt, optionally grounded on an image
    async fn generate(&self, request: GenerateRequest) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// A single generation request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// The full prompt text
    pub prompt: String,

    /// Optional image attached to the prompt
    pub image: Option<ImageData>,
}

/// Image payload for multimodal requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageData {
    /// Base64-encoded image bytes
    pub data: String,

    /// MIME type of the image, e.g. `image/png`
    pub mime_type: String,
}

impl GenerateRequest {
    /// Create a text-only request
    pub fn text<S: Into<String>>(prompt: S) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
        }
    }

    /// Attach an image to the request
    pub fn with_image(mut self, image: ImageData) -> Self {
        self.image = Some(image);
        self
    }
}

impl ImageData {
    /// Encode raw image bytes as a request payload
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        use base64::Engine;
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            mime_type: mime_type.into(),
        }
    }

    /// Render as a `data:` URL for OpenAI-compatible image parts
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_data_url() {
        let image = ImageData::from_bytes(b"png-bytes", "image/png");
        let url = image.to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));
    }
}
