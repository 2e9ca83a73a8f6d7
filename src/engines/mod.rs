//! OCR engine interface.
//!
//! We never recognize text ourselves. Instead, we hand an image path to an
//! [`OcrEngine`] and get back a nested list of pages and detected items.

use crate::prelude::*;

pub mod paddleocr;

/// A single region of text found by an OCR engine.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedItem {
    /// The recognized text.
    pub text: String,

    /// How confident the engine is in `text`, from 0.0 to 1.0.
    pub confidence: f32,

    /// The corners of the region, in image pixel coordinates.
    pub bounding_box: Vec<[f32; 2]>,
}

impl DetectedItem {
    /// Create an item with only text.
    #[cfg(test)]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: 1.0,
            bounding_box: vec![],
        }
    }
}

/// All the items detected on one page, in detection order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OcrPage {
    pub items: Vec<DetectedItem>,
}

/// Interface for recognizing text in an image.
#[async_trait]
pub trait OcrEngine: Send + Sync + 'static {
    /// Recognize all the text in the image at `image_path`.
    async fn recognize(&self, image_path: &Path) -> Result<Vec<OcrPage>>;
}
