//! Turn nested engine output into flat lines of text.

use crate::{
    engines::{OcrEngine, OcrPage},
    prelude::*,
};

/// The text recognized in an image.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recognition {
    /// All the lines, joined with newlines.
    pub text: String,

    /// Each recognized item, in page order and then detection order.
    pub lines: Vec<String>,
}

impl Recognition {
    /// Flatten pages of detected items. Geometry and confidence are dropped.
    pub fn from_pages(pages: Vec<OcrPage>) -> Self {
        let lines = pages
            .into_iter()
            .flat_map(|page| page.items)
            .map(|item| {
                trace!(
                    confidence = item.confidence,
                    corners = ?item.bounding_box,
                    text = %item.text,
                    "Detected item"
                );
                item.text
            })
            .collect::<Vec<_>>();
        Self {
            text: lines.join("\n"),
            lines,
        }
    }
}

/// Recognize the text in a single image.
#[instrument(level = "debug", skip_all, fields(path = %image_path.display()))]
pub async fn run_ocr(engine: &dyn OcrEngine, image_path: &Path) -> Result<Recognition> {
    let pages = engine
        .recognize(image_path)
        .await
        .with_context(|| format!("failed to recognize text in {:?}", image_path))?;
    let page_count = pages.len();
    let recognition = Recognition::from_pages(pages);
    debug!(
        pages = page_count,
        lines = recognition.lines.len(),
        "Recognized text"
    );
    Ok(recognition)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::engines::DetectedItem;

    /// An engine that returns canned pages, or fails.
    pub struct StubEngine {
        pages: Option<Vec<Vec<&'static str>>>,
        calls: AtomicUsize,
    }

    impl StubEngine {
        pub fn new(pages: Vec<Vec<&'static str>>) -> Self {
            Self {
                pages: Some(pages),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing() -> Self {
            Self {
                pages: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl OcrEngine for StubEngine {
        async fn recognize(&self, _image_path: &Path) -> Result<Vec<OcrPage>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let pages = self
                .pages
                .as_ref()
                .ok_or_else(|| anyhow!("cannot open image"))?;
            Ok(pages
                .iter()
                .map(|texts| OcrPage {
                    items: texts.iter().map(|&t| DetectedItem::from_text(t)).collect(),
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn single_page() -> Result<()> {
        let engine = StubEngine::new(vec![vec!["Hello", "World"]]);
        let recognition = run_ocr(&engine, Path::new("image.png")).await?;
        assert_eq!(recognition.text, "Hello\nWorld");
        assert_eq!(recognition.lines, vec!["Hello", "World"]);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn no_pages() -> Result<()> {
        let engine = StubEngine::new(vec![]);
        let recognition = run_ocr(&engine, Path::new("image.png")).await?;
        assert_eq!(recognition.text, "");
        assert!(recognition.lines.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn pages_are_concatenated_in_order() -> Result<()> {
        let engine = StubEngine::new(vec![vec!["a", "b"], vec![], vec!["c"], vec!["d", "e"]]);
        let recognition = run_ocr(&engine, Path::new("image.png")).await?;
        assert_eq!(recognition.lines, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(recognition.text, "a\nb\nc\nd\ne");
        Ok(())
    }

    #[tokio::test]
    async fn engine_errors_propagate() {
        let engine = StubEngine::failing();
        let err = run_ocr(&engine, Path::new("missing.png"))
            .await
            .unwrap_err();
        assert!(format!("{:?}", err).contains("cannot open image"));
    }

    #[test]
    fn duplicates_and_blank_lines_are_kept() {
        let recognition = Recognition::from_pages(vec![OcrPage {
            items: vec![
                DetectedItem::from_text("x"),
                DetectedItem::from_text(""),
                DetectedItem::from_text("x"),
            ],
        }]);
        assert_eq!(recognition.lines, vec!["x", "", "x"]);
        assert_eq!(recognition.text, "x\n\nx");
    }

    #[test]
    fn text_always_equals_joined_lines() {
        let words = ["alpha", "", "line\nbreak", "Ünïcødé", " spaced ", "z"];
        for page_count in 0..4 {
            for items_per_page in 0..words.len() {
                let pages = (0..page_count)
                    .map(|page_idx| OcrPage {
                        items: (0..items_per_page)
                            .map(|i| {
                                DetectedItem::from_text(words[(i + page_idx) % words.len()])
                            })
                            .collect(),
                    })
                    .collect::<Vec<_>>();
                let recognition = Recognition::from_pages(pages);
                assert_eq!(recognition.lines.len(), page_count * items_per_page);
                assert_eq!(recognition.text, recognition.lines.join("\n"));
            }
        }
    }
}
