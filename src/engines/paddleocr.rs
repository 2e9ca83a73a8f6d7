//! PaddleOCR engine.
//!
//! PaddleOCR is only available as a Python package, so we run a small helper
//! program under a Python interpreter and read the raw result back as JSON.

use tokio::process::Command;

use crate::{prelude::*, process_utils::check_for_command_failure};

use super::{DetectedItem, OcrEngine, OcrPage};

/// Helper program run by the Python interpreter.
///
/// Arguments: image path, angle classification flag, language, log flag.
/// Prints the result of `PaddleOCR.ocr` as one line of JSON on stdout.
const PADDLEOCR_HELPER: &str = r#"
import json
import sys

from paddleocr import PaddleOCR

image_path = sys.argv[1]
use_angle_cls = sys.argv[2] == "1"
lang = sys.argv[3]
show_log = sys.argv[4] == "1"

ocr = PaddleOCR(use_angle_cls=use_angle_cls, lang=lang, show_log=show_log)
result = ocr.ocr(image_path, cls=use_angle_cls) or []


def convert_page(page):
    if page is None:
        return None
    return [
        [[[float(x), float(y)] for x, y in box], [str(text), float(score)]]
        for box, (text, score) in page
    ]


print(json.dumps([convert_page(page) for page in result]))
"#;

/// Options passed to the `PaddleOCR` constructor.
#[derive(Clone, Debug)]
pub struct PaddleOcrOptions {
    /// Classify and correct the rotation of text regions.
    pub use_angle_cls: bool,

    /// Recognition language, in PaddleOCR's naming (`en`, `ch`, `fr`...).
    pub lang: String,

    /// Let PaddleOCR print its own log output to stderr.
    pub show_log: bool,
}

impl Default for PaddleOcrOptions {
    fn default() -> Self {
        Self {
            use_angle_cls: true,
            lang: "en".to_owned(),
            show_log: false,
        }
    }
}

/// OCR engine wrapping the `paddleocr` Python package.
pub struct PaddleOcrEngine {
    /// The Python interpreter with `paddleocr` installed.
    python: PathBuf,

    /// Options for every recognition.
    options: PaddleOcrOptions,
}

impl PaddleOcrEngine {
    /// Create a new PaddleOCR engine.
    pub fn new(python: impl Into<PathBuf>, options: PaddleOcrOptions) -> Self {
        Self {
            python: python.into(),
            options,
        }
    }
}

#[async_trait]
impl OcrEngine for PaddleOcrEngine {
    #[instrument(level = "debug", skip_all, fields(path = %image_path.display()))]
    async fn recognize(&self, image_path: &Path) -> Result<Vec<OcrPage>> {
        let flag = |enabled: bool| if enabled { "1" } else { "0" };
        let output = Command::new(&self.python)
            .arg("-c")
            .arg(PADDLEOCR_HELPER)
            .arg(image_path)
            .arg(flag(self.options.use_angle_cls))
            .arg(&self.options.lang)
            .arg(flag(self.options.show_log))
            .output()
            .await
            .with_context(|| format!("cannot run PaddleOCR using {:?}", self.python))?;
        check_for_command_failure("paddleocr", &output)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_paddleocr_output(&stdout)
    }
}

/// One detected item, as serialized by our helper: `[box, [text, score]]`.
#[derive(Debug, Deserialize)]
struct RawItem(Vec<[f32; 2]>, (String, f32));

/// Parse the output of our helper program.
///
/// PaddleOCR sometimes prints model download progress to stdout, so we only
/// look at the last non-empty line. Pages with no text are `null`, and we
/// treat them as empty pages rather than failing.
fn parse_paddleocr_output(stdout: &str) -> Result<Vec<OcrPage>> {
    let json_line = stdout
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| anyhow!("paddleocr produced no output"))?;
    let raw_pages: Vec<Option<Vec<RawItem>>> = serde_json::from_str(json_line)
        .with_context(|| format!("cannot parse paddleocr output: {:?}", json_line))?;
    Ok(raw_pages
        .into_iter()
        .map(|raw_page| OcrPage {
            items: raw_page
                .unwrap_or_default()
                .into_iter()
                .map(|RawItem(bounding_box, (text, confidence))| DetectedItem {
                    text,
                    confidence,
                    bounding_box,
                })
                .collect(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pages_and_items() {
        let stdout = r#"[[[[[1.0, 2.0], [3.0, 2.0], [3.0, 4.0], [1.0, 4.0]], ["Hello", 0.98]], [[[1.0, 5.0], [3.0, 5.0], [3.0, 7.0], [1.0, 7.0]], ["World", 0.5]]]]"#;
        let pages = parse_paddleocr_output(stdout).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].items.len(), 2);
        assert_eq!(pages[0].items[0].text, "Hello");
        assert_eq!(pages[0].items[0].confidence, 0.98);
        assert_eq!(pages[0].items[0].bounding_box[2], [3.0, 4.0]);
        assert_eq!(pages[0].items[1].text, "World");
    }

    #[test]
    fn null_pages_are_empty() {
        let pages = parse_paddleocr_output("[null]\n").unwrap();
        assert_eq!(pages, vec![OcrPage::default()]);
    }

    #[test]
    fn no_pages_at_all() {
        assert!(parse_paddleocr_output("[]").unwrap().is_empty());
    }

    #[test]
    fn skips_download_chatter() {
        let stdout = "download https://paddleocr.bj.bcebos.com/model.tar to ~/.paddleocr\n\
                      [[[[[0, 0], [1, 0], [1, 1], [0, 1]], [\"ok\", 1]]]]\n\n";
        let pages = parse_paddleocr_output(stdout).unwrap();
        assert_eq!(pages[0].items[0].text, "ok");
    }

    #[test]
    fn empty_output_is_an_error() {
        assert!(parse_paddleocr_output("  \n").is_err());
    }

    #[test]
    fn malformed_output_is_an_error() {
        assert!(parse_paddleocr_output("Traceback (most recent call last):").is_err());
    }

    #[tokio::test]
    async fn missing_interpreter_is_an_error() {
        let engine = PaddleOcrEngine::new(
            "/nonexistent/python-for-paddleocr",
            PaddleOcrOptions::default(),
        );
        let result = engine.recognize(Path::new("image.png")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    #[ignore = "Requires PaddleOCR to be installed"]
    async fn recognizes_real_image() -> Result<()> {
        let engine = PaddleOcrEngine::new("python3", PaddleOcrOptions::default());
        let pages = engine
            .recognize(Path::new("tests/fixtures/hello_world.png"))
            .await?;
        assert!(!pages.is_empty());
        Ok(())
    }
}
