//! The command-line entry point: recognize one image and print JSON.

use std::{ffi::OsString, process::ExitCode};

use clap::Args;
use tokio::io::AsyncWrite;

use crate::{
    engines::OcrEngine,
    output::{ErrorOutput, create_writer, write_json_line},
    prelude::*,
    recognize::run_ocr,
    ui::{ProgressConfig, Ui},
};

/// Options for recognizing an image.
#[derive(Debug, Clone, Args)]
pub struct RecognizeOpts {
    /// The image to recognize.
    #[clap(value_name = "IMAGE_PATH", allow_hyphen_values = true)]
    pub image_path: Option<PathBuf>,

    /// Anything after the image path is accepted and ignored.
    #[clap(hide = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub extra: Vec<OsString>,

    /// Recognition language, using PaddleOCR's language codes.
    #[clap(long, default_value = "en")]
    pub lang: String,

    /// Python interpreter with the `paddleocr` package installed.
    #[clap(long, env = "PADDLEOCR_PYTHON", default_value = "python3")]
    pub python: PathBuf,

    /// Write the result to this file instead of standard output.
    #[clap(short = 'o', long = "out")]
    pub output_path: Option<PathBuf>,
}

/// How a recognition request finished, when it didn't fail outright.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecognizeStatus {
    /// We wrote the recognized text.
    Recognized,
    /// No image path was given, and we wrote a JSON error.
    MissingFilePath,
}

impl RecognizeStatus {
    /// The process exit code for this status.
    pub fn exit_code(self) -> ExitCode {
        match self {
            RecognizeStatus::Recognized => ExitCode::SUCCESS,
            RecognizeStatus::MissingFilePath => ExitCode::from(1),
        }
    }
}

/// Recognize the image named in `opts`.
///
/// The missing-path error always goes to `stdout`, even with `--out`. Any
/// other failure is returned as an error, and nothing is written.
#[instrument(level = "debug", skip_all)]
pub async fn cmd_recognize<W>(
    ui: &Ui,
    opts: &RecognizeOpts,
    engine: &dyn OcrEngine,
    stdout: &mut W,
) -> Result<RecognizeStatus>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let Some(image_path) = opts.image_path.as_deref() else {
        write_json_line(stdout, &ErrorOutput::missing_file_path()).await?;
        return Ok(RecognizeStatus::MissingFilePath);
    };
    if !opts.extra.is_empty() {
        debug!(extra = ?opts.extra, "Ignoring arguments after the image path");
    }

    let spinner = ui.new_spinner(&ProgressConfig {
        emoji: "🔎",
        msg: "Recognizing text",
        done_msg: "Recognized text",
    });
    let recognition = run_ocr(engine, image_path)
        .await
        .inspect_err(|_| spinner.abandon())?;
    spinner.finish_using_style();

    match opts.output_path.as_deref() {
        Some(output_path) => {
            let mut wtr = create_writer(Some(output_path)).await?;
            write_json_line(&mut wtr, &recognition).await?;
        }
        None => write_json_line(stdout, &recognition).await?,
    }
    Ok(RecognizeStatus::Recognized)
}
