use std::{process::ExitCode, str::FromStr};

use clap::Parser;
use tracing_subscriber::{
    EnvFilter, Layer as _, filter::Directive, fmt::format::FmtSpan, layer::SubscriberExt,
    util::SubscriberInitExt as _,
};

use self::{
    engines::paddleocr::{PaddleOcrEngine, PaddleOcrOptions},
    prelude::*,
    ui::Ui,
};

mod cmd;
mod engines;
mod output;
mod prelude;
mod process_utils;
mod recognize;
mod ui;

/// Recognize the text in an image using PaddleOCR, and print it as JSON.
#[derive(Debug, Parser)]
#[clap(
    version,
    after_help = r#"
Output:
  {"text": "<lines joined with newlines>", "lines": ["<line>", ...]}

  If no image path is given, prints {"error": "Missing file path"} and exits
  with status 1.

Environment Variables:
  - PADDLEOCR_PYTHON (optional): Python interpreter with `paddleocr` installed.
  - RUST_LOG (optional): Log filter for messages on standard error.

  These variables may be set in a standard `.env` file.
"#
)]
struct Opts {
    #[clap(flatten)]
    recognize: cmd::RecognizeOpts,
}

/// Our entry point, which can return an error. [`anyhow::Result`] will
/// automatically print a nice error message with optional backtrace.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let ui = Ui::init();

    // Initialize tracing. Standard output is reserved for our JSON.
    let directive =
        Directive::from_str("warn").expect("built-in directive should be valid");
    let env_filter = EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy();

    let subscriber = tracing_subscriber::fmt::layer()
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
        .with_writer(ui.get_stderr_writer())
        .with_filter(env_filter);
    tracing_subscriber::registry().with(subscriber).init();

    real_main(ui).await
}

/// Our real entry point.
#[instrument(level = "debug", name = "main", skip_all)]
async fn real_main(ui: Ui) -> Result<ExitCode> {
    // Load environment variables from a `.env` file, if it exists.
    dotenvy::dotenv().ok();

    let opts = Opts::parse();
    debug!("Parsed options: {:?}", opts);
    let opts = opts.recognize;

    // Hide the spinner if we're using stdout for output.
    if opts.output_path.is_none() {
        ui.hide_progress_bars();
    }

    let engine = PaddleOcrEngine::new(
        &opts.python,
        PaddleOcrOptions {
            lang: opts.lang.clone(),
            ..PaddleOcrOptions::default()
        },
    );
    let mut stdout = tokio::io::stdout();
    let status = cmd::cmd_recognize(&ui, &opts, &engine, &mut stdout).await?;
    Ok(status.exit_code())
}
