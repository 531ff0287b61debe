//! CLI binary for anki-flashgen.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `FlashgenConfig`, shows a preview of the generated cards and writes the
//! Anki import file.

use anyhow::{Context, Result};
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use anki_flashgen::credentials::{self, CredentialSource, DEFAULT_SECRETS_PATH};
use anki_flashgen::{
    write_export, DocumentExtractor, FlashgenConfig, FlashgenError, Pipeline, PipelineObserver,
    PipelineState, ProviderGenerator, Request, SourceSpec, EXPORT_FILE_NAME,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Exit status for "no text to work with": the user should retry with input.
const EXIT_NEEDS_INPUT: u8 = 2;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Spinner driven by pipeline state ─────────────────────────────────────

/// Shows the current pipeline stage on a single spinner line.
struct SpinnerObserver {
    bar: ProgressBar,
}

impl SpinnerObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("flashgen");
        bar.set_message("Loading input…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl PipelineObserver for SpinnerObserver {
    fn on_transition(&self, _from: &PipelineState, to: &PipelineState) {
        match to {
            PipelineState::Extracted { chars } => {
                self.bar.println(format!(
                    "  {} Extracted {}",
                    green("✓"),
                    dim(&format!("{chars} chars"))
                ));
            }
            s if s.is_terminal() => self.bar.finish_and_clear(),
            s => {
                let label = s.label();
                let mut chars = label.chars();
                let capitalised = match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                };
                self.bar.set_message(format!("{capitalised}…"));
            }
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Flashcards from a sentence
  flashgen --text "A mitocôndria é a usina de energia da célula."

  # From a file, or from stdin
  flashgen --text-file resumo.txt
  cat resumo.txt | flashgen --text -

  # From a PDF (local or URL) into a custom file
  flashgen --pdf apostila.pdf -o biologia.csv

  # From a scanned page (Portuguese OCR via tesseract)
  flashgen --image pagina.jpg

  # Print the cards as JSON instead of writing a file
  flashgen --text-file resumo.txt --json

  # Use another provider through edgequake-llm
  flashgen --provider openai --model gpt-4.1-mini --text-file resumo.txt

When several sources are given, the last one on the command line is used.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY     Google Gemini API key (also read from .env)
  FLASHGEN_SECRETS   Secret store path (default .flashgen/secrets.toml)
  FLASHGEN_MODEL     Override model ID (default gemini-2.5-pro)
  FLASHGEN_PROVIDER  Use an edgequake-llm provider instead of Gemini
  RUST_LOG           Override log filtering

EXIT STATUS:
  0  flashcards generated
  1  any failure
  2  no text found in the input
"#;

/// Generate Anki flashcards from text, PDFs or images.
#[derive(Parser, Debug)]
#[command(
    name = "flashgen",
    version,
    about = "Generate Anki flashcards from text, PDFs or images using Gemini",
    long_about = "Generate question/answer flashcards from study material and write them as a \
`;`-delimited file ready for Anki import. Input can be typed text, a text file, a PDF \
(local or URL) or an image (PNG/JPEG, OCR in Portuguese).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Study text, or `-` to read it from stdin.
    #[arg(long, value_name = "TEXT|-")]
    text: Option<String>,

    /// Read study text from a UTF-8 file.
    #[arg(long, value_name = "PATH")]
    text_file: Option<String>,

    /// PDF file path or HTTP/HTTPS URL.
    #[arg(long, value_name = "PATH|URL")]
    pdf: Option<String>,

    /// PNG/JPEG image path or HTTP/HTTPS URL.
    #[arg(long, value_name = "PATH|URL")]
    image: Option<String>,

    /// Export file path.
    #[arg(short, long, env = "FLASHGEN_OUTPUT", default_value = EXPORT_FILE_NAME)]
    output: PathBuf,

    /// Model ID (default: gemini-2.5-pro).
    #[arg(long, env = "FLASHGEN_MODEL")]
    model: Option<String>,

    /// Route generation through an edgequake-llm provider (openai, anthropic, ollama, …).
    #[arg(long, env = "FLASHGEN_PROVIDER")]
    provider: Option<String>,

    /// Sampling temperature; the backend default when omitted.
    #[arg(long, env = "FLASHGEN_TEMPERATURE")]
    temperature: Option<f32>,

    /// Generation call timeout in seconds.
    #[arg(long, env = "FLASHGEN_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "FLASHGEN_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Tesseract language code for image OCR.
    #[arg(long, env = "FLASHGEN_OCR_LANG", default_value = "por")]
    ocr_lang: String,

    /// Tesseract executable.
    #[arg(long, env = "FLASHGEN_TESSERACT", default_value = "tesseract")]
    tesseract: String,

    /// Path to a prompt template containing `{text}`.
    #[arg(long, env = "FLASHGEN_PROMPT_TEMPLATE", value_name = "PATH")]
    prompt_template: Option<PathBuf>,

    /// TOML secret store holding GEMINI_API_KEY.
    #[arg(long, env = "FLASHGEN_SECRETS", default_value = DEFAULT_SECRETS_PATH)]
    secrets: PathBuf,

    /// Remove an outer ``` fence from the reply before parsing.
    #[arg(long, env = "FLASHGEN_STRIP_FENCES")]
    strip_fences: bool,

    /// Print the cards as JSON to stdout instead of writing the export file.
    #[arg(long, env = "FLASHGEN_JSON")]
    json: bool,

    /// Do not print the preview table.
    #[arg(long, env = "FLASHGEN_NO_PREVIEW")]
    no_preview: bool,

    /// Disable the spinner.
    #[arg(long, env = "FLASHGEN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FLASHGEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FLASHGEN_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", red("✘"), e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).context("Failed to parse arguments")?;

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner already says what is happening, so INFO logs would only
    // garble it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Credential ───────────────────────────────────────────────────────
    credentials::load_dotenv();
    let credential = credentials::resolve_api_key(&cli.secrets);
    if let Some(ref c) = credential {
        match c.source {
            CredentialSource::SecretStore(ref path) => {
                debug!("API key from secret store {}", path.display())
            }
            CredentialSource::Environment => debug!("API key from {}", credentials::API_KEY_VAR),
        }
    }

    // ── Build pipeline ───────────────────────────────────────────────────
    let spinner = if show_progress {
        Some(SpinnerObserver::new())
    } else {
        None
    };
    let pipeline = setup_pipeline(&cli, credential.map(|c| c.key), spinner.clone()).await?;

    // ── Capture input ────────────────────────────────────────────────────
    let mut request = Request::new();
    if let Some(spec) = select_source(&cli, &matches) {
        debug!("Loading {} input", spec.kind());
        let loaded = spec.load(cli.download_timeout).await;
        match loaded {
            Ok(source) => {
                request.capture(source);
            }
            Err(e) => {
                if let Some(ref s) = spinner {
                    s.clear();
                }
                return Err(e).context("Failed to read input");
            }
        }
    }

    // ── Generate ─────────────────────────────────────────────────────────
    let start = Instant::now();
    let cards = match pipeline.run(&request).await {
        Ok(cards) => cards,
        Err(FlashgenError::EmptyInput) => {
            if let Some(ref s) = spinner {
                s.clear();
            }
            eprintln!(
                "{} {}",
                yellow("⚠"),
                FlashgenError::EmptyInput.to_string().replace('\n', "\n  ")
            );
            return Ok(ExitCode::from(EXIT_NEEDS_INPUT));
        }
        Err(e) => {
            if let Some(ref s) = spinner {
                s.clear();
            }
            return Err(e).context("Flashcard generation failed");
        }
    };

    // ── Output ───────────────────────────────────────────────────────────
    if !cli.quiet && !cli.no_preview && !cli.json {
        eprintln!();
        eprint!("{}", cards.to_table(60));
        eprintln!();
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&cards).context("Failed to serialise cards")?;
        println!("{json}");
    } else {
        write_export(&cli.output, &cards)
            .await
            .context("Failed to save flashcards")?;
        if !cli.quiet {
            eprintln!(
                "{} {} flashcards  {}ms  →  {}",
                green("✔"),
                bold(&cards.len().to_string()),
                start.elapsed().as_millis(),
                bold(&cli.output.display().to_string()),
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Build the pipeline and check its credential, clearing the spinner on failure.
async fn setup_pipeline(
    cli: &Cli,
    api_key: Option<anki_flashgen::ApiKey>,
    spinner: Option<Arc<SpinnerObserver>>,
) -> Result<Pipeline<DocumentExtractor, ProviderGenerator>> {
    let built = async {
        let config = build_config(cli, api_key, spinner.clone()).await?;
        let pipeline =
            Pipeline::from_config(config).context("Failed to set up generation backend")?;
        pipeline.ensure_credential()?;
        Ok::<_, anyhow::Error>(pipeline)
    }
    .await;

    if built.is_err() {
        if let Some(ref s) = spinner {
            s.clear();
        }
    }
    built
}

/// Map CLI args to `FlashgenConfig`.
async fn build_config(
    cli: &Cli,
    api_key: Option<anki_flashgen::ApiKey>,
    spinner: Option<Arc<SpinnerObserver>>,
) -> Result<FlashgenConfig> {
    let mut builder = FlashgenConfig::builder()
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout)
        .ocr_language(&cli.ocr_lang)
        .tesseract_cmd(&cli.tesseract)
        .strip_fences(cli.strip_fences);

    if let Some(ref provider) = cli.provider {
        if !provider.eq_ignore_ascii_case("gemini") && cli.model.is_none() {
            anyhow::bail!("--model is required with --provider {provider}");
        }
        builder = builder.provider_name(provider);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    if let Some(key) = api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref path) = cli.prompt_template {
        let template = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read prompt template from {:?}", path))?;
        builder = builder.prompt_template(template);
    }
    if let Some(s) = spinner {
        builder = builder.observer(s as Arc<dyn PipelineObserver>);
    }

    builder.build().context("Invalid configuration")
}

/// Pick the source given last on the command line.
fn select_source(cli: &Cli, matches: &ArgMatches) -> Option<SourceSpec> {
    let given = [
        ("text", cli.text.clone().map(SourceSpec::Text)),
        ("text_file", cli.text_file.clone().map(SourceSpec::TextFile)),
        ("pdf", cli.pdf.clone().map(SourceSpec::Pdf)),
        ("image", cli.image.clone().map(SourceSpec::Image)),
    ];

    let mut ordered: Vec<(usize, SourceSpec)> = given
        .into_iter()
        .filter_map(|(id, spec)| Some((matches.index_of(id)?, spec?)))
        .collect();
    ordered.sort_by_key(|(index, _)| *index);

    let (_, winner) = ordered.pop()?;
    for (_, ignored) in &ordered {
        warn!("Ignoring {:?}: a later source takes precedence", ignored);
    }
    Some(winner)
}
