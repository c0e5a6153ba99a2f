//! CLI binary for degree-layout.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use degree_layout::{
    extract_dir, inspect, render_subjects, AnySource, DocumentStatus, ExtractionConfig,
    ExtractionProgressCallback, LayoutProfile, ProgressCallback, RecordCatalog,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the batch plus a log line per
/// document. Documents finish out of order, so start times are keyed by name.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<String, Instant>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_batch_start` reports the document count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Listing documents…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} documents  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
    }

    fn elapsed_secs(&self, name: &str) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(name))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.activate_bar(total_documents);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting {total_documents} documents…"))
        ));
    }

    fn on_document_start(&self, name: &str) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(name.to_string(), Instant::now());
        }
        self.bar.set_message(name.to_string());
    }

    fn on_document_complete(&self, name: &str, subjects: usize, issues: usize) {
        let elapsed = self.elapsed_secs(name);
        let mark = if issues == 0 { green("✓") } else { yellow("✓") };
        let issues = if issues == 0 {
            String::new()
        } else {
            yellow(&format!("{issues} issues"))
        };
        self.bar.println(format!(
            "  {} {:<40}  {:<14}  {}  {}",
            mark,
            name,
            dim(&format!("{subjects:>3} subjects")),
            dim(&format!("{elapsed:.2}s")),
            issues,
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, name: &str, error: &str) {
        let elapsed = self.elapsed_secs(name);
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:<40}  {}  {}",
            red("✗"),
            name,
            red(&msg),
            dim(&format!("{elapsed:.2}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, extracted: usize) {
        let not_extracted = total_documents.saturating_sub(extracted);
        self.bar.finish_and_clear();

        if not_extracted == 0 {
            eprintln!(
                "{} {} documents extracted",
                green("✔"),
                bold(&extracted.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} documents extracted  ({} errors)",
                if extracted == 0 { red("✘") } else { cyan("⚠") },
                bold(&extracted.to_string()),
                total_documents,
                red(&self.errors.load(Ordering::SeqCst).to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract every brochure in a directory
  degree2json extract brochures/ -o records/

  # Keep records that already exist, print the batch summary as JSON
  degree2json extract brochures/ -o records/ --no-overwrite --json

  # A document family with a different layout
  degree2json extract brochures/ -o records/ --profile master.json

  # See the lines the extractor works from
  degree2json inspect brochures/turismo.pdf

  # List the subjects of every matching degree
  degree2json subjects records/ enfermeria

INPUTS:
  *.pdf           read through pdfium
  *.glyphs.json   pre-extracted glyph dump, no pdfium needed

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH          Path to libpdfium (file or directory)
  DEGREE2JSON_CONCURRENCY  Documents extracted in parallel
  DEGREE2JSON_PROFILE      Layout profile JSON file
  RUST_LOG                 Overrides the log filter
"#;

/// Extract structured degree records from degree brochure PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "degree2json",
    version,
    about = "Extract structured degree records from degree brochure PDFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DEGREE2JSON_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "DEGREE2JSON_QUIET")]
    quiet: bool,

    /// Layout profile JSON (thresholds, tokens, page roles).
    #[arg(long, global = true, env = "DEGREE2JSON_PROFILE")]
    profile: Option<PathBuf>,

    /// PDF user password for encrypted documents.
    #[arg(long, global = true, env = "DEGREE2JSON_PASSWORD")]
    password: Option<String>,

    /// Path to libpdfium (a file, or a directory holding it).
    #[arg(long, global = true, env = "DEGREE2JSON_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract one record per document in a directory.
    Extract {
        /// Directory of *.pdf / *.glyphs.json documents.
        input_dir: PathBuf,

        /// Directory to write records into (created if missing).
        #[arg(short, long, env = "DEGREE2JSON_OUTPUT")]
        output: PathBuf,

        /// Documents extracted in parallel.
        #[arg(short, long, env = "DEGREE2JSON_CONCURRENCY", default_value_t = 4)]
        concurrency: usize,

        /// Leave existing record files untouched.
        #[arg(long, env = "DEGREE2JSON_NO_OVERWRITE")]
        no_overwrite: bool,

        /// Print the batch summary as JSON on stdout.
        #[arg(long, env = "DEGREE2JSON_JSON")]
        json: bool,

        /// Disable progress bar.
        #[arg(long, env = "DEGREE2JSON_NO_PROGRESS")]
        no_progress: bool,
    },

    /// Print the reconstructed lines of one document.
    Inspect {
        file: PathBuf,

        /// Output structured JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// List the subjects of degrees whose title matches a query.
    Subjects {
        /// Directory of extracted records.
        records_dir: PathBuf,

        /// Words that must all appear in the degree title.
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Output structured JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level per-document logs.
    let show_progress = match &cli.command {
        Command::Extract {
            json, no_progress, ..
        } => !cli.quiet && !no_progress && !json,
        _ => false,
    };
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

    let profile = match cli.profile {
        Some(ref path) => LayoutProfile::from_file(path)
            .with_context(|| format!("Failed to load layout profile from {:?}", path))?,
        None => LayoutProfile::default(),
    };

    match cli.command {
        Command::Extract {
            ref input_dir,
            ref output,
            concurrency,
            no_overwrite,
            json,
            ..
        } => {
            let progress_cb: Option<ProgressCallback> = if show_progress {
                let cb = CliProgressCallback::new_dynamic();
                Some(cb as Arc<dyn ExtractionProgressCallback>)
            } else {
                None
            };

            let mut builder = ExtractionConfig::builder()
                .profile(profile)
                .concurrency(concurrency)
                .overwrite(!no_overwrite);
            if let Some(ref pwd) = cli.password {
                builder = builder.password(pwd.clone());
            }
            if let Some(ref lib) = cli.pdfium_lib {
                builder = builder.pdfium_lib_path(lib.clone());
            }
            if let Some(cb) = progress_cb {
                builder = builder.progress_callback(cb);
            }
            let config = builder.build().context("Invalid configuration")?;

            let summary = extract_dir(input_dir, output, &config)
                .await
                .context("Extraction failed")?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
                );
            } else if !cli.quiet {
                if !show_progress {
                    for doc in &summary.documents {
                        match doc.status {
                            DocumentStatus::Extracted => {}
                            DocumentStatus::Unchanged => {
                                eprintln!("  {} {}", dim("="), doc.name)
                            }
                            DocumentStatus::Skipped | DocumentStatus::Failed => eprintln!(
                                "  {} {}  {}",
                                red("✗"),
                                doc.name,
                                doc.error.as_deref().unwrap_or_default()
                            ),
                        }
                    }
                }
                eprintln!(
                    "{}  {}/{} extracted  {} unchanged  {} skipped  {} failed  {}ms  →  {}",
                    if summary.failed == 0 && summary.skipped == 0 {
                        green("✔")
                    } else {
                        cyan("⚠")
                    },
                    summary.extracted,
                    summary.total_documents,
                    summary.unchanged,
                    summary.skipped,
                    summary.failed,
                    summary.total_duration_ms,
                    bold(&output.display().to_string()),
                );
                if summary.total_issues > 0 {
                    eprintln!(
                        "   {} issues  ({} orphan plan lines, {} dropped fragments)",
                        yellow(&summary.total_issues.to_string()),
                        dim(&summary.orphan_plan_lines.to_string()),
                        dim(&summary.dropped_fragments.to_string()),
                    );
                }
            }
        }

        Command::Inspect { ref file, json } => {
            let mut config = ExtractionConfig::default();
            config.password = cli.password.clone();
            config.pdfium_lib_path = cli.pdfium_lib.clone();
            let source = AnySource::new(&config);
            let insp = tokio::task::block_in_place(|| inspect(file, &source, &profile))
                .with_context(|| format!("Failed to inspect {:?}", file))?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&insp).context("Failed to serialise inspection")?
                );
            } else {
                println!("File:   {}", insp.name);
                println!("Pages:  {}", insp.pages.len());
                for page in &insp.pages {
                    println!();
                    println!("{}", bold(&format!("── Page {} ──", page.page)));
                    if let Some(ref e) = page.error {
                        println!("  {}", red(&e.to_string()));
                    }
                    for line in &page.lines {
                        println!(
                            "  {}  {}",
                            dim(&format!("{:>6.1}pt", line.avg_font_size)),
                            line.text
                        );
                    }
                }
                if let Some(ref text) = insp.sections_text {
                    println!();
                    println!("{}", bold("── Sections page, column order ──"));
                    println!("{text}");
                }
            }
        }

        Command::Subjects {
            ref records_dir,
            ref query,
            json,
        } => {
            let catalog = RecordCatalog::load_dir(records_dir)
                .with_context(|| format!("Failed to load records from {:?}", records_dir))?;
            let matches = catalog.subjects(&query.join(" "));

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&matches).context("Failed to serialise subjects")?
                );
            } else if matches.is_empty() {
                if !cli.quiet {
                    eprintln!("No degree matches {:?}", query.join(" "));
                }
            } else {
                print!("{}", render_subjects(&matches));
            }
        }
    }

    Ok(())
}
