//! Streaming extraction API: emit records as documents complete.
//!
//! Unlike the eager [`crate::extract::extract_dir`], which writes record
//! files and returns a summary only after every document finishes,
//! [`extract_stream`] writes nothing and yields one [`DocumentReport`] per
//! document as soon as it is done, with the record attached. Documents
//! arrive in completion order; sort by `name` if order matters.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::extract::spawn_document;
use crate::output::DocumentReport;
use crate::pipeline::input::{self, AnySource, GlyphSource};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-document reports.
pub type RecordStream = Pin<Box<dyn Stream<Item = DocumentReport> + Send>>;

/// Extract every supported document in `input_dir`, streaming reports.
///
/// Successful reports carry `record: Some(..)`. Failed and skipped
/// documents are reported in the stream rather than ending it.
///
/// # Errors
/// Only when `input_dir` cannot be listed.
///
/// # Example
/// ```rust,no_run
/// use degree_layout::{extract_stream, ExtractionConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ExtractionConfig::default();
/// let mut reports = extract_stream("brochures/", &config)?;
/// while let Some(report) = reports.next().await {
///     if let Some(record) = report.record {
///         println!("{}: {}", report.name, record.title);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn extract_stream(
    input_dir: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<RecordStream, ExtractError> {
    let input_dir = input_dir.as_ref();
    let paths = input::list_inputs(input_dir)?;
    info!(
        "Starting streaming extraction: {} ({} documents)",
        input_dir.display(),
        paths.len()
    );
    Ok(stream_paths(paths, Arc::new(AnySource::new(config)), config))
}

/// Stream reports for explicit paths through a caller-supplied source.
pub fn extract_stream_with(
    paths: Vec<std::path::PathBuf>,
    source: Arc<dyn GlyphSource>,
    config: &ExtractionConfig,
) -> RecordStream {
    stream_paths(paths, source, config)
}

fn stream_paths(
    paths: Vec<std::path::PathBuf>,
    source: Arc<dyn GlyphSource>,
    config: &ExtractionConfig,
) -> RecordStream {
    let concurrency = config.concurrency.max(1);
    let cfg = config.clone();
    let s = stream::iter(paths.into_iter().map(move |path| {
        spawn_document(path, Arc::clone(&source), cfg.clone(), None)
    }))
    .buffer_unordered(concurrency);
    Box::pin(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::DocumentStatus;

    #[tokio::test]
    async fn streams_one_report_per_document() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.glyphs.json"), r#"{"pages":[]}"#).unwrap();
        std::fs::write(dir.path().join("b.glyphs.json"), "{broken").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let config = ExtractionConfig::default();
        let mut reports: Vec<_> = extract_stream(dir.path(), &config)
            .unwrap()
            .collect()
            .await;
        reports.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].status, DocumentStatus::Skipped);
        assert_eq!(reports[1].status, DocumentStatus::Failed);
        assert!(reports.iter().all(|r| r.record.is_none()));
        // Nothing was written next to the inputs.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
    }

    #[test]
    fn unreadable_dir_is_fatal() {
        let config = ExtractionConfig::default();
        assert!(matches!(
            extract_stream("/nonexistent/brochures", &config),
            Err(ExtractError::InputDirUnreadable { .. })
        ));
    }
}
