//! subfetch - Find and download matching subtitles for local video files
//!
//! This library scans a directory for media files, resolves each file against
//! an external subtitle catalog, picks the best-matching subtitle candidate
//! and extracts it next to the source file. Every file is processed by its
//! own concurrent task with isolated failure handling and aggregate progress
//! reporting.

mod catalog;
mod config;
mod cross_reference;
mod fetcher;
mod filename_parser;
mod matcher;
mod media_scanner;
mod movie_query;
mod resolver;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

// Re-export error types
pub use catalog::CatalogError;
pub use config::ConfigError;
pub use cross_reference::CrossReferenceError;
pub use fetcher::FetchError;
pub use media_scanner::ScanError;
pub use resolver::ResolveError;

// Re-export the pieces needed to assemble a pipeline by hand
pub use catalog::{
    FilmIdentifier, SearchRequest, SearchResponse, SearchResult, SubdlCatalog, SubtitleCandidate,
    SubtitleCatalog,
};
pub use config::{Config, list as list_config, remove as remove_config, validate_language};
pub use cross_reference::{CrossReference, OmdbProvider};
pub use fetcher::SubtitleFetcher;
pub use filename_parser::{ParsedFilename, parse as parse_filename};
pub use matcher::select_subtitle;
pub use media_scanner::scan_for_media;
pub use movie_query::{MovieQuery, SeriesInfo, build_queries};
pub use resolver::Resolver;

/// How often the reporting loop samples the aggregate counters.
const REPORT_INTERVAL: Duration = Duration::from_millis(100);

/// Progress event emitted while a run is underway
///
/// These events allow library users to track progress and provide feedback;
/// the bundled CLI renders them as a single updating status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// All tasks have been launched
    Started { total: usize },

    /// Periodic snapshot of the aggregate counters
    Progress {
        success: usize,
        failed: usize,
        total: usize,
    },

    /// Every task has reached a terminal state
    Finished {
        success: usize,
        failed: usize,
        total: usize,
    },
}

/// Final tally of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub success: usize,
    pub failed: usize,
    pub total: usize,
}

/// Shared success/failure counters, incremented exactly once per task on its
/// terminal branch. Tasks only ever add, so there is no read-modify-write
/// hazard and no lock.
#[derive(Debug)]
pub struct AggregateProgress {
    success: AtomicUsize,
    failed: AtomicUsize,
    total: usize,
}

impl AggregateProgress {
    fn new(total: usize) -> Self {
        Self {
            success: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            total,
        }
    }

    fn record_success(&self) {
        self.success.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> (usize, usize) {
        (
            self.success.load(Ordering::Relaxed),
            self.failed.load(Ordering::Relaxed),
        )
    }

    fn is_complete(&self) -> bool {
        let (success, failed) = self.snapshot();
        success + failed >= self.total
    }
}

/// Failure of a single file's pipeline. Caught at the task boundary and
/// folded into the failure counter; never crosses into other tasks.
#[derive(Debug, Error)]
pub enum SubtitleError {
    /// Resolution failed
    #[error("Resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// No candidate satisfied the matcher policy
    #[error("No subtitle candidate matched")]
    NoMatch,

    /// Download or extraction failed
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
}

/// Top-level error type for subfetch operations
#[derive(Debug, Error)]
pub enum SubfetchError {
    /// Error while loading configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error while scanning the directory
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// The directory contains no media files
    #[error("No media files found in {}", .0.display())]
    NoMediaFiles(PathBuf),

    /// None of the media filenames could be parsed
    #[error("None of the media filenames could be parsed")]
    NoParsableFiles,

    /// The run was aborted by an interrupt signal
    #[error("Interrupted")]
    Interrupted,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// The per-file pipeline: resolve, then match, then fetch.
pub struct SubtitlePipeline {
    resolver: Resolver,
    fetcher: SubtitleFetcher,
}

impl SubtitlePipeline {
    /// Assembles a pipeline from explicit provider instances.
    pub fn new(
        catalog: Arc<dyn SubtitleCatalog>,
        cross_reference: Arc<dyn CrossReference>,
        fetcher: SubtitleFetcher,
    ) -> Self {
        Self {
            resolver: Resolver::new(catalog, cross_reference),
            fetcher,
        }
    }

    /// Assembles the production pipeline from stored configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(SubdlCatalog::new(&config.sdl_api_key)),
            Arc::new(OmdbProvider::new(&config.omdb_api_key)),
            SubtitleFetcher::new(),
        )
    }

    /// Runs the pipeline for one query and returns the written subtitle path.
    pub async fn run(
        &self,
        query: &MovieQuery,
        directory: &Path,
    ) -> Result<PathBuf, SubtitleError> {
        let candidates = self.resolver.resolve(query).await?;
        let url = matcher::select_subtitle(query, &candidates).ok_or(SubtitleError::NoMatch)?;
        let written = self.fetcher.fetch(query, &url, directory).await?;
        Ok(written)
    }
}

/// Runs the full pipeline for every query concurrently.
///
/// One task per query is launched eagerly with no concurrency cap; each task
/// increments exactly one of the aggregate counters when it reaches a
/// terminal state. A reporting loop polls the counters at a fixed interval
/// and emits [`ProgressEvent`]s through the callback until all tasks are
/// accounted for. An interrupt signal aborts the whole run immediately,
/// without waiting for in-flight tasks or cleaning up partial files.
pub async fn run_queries<F>(
    queries: Vec<MovieQuery>,
    pipeline: SubtitlePipeline,
    directory: &Path,
    mut progress_callback: F,
) -> Result<RunSummary, SubfetchError>
where
    F: FnMut(ProgressEvent),
{
    let total = queries.len();
    let progress = Arc::new(AggregateProgress::new(total));
    let pipeline = Arc::new(pipeline);

    // TODO: cap the fan-out if directories ever get large enough to exhaust
    // sockets; today the task count equals the number of media files.
    let mut handles = Vec::with_capacity(total);
    for query in queries {
        let pipeline = Arc::clone(&pipeline);
        let progress = Arc::clone(&progress);
        let directory = directory.to_path_buf();

        handles.push(tokio::spawn(async move {
            match pipeline.run(&query, &directory).await {
                Ok(written) => {
                    debug!(file = %query.filename, subtitle = %written.display(), "subtitle downloaded");
                    progress.record_success();
                }
                Err(e) => {
                    warn!(file = %query.filename, error = %e, "cannot get subtitle");
                    progress.record_failure();
                }
            }
        }));
    }

    progress_callback(ProgressEvent::Started { total });

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut ticker = tokio::time::interval(REPORT_INTERVAL);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let (success, failed) = progress.snapshot();
                progress_callback(ProgressEvent::Progress { success, failed, total });
                if progress.is_complete() {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                return Err(SubfetchError::Interrupted);
            }
        }
    }

    // Every counter has been bumped, so the handles resolve immediately; this
    // only makes task termination observable before returning.
    for result in futures::future::join_all(handles).await {
        if let Err(e) = result {
            warn!(error = %e, "subtitle task aborted");
        }
    }

    let (success, failed) = progress.snapshot();
    progress_callback(ProgressEvent::Finished {
        success,
        failed,
        total,
    });

    Ok(RunSummary {
        success,
        failed,
        total,
    })
}

/// Scans a directory for media files and downloads a subtitle for each one.
///
/// This is the top-level entry point used by the CLI: it enumerates media
/// files, parses their names into queries (skipping unparsable ones with a
/// warning), assembles the production pipeline from the configuration and
/// processes every query concurrently.
///
/// # Arguments
///
/// * `directory` - The directory containing the media files
/// * `config` - Stored credentials and the preferred subtitle language
/// * `progress_callback` - Closure called with progress events (can be empty
///   for silent operation)
///
/// # Returns
///
/// A [`RunSummary`] with the final success/failure tally
pub async fn fetch_subtitles<F>(
    directory: &Path,
    config: &Config,
    progress_callback: F,
) -> Result<RunSummary, SubfetchError>
where
    F: FnMut(ProgressEvent),
{
    let filenames = media_scanner::scan_for_media(directory)?;
    if filenames.is_empty() {
        return Err(SubfetchError::NoMediaFiles(directory.to_path_buf()));
    }

    let queries = movie_query::build_queries(&filenames, &config.preferred_lang);
    if queries.is_empty() {
        return Err(SubfetchError::NoParsableFiles);
    }

    let pipeline = SubtitlePipeline::from_config(config);
    run_queries(queries, pipeline, directory, progress_callback).await
}
