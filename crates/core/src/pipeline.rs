//! Pipeline for converting a directory tree of dialogue files.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use crate::conversation::DialogueConfig;
use crate::error::DialogueError;
use crate::format::{convert, Format};

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Source format. `None` picks it from each file's extension.
    pub from: Option<Format>,
    pub to: Format,
    pub dialogue: DialogueConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            from: None,
            to: Format::Html,
            dialogue: DialogueConfig::default(),
        }
    }
}

/// Result of converting a single file.
#[derive(Debug, Clone)]
pub struct FileResult {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub diagnostics: usize,
}

/// Result of converting every file under a root.
#[derive(Debug, Default, Serialize)]
pub struct PipelineResult {
    pub total_files: usize,
    pub converted_files: usize,
    pub failed_files: usize,
    pub total_diagnostics: usize,
}

/// Discover all dialogue files under `root`, sorted by path.
///
/// With a source format only its extensions count; otherwise any extension a
/// [`Format`] recognises does.
pub fn discover_dialogue_files(root: &Path, from: Option<Format>) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| match (from, Format::from_path(e.path())) {
            (Some(wanted), Some(found)) => wanted == found,
            (None, Some(_)) => true,
            (_, None) => false,
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    paths.sort();
    paths
}

/// Where the converted copy of `source` is written.
pub fn output_path_for(source: &Path, root: &Path, output_dir: &Path, to: Format) -> PathBuf {
    let relative = source.strip_prefix(root).unwrap_or(source);
    output_dir.join(relative).with_extension(to.file_extensions()[0])
}

/// Convert one file and write the result.
pub fn convert_file(
    source: &Path,
    output_path: &Path,
    config: &PipelineConfig,
) -> Result<FileResult, DialogueError> {
    let from = config
        .from
        .or_else(|| Format::from_path(source))
        .ok_or_else(|| DialogueError::UnknownFormat(source.display().to_string()))?;

    let input = fs::read_to_string(source).map_err(|e| DialogueError::io(source, e))?;
    let converted = convert(&input, from, config.to, &config.dialogue)?;

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(|e| DialogueError::io(parent, e))?;
    }
    fs::write(output_path, &converted.output).map_err(|e| DialogueError::io(output_path, e))?;

    Ok(FileResult {
        source_path: source.to_path_buf(),
        output_path: output_path.to_path_buf(),
        diagnostics: converted.diagnostics.len(),
    })
}

/// Convert every dialogue file under `root` in parallel, mirroring the tree
/// into `output_dir`.
///
/// A file that fails to convert is logged and counted; it does not stop the
/// others. Files that would write the same output path (`chat.txt` and
/// `chat.md`, say) are all counted as failed and none of them is written.
pub fn convert_all(
    root: &Path,
    output_dir: &Path,
    config: &PipelineConfig,
) -> Result<PipelineResult, DialogueError> {
    let files = discover_dialogue_files(root, config.from);
    if files.is_empty() {
        return Err(DialogueError::io(
            root,
            io::Error::new(io::ErrorKind::NotFound, "no dialogue files found"),
        ));
    }

    let total_files = files.len();
    let (jobs, colliding) = plan_outputs(files, root, output_dir, config.to);
    for (source, output_path) in &colliding {
        log::error!(
            target: "plato_serializer",
            "Skipping {:?}: another input also converts to {:?}",
            source,
            output_path
        );
    }

    let processed_count = AtomicUsize::new(colliding.len());
    let error_count = AtomicUsize::new(colliding.len());

    let results: Vec<FileResult> = jobs
        .into_par_iter()
        .filter_map(|(source, output_path)| {
            let result = convert_file(&source, &output_path, config);
            let count = processed_count.fetch_add(1, Ordering::Relaxed) + 1;

            match result {
                Ok(file) => {
                    if count % 100 == 0 || count == total_files {
                        log::info!(target: "plato_serializer", "Converted {}/{} files...", count, total_files);
                    }
                    Some(file)
                }
                Err(e) => {
                    error_count.fetch_add(1, Ordering::Relaxed);
                    log::error!(target: "plato_serializer", "Error converting {:?}: {}", source, e);
                    None
                }
            }
        })
        .collect();

    let failed_files = error_count.load(Ordering::Relaxed);
    if failed_files > 0 {
        log::warn!(target: "plato_serializer", "{} files failed to convert", failed_files);
    }

    Ok(PipelineResult {
        total_files,
        converted_files: results.len(),
        failed_files,
        total_diagnostics: results.iter().map(|r| r.diagnostics).sum(),
    })
}

type Job = (PathBuf, PathBuf);

/// Pair each source with its output path, splitting off every source whose
/// output path is shared with another source.
fn plan_outputs(
    files: Vec<PathBuf>,
    root: &Path,
    output_dir: &Path,
    to: Format,
) -> (Vec<Job>, Vec<Job>) {
    let jobs: Vec<Job> = files
        .into_iter()
        .map(|source| {
            let output_path = output_path_for(&source, root, output_dir, to);
            (source, output_path)
        })
        .collect();

    let mut targets: HashMap<&Path, usize> = HashMap::new();
    for (_, output_path) in &jobs {
        *targets.entry(output_path.as_path()).or_default() += 1;
    }
    let shared: Vec<PathBuf> = targets
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(path, _)| path.to_path_buf())
        .collect();

    jobs.into_iter()
        .partition(|(_, output_path)| !shared.contains(output_path))
}
