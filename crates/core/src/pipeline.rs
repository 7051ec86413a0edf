//! Pipeline for converting transcript files into dataset artifacts.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde_json::Value;
use walkdir::WalkDir;

use crate::anonymize::{Gender, NameAnonymizer};
use crate::config::TemplateConfig;
use crate::error::ConvertError;
use crate::format::{ConvertedEntry, FormatConverter, OutputFormat, OutputLayout};
use crate::record::RawMessage;
use crate::Anonymizer;

/// Extension of input transcripts.
pub const TRANSCRIPT_EXTENSION: &str = "jsonl";

/// Options for converting a batch of transcripts.
#[derive(Debug, Clone, Default)]
pub struct ConversionOptions {
    pub format: OutputFormat,
    /// Prefix assistant messages with their `<think>` reasoning.
    pub include_reasoning: bool,
    pub anonymize_names: bool,
    /// Restrict generated names to one pool.
    pub user_gender: Option<Gender>,
    /// Base seed for name generation. File `i` uses `seed + i`; `None` uses OS entropy.
    pub seed: Option<u64>,
    /// Remove each source file once its output was written.
    pub delete_original_file: bool,
    /// Merge every output into `<name>.<ext>` instead of one file per input.
    pub combine: Option<String>,
}

/// In-memory result of converting one transcript.
#[derive(Debug, Clone)]
pub struct ConvertedTranscript {
    pub artifact: String,
    pub total_entries: usize,
    pub converted_entries: usize,
}

/// Result of converting one file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub total_entries: usize,
    pub converted_entries: usize,
}

#[derive(Debug)]
pub struct FileFailure {
    pub source_path: PathBuf,
    pub error: ConvertError,
}

/// Result of converting a directory.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub total_files: usize,
    pub converted: Vec<FileReport>,
    pub failures: Vec<FileFailure>,
    /// Set when outputs were merged into a single artifact.
    pub combined_path: Option<PathBuf>,
}

impl BatchSummary {
    pub fn total_entries(&self) -> usize {
        self.converted.iter().map(|r| r.total_entries).sum()
    }

    pub fn converted_entries(&self) -> usize {
        self.converted.iter().map(|r| r.converted_entries).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Discover all transcript files directly inside a directory.
pub fn discover_transcript_files(root: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .map_or(false, |ext| ext == TRANSCRIPT_EXTENSION)
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    paths.sort();
    paths
}

/// Decode every non-blank line of a transcript.
///
/// The first line that is not valid JSON fails the whole transcript.
pub fn parse_transcript(text: &str) -> Result<Vec<RawMessage>, ConvertError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let value: Value = serde_json::from_str(line).map_err(|source| {
                ConvertError::InvalidJson {
                    line: index + 1,
                    source,
                }
            })?;
            Ok(RawMessage::from_value(value))
        })
        .collect()
}

/// Convert one parsed transcript without touching the filesystem.
pub fn convert_transcript(
    entries: &[RawMessage],
    converter: &dyn FormatConverter,
    options: &ConversionOptions,
    seed: Option<u64>,
) -> Result<ConvertedTranscript, ConvertError> {
    // Names are collected from the unfiltered transcript so header lines count.
    let mut anonymizer = if options.anonymize_names {
        let mut anonymizer = match seed {
            Some(seed) => NameAnonymizer::with_seed(options.user_gender, seed),
            None => NameAnonymizer::new(options.user_gender),
        };
        anonymizer.initialize(entries);
        Some(anonymizer)
    } else {
        None
    };

    let metadata = converter.extract_metadata(entries);

    let reader = anonymizer.as_ref().map(|a| a as &dyn Anonymizer);
    let converted: Vec<ConvertedEntry> = entries
        .iter()
        .filter(|entry| converter.is_valid_entry(entry))
        .map(|entry| {
            converter.convert_entry(entry, options.include_reasoning, reader, &metadata)
        })
        .collect();

    let artifact = converter.serialize_entries(
        &converted,
        &metadata,
        anonymizer.as_mut().map(|a| a as &mut dyn Anonymizer),
    )?;

    Ok(ConvertedTranscript {
        artifact,
        total_entries: entries.len(),
        converted_entries: converted.len(),
    })
}

/// Read, parse and convert one transcript file.
pub fn convert_source(
    input: &Path,
    converter: &dyn FormatConverter,
    options: &ConversionOptions,
    seed: Option<u64>,
) -> Result<ConvertedTranscript, ConvertError> {
    let text = std::fs::read_to_string(input).map_err(|e| ConvertError::io(input, e))?;
    let entries = parse_transcript(&text)?;
    convert_transcript(&entries, converter, options, seed)
}

/// Convert one file, write its artifact, then delete the source if requested.
pub fn convert_file(
    input: &Path,
    output: &Path,
    converter: &dyn FormatConverter,
    options: &ConversionOptions,
    seed: Option<u64>,
) -> Result<FileReport, ConvertError> {
    let converted = convert_source(input, converter, options, seed)?;
    std::fs::write(output, &converted.artifact).map_err(|e| ConvertError::io(output, e))?;

    tracing::info!(
        "Converted {} to {} in {} format",
        file_name(input),
        file_name(output),
        converter.name()
    );

    if options.delete_original_file {
        std::fs::remove_file(input).map_err(|e| ConvertError::io(input, e))?;
    }

    Ok(FileReport {
        source_path: input.to_path_buf(),
        output_path: output.to_path_buf(),
        total_entries: converted.total_entries,
        converted_entries: converted.converted_entries,
    })
}

/// Merge per-transcript artifacts into one, respecting the format's layout.
///
/// JSON-lines artifacts are concatenated line-wise; JSON-array artifacts are
/// decoded and their elements concatenated into a single array.
pub fn combine_outputs(layout: OutputLayout, parts: &[String]) -> Result<String, ConvertError> {
    match layout {
        OutputLayout::JsonLines => {
            let lines: Vec<&str> = parts
                .iter()
                .map(|part| part.trim_end())
                .filter(|part| !part.is_empty())
                .collect();
            if lines.is_empty() {
                Ok(String::new())
            } else {
                Ok(format!("{}\n", lines.join("\n")))
            }
        }
        OutputLayout::JsonArray => {
            let mut records: Vec<Value> = Vec::new();
            for part in parts.iter().filter(|part| !part.trim().is_empty()) {
                let items: Vec<Value> = serde_json::from_str(part)?;
                records.extend(items);
            }
            Ok(serde_json::to_string_pretty(&records)?)
        }
    }
}

/// Convert every transcript in `input_dir` into `output_dir`.
///
/// Files are converted in parallel, each with its own anonymizer. A file that
/// fails is recorded in the summary and the batch continues.
pub fn convert_directory(
    input_dir: &Path,
    output_dir: &Path,
    options: &ConversionOptions,
    templates: &TemplateConfig,
) -> Result<BatchSummary, ConvertError> {
    let converter = options.format.converter(templates);
    let files = discover_transcript_files(input_dir);

    if files.is_empty() {
        return Err(ConvertError::NoInputFiles(input_dir.to_path_buf()));
    }

    if converter.extension() == TRANSCRIPT_EXTENSION && same_directory(input_dir, output_dir) {
        return Err(ConvertError::OutputOverwritesInput(output_dir.to_path_buf()));
    }

    std::fs::create_dir_all(output_dir).map_err(|e| ConvertError::io(output_dir, e))?;

    let summary = match options.combine.as_deref() {
        None => convert_each(&files, output_dir, converter.as_ref(), options),
        Some(name) => convert_combined(&files, output_dir, name, converter.as_ref(), options)?,
    };

    if !summary.is_success() {
        tracing::warn!("{} transcripts failed to convert", summary.failures.len());
    }
    tracing::info!("Conversion to {} format complete!", converter.name());

    Ok(summary)
}

fn convert_each(
    files: &[PathBuf],
    output_dir: &Path,
    converter: &dyn FormatConverter,
    options: &ConversionOptions,
) -> BatchSummary {
    let progress = Progress::new(files.len());

    let results: Vec<(PathBuf, Result<FileReport, ConvertError>)> = files
        .par_iter()
        .enumerate()
        .map(|(index, path)| {
            let output = output_path(path, output_dir, converter.extension());
            let result = convert_file(path, &output, converter, options, file_seed(options, index));
            progress.tick(path, result.as_ref().err());
            (path.clone(), result)
        })
        .collect();

    let mut summary = BatchSummary {
        total_files: files.len(),
        ..Default::default()
    };
    for (source_path, result) in results {
        match result {
            Ok(report) => summary.converted.push(report),
            Err(error) => summary.failures.push(FileFailure { source_path, error }),
        }
    }
    summary
}

fn convert_combined(
    files: &[PathBuf],
    output_dir: &Path,
    name: &str,
    converter: &dyn FormatConverter,
    options: &ConversionOptions,
) -> Result<BatchSummary, ConvertError> {
    let progress = Progress::new(files.len());

    let results: Vec<(PathBuf, Result<ConvertedTranscript, ConvertError>)> = files
        .par_iter()
        .enumerate()
        .map(|(index, path)| {
            let result = convert_source(path, converter, options, file_seed(options, index));
            progress.tick(path, result.as_ref().err());
            (path.clone(), result)
        })
        .collect();

    let combined_path = output_dir.join(format!("{}.{}", name, converter.extension()));
    let mut summary = BatchSummary {
        total_files: files.len(),
        combined_path: Some(combined_path.clone()),
        ..Default::default()
    };

    let mut parts = Vec::new();
    for (source_path, result) in results {
        match result {
            Ok(converted) => {
                summary.converted.push(FileReport {
                    source_path,
                    output_path: combined_path.clone(),
                    total_entries: converted.total_entries,
                    converted_entries: converted.converted_entries,
                });
                parts.push(converted.artifact);
            }
            Err(error) => summary.failures.push(FileFailure { source_path, error }),
        }
    }

    let combined = combine_outputs(converter.layout(), &parts)?;
    std::fs::write(&combined_path, combined).map_err(|e| ConvertError::io(&combined_path, e))?;
    tracing::info!(
        "Combined {} transcripts into {}",
        summary.converted.len(),
        file_name(&combined_path)
    );

    if options.delete_original_file {
        let mut kept = Vec::with_capacity(summary.converted.len());
        for report in summary.converted.drain(..) {
            match std::fs::remove_file(&report.source_path) {
                Ok(()) => kept.push(report),
                Err(e) => summary.failures.push(FileFailure {
                    error: ConvertError::io(&report.source_path, e),
                    source_path: report.source_path,
                }),
            }
        }
        summary.converted = kept;
    }

    Ok(summary)
}

/// Progress reporting shared across worker threads.
struct Progress {
    total: usize,
    processed: AtomicUsize,
}

impl Progress {
    fn new(total: usize) -> Self {
        Self {
            total,
            processed: AtomicUsize::new(0),
        }
    }

    fn tick(&self, path: &Path, error: Option<&ConvertError>) {
        let count = self.processed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(e) = error {
            tracing::warn!("Error converting {:?}: {}", path, e);
        }
        if count % 100 == 0 || count == self.total {
            tracing::info!("Processed {}/{} transcripts...", count, self.total);
        }
    }
}

/// True when both paths exist and resolve to the same directory.
fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn file_seed(options: &ConversionOptions, index: usize) -> Option<u64> {
    options.seed.map(|seed| seed.wrapping_add(index as u64))
}

fn output_path(input: &Path, output_dir: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output_dir.join(format!("{}.{}", stem, extension))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
