use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use thiserror::Error;
use tracing::{info, warn};

use feeltrack_core::domain::comments::CommentRecord;

const CSV_HEADERS: [&str; 5] = ["user", "comment", "time", "likes", "reply_count"];
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const MAX_NAME_ATTEMPTS: u32 = 1000;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("no free file name for {0}")]
    NameExhausted(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(OutputFormat::Csv),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Files produced by one checkpoint. A format that failed to write is absent from `written`.
#[derive(Debug, Default)]
pub struct SavedCheckpoint {
    pub written: Vec<PathBuf>,
    pub failed: Vec<OutputFormat>,
}

/// Writes snapshots of the accumulated comments. Every call creates new files.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    output_dir: PathBuf,
    prefix: String,
    formats: Vec<OutputFormat>,
}

impl CheckpointStore {
    pub fn new(output_dir: impl Into<PathBuf>, prefix: impl Into<String>, formats: Vec<OutputFormat>) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: prefix.into(),
            formats,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn save(&self, records: &[CommentRecord], post_id: &str, suffix: Option<&str>) -> SavedCheckpoint {
        let mut saved = SavedCheckpoint::default();
        if let Err(err) = fs::create_dir_all(&self.output_dir) {
            warn!(dir = %self.output_dir.display(), error = %err, "failed to create output dir");
            saved.failed.extend(self.formats.iter().copied());
            return saved;
        }
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        let stem = file_stem(&self.prefix, post_id, &timestamp, suffix);
        for format in &self.formats {
            match self.write_format(*format, &stem, records) {
                Ok(path) => {
                    info!(path = %path.display(), records = records.len(), "checkpoint saved");
                    saved.written.push(path);
                }
                Err(err) => {
                    warn!(format = format.extension(), error = %err, "checkpoint save failed");
                    saved.failed.push(*format);
                }
            }
        }
        saved
    }

    fn write_format(
        &self,
        format: OutputFormat,
        stem: &str,
        records: &[CommentRecord],
    ) -> Result<PathBuf, CheckpointError> {
        let (path, file) = create_unique(&self.output_dir, stem, format.extension())?;
        match format {
            OutputFormat::Csv => write_csv(file, records)?,
            OutputFormat::Json => write_json(file, records)?,
        }
        Ok(path)
    }
}

fn file_stem(prefix: &str, post_id: &str, timestamp: &str, suffix: Option<&str>) -> String {
    match suffix.filter(|value| !value.is_empty()) {
        Some(suffix) => format!("{prefix}_{post_id}_{timestamp}_{suffix}"),
        None => format!("{prefix}_{post_id}_{timestamp}"),
    }
}

fn create_unique(dir: &Path, stem: &str, extension: &str) -> Result<(PathBuf, File), CheckpointError> {
    for attempt in 1..=MAX_NAME_ATTEMPTS {
        let name = if attempt == 1 {
            format!("{stem}.{extension}")
        } else {
            format!("{stem}_{attempt}.{extension}")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Err(CheckpointError::NameExhausted(format!("{stem}.{extension}")))
}

fn write_csv(file: File, records: &[CommentRecord]) -> Result<(), CheckpointError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(file));
    writer.write_record(CSV_HEADERS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(file: File, records: &[CommentRecord]) -> Result<(), CheckpointError> {
    let mut writer = BufWriter::new(file);
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
    records.serialize(&mut serializer)?;
    writer.flush()?;
    Ok(())
}

pub fn load_json(path: &Path) -> Result<Vec<CommentRecord>, CheckpointError> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

pub fn load_csv(path: &Path) -> Result<Vec<CommentRecord>, CheckpointError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{
        create_unique, file_stem, load_csv, load_json, CheckpointStore, OutputFormat,
    };
    use feeltrack_core::domain::comments::CommentRecord;

    fn records() -> Vec<CommentRecord> {
        vec![
            CommentRecord {
                user: "María José".to_string(),
                comment: "¡Qué alegría! 😂, \"en serio\"".to_string(),
                time: "2024-10-04 00:00:00".to_string(),
                likes: 12,
                reply_count: 3,
            },
            CommentRecord {
                user: "zoë".to_string(),
                comment: "línea\nnueva".to_string(),
                time: "unknown".to_string(),
                likes: 0,
                reply_count: 0,
            },
        ]
    }

    fn store(dir: &std::path::Path) -> CheckpointStore {
        CheckpointStore::new(
            dir,
            "tiktok_comments",
            vec![OutputFormat::Csv, OutputFormat::Json],
        )
    }

    #[test]
    fn file_stem_with_and_without_suffix() {
        assert_eq!(
            file_stem("tiktok_comments", "42", "20250101_120000", None),
            "tiktok_comments_42_20250101_120000"
        );
        assert_eq!(
            file_stem("tiktok_comments", "42", "20250101_120000", Some("partial_100")),
            "tiktok_comments_42_20250101_120000_partial_100"
        );
        assert_eq!(
            file_stem("p", "42", "t", Some("")),
            "p_42_t"
        );
    }

    #[test]
    fn output_format_parse() {
        assert_eq!(OutputFormat::parse(" CSV "), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("parquet"), None);
    }

    #[test]
    fn json_round_trip_preserves_non_ascii() {
        let dir = tempfile::tempdir().unwrap();
        let saved = store(dir.path()).save(&records(), "42", None);
        assert!(saved.failed.is_empty());
        let json_path = saved
            .written
            .iter()
            .find(|path| path.extension().is_some_and(|ext| ext == "json"))
            .unwrap();
        let raw = fs::read_to_string(json_path).unwrap();
        assert!(raw.contains("María José"));
        assert!(raw.contains("😂"));
        assert_eq!(load_json(json_path).unwrap(), records());
    }

    #[test]
    fn csv_round_trip_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let saved = store(dir.path()).save(&records(), "42", Some("partial_2"));
        let csv_path = saved
            .written
            .iter()
            .find(|path| path.extension().is_some_and(|ext| ext == "csv"))
            .unwrap();
        assert!(csv_path.to_string_lossy().ends_with("_partial_2.csv"));
        let raw = fs::read_to_string(csv_path).unwrap();
        assert!(raw.starts_with("user,comment,time,likes,reply_count"));
        assert_eq!(load_csv(csv_path).unwrap(), records());
    }

    #[test]
    fn empty_snapshot_still_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let saved = store(dir.path()).save(&[], "42", None);
        assert_eq!(saved.written.len(), 2);
        for path in &saved.written {
            if path.extension().is_some_and(|ext| ext == "json") {
                assert!(load_json(path).unwrap().is_empty());
            } else {
                assert!(load_csv(path).unwrap().is_empty());
            }
        }
    }

    #[test]
    fn checkpoints_never_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        let all = records();
        let first = store.save(&all[..1], "42", None);
        let second = store.save(&all, "42", None);
        let third = store.save(&all, "42", Some("partial_2"));
        let mut paths: Vec<_> = first
            .written
            .iter()
            .chain(second.written.iter())
            .chain(third.written.iter())
            .cloned()
            .collect();
        paths.sort();
        paths.dedup();
        assert_eq!(paths.len(), 6);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 6);
        let first_json = first
            .written
            .iter()
            .find(|path| path.extension().is_some_and(|ext| ext == "json"))
            .unwrap();
        assert_eq!(load_json(first_json).unwrap().len(), 1);
    }

    #[test]
    fn create_unique_adds_counter() {
        let dir = tempfile::tempdir().unwrap();
        let (first, _) = create_unique(dir.path(), "stem", "csv").unwrap();
        let (second, _) = create_unique(dir.path(), "stem", "csv").unwrap();
        assert!(first.ends_with("stem.csv"));
        assert!(second.ends_with("stem_2.csv"));
    }

    #[test]
    fn output_dir_is_created_on_demand() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("data").join("raw");
        let saved = store(&nested).save(&records(), "7", None);
        assert_eq!(saved.written.len(), 2);
        assert!(nested.is_dir());
    }

    #[test]
    fn unwritable_output_dir_reports_every_format_failed() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let saved = store(&blocker.join("raw")).save(&records(), "7", Some("partial_2"));
        assert!(saved.written.is_empty());
        assert_eq!(saved.failed, vec![OutputFormat::Csv, OutputFormat::Json]);
        assert_eq!(fs::read_to_string(&blocker).unwrap(), "not a directory");
    }
}
