//! Report persistence.

use std::path::{Path, PathBuf};

use tracing::{info, warn};
use zonecount_engine::{write_csv, write_json};
use zonecount_models::{JobOutputs, TrackingReport};

use crate::error::{WorkerError, WorkerResult};

/// Writes finished reports into the data directory.
#[derive(Debug, Clone)]
pub struct ReportStore {
    data_dir: PathBuf,
}

impl ReportStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// `<name>_tracking.json` and `<name>_tracking.csv` for an output name.
    pub fn paths_for(&self, name: &str) -> (PathBuf, PathBuf) {
        let stem = sanitize_name(name);
        (
            self.data_dir.join(format!("{}_tracking.json", stem)),
            self.data_dir.join(format!("{}_tracking.csv", stem)),
        )
    }

    /// Write both files, creating the data directory when missing.
    ///
    /// Each file is written to a staging path first and renamed into place
    /// only once both are complete. On any failure neither file is left
    /// behind.
    pub fn save(&self, name: &str, report: &TrackingReport) -> WorkerResult<JobOutputs> {
        std::fs::create_dir_all(&self.data_dir)?;
        let (json, csv) = self.paths_for(name);
        let json_staged = staging_path(&json);
        let csv_staged = staging_path(&csv);

        if let Err(e) = publish(report, &json_staged, &json, &csv_staged, &csv) {
            for path in [&json_staged, &csv_staged] {
                let _ = std::fs::remove_file(path);
            }
            warn!(json = %json.display(), error = %e, "Discarded partial report");
            return Err(e);
        }

        info!(
            json = %json.display(),
            csv = %csv.display(),
            persons = report.summary.total_persons_detected,
            "Saved tracking report"
        );

        Ok(JobOutputs {
            json,
            csv,
            total_persons: report.summary.total_persons_detected,
            total_frames: report.video_info.total_frames,
        })
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut staged = path.as_os_str().to_owned();
    staged.push(".partial");
    PathBuf::from(staged)
}

/// Write both staged files, then move the CSV and the JSON into place.
fn publish(
    report: &TrackingReport,
    json_staged: &Path,
    json: &Path,
    csv_staged: &Path,
    csv: &Path,
) -> WorkerResult<()> {
    write_json(report, json_staged)?;
    write_csv(report, csv_staged)?;
    std::fs::rename(csv_staged, csv)?;
    std::fs::rename(json_staged, json).map_err(|e| {
        let _ = std::fs::remove_file(csv);
        WorkerError::from(e)
    })
}

/// Keep an output name to a single safe path component.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        "video".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonecount_models::{ReportSummary, VideoInfo};

    fn report() -> TrackingReport {
        TrackingReport {
            video_info: VideoInfo {
                total_frames: 30,
                fps: 30.0,
                duration: "00:01".into(),
            },
            zones: Default::default(),
            persons: vec![],
            summary: ReportSummary {
                total_persons_detected: 0,
                total_persons_seen: 0,
                zone_stats: Default::default(),
                line_stats: Default::default(),
            },
        }
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("store-cam 1"), "store-cam_1");
        assert_eq!(sanitize_name("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_name("..."), "video");
    }

    #[test]
    fn test_save_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path().join("reports"));
        let outputs = store.save("lobby", &report()).unwrap();

        assert!(outputs.json.exists());
        assert!(outputs.csv.exists());
        let leftovers = std::fs::read_dir(store.data_dir())
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == "partial")
            })
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_failed_csv_leaves_no_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        let (json, csv) = store.paths_for("lobby");
        // A directory in the CSV's place makes the final rename fail
        std::fs::create_dir(&csv).unwrap();

        assert!(store.save("lobby", &report()).is_err());
        assert!(!json.exists());
        assert!(!staging_path(&json).exists());
        assert!(!staging_path(&csv).exists());
    }

    #[test]
    fn test_paths_for() {
        let store = ReportStore::new("/srv/data");
        let (json, csv) = store.paths_for("lobby");
        assert_eq!(json, PathBuf::from("/srv/data/lobby_tracking.json"));
        assert_eq!(csv, PathBuf::from("/srv/data/lobby_tracking.csv"));
    }
}
