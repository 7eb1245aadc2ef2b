//! Detection sources.
//!
//! The detector and tracker run outside this crate. A [`DetectionSource`]
//! hands the engine the video geometry and then one frame of detections at a
//! time, numbered from 1.
//!
//! # Detection log format
//! [`JsonlDetectionSource`] replays a JSON-lines log. The first line is the
//! header, every following non-empty line is one frame:
//! ```text
//! {"width": 1920, "height": 1080, "fps": 30.0, "total_frames": 900}
//! {"frame": 1, "detections": [{"track_id": 4, "bbox": {"x1": 10, "y1": 20, "x2": 50, "y2": 140}, "confidence": 0.91}]}
//! {"frame": 2, "detections": []}
//! {"frame": 3, "error": "CUDA out of memory"}
//! ```
//! A frame carrying `error` is reported as a detector failure. Frame numbers
//! must increase, stay within a declared `total_frames`, and never jump more
//! than [`MAX_FRAME_GAP`] frames when no total is declared.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use zonecount_models::Detection;

use crate::error::{EngineError, EngineResult};

/// Largest forward jump between two logged frames (one day at 30 fps).
pub const MAX_FRAME_GAP: u64 = 30 * 60 * 60 * 24;

/// Video geometry reported by a source before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub width: f64,
    pub height: f64,
    /// May be 0 when the container does not report a rate
    #[serde(default)]
    pub fps: f64,
    /// May be 0 when unknown
    #[serde(default)]
    pub total_frames: u64,
}

impl SourceInfo {
    pub fn new(width: f64, height: f64, fps: f64, total_frames: u64) -> Self {
        Self {
            width,
            height,
            fps,
            total_frames,
        }
    }
}

/// Detections for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameDetections {
    /// 1-based frame index
    pub frame: u64,
    pub detections: Vec<Detection>,
}

/// Per-frame output of the external detector and tracker.
pub trait DetectionSource {
    fn info(&self) -> SourceInfo;

    /// Next frame, `Ok(None)` at end of stream.
    ///
    /// A detector error aborts the run; sources never retry.
    fn next_frame(&mut self) -> EngineResult<Option<FrameDetections>>;
}

/// In-memory source, mostly for tests and embedding.
#[derive(Debug, Clone)]
pub struct VecDetectionSource {
    info: SourceInfo,
    frames: VecDeque<Vec<Detection>>,
    next_index: u64,
    failure: Option<(u64, String)>,
}

impl VecDetectionSource {
    /// Frames are numbered 1, 2, ... in the order given.
    pub fn new(info: SourceInfo, frames: Vec<Vec<Detection>>) -> Self {
        Self {
            info,
            frames: frames.into(),
            next_index: 1,
            failure: None,
        }
    }

    /// Fail with a detector error when `frame` is requested.
    pub fn fail_at(mut self, frame: u64, message: impl Into<String>) -> Self {
        self.failure = Some((frame, message.into()));
        self
    }
}

impl DetectionSource for VecDetectionSource {
    fn info(&self) -> SourceInfo {
        self.info
    }

    fn next_frame(&mut self) -> EngineResult<Option<FrameDetections>> {
        let frame = self.next_index;
        if let Some((fail_frame, message)) = &self.failure {
            if *fail_frame == frame {
                return Err(EngineError::detector_failed(frame, message.clone()));
            }
        }

        let Some(detections) = self.frames.pop_front() else {
            return Ok(None);
        };
        self.next_index += 1;
        Ok(Some(FrameDetections { frame, detections }))
    }
}

#[derive(Debug, Deserialize)]
struct LogFrame {
    #[serde(default)]
    frame: Option<u64>,
    #[serde(default)]
    detections: Vec<Detection>,
    #[serde(default)]
    error: Option<String>,
}

/// Replays a pre-computed JSON-lines detection log.
pub struct JsonlDetectionSource {
    path: PathBuf,
    info: SourceInfo,
    lines: Lines<BufReader<File>>,
    line_no: usize,
    last_frame: u64,
}

impl JsonlDetectionSource {
    /// Open a log and read its header line.
    pub fn open(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(EngineError::FileNotFound(path));
        }

        let mut lines = BufReader::new(File::open(&path)?).lines();
        let mut line_no = 0;
        let info = loop {
            line_no += 1;
            match lines.next() {
                Some(line) => {
                    let line = line?;
                    if line.trim().is_empty() {
                        continue;
                    }
                    break serde_json::from_str::<SourceInfo>(&line)
                        .map_err(|e| EngineError::malformed(line_no, format!("bad header: {}", e)))?;
                }
                None => return Err(EngineError::malformed(line_no, "missing header line")),
            }
        };

        debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            fps = info.fps,
            total_frames = info.total_frames,
            "Opened detection log"
        );

        Ok(Self {
            path,
            info,
            lines,
            line_no,
            last_frame: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_frame(&self, frame: u64) -> EngineResult<()> {
        if frame <= self.last_frame {
            return Err(EngineError::malformed(
                self.line_no,
                format!("frame {} does not follow frame {}", frame, self.last_frame),
            ));
        }
        if self.info.total_frames > 0 && frame > self.info.total_frames {
            return Err(EngineError::malformed(
                self.line_no,
                format!(
                    "frame {} is past the declared total of {}",
                    frame, self.info.total_frames
                ),
            ));
        }
        if frame - self.last_frame > MAX_FRAME_GAP {
            return Err(EngineError::malformed(
                self.line_no,
                format!("frame {} jumps too far past frame {}", frame, self.last_frame),
            ));
        }
        Ok(())
    }
}

impl DetectionSource for JsonlDetectionSource {
    fn info(&self) -> SourceInfo {
        self.info
    }

    fn next_frame(&mut self) -> EngineResult<Option<FrameDetections>> {
        loop {
            let Some(line) = self.lines.next() else {
                return Ok(None);
            };
            self.line_no += 1;
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let entry: LogFrame = serde_json::from_str(&line)
                .map_err(|e| EngineError::malformed(self.line_no, e.to_string()))?;
            let frame = match entry.frame {
                Some(frame) => frame,
                None => self.last_frame.checked_add(1).ok_or_else(|| {
                    EngineError::malformed(self.line_no, "frame index overflows")
                })?,
            };
            self.check_frame(frame)?;
            self.last_frame = frame;

            if let Some(message) = entry.error {
                return Err(EngineError::detector_failed(frame, message));
            }

            return Ok(Some(FrameDetections {
                frame,
                detections: entry.detections,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zonecount_models::Point;

    fn write_log(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_vec_source_numbers_frames_from_one() {
        let info = SourceInfo::new(640.0, 480.0, 30.0, 2);
        let det = Detection::centered(1, Point::new(10.0, 10.0), 4.0, 4.0);
        let mut source = VecDetectionSource::new(info, vec![vec![det], vec![]]);

        assert_eq!(source.next_frame().unwrap().unwrap().frame, 1);
        assert_eq!(source.next_frame().unwrap().unwrap().frame, 2);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_vec_source_failure() {
        let info = SourceInfo::new(640.0, 480.0, 30.0, 3);
        let mut source = VecDetectionSource::new(info, vec![vec![], vec![], vec![]]).fail_at(2, "boom");

        assert!(source.next_frame().unwrap().is_some());
        let err = source.next_frame().unwrap_err();
        assert!(matches!(err, EngineError::DetectorFailure { frame: 2, .. }));
    }

    #[test]
    fn test_jsonl_source_reads_frames() {
        let log = write_log(concat!(
            "{\"width\": 1280, \"height\": 720, \"fps\": 25.0, \"total_frames\": 2}\n",
            "{\"frame\": 1, \"detections\": [{\"track_id\": 4, \"bbox\": {\"x1\": 10, \"y1\": 20, \"x2\": 50, \"y2\": 140}, \"confidence\": 0.9}]}\n",
            "\n",
            "{\"detections\": []}\n",
        ));
        let mut source = JsonlDetectionSource::open(log.path()).unwrap();
        assert_eq!(source.info().fps, 25.0);

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.frame, 1);
        assert_eq!(first.detections[0].track_id, 4);
        assert_eq!(first.detections[0].centroid(), Point::new(30.0, 80.0));

        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(second.frame, 2);
        assert!(second.detections.is_empty());
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_jsonl_error_frame_is_detector_failure() {
        let log = write_log(concat!(
            "{\"width\": 640, \"height\": 480, \"fps\": 30.0}\n",
            "{\"frame\": 1, \"error\": \"model crashed\"}\n",
        ));
        let mut source = JsonlDetectionSource::open(log.path()).unwrap();
        let err = source.next_frame().unwrap_err();
        assert!(matches!(err, EngineError::DetectorFailure { frame: 1, .. }));
    }

    #[test]
    fn test_jsonl_rejects_out_of_order_frames() {
        let log = write_log(concat!(
            "{\"width\": 640, \"height\": 480, \"fps\": 30.0}\n",
            "{\"frame\": 5, \"detections\": []}\n",
            "{\"frame\": 4, \"detections\": []}\n",
        ));
        let mut source = JsonlDetectionSource::open(log.path()).unwrap();
        source.next_frame().unwrap();
        let err = source.next_frame().unwrap_err();
        assert!(matches!(err, EngineError::MalformedDetections { line: 3, .. }));
    }

    #[test]
    fn test_jsonl_frame_overflow_is_malformed() {
        let log = write_log(concat!(
            "{\"width\": 640, \"height\": 480, \"fps\": 30.0}\n",
            "{\"frame\": 18446744073709551615}\n",
            "{\"detections\": []}\n",
        ));
        let mut source = JsonlDetectionSource::open(log.path()).unwrap();
        let err = source.next_frame().unwrap_err();
        assert!(matches!(err, EngineError::MalformedDetections { line: 2, .. }));
    }

    #[test]
    fn test_jsonl_implicit_frame_overflow_is_malformed() {
        let log = write_log(concat!(
            "{\"width\": 640, \"height\": 480, \"fps\": 30.0}\n",
            "{\"detections\": []}\n",
            "{\"detections\": []}\n",
        ));
        let mut source = JsonlDetectionSource::open(log.path()).unwrap();
        source.last_frame = u64::MAX;
        let err = source.next_frame().unwrap_err();
        assert!(matches!(err, EngineError::MalformedDetections { line: 2, .. }));
    }

    #[test]
    fn test_jsonl_rejects_frame_past_declared_total() {
        let log = write_log(concat!(
            "{\"width\": 640, \"height\": 480, \"fps\": 30.0, \"total_frames\": 100}\n",
            "{\"frame\": 100, \"detections\": []}\n",
            "{\"frame\": 101, \"detections\": []}\n",
        ));
        let mut source = JsonlDetectionSource::open(log.path()).unwrap();
        assert_eq!(source.next_frame().unwrap().unwrap().frame, 100);
        let err = source.next_frame().unwrap_err();
        assert!(matches!(err, EngineError::MalformedDetections { line: 3, .. }));
    }

    #[test]
    fn test_jsonl_rejects_huge_gap_without_total() {
        let log = write_log(concat!(
            "{\"width\": 640, \"height\": 480, \"fps\": 30.0}\n",
            "{\"frame\": 1, \"detections\": []}\n",
            "{\"frame\": 1000000000000000, \"detections\": []}\n",
        ));
        let mut source = JsonlDetectionSource::open(log.path()).unwrap();
        source.next_frame().unwrap();
        let err = source.next_frame().unwrap_err();
        assert!(matches!(err, EngineError::MalformedDetections { line: 3, .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = JsonlDetectionSource::open("/nonexistent/detections.jsonl")
            .err()
            .unwrap();
        assert!(matches!(err, EngineError::FileNotFound(_)));
    }
}
