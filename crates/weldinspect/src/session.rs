//! Per-order inspection session: counters, image files and the record.
//!
//! A frame is committed only once both its annotated image and its record
//! row are on disk. Until then the OK/NOK counters and the row number stay
//! untouched, so a failed save can be retried without leaving gaps.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use image::RgbImage;

use crate::annotate::Annotator;
use crate::classify::{Defect, Status};
use crate::config::InspectionConfig;
use crate::error::InspectError;
use crate::features::Hole;
use crate::inspect::inspect_frame;
use crate::measurement::Measurements;
use crate::persist::{next_free_path, CsvRecord, ImageName, RecordRow, RecordSink};
use crate::seams::SeamSet;
use crate::source::FrameSource;

/// Outcome of one saved part.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct InspectionResult {
    pub part_number: String,
    pub cam_id: String,
    pub status: Status,
    /// Value of the OK or NOK counter assigned to this part.
    pub counter: u64,
    /// Row number in the order record.
    pub row_number: u64,
    pub measurements: Measurements,
    pub defects: Vec<Defect>,
    pub spatter_count: usize,
    pub holes: Vec<Hole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seams: Option<SeamSet>,
    pub timestamp: DateTime<Local>,
    pub image_path: PathBuf,
}

/// Pass/fail totals for the session.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SessionStats {
    pub total_parts: u64,
    pub ok_parts: u64,
    pub nok_parts: u64,
    /// Percent of parts that passed; 0 when nothing was inspected.
    pub ok_rate: f64,
    pub nok_rate: f64,
}

impl SessionStats {
    pub fn from_counts(ok_parts: u64, nok_parts: u64) -> Self {
        let total_parts = ok_parts + nok_parts;
        let rate = |n: u64| {
            if total_parts == 0 {
                0.0
            } else {
                n as f64 / total_parts as f64 * 100.0
            }
        };
        Self {
            total_parts,
            ok_parts,
            nok_parts,
            ok_rate: rate(ok_parts),
            nok_rate: rate(nok_parts),
        }
    }
}

/// Inspection session for one operator and order number.
#[derive(Debug)]
pub struct InspectionSession<R: RecordSink = CsvRecord> {
    user: String,
    order_number: String,
    order_dir: PathBuf,
    ok_counter: u64,
    nok_counter: u64,
    next_row: u64,
    config: InspectionConfig,
    annotator: Annotator,
    record: R,
}

fn prepare_order_dir(config: &InspectionConfig, order_number: &str) -> Result<PathBuf, InspectError> {
    let order_dir = config.output_dir.join(order_number);
    std::fs::create_dir_all(&order_dir).map_err(|source| InspectError::OrderDir {
        path: order_dir.clone(),
        source,
    })?;
    Ok(order_dir)
}

impl InspectionSession<CsvRecord> {
    /// Open a session writing to `{output_dir}/{order}/{order}.csv`.
    pub fn open(user: &str, order_number: &str, config: InspectionConfig) -> Result<Self, InspectError> {
        let order_dir = prepare_order_dir(&config, order_number)?;
        let record_path = order_dir.join(format!("{order_number}.csv"));
        let record = CsvRecord::open(&record_path).map_err(|source| InspectError::Record {
            path: record_path.clone(),
            source,
        })?;
        Self::with_record(user, order_number, config, record)
    }
}

impl<R: RecordSink> InspectionSession<R> {
    /// Open a session with a caller-supplied record sink.
    pub fn with_record(
        user: &str,
        order_number: &str,
        config: InspectionConfig,
        record: R,
    ) -> Result<Self, InspectError> {
        let order_dir = prepare_order_dir(&config, order_number)?;
        let annotator = Annotator::new(config.annotation.clone())?;
        let next_row = record.row_count() + 1;
        tracing::info!(
            "session opened: user={} order={} dir={} next row={}",
            user,
            order_number,
            order_dir.display(),
            next_row
        );
        Ok(Self {
            user: user.to_string(),
            order_number: order_number.to_string(),
            order_dir,
            ok_counter: 0,
            nok_counter: 0,
            next_row,
            config,
            annotator,
            record,
        })
    }

    /// Inspect a frame, save its annotated image and append its record row.
    ///
    /// Persistence failures are returned as errors and leave the counters
    /// unchanged; they never turn into a NOK verdict.
    pub fn process_and_save(
        &mut self,
        frame: &RgbImage,
        part_number: &str,
        cam_id: &str,
    ) -> Result<InspectionResult, InspectError> {
        let gray = image::imageops::grayscale(frame);
        let inspection = inspect_frame(&gray, &self.config);
        let annotated = self.annotator.annotate(frame, &inspection);
        let status = inspection.verdict.status;

        let counter = match status {
            Status::Ok => self.ok_counter + 1,
            Status::Nok => self.nok_counter + 1,
        };
        let name = ImageName {
            status,
            order_number: self.order_number.clone(),
            part_number: part_number.to_string(),
            counter,
            cam_id: cam_id.to_string(),
        };
        let image_path = next_free_path(&self.order_dir, &name);
        annotated
            .save(&image_path)
            .map_err(|source| InspectError::ImageWrite {
                path: image_path.clone(),
                source,
            })?;

        let timestamp = Local::now();
        let row = RecordRow::new(
            self.next_row,
            status,
            &self.order_number,
            counter,
            &timestamp,
            inspection.measurements.record_values(),
            &self.user,
        );
        if let Err(source) = self.record.append(&row) {
            if let Err(e) = std::fs::remove_file(&image_path) {
                tracing::warn!(
                    "failed to remove orphaned image {}: {}",
                    image_path.display(),
                    e
                );
            }
            return Err(InspectError::Record {
                path: self.record.location(),
                source,
            });
        }

        match status {
            Status::Ok => self.ok_counter = counter,
            Status::Nok => self.nok_counter = counter,
        }
        let row_number = self.next_row;
        self.next_row += 1;
        tracing::info!(
            "part {} cam {}: {} (count {}) -> {}",
            part_number,
            cam_id,
            status,
            counter,
            image_path.display()
        );

        let features = inspection.features;
        Ok(InspectionResult {
            part_number: part_number.to_string(),
            cam_id: cam_id.to_string(),
            status,
            counter,
            row_number,
            measurements: inspection.measurements,
            defects: inspection.verdict.defects,
            spatter_count: features.spatter_count,
            holes: features.holes,
            seams: inspection.seams,
            timestamp,
            image_path,
        })
    }

    /// Capture one frame from `source`, then [`Self::process_and_save`] it.
    pub fn capture_and_process(
        &mut self,
        source: &mut dyn FrameSource,
        part_number: &str,
        cam_id: &str,
    ) -> Result<InspectionResult, InspectError> {
        let frame = source.capture()?;
        self.process_and_save(&frame, part_number, cam_id)
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats::from_counts(self.ok_counter, self.nok_counter)
    }

    pub fn ok_counter(&self) -> u64 {
        self.ok_counter
    }

    pub fn nok_counter(&self) -> u64 {
        self.nok_counter
    }

    pub fn order_dir(&self) -> &Path {
        &self.order_dir
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn config(&self) -> &InspectionConfig {
        &self.config
    }

    pub fn record(&self) -> &R {
        &self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AcquisitionError;
    use crate::source::ImageFileSource;
    use crate::test_utils::{render_part, scratch_dir, PartScene};
    use approx::assert_relative_eq;
    use std::io;

    fn config_in(dir: &Path) -> InspectionConfig {
        InspectionConfig {
            output_dir: dir.to_path_buf(),
            ..InspectionConfig::default()
        }
    }

    fn missing_part() -> RgbImage {
        render_part(&PartScene {
            part_missing: true,
            ..PartScene::default()
        })
    }

    fn jpg_count(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .expect("read dir")
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|x| x == "jpg"))
            .count()
    }

    /// In-memory sink that can be told to fail.
    #[derive(Debug, Default)]
    struct MemorySink {
        rows: Vec<RecordRow>,
        fail: bool,
    }

    impl RecordSink for MemorySink {
        fn row_count(&self) -> u64 {
            self.rows.len() as u64
        }

        fn append(&mut self, row: &RecordRow) -> io::Result<()> {
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            self.rows.push(row.clone());
            Ok(())
        }

        fn location(&self) -> PathBuf {
            PathBuf::from("memory")
        }
    }

    #[test]
    fn ok_part_is_saved_and_recorded() {
        let root = scratch_dir("session-ok");
        let mut session = InspectionSession::open("alice", "ORD1", config_in(&root)).expect("open");
        let result = session
            .process_and_save(&render_part(&PartScene::default()), "P1", "1")
            .expect("process");

        assert_eq!(result.status, Status::Ok, "{:?}", result.defects);
        assert_eq!(result.counter, 1);
        assert_eq!(result.row_number, 1);
        assert_eq!(
            result.image_path,
            root.join("ORD1").join("OK_ORD1_P1Count1_CAM1.jpg")
        );
        assert!(result.image_path.exists());
        assert_eq!(session.ok_counter(), 1);
        assert_eq!(session.nok_counter(), 0);

        let csv = std::fs::read_to_string(root.join("ORD1").join("ORD1.csv")).expect("csv");
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("1,OK,ORD1,1,"));
        assert!(lines[1].ends_with(",alice"));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn each_frame_bumps_exactly_one_counter() {
        let root = scratch_dir("session-counters");
        let mut session = InspectionSession::open("bob", "ORD2", config_in(&root)).expect("open");

        let nok = session
            .process_and_save(&missing_part(), "P1", "1")
            .expect("process");
        assert_eq!(nok.status, Status::Nok);
        assert_eq!(nok.defects, vec![Defect::PartMissing]);
        assert!(nok
            .image_path
            .ends_with("NOK_ORD2_P1Count1_CAM1.jpg"));

        session
            .process_and_save(&render_part(&PartScene::default()), "P2", "1")
            .expect("process");
        session
            .process_and_save(&missing_part(), "P3", "1")
            .expect("process");

        assert_eq!(session.ok_counter(), 1);
        assert_eq!(session.nok_counter(), 2);
        let stats = session.stats();
        assert_eq!(stats.total_parts, 3);
        assert_relative_eq!(stats.ok_rate, 100.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(stats.nok_rate, 200.0 / 3.0, epsilon = 1e-9);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn reopened_order_continues_numbering_without_overwriting() {
        let root = scratch_dir("session-reopen");
        {
            let mut s = InspectionSession::open("alice", "ORD3", config_in(&root)).expect("open");
            s.process_and_save(&missing_part(), "P1", "1").expect("process");
        }
        let mut s = InspectionSession::open("alice", "ORD3", config_in(&root)).expect("reopen");
        let r = s.process_and_save(&missing_part(), "P1", "1").expect("process");

        assert_eq!(r.counter, 1);
        assert_eq!(r.row_number, 2);
        assert!(r.image_path.ends_with("NOK_ORD3_P1Count1_CAM1_1.jpg"));
        assert_eq!(jpg_count(s.order_dir()), 2);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn record_failure_rolls_back() {
        let root = scratch_dir("session-record-fail");
        let sink = MemorySink {
            fail: true,
            ..MemorySink::default()
        };
        let mut s = InspectionSession::with_record("alice", "ORD4", config_in(&root), sink)
            .expect("open");
        let err = s
            .process_and_save(&missing_part(), "P1", "1")
            .expect_err("append fails");

        assert!(matches!(err, InspectError::Record { .. }));
        assert!(err.to_string().contains("memory"), "{err}");
        assert_eq!(s.nok_counter(), 0);
        assert_eq!(s.stats().total_parts, 0);
        assert_eq!(jpg_count(s.order_dir()), 0);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn image_write_failure_commits_nothing() {
        let root = scratch_dir("session-image-fail");
        let mut s = InspectionSession::with_record(
            "alice",
            "ORD5",
            config_in(&root),
            MemorySink::default(),
        )
        .expect("open");
        std::fs::remove_dir_all(s.order_dir()).expect("remove order dir");

        let err = s
            .process_and_save(&missing_part(), "P1", "1")
            .expect_err("write fails");
        assert!(matches!(err, InspectError::ImageWrite { .. }));
        assert_eq!(s.nok_counter(), 0);
        assert!(s.record().rows.is_empty());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn memory_sink_sees_explicit_row_numbers() {
        let root = scratch_dir("session-rows");
        let mut s = InspectionSession::with_record(
            "carol",
            "ORD6",
            config_in(&root),
            MemorySink::default(),
        )
        .expect("open");
        s.process_and_save(&missing_part(), "P1", "2").expect("process");
        s.process_and_save(&missing_part(), "P2", "2").expect("process");

        let rows = &s.record().rows;
        assert_eq!(rows.iter().map(|r| r.number).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(rows.iter().map(|r| r.counter).collect::<Vec<_>>(), vec![1, 2]);
        assert!(rows.iter().all(|r| r.values.iter().all(|&v| v == 0.0)));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn acquisition_failure_is_an_error_not_a_verdict() {
        let root = scratch_dir("session-acq");
        let mut s = InspectionSession::with_record(
            "alice",
            "ORD7",
            config_in(&root),
            MemorySink::default(),
        )
        .expect("open");
        let mut src = ImageFileSource::default();
        let err = s
            .capture_and_process(&mut src, "P1", "1")
            .expect_err("empty source");
        assert!(matches!(
            err,
            InspectError::Acquisition(AcquisitionError::Exhausted)
        ));
        assert_eq!(s.stats().total_parts, 0);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn stats_of_empty_session() {
        let stats = SessionStats::from_counts(0, 0);
        assert_eq!(stats.total_parts, 0);
        assert_eq!(stats.ok_rate, 0.0);
        assert_eq!(stats.nok_rate, 0.0);
    }
}
