//! Tabular and structured export.
//!
//! Converts every GPX file in a directory to CSV, writes combined CSV/JSON
//! files, reports all pairs of points closer than a threshold and computes
//! simple statistics.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::geo_utils::{compute_bounds, haversine_distance};
use crate::{gpx, GpsPoint};

/// Default threshold for the duplicate-pair report, in meters.
pub const DEFAULT_PAIR_THRESHOLD_M: f64 = 50.0;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A flat waypoint row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRecord {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub description: String,
    pub comment: String,
    pub time: String,
    pub symbol: String,
    pub source_file: String,
}

impl ExportRecord {
    /// Build a row from a raw waypoint. Missing fields become empty strings.
    pub fn from_raw(raw: gpx::RawWaypoint, source_file: &str) -> Self {
        Self {
            lat: raw.lat,
            lon: raw.lon,
            name: raw.name.unwrap_or_default(),
            description: raw.desc.unwrap_or_default(),
            comment: raw.cmt.unwrap_or_default(),
            time: raw.time.unwrap_or_default(),
            symbol: raw.sym.unwrap_or_default(),
            source_file: source_file.to_string(),
        }
    }

    pub fn position(&self) -> GpsPoint {
        GpsPoint::new(self.lat, self.lon)
    }

    /// Name, or description when the name is empty.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.description
        } else {
            &self.name
        }
    }
}

/// Two records closer than the report threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicatePair {
    pub point1_idx: usize,
    pub point1_name: String,
    pub point1_source: String,
    pub point1_lat: f64,
    pub point1_lon: f64,
    pub point2_idx: usize,
    pub point2_name: String,
    pub point2_source: String,
    pub point2_lat: f64,
    pub point2_lon: f64,
    /// Distance in meters, rounded to 2 decimals
    pub distance_m: f64,
}

/// Min/max of one coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

/// Aggregate statistics over a record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total_points: usize,
    /// Record count per source file, largest first
    pub by_source: Vec<(String, usize)>,
    pub lat_range: Option<Range>,
    pub lon_range: Option<Range>,
}

/// Result of [`run_export`].
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Record count per input file, in processing order
    pub files: Vec<(String, usize)>,
    pub records: Vec<ExportRecord>,
    /// `None` when duplicate checking was disabled
    pub duplicates: Option<Vec<DuplicatePair>>,
    pub statistics: Statistics,
    pub output_dir: PathBuf,
}

/// Write records as CSV with a UTF-8 BOM.
pub fn write_csv<T: Serialize>(rows: &[T], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut out = BufWriter::new(file);
    out.write_all(UTF8_BOM).map_err(|e| Error::io(path, e))?;

    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|e| Error::io(path, e))
}

/// Write records as a pretty-printed JSON array. Non-ASCII text is kept as is.
pub fn write_json<T: Serialize>(rows: &[T], path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, rows)?;
    out.flush().map_err(|e| Error::io(path, e))
}

/// Every pair `i < j` within `threshold_m`, ordered by `(i, j)`.
///
/// Quadratic in the number of records.
///
/// # Example
/// ```
/// use waypoint_dedup::export::{find_duplicate_pairs, ExportRecord};
///
/// let row = |lat: f64, name: &str| ExportRecord {
///     lat, lon: 126.2,
///     name: name.into(), description: String::new(), comment: String::new(),
///     time: String::new(), symbol: String::new(), source_file: "a.gpx".into(),
/// };
///
/// let rows = vec![row(36.5, "a"), row(36.5001, "b"), row(36.6, "c")];
/// let pairs = find_duplicate_pairs(&rows, 50.0);
/// assert_eq!(pairs.len(), 1);
/// assert_eq!((pairs[0].point1_idx, pairs[0].point2_idx), (0, 1));
/// ```
pub fn find_duplicate_pairs(records: &[ExportRecord], threshold_m: f64) -> Vec<DuplicatePair> {
    (0..records.len())
        .flat_map(|i| pairs_from(records, i, threshold_m))
        .collect()
}

/// Parallel version of [`find_duplicate_pairs`] with identical output order.
#[cfg(feature = "parallel")]
pub fn find_duplicate_pairs_parallel(records: &[ExportRecord], threshold_m: f64) -> Vec<DuplicatePair> {
    use rayon::prelude::*;

    (0..records.len())
        .into_par_iter()
        .flat_map_iter(|i| pairs_from(records, i, threshold_m))
        .collect()
}

fn pairs_from(records: &[ExportRecord], i: usize, threshold_m: f64) -> Vec<DuplicatePair> {
    let a = &records[i];
    let pa = a.position();

    records
        .iter()
        .enumerate()
        .skip(i + 1)
        .filter_map(|(j, b)| {
            let dist = haversine_distance(&pa, &b.position());
            (dist <= threshold_m).then(|| DuplicatePair {
                point1_idx: i,
                point1_name: a.label().to_string(),
                point1_source: a.source_file.clone(),
                point1_lat: a.lat,
                point1_lon: a.lon,
                point2_idx: j,
                point2_name: b.label().to_string(),
                point2_source: b.source_file.clone(),
                point2_lat: b.lat,
                point2_lon: b.lon,
                distance_m: (dist * 100.0).round() / 100.0,
            })
        })
        .collect()
}

/// Count, per-source breakdown and coordinate ranges.
pub fn compute_statistics(records: &[ExportRecord]) -> Statistics {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in records {
        *counts.entry(r.source_file.as_str()).or_default() += 1;
    }

    let mut by_source: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(source, count)| (source.to_string(), count))
        .collect();
    by_source.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let points: Vec<GpsPoint> = records.iter().map(ExportRecord::position).collect();
    let bounds = compute_bounds(&points);

    Statistics {
        total_points: records.len(),
        by_source,
        lat_range: bounds.map(|b| Range { min: b.min_lat, max: b.max_lat }),
        lon_range: bounds.map(|b| Range { min: b.min_lng, max: b.max_lng }),
    }
}

/// `*.gpx` files in `dir`, sorted by file name.
pub fn list_gpx_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        let is_gpx = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gpx"));
        if is_gpx && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Export every GPX file in `gpx_dir` into `output_dir`.
///
/// Writes `{stem}.csv` per input, `all_points.csv`, `all_points.json`, and
/// `duplicates.csv` when `check_duplicates` is set and pairs were found.
/// Files that fail to parse are logged and skipped.
pub fn run_export(
    gpx_dir: &Path,
    output_dir: &Path,
    check_duplicates: bool,
    threshold_m: f64,
) -> Result<ExportSummary> {
    std::fs::create_dir_all(output_dir).map_err(|e| Error::io(output_dir, e))?;

    let mut files = Vec::new();
    let mut records = Vec::new();

    for path in list_gpx_files(gpx_dir)? {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let raws = match gpx::read_file(&path) {
            Ok(raws) => raws,
            Err(e) => {
                warn!("[export] skipping {}: {}", path.display(), e);
                continue;
            }
        };

        let rows: Vec<ExportRecord> = raws
            .into_iter()
            .map(|raw| ExportRecord::from_raw(raw, &file_name))
            .collect();
        info!("[export] {}: {} points", file_name, rows.len());

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.clone());
        write_csv(&rows, &output_dir.join(format!("{stem}.csv")))?;

        files.push((file_name, rows.len()));
        records.extend(rows);
    }

    write_csv(&records, &output_dir.join("all_points.csv"))?;
    write_json(&records, &output_dir.join("all_points.json"))?;

    let duplicates = if check_duplicates {
        #[cfg(feature = "parallel")]
        let pairs = find_duplicate_pairs_parallel(&records, threshold_m);
        #[cfg(not(feature = "parallel"))]
        let pairs = find_duplicate_pairs(&records, threshold_m);
        info!("[export] {} pairs within {}m", pairs.len(), threshold_m);
        if !pairs.is_empty() {
            write_csv(&pairs, &output_dir.join("duplicates.csv"))?;
        }
        Some(pairs)
    } else {
        None
    };

    let statistics = compute_statistics(&records);

    Ok(ExportSummary {
        files,
        records,
        duplicates,
        statistics,
        output_dir: output_dir.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(lat: f64, lon: f64, name: &str, source: &str) -> ExportRecord {
        ExportRecord {
            lat,
            lon,
            name: name.to_string(),
            description: String::new(),
            comment: String::new(),
            time: String::new(),
            symbol: "Fish".to_string(),
            source_file: source.to_string(),
        }
    }

    #[test]
    fn test_pairs_ordered_and_rounded() {
        let records = vec![
            record(36.5, 126.2, "a", "x.gpx"),
            record(36.5, 126.2, "b", "y.gpx"),
            record(36.5002, 126.2, "c", "x.gpx"), // ~22m from a and b
            record(37.0, 127.0, "far", "x.gpx"),
        ];

        let pairs = find_duplicate_pairs(&records, 50.0);
        let idx: Vec<(usize, usize)> = pairs.iter().map(|p| (p.point1_idx, p.point2_idx)).collect();
        assert_eq!(idx, vec![(0, 1), (0, 2), (1, 2)]);

        assert_eq!(pairs[0].distance_m, 0.0);
        assert_eq!(pairs[1].distance_m, 22.24);
        assert_eq!(pairs[1].point2_name, "c");
        assert_eq!(pairs[0].point2_source, "y.gpx");
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_pairs_match_sequential() {
        let records: Vec<ExportRecord> = (0..200)
            .map(|i| record(36.5 + (i % 17) as f64 * 0.00005, 126.2 + (i % 13) as f64 * 0.00005, "p", "x.gpx"))
            .collect();
        assert_eq!(
            find_duplicate_pairs_parallel(&records, 20.0),
            find_duplicate_pairs(&records, 20.0)
        );
    }

    #[test]
    fn test_pair_label_falls_back_to_description() {
        let mut a = record(36.5, 126.2, "", "x.gpx");
        a.description = "설명".into();
        let b = record(36.5, 126.2, "b", "x.gpx");
        let pairs = find_duplicate_pairs(&[a, b], 10.0);
        assert_eq!(pairs[0].point1_name, "설명");
    }

    #[test]
    fn test_statistics() {
        let records = vec![
            record(36.5, 126.2, "a", "x.gpx"),
            record(37.8, 128.9, "b", "y.gpx"),
            record(35.1, 129.1, "c", "y.gpx"),
        ];
        let stats = compute_statistics(&records);
        assert_eq!(stats.total_points, 3);
        assert_eq!(stats.by_source, vec![("y.gpx".to_string(), 2), ("x.gpx".to_string(), 1)]);
        assert_eq!(stats.lat_range, Some(Range { min: 35.1, max: 37.8 }));
        assert_eq!(stats.lon_range, Some(Range { min: 126.2, max: 129.1 }));
    }

    #[test]
    fn test_statistics_empty() {
        let stats = compute_statistics(&[]);
        assert_eq!(stats.total_points, 0);
        assert!(stats.by_source.is_empty());
        assert_eq!(stats.lat_range, None);
    }

    #[test]
    fn test_csv_has_bom_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&[record(36.5, 126.2, "사각형어초", "x.gpx")], &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("lat,lon,name,description,comment,time,symbol,source_file")
        );
        assert_eq!(lines.next(), Some("36.5,126.2,사각형어초,,,,Fish,x.gpx"));
    }

    #[test]
    fn test_json_keeps_non_ascii() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&[record(36.5, 126.2, "방파제", "x.gpx")], &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"name\": \"방파제\""));
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[0]["source_file"], "x.gpx");
    }

    #[test]
    fn test_run_export_end_to_end() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let out_dir = output.path().join("data");

        std::fs::write(
            input.path().join("b_points.gpx"),
            r#"<gpx xmlns="http://www.topografix.com/GPX/1/1">
                <wpt lat="36.5" lon="126.2"><name>a</name></wpt>
                <wpt lat="36.5001" lon="126.2"><name>b</name></wpt>
            </gpx>"#,
        )
        .unwrap();
        std::fs::write(
            input.path().join("a_points.gpx"),
            r#"<gpx><wpt lat="37.8" lon="128.9"><name>c</name></wpt></gpx>"#,
        )
        .unwrap();
        std::fs::write(input.path().join("broken.gpx"), "<gpx><wpt lat=\"x\" lon=\"1\"/></gpx>").unwrap();
        std::fs::write(input.path().join("notes.txt"), "not gpx").unwrap();

        let summary = run_export(input.path(), &out_dir, true, 50.0).unwrap();

        assert_eq!(
            summary.files,
            vec![("a_points.gpx".to_string(), 1), ("b_points.gpx".to_string(), 2)]
        );
        assert_eq!(summary.records.len(), 3);
        assert_eq!(summary.duplicates.as_ref().map(Vec::len), Some(1));
        assert_eq!(summary.statistics.total_points, 3);

        for name in ["a_points.csv", "b_points.csv", "all_points.csv", "all_points.json", "duplicates.csv"] {
            assert!(out_dir.join(name).exists(), "{name} missing");
        }
        assert!(!out_dir.join("broken.csv").exists());
    }

    #[test]
    fn test_run_export_without_duplicate_check() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        std::fs::write(
            input.path().join("p.gpx"),
            r#"<gpx><wpt lat="36.5" lon="126.2"/><wpt lat="36.5" lon="126.2"/></gpx>"#,
        )
        .unwrap();

        let summary = run_export(input.path(), output.path(), false, 50.0).unwrap();
        assert!(summary.duplicates.is_none());
        assert!(!output.path().join("duplicates.csv").exists());
    }
}
