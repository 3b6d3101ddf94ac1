//! Batch orchestration.
//!
//! Load sources → tag and partition into west/east → deduplicate each region
//! → assign short names per region → write one GPX file per region.
//!
//! Each stage finishes for every waypoint before the next one starts. A source
//! that is missing is skipped; a source that fails to parse is logged and
//! contributes nothing. Only output failures abort the run.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::gpx::{self, GpxMetadata};
use crate::naming::{assign_short_names, NameCounters};
use crate::{
    deduplicate, partition, CategoryTable, DedupConfig, Region, RegionPolicy, SourceConfig,
    SourceKind, Waypoint,
};

/// One input collection, tagged with its provenance and region policy.
#[derive(Debug, Clone)]
pub struct SourceCollection {
    pub name: String,
    pub kind: SourceKind,
    pub policy: RegionPolicy,
    pub waypoints: Vec<Waypoint>,
    /// Set when the file existed but could not be parsed
    pub error: Option<String>,
}

impl SourceCollection {
    pub fn new(
        name: impl Into<String>,
        kind: SourceKind,
        policy: RegionPolicy,
        waypoints: Vec<Waypoint>,
    ) -> Self {
        Self { name: name.into(), kind, policy, waypoints, error: None }
    }

    /// Read a configured source from `input_dir`.
    ///
    /// Returns `None` when the file does not exist. A parse failure yields an
    /// empty collection carrying the error message.
    pub fn load(input_dir: &Path, source: &SourceConfig) -> Option<Self> {
        let path = input_dir.join(&source.file);
        if !path.exists() {
            debug!("[pipeline] {} not found, skipping", path.display());
            return None;
        }

        let mut collection = Self::new(source.file.clone(), source.kind, source.region, Vec::new());
        match gpx::read_file(&path) {
            Ok(raws) => {
                collection.waypoints = raws
                    .into_iter()
                    .map(|raw| raw.into_waypoint(source.kind, &source.file))
                    .collect();
                info!("[pipeline] {}: {} points", source.file, collection.waypoints.len());
            }
            Err(e) => {
                warn!("[pipeline] failed to parse {}: {}", path.display(), e);
                collection.error = Some(e.to_string());
            }
        }
        Some(collection)
    }
}

/// How many points a source contributed to each region.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceCount {
    pub name: String,
    pub kind: SourceKind,
    pub policy: RegionPolicy,
    pub west: usize,
    pub east: usize,
    pub error: Option<String>,
}

/// Result of processing one region.
#[derive(Debug, Clone)]
pub struct RegionReport {
    pub region: Region,
    /// Points assigned to the region before deduplication
    pub before: usize,
    /// Surviving, named waypoints in input order
    pub waypoints: Vec<Waypoint>,
    /// Short names issued per prefix, sorted by prefix
    pub histogram: Vec<(String, u32)>,
}

impl RegionReport {
    pub fn after(&self) -> usize {
        self.waypoints.len()
    }

    pub fn removed(&self) -> usize {
        self.before - self.waypoints.len()
    }
}

/// Result of a full pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub west: RegionReport,
    pub east: RegionReport,
    pub sources: Vec<SourceCount>,
}

impl PipelineOutput {
    pub fn regions(&self) -> [&RegionReport; 2] {
        [&self.west, &self.east]
    }
}

/// The deduplication pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: DedupConfig,
    table: CategoryTable,
}

impl Pipeline {
    pub fn new(config: DedupConfig, table: CategoryTable) -> Self {
        Self { config, table }
    }

    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// Load every configured source that exists under `input_dir`.
    pub fn load(&self, input_dir: &Path, sources: &[SourceConfig]) -> Vec<SourceCollection> {
        sources
            .iter()
            .filter_map(|source| SourceCollection::load(input_dir, source))
            .collect()
    }

    /// Partition, deduplicate and name the given collections.
    pub fn process(&self, collections: Vec<SourceCollection>) -> PipelineOutput {
        let mut west = Vec::new();
        let mut east = Vec::new();
        let mut sources = Vec::with_capacity(collections.len());

        for collection in collections {
            let mut count = SourceCount {
                name: collection.name,
                kind: collection.kind,
                policy: collection.policy,
                west: 0,
                east: 0,
                error: collection.error,
            };

            for mut wpt in collection.waypoints {
                let region = partition(&wpt, collection.policy, self.config.lon_boundary);
                wpt.region = Some(region);
                match region {
                    Region::West => {
                        count.west += 1;
                        west.push(wpt);
                    }
                    Region::East => {
                        count.east += 1;
                        east.push(wpt);
                    }
                }
            }
            sources.push(count);
        }

        PipelineOutput {
            west: self.process_region(Region::West, west),
            east: self.process_region(Region::East, east),
            sources,
        }
    }

    fn process_region(&self, region: Region, candidates: Vec<Waypoint>) -> RegionReport {
        let before = candidates.len();

        let mut waypoints = if self.config.skip_dedup {
            candidates
        } else {
            deduplicate(candidates, self.config.radius_m)
        };
        info!(
            "[pipeline] {}: {} -> {} points ({}m radius)",
            region,
            before,
            waypoints.len(),
            self.config.radius_m
        );

        let mut counters = NameCounters::new();
        assign_short_names(&mut waypoints, &self.table, &self.config.prefixes, &mut counters);

        RegionReport { region, before, waypoints, histogram: counters.histogram() }
    }

    /// Write `west_result.gpx` and `east_result.gpx` into `output_dir`,
    /// creating it if needed. Returns the written paths.
    pub fn write(&self, output: &PipelineOutput, output_dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(output_dir).map_err(|e| Error::io(output_dir, e))?;

        let mut written = Vec::with_capacity(2);
        for report in output.regions() {
            let path = output_dir.join(report.region.file_name());
            let metadata = GpxMetadata::for_region(report.region.label(), self.config.radius_m);
            gpx::write_file(&path, &report.waypoints, &metadata)?;
            info!("[pipeline] wrote {} ({} points)", path.display(), report.after());
            written.push(path);
        }
        Ok(written)
    }

    /// Load, process and write in one call.
    pub fn run(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        sources: &[SourceConfig],
    ) -> Result<(PipelineOutput, Vec<PathBuf>)> {
        let collections = self.load(input_dir, sources);
        let output = self.process(collections);
        let written = self.write(&output, output_dir)?;
        Ok((output, written))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn north(meters: f64) -> f64 {
        meters / (crate::geo_utils::EARTH_RADIUS_M * std::f64::consts::PI / 180.0)
    }

    fn reef(lat: f64, lon: f64, name: &str) -> Waypoint {
        Waypoint::new(lat, lon, SourceKind::Reef).with_name(name)
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(DedupConfig::default(), CategoryTable::default())
    }

    fn assert_unique_names(report: &RegionReport) {
        let names: HashSet<&str> = report
            .waypoints
            .iter()
            .map(|w| w.short_name.as_deref().unwrap())
            .collect();
        assert_eq!(names.len(), report.waypoints.len());
        assert!(names.iter().all(|n| !n.is_empty()));
    }

    #[test]
    fn test_two_static_sources_end_to_end() {
        let west = SourceCollection::new(
            "west.gpx",
            SourceKind::Reef,
            RegionPolicy::Static(Region::West),
            vec![
                reef(36.5, 126.2, "사각형어초"),
                reef(36.5 + north(5.0), 126.2, "사각형어초"),
                reef(36.6, 126.3, "터널형어초"),
            ],
        );
        let east = SourceCollection::new(
            "east.gpx",
            SourceKind::Reef,
            RegionPolicy::Static(Region::East),
            vec![reef(37.8, 128.9, "원통형어초"), reef(37.9, 129.0, "원통형어초")],
        );

        let output = pipeline().process(vec![west, east]);

        assert_eq!(output.west.before, 3);
        assert_eq!(output.west.after(), 2);
        assert_eq!(output.west.removed(), 1);
        assert_eq!(output.east.after(), 2);
        assert_unique_names(&output.west);
        assert_unique_names(&output.east);

        let west_names: Vec<_> = output.west.waypoints.iter().map(|w| w.short_name.clone().unwrap()).collect();
        assert_eq!(west_names, ["사각_001", "터널_001"]);
        let east_names: Vec<_> = output.east.waypoints.iter().map(|w| w.short_name.clone().unwrap()).collect();
        assert_eq!(east_names, ["원통_001", "원통_002"]);
    }

    #[test]
    fn test_by_longitude_source_is_split() {
        let own = SourceCollection::new(
            "my_own_points.gpx",
            SourceKind::Own,
            RegionPolicy::ByLongitude,
            vec![
                Waypoint::new(36.5, 126.0, SourceKind::Own),
                Waypoint::new(37.8, 127.5, SourceKind::Own),
                Waypoint::new(35.1, 129.1, SourceKind::Own),
            ],
        );

        let output = pipeline().process(vec![own]);
        assert_eq!(output.west.after(), 1);
        assert_eq!(output.east.after(), 2);
        assert_eq!(output.sources[0].west, 1);
        assert_eq!(output.sources[0].east, 2);
        assert!(output.east.waypoints.iter().all(|w| w.region == Some(Region::East)));
        assert_eq!(output.east.histogram, vec![("내포인트".to_string(), 2)]);
    }

    #[test]
    fn test_duplicates_across_sources_keep_earlier_source() {
        let a = SourceCollection::new(
            "a.gpx",
            SourceKind::Reef,
            RegionPolicy::Static(Region::West),
            vec![reef(36.5, 126.2, "강제어초")],
        );
        let b = SourceCollection::new(
            "b.gpx",
            SourceKind::Own,
            RegionPolicy::ByLongitude,
            vec![Waypoint::new(36.5, 126.2, SourceKind::Own).with_source_file("b.gpx")],
        );

        let output = pipeline().process(vec![a, b]);
        assert_eq!(output.west.after(), 1);
        assert_eq!(output.west.waypoints[0].source(), SourceKind::Reef);
    }

    #[test]
    fn test_skip_dedup_keeps_everything() {
        let config = DedupConfig { skip_dedup: true, ..Default::default() };
        let collection = SourceCollection::new(
            "w.gpx",
            SourceKind::Other,
            RegionPolicy::Static(Region::West),
            vec![Waypoint::new(36.5, 126.2, SourceKind::Other); 3],
        );

        let output = Pipeline::new(config, CategoryTable::default()).process(vec![collection]);
        assert_eq!(output.west.after(), 3);
        assert_unique_names(&output.west);
    }

    #[test]
    fn test_radius_override() {
        let config = DedupConfig { radius_m: 50.0, ..Default::default() };
        let collection = SourceCollection::new(
            "w.gpx",
            SourceKind::Reef,
            RegionPolicy::Static(Region::West),
            vec![reef(36.5, 126.2, "a"), reef(36.5 + north(30.0), 126.2, "b")],
        );

        assert_eq!(pipeline().process(vec![collection.clone()]).west.after(), 2);
        let output = Pipeline::new(config, CategoryTable::default()).process(vec![collection]);
        assert_eq!(output.west.after(), 1);
    }

    #[test]
    fn test_empty_run() {
        let output = pipeline().process(vec![]);
        assert_eq!(output.west.after(), 0);
        assert_eq!(output.east.after(), 0);
        assert!(output.west.histogram.is_empty());
    }

    #[test]
    fn test_run_from_files() {
        let input = tempfile::tempdir().unwrap();
        let output_root = tempfile::tempdir().unwrap();
        let output_dir = output_root.path().join("result");

        std::fs::write(
            input.path().join("chungnam_points.gpx"),
            r#"<gpx xmlns="http://www.topografix.com/GPX/1/1">
                <wpt lat="36.5" lon="126.2"><name>2단상자형강제어초 보강</name></wpt>
                <wpt lat="36.50001" lon="126.2"><name>2단상자형강제어초</name></wpt>
            </gpx>"#,
        )
        .unwrap();
        std::fs::write(input.path().join("gangwon_points.gpx"), "<gpx><wpt lat=\"bad\" lon=\"1\"/></gpx>").unwrap();
        std::fs::write(
            input.path().join("my_own_points.gpx"),
            r#"<gpx><wpt lat="37.8" lon="128.9"><name>방파제</name></wpt></gpx>"#,
        )
        .unwrap();

        let (output, written) = pipeline()
            .run(input.path(), &output_dir, &SourceConfig::default_sources())
            .unwrap();

        // new_points_chungcheong.gpx is absent and silently skipped
        assert_eq!(output.sources.len(), 3);
        assert!(output.sources.iter().any(|s| s.name == "gangwon_points.gpx" && s.error.is_some()));

        assert_eq!(output.west.after(), 1);
        assert_eq!(output.west.waypoints[0].short_name.as_deref(), Some("2단상자_001"));
        assert_eq!(output.east.after(), 1);
        assert_eq!(output.east.waypoints[0].short_name.as_deref(), Some("내포인트_001"));

        assert_eq!(written.len(), 2);
        let west = gpx::read_file(&output_dir.join("west_result.gpx")).unwrap();
        assert_eq!(west.len(), 1);
        assert_eq!(west[0].name.as_deref(), Some("2단상자_001"));
        assert_eq!(west[0].desc.as_deref(), Some("2단상자형강제어초 보강"));
        assert_eq!(west[0].sym.as_deref(), Some("Fish"));
    }
}
