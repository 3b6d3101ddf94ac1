//! Split a handful of waypoints into west/east regions, drop duplicates and
//! print the generated short names.
//!
//! Run with: cargo run --example region_split

use waypoint_dedup::{
    CategoryTable, DedupConfig, Pipeline, Region, RegionPolicy, SourceCollection, SourceKind,
    Waypoint,
};

fn main() {
    let reef = |lat: f64, lon: f64, name: &str| Waypoint::new(lat, lon, SourceKind::Reef).with_name(name);
    let own = |lat: f64, lon: f64, name: &str| Waypoint::new(lat, lon, SourceKind::Own).with_name(name);

    // Chungnam reef survey (west coast)
    let chungnam = SourceCollection::new(
        "chungnam_points.gpx",
        SourceKind::Reef,
        RegionPolicy::Static(Region::West),
        vec![
            reef(36.512300, 126.123400, "2단상자형강제어초 보강"),
            reef(36.512340, 126.123420, "2단상자형강제어초"), // ~5m away
            reef(36.602000, 126.201000, "사각형어초"),
            reef(36.700000, 126.300000, "인공어초"),
        ],
    );

    // Gangwon reef survey (east coast)
    let gangwon = SourceCollection::new(
        "gangwon_points.gpx",
        SourceKind::Reef,
        RegionPolicy::Static(Region::East),
        vec![
            reef(37.801000, 128.920000, "터널형어초"),
            reef(37.902000, 128.850000, "터널형어초"),
        ],
    );

    // Own points from both coasts
    let mine = SourceCollection::new(
        "my_own_points.gpx",
        SourceKind::Own,
        RegionPolicy::ByLongitude,
        vec![
            own(36.602010, 126.201010, "좋은 자리"), // duplicate of a west reef
            own(37.750000, 128.950000, "방파제 끝"),
        ],
    );

    let pipeline = Pipeline::new(DedupConfig::default(), CategoryTable::default());
    let output = pipeline.process(vec![chungnam, gangwon, mine]);

    for report in output.regions() {
        println!(
            "{}: {} -> {} points",
            report.region.label(),
            report.before,
            report.after()
        );
        for wpt in &report.waypoints {
            println!(
                "  {:<12} {:.6}, {:.6}  ({})",
                wpt.short_name.as_deref().unwrap_or("-"),
                wpt.latitude(),
                wpt.longitude(),
                wpt.display_label()
            );
        }
        println!();
    }
}
