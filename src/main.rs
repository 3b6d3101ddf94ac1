//! Command-line entry point.
//!
//! ```text
//! waypoint-dedup dedup  --input-dir ../gpx --output-dir ../result [--radius 10] [--no-duplicates]
//! waypoint-dedup export --gpx-dir ../gpx --output-dir ../data [--distance 50] [--no-duplicates]
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use waypoint_dedup::export::{self, ExportSummary, DEFAULT_PAIR_THRESHOLD_M};
use waypoint_dedup::pipeline::PipelineOutput;
use waypoint_dedup::{CategoryTable, DedupConfig, Pipeline, RegionPolicy, SourceConfig};

#[derive(Parser, Debug)]
#[command(name = "waypoint-dedup", version, about = "Deduplicate and split fishing-spot GPX waypoints")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge sources, remove duplicates and write west/east GPX files
    Dedup {
        /// Directory holding the source GPX files
        #[arg(long, default_value = "../gpx")]
        input_dir: PathBuf,

        /// Directory for west_result.gpx and east_result.gpx
        #[arg(long, default_value = "../result")]
        output_dir: PathBuf,

        /// Duplicate radius in meters
        #[arg(long, default_value_t = 10.0)]
        radius: f64,

        /// Longitude separating west and east
        #[arg(long, default_value_t = waypoint_dedup::DEFAULT_LON_BOUNDARY)]
        lon_boundary: f64,

        /// Skip duplicate removal
        #[arg(long)]
        no_duplicates: bool,

        /// JSON source list replacing the built-in layout
        #[arg(long)]
        sources: Option<PathBuf>,
    },

    /// Convert GPX files to CSV/JSON, report close pairs and print statistics
    Export {
        /// Directory holding the GPX files
        #[arg(long, default_value = "../gpx")]
        gpx_dir: PathBuf,

        /// Directory for the CSV/JSON output
        #[arg(long, default_value = "../data")]
        output_dir: PathBuf,

        /// Pair report threshold in meters
        #[arg(long, default_value_t = DEFAULT_PAIR_THRESHOLD_M)]
        distance: f64,

        /// Skip the duplicate-pair report
        #[arg(long)]
        no_duplicates: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Dedup { input_dir, output_dir, radius, lon_boundary, no_duplicates, sources } => {
            let sources = match sources {
                Some(path) => SourceConfig::load_list(&path)
                    .with_context(|| format!("reading source list {}", path.display()))?,
                None => SourceConfig::default_sources(),
            };
            let config = DedupConfig {
                radius_m: radius,
                lon_boundary,
                skip_dedup: no_duplicates,
                ..Default::default()
            };

            let pipeline = Pipeline::new(config, CategoryTable::default());
            let (output, written) = pipeline
                .run(&input_dir, &output_dir, &sources)
                .with_context(|| format!("writing results to {}", output_dir.display()))?;

            print_dedup_summary(&output, pipeline.config());
            println!("\nOutput files:");
            for path in written {
                println!("  {}", path.display());
            }
        }
        Command::Export { gpx_dir, output_dir, distance, no_duplicates } => {
            let summary = export::run_export(&gpx_dir, &output_dir, !no_duplicates, distance)
                .with_context(|| format!("exporting {} to {}", gpx_dir.display(), output_dir.display()))?;
            print_export_summary(&summary, distance);
        }
    }

    Ok(())
}

fn print_dedup_summary(output: &PipelineOutput, config: &DedupConfig) {
    for source in &output.sources {
        if let Some(err) = &source.error {
            println!("{} - {}: parse failed ({})", policy_label(source.policy), source.name, err);
            continue;
        }
        match source.policy {
            RegionPolicy::ByLongitude => {
                println!("{} ({}) - West: {}, East: {}", source.name, source.kind, source.west, source.east)
            }
            RegionPolicy::Static(_) => println!(
                "{} - {}: {} points",
                policy_label(source.policy),
                source.name,
                source.west + source.east
            ),
        }
    }

    println!("\nBefore deduplication:");
    println!("  West total: {}", output.west.before);
    println!("  East total: {}", output.east.before);

    if config.skip_dedup {
        println!("\nDeduplication skipped");
    } else {
        println!("\nAfter deduplication ({}m radius):", config.radius_m);
        for report in output.regions() {
            println!(
                "  {}: {} -> {} ({} removed)",
                capitalize(&report.region.to_string()),
                report.before,
                report.after(),
                report.removed()
            );
        }
    }

    println!("\nShort names:");
    for report in output.regions() {
        println!("  {}:", report.region.label());
        for (prefix, count) in &report.histogram {
            println!("    {prefix}: {count}");
        }
    }
}

fn print_export_summary(summary: &ExportSummary, distance: f64) {
    let rule = "=".repeat(60);

    println!("\n{rule}\nGPX export\n{rule}");
    for (file, count) in &summary.files {
        println!("  {file}: {count} points");
    }
    println!("\nTotal points: {}", summary.records.len());
    println!("\nWritten to {}:", summary.output_dir.display());
    println!("  - per-file CSV: *.csv");
    println!("  - combined CSV: all_points.csv");
    println!("  - combined JSON: all_points.json");

    if let Some(pairs) = &summary.duplicates {
        println!("\n{rule}\nDuplicate check (threshold: {distance}m)\n{rule}");
        if pairs.is_empty() {
            println!("No duplicates");
        } else {
            println!("\nFound {} pairs, saved to duplicates.csv", pairs.len());
            println!("\nTop 10:");
            for (i, pair) in pairs.iter().take(10).enumerate() {
                println!("  {}. [{}] {}...", i + 1, pair.point1_source, truncate(&pair.point1_name, 20));
                println!("     [{}] {}...", pair.point2_source, truncate(&pair.point2_name, 20));
                println!("     distance: {}m", pair.distance_m);
            }
        }
    }

    let stats = &summary.statistics;
    println!("\n{rule}\nStatistics\n{rule}");
    println!("Total points: {}", stats.total_points);
    println!("\nPoints per file:");
    for (source, count) in &stats.by_source {
        println!("  {source}: {count}");
    }
    if let (Some(lat), Some(lon)) = (stats.lat_range, stats.lon_range) {
        println!("\nCoordinate range:");
        println!("  lat: {:.6} ~ {:.6}", lat.min, lat.max);
        println!("  lon: {:.6} ~ {:.6}", lon.min, lon.max);
    }
}

fn policy_label(policy: RegionPolicy) -> String {
    match policy {
        RegionPolicy::Static(region) => capitalize(&region.to_string()),
        RegionPolicy::ByLongitude => "By longitude".to_string(),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// First `max` characters of `s`.
fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
