use crate::aggregate::Registry;
use crate::config::OutputConfig;
use crate::series::SeriesCache;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::BufWriter;

/// Write every region's marker series as a JSON file under the output dir:
/// output/series/{target}.json, nation root included. A frontend can then be
/// served fully statically.
pub fn write_series(config: &OutputConfig, registry: &Registry) -> Result<()> {
    fs::create_dir_all(&config.series_dir)
        .with_context(|| format!("Failed to create series directory: {:?}", config.series_dir))?;

    let mut cache = SeriesCache::new();
    let targets: Vec<String> = registry.targets().map(str::to_string).collect();
    let mut written = 0usize;

    for target in &targets {
        let series = match cache.series(registry, target) {
            Some(s) => s,
            None => continue,
        };
        let path = config.series_dir.join(format!("{}.json", file_stem(target)));
        let file = File::create(&path)
            .with_context(|| format!("Failed to create series file: {:?}", path))?;
        serde_json::to_writer_pretty(BufWriter::new(file), series.as_ref())
            .with_context(|| format!("Failed to write series file: {:?}", path))?;
        written += 1;
    }

    println!("Wrote {} series files to {:?}", written, config.series_dir);
    Ok(())
}

// City names come from the feed; keep them out of path syntax.
fn file_stem(target: &str) -> String {
    target
        .chars()
        .map(|c| if c == '/' || c == '\\' || c == '.' { '_' } else { c })
        .collect()
}
