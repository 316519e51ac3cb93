use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::pipeline::Sample;

/// Write the retained dataset as CSV.
///
/// Columns are `lon,lat,time_sec`, one row per retained grid point, no
/// index column.
pub fn write_csv(path: &Path, samples: &[Sample]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "lon,lat,time_sec")?;
    for sample in samples {
        writeln!(writer, "{},{},{}", sample.lon, sample.lat, sample.time_sec)?;
    }

    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_write_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("times.csv");

        let samples = vec![
            Sample {
                lon: 121.18,
                lat: 30.7,
                time_sec: 120.5,
            },
            Sample {
                lon: 121.181,
                lat: 30.7,
                time_sec: 0.0,
            },
        ];

        write_csv(&path, &samples).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "lon,lat,time_sec\n121.18,30.7,120.5\n121.181,30.7,0\n"
        );
    }

    #[test]
    fn test_write_csv_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        write_csv(&path, &[]).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "lon,lat,time_sec\n");
    }
}
