use anyhow::{Context, Result, bail};
use image::{Rgba, RgbaImage};
use std::path::Path;

use crate::pipeline::Sample;

/// Heat-map rendering parameters.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Output width in pixels; height follows from the data's aspect ratio.
    pub width: u32,
    /// Half-width of the square drawn per point, in pixels.
    pub marker: u32,
    /// Color scale floor in seconds.
    pub color_min: f64,
    /// Color scale ceiling in seconds.
    pub color_max: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 2000,
            marker: 2,
            color_min: 0.0,
            color_max: 3600.0,
        }
    }
}

/// Extent of the rendered data in degrees.
#[derive(Debug, Clone, Copy)]
struct Extent {
    lon_min: f64,
    lon_max: f64,
    lat_min: f64,
    lat_max: f64,
}

impl Extent {
    fn from_samples(samples: &[Sample]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut extent = Extent {
            lon_min: f64::MAX,
            lon_max: f64::MIN,
            lat_min: f64::MAX,
            lat_max: f64::MIN,
        };
        for sample in samples {
            extent.lon_min = extent.lon_min.min(sample.lon);
            extent.lon_max = extent.lon_max.max(sample.lon);
            extent.lat_min = extent.lat_min.min(sample.lat);
            extent.lat_max = extent.lat_max.max(sample.lat);
        }
        Some(extent)
    }

    fn lon_span(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    fn lat_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }
}

/// Render the retained dataset as a scatter heat-map PNG.
///
/// Longitude/latitude map straight to pixels; the image height is scaled by
/// 1/cos(mid latitude) so a degree covers the same pixel distance on both
/// axes, which is accurate enough at city scale. Row 0 is the northern edge.
pub fn render_heatmap(path: &Path, samples: &[Sample], options: &RenderOptions) -> Result<()> {
    let Some(extent) = Extent::from_samples(samples) else {
        bail!("No points to render");
    };
    if !(options.color_max > options.color_min) {
        bail!(
            "Invalid color range: {}..{}",
            options.color_min,
            options.color_max
        );
    }

    let width = options.width.max(1);
    let height = image_height(&extent, width);

    let mut img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

    for sample in samples {
        let (x, y) = to_pixel(&extent, width, height, sample.lon, sample.lat);
        let t = (sample.time_sec - options.color_min) / (options.color_max - options.color_min);
        let color = turbo(t);

        let x_lo = x.saturating_sub(options.marker);
        let y_lo = y.saturating_sub(options.marker);
        let x_hi = (x + options.marker).min(width - 1);
        let y_hi = (y + options.marker).min(height - 1);
        for py in y_lo..=y_hi {
            for px in x_lo..=x_hi {
                img.put_pixel(px, py, color);
            }
        }
    }

    img.save(path)
        .with_context(|| format!("Failed to write heat-map image: {}", path.display()))?;

    Ok(())
}

fn image_height(extent: &Extent, width: u32) -> u32 {
    let cos_mid = ((extent.lat_min + extent.lat_max) / 2.0).to_radians().cos();
    let lon_span = extent.lon_span().max(f64::EPSILON);
    let aspect = extent.lat_span() / (lon_span * cos_mid.max(0.01));
    ((width as f64 * aspect).round() as u32).max(1)
}

/// Map a coordinate to its pixel, clamped to the image.
fn to_pixel(extent: &Extent, width: u32, height: u32, lon: f64, lat: f64) -> (u32, u32) {
    let fx = (lon - extent.lon_min) / extent.lon_span().max(f64::EPSILON);
    let fy = (lat - extent.lat_min) / extent.lat_span().max(f64::EPSILON);

    let x = (fx * (width - 1) as f64).round();
    // Latitude grows north, pixel rows grow down.
    let y = ((1.0 - fy) * (height - 1) as f64).round();

    (
        (x.max(0.0) as u32).min(width - 1),
        (y.max(0.0) as u32).min(height - 1),
    )
}

/// Polynomial fit of the Turbo colormap, byte scale.
fn turbo(t: f64) -> Rgba<u8> {
    let t = t.clamp(0.0, 1.0);

    let r = 34.61 + t * (1172.33 + t * (-10793.56 + t * (33300.12 + t * (-38394.49 + t * 14825.05))));
    let g = 23.31 + t * (557.33 + t * (1225.33 + t * (-3574.96 + t * (1073.77 + t * 707.56))));
    let b = 27.2 + t * (3211.1 + t * (-15327.97 + t * (27814.0 + t * (-22569.18 + t * 6838.66))));

    Rgba([channel(r), channel(g), channel(b), 255])
}

fn channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_turbo_endpoints() {
        // Dark at the cold end, red-dominant at the hot end, green peak in
        // the middle.
        let Rgba([r0, g0, b0, _]) = turbo(0.0);
        assert!(r0 < 60 && g0 < 60 && b0 < 60);

        let Rgba([r1, g1, b1, _]) = turbo(1.0);
        assert!(r1 > 100);
        assert!(g1 < 50 && b1 < 50);

        let Rgba([r5, g5, b5, _]) = turbo(0.5);
        assert!(g5 > 200);
        assert!(g5 > r5 && g5 > b5);
    }

    #[test]
    fn test_turbo_clamps_out_of_range() {
        assert_eq!(turbo(-1.0), turbo(0.0));
        assert_eq!(turbo(2.0), turbo(1.0));
    }

    #[test]
    fn test_to_pixel_corners() {
        let extent = Extent {
            lon_min: 121.0,
            lon_max: 122.0,
            lat_min: 30.0,
            lat_max: 31.0,
        };

        // South-west corner lands bottom-left, north-east corner top-right.
        assert_eq!(to_pixel(&extent, 100, 50, 121.0, 30.0), (0, 49));
        assert_eq!(to_pixel(&extent, 100, 50, 122.0, 31.0), (99, 0));
        assert_eq!(to_pixel(&extent, 100, 50, 121.5, 30.5), (50, 25));
    }

    #[test]
    fn test_render_writes_png() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.png");

        let samples = vec![
            Sample {
                lon: 121.2,
                lat: 30.8,
                time_sec: 600.0,
            },
            Sample {
                lon: 121.4,
                lat: 31.0,
                time_sec: 3000.0,
            },
        ];

        render_heatmap(&path, &samples, &RenderOptions::default()).unwrap();

        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn test_render_empty_dataset_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.png");

        assert!(render_heatmap(&path, &[], &RenderOptions::default()).is_err());
    }
}
