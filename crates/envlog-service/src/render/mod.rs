//! Trailing-window chart rendering.
//!
//! A [`Renderer`] reads one window from the store, derives the chart
//! series and publishes six SVG files into the output directory. Each file
//! is drawn in memory and published with [`write_atomic`], so a failure
//! halfway through leaves the previous charts in place.
//!
//! Rendering is synchronous and CPU-bound; the scheduler runs it on the
//! blocking pool through [`RenderDispatcher`](crate::RenderDispatcher).

mod axis;
mod chart;

use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info};

use envlog_store::Store;
use envlog_types::Sample;

use crate::publish::write_atomic;

pub use axis::{MAJOR_STEP, MINOR_STEP, TimeAxis, clock_label};
pub use chart::{ChartSpec, Metric, SensorLabels, SeriesSpec, chart_specs};

/// Chart file names, in the order the page shows them.
pub const PAGE_CHARTS: [(&str, &str); 6] = [
    ("img_co2.svg", "CO₂ Levels Over Time"),
    ("img_temp.svg", "Temperature Over Time"),
    ("img_rh.svg", "Relative Humidity Over Time"),
    ("img_ah.svg", "Absolute Humidity Over Time"),
    ("img_pressure.svg", "Air Pressure Over Time"),
    ("img_dp.svg", "Dew Point Over Time"),
];

/// Rendering errors.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to read samples: {0}")]
    Store(#[from] envlog_store::Error),
    #[error("Failed to draw chart: {0}")]
    Draw(String),
    #[error("Failed to publish {path}: {source}")]
    Publish {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One published chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedChart {
    pub path: PathBuf,
    /// Number of points in each series, in legend order.
    pub series_points: Vec<usize>,
}

/// Outcome of a successful render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderReport {
    /// End of the rendered window.
    pub now: i64,
    /// Number of samples in the window.
    pub samples: usize,
    pub charts: Vec<RenderedChart>,
}

impl RenderReport {
    /// The chart published under `file_name`, if any.
    pub fn chart(&self, file_name: &str) -> Option<&RenderedChart> {
        self.charts
            .iter()
            .find(|c| c.path.file_name().is_some_and(|n| n == file_name))
    }
}

/// Renders trailing-window charts from a database into a directory.
#[derive(Debug, Clone)]
pub struct Renderer {
    db_path: PathBuf,
    output_dir: PathBuf,
    size: (u32, u32),
    labels: SensorLabels,
}

impl Renderer {
    /// Create a renderer with the default chart size (1000×500).
    pub fn new(db_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            output_dir: output_dir.into(),
            size: (1000, 500),
            labels: SensorLabels::default(),
        }
    }

    /// Set the chart size in pixels.
    #[must_use]
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    /// Set the sensor names used in legends.
    #[must_use]
    pub fn labels(mut self, labels: SensorLabels) -> Self {
        self.labels = labels;
        self
    }

    /// Render the window `(now - window_seconds, now]`.
    ///
    /// Opens its own read-only connection so it can run next to the
    /// sampling loop's writer.
    pub fn render(&self, now: i64, window_seconds: i64) -> Result<RenderReport, RenderError> {
        let store = Store::open_read_only(&self.db_path)?;
        let samples = store.query_window(now, window_seconds)?;
        self.render_samples(&samples, now, window_seconds)
    }

    /// Render already-queried samples.
    pub fn render_samples(
        &self,
        samples: &[Sample],
        now: i64,
        window_seconds: i64,
    ) -> Result<RenderReport, RenderError> {
        let started = Instant::now();
        let axis = TimeAxis::trailing(now, window_seconds);
        let mut charts = Vec::new();

        for spec in chart_specs(&self.labels) {
            let points = spec.points(samples);
            let svg = chart::draw_svg(&spec, &points, axis, self.size)?;

            let path = self.output_dir.join(spec.file_name);
            write_atomic(&path, svg.as_bytes()).map_err(|e| RenderError::Publish {
                path: path.clone(),
                source: e,
            })?;
            debug!("Published {}", path.display());

            charts.push(RenderedChart {
                path,
                series_points: points.iter().map(Vec::len).collect(),
            });
        }

        info!(
            "Rendered {} charts from {} samples in {:?}",
            charts.len(),
            samples.len(),
            started.elapsed()
        );

        Ok(RenderReport {
            now,
            samples: samples.len(),
            charts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(timestamp: i64) -> Sample {
        Sample {
            timestamp,
            primary_temp_c: 21.0,
            pressure_hpa: 1012.0,
            secondary_temp_c: 20.0,
            relative_humidity_pct: 50.0,
            co2_ppm: 600,
        }
    }

    #[test]
    fn test_page_charts_match_rendered_files() {
        let mut rendered: Vec<_> = chart_specs(&SensorLabels::default())
            .iter()
            .map(|s| s.file_name)
            .collect();
        let mut page: Vec<_> = PAGE_CHARTS.iter().map(|(f, _)| *f).collect();
        rendered.sort_unstable();
        page.sort_unstable();
        assert_eq!(rendered, page);
    }

    #[test]
    fn test_render_empty_window() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("web.db");
        Store::open(&db).unwrap();

        let renderer = Renderer::new(&db, dir.path());
        let report = renderer.render(1_700_000_000, 86_400).unwrap();

        assert_eq!(report.samples, 0);
        assert_eq!(report.charts.len(), 6);
        for (file, _) in PAGE_CHARTS {
            assert!(dir.path().join(file).exists(), "{file} missing");
        }
    }

    #[test]
    fn test_render_counts_points() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("web.db");
        let store = Store::open(&db).unwrap();
        for i in 0..20 {
            store.append(&sample(1000 + i * 30)).unwrap();
        }
        // Outside the window
        store.append(&sample(10)).unwrap();

        let report = Renderer::new(&db, dir.path())
            .size(400, 200)
            .render(1000 + 19 * 30, 3600)
            .unwrap();

        assert_eq!(report.samples, 20);
        assert_eq!(report.chart("img_co2.svg").unwrap().series_points, vec![20]);
        assert_eq!(
            report.chart("img_temp.svg").unwrap().series_points,
            vec![20, 20]
        );
    }

    #[test]
    fn test_render_missing_database() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Renderer::new(dir.path().join("absent.db"), dir.path());
        assert!(matches!(
            renderer.render(0, 86_400),
            Err(RenderError::Store(_))
        ));
    }

    #[test]
    fn test_render_missing_output_dir_keeps_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("missing");
        let renderer = Renderer::new(dir.path().join("unused.db"), &out);

        let result = renderer.render_samples(&[sample(1)], 1, 60);
        assert!(matches!(result, Err(RenderError::Publish { .. })));
        assert!(!out.exists());
    }
}
