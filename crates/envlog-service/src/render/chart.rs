//! Chart specifications and SVG drawing.

use plotters::prelude::*;

use envlog_types::Sample;

use super::RenderError;
use super::axis::{TimeAxis, clock_label};

const LIGHT_GREEN: RGBColor = RGBColor(144, 238, 144);
const LIGHT_BLUE: RGBColor = RGBColor(173, 216, 230);
const GRID: RGBColor = RGBColor(128, 128, 128);

/// Which value of a sample a series plots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Co2,
    PrimaryTemperature,
    SecondaryTemperature,
    DewPoint,
    Pressure,
    RelativeHumidity,
    AbsoluteHumidity,
}

impl Metric {
    /// Extract this metric from a sample, deriving it if needed.
    pub fn value(self, sample: &Sample) -> f64 {
        match self {
            Metric::Co2 => f64::from(sample.co2_ppm),
            Metric::PrimaryTemperature => sample.primary_temp_c,
            Metric::SecondaryTemperature => sample.secondary_temp_c,
            Metric::DewPoint => sample.derived().dew_point_c,
            Metric::Pressure => sample.pressure_hpa,
            Metric::RelativeHumidity => sample.relative_humidity_pct,
            Metric::AbsoluteHumidity => sample.derived().absolute_humidity,
        }
    }
}

/// One line on a chart.
#[derive(Debug, Clone)]
pub struct SeriesSpec {
    /// Legend text.
    pub label: String,
    pub metric: Metric,
    pub color: RGBColor,
}

/// One chart and the file it is published to.
#[derive(Debug, Clone)]
pub struct ChartSpec {
    /// File name inside the output directory.
    pub file_name: &'static str,
    pub title: &'static str,
    /// Y axis description.
    pub y_desc: String,
    pub series: Vec<SeriesSpec>,
}

impl ChartSpec {
    fn new(file_name: &'static str, title: &'static str, y_desc: String) -> Self {
        Self {
            file_name,
            title,
            y_desc,
            series: Vec::new(),
        }
    }

    fn series(mut self, label: String, metric: Metric, color: RGBColor) -> Self {
        self.series.push(SeriesSpec {
            label,
            metric,
            color,
        });
        self
    }

    /// Points of every series for the given samples.
    pub fn points(&self, samples: &[Sample]) -> Vec<Vec<(i64, f64)>> {
        self.series
            .iter()
            .map(|series| {
                samples
                    .iter()
                    .map(|s| (s.timestamp, series.metric.value(s)))
                    .collect()
            })
            .collect()
    }
}

/// Sensor names used in legends and axis descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorLabels {
    pub primary: String,
    pub secondary: String,
}

impl Default for SensorLabels {
    fn default() -> Self {
        Self {
            primary: "BMP280".to_string(),
            secondary: "SCD41".to_string(),
        }
    }
}

/// The six published charts, in page order of their files.
pub fn chart_specs(labels: &SensorLabels) -> Vec<ChartSpec> {
    let p = labels.primary.to_lowercase();
    let s = labels.secondary.to_lowercase();

    vec![
        ChartSpec::new(
            "img_co2.svg",
            "CO₂ Levels Over Time",
            format!("CO₂ Concentration (ppm, {s})"),
        )
        .series("CO₂ (ppm)".to_string(), Metric::Co2, LIGHT_GREEN),
        ChartSpec::new(
            "img_temp.svg",
            "Temperature Over Time",
            format!("Temperature ({p}, {s})"),
        )
        .series(
            format!("Temperature (°C, {p})"),
            Metric::PrimaryTemperature,
            LIGHT_GREEN,
        )
        .series(
            format!("Temperature (°C, {s})"),
            Metric::SecondaryTemperature,
            LIGHT_BLUE,
        ),
        ChartSpec::new(
            "img_dp.svg",
            "Dew Point Over Time",
            format!("Dew Point ({s})"),
        )
        .series(format!("Dew Point (°C, {s})"), Metric::DewPoint, RED),
        ChartSpec::new(
            "img_pressure.svg",
            "Air Pressure Over Time",
            format!("Pressure (hPa, {p})"),
        )
        .series("Pressure (hPa)".to_string(), Metric::Pressure, YELLOW),
        ChartSpec::new(
            "img_rh.svg",
            "Relative Humidity Over Time",
            format!("Relative Humidity (%, {s})"),
        )
        .series(
            "Relative Humidity (%)".to_string(),
            Metric::RelativeHumidity,
            LIGHT_BLUE,
        ),
        ChartSpec::new(
            "img_ah.svg",
            "Absolute Humidity Over Time",
            format!("Absolute Humidity (g/m³, calculated, {s})"),
        )
        .series(
            "Absolute Humidity (g/m³)".to_string(),
            Metric::AbsoluteHumidity,
            LIGHT_BLUE,
        ),
    ]
}

/// Y range covering all points with a little headroom.
pub fn value_range(points: &[Vec<(i64, f64)>]) -> std::ops::Range<f64> {
    let (min, max) = points
        .iter()
        .flatten()
        .map(|(_, v)| *v)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if min == max {
        return (min - 1.0)..(max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad)..(max + pad)
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

/// Draw one chart as an SVG document.
pub fn draw_svg(
    spec: &ChartSpec,
    points: &[Vec<(i64, f64)>],
    axis: TimeAxis,
    size: (u32, u32),
) -> Result<String, RenderError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&BLACK).map_err(draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(spec.title, ("sans-serif", 22).into_font().color(&WHITE))
            .margin(12)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(axis, value_range(points))
            .map_err(draw_err)?;

        chart
            .configure_mesh()
            .x_labels(24)
            .y_labels(8)
            .x_desc("Time")
            .y_desc(spec.y_desc.as_str())
            .x_label_formatter(&|t: &i64| clock_label(*t))
            .axis_style(&WHITE)
            .label_style(("sans-serif", 13).into_font().color(&WHITE))
            .axis_desc_style(("sans-serif", 14).into_font().color(&WHITE))
            .bold_line_style(&GRID.mix(0.5))
            .light_line_style(&GRID.mix(0.2))
            .draw()
            .map_err(draw_err)?;

        for (series, data) in spec.series.iter().zip(points) {
            let color = series.color;
            chart
                .draw_series(LineSeries::new(data.iter().copied(), color.stroke_width(2)))
                .map_err(draw_err)?
                .label(series.label.as_str())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&BLACK.mix(0.8))
            .border_style(&WHITE)
            .label_font(("sans-serif", 13).into_font().color(&WHITE))
            .draw()
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
    }
    Ok(svg)
}
