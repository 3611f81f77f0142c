//! Human-readable snapshot of the latest sample.
//!
//! The snapshot goes either to a terminal stream or into `index.html` in
//! the output directory, next to the charts it references. Page writes use
//! [`write_atomic`], so a browser never loads half a page.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, TimeZone};

use envlog_types::Sample;

use crate::publish::write_atomic;
use crate::render::{PAGE_CHARTS, SensorLabels};

/// Page file name inside the output directory.
pub const PAGE_FILE: &str = "index.html";

/// Presentation errors.
#[derive(Debug, thiserror::Error)]
pub enum PresentError {
    #[error("Failed to write snapshot to terminal: {0}")]
    Terminal(#[source] io::Error),
    #[error("Failed to publish {path}: {source}")]
    Page {
        path: PathBuf,
        source: io::Error,
    },
}

enum Sink {
    Terminal(Box<dyn Write + Send>),
    Page { path: PathBuf, title: String },
}

/// Writes the snapshot for each new sample, replacing the previous one.
pub struct Presenter {
    sink: Sink,
    labels: SensorLabels,
    size: (u32, u32),
}

impl std::fmt::Debug for Presenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sink = match &self.sink {
            Sink::Terminal(_) => "terminal".to_string(),
            Sink::Page { path, .. } => path.display().to_string(),
        };
        f.debug_struct("Presenter")
            .field("sink", &sink)
            .field("labels", &self.labels)
            .finish()
    }
}

impl Presenter {
    /// Print snapshots to stdout.
    pub fn terminal(labels: SensorLabels) -> Self {
        Self::terminal_to(Box::new(io::stdout()), labels)
    }

    /// Print snapshots to any writer.
    pub fn terminal_to(writer: Box<dyn Write + Send>, labels: SensorLabels) -> Self {
        Self {
            sink: Sink::Terminal(writer),
            labels,
            size: (1000, 500),
        }
    }

    /// Publish snapshots as `index.html` in `dir`.
    pub fn page(dir: &Path, title: impl Into<String>, labels: SensorLabels) -> Self {
        Self {
            sink: Sink::Page {
                path: dir.join(PAGE_FILE),
                title: title.into(),
            },
            labels,
            size: (1000, 500),
        }
    }

    /// Size the page's chart images are displayed at.
    #[must_use]
    pub fn chart_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    /// Write the snapshot for `sample`.
    pub fn emit(&mut self, sample: &Sample) -> Result<(), PresentError> {
        let lines = snapshot_lines(sample, &self.labels);
        match &mut self.sink {
            Sink::Terminal(out) => {
                let mut text = lines.join("\n");
                text.push('\n');
                out.write_all(text.as_bytes())
                    .and_then(|()| out.flush())
                    .map_err(PresentError::Terminal)
            }
            Sink::Page { path, title } => {
                let html = render_page(title, &lines, self.size);
                write_atomic(path, html.as_bytes()).map_err(|e| PresentError::Page {
                    path: path.clone(),
                    source: e,
                })
            }
        }
    }
}

/// The snapshot text, one entry per line.
///
/// Seven readings followed by a separator carrying the local sample time.
pub fn snapshot_lines(sample: &Sample, labels: &SensorLabels) -> Vec<String> {
    let derived = sample.derived();
    let width = labels.primary.chars().count().max(labels.secondary.chars().count());
    let p = format!("{:<width$}", labels.primary);
    let s = format!("{:<width$}", labels.secondary);

    vec![
        format!("{p}: Temperature......... {:.2} °C", sample.primary_temp_c),
        format!("{p}: Pressure............ {:.2} hPa", sample.pressure_hpa),
        format!("{s}: Temperature......... {:.2} °C", sample.secondary_temp_c),
        format!(
            "{s}: Relative Humidity... {:.2} %",
            sample.relative_humidity_pct
        ),
        format!(
            "{s}: Absolute Humidity... {:.2} g/m³",
            derived.absolute_humidity
        ),
        format!("{s}: Dew Point........... {:.2} °C", derived.dew_point_c),
        format!("{s}: CO2................. {} ppm", sample.co2_ppm),
        format!("--- {} {}", local_datetime(sample.timestamp), "-".repeat(16)),
    ]
}

fn local_datetime(timestamp: i64) -> String {
    match Local.timestamp_opt(timestamp, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => timestamp.to_string(),
    }
}

/// The full status page: header, snapshot, chart footer.
pub fn render_page(title: &str, lines: &[String], size: (u32, u32)) -> String {
    let title = escape_html(title);
    let mut html = String::new();

    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{
    color: white;
    background-color: black;
    margin: auto 0.2em;
    font-size: 3.2em;
    font-family: Tahoma, Verdana, Arial, sans-serif;
}}
img {{
    max-width: 100%;
    height: auto;
}}
</style>
</head>
<body>
<h3>{title}</h3>
"#
    );

    for line in lines {
        let _ = writeln!(html, "<p><tt>{}</tt></p>", escape_html(line));
    }

    html.push('\n');
    let (width, height) = size;
    for (file, alt) in PAGE_CHARTS {
        let _ = writeln!(
            html,
            r#"<img src="{file}" alt="{alt}" width="{width}" height="{height}">"#
        );
    }
    html.push_str("</body></html>\n");
    html
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn sample() -> Sample {
        Sample {
            timestamp: 1_700_000_000,
            primary_temp_c: 21.5,
            pressure_hpa: 1013.25,
            secondary_temp_c: 20.0,
            relative_humidity_pct: 50.0,
            co2_ppm: 812,
        }
    }

    #[test]
    fn test_snapshot_lines() {
        let lines = snapshot_lines(&sample(), &SensorLabels::default());

        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "BMP280: Temperature......... 21.50 °C");
        assert_eq!(lines[1], "BMP280: Pressure............ 1013.25 hPa");
        assert_eq!(lines[2], "SCD41 : Temperature......... 20.00 °C");
        assert_eq!(lines[3], "SCD41 : Relative Humidity... 50.00 %");
        assert!(lines[4].starts_with("SCD41 : Absolute Humidity... 8.6"));
        assert!(lines[4].ends_with(" g/m³"));
        assert_eq!(lines[5], "SCD41 : Dew Point........... 9.26 °C");
        assert_eq!(lines[6], "SCD41 : CO2................. 812 ppm");
        assert!(lines[7].starts_with("--- "));
        assert!(lines[7].ends_with(" ----------------"));
    }

    #[test]
    fn test_separator_is_local_time() {
        let lines = snapshot_lines(&sample(), &SensorLabels::default());
        let expected = Local
            .timestamp_opt(1_700_000_000, 0)
            .unwrap()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        assert_eq!(lines[7], format!("--- {expected} ----------------"));
    }

    #[test]
    fn test_terminal_emit() {
        let buf = SharedBuf::default();
        let mut presenter = Presenter::terminal_to(Box::new(buf.clone()), SensorLabels::default());

        presenter.emit(&sample()).unwrap();
        let out = buf.contents();
        assert_eq!(out.lines().count(), 8);
        assert!(out.contains("CO2................. 812 ppm"));
    }

    #[test]
    fn test_page_emit_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let mut presenter = Presenter::page(dir.path(), "Home", SensorLabels::default());

        presenter.emit(&sample()).unwrap();
        let mut next = sample();
        next.co2_ppm = 999;
        presenter.emit(&next).unwrap();

        let html = std::fs::read_to_string(dir.path().join(PAGE_FILE)).unwrap();
        assert!(html.contains("999 ppm"));
        assert!(!html.contains("812 ppm"));
    }

    #[test]
    fn test_page_layout() {
        let lines = snapshot_lines(&sample(), &SensorLabels::default());
        let html = render_page("Home", &lines, (1000, 500));

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Home</title>"));
        assert_eq!(html.matches("<p><tt>").count(), 8);
        assert_eq!(html.matches("<img ").count(), 6);
        assert!(html.contains(r#"<img src="img_co2.svg" alt="CO₂ Levels Over Time" width="1000" height="500">"#));

        // Snapshot comes before the charts
        let last_line = html.rfind("<p><tt>").unwrap();
        let first_img = html.find("<img ").unwrap();
        assert!(last_line < first_img);
        assert!(html.trim_end().ends_with("</body></html>"));
    }

    #[test]
    fn test_title_is_escaped() {
        let html = render_page("<script>x</script> & co", &[], (1000, 500));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt; &amp; co"));
    }

    #[test]
    fn test_page_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut presenter = Presenter::page(
            &dir.path().join("missing"),
            "Home",
            SensorLabels::default(),
        );
        assert!(matches!(
            presenter.emit(&sample()),
            Err(PresentError::Page { .. })
        ));
    }
}
