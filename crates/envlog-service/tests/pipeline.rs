//! End-to-end tests: sensor -> store -> charts and page.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use envlog_core::{SensorReader, SimulatedSensor, SimulatedSensorBuilder};
use envlog_service::render::PAGE_CHARTS;
use envlog_service::{
    DispatchOutcome, OverlapPolicy, Presenter, Renderer, Scheduler, SchedulerSettings,
    SensorLabels,
};
use envlog_store::Store;
use envlog_types::Sample;

const DAY: i64 = 86_400;

fn ramp_sample(i: i64) -> Sample {
    Sample {
        timestamp: i * 30,
        primary_temp_c: 20.0 + (i % 10) as f64 * 0.1,
        pressure_hpa: 1010.0,
        secondary_temp_c: 21.0,
        relative_humidity_pct: 40.0 + (i % 20) as f64,
        // 400 -> 1000 ppm over the day
        co2_ppm: 400 + (i * 600 / 2879) as u32,
    }
}

fn chart_files_exist(dir: &Path) -> bool {
    PAGE_CHARTS.iter().all(|(file, _)| dir.join(file).exists())
}

#[test]
fn full_day_window_renders_every_sample() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("web.db");
    let store = Store::open(&db).unwrap();

    for i in 0..2880 {
        store.append(&ramp_sample(i)).unwrap();
    }

    let samples = store.query_window(86_370, DAY).unwrap();
    assert_eq!(samples.len(), 2880);
    assert!(samples.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    assert_eq!(samples.first().unwrap().co2_ppm, 400);
    assert_eq!(samples.last().unwrap().co2_ppm, 1000);

    let report = Renderer::new(&db, dir.path()).render(86_370, DAY).unwrap();
    assert_eq!(report.samples, 2880);
    assert_eq!(report.chart("img_co2.svg").unwrap().series_points, vec![2880]);
    assert_eq!(
        report.chart("img_temp.svg").unwrap().series_points,
        vec![2880, 2880]
    );
    assert!(chart_files_exist(dir.path()));
}

#[test]
fn empty_window_renders_blank_charts() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("web.db");
    let store = Store::open(&db).unwrap();
    store.append(&ramp_sample(0)).unwrap();

    // Ten days later nothing is inside the window
    let report = Renderer::new(&db, dir.path()).render(10 * DAY, DAY).unwrap();
    assert_eq!(report.samples, 0);
    assert_eq!(report.charts.len(), 6);
    assert!(report
        .charts
        .iter()
        .all(|c| c.series_points.iter().all(|n| *n == 0)));
    assert!(chart_files_exist(dir.path()));
}

#[test]
fn render_reads_while_writer_appends() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("web.db");
    let writer = Store::open(&db).unwrap();
    for i in 0..100 {
        writer.append(&ramp_sample(i)).unwrap();
    }

    let renderer = Renderer::new(&db, dir.path()).size(400, 200);
    let handle = std::thread::spawn(move || renderer.render(199 * 30, DAY));

    for i in 100..200 {
        writer.append(&ramp_sample(i)).unwrap();
    }

    let report = handle.join().unwrap().unwrap();
    // The reader sees a consistent prefix of the log
    assert!(report.samples >= 100);
    assert!(report.samples <= 200);
    assert_eq!(writer.count().unwrap(), 200);
}

#[tokio::test]
async fn ticks_feed_store_page_and_charts() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("web.db");
    let store = Store::open(&db).unwrap();

    let sensor = SimulatedSensorBuilder::new()
        .primary(21.0, 1005.5)
        .secondary(22.0, 55.0, 780)
        .build();
    let control: SimulatedSensor = sensor.clone();

    let settings = SchedulerSettings {
        render_every: 2,
        overlap: OverlapPolicy::Wait,
        ..Default::default()
    };
    let now = Arc::new(AtomicI64::new(1_700_000_000));
    let mut scheduler = Scheduler::new(
        SensorReader::new(sensor),
        store,
        Presenter::page(dir.path(), "Pipeline", SensorLabels::default()),
        Renderer::new(&db, dir.path()).size(400, 200),
        settings,
    )
    .with_clock(move || now.fetch_add(30, Ordering::SeqCst));

    let first = scheduler.tick().await.unwrap();
    assert!(first.stored);
    assert_eq!(first.render, None);

    control.set_secondary(22.0, 55.0, 900);
    let second = scheduler.tick().await.unwrap();
    assert_eq!(second.render, Some(DispatchOutcome::Started));

    // The sensor got the primary pressure after every reading
    assert_eq!(control.calibrations(), vec![1005.5, 1005.5]);

    let page = std::fs::read_to_string(dir.path().join("index.html")).unwrap();
    assert!(page.contains("<title>Pipeline</title>"));
    assert!(page.contains("900 ppm"));
    for (file, _) in PAGE_CHARTS {
        assert!(page.contains(file));
    }

    // Let the render worker finish
    scheduler.run_until(async {}).await.unwrap();
    assert_eq!(scheduler.dispatcher().completed(), 1);
    assert!(chart_files_exist(dir.path()));

    let stored = scheduler
        .store()
        .query_window(1_700_000_030, DAY)
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1].co2_ppm, 900);
}

#[tokio::test]
async fn render_failure_does_not_stop_sampling() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("web.db");
    let store = Store::open(&db).unwrap();

    // Charts go to a directory that does not exist, so every render fails
    let renderer = Renderer::new(&db, dir.path().join("missing"));
    let settings = SchedulerSettings {
        render_every: 1,
        overlap: OverlapPolicy::Wait,
        ..Default::default()
    };
    let now = Arc::new(AtomicI64::new(1_000));
    let mut scheduler = Scheduler::new(
        SensorReader::new(SimulatedSensor::new()),
        store,
        Presenter::page(dir.path(), "Pipeline", SensorLabels::default()),
        renderer,
        settings,
    )
    .with_clock(move || now.fetch_add(30, Ordering::SeqCst));

    for _ in 0..3 {
        let report = scheduler.tick().await.unwrap();
        assert!(report.stored);
    }
    scheduler.run_until(async {}).await.unwrap();

    assert_eq!(scheduler.dispatcher().failed(), 3);
    assert_eq!(scheduler.store().count().unwrap(), 3);
}
