//! Integration tests for the scenario builder over on-disk monthly files.
//!
//! Tests:
//! 1. Concatenation: N monthly files give one sorted series
//! 2. Window boundaries: warm-up, start clamping, inclusive end
//! 3. Configuration errors: empty folder, invalid broker settings
//! 4. Broker configuration of the returned engine

use chrono::{Duration, NaiveDate, NaiveDateTime};
use klinelab_core::data::monthly::write_monthly_csv;
use klinelab_core::data::synthetic::generate_minute_bars;
use klinelab_core::data::{DataError, PriceSeries};
use klinelab_core::{build_engine, load_slice, ScenarioError, ScenarioParams};
use std::fs;
use std::path::Path;

fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

/// Jan file: the 1440 minutes of 2021-01-31. Feb file: 1344 minutes from 2021-02-01.
fn write_jan_feb(folder: &Path) {
    let jan = generate_minute_bars("jan", dt(2021, 1, 31, 0, 0), 1440);
    let feb = generate_minute_bars("feb", dt(2021, 2, 1, 0, 0), 1344);
    write_monthly_csv(&folder.join("2021_01.csv"), &jan).unwrap();
    write_monthly_csv(&folder.join("2021_02.csv"), &feb).unwrap();
}

#[test]
fn jan_feb_with_sixty_bar_warmup() {
    let dir = tempfile::tempdir().unwrap();
    write_jan_feb(dir.path());

    let params = ScenarioParams::new(dt(2021, 2, 1, 0, 0)).with_warmup_bars(60);
    let engine = build_engine(dir.path(), &params).unwrap();
    let feed = engine.feed().unwrap();

    assert_eq!(feed.first(), Some(dt(2021, 1, 31, 23, 0)));
    // 1344 minutes after midnight is 22:24, so the last bar opens at 22:23.
    assert_eq!(feed.last(), Some(dt(2021, 2, 1, 22, 23)));
    assert_eq!(feed.len(), 60 + 1344);
    assert_eq!(feed.warmup_len(), 60);
    assert_eq!(feed.live_start(), Some(dt(2021, 2, 1, 0, 0)));
    assert_eq!(feed.from_date, dt(2021, 2, 1, 0, 0));
    assert_eq!(feed.to_date, None);
}

#[test]
fn header_only_month_contributes_no_bars() {
    let dir = tempfile::tempdir().unwrap();
    write_jan_feb(dir.path());
    fs::write(
        dir.path().join("2021_03.csv"),
        "datetime,open,high,low,close,volume,openinterest\n",
    )
    .unwrap();

    let params = ScenarioParams::new(dt(2021, 2, 1, 0, 0)).with_warmup_bars(60);
    let feed = load_slice(dir.path(), &params).unwrap();
    assert_eq!(feed.first(), Some(dt(2021, 1, 31, 23, 0)));
    assert_eq!(feed.last(), Some(dt(2021, 2, 1, 22, 23)));
    assert_eq!(feed.len(), 60 + 1344);
}

#[test]
fn series_length_is_sum_of_file_rows() {
    let dir = tempfile::tempdir().unwrap();
    write_jan_feb(dir.path());

    let series = PriceSeries::load(dir.path()).unwrap();
    assert_eq!(series.len(), 1440 + 1344);
    assert_eq!(series.files().len(), 2);
    assert!(series.timestamps().windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn file_order_does_not_matter_for_sorting() {
    let dir = tempfile::tempdir().unwrap();
    // Later month in the lexicographically first file.
    let feb = generate_minute_bars("feb", dt(2021, 2, 1, 0, 0), 10);
    let jan = generate_minute_bars("jan", dt(2021, 1, 31, 23, 50), 10);
    write_monthly_csv(&dir.path().join("a.csv"), &feb).unwrap();
    write_monthly_csv(&dir.path().join("b.csv"), &jan).unwrap();

    let series = PriceSeries::load(dir.path()).unwrap();
    assert_eq!(series.timestamps()[0], dt(2021, 1, 31, 23, 50));
    assert!(series.timestamps().windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn zero_warmup_starts_at_boundary_bar() {
    let dir = tempfile::tempdir().unwrap();
    write_jan_feb(dir.path());

    // 12:00:30 is between bars; the first bar at-or-after it is 12:01.
    let start = dt(2021, 1, 31, 12, 0) + Duration::seconds(30);
    let feed = load_slice(dir.path(), &ScenarioParams::new(start)).unwrap();
    assert_eq!(feed.first(), Some(dt(2021, 1, 31, 12, 1)));
    assert_eq!(feed.warmup_len(), 0);
}

#[test]
fn warmup_exactly_k_bars_before_boundary() {
    let dir = tempfile::tempdir().unwrap();
    write_jan_feb(dir.path());

    let params = ScenarioParams::new(dt(2021, 1, 31, 12, 0)).with_warmup_bars(15);
    let feed = load_slice(dir.path(), &params).unwrap();
    assert_eq!(feed.first(), Some(dt(2021, 1, 31, 11, 45)));
    assert_eq!(feed.warmup_len(), 15);
}

#[test]
fn warmup_clamps_to_series_start() {
    let dir = tempfile::tempdir().unwrap();
    write_jan_feb(dir.path());

    let params = ScenarioParams::new(dt(2021, 1, 31, 0, 10)).with_warmup_bars(600);
    let feed = load_slice(dir.path(), &params).unwrap();
    assert_eq!(feed.first(), Some(dt(2021, 1, 31, 0, 0)));
    assert_eq!(feed.warmup_len(), 10);
}

#[test]
fn start_before_all_data_keeps_everything() {
    let dir = tempfile::tempdir().unwrap();
    write_jan_feb(dir.path());

    let params = ScenarioParams::new(dt(2020, 1, 1, 0, 0)).with_warmup_bars(5);
    let feed = load_slice(dir.path(), &params).unwrap();
    assert_eq!(feed.len(), 1440 + 1344);
    assert_eq!(feed.warmup_len(), 0);
}

#[test]
fn end_on_existing_bar_is_inclusive() {
    let dir = tempfile::tempdir().unwrap();
    write_jan_feb(dir.path());

    let params = ScenarioParams::new(dt(2021, 2, 1, 0, 0)).with_end_date(dt(2021, 2, 1, 1, 0));
    let feed = load_slice(dir.path(), &params).unwrap();
    assert_eq!(feed.last(), Some(dt(2021, 2, 1, 1, 0)));
    assert_eq!(feed.len(), 61);
    assert_eq!(feed.to_date, Some(dt(2021, 2, 1, 1, 0)));
}

#[test]
fn end_after_all_data_keeps_series_end() {
    let dir = tempfile::tempdir().unwrap();
    write_jan_feb(dir.path());

    let params = ScenarioParams::new(dt(2021, 2, 1, 0, 0)).with_end_date(dt(2030, 1, 1, 0, 0));
    let feed = load_slice(dir.path(), &params).unwrap();
    assert_eq!(feed.last(), Some(dt(2021, 2, 1, 22, 23)));
}

#[test]
fn end_before_start_gives_empty_feed() {
    let dir = tempfile::tempdir().unwrap();
    write_jan_feb(dir.path());

    let params = ScenarioParams::new(dt(2021, 2, 1, 0, 0)).with_end_date(dt(2021, 1, 1, 0, 0));
    let feed = load_slice(dir.path(), &params).unwrap();
    assert!(feed.is_empty());
}

#[test]
fn empty_folder_is_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("notes.txt"), "not a csv").unwrap();

    let err = build_engine(dir.path(), &ScenarioParams::new(dt(2021, 2, 1, 0, 0)))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        ScenarioError::Data(DataError::NoCsvFiles { .. })
    ));
}

#[test]
fn missing_folder_is_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = build_engine(
        &dir.path().join("does-not-exist"),
        &ScenarioParams::new(dt(2021, 2, 1, 0, 0)),
    )
    .err()
    .unwrap();
    assert!(matches!(
        err,
        ScenarioError::Data(DataError::NoCsvFiles { .. })
    ));
}

#[test]
fn invalid_cash_rejected_before_loading() {
    let dir = tempfile::tempdir().unwrap();
    let params = ScenarioParams::new(dt(2021, 2, 1, 0, 0)).with_initial_cash(0.0);
    // Folder is empty; the parameter check fires first.
    assert!(matches!(
        build_engine(dir.path(), &params),
        Err(ScenarioError::InvalidParams(_))
    ));
}

#[test]
fn broker_configured_from_params() {
    let dir = tempfile::tempdir().unwrap();
    write_jan_feb(dir.path());

    let default_engine =
        build_engine(dir.path(), &ScenarioParams::new(dt(2021, 2, 1, 0, 0))).unwrap();
    assert_eq!(default_engine.broker().cash(), 100.0);
    assert_eq!(default_engine.broker().commission().rate, 0.001);

    let params = ScenarioParams::new(dt(2021, 2, 1, 0, 0))
        .with_initial_cash(2500.0)
        .with_commission_rate(0.0004);
    let engine = build_engine(dir.path(), &params).unwrap();
    assert_eq!(engine.broker().cash(), 2500.0);
    assert_eq!(engine.broker().commission().rate, 0.0004);
    assert_eq!(engine.feeds().len(), 1);
    assert_eq!(engine.strategy_count(), 0);
}

#[test]
fn capitalised_headers_are_renamed() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("2021_02.csv"),
        "Date,Open,High,Low,Close,Volume\n\
         2021-02-01 00:00:00,0.5,0.51,0.49,0.505,1000\n\
         2021-02-01 00:01:00,0.505,0.52,0.50,0.515,1200\n",
    )
    .unwrap();

    let feed = load_slice(dir.path(), &ScenarioParams::new(dt(2021, 2, 1, 0, 0))).unwrap();
    assert_eq!(feed.len(), 2);
    assert_eq!(feed.bars()[1].close, 0.515);
    assert_eq!(feed.bars()[1].volume, 1200.0);
}

#[test]
fn overlapping_files_keep_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let bars = generate_minute_bars("dup", dt(2021, 2, 1, 0, 0), 5);
    write_monthly_csv(&dir.path().join("a.csv"), &bars).unwrap();
    write_monthly_csv(&dir.path().join("b.csv"), &bars[3..]).unwrap();

    let series = PriceSeries::load(dir.path()).unwrap();
    assert_eq!(series.len(), 7);
    assert_eq!(series.timestamps()[3], series.timestamps()[4]);
}

#[test]
fn repeated_builds_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    write_jan_feb(dir.path());
    let params = ScenarioParams::new(dt(2021, 2, 1, 0, 0)).with_warmup_bars(60);

    let a = build_engine(dir.path(), &params).unwrap();
    let b = build_engine(dir.path(), &params).unwrap();
    assert_eq!(
        a.feed().unwrap().fingerprint(),
        b.feed().unwrap().fingerprint()
    );
}
