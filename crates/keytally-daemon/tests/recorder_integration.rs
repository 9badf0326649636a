//! Integration tests: input source → recorder → JSON stats file.
//!
//! These run the same wiring as `main.rs` against temp directories, with the
//! mock and replay sources standing in for a real keyboard.

use std::path::{Path, PathBuf};
use std::time::Duration;

use keytally_core::{AggregateStore, Category, ReportOptions, StatsReport};
use keytally_daemon::application::record_input::{RecordInputUseCase, Recorder};
use keytally_daemon::infrastructure::input_capture::{
    forward_to_async, mock::MockInputSource, replay::ReplayInputSource, InputSource, RawInputEvent,
};
use keytally_daemon::infrastructure::storage::stats_file::JsonFileStore;

const KEY_C: u32 = 0x06;
const KEY_E: u32 = 0x08;
const KEY_H: u32 = 0x0B;
const KEY_I: u32 = 0x0C;
const KEY_L: u32 = 0x0F;
const KEY_O: u32 = 0x12;
const SPACE: u32 = 0x2C;
const PERIOD: u32 = 0x37;
const LEFT_COMMAND: u32 = 0xE3;

const NEVER: Duration = Duration::from_secs(3600);

fn temp_stats_path() -> (PathBuf, PathBuf) {
    let dir = std::env::temp_dir().join(format!("keytally_it_{}", uuid::Uuid::new_v4()));
    let path = dir.join("stats.json");
    (dir, path)
}

/// Runs one daemon "session" over the mock source and returns once input ends.
async fn record_session(stats_path: &Path, script: impl FnOnce(&MockInputSource)) {
    let source = MockInputSource::new();
    let events = forward_to_async(source.start().unwrap(), 64).unwrap();
    let (recorder, _handle) = Recorder::new(
        RecordInputUseCase::new(JsonFileStore::new(stats_path)),
        NEVER,
    );
    let task = tokio::spawn(recorder.run(events));

    script(&source);
    source.stop();

    tokio_test::assert_ok!(task.await.unwrap());
}

#[tokio::test]
async fn test_session_is_persisted_at_end_of_input() {
    // Arrange
    let (dir, path) = temp_stats_path();

    // Act: "Hi." then a click
    record_session(&path, |source| {
        source.tap_key(KEY_H);
        source.tap_key(KEY_I);
        source.tap_key(PERIOD);
        source.click();
    })
    .await;

    // Assert
    let agg = JsonFileStore::new(&path).load().unwrap();
    assert_eq!(agg.count(Category::Words, "hi"), 1);
    assert_eq!(agg.keys.values().sum::<u64>(), 3);
    assert_eq!(agg.clicks, 1);
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_restarts_accumulate_in_the_same_file() {
    // Arrange
    let (dir, path) = temp_stats_path();
    let hello = |source: &MockInputSource| {
        for code in [KEY_H, KEY_E, KEY_L, KEY_L, KEY_O, SPACE] {
            source.tap_key(code);
        }
    };

    // Act
    record_session(&path, hello).await;
    record_session(&path, hello).await;

    // Assert
    let agg = JsonFileStore::new(&path).load().unwrap();
    assert_eq!(agg.count(Category::Words, "hello"), 2);
    assert_eq!(agg.count(Category::Keys, "d: l"), 4);
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_shortcut_session_feeds_the_report() {
    let (dir, path) = temp_stats_path();

    record_session(&path, |source| {
        source.inject_event(RawInputEvent::Key { code: LEFT_COMMAND, pressed: true });
        source.tap_key(KEY_C);
        source.tap_key(KEY_C);
        source.inject_event(RawInputEvent::Key { code: LEFT_COMMAND, pressed: false });
    })
    .await;

    let agg = JsonFileStore::new(&path).load().unwrap();
    let report = StatsReport::build(&agg, ReportOptions::default());
    assert_eq!(report.commands.len(), 1);
    assert_eq!(report.commands[0].label, "⌘C");
    assert_eq!(report.commands[0].count, 2);
    assert!(report.words.is_empty());
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_replay_file_end_to_end() {
    // Arrange
    let (dir, path) = temp_stats_path();
    std::fs::create_dir_all(&dir).unwrap();
    let log = dir.join("session.log");
    std::fs::write(
        &log,
        "# cat, then an out-of-range usage and a bad line\n\
         key 0x06 down\nkey 0x06 up\n\
         key 0x04 down\nkey 0x04 up\n\
         key 0x17 down\nkey 0x17 up\n\
         key 0x01 down\n\
         bogus line\n\
         click\nbutton up\n",
    )
    .unwrap();
    let source = ReplayInputSource::from_path(&log);
    let events = forward_to_async(source.start().unwrap(), 8).unwrap();
    let (recorder, _handle) =
        Recorder::new(RecordInputUseCase::new(JsonFileStore::new(&path)), NEVER);

    // Act
    let summary = recorder.run(events).await.unwrap();

    // Assert
    assert_eq!(summary.events, 8);
    let agg = JsonFileStore::new(&path).load().unwrap();
    assert_eq!(agg.count(Category::Words, "cat"), 1);
    assert_eq!(agg.clicks, 1);
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_flush_handle_persists_before_input_ends() {
    // Arrange
    let (dir, path) = temp_stats_path();
    let source = MockInputSource::new();
    let events = forward_to_async(source.start().unwrap(), 64).unwrap();
    let (recorder, handle) =
        Recorder::new(RecordInputUseCase::new(JsonFileStore::new(&path)), NEVER);
    let task = tokio::spawn(recorder.run(events));

    // Act
    source.click();
    let mut clicks = 0;
    for _ in 0..100 {
        handle.flush().await.unwrap();
        clicks = JsonFileStore::new(&path).load().unwrap().clicks;
        if clicks > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // Assert
    assert_eq!(clicks, 1);
    handle.shutdown().await.unwrap();
    task.await.unwrap().unwrap();
    std::fs::remove_dir_all(&dir).ok();
}
