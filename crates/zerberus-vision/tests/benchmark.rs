mod common;

use common::SyntheticCamera;
use std::cell::Cell;
use std::io::Cursor;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tempfile::tempdir;
use zerberus_camera::{CameraConfig, ExposureProfile};
use zerberus_vision::benchmark::{self, BenchConfig};
use zerberus_vision::{Shutdown, VisionError};

fn config(dir: &std::path::Path) -> BenchConfig {
    BenchConfig {
        image_dir: dir.to_path_buf(),
        interval: Duration::ZERO,
        ..Default::default()
    }
}

#[test]
fn non_numeric_count_fails_before_camera() {
    let tmp = tempdir().unwrap();
    let opened = Cell::new(false);
    let open = |_: &CameraConfig| -> zerberus_camera::Result<SyntheticCamera> {
        opened.set(true);
        Ok(SyntheticCamera::endless().0)
    };

    let err = benchmark::run(open, &config(tmp.path()), &mut Cursor::new("abc\n"), &Shutdown::new(), &mut Vec::new())
        .unwrap_err();

    assert!(matches!(err, VisionError::Config(_)), "{err}");
    assert!(!opened.get());
}

#[test]
fn zero_pictures_is_immediate() {
    let tmp = tempdir().unwrap();
    let opened = Cell::new(false);
    let open = |_: &CameraConfig| -> zerberus_camera::Result<SyntheticCamera> {
        opened.set(true);
        Ok(SyntheticCamera::endless().0)
    };
    let mut out = Vec::new();

    let report = benchmark::run(open, &config(tmp.path()), &mut Cursor::new("0\n"), &Shutdown::new(), &mut out)
        .unwrap();

    assert_eq!(report.requested, 0);
    assert_eq!(report.captured, 0);
    assert!(report.elapsed < Duration::from_millis(100));
    assert!(!opened.get());
    assert!(String::from_utf8(out).unwrap().contains("0  pictures:  "));
}

#[test]
fn five_instant_pictures() {
    let tmp = tempdir().unwrap();
    let (cam, released) = SyntheticCamera::endless();
    let seen = Cell::new(None);
    let open = |cfg: &CameraConfig| -> zerberus_camera::Result<SyntheticCamera> {
        seen.set(Some((cfg.vflip, cfg.exposure)));
        Ok(cam)
    };
    let mut out = Vec::new();

    let report = benchmark::run(open, &config(tmp.path()), &mut Cursor::new("5\n"), &Shutdown::new(), &mut out)
        .unwrap();

    assert_eq!(report.requested, 5);
    assert_eq!(report.captured, 5);
    assert!(report.elapsed < Duration::from_secs(1));
    assert_eq!(seen.get(), Some((true, ExposureProfile::Night)));
    assert!(released.load(Ordering::SeqCst));

    let mut names: Vec<String> = std::fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, ["000.jpg", "001.jpg", "002.jpg", "003.jpg", "004.jpg"]);

    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("Number of images to takeTaking a 5 pictures to time how long it takes\n"));
    assert!(text.contains("5  pictures:  "));
}

#[test]
fn startup_clears_old_pictures() {
    let tmp = tempdir().unwrap();
    std::fs::write(tmp.path().join("017.jpg"), b"stale").unwrap();
    std::fs::write(tmp.path().join("notes.txt"), b"stale").unwrap();
    let cfg = BenchConfig { count: Some(1), ..config(tmp.path()) };

    let report = benchmark::run(|_: &CameraConfig| Ok(SyntheticCamera::endless().0), &cfg, &mut Cursor::new(""), &Shutdown::new(), &mut Vec::new())
        .unwrap();

    assert_eq!(report.cleanup.removed, 2);
    assert!(!tmp.path().join("017.jpg").exists());
    assert!(tmp.path().join("000.jpg").exists());
}

#[test]
fn failed_capture_aborts_run() {
    let tmp = tempdir().unwrap();
    let (cam, released) = SyntheticCamera::with_frames(Some(2));
    let cfg = BenchConfig { count: Some(5), ..config(tmp.path()) };

    let err = benchmark::run(|_: &CameraConfig| Ok(cam), &cfg, &mut Cursor::new(""), &Shutdown::new(), &mut Vec::new())
        .unwrap_err();

    assert!(matches!(err, VisionError::Capture(_)), "{err}");
    assert!(released.load(Ordering::SeqCst));
}

#[test]
fn device_open_failure_is_device_error() {
    let tmp = tempdir().unwrap();
    let cfg = BenchConfig { count: Some(3), ..config(tmp.path()) };
    let open = |_: &CameraConfig| -> zerberus_camera::Result<SyntheticCamera> {
        Err(zerberus_camera::CameraError::AppSinkNotFound)
    };

    let err = benchmark::run(open, &cfg, &mut Cursor::new(""), &Shutdown::new(), &mut Vec::new()).unwrap_err();
    assert!(matches!(err, VisionError::Device(_)));
}

#[test]
fn interrupt_at_prompt_never_reports_a_batch() {
    let tmp = tempdir().unwrap();
    let shutdown = Shutdown::new();
    shutdown.trigger();
    let opened = Cell::new(false);
    let open = |_: &CameraConfig| -> zerberus_camera::Result<SyntheticCamera> {
        opened.set(true);
        Ok(SyntheticCamera::endless().0)
    };
    let mut out = Vec::new();

    let err = benchmark::run(open, &config(tmp.path()), &mut Cursor::new("3\n"), &shutdown, &mut out).unwrap_err();

    assert!(matches!(err, VisionError::Interrupted(_)), "{err}");
    assert!(!opened.get());
    assert!(!String::from_utf8(out).unwrap().contains("pictures:"));
}

#[test]
fn shutdown_mid_batch_reports_pictures_taken() {
    let tmp = tempdir().unwrap();
    let shutdown = Shutdown::new();
    let cfg = BenchConfig { count: Some(3), ..config(tmp.path()) };
    let (cam, released) = SyntheticCamera::endless();
    let open = |_: &CameraConfig| -> zerberus_camera::Result<SyntheticCamera> {
        shutdown.trigger();
        Ok(cam)
    };
    let mut out = Vec::new();

    let report = benchmark::run(open, &cfg, &mut Cursor::new(""), &shutdown, &mut out).unwrap();

    assert_eq!(report.requested, 3);
    assert_eq!(report.captured, 0);
    assert!(released.load(Ordering::SeqCst));
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("\n0  pictures:  "), "{text}");
    assert!(!text.contains("3  pictures:"), "{text}");
}

#[test]
fn interval_throttles_each_capture() {
    let tmp = tempdir().unwrap();
    let cfg = BenchConfig {
        count: Some(2),
        interval: Duration::from_millis(5),
        ..config(tmp.path())
    };

    let report = benchmark::run(|_: &CameraConfig| Ok(SyntheticCamera::endless().0), &cfg, &mut Cursor::new(""), &Shutdown::new(), &mut Vec::new())
        .unwrap();

    assert_eq!(report.captured, 2);
    assert!(report.elapsed >= Duration::from_millis(10), "{:?}", report.elapsed);
}
