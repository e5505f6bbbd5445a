use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Command;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "storeshot_cli_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(dir.join("raw")).unwrap();
    std::fs::create_dir_all(dir.join("backgrounds")).unwrap();
    dir
}

fn write_config(root: &Path) -> PathBuf {
    let json = r##"
{
  "devices": { "iphone": { "width": 200, "height": 400 } },
  "layout": {
    "phone_scale": 0.8, "corner_radius": 20, "shadow_offset": 4, "shadow_blur": 8,
    "phone_y_offset": 0.3, "title_y": 0.1, "subtitle_y": 0.2, "glow_radius": 6
  },
  "screenshots": [
    { "id": "hack", "title": "HACK", "subtitle": "grid", "accent": "#00FFAA" },
    { "id": "demo", "title": "DEMO", "accent": "#FF0055" }
  ],
  "background": { "gradient_top": "#0A0A12", "gradient_bottom": "#1A1033" },
  "fonts": { "candidates": [], "system_fallback": false },
  "paths": { "raw_dir": "raw", "backgrounds_dir": "backgrounds", "output_dir": "out" }
}
"##;
    let path = root.join("storeshot.json");
    std::fs::write(&path, json).unwrap();
    path
}

fn write_raw(root: &Path, stem: &str) {
    let img = image::RgbaImage::from_pixel(9, 16, image::Rgba([200, 40, 40, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(root.join("raw").join(format!("{stem}.png")), &buf).unwrap();
}

fn storeshot() -> Command {
    Command::new(env!("CARGO_BIN_EXE_storeshot"))
}

#[test]
fn cli_composite_writes_png_and_prints_summary() {
    let root = temp_dir("composite");
    let config = write_config(&root);
    write_raw(&root, "hack_iphone");

    let output = storeshot()
        .args(["composite", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "stdout: {stdout}\nstderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let out = root.join("out").join("hack_iphone.png");
    assert!(out.is_file());
    let img = image::open(&out).unwrap();
    assert_eq!((img.width(), img.height()), (200, 400));
    assert!(!root.join("out").join("demo_iphone.png").exists());

    assert!(stdout.contains("1 composited, 1 skipped, 0 failed"), "stdout: {stdout}");
    assert!(stdout.contains("demo_iphone: [SKIP]"), "stdout: {stdout}");

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn cli_composite_honors_out_dir_override() {
    let root = temp_dir("out_override");
    let config = write_config(&root);
    write_raw(&root, "hack_iphone");
    let elsewhere = root.join("elsewhere");

    let status = storeshot()
        .args(["composite", "--config"])
        .arg(&config)
        .arg("--out-dir")
        .arg(&elsewhere)
        .status()
        .unwrap();
    assert!(status.success());
    assert!(elsewhere.join("hack_iphone.png").is_file());
    assert!(!root.join("out").join("hack_iphone.png").exists());

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn cli_check_reports_inputs_without_writing() {
    let root = temp_dir("check");
    let config = write_config(&root);
    write_raw(&root, "hack_iphone");

    let output = storeshot()
        .args(["check", "--config"])
        .arg(&config)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("iphone: 200x400"), "stdout: {stdout}");
    assert!(stdout.contains("hack_iphone.png"), "stdout: {stdout}");
    assert!(stdout.contains("iphone: missing (demo_iphone.png)"), "stdout: {stdout}");
    assert!(stdout.contains("font: built-in bitmap font"), "stdout: {stdout}");
    assert!(stdout.contains("1 raw capture(s) missing"), "stdout: {stdout}");
    assert!(!root.join("out").exists());

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn cli_rejects_malformed_config() {
    let root = temp_dir("bad_config");
    let config = root.join("storeshot.json");
    std::fs::write(&config, "{ not json").unwrap();

    let status = storeshot()
        .args(["check", "--config"])
        .arg(&config)
        .status()
        .unwrap();
    assert!(!status.success());

    std::fs::remove_dir_all(&root).ok();
}
