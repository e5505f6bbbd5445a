use std::path::PathBuf;

use storeshot::{Config, StoreshotError};

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "storeshot_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

const CONFIG: &str = r##"{
  "devices": {
    "iphone": { "width": 1320, "height": 2868 },
    "ipad": { "width": 2064, "height": 2752 }
  },
  "layout": {
    "phone_scale": 0.78, "corner_radius": 60, "shadow_offset": 12, "shadow_blur": 30,
    "phone_y_offset": 0.22, "title_y": 0.06, "subtitle_y": 0.13, "glow_radius": 18
  },
  "screenshots": [
    { "id": "hack", "title": "HACK THE GRID", "subtitle": "Breach every node", "accent": "#00FFAA" },
    { "id": "loot", "title": "LOOT", "accent": "FF0055", "background": "neon" }
  ],
  "background": { "gradient_top": "#0A0A12", "gradient_bottom": "#1A1033" },
  "paths": { "output_dir": "/abs/out" }
}"##;

#[test]
fn from_path_rebases_relative_dirs_onto_the_config_dir() {
    let tmp = temp_dir("config_file");
    std::fs::create_dir_all(&tmp).unwrap();
    let path = tmp.join("screenshots.json");
    std::fs::write(&path, CONFIG).unwrap();

    let cfg = Config::from_path(&path).unwrap();
    assert_eq!(cfg.paths.raw_dir, tmp.join("raw"));
    assert_eq!(cfg.paths.backgrounds_dir, tmp.join("backgrounds"));
    assert_eq!(cfg.paths.output_dir, PathBuf::from("/abs/out"));

    assert_eq!(cfg.devices.len(), 2);
    assert_eq!(cfg.screenshots[1].accent.to_string(), "#FF0055");
    assert_eq!(cfg.screenshots[1].background.as_deref(), Some("neon"));
    assert_eq!(cfg.screenshots[1].subtitle, "");

    std::fs::remove_dir_all(&tmp).ok();
}

#[test]
fn missing_and_malformed_files_are_configuration_errors() {
    let err = Config::from_path("/nonexistent/storeshot.json").unwrap_err();
    assert!(matches!(err, StoreshotError::Config(_)));
    assert!(err.is_fatal());

    let tmp = temp_dir("config_bad");
    std::fs::create_dir_all(&tmp).unwrap();
    let path = tmp.join("bad.json");
    std::fs::write(&path, "{ \"devices\": ").unwrap();
    let err = Config::from_path(&path).unwrap_err();
    assert!(err.to_string().starts_with("configuration error:"), "{err}");

    std::fs::remove_dir_all(&tmp).ok();
}
