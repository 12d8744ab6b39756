use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const VALID_SCENE: &str = r#"
version = 1
original_image = "lake.jpg"
depth_image = "lake_depth.png"
vertical_threshold = 25
respond_to = "scrollOnY"

[container]
top = 300
bottom_padding = 900

[timing]
resize_debounce = "200ms"
"#;

fn depthview(config_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_depthview"))
        .env("DEPTHVIEW_CONFIG_DIR", config_dir)
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run depthview")
}

#[test]
fn config_check_accepts_valid_scene() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("scene.toml"), VALID_SCENE).unwrap();

    let output = depthview(root.path(), &["config", "check"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("lake_depth.png"), "{stdout}");
    assert!(stdout.contains("scrollOnY"), "{stdout}");
    assert!(
        stdout.contains("top=300 width=auto bottom_padding=900"),
        "{stdout}"
    );
    assert!(stdout.contains("Scene OK"), "{stdout}");
}

#[test]
fn config_check_rejects_invalid_scene() {
    let root = TempDir::new().unwrap();
    fs::write(
        root.path().join("scene.toml"),
        VALID_SCENE.replace("version = 1", "version = 7"),
    )
    .unwrap();

    let output = depthview(root.path(), &["config", "check"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unsupported scene version"), "{stderr}");
}

#[test]
fn config_check_reports_broken_fragment_shader() {
    let root = TempDir::new().unwrap();
    let scene = root.path().join("custom.toml");
    fs::write(
        &scene,
        format!("{VALID_SCENE}\n[shaders]\nfragment = \"broken.frag\"\n"),
    )
    .unwrap();
    fs::write(
        root.path().join("broken.frag"),
        "#version 450\nvoid main( {\n",
    )
    .unwrap();

    let output = depthview(
        root.path(),
        &["--config", scene.to_str().unwrap(), "config", "check"],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("fragment"), "{stderr}");
}

#[test]
fn command_line_images_need_no_scene() {
    let root = TempDir::new().unwrap();

    let output = depthview(
        root.path(),
        &["photo.jpg", "photo_depth.png", "config", "check"],
    );

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("(none)"));
}

#[test]
fn config_where_names_scene_file() {
    let root = TempDir::new().unwrap();

    let output = depthview(root.path(), &["config", "where"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("scene.toml"), "{stdout}");
    assert!(stdout.contains("missing"), "{stdout}");
}
