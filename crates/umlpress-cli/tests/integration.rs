//! Integration tests for the umlpress CLI
//!
//! These tests exercise settings loading, diagram loading and the
//! preflight failures of the render and map commands.

use std::fs;

use tempfile::TempDir;
use umlpress_cli::{load_diagram, load_settings, map_command, render_command, RenderOptions};
use umlpress_render::OutputFormat;

const SOURCE: &str = "@startuml\nAlice -> Bob: hello\nnewpage\nBob -> Alice: hi\n@enduml\n";

/// Workspace with a settings file and one diagram
fn workspace(settings: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("umlpress.toml"), settings).unwrap();
    fs::create_dir_all(dir.path().join("docs")).unwrap();
    fs::write(dir.path().join("docs").join("greeting.puml"), SOURCE).unwrap();
    dir
}

#[test]
fn test_load_diagram_sets_title_and_resource() {
    let dir = workspace("");
    let input = dir.path().join("docs").join("greeting.puml");

    let diagram = load_diagram(&input, 2, Some(dir.path())).unwrap();

    assert_eq!(diagram.title, "greeting");
    assert_eq!(diagram.page_count, 2);
    assert_eq!(diagram.content, SOURCE);
    assert_eq!(diagram.parent.as_str(), "docs/greeting.puml");
    assert_eq!(diagram.dir.as_deref(), Some(dir.path().join("docs").as_path()));
    assert_eq!(diagram.file_name(), Some("greeting.puml"));
}

#[test]
fn test_load_diagram_outside_workspace_keeps_full_path() {
    let dir = workspace("");
    let other = TempDir::new().unwrap();
    let input = dir.path().join("docs").join("greeting.puml");

    let diagram = load_diagram(&input, 0, Some(other.path())).unwrap();
    assert_eq!(diagram.page_count, 1);
    assert!(diagram.parent.as_str().ends_with("docs/greeting.puml"));
}

#[test]
fn test_load_diagram_missing_input() {
    let dir = workspace("");
    let err = load_diagram(&dir.path().join("nope.puml"), 1, None).unwrap_err();
    assert!(err.to_string().contains("Input file not found"));
}

#[test]
fn test_load_settings_from_file() {
    let dir = workspace("[engine]\nexecutable = \"java\"\n");
    let settings = load_settings(Some(&dir.path().join("umlpress.toml"))).unwrap();

    assert_eq!(settings.workspace_root.as_deref(), Some(dir.path()));
    assert!(settings.engine.executable.is_some());
}

#[test]
fn test_load_settings_rejects_bad_toml() {
    let dir = workspace("[engine\n");
    let err = load_settings(Some(&dir.path().join("umlpress.toml"))).unwrap_err();
    assert!(err.to_string().contains("Failed to load settings"));
}

#[tokio::test]
async fn test_render_without_engine_fails_fast() {
    let dir = workspace("");
    let input = dir.path().join("docs").join("greeting.puml");
    let options = RenderOptions {
        pages: 2,
        ..Default::default()
    };

    let err = render_command(
        &input,
        OutputFormat::Svg,
        &options,
        Some(&dir.path().join("umlpress.toml")),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("engine.executable"), "{err}");
}

#[tokio::test]
async fn test_map_with_missing_bundle_names_location() {
    let dir = workspace("[engine]\nexecutable = \"java\"\nbundle = \"lib/plantuml.jar\"\n");
    let input = dir.path().join("docs").join("greeting.puml");
    let options = RenderOptions {
        pages: 1,
        output: Some(dir.path().join("out").join("greeting.cmapx")),
        timeout: Some(5),
    };

    let err = map_command(&input, &options, Some(&dir.path().join("umlpress.toml")))
        .await
        .unwrap_err();

    let expected = dir.path().join("lib/plantuml.jar").display().to_string();
    assert!(err.to_string().contains(&expected), "{err}");
    assert!(!dir.path().join("out").exists());
}
