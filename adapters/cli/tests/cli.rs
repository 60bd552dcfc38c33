use std::{fs, process::Command};

use serde_json::Value;

fn ricochet(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_ricochet"))
        .args(args)
        .output()
        .expect("failed to launch the ricochet binary")
}

fn json(args: &[&str]) -> Value {
    let mut full = vec!["--json"];
    full.extend_from_slice(args);
    let output = ricochet(&full);
    assert!(
        output.status.success(),
        "ricochet {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

fn tiles(value: &Value) -> Vec<(i64, i64)> {
    value
        .as_array()
        .expect("tile list")
        .iter()
        .map(|tile| {
            (
                tile["column"].as_i64().expect("column"),
                tile["row"].as_i64().expect("row"),
            )
        })
        .collect()
}

#[test]
fn range_stops_at_obstacles() {
    let report = json(&[
        "range", "--from", "0,0", "--depth", "4", "--obstacle", "1,0",
    ]);
    assert_eq!(report["command"], "range");

    let reachable = tiles(&report["tiles"]);
    assert!(!reachable.contains(&(1, 0)));
    for row in 0..=4 {
        assert!(reachable.contains(&(0, row)), "(0, {row}) should be reachable");
    }
    assert!(!reachable.contains(&(0, 5)));
}

#[test]
fn path_walks_around_an_obstacle() {
    let report = json(&["path", "--from", "0,0", "--to", "2,0", "--obstacle", "1,0"]);
    let steps = tiles(&report["steps"]);
    assert_eq!(steps.len(), 4);
    assert_eq!(steps.last(), Some(&(2, 0)));

    let output = ricochet(&["path", "--from", "0,0", "--to", "2,0", "--obstacle", "1,0"]);
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.starts_with("4 steps from (0, 0) to (2, 0):"), "{text}");
}

#[test]
fn shot_stops_at_the_first_enemy() {
    let report = json(&[
        "shot", "--from", "1,2", "--angle", "0", "--enemy", "8,2", "--enemy", "9,2",
    ]);
    let targets = report["targets"].as_array().expect("targets");
    assert_eq!(targets.len(), 1);
    assert!(targets[0]["kind"].get("Character").is_some(), "{targets:?}");
    assert_eq!(targets[0]["tile"]["column"], 8);
}

#[test]
fn vertical_shot_bounces_between_borders() {
    let report = json(&[
        "shot", "--from", "1,2", "--angle", "90", "--ricochets", "2",
    ]);
    let targets = report["targets"].as_array().expect("targets");
    assert_eq!(targets.len(), 3);
    assert!(targets.iter().all(|target| target["kind"] == "Border"));
}

#[test]
fn configuration_file_changes_the_tile_size() {
    let path = std::env::temp_dir().join(format!("ricochet-cli-{}.toml", std::process::id()));
    fs::write(&path, "tile_size = 10.0\n").expect("write configuration");
    let config = path.to_str().expect("utf-8 path");

    let report = json(&["--config", config, "shot", "--from", "1,2", "--angle", "0"]);
    let _ = fs::remove_file(&path);

    let point = &report["targets"][0]["point"];
    assert_eq!(point[0].as_f64(), Some(100.0));
    assert_eq!(point[1].as_f64(), Some(25.0));
}

#[test]
fn invalid_input_is_reported() {
    let output = ricochet(&["range", "--from", "20,0"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("outside the grid"));

    let output = ricochet(&["path", "--from", "0,0", "--to", "9,5", "--obstacle", "9,5"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("holds an obstacle"));

    let output = ricochet(&["range", "--from", "3"]);
    assert!(!output.status.success());
}
