use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;

fn netweave(config_dir: &Path, args: &[&str]) -> Output {
    let config = config_dir.join("netweave.yaml");
    Command::new(env!("CARGO_BIN_EXE_netweave"))
        .args(args)
        .arg("--config")
        .arg(&config)
        .output()
        .expect("Failed to execute netweave")
}

fn read_lines(path: &Path) -> Vec<Value> {
    fs::read_to_string(path)
        .expect("Failed to read frames")
        .lines()
        .map(|line| serde_json::from_str(line).expect("frame is not valid JSON"))
        .collect()
}

#[test]
fn mock_writes_graph_document() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("graph.json");

    let output = netweave(
        dir.path(),
        &["mock", "--nodes", "320", "--seed", "5", "-o", out.to_str().unwrap()],
    );
    assert!(output.status.success(), "netweave mock exited with error");

    let doc: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let nodes = doc["nodes"].as_array().unwrap();
    let links = doc["links"].as_array().unwrap();
    assert_eq!(nodes.len(), 320);
    assert!(links.len() >= 319, "too few links for a connected graph");
    assert_eq!(nodes[0]["id"], "n0");
}

#[test]
fn mock_is_reproducible_with_seed() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("a.json");
    let second = dir.path().join("b.json");

    for out in [&first, &second] {
        let output = netweave(dir.path(), &["mock", "--seed", "9", "-o", out.to_str().unwrap()]);
        assert!(output.status.success());
    }
    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn normalize_cleans_sample_graph() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("clean.json");

    let output = netweave(
        dir.path(),
        &[
            "normalize",
            "-i",
            "tests/fixtures/sample_graph.json",
            "-o",
            out.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "netweave normalize exited with error");

    let doc: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(doc["nodes"].as_array().unwrap().len(), 5);
    assert_eq!(doc["links"].as_array().unwrap().len(), 4);
}

#[test]
fn normalize_renames_duplicate_ids_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("clean.json");

    let output = netweave(
        dir.path(),
        &[
            "normalize",
            "-i",
            "tests/fixtures/duplicate_ids.json",
            "-o",
            out.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "netweave normalize exited with error");

    let doc: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let ids: Vec<&str> = doc["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["x", "x-1", "x-1-1", "x-2", "node-4"]);

    // Links resolve against the final ids; the one naming "x-3" dangles.
    let links: Vec<(&str, &str)> = doc["links"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| (l["source"].as_str().unwrap(), l["target"].as_str().unwrap()))
        .collect();
    assert_eq!(links, [("x", "x-1"), ("x", "node-4")]);
}

#[test]
fn normalize_rejects_malformed_json() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("clean.json");

    let output = netweave(
        dir.path(),
        &[
            "normalize",
            "-i",
            "tests/fixtures/malformed.json",
            "-o",
            out.to_str().unwrap(),
        ],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not valid JSON"), "unexpected stderr: {stderr}");
    assert!(!out.exists());
}

#[test]
fn simulate_lays_out_input_graph() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("frames.jsonl");

    let output = netweave(
        dir.path(),
        &[
            "simulate",
            "-i",
            "tests/fixtures/sample_graph.json",
            "--width",
            "640",
            "--height",
            "480",
            "--ticks",
            "10",
            "--seed",
            "3",
            "-o",
            out.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "netweave simulate exited with error");

    let frames = read_lines(&out);
    assert_eq!(frames.len(), 10);
    assert_eq!(frames[9]["frame"], 10);
    assert_eq!(frames[0]["width"], 640.0);
    assert_eq!(frames[0]["nodes"].as_array().unwrap().len(), 5);
    assert_eq!(frames[0]["edges"].as_array().unwrap().len(), 4);
}

#[test]
fn simulate_falls_back_to_generated_graph() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("netweave.yaml"), "cluster:\n  node_count: 90\n").unwrap();
    let out = dir.path().join("frames.jsonl");

    let output = netweave(
        dir.path(),
        &[
            "simulate",
            "-i",
            "tests/fixtures/no_links.json",
            "--ticks",
            "2",
            "-o",
            out.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "netweave simulate exited with error");

    let frames = read_lines(&out);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0]["nodes"].as_array().unwrap().len(), 90);
}

#[test]
fn animate_stops_at_frame_limit() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("netweave.yaml"),
        "cluster:\n  node_count: 60\ndriver:\n  frame_interval_ms: 1\n",
    )
    .unwrap();
    let out = dir.path().join("frames.jsonl");

    let output = netweave(
        dir.path(),
        &["animate", "--frames", "3", "--seed", "1", "-o", out.to_str().unwrap()],
    );
    assert!(output.status.success(), "netweave animate exited with error");
    assert_eq!(read_lines(&out).len(), 3);
}

#[test]
fn animate_with_reduced_motion_renders_one_static_frame() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("frames.jsonl");

    let output = netweave(
        dir.path(),
        &["animate", "--reduced-motion", "-o", out.to_str().unwrap()],
    );
    assert!(output.status.success(), "netweave animate exited with error");

    let frames = read_lines(&out);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["frame"], 0);
    assert_eq!(frames[0]["nodes"].as_array().unwrap().len(), 380);
}
