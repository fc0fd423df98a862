//! Shared fixtures for unit tests: a small synthetic lattice and helpers
//! to materialize it on disk.

use std::path::PathBuf;

/// Quarter-turn endpoint offsets for a unit turning radius.
///
/// From heading 0 (east) a left turn ends at (1, 1) and a right turn at
/// (1, -1); other headings rotate by 90° steps.
pub fn turn_offset(heading: usize, left: bool) -> (i32, i32) {
    let mut offset = if left { (1, 1) } else { (1, -1) };
    for _ in 0..heading {
        offset = (-offset.1, offset.0);
    }
    offset
}

/// A 4-heading lattice at 1m resolution: one straight move plus 90° turns
/// per heading, unit turning radius.
pub fn lattice_json_4() -> String {
    let mut prims = Vec::new();
    let straight = [(1, 0), (0, 1), (-1, 0), (0, -1)];
    for heading in 0..4usize {
        let (sx, sy) = straight[heading];
        prims.push(serde_json::json!({
            "start_heading": heading,
            "end_heading": heading,
            "delta_x": sx as f32,
            "delta_y": sy as f32,
            "delta_yaw": 0.0,
            "arc_length": 1.0,
            "curvature": "straight"
        }));
        let left = (heading + 1) % 4;
        let (lx, ly) = turn_offset(heading, true);
        prims.push(serde_json::json!({
            "start_heading": heading,
            "end_heading": left,
            "delta_x": lx as f32,
            "delta_y": ly as f32,
            "delta_yaw": std::f32::consts::FRAC_PI_2,
            "arc_length": 1.5708,
            "curvature": "left"
        }));
        let right = (heading + 3) % 4;
        let (rx, ry) = turn_offset(heading, false);
        prims.push(serde_json::json!({
            "start_heading": heading,
            "end_heading": right,
            "delta_x": rx as f32,
            "delta_y": ry as f32,
            "delta_yaw": -std::f32::consts::FRAC_PI_2,
            "arc_length": 1.5708,
            "curvature": "right"
        }));
    }
    serde_json::json!({
        "lattice_metadata": {
            "number_of_headings": 4,
            "min_turning_radius": 1.0,
            "grid_resolution": 1.0
        },
        "primitives": prims
    })
    .to_string()
}

/// Write the test lattice to a unique temp file and return its path.
pub fn write_temp_lattice(tag: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "jaali_lattice_{}_{}.json",
        std::process::id(),
        tag
    ));
    std::fs::write(&path, lattice_json_4()).expect("write test lattice");
    path
}
