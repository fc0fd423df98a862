//! Lattice file loading and the per-heading motion table.

use std::f32::consts::PI;
use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::core::math::mod2pi;
use crate::error::{PlannerError, Result};

use super::primitives::{Curvature, Direction, MotionPrimitive};

/// Global metadata of a lattice file.
///
/// Immutable once loaded; replaced wholesale when the lattice file changes.
#[derive(Clone, Debug, Deserialize)]
pub struct LatticeMetadata {
    /// Number of discrete heading bins.
    pub number_of_headings: usize,
    /// Minimum turning radius in meters.
    pub min_turning_radius: f32,
    /// Grid resolution the primitives were generated for, in meters.
    pub grid_resolution: f32,
}

/// One primitive as stored in the lattice file (meters).
#[derive(Debug, Deserialize)]
struct PrimitiveEntry {
    start_heading: usize,
    end_heading: usize,
    delta_x: f32,
    delta_y: f32,
    delta_yaw: f32,
    arc_length: f32,
    #[serde(default = "default_direction")]
    direction: Direction,
    curvature: Curvature,
}

fn default_direction() -> Direction {
    Direction::Forward
}

#[derive(Debug, Deserialize)]
struct LatticeFile {
    lattice_metadata: LatticeMetadata,
    primitives: Vec<PrimitiveEntry>,
}

#[derive(Debug, Deserialize)]
struct MetadataOnly {
    lattice_metadata: LatticeMetadata,
}

/// Motion primitive library, indexed by originating heading bin.
#[derive(Clone, Debug)]
pub struct MotionTable {
    metadata: LatticeMetadata,
    bin_size: f32,
    min_turning_radius_cells: f32,
    primitives_by_heading: Vec<Vec<MotionPrimitive>>,
}

impl MotionTable {
    /// Load a motion table from a lattice file.
    ///
    /// Primitive deltas and lengths are scaled from meters into cells of
    /// `costmap_resolution`. With `allow_reverse_expansion` the inverse of
    /// every forward primitive is added as a reverse motion; without it,
    /// reverse primitives present in the file are dropped.
    pub fn from_file(
        path: &Path,
        costmap_resolution: f32,
        allow_reverse_expansion: bool,
    ) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| PlannerError::LoadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json_str(
            &contents,
            &path.display().to_string(),
            costmap_resolution,
            allow_reverse_expansion,
        )
    }

    /// Parse a motion table from lattice JSON.
    pub fn from_json_str(
        json: &str,
        path: &str,
        costmap_resolution: f32,
        allow_reverse_expansion: bool,
    ) -> Result<Self> {
        let file: LatticeFile = serde_json::from_str(json).map_err(|e| PlannerError::LoadError {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        let metadata = file.lattice_metadata;
        validate_metadata(&metadata, path)?;

        let num_headings = metadata.number_of_headings;
        let bin_size = 2.0 * PI / num_headings as f32;
        let mut primitives_by_heading: Vec<Vec<MotionPrimitive>> = vec![Vec::new(); num_headings];

        for (i, entry) in file.primitives.iter().enumerate() {
            if entry.start_heading >= num_headings || entry.end_heading >= num_headings {
                return Err(PlannerError::LoadError {
                    path: path.to_string(),
                    reason: format!(
                        "primitive {} references heading bin outside 0..{}",
                        i, num_headings
                    ),
                });
            }
            if entry.arc_length <= 0.0 {
                return Err(PlannerError::LoadError {
                    path: path.to_string(),
                    reason: format!("primitive {} has non-positive arc length", i),
                });
            }
            if entry.direction == Direction::Reverse && !allow_reverse_expansion {
                continue;
            }

            let prim = MotionPrimitive {
                start_heading: entry.start_heading,
                end_heading: entry.end_heading,
                delta_x: entry.delta_x / costmap_resolution,
                delta_y: entry.delta_y / costmap_resolution,
                delta_yaw: entry.delta_yaw,
                arc_length: entry.arc_length / costmap_resolution,
                direction: entry.direction,
                curvature: entry.curvature,
            };
            if allow_reverse_expansion && entry.direction == Direction::Forward {
                primitives_by_heading[prim.end_heading].push(inverse_of(&prim));
            }
            primitives_by_heading[prim.start_heading].push(prim);
        }

        debug!(
            "[MotionTable] loaded '{}': {} headings, {} primitives, radius {:.2}m",
            path,
            num_headings,
            primitives_by_heading.iter().map(Vec::len).sum::<usize>(),
            metadata.min_turning_radius
        );

        Ok(Self {
            min_turning_radius_cells: metadata.min_turning_radius / costmap_resolution,
            metadata,
            bin_size,
            primitives_by_heading,
        })
    }

    /// Load only the metadata block of a lattice file.
    pub fn load_metadata(path: &Path) -> Result<LatticeMetadata> {
        let contents = std::fs::read_to_string(path).map_err(|e| PlannerError::LoadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let meta: MetadataOnly =
            serde_json::from_str(&contents).map_err(|e| PlannerError::LoadError {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        validate_metadata(&meta.lattice_metadata, &path.display().to_string())?;
        Ok(meta.lattice_metadata)
    }

    /// Lattice metadata.
    #[inline]
    pub fn metadata(&self) -> &LatticeMetadata {
        &self.metadata
    }

    /// Number of heading bins.
    #[inline]
    pub fn num_headings(&self) -> usize {
        self.metadata.number_of_headings
    }

    /// Minimum turning radius in cells.
    #[inline]
    pub fn min_turning_radius_cells(&self) -> f32 {
        self.min_turning_radius_cells
    }

    /// Primitives departing from a heading bin, in file order.
    #[inline]
    pub fn primitives_from(&self, heading: usize) -> &[MotionPrimitive] {
        &self.primitives_by_heading[heading]
    }

    /// Center angle of a heading bin.
    #[inline]
    pub fn bin_angle(&self, bin: usize) -> f32 {
        bin as f32 * self.bin_size
    }

    /// Nearest heading bin for a continuous angle.
    ///
    /// Deterministic nearest rounding; a tie exactly halfway between two
    /// bins resolves to the lower bin index.
    pub fn closest_angular_bin(&self, angle: f32) -> usize {
        let scaled = mod2pi(angle) / self.bin_size;
        let lower = scaled.floor();
        let bin = if scaled - lower > 0.5 { lower + 1.0 } else { lower };
        bin as usize % self.metadata.number_of_headings
    }
}

fn validate_metadata(metadata: &LatticeMetadata, path: &str) -> Result<()> {
    if metadata.number_of_headings == 0 {
        return Err(PlannerError::LoadError {
            path: path.to_string(),
            reason: "number_of_headings must be positive".to_string(),
        });
    }
    if metadata.min_turning_radius <= 0.0 {
        return Err(PlannerError::LoadError {
            path: path.to_string(),
            reason: "min_turning_radius must be positive".to_string(),
        });
    }
    if metadata.grid_resolution <= 0.0 {
        return Err(PlannerError::LoadError {
            path: path.to_string(),
            reason: "grid_resolution must be positive".to_string(),
        });
    }
    Ok(())
}

/// Inverse motion of a forward primitive: driving backwards along the same
/// geometric path. World delta and yaw negate, heading bins swap, and the
/// turn side flips.
fn inverse_of(prim: &MotionPrimitive) -> MotionPrimitive {
    MotionPrimitive {
        start_heading: prim.end_heading,
        end_heading: prim.start_heading,
        delta_x: -prim.delta_x,
        delta_y: -prim.delta_y,
        delta_yaw: -prim.delta_yaw,
        arc_length: prim.arc_length,
        direction: Direction::Reverse,
        curvature: match prim.curvature {
            Curvature::Straight => Curvature::Straight,
            Curvature::Left => Curvature::Right,
            Curvature::Right => Curvature::Left,
        },
    }
}
