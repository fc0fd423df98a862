//! # Jaali-Plan: State-Lattice Path Planner
//!
//! A kinematically-constrained path planner for 2D occupancy grids. Instead
//! of unconstrained grid steps, search expands a precomputed library of
//! motion primitives ("state lattice"), so every returned path respects a
//! minimum turning radius — with optional penalized reverse motion.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jaali_plan::{Costmap, Footprint, LatticePlanner, Pose2D, SearchConfig, WorldPoint};
//!
//! let costmap = Costmap::new(200, 200, 0.05, WorldPoint::ZERO).into_shared();
//!
//! let mut config = SearchConfig::default();
//! config.lattice_filepath = "models/ackermann.json".into();
//!
//! let planner = LatticePlanner::new(costmap, config, Footprint::circular(0.17, 0))?;
//! let path = planner.plan(
//!     Pose2D::new(0.5, 0.5, 0.0),
//!     Pose2D::new(8.0, 6.0, std::f32::consts::FRAC_PI_2),
//! )?;
//! println!("{} poses, cost {:.1}", path.poses.len(), path.cost);
//! # Ok::<(), jaali_plan::PlannerError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: fundamental types (`Pose2D`, `WorldPoint`, `GridCoord`)
//! - [`costmap`]: the occupancy cost grid the planner reads
//! - [`lattice`]: motion primitive library loaded from a JSON lattice file
//! - [`collision`]: footprint collision checking at a fixed fine angular
//!   resolution, decoupled from the lattice's heading count
//! - [`heuristic`]: windowed, obstacle-aware cost-to-go table
//! - [`search`]: budgeted best-first search with analytic Dubins shortcuts
//! - [`smoothing`]: handoff seam for downstream path smoothing
//! - [`planner`]: the facade serializing planning and reconfiguration
//!
//! ## Concurrency
//!
//! One mutex serializes planning against reconfiguration; the costmap sits
//! behind its own `RwLock`, read-held for the duration of each search.
//! Planning is synchronous and blocking; the only cancellation is the
//! iteration and wall-clock budget pair in [`SearchConfig`].

pub mod collision;
pub mod config;
pub mod core;
pub mod costmap;
pub mod error;
pub mod heuristic;
pub mod lattice;
pub mod planner;
pub mod search;
pub mod smoothing;

#[cfg(test)]
mod test_fixtures;

// Re-export main types at crate root
pub use crate::core::{GridCoord, Pose2D, WorldPoint};
pub use collision::{Footprint, GridCollisionChecker};
pub use config::{MotionModel, ParamValue, SearchConfig};
pub use costmap::{costs, Costmap, SharedCostmap};
pub use error::{PlannerError, Result};
pub use heuristic::HeuristicTable;
pub use lattice::{LatticeMetadata, MotionPrimitive, MotionTable};
pub use planner::{LatticePlanner, PlannedPath};
pub use search::{LatticeAStar, LatticeState};
pub use smoothing::{SimplifySmoother, Smoother};
