//! Motion primitive library: lattice file loading and per-heading lookup.

mod primitives;
mod table;

pub use primitives::{Curvature, Direction, MotionPrimitive};
pub use table::{LatticeMetadata, MotionTable};
