//! Footprint collision checking decoupled from the lattice's angular
//! resolution.

mod checker;
mod footprint;

pub use checker::{GridCollisionChecker, NUM_ORIENTATION_BINS};
pub use footprint::Footprint;
