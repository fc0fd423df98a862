//! Search states and the node arena.

use std::collections::HashMap;

use crate::core::GridCoord;
use crate::lattice::Direction;

/// A search state on the lattice: grid cell plus heading bin.
///
/// Equality defines graph-node identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LatticeState {
    /// Cell column.
    pub x: i32,
    /// Cell row.
    pub y: i32,
    /// Heading bin in `[0, number_of_headings)`.
    pub heading: usize,
}

impl LatticeState {
    /// Create a state.
    #[inline]
    pub fn new(x: i32, y: i32, heading: usize) -> Self {
        Self { x, y, heading }
    }

    /// Cell coordinate of the state.
    #[inline]
    pub fn coord(&self) -> GridCoord {
        GridCoord::new(self.x, self.y)
    }

    /// Dense key for arena lookup. Requires an on-grid state.
    #[inline]
    fn key(&self, width: usize, num_headings: usize) -> u64 {
        (self.y as u64 * width as u64 + self.x as u64) * num_headings as u64 + self.heading as u64
    }
}

/// Per-node search bookkeeping.
#[derive(Clone, Debug)]
pub struct SearchNode {
    /// The lattice state this node represents.
    pub state: LatticeState,
    /// Cost from the start.
    pub g: f32,
    /// Cached heuristic estimate to the goal.
    pub h: f32,
    /// Arena index of the predecessor on the best known path.
    pub parent: Option<usize>,
    /// Whether the node has been expanded this search.
    pub closed: bool,
    /// Travel direction of the primitive that reached this node.
    pub direction: Direction,
    /// Search generation the bookkeeping belongs to.
    generation: u64,
}

/// Arena of search nodes, reused across planning calls.
///
/// Nodes are addressed by index so parent links stay valid and cheap. A
/// generation stamp makes the per-call reset O(1): bumping the generation
/// invalidates every node's bookkeeping lazily, without walking the table.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<SearchNode>,
    slots: HashMap<u64, usize>,
    generation: u64,
}

impl NodeArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new search; all existing bookkeeping becomes stale.
    pub fn begin_search(&mut self) {
        self.generation += 1;
    }

    /// Arena index for a state, interning it on first touch.
    ///
    /// A node left over from a previous search is reinitialized here.
    pub fn get_or_insert(&mut self, state: LatticeState, width: usize, num_headings: usize) -> usize {
        let key = state.key(width, num_headings);
        match self.slots.get(&key) {
            Some(&idx) => {
                let node = &mut self.nodes[idx];
                if node.generation != self.generation {
                    node.g = f32::INFINITY;
                    node.h = 0.0;
                    node.parent = None;
                    node.closed = false;
                    node.direction = Direction::Forward;
                    node.generation = self.generation;
                }
                idx
            }
            None => {
                let idx = self.nodes.len();
                self.nodes.push(SearchNode {
                    state,
                    g: f32::INFINITY,
                    h: 0.0,
                    parent: None,
                    closed: false,
                    direction: Direction::Forward,
                    generation: self.generation,
                });
                self.slots.insert(key, idx);
                idx
            }
        }
    }

    /// Node by arena index.
    #[inline]
    pub fn node(&self, idx: usize) -> &SearchNode {
        &self.nodes[idx]
    }

    /// Mutable node by arena index.
    #[inline]
    pub fn node_mut(&mut self, idx: usize) -> &mut SearchNode {
        &mut self.nodes[idx]
    }

    /// Number of interned nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena has no nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
