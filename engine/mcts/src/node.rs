//! MCTS tree node representation.
//!
//! A node stands for the position reached by the moves on the path from the
//! root. Candidate moves are stored as parallel arrays (position, prior,
//! optional child handle); a child node only exists once selection first
//! walks into it.

use games_gomoku::{GameResult, Position};

/// Index into the node arena. Using a newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }
}

/// Leaf value of a terminal node. Draws score the same as wins.
pub const WIN_VALUE: f32 = 1.0;

/// A node in the MCTS tree.
///
/// Values are from the perspective of the player who made the move leading
/// into this node, so a parent compares its children's `mean_value` directly.
#[derive(Debug, Clone)]
pub struct MctsNode {
    /// Parent node index (NONE for root)
    pub parent: NodeId,

    /// Number of completed backups through this node
    pub visit_count: u32,

    /// Sum of values backpropagated through this node.
    pub value_sum: f32,

    /// Leaf value handed to backup: fixed for terminal nodes, the negated
    /// evaluator value once expanded.
    pub value: f32,

    /// Game result at this node's position
    pub result: GameResult,

    /// Pending evaluations below this node, in pretend visits
    pub virtual_loss: f32,

    /// Candidate moves, row-major. Empty until expanded.
    pub child_positions: Vec<Position>,

    /// Priors for `child_positions`, normalized over legal moves.
    pub child_priors: Vec<f32>,

    /// Materialized children, parallel to `child_positions`.
    pub children: Vec<Option<NodeId>>,
}

impl MctsNode {
    /// Create a new root node.
    pub fn new_root() -> Self {
        Self::new_child(NodeId::NONE, GameResult::InProgress)
    }

    /// Create an unvisited node. Terminal results fix the leaf value.
    pub fn new_child(parent: NodeId, result: GameResult) -> Self {
        let value = match result {
            GameResult::BlackWin | GameResult::WhiteWin | GameResult::Draw => WIN_VALUE,
            GameResult::InProgress => 0.0,
        };
        Self {
            parent,
            visit_count: 0,
            value_sum: 0.0,
            value,
            result,
            virtual_loss: 0.0,
            child_positions: Vec::new(),
            child_priors: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Mean value Q = value_sum / visit_count, 0.0 if never visited.
    #[inline]
    pub fn mean_value(&self) -> f32 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.value_sum / self.visit_count as f32
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.result.is_terminal()
    }

    /// Check if this node has been expanded (has candidate moves).
    #[inline]
    pub fn is_expanded(&self) -> bool {
        !self.child_positions.is_empty()
    }

    /// Check if this is a leaf node (not expanded or terminal).
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.is_terminal() || !self.is_expanded()
    }

    /// Materialized child handle for a candidate index.
    #[inline]
    pub fn child(&self, index: usize) -> Option<NodeId> {
        self.children.get(index).copied().flatten()
    }

    /// PUCT score of this node as a child with the given prior.
    ///
    /// Note: Takes pre-computed sqrt(parent_visits) to avoid redundant sqrt calls
    /// when comparing multiple children.
    #[inline]
    pub fn ucb_score(&self, prior: f32, parent_visits_sqrt: f32, c_puct: f32) -> f32 {
        puct_score(
            self.mean_value(),
            self.visit_count,
            self.virtual_loss,
            prior,
            parent_visits_sqrt,
            c_puct,
        )
    }
}

/// score = Q + c_puct * P * sqrt(N_parent) / (1 + N) - VL / (1 + N)
///
/// A candidate without a node scores with Q, N and VL all zero.
#[inline]
pub fn puct_score(
    q: f32,
    visits: u32,
    virtual_loss: f32,
    prior: f32,
    parent_visits_sqrt: f32,
    c_puct: f32,
) -> f32 {
    let denom = 1.0 + visits as f32;
    q + c_puct * prior * parent_visits_sqrt / denom - virtual_loss / denom
}
