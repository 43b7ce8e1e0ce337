//! MCTS tree structure with arena allocation.
//!
//! The tree uses arena allocation for efficient node storage and
//! cache-friendly traversal. Nodes are stored in a contiguous Vec
//! and referenced by NodeId indices. Parent links are plain indices, so the
//! arena is the only owner and the whole tree is dropped at once.

use games_gomoku::{GameResult, GameState, Position};

use crate::node::{puct_score, MctsNode, NodeId};

/// MCTS tree with arena-based node storage.
#[derive(Debug)]
pub struct MctsTree {
    /// Arena storing all nodes
    nodes: Vec<MctsNode>,

    /// Root node index (always 0 after initialization)
    root: NodeId,
}

impl Default for MctsTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MctsTree {
    /// Create a tree holding a single unvisited, in-progress root.
    pub fn new() -> Self {
        Self {
            nodes: vec![MctsNode::new_root()],
            root: NodeId(0),
        }
    }

    /// Get the root node ID.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a reference to a node by ID.
    #[inline]
    pub fn get(&self, id: NodeId) -> &MctsNode {
        &self.nodes[id.0 as usize]
    }

    /// Get a mutable reference to a node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut MctsNode {
        &mut self.nodes[id.0 as usize]
    }

    /// Allocate a new node and return its ID.
    pub fn allocate(&mut self, node: MctsNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the total number of nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty (should never be true after construction).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get the arena slice for read access.
    #[inline]
    pub fn arena(&self) -> &[MctsNode] {
        &self.nodes
    }

    /// Populate a leaf's candidate moves from an evaluator response.
    ///
    /// Priors are the policy weights of the legal cells, renormalized to sum
    /// to 1. Mass on occupied cells is dropped. If no legal cell carries
    /// positive weight the priors fall back to uniform. The leaf's value
    /// becomes `-eval_value`, converting from the side to move to the player
    /// who just moved.
    ///
    /// Returns false without touching the node if it is terminal or already
    /// expanded.
    pub fn expand(
        &mut self,
        node_id: NodeId,
        state: &GameState,
        policy: &[f32],
        eval_value: f32,
    ) -> bool {
        let node = self.get(node_id);
        if node.is_expanded() || node.is_terminal() {
            return false;
        }

        let legal = state.legal_moves();
        if legal.is_empty() {
            return false;
        }

        let n = state.board_size();
        let mut priors: Vec<f32> = legal
            .iter()
            .map(|pos| policy.get(pos.index(n)).copied().unwrap_or(0.0).max(0.0))
            .collect();

        let total: f32 = priors.iter().sum();
        if total > 0.0 && total.is_finite() {
            for p in &mut priors {
                *p /= total;
            }
        } else {
            priors.fill(1.0 / legal.len() as f32);
        }

        let node = self.get_mut(node_id);
        node.children = vec![None; legal.len()];
        node.child_positions = legal;
        node.child_priors = priors;
        node.value = -eval_value;
        true
    }

    /// Pick the candidate move with the highest PUCT score.
    ///
    /// Returns the candidate index; ties go to the lowest index. The
    /// virtual-loss term is only applied when `use_virtual_loss` is set.
    pub fn select_child(
        &self,
        node_id: NodeId,
        c_puct: f32,
        use_virtual_loss: bool,
    ) -> Option<usize> {
        let node = self.get(node_id);
        // Pre-compute sqrt once instead of per-child comparison
        let parent_visits_sqrt = (node.visit_count as f32).sqrt();

        let mut best: Option<(usize, f32)> = None;
        for (index, (&prior, child)) in node.child_priors.iter().zip(&node.children).enumerate() {
            let score = match child {
                Some(id) => {
                    let child = self.get(*id);
                    let virtual_loss = if use_virtual_loss {
                        child.virtual_loss
                    } else {
                        0.0
                    };
                    puct_score(
                        child.mean_value(),
                        child.visit_count,
                        virtual_loss,
                        prior,
                        parent_visits_sqrt,
                        c_puct,
                    )
                }
                None => puct_score(0.0, 0, 0.0, prior, parent_visits_sqrt, c_puct),
            };

            if best.map_or(true, |(_, top)| score > top) {
                best = Some((index, score));
            }
        }

        best.map(|(index, _)| index)
    }

    /// Return the child node for a candidate index, creating it on first use.
    ///
    /// `result` is the game result after playing the candidate's move.
    pub fn materialize_child(
        &mut self,
        parent_id: NodeId,
        index: usize,
        result: GameResult,
    ) -> NodeId {
        if let Some(existing) = self.get(parent_id).child(index) {
            return existing;
        }

        let child_id = self.allocate(MctsNode::new_child(parent_id, result));
        self.get_mut(parent_id).children[index] = Some(child_id);
        child_id
    }

    /// Add `loss` pretend visits to a node.
    pub fn apply_virtual_loss(&mut self, node_id: NodeId, loss: f32) {
        self.get_mut(node_id).virtual_loss += loss;
    }

    /// Backpropagate the leaf's value up to the root.
    ///
    /// Value is negated at each level (opponent's perspective). Each node on
    /// the way gives back `virtual_loss`, never dropping below zero.
    pub fn backpropagate(&mut self, leaf_id: NodeId, virtual_loss: f32) {
        let mut current_id = leaf_id;
        let mut current_value = self.get(leaf_id).value;

        while current_id.is_some() {
            let node = self.get_mut(current_id);
            node.visit_count += 1;
            node.value_sum += current_value;
            node.virtual_loss = (node.virtual_loss - virtual_loss).max(0.0);

            current_value = -current_value;
            current_id = node.parent;
        }
    }

    /// Most-visited materialized root child as (move, visit_count).
    /// Ties resolve to the earliest candidate. None if the root has no children.
    pub fn best_action(&self) -> Option<(Position, u32)> {
        let root = self.get(self.root);
        let mut best: Option<(Position, u32)> = None;

        for (pos, child) in root.child_positions.iter().zip(&root.children) {
            if let Some(id) = child {
                let visits = self.get(*id).visit_count;
                if best.map_or(true, |(_, top)| visits > top) {
                    best = Some((*pos, visits));
                }
            }
        }

        best
    }

    /// Root visit distribution over all `board_size * board_size` cells.
    pub fn root_policy(&self, board_size: usize) -> Vec<f32> {
        let root = self.get(self.root);
        let mut policy = vec![0.0; board_size * board_size];

        let visits: Vec<(Position, u32)> = root
            .child_positions
            .iter()
            .zip(&root.children)
            .filter_map(|(pos, child)| child.map(|id| (*pos, self.get(id).visit_count)))
            .collect();

        let total: u32 = visits.iter().map(|(_, v)| v).sum();
        if total > 0 {
            for (pos, v) in visits {
                policy[pos.index(board_size)] = v as f32 / total as f32;
            }
        }

        policy
    }

    /// Get statistics about the tree for debugging.
    pub fn stats(&self) -> TreeStats {
        let root = self.get(self.root);
        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: root.visit_count,
            root_value: root.mean_value(),
            max_depth: self.compute_max_depth(self.root, 0),
        }
    }

    fn compute_max_depth(&self, node_id: NodeId, current_depth: u32) -> u32 {
        self.get(node_id)
            .children
            .iter()
            .flatten()
            .map(|id| self.compute_max_depth(*id, current_depth + 1))
            .max()
            .unwrap_or(current_depth)
    }
}

/// Statistics about an MCTS tree.
#[derive(Debug, Clone)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    pub root_value: f32,
    pub max_depth: u32,
}
