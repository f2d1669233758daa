//! Tree data structures for the UCT searcher
//!
//! Nodes live in a flat arena and refer to each other by index. A node keeps
//! its parent's index for backpropagation; the parent owns nothing but the
//! indices of its children. Positions are not stored: a search replays the
//! moves from the root position on the way down.

use std::fmt;

use crate::board::{Coord, MoveList, Player};
use crate::utils;

/// Index of a node in its [`Tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One position reached by one move
#[derive(Debug, Clone)]
pub struct Node {
    /// The move that led here (`None` for the root)
    pub mv: Option<Coord>,

    pub parent: Option<NodeId>,

    pub children: Vec<NodeId>,

    pub visits: u64,

    /// Sum of playout results for `player_just_moved`
    pub wins: f64,

    /// Moves not yet expanded into children
    pub untried: MoveList,

    /// Side whose move led to this position
    pub player_just_moved: Player,

    /// Distance from the root
    pub depth: usize,
}

impl Node {
    /// Win rate for the side that moved into this node
    pub fn value(&self) -> f64 {
        utils::win_rate(self.wins, self.visits)
    }

    pub fn is_fully_expanded(&self) -> bool {
        self.untried.is_empty()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena of nodes with the root at index 0
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// A tree holding only a root with the given untried moves
    pub fn new(untried: MoveList, player_just_moved: Player) -> Self {
        Tree {
            nodes: vec![Node {
                mv: None,
                parent: None,
                children: Vec::new(),
                visits: 0,
                wins: 0.0,
                untried,
                player_just_moved,
                depth: 0,
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Moves `untried[index]` of `parent` into a new child node
    pub fn expand(
        &mut self,
        parent: NodeId,
        index: usize,
        untried: MoveList,
        player_just_moved: Player,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let node = &mut self.nodes[parent.0];
        let mv = node.untried.swap_remove(index);
        node.children.push(id);
        let depth = node.depth + 1;
        self.nodes.push(Node {
            mv: Some(mv),
            parent: Some(parent),
            children: Vec::new(),
            visits: 0,
            wins: 0.0,
            untried,
            player_just_moved,
            depth,
        });
        id
    }

    /// Child of `parent` reached by `mv`, if already expanded
    pub fn find_child(&self, parent: NodeId, mv: Coord) -> Option<NodeId> {
        self.get(parent)
            .children
            .iter()
            .copied()
            .find(|&child| self.get(child).mv == Some(mv))
    }

    /// Extracts the subtree under `id` as a new tree rooted at index 0.
    ///
    /// The new root has no parent and depth 0; the rest of the old tree is
    /// left behind.
    pub fn reroot(&self, id: NodeId) -> Tree {
        let mut remap = vec![usize::MAX; self.nodes.len()];
        let mut order = vec![id];
        remap[id.0] = 0;
        let mut next = 0;
        while next < order.len() {
            let current = order[next];
            for &child in &self.get(current).children {
                remap[child.0] = order.len();
                order.push(child);
            }
            next += 1;
        }

        let base = self.get(id).depth;
        let nodes = order
            .iter()
            .map(|&old| {
                let node = self.get(old);
                Node {
                    mv: node.mv,
                    parent: if old == id {
                        None
                    } else {
                        node.parent.map(|p| NodeId(remap[p.0]))
                    },
                    children: node.children.iter().map(|c| NodeId(remap[c.0])).collect(),
                    visits: node.visits,
                    wins: node.wins,
                    untried: node.untried,
                    player_just_moved: node.player_just_moved,
                    depth: node.depth - base,
                }
            })
            .collect();
        Tree { nodes }
    }
}

impl fmt::Display for Tree {
    /// Root and its children with their statistics
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = self.get(self.root());
        writeln!(f, "root (visits: {}, nodes: {})", root.visits, self.len())?;
        for &child in &root.children {
            let node = self.get(child);
            if let Some(mv) = node.mv {
                writeln!(
                    f,
                    "  {} (visits: {}, value: {:.3})",
                    mv,
                    node.visits,
                    node.value()
                )?;
            }
        }
        Ok(())
    }
}
