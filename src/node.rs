//! Search nodes, the node arena, and path reconstruction.
//!
//! Nodes live in a [`SearchTree`] arena and refer to each other by
//! [`NodeId`]. Single-parent searches only use the `parent` back-link. When
//! lattice links are enabled the arena also records every predecessor and
//! successor edge discovered, which lets a finished search label nodes with
//! their graph distance to the goal.

use std::collections::VecDeque;

use crate::board::{Configuration, Move};

/// Index of a node in its [`SearchTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A configuration plus its search bookkeeping.
#[derive(Clone, Debug)]
pub struct SearchNode {
    pub config: Configuration,
    /// Moves taken from the initial configuration.
    pub g: u32,
    /// Heuristic estimate to the goal.
    pub h: u32,
    /// Move that produced this node from `parent`.
    pub via: Option<Move>,
    pub parent: Option<NodeId>,
}

impl SearchNode {
    #[inline]
    pub fn f(&self) -> u32 {
        self.g + self.h
    }
}

/// Edges recorded in lattice mode.
#[derive(Clone, Debug, Default)]
struct Links {
    predecessors: Vec<NodeId>,
    successors: Vec<NodeId>,
}

/// Arena of search nodes.
#[derive(Debug, Default)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
    links: Option<Vec<Links>>,
}

impl SearchTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// An arena that also records predecessor and successor edges.
    pub fn with_links() -> Self {
        Self {
            nodes: Vec::new(),
            links: Some(Vec::new()),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id.index()]
    }

    /// Adds the initial node (no parent, `g = 0`).
    pub fn push_root(&mut self, config: Configuration, h: u32) -> NodeId {
        self.insert(SearchNode {
            config,
            g: 0,
            h,
            via: None,
            parent: None,
        })
    }

    /// Adds a node reached from `parent` by `via`, one move deeper.
    pub fn push_child(
        &mut self,
        parent: NodeId,
        via: Move,
        config: Configuration,
        h: u32,
    ) -> NodeId {
        let g = self.get(parent).g + 1;
        let id = self.insert(SearchNode {
            config,
            g,
            h,
            via: Some(via),
            parent: Some(parent),
        });
        self.record_edge(parent, id);
        id
    }

    fn insert(&mut self, node: SearchNode) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).expect("node arena exceeds u32 ids"));
        self.nodes.push(node);
        if let Some(links) = &mut self.links {
            links.push(Links::default());
        }
        id
    }

    fn record_edge(&mut self, from: NodeId, to: NodeId) {
        if let Some(links) = &mut self.links {
            links[to.index()].predecessors.push(from);
            links[from.index()].successors.push(to);
        }
    }

    /// Records that `to` is also reachable from `from` by `via`.
    ///
    /// If that route is strictly shorter, `to` adopts `from` as its parent
    /// so reconstruction always follows a minimal-`g` predecessor. Returns
    /// whether the parent changed.
    pub fn link(&mut self, from: NodeId, to: NodeId, via: Move) -> bool {
        let recorded = match &self.links {
            Some(links) => links[to.index()].predecessors.contains(&from),
            None => true,
        };
        if !recorded {
            self.record_edge(from, to);
        }
        let g = self.get(from).g + 1;
        let node = &mut self.nodes[to.index()];
        if g < node.g {
            node.g = g;
            node.parent = Some(from);
            node.via = Some(via);
            true
        } else {
            false
        }
    }

    /// Recorded predecessors of `id` (empty without lattice links).
    pub fn predecessors(&self, id: NodeId) -> &[NodeId] {
        self.links
            .as_ref()
            .map_or(&[], |links| links[id.index()].predecessors.as_slice())
    }

    /// Recorded successors of `id` (empty without lattice links).
    pub fn successors(&self, id: NodeId) -> &[NodeId] {
        self.links
            .as_ref()
            .map_or(&[], |links| links[id.index()].successors.as_slice())
    }

    /// Moves from the root to `id`, in play order.
    pub fn reconstruct(&self, id: NodeId) -> Vec<Move> {
        let mut moves = Vec::with_capacity(self.get(id).g as usize);
        let mut current = id;
        while let Some(parent) = self.get(current).parent {
            // every non-root node carries the move from its parent
            moves.extend(self.get(current).via);
            current = parent;
        }
        moves.reverse();
        moves
    }

    /// Graph distance from every node to the nearest of `goals`, walking the
    /// recorded links in both directions. Unreached nodes get `None`.
    ///
    /// Moves are reversible, so a predecessor edge is as good as a successor
    /// edge for measuring distance.
    pub fn distances_to(&self, goals: &[NodeId]) -> Vec<Option<u32>> {
        let mut distance: Vec<Option<u32>> = vec![None; self.nodes.len()];
        let mut queue = VecDeque::new();
        for &goal in goals {
            if distance[goal.index()].is_none() {
                distance[goal.index()] = Some(0);
                queue.push_back(goal);
            }
        }

        while let Some(id) = queue.pop_front() {
            let next = distance[id.index()].unwrap_or(0) + 1;
            for &neighbour in self.predecessors(id).iter().chain(self.successors(id)) {
                if distance[neighbour.index()].is_none() {
                    distance[neighbour.index()] = Some(next);
                    queue.push_back(neighbour);
                }
            }
        }
        distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::SearchContext;
    use crate::geometry::Direction;
    use crate::grid::KeyScheme;
    use crate::pieces::CLASSIC;

    fn classic() -> SearchContext {
        SearchContext::new(&CLASSIC.layout().unwrap(), KeyScheme::default())
    }

    #[test]
    fn test_reconstruct_root_is_empty() {
        let ctx = classic();
        let mut tree = SearchTree::new();
        let root = tree.push_root(ctx.initial(), 0);
        assert!(tree.reconstruct(root).is_empty());
    }

    #[test]
    fn test_reconstruct_follows_back_links_in_order() {
        let ctx = classic();
        let mut tree = SearchTree::new();
        let root = tree.push_root(ctx.initial(), 0);

        let first = Move::new(8, Direction::Right);
        let second = Move::new(3, Direction::Down);
        let a = ctx.apply_move(&ctx.initial(), first);
        let b = ctx.apply_move(&a, second);
        let a_id = tree.push_child(root, first, a, 0);
        let b_id = tree.push_child(a_id, second, b, 0);

        assert_eq!(tree.get(b_id).g, 2);
        assert_eq!(tree.reconstruct(b_id), vec![first, second]);
        // idempotent
        assert_eq!(tree.reconstruct(b_id), tree.reconstruct(b_id));
    }

    #[test]
    fn test_link_prefers_shorter_predecessor() {
        let ctx = classic();
        let start = ctx.initial();
        let mut tree = SearchTree::with_links();
        let root = tree.push_root(start.clone(), 0);

        // soldier 8 wanders right, right, left: ends one step from the start
        let right = Move::new(8, Direction::Right);
        let left = Move::new(8, Direction::Left);
        let one = ctx.apply_move(&start, right);
        let two = ctx.apply_move(&one, right);
        let back = ctx.apply_move(&two, left);
        assert_eq!(back, one);

        let one_id = tree.push_child(root, right, one, 0);
        let two_id = tree.push_child(one_id, right, two, 0);
        let back_id = tree.push_child(two_id, left, back, 0);
        assert_eq!(tree.get(back_id).g, 3);

        assert!(tree.link(root, back_id, right));
        assert_eq!(tree.get(back_id).g, 1);
        assert_eq!(tree.reconstruct(back_id), vec![right]);
        assert_eq!(tree.predecessors(back_id), &[two_id, root]);
        assert_eq!(tree.successors(root), &[one_id, back_id]);

        // a longer route is recorded but does not take over
        assert!(!tree.link(two_id, back_id, left));
        assert_eq!(tree.predecessors(back_id), &[two_id, root]);
        assert_eq!(tree.get(back_id).parent, Some(root));
    }

    #[test]
    fn test_distances_walk_links_both_ways() {
        let ctx = classic();
        let start = ctx.initial();
        let mut tree = SearchTree::with_links();
        let root = tree.push_root(start.clone(), 0);

        let mv = Move::new(8, Direction::Right);
        let a = ctx.apply_move(&start, mv);
        let a_id = tree.push_child(root, mv, a.clone(), 0);
        let mv2 = Move::new(3, Direction::Down);
        let b_id = tree.push_child(a_id, mv2, ctx.apply_move(&a, mv2), 0);
        let other = Move::new(9, Direction::Left);
        let c_id = tree.push_child(root, other, ctx.apply_move(&start, other), 0);

        let distances = tree.distances_to(&[b_id]);
        assert_eq!(distances[b_id.index()], Some(0));
        assert_eq!(distances[a_id.index()], Some(1));
        assert_eq!(distances[root.index()], Some(2));
        assert_eq!(distances[c_id.index()], Some(3));
    }

    #[test]
    fn test_distances_without_links_only_mark_goals() {
        let ctx = classic();
        let mut tree = SearchTree::new();
        let root = tree.push_root(ctx.initial(), 0);
        let mv = Move::new(8, Direction::Right);
        let child = tree.push_child(root, mv, ctx.apply_move(&ctx.initial(), mv), 0);
        assert_eq!(tree.distances_to(&[child]), vec![None, Some(0)]);
    }
}
