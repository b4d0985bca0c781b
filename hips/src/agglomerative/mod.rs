//! Unconstrained binary merge tree built by repeated best-pair merging.
//!
//! Unlike [`crate::Tree`], the leaf count is arbitrary and the tree is not
//! balanced. Nodes live in an arena: the input descriptors are the first
//! `leaf_count` entries, each merge appends one internal node, and the last
//! entry is the root.
//!
//! Every internal node is the OR of its two children, so coverage error never
//! decreases on the way down. Pruning a subtree whose root already misses the
//! threshold loses nothing, which makes both queries exact.

use std::collections::{BTreeSet, VecDeque};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::descriptor::Descriptor;
use crate::error::{Result, check_index};


/// One arena entry of an [`AgglomerativeIndex`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgglomerativeNode<const WORDS: usize = 4> {
    pub descriptor: Descriptor<WORDS>,
    /// Arena indices of the merged pair. `None` for leaves.
    pub children: Option<[usize; 2]>,
    /// Input index for leaves.
    pub leaf: Option<usize>,
}

impl<const WORDS: usize> AgglomerativeNode<WORDS> {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// A leaf reached by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeafMatch {
    /// Coverage error of the query against the leaf.
    pub distance: u32,
    /// Input index of the leaf.
    pub leaf: usize,
}

/// Merge tree over an arbitrary number of descriptors.
#[derive(Debug, Clone)]
pub struct AgglomerativeIndex<const WORDS: usize = 4> {
    nodes: Vec<AgglomerativeNode<WORDS>>,
    leaf_count: usize,
}

impl<const WORDS: usize> AgglomerativeIndex<WORDS> {
    /// Build the merge tree.
    ///
    /// Repeatedly takes the active node with the fewest set bits (lowest arena
    /// index on ties), merges it with the active partner that minimizes the
    /// population of the merged descriptor (first found on ties), and makes
    /// the merged node active, until one node remains.
    ///
    /// Returns `None` if `descriptors` is empty.
    pub fn build(descriptors: &[Descriptor<WORDS>]) -> Option<Self> {
        if descriptors.is_empty() {
            return None;
        }

        let start = Instant::now();
        let leaf_count = descriptors.len();
        let mut nodes: Vec<AgglomerativeNode<WORDS>> = Vec::with_capacity(2 * leaf_count - 1);
        let mut active: BTreeSet<(u32, usize)> = BTreeSet::new();

        for (i, d) in descriptors.iter().enumerate() {
            nodes.push(AgglomerativeNode {
                descriptor: *d,
                children: None,
                leaf: Some(i),
            });
            active.insert((d.count_ones(), i));
        }

        while let Some(first) = active.pop_first() {
            let (_, a) = first;

            let mut best: Option<(u32, (u32, usize))> = None;
            for &entry in &active {
                let cost = nodes[a].descriptor.merge(&nodes[entry.1].descriptor).count_ones();
                if best.is_none_or(|(best_cost, _)| cost < best_cost) {
                    best = Some((cost, entry));
                }
            }

            // Last active node is the root.
            let Some((cost, partner)) = best else {
                break;
            };
            active.remove(&partner);

            let b = partner.1;
            let merged = nodes.len();
            let descriptor = nodes[a].descriptor.merge(&nodes[b].descriptor);
            nodes.push(AgglomerativeNode {
                descriptor,
                children: Some([a, b]),
                leaf: None,
            });
            active.insert((cost, merged));
        }

        debug_assert_eq!(nodes.len(), 2 * leaf_count - 1);

        tracing::debug!(
            leaves = leaf_count,
            nodes = nodes.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Agglomerative index built"
        );

        Some(Self { nodes, leaf_count })
    }

    /// Number of arena entries, `2 * leaf_count - 1`.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    #[inline]
    pub fn nodes(&self) -> &[AgglomerativeNode<WORDS>] {
        &self.nodes
    }

    /// Arena index of the root.
    #[inline]
    pub fn root(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn node(&self, index: usize) -> Result<&AgglomerativeNode<WORDS>> {
        let index = check_index("agglomerative node", index, self.nodes.len())?;
        Ok(&self.nodes[index])
    }

    /// Every leaf whose coverage error against `query` is below `threshold`,
    /// in breadth-first order.
    pub fn find_matches(&self, query: &Descriptor<WORDS>, threshold: u32) -> Vec<LeafMatch> {
        let mut found = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(self.root());

        while let Some(index) = queue.pop_front() {
            let node = &self.nodes[index];
            let distance = query.error(&node.descriptor);
            if distance >= threshold {
                continue;
            }
            match (node.children, node.leaf) {
                (Some([left, right]), _) => {
                    queue.push_back(left);
                    queue.push_back(right);
                }
                (None, Some(leaf)) => found.push(LeafMatch { distance, leaf }),
                (None, None) => {}
            }
        }

        found
    }

    /// The leaf with the smallest coverage error against `query`, if that
    /// error is below `threshold`.
    ///
    /// The bound tightens to the best distance seen, so later subtrees are
    /// only entered if they can improve on it. The first leaf found wins ties.
    pub fn best_match(&self, query: &Descriptor<WORDS>, threshold: u32) -> Option<LeafMatch> {
        let mut best: Option<LeafMatch> = None;
        let mut bound = threshold;
        let mut stack = vec![self.root()];

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            let distance = query.error(&node.descriptor);
            if distance >= bound {
                continue;
            }
            match (node.children, node.leaf) {
                (Some([left, right]), _) => {
                    stack.push(right);
                    stack.push(left);
                }
                (None, Some(leaf)) => {
                    best = Some(LeafMatch { distance, leaf });
                    if distance == 0 {
                        break;
                    }
                    bound = distance;
                }
                (None, None) => {}
            }
        }

        best
    }

    /// [`Self::best_match`] for every query, in parallel. Output is aligned
    /// with `queries`.
    pub fn best_matches(
        &self,
        queries: &[Descriptor<WORDS>],
        threshold: u32,
    ) -> Vec<Option<LeafMatch>> {
        queries
            .par_iter()
            .map(|query| self.best_match(query, threshold))
            .collect()
    }
}
