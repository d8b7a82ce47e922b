//! Semantic pass: merge, split, upgrade and downgrade recognition.
//!
//! Works on the basic operation list in place. Every recognized pattern
//! removes the basic operations it explains and takes the position of the
//! first of them, so the final list stays in basic-pass order. A node takes
//! part in at most one merge or split.
//!
//! Children of each anchor parent are tokenized once. A target whose tokens
//! meet no eligible sibling is skipped without scoring, and sibling windows
//! are scored incrementally, stopping as soon as the window grows past the
//! point where the threshold is reachable.

use std::collections::{HashMap, HashSet};

use log::trace;
use tree_diff_util::{dice, insertion_sort_by_key, is_blank, TokenBag};

use crate::config::AttributeOrder;
use crate::matching::Matching;
use crate::tree::{NodeId, Tree};

use super::Operation;

/// Longest sibling window considered as merge sources or split results.
const MAX_WINDOW: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Side {
    One,
    Two,
}

impl Side {
    fn other(self) -> Side {
        match self {
            Side::One => Side::Two,
            Side::Two => Side::One,
        }
    }
}

pub(super) fn recognize(matching: &Matching<'_>, ops: Vec<Operation>, threshold: f64) -> Vec<Operation> {
    let mut pass = SemanticPass::new(matching, ops, threshold);
    let tree1 = matching.tree1();
    let tree2 = matching.tree2();

    for r in tree2.preorder(tree2.root()) {
        pass.collapse(Side::Two, r);
    }
    for s in tree1.preorder(tree1.root()) {
        pass.collapse(Side::One, s);
    }
    pass.relevel();
    pass.finish()
}

struct SemanticPass<'m, 't> {
    matching: &'m Matching<'t>,
    threshold: f64,
    slots: Vec<Option<Operation>>,
    /// Semantic operations keyed by the slot they take the place of.
    anchored: Vec<(usize, Operation)>,
    deletes: HashMap<NodeId, usize>,
    inserts: HashMap<NodeId, usize>,
    /// Update and move slots, keyed by the tree1 node of the pair.
    updates: HashMap<NodeId, usize>,
    moves: HashMap<NodeId, usize>,
    used1: HashSet<NodeId>,
    used2: HashSet<NodeId>,
    /// Used nodes and all of their ancestors.
    touched1: HashSet<NodeId>,
    touched2: HashSet<NodeId>,
    /// Per arena slot: the node and its whole subtree are unmatched.
    unmatched1: Vec<bool>,
    unmatched2: Vec<bool>,
    siblings: HashMap<(Side, NodeId), Siblings>,
}

impl<'m, 't> SemanticPass<'m, 't> {
    fn new(matching: &'m Matching<'t>, ops: Vec<Operation>, threshold: f64) -> Self {
        let mut pass = Self {
            matching,
            threshold,
            slots: Vec::with_capacity(ops.len()),
            anchored: Vec::new(),
            deletes: HashMap::new(),
            inserts: HashMap::new(),
            updates: HashMap::new(),
            moves: HashMap::new(),
            used1: HashSet::new(),
            used2: HashSet::new(),
            touched1: HashSet::new(),
            touched2: HashSet::new(),
            unmatched1: unmatched_subtrees(matching.tree1(), |id| matching.is_matched1(id)),
            unmatched2: unmatched_subtrees(matching.tree2(), |id| matching.is_matched2(id)),
            siblings: HashMap::new(),
        };
        for (i, op) in ops.into_iter().enumerate() {
            match &op {
                Operation::Delete { node } => {
                    pass.deletes.insert(*node, i);
                }
                Operation::Insert { node } => {
                    pass.inserts.insert(*node, i);
                }
                Operation::Update { node1, .. } => {
                    pass.updates.insert(*node1, i);
                }
                Operation::Move { node1, .. } => {
                    pass.moves.insert(*node1, i);
                }
                _ => {}
            }
            pass.slots.push(Some(op));
        }
        pass
    }

    // ── Side helpers ─────────────────────────────────────────────────────

    fn tree(&self, side: Side) -> &'t Tree {
        match side {
            Side::One => self.matching.tree1(),
            Side::Two => self.matching.tree2(),
        }
    }

    fn partner(&self, side: Side, id: NodeId) -> Option<NodeId> {
        match side {
            Side::One => self.matching.partner1(id),
            Side::Two => self.matching.partner2(id),
        }
    }

    fn is_used(&self, side: Side, id: NodeId) -> bool {
        match side {
            Side::One => self.used1.contains(&id),
            Side::Two => self.used2.contains(&id),
        }
    }

    fn mark_used(&mut self, side: Side, id: NodeId) {
        let tree = self.tree(side);
        let (used, touched) = match side {
            Side::One => (&mut self.used1, &mut self.touched1),
            Side::Two => (&mut self.used2, &mut self.touched2),
        };
        used.insert(id);
        let mut cursor = Some(id);
        while let Some(n) = cursor {
            if !touched.insert(n) {
                break;
            }
            cursor = tree.parent(n);
        }
    }

    /// Tree1 node of the pair `id` belongs to.
    fn pair_key(&self, side: Side, id: NodeId, partner: NodeId) -> NodeId {
        match side {
            Side::One => id,
            Side::Two => partner,
        }
    }

    /// Whole subtree unmatched and not yet consumed by another pattern.
    fn is_fresh(&self, side: Side, id: NodeId) -> bool {
        let (unmatched, touched) = match side {
            Side::One => (&self.unmatched1, &self.touched1),
            Side::Two => (&self.unmatched2, &self.touched2),
        };
        unmatched.get(id.index()).copied().unwrap_or(false) && !touched.contains(&id)
    }

    fn take(&mut self, slot: Option<usize>, removed: &mut Vec<usize>) {
        if let Some(i) = slot {
            if self.slots[i].take().is_some() {
                removed.push(i);
            }
        }
    }

    /// Remove the basic records of the subtree at `root` that `counterpart`
    /// explains and mark those nodes used. `root` itself is always absorbed.
    /// A matched descendant is absorbed when its partner lies inside the
    /// counterpart, an unmatched one when its text is made of counterpart
    /// tokens. Everything else keeps its record.
    fn absorb(&mut self, side: Side, root: NodeId, counterpart: &Counterpart, removed: &mut Vec<usize>) {
        let tree = self.tree(side);
        for d in tree.preorder(root) {
            let partner = self.partner(side, d);
            let explained = d == root
                || match partner {
                    Some(q) => counterpart.nodes.contains(&q),
                    None => counterpart.explains_text(&tree.text_content(d)),
                };
            if !explained {
                trace!("{d} stays outside the pattern rooted at {root}");
                continue;
            }
            match partner {
                Some(q) => {
                    let key = self.pair_key(side, d, q);
                    self.take(self.updates.get(&key).copied(), removed);
                    self.take(self.moves.get(&key).copied(), removed);
                }
                None => {
                    let slot = match side {
                        Side::One => self.deletes.get(&d).copied(),
                        Side::Two => self.inserts.get(&d).copied(),
                    };
                    self.take(slot, removed);
                }
            }
            self.mark_used(side, d);
        }
    }

    // ── Merge / split ────────────────────────────────────────────────────

    /// Try to explain `target` as the merge (target on side two) or split
    /// (target on side one) of a run of siblings on the other side.
    fn collapse(&mut self, side: Side, target: NodeId) {
        let Some(pieces) = self.find_pieces(side, target) else { return };
        let other = side.other();
        let from_target = Counterpart::new(self.tree(side), &[target]);
        let from_pieces = Counterpart::new(self.tree(other), &pieces);

        let mut removed = Vec::new();
        for &piece in &pieces {
            self.absorb(other, piece, &from_target, &mut removed);
        }
        self.absorb(side, target, &from_pieces, &mut removed);

        let op = match side {
            Side::Two => Operation::Merge { sources: pieces, result: target },
            Side::One => Operation::Split { source: target, results: pieces },
        };
        trace!("recognized {} of {} ({} basic operations)", op.kind(), target, removed.len());
        let anchor = removed.into_iter().min().unwrap_or(self.slots.len());
        self.anchored.push((anchor, op));
    }

    fn find_pieces(&mut self, side: Side, target: NodeId) -> Option<Vec<NodeId>> {
        if self.is_used(side, target) {
            return None;
        }
        let tree = self.tree(side);
        let other = side.other();
        let anchor_parent = self.partner(side, tree.parent(target)?)?;
        let partner = self.partner(side, target);
        if partner.is_none() && !self.is_fresh(side, target) {
            return None;
        }

        let piece_tree = self.tree(other);
        let text = tree.text_content(target);
        if is_blank(&text) {
            return None;
        }
        // a matched target only qualifies if its text changed
        if partner.is_some_and(|p| piece_tree.text_content(p) == text) {
            return None;
        }

        let key = (other, anchor_parent);
        self.siblings
            .entry(key)
            .or_insert_with(|| Siblings::new(piece_tree, anchor_parent));
        let siblings = self.siblings.get(&key)?;

        let wanted = TokenBag::new(&text);
        let eligible = |c: NodeId| {
            !self.is_used(other, c) && (Some(c) == partner || self.is_fresh(other, c))
        };
        let sharing = siblings.sharing(&wanted);
        if !sharing.iter().any(|&c| eligible(c)) {
            return None;
        }

        let search = WindowSearch {
            siblings,
            wanted: &wanted,
            sharing: &sharing,
            required: partner,
            threshold: self.threshold,
        };
        let mut best: Option<(f64, Vec<NodeId>)> = None;
        for run in sibling_runs(piece_tree, anchor_parent, eligible) {
            if let Some((score, window)) = search.best(&run) {
                if best.as_ref().map_or(true, |(s, _)| score > *s) {
                    best = Some((score, window));
                }
            }
        }
        best.map(|(_, pieces)| pieces)
    }

    // ── Upgrade / downgrade ──────────────────────────────────────────────

    /// Turn moves across depth levels of similar nodes into upgrades or
    /// downgrades, in place.
    fn relevel(&mut self) {
        let tree1 = self.tree(Side::One);
        let tree2 = self.tree(Side::Two);
        for slot in self.slots.iter_mut() {
            let Some(Operation::Move { node1, node2, .. }) = slot else { continue };
            let (node1, node2) = (*node1, *node2);
            if self.used1.contains(&node1) {
                continue;
            }
            let from_depth = tree1.depth(node1);
            let to_depth = tree2.depth(node2);
            if from_depth == to_depth {
                continue;
            }
            let similarity = tree1.similarity_to(node1, tree2, node2, AttributeOrder::Ignore);
            if similarity < self.threshold {
                continue;
            }
            let op = if to_depth < from_depth {
                Operation::Upgrade { node1, node2, from_depth, to_depth }
            } else {
                Operation::Downgrade { node1, node2, from_depth, to_depth }
            };
            trace!("recognized {} of {}", op.kind(), node1);
            *slot = Some(op);
        }
    }

    fn finish(self) -> Vec<Operation> {
        let mut anchored = self.anchored;
        insertion_sort_by_key(&mut anchored, |(anchor, _)| *anchor);
        let mut pending = anchored.into_iter().peekable();
        let mut out = Vec::with_capacity(self.slots.len());
        for (i, slot) in self.slots.into_iter().enumerate() {
            while let Some((_, op)) = pending.next_if(|(anchor, _)| *anchor <= i) {
                out.push(op);
            }
            if let Some(op) = slot {
                out.push(op);
            }
        }
        out.extend(pending.map(|(_, op)| op));
        out
    }
}

/// Per arena slot: whether the node and every descendant are unmatched.
fn unmatched_subtrees(tree: &Tree, is_matched: impl Fn(NodeId) -> bool) -> Vec<bool> {
    let mut out = vec![false; tree.arena_len()];
    let order: Vec<NodeId> = tree.preorder(tree.root()).collect();
    for &id in order.iter().rev() {
        out[id.index()] = !is_matched(id) && tree.children(id).iter().all(|c| out[c.index()]);
    }
    out
}

// ── Pattern pieces ─────────────────────────────────────────────────────────

/// Children of an anchor parent with their tokenized text.
struct Siblings {
    bags: HashMap<NodeId, TokenBag>,
    /// Children whose text contains each token.
    by_token: HashMap<String, Vec<NodeId>>,
}

impl Siblings {
    fn new(tree: &Tree, parent: NodeId) -> Self {
        let mut bags = HashMap::with_capacity(tree.children(parent).len());
        let mut by_token: HashMap<String, Vec<NodeId>> = HashMap::new();
        for &c in tree.children(parent) {
            let bag = TokenBag::new(&tree.text_content(c));
            for (token, _) in bag.iter() {
                by_token.entry(token.to_owned()).or_default().push(c);
            }
            bags.insert(c, bag);
        }
        Self { bags, by_token }
    }

    /// Children sharing at least one token with `bag`.
    fn sharing(&self, bag: &TokenBag) -> HashSet<NodeId> {
        bag.iter()
            .filter_map(|(token, _)| self.by_token.get(token))
            .flatten()
            .copied()
            .collect()
    }
}

/// Nodes and text of one side of a recognized pattern.
struct Counterpart {
    nodes: HashSet<NodeId>,
    tokens: TokenBag,
}

impl Counterpart {
    fn new(tree: &Tree, roots: &[NodeId]) -> Self {
        let nodes = roots.iter().flat_map(|&r| tree.preorder(r)).collect();
        let text: Vec<String> = roots.iter().map(|&r| tree.text_content(r)).collect();
        Self { nodes, tokens: TokenBag::new(&text.join(" ")) }
    }

    fn explains_text(&self, text: &str) -> bool {
        let own = TokenBag::new(text);
        !own.is_empty() && own.is_subset_of(&self.tokens)
    }
}

/// Maximal runs (length ≥ 2) of consecutive eligible children of `parent`
/// sharing a label.
fn sibling_runs(tree: &Tree, parent: NodeId, eligible: impl Fn(NodeId) -> bool) -> Vec<Vec<NodeId>> {
    let mut runs = Vec::new();
    let mut current: Vec<NodeId> = Vec::new();
    for &c in tree.children(parent) {
        if !eligible(c) {
            runs.push(std::mem::take(&mut current));
            continue;
        }
        if current.first().is_some_and(|&head| tree.label(head) != tree.label(c)) {
            runs.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    runs.push(current);
    runs.retain(|run| run.len() >= 2);
    runs
}

/// Scores sibling windows against a target's tokens.
struct WindowSearch<'a> {
    siblings: &'a Siblings,
    wanted: &'a TokenBag,
    /// Siblings sharing a token with the target; only they open a window.
    sharing: &'a HashSet<NodeId>,
    required: Option<NodeId>,
    threshold: f64,
}

impl WindowSearch<'_> {
    /// Best window of at least two run members (containing `required`, if
    /// any) scoring at or above the threshold. Earlier and shorter windows
    /// win ties.
    fn best(&self, run: &[NodeId]) -> Option<(f64, Vec<NodeId>)> {
        let required_at = match self.required {
            Some(r) => Some(run.iter().position(|&c| c == r)?),
            None => None,
        };
        let last_start = required_at.unwrap_or(run.len());
        let wanted = self.wanted.len();

        let mut best: Option<(f64, Vec<NodeId>)> = None;
        for start in 0..run.len().min(last_start + 1) {
            let head = run[start];
            if !self.sharing.contains(&head) && Some(head) != self.required {
                continue;
            }
            let mut seen: HashMap<&str, usize> = HashMap::new();
            let (mut common, mut len) = (0usize, 0usize);
            for stop in start..run.len().min(start + MAX_WINDOW) {
                if let Some(bag) = self.siblings.bags.get(&run[stop]) {
                    for (token, n) in bag.iter() {
                        let cap = self.wanted.count(token);
                        let count = seen.entry(token).or_insert(0);
                        common += (*count + n).min(cap) - (*count).min(cap);
                        *count += n;
                    }
                    len += bag.len();
                }
                // best case for this window and every longer one
                if dice(wanted, len, wanted) < self.threshold {
                    break;
                }
                if stop == start || required_at.is_some_and(|at| stop < at) {
                    continue;
                }
                let score = dice(common, len, wanted);
                if score >= self.threshold && best.as_ref().map_or(true, |(s, _)| score > *s) {
                    best = Some((score, run[start..=stop].to_vec()));
                }
            }
        }
        best
    }
}
