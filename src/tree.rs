//! Block tree construction from flat, parent-linked records.
//!
//! The tree is built in one pass over an id → index map. Parent pointers are
//! never followed, so malformed data cannot loop:
//! - hidden records are dropped before linking
//! - a missing or self-referencing parent makes the record a root
//! - records trapped in a parent cycle are promoted to roots
//!
//! Siblings are ordered by `sort_order`, ties keeping input order.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::block::BlockRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockTree {
    #[serde(flatten)]
    pub record: BlockRecord,
    #[serde(default)]
    pub children: Vec<BlockTree>,
}

impl BlockTree {
    pub fn id(&self) -> &str {
        &self.record.id
    }
}

pub fn build_block_tree(records: &[BlockRecord]) -> Vec<BlockTree> {
    let visible: Vec<&BlockRecord> = records.iter().filter(|r| r.is_visible).collect();

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(visible.len());
    for (i, record) in visible.iter().enumerate() {
        index.entry(record.id.as_str()).or_insert(i);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); visible.len()];
    let mut roots = Vec::new();
    for (i, record) in visible.iter().enumerate() {
        let parent = record
            .parent_block_id
            .as_deref()
            .filter(|parent| *parent != record.id)
            .and_then(|parent| index.get(parent).copied());
        match parent {
            Some(parent) => children[parent].push(i),
            None => roots.push(i),
        }
    }

    let mut reached = vec![false; visible.len()];
    for &root in &roots {
        mark_reachable(root, &children, &mut reached);
    }
    for i in 0..visible.len() {
        if !reached[i] {
            roots.push(i);
            mark_reachable(i, &children, &mut reached);
        }
    }

    let by_order = |i: &usize| (visible[*i].sort_order, *i);
    roots.sort_by_key(by_order);
    for siblings in &mut children {
        siblings.sort_by_key(by_order);
    }

    let mut built = vec![false; visible.len()];
    roots
        .iter()
        .filter_map(|&root| build_node(root, &visible, &children, &mut built))
        .collect()
}

fn mark_reachable(start: usize, children: &[Vec<usize>], reached: &mut [bool]) {
    let mut stack = vec![start];
    while let Some(i) = stack.pop() {
        if reached[i] {
            continue;
        }
        reached[i] = true;
        stack.extend(children[i].iter().copied().filter(|c| !reached[*c]));
    }
}

fn build_node(
    i: usize,
    records: &[&BlockRecord],
    children: &[Vec<usize>],
    built: &mut [bool],
) -> Option<BlockTree> {
    if built[i] {
        return None;
    }
    built[i] = true;
    let nodes = children[i]
        .iter()
        .filter_map(|&child| build_node(child, records, children, built))
        .collect();
    Some(BlockTree {
        record: records[i].clone(),
        children: nodes,
    })
}

/// Depth-first, pre-order walk of the tree.
pub fn flatten_tree(trees: &[BlockTree]) -> Vec<&BlockRecord> {
    fn walk<'a>(node: &'a BlockTree, out: &mut Vec<&'a BlockRecord>) {
        out.push(&node.record);
        for child in &node.children {
            walk(child, out);
        }
    }
    let mut out = Vec::new();
    for tree in trees {
        walk(tree, &mut out);
    }
    out
}
