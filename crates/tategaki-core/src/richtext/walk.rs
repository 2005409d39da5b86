//! Document-order traversal of text-bearing leaves
//!
//! The search and auto-wrap passes operate on text leaves in the order the
//! reader encounters them. Ruby base/reading strings are annotation fields,
//! not leaves, and are never yielded.

use super::range::NodePath;
use super::{Fragment, Inline};

/// Collect every text leaf with its node path, in document order
pub fn text_leaves(fragment: &Fragment) -> Vec<(NodePath, &str)> {
    let mut out = Vec::new();
    for (block_index, block) in fragment.blocks.iter().enumerate() {
        collect(block.children(), vec![block_index], &mut out);
    }
    out
}

fn collect<'a>(children: &'a [Inline], prefix: NodePath, out: &mut Vec<(NodePath, &'a str)>) {
    for (index, child) in children.iter().enumerate() {
        let mut path = prefix.clone();
        path.push(index);
        match child {
            Inline::Text(text) => out.push((path, text)),
            Inline::Tcy(inner)
            | Inline::Emphasis {
                children: inner, ..
            } => collect(inner, path, out),
            Inline::Ruby { .. } => {}
        }
    }
}

/// Visit every text leaf mutably, in document order
pub fn for_each_text_mut(fragment: &mut Fragment, visit: &mut impl FnMut(&mut String)) {
    for block in &mut fragment.blocks {
        visit_children(block.children_mut(), visit);
    }
}

fn visit_children(children: &mut [Inline], visit: &mut impl FnMut(&mut String)) {
    for child in children {
        match child {
            Inline::Text(text) => visit(text),
            Inline::Tcy(inner)
            | Inline::Emphasis {
                children: inner, ..
            } => visit_children(inner, visit),
            Inline::Ruby { .. } => {}
        }
    }
}
