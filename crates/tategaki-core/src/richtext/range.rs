//! Path-addressed positions and ranges over the content tree
//!
//! A position names a text leaf by its node path (block index, then child
//! indices) plus a character offset into that leaf. A range is the pair of
//! positions the host editing surface reports as the selection.
//!
//! Mutating operations require both endpoints to sit in sibling text leaves
//! of the same block, with any number of whole nodes between them. That is
//! the same constraint the DOM places on `surroundContents`: a range may
//! not partially contain a non-text node. Ranges that violate it are
//! treated as invalid selections and every operation becomes a no-op.

use super::{Fragment, Inline};

/// Index path from the root: `[block, child, child, …]`
pub type NodePath = Vec<usize>;

/// A character position inside a text leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub path: NodePath,
    /// Offset in characters, not bytes
    pub offset: usize,
}

impl Position {
    pub fn new(path: NodePath, offset: usize) -> Self {
        Self { path, offset }
    }
}

/// A selection range between two positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Whether the range selects nothing
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Plain-text projection of the selected content
    ///
    /// Returns `None` for ranges that do not resolve to a valid selection.
    pub fn text(&self, fragment: &Fragment) -> Option<String> {
        let (parent, start_index, end_index) = self.endpoints(fragment)?;
        let children = children_at(fragment, &parent)?;
        let start_text = leaf_text(&children[start_index])?;
        if start_index == end_index {
            let from = byte_at_char(start_text, self.start.offset)?;
            let to = byte_at_char(start_text, self.end.offset)?;
            return Some(start_text[from..to].to_string());
        }
        let end_text = leaf_text(&children[end_index])?;
        let from = byte_at_char(start_text, self.start.offset)?;
        let to = byte_at_char(end_text, self.end.offset)?;
        let mut out = start_text[from..].to_string();
        for node in &children[start_index + 1..end_index] {
            out.push_str(&node.plain_text());
        }
        out.push_str(&end_text[..to]);
        Some(out)
    }

    /// Delete the selected content
    pub fn delete_contents(&self, fragment: &mut Fragment) -> bool {
        self.splice(fragment, |_| Vec::new())
    }

    /// Insert a node at the start of the range, keeping its content
    pub fn insert_node(&self, fragment: &mut Fragment, node: Inline) -> bool {
        self.splice(fragment, |kept| {
            let mut replacement = vec![node];
            replacement.extend(kept);
            replacement
        })
    }

    /// Extract the selected content and re-insert it wrapped by `wrap`
    pub fn surround_contents(
        &self,
        fragment: &mut Fragment,
        wrap: impl FnOnce(Vec<Inline>) -> Inline,
    ) -> bool {
        self.splice(fragment, |extracted| vec![wrap(extracted)])
    }

    /// Replace the selected content with the nodes `build` produces from it
    ///
    /// Returns false (tree untouched) when the range is not a valid
    /// selection. Empty text runs created by splitting at the endpoints are
    /// dropped rather than kept as zero-length leaves.
    pub fn splice(
        &self,
        fragment: &mut Fragment,
        build: impl FnOnce(Vec<Inline>) -> Vec<Inline>,
    ) -> bool {
        let Some((parent, start_index, end_index)) = self.endpoints(fragment) else {
            return false;
        };
        let Some(children) = children_at_mut(fragment, &parent) else {
            return false;
        };

        if start_index == end_index {
            let Some(text) = leaf_text(&children[start_index]) else {
                return false;
            };
            let Some(from) = byte_at_char(text, self.start.offset) else {
                return false;
            };
            let Some(to) = byte_at_char(text, self.end.offset) else {
                return false;
            };
            let before = text[..from].to_string();
            let selected = text[from..to].to_string();
            let after = text[to..].to_string();

            let extracted = if selected.is_empty() {
                Vec::new()
            } else {
                vec![Inline::Text(selected)]
            };
            let mut replacement = Vec::new();
            if !before.is_empty() {
                replacement.push(Inline::Text(before));
            }
            replacement.extend(build(extracted).into_iter().filter(is_nonempty));
            if !after.is_empty() {
                replacement.push(Inline::Text(after));
            }
            children.splice(start_index..=start_index, replacement);
            return true;
        }

        let Some(start_text) = leaf_text(&children[start_index]) else {
            return false;
        };
        let Some(end_text) = leaf_text(&children[end_index]) else {
            return false;
        };
        let Some(from) = byte_at_char(start_text, self.start.offset) else {
            return false;
        };
        let Some(to) = byte_at_char(end_text, self.end.offset) else {
            return false;
        };
        let start_head = start_text[..from].to_string();
        let start_tail = start_text[from..].to_string();
        let end_head = end_text[..to].to_string();
        let end_tail = end_text[to..].to_string();

        let mut removed: Vec<Inline> = children
            .splice(start_index..=end_index, std::iter::empty())
            .collect();
        removed.pop();
        removed.remove(0);

        let mut extracted = Vec::new();
        if !start_tail.is_empty() {
            extracted.push(Inline::Text(start_tail));
        }
        extracted.extend(removed);
        if !end_head.is_empty() {
            extracted.push(Inline::Text(end_head));
        }

        let mut replacement = Vec::new();
        if !start_head.is_empty() {
            replacement.push(Inline::Text(start_head));
        }
        replacement.extend(build(extracted).into_iter().filter(is_nonempty));
        if !end_tail.is_empty() {
            replacement.push(Inline::Text(end_tail));
        }
        children.splice(start_index..start_index, replacement);
        true
    }

    /// Resolve and validate the endpoints: same parent, text leaves,
    /// in-bounds offsets, start not after end
    fn endpoints(&self, fragment: &Fragment) -> Option<(NodePath, usize, usize)> {
        let start_path = &self.start.path;
        let end_path = &self.end.path;
        if start_path.is_empty() || start_path.len() != end_path.len() {
            return None;
        }
        let parent = &start_path[..start_path.len() - 1];
        if parent != &end_path[..end_path.len() - 1] {
            return None;
        }
        let start_index = *start_path.last()?;
        let end_index = *end_path.last()?;
        if (start_index, self.start.offset) > (end_index, self.end.offset) {
            return None;
        }
        let children = children_at(fragment, parent)?;
        let start_text = leaf_text(children.get(start_index)?)?;
        let end_text = leaf_text(children.get(end_index)?)?;
        if self.start.offset > start_text.chars().count()
            || self.end.offset > end_text.chars().count()
        {
            return None;
        }
        Some((parent.to_vec(), start_index, end_index))
    }
}

fn is_nonempty(node: &Inline) -> bool {
    !matches!(node, Inline::Text(text) if text.is_empty())
}

fn leaf_text(node: &Inline) -> Option<&str> {
    match node {
        Inline::Text(text) => Some(text),
        _ => None,
    }
}

/// Byte index of the `chars`-th character, or the string length at the end
fn byte_at_char(text: &str, chars: usize) -> Option<usize> {
    if chars == 0 {
        return Some(0);
    }
    let mut seen = 0;
    for (index, _) in text.char_indices() {
        if seen == chars {
            return Some(index);
        }
        seen += 1;
    }
    (seen == chars).then_some(text.len())
}

/// Resolve a parent path to its child list
pub(crate) fn children_at<'a>(fragment: &'a Fragment, parent: &[usize]) -> Option<&'a Vec<Inline>> {
    let (&block_index, rest) = parent.split_first()?;
    let mut current = fragment.blocks.get(block_index)?.children();
    for &index in rest {
        current = current.get(index)?.children()?;
    }
    Some(current)
}

fn children_at_mut<'a>(fragment: &'a mut Fragment, parent: &[usize]) -> Option<&'a mut Vec<Inline>> {
    let (&block_index, rest) = parent.split_first()?;
    let mut current = fragment.blocks.get_mut(block_index)?.children_mut();
    for &index in rest {
        current = current.get_mut(index)?.children_mut()?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::EmphasisStyle;

    fn fragment(markup: &str) -> Fragment {
        Fragment::from_markup(markup).unwrap()
    }

    fn range(path: &[usize], from: usize, to_path: &[usize], to: usize) -> Range {
        Range::new(
            Position::new(path.to_vec(), from),
            Position::new(to_path.to_vec(), to),
        )
    }

    #[test]
    fn test_text_projection_single_leaf() {
        let tree = fragment("<p>吾輩は猫である</p>");
        let r = range(&[0, 0], 3, &[0, 0], 4);
        assert_eq!(r.text(&tree).unwrap(), "猫");
    }

    #[test]
    fn test_text_projection_across_siblings() {
        let tree = fragment("<p>前<span class=\"tcy\">12</span>後ろ</p>");
        let r = range(&[0, 0], 0, &[0, 2], 1);
        assert_eq!(r.text(&tree).unwrap(), "前12後");
    }

    #[test]
    fn test_delete_contents_within_leaf() {
        let mut tree = fragment("<p>吾輩は猫である</p>");
        let r = range(&[0, 0], 3, &[0, 0], 4);
        assert!(r.delete_contents(&mut tree));
        assert_eq!(tree.to_markup(), "<p>吾輩はである</p>");
    }

    #[test]
    fn test_surround_contents_splits_leaf() {
        let mut tree = fragment("<p>西暦2024年</p>");
        let r = range(&[0, 0], 2, &[0, 0], 6);
        assert!(r.surround_contents(&mut tree, Inline::Tcy));
        assert_eq!(
            tree.to_markup(),
            "<p>西暦<span class=\"tcy\">2024</span>年</p>"
        );
    }

    #[test]
    fn test_surround_contents_across_siblings() {
        let mut tree = fragment("<p>あ<span class=\"tcy\">12</span>いう</p>");
        let r = range(&[0, 0], 0, &[0, 2], 1);
        let wrapped = r.surround_contents(&mut tree, |children| Inline::Emphasis {
            style: EmphasisStyle::Dot,
            children,
        });
        assert!(wrapped);
        assert_eq!(
            tree.to_markup(),
            "<p><span class=\"emph\">あ<span class=\"tcy\">12</span>い</span>う</p>"
        );
    }

    #[test]
    fn test_insert_node_keeps_contents() {
        let mut tree = fragment("<p>ab</p>");
        let r = range(&[0, 0], 1, &[0, 0], 2);
        assert!(r.insert_node(&mut tree, Inline::text("X")));
        assert_eq!(tree.plain_text(), "aXb");
    }

    #[test]
    fn test_cross_block_range_is_invalid() {
        let mut tree = fragment("<p>一</p><p>二</p>");
        let r = range(&[0, 0], 0, &[1, 0], 1);
        assert!(!r.delete_contents(&mut tree));
        assert_eq!(tree.plain_text(), "一二");
    }

    #[test]
    fn test_non_leaf_endpoint_is_invalid() {
        let mut tree = fragment("<p><span class=\"tcy\">12</span>あ</p>");
        // Path [0, 0] addresses the tcy node itself, not a text leaf
        let r = range(&[0, 0], 0, &[0, 1], 1);
        assert!(!r.delete_contents(&mut tree));
    }

    #[test]
    fn test_out_of_bounds_offset_is_invalid() {
        let mut tree = fragment("<p>短い</p>");
        let r = range(&[0, 0], 0, &[0, 0], 9);
        assert!(!r.delete_contents(&mut tree));
    }

    #[test]
    fn test_reversed_range_is_invalid() {
        let mut tree = fragment("<p>逆転</p>");
        let r = range(&[0, 0], 2, &[0, 0], 0);
        assert!(!r.delete_contents(&mut tree));
    }

    #[test]
    fn test_whole_leaf_replacement_leaves_no_empty_runs() {
        let mut tree = fragment("<p>消える</p>");
        let r = range(&[0, 0], 0, &[0, 0], 3);
        assert!(r.splice(&mut tree, |_| vec![Inline::text("別")]));
        let crate::richtext::Block::Paragraph(children) = &tree.blocks[0];
        assert_eq!(children, &vec![Inline::text("別")]);
    }
}
