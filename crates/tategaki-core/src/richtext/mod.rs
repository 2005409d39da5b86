//! Rich-text content tree
//!
//! Chapter bodies and project notes are stored as a small HTML subset
//! (the canonical serialized form). In memory they are an explicit tagged
//! tree: paragraphs containing plain text runs, ruby annotations,
//! combined-horizontal (TCY) runs, and emphasis runs.
//!
//! - `markup`: canonical serializer and parser for the HTML subset
//! - `range`: path-addressed positions and the range contract used by the
//!   annotation engine (text projection, extract, insert, surround)
//! - `walk`: document-order traversal of text-bearing leaves

pub mod markup;
pub mod range;
pub mod walk;

pub use markup::ParseError;
pub use range::{NodePath, Position, Range};

use serde::{Deserialize, Serialize};

/// Emphasis mark style, rendered beside characters in vertical flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmphasisStyle {
    /// Filled dot marks
    Dot,
    /// Sesame-seed marks
    Sesame,
}

/// An inline node within a paragraph
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    /// A plain text run
    Text(String),
    /// A ruby annotation: base text with a phonetic reading gloss
    Ruby { base: String, reading: String },
    /// A combined-horizontal run (tate-chu-yoko), chiefly for digit runs
    Tcy(Vec<Inline>),
    /// An emphasis run tagged with its mark style
    Emphasis {
        style: EmphasisStyle,
        children: Vec<Inline>,
    },
}

impl Inline {
    /// Plain-text projection of this node
    ///
    /// Ruby readings are presentation-only and excluded; only the base
    /// (visible) text is projected.
    pub fn plain_text(&self) -> String {
        match self {
            Inline::Text(text) => text.clone(),
            Inline::Ruby { base, .. } => base.clone(),
            Inline::Tcy(children) | Inline::Emphasis { children, .. } => {
                children.iter().map(Inline::plain_text).collect()
            }
        }
    }

    /// Child list for container nodes, `None` for leaves
    pub fn children(&self) -> Option<&Vec<Inline>> {
        match self {
            Inline::Tcy(children) | Inline::Emphasis { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Mutable child list for container nodes
    pub fn children_mut(&mut self) -> Option<&mut Vec<Inline>> {
        match self {
            Inline::Tcy(children) | Inline::Emphasis { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Shorthand for a text run
    pub fn text(content: impl Into<String>) -> Self {
        Inline::Text(content.into())
    }
}

/// A block-level node
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// A paragraph of inline content
    Paragraph(Vec<Inline>),
}

impl Block {
    pub fn children(&self) -> &Vec<Inline> {
        match self {
            Block::Paragraph(children) => children,
        }
    }

    pub fn children_mut(&mut self) -> &mut Vec<Inline> {
        match self {
            Block::Paragraph(children) => children,
        }
    }

    pub fn plain_text(&self) -> String {
        self.children().iter().map(Inline::plain_text).collect()
    }
}

/// An ordered tree of blocks; the editable body of a chapter or the notes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    pub blocks: Vec<Block>,
}

impl Fragment {
    /// Parse the canonical serialized form
    pub fn from_markup(input: &str) -> Result<Self, ParseError> {
        markup::parse(input)
    }

    /// Serialize back to the canonical form
    pub fn to_markup(&self) -> String {
        markup::serialize(self)
    }

    /// Plain-text projection of the whole tree, block contents concatenated
    pub fn plain_text(&self) -> String {
        self.blocks.iter().map(Block::plain_text).collect()
    }
}
