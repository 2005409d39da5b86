//! Tategaki Core Library
//!
//! This crate provides the core functionality for Tategaki, a local-first
//! writing tool for vertically typeset Japanese fiction: project and
//! chapter storage, the stored markup model, annotation editing (ruby,
//! tate-chu-yoko, emphasis marks), search and replace, and character
//! counting.
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let mut store = Store::open(&config);
//!
//! // Create a project and edit its first chapter
//! let mut project = Project::new("雪の話");
//! project.chapters[0].set_html("<p>吾輩は猫である。</p>");
//! project.chapters[0].recount();
//! let project = store.put(&project);
//!
//! // Annotate: wrap a range in ruby
//! let mut body = Fragment::from_markup(&project.chapters[0].html)?;
//! annotate::insert_ruby(&mut body, &range, "わがはい");
//! ```
//!
//! # Modules
//!
//! - `store`: Unified storage interface (main entry point)
//! - `storage`: SQLite and flat-file persistence backends
//! - `models`: Projects, chapters, and typesetting settings
//! - `richtext`: Stored markup parsing, the block/inline tree, ranges
//! - `annotate`: Ruby, tate-chu-yoko, emphasis, search and replace
//! - `count`: Character counting
//! - `export`: Printable HTML and catalog rendering
//! - `saver`: Debounced save coalescing
//! - `config`: Application configuration

pub mod annotate;
pub mod config;
pub mod count;
pub mod export;
pub mod models;
pub mod richtext;
pub mod saver;
pub mod storage;
pub mod store;

pub use config::Config;
pub use models::{Chapter, Direction, ImportError, ParagraphMode, Project, Settings};
pub use richtext::markup::ParseError;
pub use richtext::range::{NodePath, Position, Range};
pub use richtext::{Block, EmphasisStyle, Fragment, Inline};
pub use saver::DebouncedSaver;
pub use storage::StorageError;
pub use store::{BackendKind, Store};
