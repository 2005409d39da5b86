//! Data models for tategaki
//!
//! Defines the persisted entities: Project, Chapter, and Settings. Field
//! names serialize in camelCase because the stored record schema and the
//! project export format predate this crate; an exported file from an old
//! project imports unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

use crate::count;
use crate::richtext::EmphasisStyle;

/// Title suffix appended when cloning
pub const CLONE_SUFFIX: &str = "(複製)";
/// Title marker appended on import, signalling provenance
pub const IMPORT_MARKER: &str = "（インポート）";

/// A malformed import payload
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("invalid project JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Block progression of the text
///
/// Only vertical right-to-left is supported. The field exists as a
/// forward-compatibility guard: any other persisted value normalizes back
/// to vertical on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    VerticalRl,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        "vertical-rl"
    }
}

impl Serialize for Direction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Normalization guard: whatever was stored, vertical is what loads
        let _ = String::deserialize(deserializer)?;
        Ok(Direction::VerticalRl)
    }
}

/// Paragraph layout mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParagraphMode {
    /// One-em first-line indent
    #[default]
    Indent,
    /// No indent, tight spacing
    None,
    /// No indent, blank-line spacing
    Spaced,
}

impl ParagraphMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParagraphMode::Indent => "indent",
            ParagraphMode::None => "none",
            ParagraphMode::Spaced => "spaced",
        }
    }
}

/// Per-project typesetting settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub direction: Direction,
    pub font_family: String,
    /// Font size in px
    pub font_size: u32,
    /// Line height as a ratio
    pub line_height: f64,
    pub columns: u32,
    pub grid_columns: u32,
    pub grid_rows: u32,
    pub paragraph_mode: ParagraphMode,
    /// Automatically wrap runs of 2-6 digits in combined runs on blur
    #[serde(rename = "autoTCY")]
    pub auto_tcy: bool,
    pub emph_style: EmphasisStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            direction: Direction::VerticalRl,
            font_family: "'Hiragino Mincho ProN', 'Yu Mincho', serif".to_string(),
            font_size: 18,
            line_height: 1.8,
            columns: 2,
            grid_columns: 40,
            grid_rows: 17,
            paragraph_mode: ParagraphMode::Indent,
            auto_tcy: false,
            emph_style: EmphasisStyle::Dot,
        }
    }
}

/// One chapter of a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Chapter {
    /// Unique within the owning project
    pub id: Uuid,
    pub title: String,
    /// Body in canonical stored markup
    pub html: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Cached character count; may be stale between edits
    pub word_count: usize,
}

impl Default for Chapter {
    fn default() -> Self {
        Self::new("")
    }
}

impl Chapter {
    /// Create an empty chapter with the given title
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            html: "<p></p>".to_string(),
            created_at: now,
            updated_at: now,
            word_count: 0,
        }
    }

    /// Update the title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.updated_at = Utc::now();
    }

    /// Fold an edited body back into the chapter
    pub fn set_html(&mut self, html: impl Into<String>) {
        self.html = html.into();
        self.updated_at = Utc::now();
    }

    /// Recompute the cached character count from the body
    ///
    /// Called on view-load and on blur, not on every keystroke.
    pub fn recount(&mut self) {
        self.word_count = count::count_markup(&self.html);
    }

    /// Copy with a fresh identity, keeping content and cached count
    pub fn duplicate(&self, suffix: &str) -> Self {
        let mut copy = self.clone();
        copy.title = format!("{}{}", self.title, suffix);
        copy.reissue(Utc::now());
        copy
    }

    fn reissue(&mut self, now: DateTime<Utc>) {
        self.id = Uuid::new_v4();
        self.created_at = now;
        self.updated_at = now;
    }
}

/// A writing project: ordered chapters plus free-form notes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    /// Unique across the store, immutable after creation
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    /// Rewritten on every persisted save
    pub updated_at: DateTime<Utc>,
    pub settings: Settings,
    /// Free-form notes in canonical stored markup
    pub notes_html: String,
    /// Reading/export order is the vector order
    pub chapters: Vec<Chapter>,
}

impl Default for Project {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: String::new(),
            author: String::new(),
            created_at: now,
            updated_at: now,
            settings: Settings::default(),
            notes_html: String::new(),
            chapters: Vec::new(),
        }
    }
}

impl Project {
    /// Create a project with default settings and one seeded chapter
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        let mut first = Chapter::new("第1章");
        first.html = "<p>ここから書き始める。</p>".to_string();
        first.created_at = now;
        first.updated_at = now;
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            author: String::new(),
            created_at: now,
            updated_at: now,
            settings: Settings::default(),
            notes_html: "<p>メモを入力</p>".to_string(),
            chapters: vec![first],
        }
    }

    /// Deep copy with fresh identity for the project and every chapter
    ///
    /// Settings and notes carry no identity and copy as-is.
    pub fn clone_with_suffix(&self, suffix: &str) -> Self {
        let now = Utc::now();
        let mut cloned = self.clone();
        cloned.id = Uuid::new_v4();
        cloned.title = format!("{}{}", self.title, suffix);
        cloned.created_at = now;
        cloned.updated_at = now;
        for chapter in &mut cloned.chapters {
            chapter.reissue(now);
        }
        cloned
    }

    /// Parse an exported project file
    ///
    /// Identity is always regenerated so an import never collides with an
    /// existing store entry, and the title gains a provenance marker.
    pub fn from_json(text: &str) -> Result<Self, ImportError> {
        let mut project: Project = serde_json::from_str(text)?;
        let now = Utc::now();
        project.id = Uuid::new_v4();
        let title = if project.title.trim().is_empty() {
            "無題"
        } else {
            project.title.as_str()
        };
        project.title = format!("{}{}", title, IMPORT_MARKER);
        project.created_at = now;
        project.updated_at = now;
        for chapter in &mut project.chapters {
            chapter.reissue(now);
        }
        Ok(project)
    }

    /// Serialize the full project, pretty-printed
    ///
    /// Round-trip through `from_json` preserves all content; only identity
    /// fields differ.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Append a new auto-titled empty chapter, returning its id
    pub fn add_chapter(&mut self) -> Uuid {
        let chapter = Chapter::new(format!("第{}章", self.chapters.len() + 1));
        let id = chapter.id;
        self.chapters.push(chapter);
        id
    }

    pub fn chapter(&self, id: Uuid) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    pub fn chapter_mut(&mut self, id: Uuid) -> Option<&mut Chapter> {
        self.chapters.iter_mut().find(|c| c.id == id)
    }

    /// Duplicate a chapter in place, inserting the copy after the source
    pub fn clone_chapter(&mut self, id: Uuid) -> Option<Uuid> {
        let index = self.chapters.iter().position(|c| c.id == id)?;
        let copy = self.chapters[index].duplicate(CLONE_SUFFIX);
        let copy_id = copy.id;
        self.chapters.insert(index + 1, copy);
        Some(copy_id)
    }

    /// Remove a chapter; unknown ids are a no-op
    pub fn delete_chapter(&mut self, id: Uuid) -> bool {
        let before = self.chapters.len();
        self.chapters.retain(|c| c.id != id);
        self.chapters.len() != before
    }

    /// Move a chapter by a signed offset, bounds-checked
    pub fn move_chapter(&mut self, id: Uuid, offset: isize) -> bool {
        let Some(index) = self.chapters.iter().position(|c| c.id == id) else {
            return false;
        };
        let target = index as isize + offset;
        if target < 0 || target as usize >= self.chapters.len() {
            return false;
        }
        let chapter = self.chapters.remove(index);
        self.chapters.insert(target as usize, chapter);
        true
    }

    /// Project-wide character count
    ///
    /// Sum of each chapter's cached count plus the notes body counted
    /// live; chapter counts are only as fresh as the last recount.
    pub fn total_character_count(&self) -> usize {
        let chapters: usize = self.chapters.iter().map(|c| c.word_count).sum();
        chapters + count::count_markup(&self.notes_html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_project_seeds_one_chapter() {
        let project = Project::new("新しい作品");
        assert_eq!(project.title, "新しい作品");
        assert_eq!(project.chapters.len(), 1);
        assert_eq!(project.chapters[0].title, "第1章");
        assert_eq!(project.chapters[0].html, "<p>ここから書き始める。</p>");
        assert_eq!(project.notes_html, "<p>メモを入力</p>");
        assert_eq!(project.created_at, project.updated_at);
    }

    #[test]
    fn test_clone_regenerates_all_identity() {
        let mut source = Project::new("原作");
        source.add_chapter();
        let cloned = source.clone_with_suffix(CLONE_SUFFIX);

        assert_ne!(cloned.id, source.id);
        assert_eq!(cloned.title, "原作(複製)");
        assert_eq!(cloned.chapters.len(), source.chapters.len());
        for (copy, original) in cloned.chapters.iter().zip(&source.chapters) {
            assert_ne!(copy.id, original.id);
            assert_eq!(copy.html, original.html);
            assert_eq!(copy.title, original.title);
        }
        assert_eq!(cloned.settings, source.settings);
        assert_eq!(cloned.notes_html, source.notes_html);
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut project = Project::new("長編");
        project.author = "著者".to_string();
        project.settings.auto_tcy = true;
        project.settings.emph_style = EmphasisStyle::Sesame;
        project.chapters[0].html = "<p>本文<ruby><rb>桜</rb><rt>さくら</rt></ruby></p>".to_string();
        project.notes_html = "<p>構想メモ</p>".to_string();

        let json = project.to_json().unwrap();
        let imported = Project::from_json(&json).unwrap();

        assert_ne!(imported.id, project.id);
        assert_eq!(imported.title, "長編（インポート）");
        assert_eq!(imported.settings, project.settings);
        assert_eq!(imported.notes_html, project.notes_html);
        assert_eq!(imported.chapters.len(), 1);
        assert_eq!(imported.chapters[0].html, project.chapters[0].html);
        assert_ne!(imported.chapters[0].id, project.chapters[0].id);
    }

    #[test]
    fn test_import_untitled_payload() {
        let imported = Project::from_json("{\"chapters\": []}").unwrap();
        assert_eq!(imported.title, "無題（インポート）");
        assert!(imported.chapters.is_empty());
        assert_eq!(imported.settings, Settings::default());
    }

    #[test]
    fn test_import_rejects_malformed_payload() {
        assert!(matches!(
            Project::from_json("not json at all"),
            Err(ImportError::Parse(_))
        ));
    }

    #[test]
    fn test_direction_normalizes_on_load() {
        let json = "{\"direction\": \"horizontal-tb\"}";
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.direction, Direction::VerticalRl);
        let out = serde_json::to_value(&settings).unwrap();
        assert_eq!(out["direction"], "vertical-rl");
    }

    #[test]
    fn test_settings_schema_field_names() {
        let json = serde_json::to_value(Settings::default()).unwrap();
        assert_eq!(json["fontSize"], 18);
        assert_eq!(json["autoTCY"], false);
        assert_eq!(json["emphStyle"], "dot");
        assert_eq!(json["paragraphMode"], "indent");
        assert_eq!(json["gridColumns"], 40);
        assert_eq!(json["lineHeight"], 1.8);
    }

    #[test]
    fn test_chapter_schema_field_names() {
        let json = serde_json::to_value(Chapter::new("章")).unwrap();
        assert!(json.get("wordCount").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
    }

    #[test]
    fn test_add_and_move_chapters() {
        let mut project = Project::new("作品");
        let second = project.add_chapter();
        assert_eq!(project.chapters[1].title, "第2章");

        assert!(project.move_chapter(second, -1));
        assert_eq!(project.chapters[0].id, second);
        // Out of bounds is a no-op
        assert!(!project.move_chapter(second, -1));
        assert_eq!(project.chapters[0].id, second);
    }

    #[test]
    fn test_clone_chapter_inserts_after_source() {
        let mut project = Project::new("作品");
        project.add_chapter();
        let first = project.chapters[0].id;
        let copy = project.clone_chapter(first).unwrap();
        assert_eq!(project.chapters.len(), 3);
        assert_eq!(project.chapters[1].id, copy);
        assert_eq!(project.chapters[1].title, "第1章(複製)");
    }

    #[test]
    fn test_delete_chapter() {
        let mut project = Project::new("作品");
        let id = project.chapters[0].id;
        assert!(project.delete_chapter(id));
        assert!(project.chapters.is_empty());
        assert!(!project.delete_chapter(id));
    }

    #[test]
    fn test_recount_and_total() {
        let mut project = Project::new("作品");
        project.chapters[0].set_html("<p>五文字です</p>");
        assert_eq!(project.chapters[0].word_count, 0); // stale until recount
        project.chapters[0].recount();
        assert_eq!(project.chapters[0].word_count, 5);
        project.notes_html = "<p>三文字</p>".to_string();
        assert_eq!(project.total_character_count(), 8);
    }

    #[test]
    fn test_chapter_set_html_stamps_updated_at() {
        let mut chapter = Chapter::new("章");
        let created = chapter.created_at;
        let original = chapter.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(10));
        chapter.set_html("<p>改稿</p>");
        assert!(chapter.updated_at > original);
        assert_eq!(chapter.created_at, created);
    }
}
