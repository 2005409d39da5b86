//! Export rendering
//!
//! Two read-only views of stored data: a standalone printable HTML
//! document for one project, and a JSON catalog of every project's
//! metadata. Neither mutates what it renders.

use serde::Serialize;
use tracing::debug;

use crate::models::Project;
use crate::richtext::markup::escape_text;
use crate::richtext::EmphasisStyle;

/// Render a project as a self-contained vertical-typesetting HTML page
///
/// The page embeds all styling inline so it prints and archives without
/// any companion files. Typography follows the project's own settings:
/// writing mode, font, column count, paragraph treatment, emphasis mark.
/// Chapter bodies are stored markup and are emitted as-is; titles are
/// plain text and get escaped here.
pub fn document_html(project: &Project) -> String {
    let settings = &project.settings;
    let title = if project.title.is_empty() {
        "作品"
    } else {
        project.title.as_str()
    };

    let chapters: Vec<String> = project
        .chapters
        .iter()
        .map(|chapter| {
            format!(
                "    <section class=\"chapter\">\n      <h2>{}</h2>\n      <div class=\"chapter-body\">{}</div>\n    </section>",
                escape_text(&chapter.title),
                chapter.html
            )
        })
        .collect();

    let emphasis = match settings.emph_style {
        EmphasisStyle::Sesame => "sesame",
        EmphasisStyle::Dot => "filled dot",
    };

    debug!(id = %project.id, chapters = project.chapters.len(), "rendering document html");

    format!(
        r#"<!doctype html>
<html lang="ja">
<head>
<meta charset="utf-8" />
<title>{title}</title>
<style>
  body {{ margin: 0; padding: 24px; font-family: {font_family}; }}
  .paper {{ background: #f5f1e8; color: #1c1b16; padding: 24px; }}
  .chapter {{ page-break-after: always; }}
  .chapter:last-child {{ page-break-after: auto; }}
  .chapter-body {{
    writing-mode: {direction};
    text-orientation: mixed;
    font-size: {font_size}px;
    line-height: {line_height};
    column-count: {columns};
    column-gap: 2.5em;
    direction: rtl;
  }}
  .chapter-body > * {{ direction: ltr; }}
  .tcy {{ text-combine-upright: all; -webkit-text-combine: horizontal; }}
  .emph {{ text-emphasis: {emphasis}; text-emphasis-position: over right; }}
  .paragraph-indent p {{ text-indent: 1em; margin: 0 0 0.5em; }}
  .paragraph-none p {{ text-indent: 0; margin: 0 0 0.5em; }}
  .paragraph-spaced p {{ text-indent: 0; margin: 0 0 1.5em; }}
</style>
</head>
<body>
  <div class="paper paragraph-{paragraph_mode}">
    <h1>{title}</h1>
{chapters}
  </div>
</body>
</html>
"#,
        title = escape_text(title),
        font_family = settings.font_family,
        direction = settings.direction.as_str(),
        font_size = settings.font_size,
        line_height = settings.line_height,
        columns = settings.columns,
        emphasis = emphasis,
        paragraph_mode = settings.paragraph_mode.as_str(),
        chapters = chapters.join("\n"),
    )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogEntry {
    id: String,
    title: String,
    author: String,
    chapters: usize,
    character_count: usize,
    created_at: String,
    updated_at: String,
}

/// Render a metadata catalog of projects as pretty JSON
///
/// Counts come from the cached per-chapter totals, so cataloging never
/// reparses chapter markup.
pub fn catalog_json(projects: &[Project]) -> serde_json::Result<String> {
    let entries: Vec<CatalogEntry> = projects
        .iter()
        .map(|project| CatalogEntry {
            id: project.id.to_string(),
            title: project.title.clone(),
            author: project.author.clone(),
            chapters: project.chapters.len(),
            character_count: project.total_character_count(),
            created_at: project.created_at.to_rfc3339(),
            updated_at: project.updated_at.to_rfc3339(),
        })
        .collect();
    serde_json::to_string_pretty(&entries)
}
