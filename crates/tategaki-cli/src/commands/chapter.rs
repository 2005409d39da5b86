//! Chapter command handlers
//!
//! Chapters live inside their project record, so every mutation here is
//! load project, edit in memory, put project back.

use anyhow::{bail, Result};
use uuid::Uuid;

use tategaki_core::{Project, Store};

use crate::commands::project::resolve_project;
use crate::output::Output;

/// Append a new chapter
pub fn create(
    store: &mut Store,
    project_id: String,
    title: Option<String>,
    output: &Output,
) -> Result<()> {
    let mut project = resolve_project(store, &project_id)?;
    let chapter_id = project.add_chapter();
    if let Some(title) = title {
        if let Some(chapter) = project.chapter_mut(chapter_id) {
            chapter.set_title(title);
        }
    }
    store.put(&project);

    output.success(&format!("Created chapter: {}", chapter_id));
    Ok(())
}

/// List chapters in reading order
pub fn list(store: &Store, project_id: String, output: &Output) -> Result<()> {
    let project = resolve_project(store, &project_id)?;

    match output.format {
        crate::output::OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&project.chapters)?);
        }
        crate::output::OutputFormat::Quiet => {
            for chapter in &project.chapters {
                println!("{}", chapter.id);
            }
        }
        crate::output::OutputFormat::Human => {
            if project.chapters.is_empty() {
                println!("No chapters.");
                return Ok(());
            }
            for (index, chapter) in project.chapters.iter().enumerate() {
                println!(
                    "{:>3}. {} | {} | {}字",
                    index + 1,
                    &chapter.id.to_string()[..8],
                    chapter.title,
                    chapter.word_count
                );
            }
        }
    }
    Ok(())
}

/// Rename a chapter
pub fn rename(
    store: &mut Store,
    project_id: String,
    chapter_id: String,
    title: String,
    output: &Output,
) -> Result<()> {
    let mut project = resolve_project(store, &project_id)?;
    let chapter_id = resolve_chapter(&project, &chapter_id)?;
    if let Some(chapter) = project.chapter_mut(chapter_id) {
        chapter.set_title(title);
    }
    store.put(&project);

    output.success("Chapter renamed");
    Ok(())
}

/// Duplicate a chapter, inserting the copy after the source
pub fn clone(
    store: &mut Store,
    project_id: String,
    chapter_id: String,
    output: &Output,
) -> Result<()> {
    let mut project = resolve_project(store, &project_id)?;
    let chapter_id = resolve_chapter(&project, &chapter_id)?;
    let Some(copy_id) = project.clone_chapter(chapter_id) else {
        bail!("Chapter not found: {}", chapter_id);
    };
    store.put(&project);

    output.success(&format!("Cloned chapter into: {}", copy_id));
    Ok(())
}

/// Move a chapter by a signed offset
pub fn move_chapter(
    store: &mut Store,
    project_id: String,
    chapter_id: String,
    offset: isize,
    output: &Output,
) -> Result<()> {
    let mut project = resolve_project(store, &project_id)?;
    let chapter_id = resolve_chapter(&project, &chapter_id)?;
    if !project.move_chapter(chapter_id, offset) {
        bail!("Cannot move chapter by {}: out of range", offset);
    }
    store.put(&project);

    output.success("Chapter moved");
    Ok(())
}

/// Delete a chapter
pub fn delete(
    store: &mut Store,
    project_id: String,
    chapter_id: String,
    output: &Output,
) -> Result<()> {
    let mut project = resolve_project(store, &project_id)?;
    let chapter_id = resolve_chapter(&project, &chapter_id)?;
    project.delete_chapter(chapter_id);
    store.put(&project);

    output.success(&format!("Deleted chapter: {}", chapter_id));
    Ok(())
}

/// Resolve a chapter ID argument (full UUID or prefix) within a project
fn resolve_chapter(project: &Project, id: &str) -> Result<Uuid> {
    if let Ok(uuid) = Uuid::parse_str(id) {
        if project.chapter(uuid).is_some() {
            return Ok(uuid);
        }
        bail!("Chapter not found: {}", id);
    }

    let matches: Vec<_> = project
        .chapters
        .iter()
        .filter(|c| c.id.to_string().starts_with(id))
        .collect();

    match matches.len() {
        0 => bail!("No chapter found matching: {}", id),
        1 => Ok(matches[0].id),
        _ => {
            eprintln!("Multiple chapters match '{}':", id);
            for chapter in &matches {
                eprintln!("  {} - {}", chapter.id, chapter.title);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_chapter_by_prefix() {
        let mut project = Project::new("作品");
        let second = project.add_chapter();
        let prefix = &second.to_string()[..8];
        assert_eq!(resolve_chapter(&project, prefix).unwrap(), second);
    }

    #[test]
    fn test_resolve_chapter_unknown_fails() {
        let project = Project::new("作品");
        assert!(resolve_chapter(&project, "ffffffff").is_err());
    }
}
