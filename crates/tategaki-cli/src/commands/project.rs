//! Project command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use uuid::Uuid;

use tategaki_core::models::CLONE_SUFFIX;
use tategaki_core::{export, Project, Store};

use crate::output::Output;

/// List all projects
pub fn list(store: &Store, output: &Output) -> Result<()> {
    let projects = store.list();
    output.print_projects(&projects);
    Ok(())
}

/// Create a new project
pub fn create(
    store: &mut Store,
    title: String,
    author: Option<String>,
    output: &Output,
) -> Result<()> {
    let mut project = Project::new(title);
    if let Some(author) = author {
        project.author = author;
    }
    for chapter in &mut project.chapters {
        chapter.recount();
    }
    let project = store.put(&project);

    output.success(&format!("Created project: {}", project.id));
    output.print_project(&project);
    Ok(())
}

/// Show a single project
pub fn show(store: &Store, id: String, output: &Output) -> Result<()> {
    let project = resolve_project(store, &id)?;
    output.print_project(&project);
    Ok(())
}

/// Rename a project
pub fn rename(store: &mut Store, id: String, title: String, output: &Output) -> Result<()> {
    let mut project = resolve_project(store, &id)?;
    project.title = title;
    let project = store.put(&project);

    output.success("Project renamed");
    output.print_project(&project);
    Ok(())
}

/// Duplicate a project under a suffixed title
pub fn clone(store: &mut Store, id: String, output: &Output) -> Result<()> {
    let source = resolve_project(store, &id)?;
    let cloned = store.put(&source.clone_with_suffix(CLONE_SUFFIX));

    output.success(&format!("Cloned into: {}", cloned.id));
    output.print_project(&cloned);
    Ok(())
}

/// Delete a project
pub fn delete(store: &mut Store, id: String, force: bool, output: &Output) -> Result<()> {
    let project = resolve_project(store, &id)?;

    if !force && output.should_prompt() {
        println!(
            "Delete project: {} - {}",
            &project.id.to_string()[..8],
            project.title
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.delete(project.id);
    output.success(&format!("Deleted project: {}", project.id));
    Ok(())
}

/// Import a project from an exported JSON file
pub fn import(store: &mut Store, file: PathBuf, output: &Output) -> Result<()> {
    let text = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let mut project = Project::from_json(&text).context("Not a valid project export")?;
    for chapter in &mut project.chapters {
        chapter.recount();
    }
    let project = store.put(&project);

    output.success(&format!("Imported project: {}", project.id));
    output.print_project(&project);
    Ok(())
}

/// Export a project as JSON
pub fn export(store: &Store, id: String, out: Option<PathBuf>, output: &Output) -> Result<()> {
    let project = resolve_project(store, &id)?;
    let json = project.to_json()?;
    write_or_print(out, &json, output, "Exported project")
}

/// Export a project as a printable HTML document
pub fn export_html(store: &Store, id: String, out: Option<PathBuf>, output: &Output) -> Result<()> {
    let project = resolve_project(store, &id)?;
    let html = export::document_html(&project);
    write_or_print(out, &html, output, "Exported document")
}

/// Export a metadata catalog of every project
pub fn catalog(store: &Store, out: Option<PathBuf>, output: &Output) -> Result<()> {
    let projects = store.list();
    let json = export::catalog_json(&projects)?;
    write_or_print(out, &json, output, "Exported catalog")
}

/// Show character counts, per chapter and total
pub fn count(store: &Store, id: String, output: &Output) -> Result<()> {
    let mut project = resolve_project(store, &id)?;
    for chapter in &mut project.chapters {
        chapter.recount();
    }

    if output.is_quiet() {
        println!("{}", project.total_character_count());
        return Ok(());
    }
    match output.format {
        crate::output::OutputFormat::Json => {
            let chapters: Vec<_> = project
                .chapters
                .iter()
                .map(|c| serde_json::json!({"id": c.id, "title": c.title, "count": c.word_count}))
                .collect();
            println!(
                "{}",
                serde_json::json!({
                    "chapters": chapters,
                    "total": project.total_character_count()
                })
            );
        }
        _ => {
            for chapter in &project.chapters {
                println!("{:>8}字  {}", chapter.word_count, chapter.title);
            }
            println!("{:>8}字  (total, including notes)", project.total_character_count());
        }
    }
    Ok(())
}

/// Resolve a project ID argument (full UUID or prefix)
pub fn resolve_project(store: &Store, id: &str) -> Result<Project> {
    if let Ok(uuid) = Uuid::parse_str(id) {
        return store
            .get(uuid)
            .ok_or_else(|| anyhow::anyhow!("Project not found: {}", id));
    }

    let projects = store.list();
    let matches: Vec<_> = projects
        .iter()
        .filter(|p| p.id.to_string().starts_with(id))
        .collect();

    match matches.len() {
        0 => bail!("No project found matching: {}", id),
        1 => Ok(matches[0].clone()),
        _ => {
            eprintln!("Multiple projects match '{}':", id);
            for project in &matches {
                eprintln!("  {} - {}", project.id, project.title);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

fn write_or_print(
    out: Option<PathBuf>,
    body: &str,
    output: &Output,
    message: &str,
) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(&path, body)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            output.success(&format!("{}: {}", message, path.display()));
        }
        None => println!("{}", body),
    }
    Ok(())
}

/// Prompt for confirmation, defaulting to no
fn confirm(prompt: &str) -> Result<bool> {
    use std::io::{self, Write};

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tategaki_core::Config;
    use tempfile::TempDir;

    fn store_with(titles: &[&str]) -> (TempDir, Store, Vec<Project>) {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
        };
        let mut store = Store::open(&config);
        let projects: Vec<Project> = titles
            .iter()
            .map(|title| store.put(&Project::new(*title)))
            .collect();
        (temp_dir, store, projects)
    }

    #[test]
    fn test_resolve_by_full_uuid() {
        let (_guard, store, projects) = store_with(&["一"]);
        let found = resolve_project(&store, &projects[0].id.to_string()).unwrap();
        assert_eq!(found.id, projects[0].id);
    }

    #[test]
    fn test_resolve_by_prefix() {
        let (_guard, store, projects) = store_with(&["一"]);
        let prefix = &projects[0].id.to_string()[..8];
        let found = resolve_project(&store, prefix).unwrap();
        assert_eq!(found.id, projects[0].id);
    }

    #[test]
    fn test_resolve_unknown_fails() {
        let (_guard, store, _projects) = store_with(&["一"]);
        assert!(resolve_project(&store, "ffffffff").is_err());
    }
}
