//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use tategaki_core::Project;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a single project (with chapter summary)
    pub fn print_project(&self, project: &Project) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:         {}", project.id);
                println!("Title:      {}", project.title);
                if !project.author.is_empty() {
                    println!("Author:     {}", project.author);
                }
                println!("Characters: {}", project.total_character_count());
                println!(
                    "Layout:     {} / {}字 x {}行 x {}段",
                    project.settings.direction.as_str(),
                    project.settings.grid_columns,
                    project.settings.grid_rows,
                    project.settings.columns
                );
                println!(
                    "Created:    {}",
                    project.created_at.format("%Y-%m-%d %H:%M")
                );
                println!(
                    "Updated:    {}",
                    project.updated_at.format("%Y-%m-%d %H:%M")
                );

                if !project.chapters.is_empty() {
                    println!();
                    println!("── Chapters ({}) ──", project.chapters.len());
                    for chapter in &project.chapters {
                        println!(
                            "{} | {} | {}字",
                            &chapter.id.to_string()[..8],
                            truncate(&chapter.title, 30),
                            chapter.word_count
                        );
                    }
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(project).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", project.id);
            }
        }
    }

    /// Print a list of projects
    pub fn print_projects(&self, projects: &[Project]) {
        match self.format {
            OutputFormat::Human => {
                if projects.is_empty() {
                    println!("No projects found.");
                    return;
                }
                for project in projects {
                    println!(
                        "{} | {} | {}章 | {}字 | {}",
                        &project.id.to_string()[..8],
                        truncate(&project.title, 25),
                        project.chapters.len(),
                        project.total_character_count(),
                        project.updated_at.format("%Y-%m-%d %H:%M")
                    );
                }
                println!("\n{} project(s)", projects.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(projects).unwrap());
            }
            OutputFormat::Quiet => {
                for project in projects {
                    println!("{}", project.id);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }
}

/// Truncate a string to max characters, adding "..." if truncated
///
/// Counts characters, not bytes: titles here are mostly CJK and a byte
/// slice would split codepoints.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flags() {
        assert_eq!(OutputFormat::from_flags(false, false), OutputFormat::Human);
        assert_eq!(OutputFormat::from_flags(true, false), OutputFormat::Json);
        assert_eq!(OutputFormat::from_flags(false, true), OutputFormat::Quiet);
        // Quiet takes precedence
        assert_eq!(OutputFormat::from_flags(true, true), OutputFormat::Quiet);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        assert_eq!(truncate("吾輩は猫である", 10), "吾輩は猫である");
        assert_eq!(truncate("吾輩は猫である。名前はまだ無い。", 10), "吾輩は猫である...");
    }
}
