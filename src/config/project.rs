use std::path::{Path, PathBuf};

use crate::diagnostic::Diagnostic;
use crate::ir::Address;
use crate::span::Span;

pub const PROJECT_FILE: &str = "clerk.toml";

/// Minimal project configuration from clerk.toml.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    /// Source file to compile.
    pub entry: PathBuf,
    pub root_dir: PathBuf,
    /// Entry function; `main` when unset.
    pub main: Option<String>,
    /// `[floor] first`: lowest cell the allocator may hand out.
    pub first_cell: Option<Address>,
    /// `[floor] reserved`: cells holding puzzle constants.
    pub reserved_cells: Vec<Address>,
}

/// Parse a minimal TOML integer array: `[1, 2, 3]` → `vec![1, 2, 3]`.
fn parse_address_array(s: &str) -> Option<Vec<Address>> {
    let s = s.trim();
    let inner = s.strip_prefix('[')?.strip_suffix(']')?;
    inner
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().ok())
        .collect()
}

fn config_error(path: &Path, message: String) -> Diagnostic {
    Diagnostic::error(format!("{}: {}", path.display(), message), Span::dummy())
}

impl Project {
    /// Load project from a clerk.toml file.
    pub fn load(toml_path: &Path) -> Result<Project, Diagnostic> {
        let content = std::fs::read_to_string(toml_path).map_err(|e| {
            Diagnostic::error(
                format!("cannot read '{}': {}", toml_path.display(), e),
                Span::dummy(),
            )
        })?;

        let root_dir = toml_path.parent().unwrap_or(Path::new(".")).to_path_buf();

        // Section-aware minimal TOML parsing
        let mut name = String::new();
        let mut entry = String::new();
        let mut main = None;
        let mut first_cell = None;
        let mut reserved_cells = Vec::new();
        let mut current_section = String::new();

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with('#') || trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                current_section = trimmed[1..trimmed.len() - 1].trim().to_string();
                continue;
            }
            let Some((key, value)) = trimmed.split_once('=') else {
                continue;
            };
            let key = key.trim().trim_matches('"');
            let value = value.trim();

            match (current_section.as_str(), key) {
                ("project", "name") => name = value.trim_matches('"').to_string(),
                ("project", "entry") => entry = value.trim_matches('"').to_string(),
                ("project", "main") => main = Some(value.trim_matches('"').to_string()),
                ("floor", "first") => {
                    let cell = value.parse().map_err(|_| {
                        config_error(toml_path, format!("`first` must be a cell index, got `{}`", value))
                    })?;
                    first_cell = Some(cell);
                }
                ("floor", "reserved") => {
                    reserved_cells = parse_address_array(value).ok_or_else(|| {
                        config_error(
                            toml_path,
                            format!("`reserved` must be a list of cell indices, got `{}`", value),
                        )
                    })?;
                }
                _ => {}
            }
        }

        if name.is_empty() {
            return Err(Diagnostic::error(
                format!("missing 'name' in {}", PROJECT_FILE),
                Span::dummy(),
            ));
        }

        if entry.is_empty() {
            entry = "main.clerk".to_string();
        }

        Ok(Project {
            name,
            entry: root_dir.join(&entry),
            root_dir,
            main,
            first_cell,
            reserved_cells,
        })
    }

    /// Try to find a clerk.toml in the given directory or its ancestors.
    pub fn find(start_dir: &Path) -> Option<PathBuf> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(PROJECT_FILE);
            if candidate.exists() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }
}
