pub mod build;
pub mod check;

use std::path::{Path, PathBuf};
use std::process;

use clerk::project::{Project, PROJECT_FILE};
use clerk::CompileOptions;

/// Resolved input: entry file and optional project.
pub struct ResolvedInput {
    pub entry: PathBuf,
    pub project: Option<Project>,
}

fn load_project(toml_path: &Path) -> Project {
    match Project::load(toml_path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {}", e.message);
            process::exit(1);
        }
    }
}

/// Resolve an input path (file or project directory) to an entry file and optional project.
pub fn resolve_input(input: &Path) -> ResolvedInput {
    if input.is_dir() {
        let toml_path = input.join(PROJECT_FILE);
        if !toml_path.exists() {
            eprintln!("error: no {} found in '{}'", PROJECT_FILE, input.display());
            process::exit(1);
        }
        let project = load_project(&toml_path);
        return ResolvedInput {
            entry: project.entry.clone(),
            project: Some(project),
        };
    }

    if !input.extension().is_some_and(|e| e == "clerk") {
        eprintln!("error: input must be a .clerk file or project directory");
        process::exit(1);
    }

    // A file inside a project still picks up the project's floor layout.
    let project = Project::find(input.parent().unwrap_or(Path::new("."))).map(|p| load_project(&p));
    ResolvedInput {
        entry: input.to_path_buf(),
        project,
    }
}

/// Project settings first, then command-line overrides.
pub fn resolve_options(
    project: Option<&Project>,
    entry: Option<String>,
    no_opt: bool,
) -> CompileOptions {
    let mut options = project.map(CompileOptions::for_project).unwrap_or_default();
    if let Some(entry) = entry {
        options.entry = entry;
    }
    if no_opt {
        options.optimize = false;
    }
    options
}

pub fn read_source(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", path.display(), e);
            process::exit(1);
        }
    }
}
