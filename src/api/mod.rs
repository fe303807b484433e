use std::path::Path;

use crate::ast::Program;
use crate::diagnostic::{render_diagnostics, Diagnostic};
use crate::error::{CompileError, CompileResult};
use crate::ir::builder::{Builtins, CodegenContext};
use crate::ir::lower::create_lowering;
use crate::ir::optimize::optimize;
use crate::ir::{check_label_closure, Address, Instruction};
use crate::project::Project;


/// Options controlling compilation: entry point, floor layout, optimizer.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// Function the synthetic top-level call targets.
    pub entry: String,
    /// Lowest cell the allocator hands out.
    pub first_cell: Address,
    /// Cells the allocator never hands out (puzzle constants on the floor).
    pub reserved_cells: Vec<Address>,
    /// Run the peephole optimizer.
    pub optimize: bool,
    /// Builtin actions and functions visible to the program.
    pub builtins: Builtins,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            entry: "main".to_string(),
            first_cell: 0,
            reserved_cells: Vec::new(),
            optimize: true,
            builtins: Builtins::standard(),
        }
    }
}

impl CompileOptions {
    /// Options taken from a project's clerk.toml.
    pub fn for_project(project: &Project) -> Self {
        let mut options = Self::default();
        if let Some(main) = &project.main {
            options.entry = main.clone();
        }
        if let Some(first) = project.first_cell {
            options.first_cell = first;
        }
        options.reserved_cells = project.reserved_cells.clone();
        options
    }
}

/// Compile a single source string to a Human Resource Machine program.
pub fn compile(source: &str, filename: &str) -> Result<String, Vec<Diagnostic>> {
    compile_with_options(source, filename, &CompileOptions::default())
}

/// Compile a single source string with options. Diagnostics are rendered
/// to stderr before being returned.
pub fn compile_with_options(
    source: &str,
    filename: &str,
    options: &CompileOptions,
) -> Result<String, Vec<Diagnostic>> {
    let ops = match compile_to_instructions(source, filename, options) {
        Ok(ops) => ops,
        Err(errors) => {
            render_diagnostics(&errors, filename, source);
            return Err(errors);
        }
    };
    Ok(render(&ops, "hrm"))
}

/// Parse and compile without rendering anything.
pub fn compile_to_instructions(
    source: &str,
    filename: &str,
    options: &CompileOptions,
) -> Result<Vec<Instruction>, Vec<Diagnostic>> {
    let program = crate::parse_source_silent(source, filename)?;
    compile_program(&program, options).map_err(|e| vec![e.to_diagnostic()])
}

/// Emit, optimize, and verify one parsed program.
pub fn compile_program(program: &Program, options: &CompileOptions) -> CompileResult<Vec<Instruction>> {
    let ops = CodegenContext::new(program, &options.builtins)
        .with_entry(&options.entry)
        .with_first_cell(options.first_cell)
        .with_reserved_cells(options.reserved_cells.iter().copied())
        .build()?;
    let ops = if options.optimize { optimize(ops) } else { ops };
    check_label_closure(&ops, options.optimize).map_err(CompileError::Internal)?;
    Ok(ops)
}

/// Render instructions with the named lowering (`hrm` or `listing`).
pub fn render(ops: &[Instruction], format: &str) -> String {
    let mut text = create_lowering(format).lower(ops).join("\n");
    text.push('\n');
    text
}

/// Parse and compile a source string without producing output.
pub fn check(source: &str, filename: &str) -> Result<(), Vec<Diagnostic>> {
    check_with_options(source, filename, &CompileOptions::default())
}

pub fn check_with_options(
    source: &str,
    filename: &str,
    options: &CompileOptions,
) -> Result<(), Vec<Diagnostic>> {
    compile_to_instructions(source, filename, options).map(|_| ())
}

/// Compile the entry file of the project described by `toml_path`.
pub fn compile_project(toml_path: &Path) -> Result<String, Vec<Diagnostic>> {
    let project = Project::load(toml_path).map_err(|d| vec![d])?;
    let source = std::fs::read_to_string(&project.entry).map_err(|e| {
        vec![Diagnostic::error(
            format!("cannot read '{}': {}", project.entry.display(), e),
            crate::span::Span::dummy(),
        )]
    })?;
    let filename = project.entry.to_string_lossy().into_owned();
    compile_with_options(&source, &filename, &CompileOptions::for_project(&project))
}
