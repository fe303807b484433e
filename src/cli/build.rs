use std::path::PathBuf;
use std::process;

use clap::Args;

use super::{read_source, resolve_input, resolve_options};
use clerk::diagnostic::render_diagnostics;

#[derive(Args)]
pub struct BuildArgs {
    /// Input .clerk file or directory with clerk.toml
    pub input: PathBuf,
    /// Output file (default: <input>.hrm, `-` for stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Entry function (default: `main`, or `main` in clerk.toml)
    #[arg(long, value_name = "NAME")]
    pub entry: Option<String>,
    /// Skip the peephole optimizer
    #[arg(long)]
    pub no_opt: bool,
    /// Write the internal instruction listing instead of game text
    #[arg(long)]
    pub raw: bool,
}

pub fn cmd_build(args: BuildArgs) {
    let BuildArgs {
        input,
        output,
        entry,
        no_opt,
        raw,
    } = args;
    let ri = resolve_input(&input);
    let options = resolve_options(ri.project.as_ref(), entry, no_opt);
    let source = read_source(&ri.entry);
    let filename = ri.entry.to_string_lossy().into_owned();

    let ops = match clerk::compile_to_instructions(&source, &filename, &options) {
        Ok(ops) => ops,
        Err(errors) => {
            render_diagnostics(&errors, &filename, &source);
            process::exit(1);
        }
    };
    let text = clerk::render(&ops, if raw { "listing" } else { "hrm" });

    let out_path = output.unwrap_or_else(|| ri.entry.with_extension("hrm"));
    if out_path.as_os_str() == "-" {
        print!("{}", text);
        return;
    }
    if let Err(e) = std::fs::write(&out_path, &text) {
        eprintln!("error: cannot write '{}': {}", out_path.display(), e);
        process::exit(1);
    }
    eprintln!("Compiled -> {}", out_path.display());
}
