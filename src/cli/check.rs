use std::path::PathBuf;
use std::process;

use clap::Args;

use super::{read_source, resolve_input, resolve_options};
use clerk::diagnostic::render_diagnostics;

#[derive(Args)]
pub struct CheckArgs {
    /// Input .clerk file or directory with clerk.toml
    pub input: PathBuf,
    /// Entry function (default: `main`, or `main` in clerk.toml)
    #[arg(long, value_name = "NAME")]
    pub entry: Option<String>,
}

pub fn cmd_check(args: CheckArgs) {
    let CheckArgs { input, entry } = args;
    let ri = resolve_input(&input);
    let options = resolve_options(ri.project.as_ref(), entry, false);
    let source = read_source(&ri.entry);
    let filename = ri.entry.to_string_lossy().into_owned();

    match clerk::check_with_options(&source, &filename, &options) {
        Ok(()) => eprintln!("OK: {}", input.display()),
        Err(errors) => {
            render_diagnostics(&errors, &filename, &source);
            process::exit(1);
        }
    }
}
