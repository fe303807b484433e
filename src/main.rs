use clap::{Parser, Subcommand};

mod cli;

#[derive(Parser)]
#[command(
    name = "clerk",
    version,
    about = "Compile a tiny functional language to Human Resource Machine programs"
)]
struct Cli {
    /// Log compiler passes (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a .clerk file (or project) to a paste-ready program
    Build(cli::build::BuildArgs),
    /// Parse and compile without writing any output
    Check(cli::check::CheckArgs),
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    match cli.command {
        Command::Build(args) => cli::build::cmd_build(args),
        Command::Check(args) => cli::check::cmd_check(args),
    }
}
