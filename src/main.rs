mod cli;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "hlsgen",
    version,
    about = "Render HLS layer code from a finalized model description"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registered backends in registration order
    Backends,
    /// Build every backend and print the layer kinds each role supports
    Check,
    /// Render a model's layer code for one backend
    Render(cli::render::RenderArgs),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = hlsgen::logging::init(cli.verbose) {
        eprintln!("warning: {}", e);
    }

    match cli.command {
        Command::Backends => cli::backends::cmd_backends(),
        Command::Check => cli::check::cmd_check(),
        Command::Render(args) => cli::render::cmd_render(args),
    }
}
