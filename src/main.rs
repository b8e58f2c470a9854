use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{code, config, content, env};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "stagehand")]
#[command(version = VERSION)]
#[command(about = "Tier promotion for CMS environments (test -> stage -> prod)")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh local content (files + database) from production
    Content(content::ContentArgs),
    /// Promote the local code tree one tier up
    Code(code::CodeArgs),
    /// Show the local environment and promotion destinations
    Env(env::EnvArgs),
    /// Display global stagehand configuration
    Config(config::ConfigArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let (json_result, exit_code) = commands::run_json(cli.command);
    let _ = output::print_json_result(json_result);

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
