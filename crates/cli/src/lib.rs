pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "billchat",
    about = "Billchat operator CLI",
    long_about = "Inspect billchat configuration, check upstream readiness, and try intent resolution offline.",
    after_help = "Examples:\n  billchat doctor --json\n  billchat config\n  billchat resolve \"Ocak borcum ne?\"\n  billchat resolve --llm \"pay 100TL for 2025-01\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, language model reachability, and billing backend login")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Print the operation descriptor a chat message resolves to")]
    Resolve {
        #[arg(long, help = "Ask the language model first, falling back to keywords")]
        llm: bool,
        #[arg(required = true, num_args = 1.., help = "Chat message text")]
        text: Vec<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Resolve { llm, text } => commands::resolve::run(&text.join(" "), llm),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
