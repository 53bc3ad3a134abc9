use std::process::ExitCode;

fn main() -> ExitCode {
    billchat_cli::run()
}
