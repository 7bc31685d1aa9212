use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    atrium_cli::run().await
}
