use lava_local_test::cli;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    lava_local_test::init_tracing();

    match cli::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
