use mdl_core::{logging, MdlError};

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // File logging when possible; stderr keeps the CLI usable otherwise.
    if let Err(e) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable, using stderr: {e:#}");
    }

    let code = match CliCommand::run_from_args().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("mdl error: {:#}", err);
            err.downcast_ref::<MdlError>()
                .map_or(1, MdlError::exit_code)
        }
    };
    std::process::exit(code);
}
