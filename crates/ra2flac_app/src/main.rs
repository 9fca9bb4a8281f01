use clap::Parser;
use engine_logging::{engine_error, LogDestination};
use ra2flac_app::report::EXIT_FATAL;
use ra2flac_app::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let destination = match &cli.log_file {
        Some(path) => LogDestination::Both(path.clone()),
        None => LogDestination::Terminal,
    };
    engine_logging::initialize(destination, cli.log_level());

    let code = match ra2flac_app::run(&cli).await {
        Ok(code) => code,
        Err(err) => {
            engine_error!("{:#}", err);
            eprintln!("download_and_convert error: {:#}", err);
            EXIT_FATAL
        }
    };
    std::process::exit(code);
}
