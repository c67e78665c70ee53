use data_pipeline::cli::commands::{CliArgs, Commands};
use data_pipeline::cli::handlers::{handle_check, handle_config, handle_health, handle_run};
use data_pipeline::util::logging::{init_logging, parse_level, LoggingConfig};
use data_pipeline::VERSION;

use clap::Parser;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    // logging reads DATA_PIPELINE_LOG_* before the config loads .env
    let _ = dotenvy::dotenv();
    init_logging_from_args(&args);

    debug!("data-pipeline v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Run(run_args) => handle_run(run_args).await,
        Commands::Check(check_args) => handle_check(check_args),
        Commands::Health(health_args) => handle_health(health_args).await,
        Commands::Config(config_args) => handle_config(config_args),
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let mut config = LoggingConfig::from_env();

    if let Some(level_str) = &args.log_level {
        config = config.level(parse_level(level_str));
    } else if args.verbose {
        config = config.level(Level::DEBUG);
    } else if args.quiet {
        config = config.level(Level::ERROR);
    }

    init_logging(config);
}
