use dealscope::cli::commands::{CliArgs, Commands};
use dealscope::cli::handlers::{handle_analyze, handle_health};
use dealscope::util::logging::{self, LoggingConfig};
use dealscope::VERSION;

use clap::Parser;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    logging::init_logging(log_config(&args));

    debug!("dealscope v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Analyze(analyze_args) => handle_analyze(analyze_args, args.quiet).await,
        Commands::Health(health_args) => handle_health(health_args).await,
    };

    std::process::exit(exit_code);
}

/// Environment settings form the base; explicit flags win over them.
fn log_config(args: &CliArgs) -> LoggingConfig {
    let mut config = LoggingConfig::from_env();

    if let Some(level_str) = &args.log_level {
        config.level = logging::parse_level(level_str);
    } else if args.verbose {
        config.level = Level::DEBUG;
    } else if args.quiet {
        config.level = Level::ERROR;
    }

    config
}
