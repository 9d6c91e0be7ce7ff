//! Command line entry point.
//!
//! ```sh
//! awsweep --clean s3 acm --debug
//! awsweep --sso-profile sandbox --clean all
//! ```

use std::process::ExitCode;

use clap::Parser;

use awsweep::{aws, Category};

/// Remove every resource of the selected categories from an AWS account.
#[derive(Parser)]
#[command(name = "awsweep", version, about)]
struct Cli {
    /// AWS profile name, configured in ~/.aws/credentials or ~/.aws/config
    /// using sso. Without it the default credential chain applies.
    #[arg(long)]
    sso_profile: Option<String>,

    /// Resource categories to remove, or `all` for every one of them.
    #[arg(long, value_enum, num_args = 1..)]
    clean: Vec<Category>,

    /// Region the sweep is scoped to.
    #[arg(long, default_value = aws::DEFAULT_REGION)]
    region: String,

    /// Log every operation, not only failures.
    #[arg(long)]
    debug: bool,

    /// Run the selected categories concurrently.
    #[arg(long)]
    parallel: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Failures are warnings, so they show up even without --debug.
    let debug = cli.debug || std::env::var("DEBUG").is_ok_and(|v| v == "1");
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    let categories = Category::expand(&cli.clean);
    if categories.is_empty() {
        println!("nothing selected - pass --clean with one or more categories");
        return ExitCode::SUCCESS;
    }

    let cfg = match aws::resolve(cli.sso_profile.as_deref(), &cli.region).await {
        Ok(cfg) => cfg,
        Err(err) => {
            log::error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = awsweep::run(&cfg, &categories, cli.parallel).await;
    if outcome.failed == 0 {
        ExitCode::SUCCESS
    } else {
        log::warn!(
            "{} of {} operations failed",
            outcome.failed,
            outcome.failed + outcome.succeeded
        );
        ExitCode::FAILURE
    }
}
