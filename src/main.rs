use clap::Parser;
use site_harvest::Harvest;
use std::process::ExitCode;

mod args;
use args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    let mut harvest = Harvest::new(&args.url);
    if let Some(path) = &args.config {
        harvest = match harvest.with_config_file(path) {
            Ok(harvest) => harvest,
            Err(e) => {
                ::log::error!("Failed to load config {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        };
    }
    let config = args.apply(harvest.config().clone());

    ::log::info!("Starting harvest for URL: {}", config.start_url);

    let harvester = match harvest.with_config(config).start().await {
        Ok(harvester) => harvester,
        Err(e) => {
            ::log::error!("Failed to start harvest: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let start_time = std::time::Instant::now();
    let (outcome, interrupted) = tokio::select! {
        result = harvester.run() => (result, false),
        _ = tokio::signal::ctrl_c() => {
            ::log::warn!(
                "Interrupted with {} assets collected; writing report for work done so far",
                harvester.session().collector().assets().len()
            );
            (Ok(()), true)
        }
    };
    harvester.shutdown().await;

    let report = harvester.report(interrupted);
    let report_written = match report.write(&harvester.report_path()).await {
        Ok(()) => true,
        Err(e) => {
            ::log::error!("Failed to write report: {}", e);
            false
        }
    };
    report.log_summary();
    ::log::info!(
        "Harvest took {:.2} seconds",
        start_time.elapsed().as_secs_f64()
    );

    match outcome {
        Err(e) => {
            ::log::error!("Harvest failed: {}", e);
            ExitCode::FAILURE
        }
        Ok(()) if !report_written => ExitCode::FAILURE,
        Ok(()) if interrupted => ExitCode::from(130),
        Ok(()) => ExitCode::SUCCESS,
    }
}
