//! Steam Monitor - Main Entry Point

use std::process;

use steam_monitor::constants;
use steam_monitor::logic::model::OnnxModel;
use steam_monitor::logic::stream::{
    CancelFlag, JsonlHistorySink, LogSink, RunOutcome, SinkSet, StreamDriver,
};
use steam_monitor::{MonitorConfig, PipelineError};

/// Log a startup failure the way an operator needs to see it, then exit
fn fail(stage: &str, err: PipelineError) -> ! {
    if err.is_missing_file() {
        log::error!("{}: required file is missing: {}", stage, err);
    } else if err.is_malformed() {
        log::error!("{}: file is present but malformed: {}", stage, err);
    } else {
        log::error!("{}: {}", stage, err);
    }
    process::exit(1);
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} v{}", constants::APP_NAME, constants::APP_VERSION);

    let config = MonitorConfig::from_env();
    if let Err(e) = config.validate().and_then(|_| config.check_paths()) {
        fail("Configuration", e);
    }

    let model = match OnnxModel::load(&config.model_path) {
        Ok(model) => model,
        Err(e) => fail("Model", e),
    };
    let metadata = model.metadata().clone();

    let history_dir = config.history_dir.clone();
    let mut driver = StreamDriver::new(config, model).with_model_metadata(metadata);
    if let Err(e) = driver.start() {
        fail("Dataset", e);
    }

    let mut sinks = SinkSet::new()
        .with(LogSink)
        .with(JsonlHistorySink::in_dir(history_dir));

    let cancel = CancelFlag::new();
    let worker_cancel = cancel.clone();
    let mut task = tokio::task::spawn_blocking(move || {
        let result = driver.run(&mut sinks, &worker_cancel);
        (driver, result)
    });

    let joined = tokio::select! {
        res = &mut task => res,
        _ = tokio::signal::ctrl_c() => {
            log::warn!("Ctrl-C received, stopping after the current reading");
            cancel.cancel();
            task.await
        }
    };

    let (driver, result) = match joined {
        Ok(pair) => pair,
        Err(e) => {
            log::error!("Session task failed: {}", e);
            process::exit(1);
        }
    };

    let summary = match result {
        Ok(RunOutcome::Finished(summary)) => summary,
        Ok(RunOutcome::Cancelled(summary)) => {
            log::warn!("Session stopped early");
            summary
        }
        Err(e) => fail("Session", e),
    };

    match serde_json::to_string_pretty(&driver.stream_state().anomaly_table()) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to serialize anomalies table: {}", e),
    }

    log::info!(
        "Processed {} readings: {} anomalies (normal {}, caution {}, anomaly {}) in {} ms",
        summary.processed,
        summary.anomalies,
        summary.severity_counts.normal,
        summary.severity_counts.caution,
        summary.severity_counts.anomaly,
        summary.elapsed_ms
    );
}
