use linky_tic::{metering_tic::tag_definitions::describe_tag, ConfigHolder, ReaderSession, SerialTransport};
use log::{error, info, warn};
use std::time::Duration;

fn build_report(session: &ReaderSession<SerialTransport>) -> serde_json::Map<String, serde_json::Value> {
    let mut report = serde_json::Map::new();

    for (tag, value) in session.snapshot() {
        let mut entry = match serde_json::to_value(&value) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => continue,
        };
        if let Some(description) = describe_tag(session.mode(), &tag) {
            entry.insert("description".to_string(), description.into());
        }
        report.insert(tag, entry.into());
    }

    report
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging
    let default_filter = std::env::var("LINKY_LOG_LEVEL").unwrap_or("info".to_string());
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(default_filter));

    let holder = match ConfigHolder::load() {
        Ok(holder) => holder,
        Err(e) => {
            warn!("{e}, using the default configuration");
            ConfigHolder::defaults()
        }
    };
    let config = holder.tic().clone();
    info!("Serial port: {}", config.port);
    info!("Standard mode: {}", config.standard_mode);

    let session = ReaderSession::from_config(&config, SerialTransport);

    let runner = session.clone();
    let reader = tokio::spawn(async move {
        runner.run().await;
    });

    /* Periodic value report */
    let reporter_session = session.clone();
    let report_interval = Duration::from_secs(config.report_interval.max(1));
    let reporter = tokio::spawn(async move {
        let mut interval = tokio::time::interval(report_interval);
        interval.tick().await; // Nothing to report right after startup

        loop {
            interval.tick().await;
            if !reporter_session.is_connected() {
                info!("Serial connection not ready, no values to report");
                continue;
            }

            let report = build_report(&reporter_session);
            match serde_json::to_string(&report) {
                Ok(json) => info!("Current values: {json}"),
                Err(e) => error!("Unable to serialize the current values: {e}"),
            }
        }
    });

    info!("TIC reader started, now waiting for a signal to exit");
    tokio::signal::ctrl_c().await?;

    reporter.abort();
    session.stop();
    if let Err(e) = reader.await {
        error!("TIC reader task failed: {e}");
    }

    info!("TIC reader stopped");
    Ok(())
}
