use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod sensor;
mod util;

use sensor::Event;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = config::Config::from_env()?;
    info!("starting with {config:?}");

    let ct = CancellationToken::new();
    let handler_ct = ct.clone();

    ctrlc::set_handler(move || {
        info!("received ctrl+c, exiting");
        handler_ct.cancel();
    })?;

    let (evt_tx, evt_rx) = flume::bounded(256);
    let sensor_join = sensor::spawn_thread(ct.clone(), config, evt_tx);

    // the channel closes when the sensor thread exits
    for evt in evt_rx.iter() {
        match evt {
            Event::Ready {
                sensor_type,
                firmware,
            } => info!("sensor ready: type = {sensor_type:?}, firmware = {firmware:?}"),
            Event::Reading { centi_celsius } => {
                info!("temperature = {} °C", util::format_centi(centi_celsius))
            }
            Event::MeasurementFailed => warn!("no reading this interval"),
        }
    }

    sensor_join.join().unwrap()?;

    info!("exit");

    Ok(())
}
