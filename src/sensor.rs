use std::thread::JoinHandle;

use anyhow::Context;
use rppal::i2c::I2c;
use si7050_probe::driver::{
    silabs::si7050::{serial::ID_INDEX, FirmwareVersion, SensorType, Si7050},
    ThreadDelay,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::{config::Config, util::Interval};

#[derive(Debug, Clone, Copy)]
pub enum Event {
    Ready {
        sensor_type: Option<SensorType>,
        firmware: FirmwareVersion,
    },
    Reading {
        centi_celsius: i32,
    },
    MeasurementFailed,
}

pub fn spawn_thread(
    ct: CancellationToken,
    config: Config,
    evt_tx: flume::Sender<Event>,
) -> JoinHandle<anyhow::Result<()>> {
    std::thread::spawn(move || {
        let i2c = I2c::with_bus(config.bus)
            .with_context(|| format!("failed to open i2c bus {}", config.bus))?;
        let mut sensor = Si7050::with_address(i2c, config.address);
        let mut delay = ThreadDelay;

        sensor
            .reset_and_initialize(&mut delay)
            .context("failed to initialize si7050")?;
        sensor
            .set_resolution(config.resolution)
            .context("failed to set resolution")?;

        let firmware = FirmwareVersion::from(
            sensor
                .get_firmware_version()
                .context("failed to get firmware version")?,
        );

        let serial = if config.check_serial {
            sensor.get_serial_checked()
        } else {
            sensor.get_serial()
        }
        .context("failed to read serial number")?;

        let sensor_type = SensorType::from_id(serial[ID_INDEX]);
        if sensor_type.is_none() {
            warn!("unrecognized sensor type code {:#04x}", serial[ID_INDEX]);
        }
        debug!("initialized si7050 driver, serial = {serial:02x?}");

        let _ = evt_tx.send(Event::Ready {
            sensor_type,
            firmware,
        });

        let mut interval = Interval::new(config.interval);

        loop {
            // no retries inside the driver, a failed reading is reported and
            // the next tick tries again
            let evt = match sensor.get_temperature(&mut delay) {
                Ok(centi_celsius) => {
                    trace!("measured {centi_celsius}");
                    Event::Reading { centi_celsius }
                }
                Err(e) => {
                    warn!("measurement failed: {e}");
                    Event::MeasurementFailed
                }
            };

            if evt_tx.send(evt).is_err() {
                break;
            }

            if !interval.tick(&ct) {
                info!("sensor thread cancelled");
                break;
            }
        }

        Ok(())
    })
}
