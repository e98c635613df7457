use std::time::Duration;

use anyhow::{anyhow, Context};
use si7050_probe::driver::silabs::si7050::{Resolution, DEFAULT_ADDRESS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bus: u8,
    pub address: u8,
    pub interval: Duration,
    pub resolution: Resolution,
    pub check_serial: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bus: 1,
            address: DEFAULT_ADDRESS,
            interval: Duration::from_millis(1000),
            resolution: Resolution::Bits14,
            check_serial: false,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(bus) = lookup("SI7050_I2C_BUS") {
            config.bus = bus.trim().parse().context("invalid SI7050_I2C_BUS")?;
        }

        if let Some(address) = lookup("SI7050_ADDRESS") {
            config.address = parse_address(&address).context("invalid SI7050_ADDRESS")?;
        }

        if let Some(interval) = lookup("SI7050_INTERVAL_MS") {
            let ms: u64 = interval
                .trim()
                .parse()
                .context("invalid SI7050_INTERVAL_MS")?;
            config.interval = Duration::from_millis(ms);
        }

        if let Some(resolution) = lookup("SI7050_RESOLUTION") {
            let bits: u8 = resolution
                .trim()
                .parse()
                .context("invalid SI7050_RESOLUTION")?;
            config.resolution = Resolution::from_bit_count(bits)
                .ok_or_else(|| anyhow!("SI7050_RESOLUTION must be 11, 12, 13 or 14, got {bits}"))?;
        }

        if let Some(check) = lookup("SI7050_CHECK_SERIAL") {
            config.check_serial = match check.trim() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                other => return Err(anyhow!("invalid SI7050_CHECK_SERIAL {other:?}")),
            };
        }

        Ok(config)
    }
}

/// Parse a 7-bit address, given in decimal or with a `0x` prefix.
fn parse_address(s: &str) -> anyhow::Result<u8> {
    let s = s.trim();
    let address = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16)?,
        None => s.parse()?,
    };

    if address > 0x7F {
        return Err(anyhow!("{address:#04x} is not a 7-bit address"));
    }

    Ok(address)
}

#[cfg(test)]
mod test {
    use std::{collections::HashMap, time::Duration};

    use si7050_probe::driver::silabs::si7050::Resolution;

    use super::Config;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        assert_eq!(load(&[]).unwrap(), Config::default());
        assert_eq!(Config::default().address, 0x40);
    }

    #[test]
    fn overrides() {
        let config = load(&[
            ("SI7050_I2C_BUS", "3"),
            ("SI7050_ADDRESS", "0x41"),
            ("SI7050_INTERVAL_MS", "250"),
            ("SI7050_RESOLUTION", "12"),
            ("SI7050_CHECK_SERIAL", "true"),
        ])
        .unwrap();

        assert_eq!(
            config,
            Config {
                bus: 3,
                address: 0x41,
                interval: Duration::from_millis(250),
                resolution: Resolution::Bits12,
                check_serial: true,
            }
        );
    }

    #[test]
    fn decimal_address() {
        assert_eq!(load(&[("SI7050_ADDRESS", "64")]).unwrap().address, 0x40);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(load(&[("SI7050_ADDRESS", "0x80")]).is_err());
        assert!(load(&[("SI7050_ADDRESS", "forty")]).is_err());
        assert!(load(&[("SI7050_RESOLUTION", "16")]).is_err());
        assert!(load(&[("SI7050_INTERVAL_MS", "-5")]).is_err());
        assert!(load(&[("SI7050_CHECK_SERIAL", "maybe")]).is_err());
    }
}
