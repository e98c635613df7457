//! Electronic serial number: layout of the two ID read bursts and the CRC-8
//! that protects them.
//!
//! The first burst carries SNA_3..SNA_0 with a CRC after every data byte.
//! The second carries SNB_3..SNB_0 with a CRC after every second data byte,
//! followed by two bytes of padding. Each CRC covers every data byte of its
//! burst read so far.

use crc_any::CRCu8;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::FromPrimitive;
use tracing::warn;

use super::commands::serial::BURST_LEN;

pub const RAW_LEN: usize = 2 * BURST_LEN;
pub const SERIAL_LEN: usize = 8;

/// Index of the sensor type code within the 8 data bytes.
pub const ID_INDEX: usize = 4;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Slot {
    Data,
    Crc,
    Pad,
}

use Slot::{Crc, Data, Pad};

const FIRST_LAYOUT: [Slot; BURST_LEN] = [Data, Crc, Data, Crc, Data, Crc, Data, Crc];
const SECOND_LAYOUT: [Slot; BURST_LEN] = [Data, Data, Crc, Data, Data, Crc, Pad, Pad];

/// Device model, as reported by the serial number's type code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive, ToPrimitive)]
#[repr(u8)]
pub enum SensorType {
    Si7050 = 0x32,
    Si7051 = 0x33,
    Si7052 = 0x34,
    Si7053 = 0x35,
    Si7054 = 0x36,
    Si7055 = 0x37,
}

impl SensorType {
    pub fn from_id(id: u8) -> Option<Self> {
        Self::from_u8(id)
    }
}

/// Both ID read bursts exactly as they came off the bus.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RawSerial(pub [u8; RAW_LEN]);

impl RawSerial {
    pub fn from_bursts(first: [u8; BURST_LEN], second: [u8; BURST_LEN]) -> Self {
        let mut raw = [0u8; RAW_LEN];
        raw[..BURST_LEN].copy_from_slice(&first);
        raw[BURST_LEN..].copy_from_slice(&second);
        Self(raw)
    }

    /// The 8 data bytes, CRC and padding stripped.
    pub fn serial(&self) -> [u8; SERIAL_LEN] {
        extract_serial(&self.0)
    }

    pub fn is_valid(&self) -> bool {
        check_serial(&self.0)
    }
}

fn data_bytes<'a>(
    burst: &'a [u8],
    layout: &'static [Slot; BURST_LEN],
) -> impl Iterator<Item = u8> + 'a {
    burst
        .iter()
        .zip(layout.iter())
        .filter(|(_, slot)| **slot == Data)
        .map(|(byte, _)| *byte)
}

pub fn extract_serial(raw: &[u8; RAW_LEN]) -> [u8; SERIAL_LEN] {
    let (first, second) = raw.split_at(BURST_LEN);
    let mut serial = [0u8; SERIAL_LEN];

    for (dst, src) in serial
        .iter_mut()
        .zip(data_bytes(first, &FIRST_LAYOUT).chain(data_bytes(second, &SECOND_LAYOUT)))
    {
        *dst = src;
    }

    serial
}

/// CRC-8 with polynomial 0x31 (x^8 + x^5 + x^4 + 1), initial value 0x00,
/// unreflected and without final XOR.
fn new_crc() -> CRCu8 {
    CRCu8::create_crc(0x31, 8, 0x00, 0x00, false)
}

pub fn compute_crc(bytes: &[u8]) -> u8 {
    let mut crc = new_crc();
    crc.digest(bytes);
    crc.get_crc()
}

fn check_burst(burst: &[u8], layout: &[Slot; BURST_LEN]) -> bool {
    let mut crc = new_crc();

    for (offset, (&byte, slot)) in burst.iter().zip(layout.iter()).enumerate() {
        match slot {
            Data => crc.digest(&[byte]),
            Crc => {
                let expected = crc.get_crc();
                if expected != byte {
                    warn!("serial crc mismatch at offset {offset}: expected {expected:#04x}, got {byte:#04x}");
                    return false;
                }
            }
            Pad => {}
        }
    }

    true
}

/// Validate both bursts of a raw serial number read.
pub fn check_serial(raw: &[u8; RAW_LEN]) -> bool {
    let (first, second) = raw.split_at(BURST_LEN);
    check_burst(first, &FIRST_LAYOUT) && check_burst(second, &SECOND_LAYOUT)
}

#[cfg(test)]
mod test {
    use super::*;

    const SERIAL_VECTOR: [u8; RAW_LEN] = [
        0x00, 0x00, 0x16, 0xe5, 0x4b, 0xe3, 0xe6, 0xf5, 0x32, 0xff, 0xc7, 0xff, 0xff, 0x29, 0xff,
        0xff,
    ];

    #[test]
    fn valid_serial() {
        assert!(check_serial(&SERIAL_VECTOR));
    }

    #[test]
    fn flipped_data_byte() {
        let mut raw = SERIAL_VECTOR;
        raw[6] = 0xe4;
        assert!(!check_serial(&raw));
    }

    #[test]
    fn flipped_byte_in_second_burst() {
        let mut raw = SERIAL_VECTOR;
        raw[11] = 0xfe;
        assert!(!check_serial(&raw));

        let mut raw = SERIAL_VECTOR;
        raw[13] = 0x28;
        assert!(!check_serial(&raw));
    }

    #[test]
    fn padding_is_not_checked() {
        let mut raw = SERIAL_VECTOR;
        raw[14] = 0x00;
        raw[15] = 0x00;
        assert!(check_serial(&raw));
    }

    #[test]
    fn crc_matches_vector() {
        assert_eq!(compute_crc(&[0x00]), 0x00);
        assert_eq!(compute_crc(&[0x00, 0x16]), 0xe5);
        assert_eq!(compute_crc(&[0x00, 0x16, 0x4b, 0xe6]), 0xf5);
        assert_eq!(compute_crc(&[0x32, 0xff]), 0xc7);
        assert_eq!(compute_crc(&[0x32, 0xff, 0xff, 0xff]), 0x29);
    }

    #[test]
    fn extract() {
        let serial = RawSerial(SERIAL_VECTOR).serial();
        assert_eq!(serial, [0x00, 0x16, 0x4b, 0xe6, 0x32, 0xff, 0xff, 0xff]);
        assert_eq!(SensorType::from_id(serial[ID_INDEX]), Some(SensorType::Si7050));
    }

    #[test]
    fn from_bursts() {
        let mut first = [0u8; BURST_LEN];
        let mut second = [0u8; BURST_LEN];
        first.copy_from_slice(&SERIAL_VECTOR[..BURST_LEN]);
        second.copy_from_slice(&SERIAL_VECTOR[BURST_LEN..]);

        let raw = RawSerial::from_bursts(first, second);
        assert_eq!(raw, RawSerial(SERIAL_VECTOR));
        assert!(raw.is_valid());
    }

    #[test]
    fn sensor_types() {
        assert_eq!(SensorType::from_id(0x37), Some(SensorType::Si7055));
        assert_eq!(SensorType::from_id(0x31), None);
        assert_eq!(SensorType::from_id(0x38), None);
    }
}
