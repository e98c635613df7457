/// Value returned by the vendor C driver when a measurement fails. Lies
/// outside the range of [`calc_temperature`], so callers that need a plain
/// integer can fold errors into it.
pub const ERROR_SENTINEL: i32 = -32768;

pub const MIN: i32 = -4685;
pub const MAX: i32 = 12886;

/// Convert a raw big-endian reading into hundredths of a degree Celsius.
///
/// `T = 175.72 * raw / 65536 - 46.85`, in integer arithmetic with a
/// truncating shift so results match the vendor reference bit for bit.
pub fn calc_temperature(raw: [u8; 2]) -> i32 {
    let raw = u16::from_be_bytes(raw) as u32;
    ((17572 * raw) >> 16) as i32 - 4685
}

#[cfg(test)]
mod test {
    use super::{calc_temperature, ERROR_SENTINEL, MAX, MIN};

    #[test]
    fn known_value() {
        assert_eq!(calc_temperature([100, 255]), 2247);
    }

    #[test]
    fn full_range() {
        for hi in 0..=u8::MAX {
            for lo in 0..=u8::MAX {
                let t = calc_temperature([hi, lo]);
                assert!((MIN..=MAX).contains(&t), "{hi:#04x}{lo:02x} -> {t}");
                assert_ne!(t, ERROR_SENTINEL);
            }
        }

        assert_eq!(calc_temperature([0x00, 0x00]), MIN);
        assert_eq!(calc_temperature([0xFF, 0xFF]), MAX);
    }

    #[test]
    fn monotonic() {
        let mut last = i32::MIN;
        for raw in 0..=u16::MAX {
            let t = calc_temperature(raw.to_be_bytes());
            assert!(t >= last);
            last = t;
        }
    }

    // 746 raw counts is the 2 degree window used for back-to-back readings
    #[test]
    fn two_degree_window() {
        for raw in 0..=u16::MAX - 746 {
            let a = calc_temperature(raw.to_be_bytes());
            let b = calc_temperature((raw + 746).to_be_bytes());
            assert!((199..=201).contains(&(b - a)), "{raw}: {a} -> {b}");
        }
    }

    #[test]
    fn deterministic() {
        let raw = [0x66, 0x4C];
        assert_eq!(calc_temperature(raw), calc_temperature(raw));
        assert_eq!(calc_temperature(raw), 2336);
    }
}
