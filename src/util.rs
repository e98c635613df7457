use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

pub struct Interval {
    last_tick: Instant,
    period: Duration,
}

impl Interval {
    pub fn new(period: Duration) -> Self {
        Self {
            last_tick: Instant::now(),
            period,
        }
    }

    /// Sleep out the rest of the current period. Returns early (and `false`)
    /// if `ct` is cancelled in the meantime.
    pub fn tick(&mut self, ct: &CancellationToken) -> bool {
        const SLICE: Duration = Duration::from_millis(20);

        let deadline = self.last_tick + self.period;
        loop {
            if ct.is_cancelled() {
                return false;
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep(SLICE.min(deadline - now));
        }

        self.last_tick = Instant::now();
        true
    }
}

/// Format hundredths of a degree as `"-1.05"`.
pub fn format_centi(centi: i32) -> String {
    let sign = if centi < 0 { "-" } else { "" };
    let abs = centi.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod test {
    use std::time::{Duration, Instant};

    use tokio_util::sync::CancellationToken;

    use super::{format_centi, Interval};

    #[test]
    fn format() {
        assert_eq!(format_centi(2247), "22.47");
        assert_eq!(format_centi(5), "0.05");
        assert_eq!(format_centi(-105), "-1.05");
        assert_eq!(format_centi(-4685), "-46.85");
    }

    #[test]
    fn interval_waits_for_period() {
        let ct = CancellationToken::new();
        let mut interval = Interval::new(Duration::from_millis(30));

        let start = Instant::now();
        assert!(interval.tick(&ct));
        assert!(start.elapsed() >= Duration::from_millis(25));
    }

    #[test]
    fn interval_stops_when_cancelled() {
        let ct = CancellationToken::new();
        ct.cancel();

        let mut interval = Interval::new(Duration::from_secs(60));
        let start = Instant::now();
        assert!(!interval.tick(&ct));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
