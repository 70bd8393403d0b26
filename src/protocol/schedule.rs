//! Schedule payload parsing.

use crate::data::ScheduledTime;
use crate::error::{Error, Result};

/// Maximum number of schedule entries the device stores.
pub const MAX_SCHEDULE_ENTRIES: usize = 8;

/// Parse the schedule characteristic.
///
/// Layout:
/// - Byte 0: Entry count
/// - Then `min(count, 8)` pairs of (hour, minute)
///
/// Entries with an out-of-range hour or minute are skipped. A payload that
/// ends before the announced entries is rejected.
pub fn parse_schedule(data: &[u8]) -> Result<Vec<ScheduledTime>> {
    let (&count, entries) = data.split_first().ok_or_else(|| Error::InvalidData {
        context: "Schedule payload is empty".to_string(),
    })?;

    let count = (count as usize).min(MAX_SCHEDULE_ENTRIES);
    if entries.len() < count * 2 {
        return Err(Error::InvalidData {
            context: format!(
                "Schedule data too short: {} entries announced, {} bytes present",
                count,
                entries.len()
            ),
        });
    }

    Ok(entries
        .chunks_exact(2)
        .take(count)
        .filter_map(|pair| ScheduledTime::new(pair[0], pair[1]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn formatted(times: &[ScheduledTime]) -> Vec<String> {
        times.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_schedule() {
        let times = parse_schedule(&[2, 8, 0, 20, 30]).unwrap();
        assert_eq!(formatted(&times), vec!["08:00", "20:30"]);
    }

    #[test]
    fn test_parse_schedule_empty_count() {
        assert!(parse_schedule(&[0]).unwrap().is_empty());
        assert!(parse_schedule(&[]).is_err());
    }

    #[test]
    fn test_parse_schedule_skips_invalid_entries() {
        let times = parse_schedule(&[3, 24, 0, 6, 15, 12, 60]).unwrap();
        assert_eq!(formatted(&times), vec!["06:15"]);
    }

    #[test]
    fn test_parse_schedule_caps_entries() {
        let mut data = vec![10];
        for hour in 0..10u8 {
            data.extend_from_slice(&[hour, 0]);
        }
        let times = parse_schedule(&data).unwrap();
        assert_eq!(times.len(), MAX_SCHEDULE_ENTRIES);
        assert_eq!(times.last().unwrap().to_string(), "07:00");
    }

    #[test]
    fn test_parse_schedule_cap_tolerates_short_tail() {
        // Announces 12 entries but only carries the first 8.
        let mut data = vec![12];
        for hour in 0..8u8 {
            data.extend_from_slice(&[hour, 30]);
        }
        assert_eq!(parse_schedule(&data).unwrap().len(), 8);
    }

    #[test]
    fn test_parse_schedule_truncated() {
        assert!(parse_schedule(&[2, 8, 0, 20]).is_err());
    }

    proptest! {
        #[test]
        fn schedule_parse_never_panics(data in proptest::collection::vec(any::<u8>(), 0..24)) {
            if let Ok(times) = parse_schedule(&data) {
                prop_assert!(times.len() <= MAX_SCHEDULE_ENTRIES);
                for t in times {
                    prop_assert!(t.hour() < 24 && t.minute() < 60);
                }
            }
        }
    }
}
