//! Slot calendar arithmetic.
//!
//! A slot stores its calendar date and time-of-day as two separate
//! fields. Every ordering decision in the system goes through
//! [`slot_instant`], which combines the pair into one comparable
//! instant, so list sorting and "next upcoming" selection cannot drift
//! apart.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Parse a stored or submitted slot date.
///
/// Accepts plain `YYYY-MM-DD` as well as RFC 3339 timestamps; a time
/// suffix and any trailing zone marker are stripped before parsing.
pub fn parse_slot_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim().trim_end_matches(['z', 'Z']);
    let s = s.split('T').next().unwrap_or(s);
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Parse a time-of-day string in either 12-hour (`10:00 AM`) or
/// 24-hour (`14:30`) form.
pub fn parse_slot_time(raw: &str) -> Option<NaiveTime> {
    let s = raw.trim();
    NaiveTime::parse_from_str(s, "%I:%M %p")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

/// The composite ordering key for a slot: its date and time-of-day
/// combined into a single instant. `None` when either part is
/// unparsable.
pub fn slot_instant(date: &str, time: &str) -> Option<NaiveDateTime> {
    Some(parse_slot_date(date)?.and_time(parse_slot_time(time)?))
}

/// Sort most recent first by the composite key; items without a
/// parsable key sort last.
pub fn sort_most_recent_first<T>(items: &mut [T], key: impl Fn(&T) -> Option<NaiveDateTime>) {
    items.sort_by_key(|item| {
        let instant = key(item);
        (instant.is_none(), std::cmp::Reverse(instant))
    });
}

/// The item whose composite key is the earliest instant strictly after
/// `now`. Items without a parsable key never qualify.
pub fn next_upcoming<T>(
    items: Vec<T>,
    now: NaiveDateTime,
    key: impl Fn(&T) -> Option<NaiveDateTime>,
) -> Option<T> {
    items
        .into_iter()
        .filter_map(|item| key(&item).filter(|instant| *instant > now).map(|i| (i, item)))
        .min_by_key(|(instant, _)| *instant)
        .map(|(_, item)| item)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_date_parses() {
        assert_eq!(
            parse_slot_date("2025-01-10"),
            NaiveDate::from_ymd_opt(2025, 1, 10)
        );
    }

    #[test]
    fn rfc3339_date_with_zone_marker_parses() {
        assert_eq!(
            parse_slot_date("2025-01-10T00:00:00.000Z"),
            NaiveDate::from_ymd_opt(2025, 1, 10)
        );
        assert_eq!(
            parse_slot_date("2025-01-10Z"),
            NaiveDate::from_ymd_opt(2025, 1, 10)
        );
    }

    #[test]
    fn garbage_date_is_rejected() {
        for raw in ["", "10/01/2025", "2025-13-01", "soon"] {
            assert_eq!(parse_slot_date(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn twelve_and_twenty_four_hour_times_parse() {
        assert_eq!(
            parse_slot_time("10:00 AM"),
            NaiveTime::from_hms_opt(10, 0, 0)
        );
        assert_eq!(
            parse_slot_time("02:30 PM"),
            NaiveTime::from_hms_opt(14, 30, 0)
        );
        assert_eq!(parse_slot_time("14:30"), NaiveTime::from_hms_opt(14, 30, 0));
        assert_eq!(parse_slot_time("not a time"), None);
    }

    #[test]
    fn composite_key_combines_both_fields() {
        let morning = slot_instant("2025-01-10T00:00:00.000Z", "09:00 AM").unwrap();
        let evening = slot_instant("2025-01-10", "05:00 PM").unwrap();
        let next_day = slot_instant("2025-01-11", "08:00 AM").unwrap();
        assert!(morning < evening);
        assert!(evening < next_day);
    }

    #[test]
    fn composite_key_requires_both_parts() {
        assert_eq!(slot_instant("2025-01-10", "nope"), None);
        assert_eq!(slot_instant("nope", "09:00 AM"), None);
    }

    #[test]
    fn sort_is_strictly_descending_with_unparsable_last() {
        let mut slots = vec![
            ("2025-01-10", "09:00 AM"),
            ("bad-date", "09:00 AM"),
            ("2025-01-12", "08:00 AM"),
            ("2025-01-10", "05:00 PM"),
        ];
        sort_most_recent_first(&mut slots, |(d, t)| slot_instant(d, t));
        assert_eq!(
            slots,
            vec![
                ("2025-01-12", "08:00 AM"),
                ("2025-01-10", "05:00 PM"),
                ("2025-01-10", "09:00 AM"),
                ("bad-date", "09:00 AM"),
            ]
        );
        let keys: Vec<_> = slots
            .iter()
            .filter_map(|(d, t)| slot_instant(d, t))
            .collect();
        for pair in keys.windows(2) {
            assert!(pair[0] > pair[1]);
        }
    }

    #[test]
    fn next_upcoming_is_strictly_future() {
        let now = slot_instant("2025-01-10", "12:00").unwrap();
        let slots = vec![
            ("2025-01-10", "09:00 AM"),
            ("2025-01-10", "12:00"),
            ("2025-01-11", "09:00 AM"),
            ("2025-01-10", "01:00 PM"),
        ];
        let next = next_upcoming(slots, now, |(d, t)| slot_instant(d, t));
        assert_eq!(next, Some(("2025-01-10", "01:00 PM")));
    }

    #[test]
    fn next_upcoming_ignores_unparsable_and_past() {
        let now = slot_instant("2025-06-01", "00:00").unwrap();
        let slots = vec![("2025-01-10", "09:00 AM"), ("garbage", "09:00 AM")];
        assert_eq!(next_upcoming(slots, now, |(d, t)| slot_instant(d, t)), None);
    }
}
