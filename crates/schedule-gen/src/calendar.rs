//! Season calendar: week anchors, the holiday week and kickoff timestamps.
//!
//! Kickoffs are expressed in a fixed reference zone (US Eastern, with the
//! US daylight-saving rule applied per date) and serialized as UTC.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Weekday};
use league_core::TimeSlot;

/// The `n`-th (1-based) `weekday` of a month.
pub fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let shift =
        (7 + weekday.num_days_from_monday() - first.weekday().num_days_from_monday()) % 7;
    first.checked_add_signed(Duration::days(i64::from(shift + 7 * n.saturating_sub(1))))
}

/// Thursday of week 1: the second Thursday of September.
pub fn season_start(year: i32) -> Option<NaiveDate> {
    nth_weekday(year, 9, Weekday::Thu, 2)
}

/// Thursday anchor of a 1-based season week.
pub fn week_thursday(start: NaiveDate, week: u8) -> Option<NaiveDate> {
    let offset = 7 * i64::from(week.saturating_sub(1));
    start.checked_add_signed(Duration::days(offset))
}

/// Week whose Thursday is the fourth Thursday of November, if the season
/// reaches it.
pub fn holiday_week(year: i32, weeks: u8) -> Option<u8> {
    let start = season_start(year)?;
    let holiday = nth_weekday(year, 11, Weekday::Thu, 4)?;
    let days = holiday.signed_duration_since(start).num_days();
    if days < 0 || days % 7 != 0 {
        return None;
    }
    let week = u8::try_from(days / 7 + 1).ok()?;
    (week <= weeks).then_some(week)
}

/// Offset of the reference zone on a given local date.
pub fn eastern_offset(date: NaiveDate) -> Option<FixedOffset> {
    let dst_start = nth_weekday(date.year(), 3, Weekday::Sun, 2)?;
    let dst_end = nth_weekday(date.year(), 11, Weekday::Sun, 1)?;
    let hours = if date >= dst_start && date < dst_end { 4 } else { 5 };
    FixedOffset::west_opt(hours * 3600)
}

/// Concrete kickoff for a slot in a week. `None` only for dates chrono
/// cannot represent, which callers surface as "date TBA".
pub fn kickoff(start: NaiveDate, week: u8, slot: TimeSlot) -> Option<DateTime<FixedOffset>> {
    let date = week_thursday(start, week)?.checked_add_signed(Duration::days(slot.day_offset()))?;
    let (hour, minute) = slot.local_time();
    let local = date.and_hms_opt(hour, minute, 0)?;
    eastern_offset(date)?.from_local_datetime(&local).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use league_core::kickoff_iso;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn season_starts_on_second_thursday() {
        assert_eq!(season_start(2024), Some(ymd(2024, 9, 12)));
        assert_eq!(season_start(2023), Some(ymd(2023, 9, 14)));
        assert_eq!(season_start(2022), Some(ymd(2022, 9, 8)));
    }

    #[test]
    fn holiday_week_falls_mid_season() {
        assert_eq!(holiday_week(2024, 18), Some(12));
        for year in 1970..=2100 {
            let w = holiday_week(year, 18).unwrap();
            assert!(w == 11 || w == 12, "{year}: week {w}");
        }
        assert_eq!(holiday_week(2024, 10), None);
    }

    #[test]
    fn kickoffs_follow_daylight_saving() {
        let start = season_start(2024).unwrap();
        let iso = |week, slot| kickoff_iso(&kickoff(start, week, slot).unwrap());
        assert_eq!(iso(1, TimeSlot::ThursdayNight), "2024-09-13T00:15:00.000Z");
        // 2024-11-03 is the first Sunday of November: standard time.
        assert_eq!(iso(8, TimeSlot::SundayEarly), "2024-11-03T18:00:00.000Z");
        assert_eq!(iso(7, TimeSlot::SundayEarly), "2024-10-27T17:00:00.000Z");
        assert_eq!(iso(12, TimeSlot::HolidayEarly), "2024-11-28T17:30:00.000Z");
        assert_eq!(iso(18, TimeSlot::MondayNight), "2025-01-14T01:15:00.000Z");
    }

    #[test]
    fn nth_weekday_examples() {
        assert_eq!(nth_weekday(2024, 3, Weekday::Sun, 2), Some(ymd(2024, 3, 10)));
        assert_eq!(nth_weekday(2024, 11, Weekday::Thu, 4), Some(ymd(2024, 11, 28)));
        assert_eq!(nth_weekday(2024, 13, Weekday::Thu, 1), None);
    }
}
