//! Business-day arithmetic for standard payout arrival dates.
//!
//! Weekends never count; holiday calendars are not modeled (known
//! limitation of the payout-date logic, preserved deliberately).

use chrono::{Datelike, Days, NaiveDate, Weekday};

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Arrival date for a payout requested on `from` with a delay of
/// `delay_days` business days.
///
/// A request landing on a weekend does not enter processing until the next
/// business day; the delay counts from that effective start. This is why
/// Saturday + 1 business day arrives Tuesday, and must match exactly the
/// standard-payout arrival date shown to providers.
pub fn next_business_day(from: NaiveDate, delay_days: u32) -> NaiveDate {
    let mut date = from;
    while !is_business_day(date) {
        date = date + Days::new(1);
    }

    let mut counted = 0;
    while counted < delay_days {
        date = date + Days::new(1);
        if is_business_day(date) {
            counted += 1;
        }
    }
    date
}
