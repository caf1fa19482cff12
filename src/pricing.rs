//! Money arithmetic for the marketplace
//!
//! All amounts are integer cents, so every computation here is exact.
//! Borrow requests price by inclusive day count, hourly services by the
//! minute span of their `[start, end)` slot, and withdrawals carry a
//! basis-point fee rounded half up to the cent.

use chrono::{NaiveDate, NaiveTime};

/// Standard withdrawal tier: 0.5% fee, settles in 1-3 business days.
pub const STANDARD_FEE_BPS: i64 = 50;

/// Express withdrawal tier: 1.5% fee, settles in 15-30 minutes.
pub const EXPRESS_FEE_BPS: i64 = 150;

/// Number of days a borrow request spans, counting both endpoints.
/// `2024-01-01 → 2024-01-03` is 3 days.
pub fn inclusive_day_count(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Total for a borrow request at a given daily price.
pub fn borrow_total_cents(daily_price_cents: i64, start: NaiveDate, end: NaiveDate) -> i64 {
    daily_price_cents * inclusive_day_count(start, end)
}

/// Minute span of a same-day `[start, end)` slot.
pub fn duration_minutes(start: NaiveTime, end: NaiveTime) -> i64 {
    (end - start).num_minutes()
}

/// Total for an hourly-priced service over a minute span.
pub fn hourly_total_cents(price_per_hour_cents: i64, minutes: i64) -> i64 {
    price_per_hour_cents * minutes / 60
}

/// Fee for a withdrawal at the given basis-point rate, rounded half up.
pub fn withdrawal_fee_cents(amount_cents: i64, fee_bps: i64) -> i64 {
    (amount_cents * fee_bps + 5_000) / 10_000
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    #[test]
    fn test_inclusive_day_count() {
        assert_eq!(inclusive_day_count(date("2024-01-01"), date("2024-01-03")), 3);
        assert_eq!(inclusive_day_count(date("2024-01-01"), date("2024-01-01")), 1);
        assert_eq!(inclusive_day_count(date("2024-02-27"), date("2024-03-01")), 4);
    }

    #[test]
    fn test_borrow_total_ten_dollars_three_days() {
        // $10/day for 2024-01-01..2024-01-03 inclusive = $30
        assert_eq!(
            borrow_total_cents(1_000, date("2024-01-01"), date("2024-01-03")),
            3_000
        );
    }

    #[test]
    fn test_duration_minutes() {
        assert_eq!(duration_minutes(time("09:00"), time("12:00")), 180);
        assert_eq!(duration_minutes(time("09:00"), time("09:30")), 30);
        assert_eq!(duration_minutes(time("09:00"), time("09:00")), 0);
    }

    #[test]
    fn test_hourly_total_twenty_dollars_three_hours() {
        // $20/hour for 09:00-12:00 = $60
        assert_eq!(hourly_total_cents(2_000, 180), 6_000);
    }

    #[test]
    fn test_hourly_total_half_hour_is_exact() {
        assert_eq!(hourly_total_cents(2_000, 30), 1_000);
    }

    #[test]
    fn test_standard_fee_sixty_dollars() {
        // 0.5% of $60.00 = $0.30
        assert_eq!(withdrawal_fee_cents(6_000, STANDARD_FEE_BPS), 30);
    }

    #[test]
    fn test_express_fee_sixty_dollars() {
        // 1.5% of $60.00 = $0.90
        assert_eq!(withdrawal_fee_cents(6_000, EXPRESS_FEE_BPS), 90);
    }

    #[test]
    fn test_fee_rounds_half_up() {
        // 0.5% of $33.33 = 16.665 cents, rounds to 17
        assert_eq!(withdrawal_fee_cents(3_333, STANDARD_FEE_BPS), 17);
        // 0.5% of $33.32 = 16.66 cents, rounds to 17
        assert_eq!(withdrawal_fee_cents(3_332, STANDARD_FEE_BPS), 17);
        // 0.5% of $33.00 = 16.5 cents, half rounds up to 17
        assert_eq!(withdrawal_fee_cents(3_300, STANDARD_FEE_BPS), 17);
        // 0.5% of $32.00 = 16 cents exactly
        assert_eq!(withdrawal_fee_cents(3_200, STANDARD_FEE_BPS), 16);
    }

    #[test]
    fn test_net_is_amount_minus_fee() {
        let amount = 6_000;
        let fee = withdrawal_fee_cents(amount, STANDARD_FEE_BPS);
        assert_eq!(amount - fee, 5_970); // $59.70
    }
}
