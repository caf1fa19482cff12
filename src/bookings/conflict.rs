//! Slot conflict detection for service bookings.
//!
//! Two layers: a pure overlap predicate used for pre-checks and unit
//! tests, and a database probe that asks whether any live booking
//! already holds a slot. The exclusion constraint on the bookings
//! table remains the real guarantee; this check exists so the common
//! case fails with a friendly error instead of a constraint violation.

use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;
use uuid::Uuid;

/// Half-open interval overlap: `[s1, e1)` intersects `[s2, e2)`.
/// Bookings that merely touch (one ends exactly when the other
/// starts) do not conflict.
pub fn overlaps(s1: NaiveTime, e1: NaiveTime, s2: NaiveTime, e2: NaiveTime) -> bool {
    s1 < e2 && s2 < e1
}

#[derive(Clone)]
pub struct ConflictChecker {
    db_pool: PgPool,
}

impl ConflictChecker {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// True if any non-cancelled booking of this service overlaps the
    /// candidate slot on the given date. Errors propagate, so a failed
    /// probe refuses the booking rather than waving it through.
    pub async fn has_conflict(
        &self,
        service_id: Uuid,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Result<bool, sqlx::Error> {
        let conflict: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM service_bookings
                WHERE service_id = $1
                  AND booking_date = $2
                  AND status <> 'cancelled'
                  AND start_time < $4
                  AND $3 < end_time
            )
            "#,
        )
        .bind(service_id)
        .bind(date)
        .bind(start_time)
        .bind(end_time)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(conflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_disjoint_slots_do_not_overlap() {
        assert!(!overlaps(t(9, 0), t(10, 0), t(11, 0), t(12, 0)));
        assert!(!overlaps(t(11, 0), t(12, 0), t(9, 0), t(10, 0)));
    }

    #[test]
    fn test_touching_slots_do_not_overlap() {
        // 9-10 and 10-11 share only the boundary instant
        assert!(!overlaps(t(9, 0), t(10, 0), t(10, 0), t(11, 0)));
        assert!(!overlaps(t(10, 0), t(11, 0), t(9, 0), t(10, 0)));
    }

    #[test]
    fn test_partial_overlap() {
        assert!(overlaps(t(9, 0), t(11, 0), t(10, 0), t(12, 0)));
        assert!(overlaps(t(10, 0), t(12, 0), t(9, 0), t(11, 0)));
    }

    #[test]
    fn test_containment_overlaps() {
        assert!(overlaps(t(9, 0), t(17, 0), t(12, 0), t(13, 0)));
        assert!(overlaps(t(12, 0), t(13, 0), t(9, 0), t(17, 0)));
    }

    #[test]
    fn test_identical_slots_overlap() {
        assert!(overlaps(t(9, 0), t(10, 0), t(9, 0), t(10, 0)));
    }

    #[test]
    fn test_one_minute_spill_overlaps() {
        assert!(overlaps(t(9, 0), t(10, 1), t(10, 0), t(11, 0)));
    }
}
