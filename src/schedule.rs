// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Scheduled-time validation.

use crate::error::{AdmissionError, Result};
use chrono::{DateTime, Months, NaiveDateTime, Utc};
use tracing::debug;

/// Default horizon: one calendar year.
pub const DEFAULT_HORIZON_MONTHS: u32 = 12;

/// Offset-less forms, read as UTC. The scheduling form submits minutes only.
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Validate a raw scheduled time against the current time and the default
/// one-year horizon.
pub fn validate_scheduled_time(raw: &str) -> Result<DateTime<Utc>> {
    validate_scheduled_time_at(raw, Utc::now(), DEFAULT_HORIZON_MONTHS)
}

/// Validate `raw` against a fixed `now`.
///
/// Checks run in order and the first failure wins: empty, unparsable,
/// before `now`, after `now + horizon_months`.
pub fn validate_scheduled_time_at(
    raw: &str,
    now: DateTime<Utc>,
    horizon_months: u32,
) -> Result<DateTime<Utc>> {
    if raw.is_empty() {
        return Err(AdmissionError::MissingValue);
    }

    let scheduled = parse_instant(raw).ok_or_else(|| {
        debug!(raw = %raw, "Unparsable scheduled time");
        AdmissionError::InvalidFormat
    })?;

    if scheduled < now {
        debug!(%scheduled, %now, "Scheduled time in the past");
        return Err(AdmissionError::NotInFuture);
    }

    let horizon = now
        .checked_add_months(Months::new(horizon_months))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    if scheduled > horizon {
        debug!(%scheduled, %horizon, "Scheduled time beyond horizon");
        return Err(AdmissionError::TooFarInFuture);
    }

    Ok(scheduled)
}

/// Parse RFC 3339 first, then the offset-less forms as UTC.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
    }

    fn check(raw: &str) -> Result<DateTime<Utc>> {
        validate_scheduled_time_at(raw, fixed_now(), DEFAULT_HORIZON_MONTHS)
    }

    #[test]
    fn test_empty_is_missing() {
        assert_eq!(check(""), Err(AdmissionError::MissingValue));
    }

    #[test]
    fn test_garbage_is_invalid_format() {
        assert_eq!(check("tomorrow"), Err(AdmissionError::InvalidFormat));
        assert_eq!(check("2026-13-45T99:00"), Err(AdmissionError::InvalidFormat));
        assert_eq!(check("   "), Err(AdmissionError::InvalidFormat));
    }

    #[test]
    fn test_past_rejected() {
        let raw = (fixed_now() - Duration::seconds(1)).to_rfc3339();
        assert_eq!(check(&raw), Err(AdmissionError::NotInFuture));
    }

    #[test]
    fn test_near_future_accepted() {
        let at = fixed_now() + Duration::hours(1);
        assert_eq!(check(&at.to_rfc3339()), Ok(at));
    }

    #[test]
    fn test_now_itself_accepted() {
        assert_eq!(check(&fixed_now().to_rfc3339()), Ok(fixed_now()));
    }

    #[test]
    fn test_beyond_one_year_rejected() {
        let raw = (fixed_now() + Duration::days(366)).to_rfc3339();
        assert_eq!(check(&raw), Err(AdmissionError::TooFarInFuture));

        let edge = Utc.with_ymd_and_hms(2027, 10, 17, 12, 0, 0).unwrap();
        assert_eq!(check(&edge.to_rfc3339()), Ok(edge));
    }

    #[test]
    fn test_offset_and_naive_forms() {
        assert_eq!(
            check("2026-10-18T11:00:00+02:00"),
            Ok(Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap())
        );
        assert_eq!(
            check("2026-10-18T09:00"),
            Ok(Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap())
        );
        assert_eq!(
            check("2026-10-18T09:00:30.500"),
            Ok(Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 30).unwrap() + Duration::milliseconds(500))
        );
    }

    #[test]
    fn test_live_clock() {
        let soon = (Utc::now() + Duration::hours(1)).to_rfc3339();
        assert!(validate_scheduled_time(&soon).is_ok());
        let past = (Utc::now() - Duration::seconds(1)).to_rfc3339();
        assert_eq!(validate_scheduled_time(&past), Err(AdmissionError::NotInFuture));
    }
}
