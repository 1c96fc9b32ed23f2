//! Time handling for response validity windows
//!
//! Responses are quantized to the hour: `thisUpdate` is the current time
//! truncated to the hour and `nextUpdate` follows one day later.

use chrono::{DateTime, Duration, DurationRound, Utc};
use der::asn1::GeneralizedTime;
use std::fmt::Debug;

use crate::error::{OcspCoreError, Result};

/// Length of a response validity window
pub const VALIDITY: Duration = Duration::days(1);

/// Source of the current time
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Truncate a timestamp to the start of its hour
pub fn truncate_to_hour(at: DateTime<Utc>) -> Result<DateTime<Utc>> {
    at.duration_trunc(Duration::hours(1))
        .map_err(|e| OcspCoreError::InvalidTime(e.to_string()))
}

/// Compute `(thisUpdate, nextUpdate)` for a response produced at `now`
pub fn validity_window(now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let this_update = truncate_to_hour(now)?;
    let next_update = this_update
        .checked_add_signed(VALIDITY)
        .ok_or_else(|| OcspCoreError::InvalidTime(format!("{} + 1 day overflows", this_update)))?;
    Ok((this_update, next_update))
}

/// Format as an RFC 1123 HTTP date (`Last-Modified`, `Expires`)
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Convert to an ASN.1 GeneralizedTime with second precision
pub fn to_generalized_time(at: DateTime<Utc>) -> Result<GeneralizedTime> {
    let secs = u64::try_from(at.timestamp())
        .map_err(|_| OcspCoreError::InvalidTime(format!("{} predates the unix epoch", at)))?;
    GeneralizedTime::from_unix_duration(std::time::Duration::from_secs(secs))
        .map_err(|e| OcspCoreError::InvalidTime(e.to_string()))
}

/// Convert an ASN.1 GeneralizedTime back to a chrono timestamp
pub fn from_generalized_time(time: GeneralizedTime) -> Result<DateTime<Utc>> {
    let secs = i64::try_from(time.to_unix_duration().as_secs())
        .map_err(|e| OcspCoreError::InvalidTime(e.to_string()))?;
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| OcspCoreError::InvalidTime(format!("{} is out of range", secs)))
}
