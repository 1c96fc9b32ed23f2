//! Property-Based Tests for response timing and serial handling
//!
//! 1. thisUpdate is always truncated to the hour and never in the future
//! 2. nextUpdate - thisUpdate is always exactly 24 hours
//! 3. Serials that fit in an i64 survive the store key conversion

use chrono::{DateTime, Duration, Timelike, Utc};
use ocsp_core::time::{http_date, truncate_to_hour, validity_window};
use ocsp_core::{
    CertificateStatus, HashAlgorithm, OcspRequest, ResponderIdentity, ResponseTemplate, Serial,
};
use proptest::prelude::*;

const CA_PEM: &str = include_str!("../../../testdata/ca.pem");
const RESPONDER_PEM: &str = include_str!("../../../testdata/responder.pem");
const RESPONDER_KEY: &str = include_str!("../../../testdata/responder.key");

/// Timestamps between 1970 and 2100
fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_102_444_800).prop_map(|secs| DateTime::from_timestamp(secs, 0).unwrap())
}

// =============================================================================
// Validity window
// =============================================================================

proptest! {
    #[test]
    fn prop_this_update_truncated_to_hour(now in arb_instant()) {
        let (this_update, _) = validity_window(now).unwrap();

        prop_assert_eq!(this_update.minute(), 0);
        prop_assert_eq!(this_update.second(), 0);
        prop_assert!(this_update <= now);
        prop_assert!(now - this_update < Duration::hours(1));
    }

    #[test]
    fn prop_window_is_exactly_one_day(now in arb_instant()) {
        let (this_update, next_update) = validity_window(now).unwrap();
        prop_assert_eq!(next_update - this_update, Duration::hours(24));
    }

    #[test]
    fn prop_same_hour_same_window(now in arb_instant(), offset in 0i64..3600) {
        let start = truncate_to_hour(now).unwrap();
        let later = start + Duration::seconds(offset);
        prop_assert_eq!(validity_window(start).unwrap(), validity_window(later).unwrap());
    }

    #[test]
    fn prop_http_date_is_gmt(now in arb_instant()) {
        let formatted = http_date(now);
        prop_assert!(formatted.ends_with(" GMT"));
        prop_assert_eq!(formatted.len(), 29);
    }
}

// =============================================================================
// Serial conversion
// =============================================================================

proptest! {
    #[test]
    fn prop_serial_fits_i64(value in 0u64..=(i64::MAX as u64)) {
        prop_assert_eq!(Serial::from(value).to_i64(), Some(value as i64));
    }

    #[test]
    fn prop_large_serial_rejected(value in (i64::MAX as u64 + 1)..=u64::MAX) {
        prop_assert_eq!(Serial::from(value).to_i64(), None);
    }

    #[test]
    fn prop_serial_bytes_preserved(bytes in proptest::collection::vec(any::<u8>(), 1..=40)) {
        prop_assume!(bytes[0] & 0x80 == 0);
        let serial = Serial::from_unsigned_bytes(&bytes).unwrap();

        let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len() - 1);
        let mut expected = bytes[first..].to_vec();
        if expected[0] & 0x80 != 0 {
            expected.insert(0, 0x00);
        }
        prop_assert_eq!(serial.as_bytes(), expected.as_slice());
    }
}

// =============================================================================
// Template invariant
// =============================================================================

proptest! {
    #[test]
    fn prop_template_rejects_non_increasing_window(now in arb_instant(), back in 0i64..86_400) {
        let identity = ResponderIdentity::from_pem(CA_PEM, RESPONDER_PEM, RESPONDER_KEY).unwrap();
        let request = OcspRequest {
            serial_number: Serial::from(1),
            issuer_name_hash: vec![],
            issuer_key_hash: vec![],
            hash_algorithm: HashAlgorithm::Sha1,
        };

        let result = ResponseTemplate::new(
            &request,
            CertificateStatus::Good,
            now,
            now - Duration::seconds(back),
            identity.ca_cert().clone(),
            identity.responder_cert().clone(),
        );
        prop_assert!(result.is_err());
    }
}
