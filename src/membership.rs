//! Card issuance derivations shared by every store backend.
//!
//! Member numbers are labeled with the approval year but numbered from a
//! single durable sequence, so the numeric part never repeats even when the
//! year rolls over.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde_json::{json, Value};

/// Every approved member is issued the same tier.
pub const MEMBERSHIP_TIER: &str = "GOLD";

/// Membership term granted on approval, modeled as +180 days.
pub const MEMBERSHIP_TERM_DAYS: i64 = 180;

/// Card data derived exactly once, on the transition into `approved`.
#[derive(Debug, Clone)]
pub struct Issuance {
    pub member_number: String,
    pub member_since: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub card_payload: Value,
}

/// Format a member number such as `MS-2025-007`.
pub fn member_number(year: i32, sequence: i64) -> String {
    format!("MS-{year}-{sequence:03}")
}

/// Derive the card data for the `sequence`-th approval at instant `now`.
pub fn issue(sequence: i64, now: DateTime<Utc>) -> Issuance {
    let number = member_number(now.year(), sequence);
    let card_payload = json!({
        "memberId": number,
        "issued": now.to_rfc3339(),
        "tier": MEMBERSHIP_TIER,
    });

    Issuance {
        member_number: number,
        member_since: now,
        expiry_date: now + Duration::days(MEMBERSHIP_TERM_DAYS),
        card_payload,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_number_is_year_scoped_and_zero_padded() {
        assert_eq!(member_number(2025, 3), "MS-2025-003");
        assert_eq!(member_number(2026, 41), "MS-2026-041");
        // The sequence widens past three digits rather than wrapping.
        assert_eq!(member_number(2026, 1234), "MS-2026-1234");
    }

    #[test]
    fn expiry_is_exactly_180_days_after_approval() {
        let now = Utc::now();
        let issued = issue(1, now);
        assert_eq!(issued.expiry_date - now, Duration::days(180));
        assert_eq!(issued.member_since, now);
    }

    #[test]
    fn card_payload_carries_number_issuance_and_tier() {
        let now = Utc::now();
        let issued = issue(7, now);
        assert_eq!(issued.card_payload["memberId"], issued.member_number.as_str());
        assert_eq!(issued.card_payload["tier"], MEMBERSHIP_TIER);
        assert_eq!(issued.card_payload["issued"], now.to_rfc3339());
    }
}
