//! Time-windowed offer pricing.
//!
//! Whether an offer is active depends on the wall clock, so callers pass
//! `now` explicitly and re-resolve on every render tick. The resolver has
//! no state and never reads the clock itself.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Pricing fields carried by a variant or, as a fallback, by its product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSource {
    /// Baseline unit price.
    pub selling_price: Money,
    /// Promotional unit price.
    #[serde(default)]
    pub offer_price: Option<Money>,
    /// Offer window start. Absent means "since the epoch".
    #[serde(default)]
    pub discount_start_date: Option<DateTime<Utc>>,
    /// Offer window end. Absent means the offer never expires.
    #[serde(default)]
    pub discount_end_date: Option<DateTime<Utc>>,
}

impl PriceSource {
    /// A plain price with no offer.
    pub fn fixed(selling_price: Money) -> Self {
        Self {
            selling_price,
            offer_price: None,
            discount_start_date: None,
            discount_end_date: None,
        }
    }

    /// Attach an offer price valid inside `[start, end]`.
    pub fn with_offer(
        mut self,
        offer_price: Money,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        self.offer_price = Some(offer_price);
        self.discount_start_date = start;
        self.discount_end_date = end;
        self
    }

    fn window_contains(&self, now: DateTime<Utc>) -> bool {
        let started = self.discount_start_date.map_or(true, |start| now >= start);
        let not_ended = self.discount_end_date.map_or(true, |end| now <= end);
        started && not_ended
    }
}

/// Result of resolving a price at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPrice {
    /// Unit price the customer pays right now.
    pub effective_price: Money,
    /// Baseline price, shown struck-through when an offer is active.
    pub selling_price: Money,
    /// Whether the offer price applies at `now`.
    pub is_offer_active: bool,
    /// Rounded whole-percent saving; zero when inactive.
    pub discount_percent: u32,
    /// End of the active offer window, if bounded.
    pub offer_ends_at: Option<DateTime<Utc>>,
}

impl ResolvedPrice {
    /// Time left on an active, bounded offer, for countdown timers.
    pub fn offer_ends_in(&self, now: DateTime<Utc>) -> Option<Duration> {
        if !self.is_offer_active {
            return None;
        }
        self.offer_ends_at
            .map(|end| end - now)
            .filter(|left| *left >= Duration::zero())
    }
}

/// Resolve the effective unit price of `source` at `now`.
pub fn resolve_price(source: &PriceSource, now: DateTime<Utc>) -> ResolvedPrice {
    let selling = source.selling_price;

    let active_offer = source
        .offer_price
        .filter(|offer| offer.currency == selling.currency)
        .filter(|offer| offer.amount_minor < selling.amount_minor)
        .filter(|_| source.window_contains(now));

    match active_offer {
        Some(offer) => ResolvedPrice {
            effective_price: offer,
            selling_price: selling,
            is_offer_active: true,
            discount_percent: discount_percent(&selling, &offer),
            offer_ends_at: source.discount_end_date,
        },
        None => ResolvedPrice {
            effective_price: selling,
            selling_price: selling,
            is_offer_active: false,
            discount_percent: 0,
            offer_ends_at: None,
        },
    }
}

fn discount_percent(selling: &Money, offer: &Money) -> u32 {
    if selling.amount_minor <= 0 {
        return 0;
    }
    let saved = (selling.amount_minor - offer.amount_minor) as f64;
    let percent = (saved / selling.amount_minor as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;
    use chrono::TimeZone;

    fn taka(amount: i64) -> Money {
        Money::from_major(amount, Currency::BDT)
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap()
    }

    fn windowed() -> PriceSource {
        PriceSource::fixed(taka(1000)).with_offer(taka(750), Some(at(10)), Some(at(20)))
    }

    #[test]
    fn test_no_offer_uses_selling_price() {
        let resolved = resolve_price(&PriceSource::fixed(taka(500)), at(1));
        assert_eq!(resolved.effective_price, taka(500));
        assert!(!resolved.is_offer_active);
        assert_eq!(resolved.discount_percent, 0);
    }

    #[test]
    fn test_offer_active_inside_window() {
        let resolved = resolve_price(&windowed(), at(15));
        assert!(resolved.is_offer_active);
        assert_eq!(resolved.effective_price, taka(750));
        assert_eq!(resolved.discount_percent, 25);
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        assert!(resolve_price(&windowed(), at(10)).is_offer_active);
        assert!(resolve_price(&windowed(), at(20)).is_offer_active);
    }

    #[test]
    fn test_offer_inactive_outside_window() {
        let before = resolve_price(&windowed(), at(9));
        let after = resolve_price(&windowed(), at(21));

        assert!(!before.is_offer_active);
        assert!(!after.is_offer_active);
        assert_eq!(before.effective_price, taka(1000));
        assert_eq!(after.discount_percent, 0);
    }

    #[test]
    fn test_missing_dates_are_unbounded() {
        let source = PriceSource::fixed(taka(1000)).with_offer(taka(900), None, None);
        assert!(resolve_price(&source, at(1)).is_offer_active);

        let endless = PriceSource::fixed(taka(1000)).with_offer(taka(900), Some(at(5)), None);
        assert!(!resolve_price(&endless, at(4)).is_offer_active);
        assert!(resolve_price(&endless, at(28)).is_offer_active);
    }

    #[test]
    fn test_offer_not_cheaper_is_ignored() {
        let source = PriceSource::fixed(taka(1000)).with_offer(taka(1000), None, None);
        let resolved = resolve_price(&source, at(1));
        assert!(!resolved.is_offer_active);
        assert_eq!(resolved.effective_price, taka(1000));
    }

    #[test]
    fn test_discount_percent_rounds() {
        // 1 - 2/3 = 33.33..%
        let source = PriceSource::fixed(taka(300)).with_offer(taka(200), None, None);
        assert_eq!(resolve_price(&source, at(1)).discount_percent, 33);

        let source = PriceSource::fixed(taka(200)).with_offer(taka(133), None, None);
        assert_eq!(resolve_price(&source, at(1)).discount_percent, 34);
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let source = windowed();
        assert_eq!(resolve_price(&source, at(12)), resolve_price(&source, at(12)));
    }

    #[test]
    fn test_countdown() {
        let resolved = resolve_price(&windowed(), at(15));
        assert_eq!(resolved.offer_ends_in(at(15)), Some(Duration::days(5)));

        let endless = PriceSource::fixed(taka(1000)).with_offer(taka(900), None, None);
        assert_eq!(resolve_price(&endless, at(15)).offer_ends_in(at(15)), None);
    }
}
