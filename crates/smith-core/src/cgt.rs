//! FIFO capital gains tracker
//!
//! Purchases create lots; sales consume them oldest-first and emit one
//! [`CgtEvent`] per matched lot-portion, so a sale spanning lots with mixed
//! holding periods yields per-portion discount eligibility instead of a
//! blended flag. Exhausted lots are retained with zero remaining quantity
//! for audit.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Assets held longer than this many days qualify for the CGT discount.
/// The boundary is strict: exactly 365 days is not eligible.
pub const DISCOUNT_HOLDING_DAYS: i64 = 365;

/// Tolerance for quantity comparisons on fractional holdings
const QTY_EPSILON: f64 = 1e-9;

/// Broad asset class of a tracked holding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    #[default]
    Shares,
    Crypto,
    Other,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shares => "shares",
            Self::Crypto => "crypto",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shares" | "stock" | "etf" => Ok(Self::Shares),
            "crypto" | "cryptocurrency" => Ok(Self::Crypto),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown asset kind: {}", s)),
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One discrete purchase of an asset
///
/// Lots are never merged, even for identical date/price, so each purchase
/// stays traceable through later disposals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetLot {
    pub kind: AssetKind,
    pub asset: String,
    /// Quantity originally acquired
    pub quantity: f64,
    /// Quantity not yet consumed by sales
    pub remaining: f64,
    pub acquired: NaiveDate,
    pub unit_cost: f64,
    /// Acquisition fees for the whole lot
    pub fees: f64,
}

impl AssetLot {
    pub fn is_exhausted(&self) -> bool {
        self.remaining <= QTY_EPSILON
    }
}

/// A capital gain or loss on one lot-portion of a sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CgtEvent {
    pub asset: String,
    pub sale_date: NaiveDate,
    /// Acquisition date of the lot this portion came from
    pub acquired: NaiveDate,
    /// Quantity taken from that lot
    pub quantity: f64,
    /// Portion cost: quantity x unit cost plus the portion's share of the
    /// lot's acquisition fees
    pub cost_base: f64,
    /// Portion share of the sale proceeds, net of sale fees
    pub proceeds: f64,
    /// Signed gain: proceeds minus cost base
    pub gain: f64,
    pub holding_days: i64,
    /// Pure function of the holding period; never overridden
    pub discount_eligible: bool,
}

/// FIFO lot queue per asset plus the emitted event history
#[derive(Debug, Default)]
pub struct LotTracker {
    lots: HashMap<String, Vec<AssetLot>>,
    history: Vec<CgtEvent>,
}

fn normalize_asset(asset: &str) -> String {
    asset.trim().to_uppercase()
}

fn validate_quantity(quantity: f64) -> Result<()> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(Error::InvalidQuantity(quantity));
    }
    Ok(())
}

impl LotTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a purchase as a new lot.
    ///
    /// Insertion is assumed chronological; when a purchase arrives out of
    /// order the queue is re-sorted by acquisition date so FIFO consumption
    /// stays correct. Returns a copy of the created lot.
    pub fn track_purchase(
        &mut self,
        kind: AssetKind,
        asset: &str,
        quantity: f64,
        date: NaiveDate,
        unit_cost: f64,
        fees: f64,
    ) -> Result<AssetLot> {
        validate_quantity(quantity)?;

        let lot = AssetLot {
            kind,
            asset: normalize_asset(asset),
            quantity,
            remaining: quantity,
            acquired: date,
            unit_cost,
            fees,
        };

        let queue = self.lots.entry(lot.asset.clone()).or_default();
        let out_of_order = queue.last().is_some_and(|last| last.acquired > date);
        queue.push(lot.clone());
        if out_of_order {
            debug!(asset = %lot.asset, %date, "out-of-order purchase, re-sorting lot queue");
            queue.sort_by_key(|l| l.acquired);
        }

        Ok(lot)
    }

    /// Match a sale against the asset's lots, oldest first.
    ///
    /// Emits one event per consumed lot-portion. Fails with
    /// [`Error::InsufficientLots`] before any mutation when the total
    /// remaining quantity cannot cover the sale.
    pub fn track_sale(
        &mut self,
        asset: &str,
        quantity: f64,
        date: NaiveDate,
        unit_price: f64,
        fees: f64,
    ) -> Result<Vec<CgtEvent>> {
        validate_quantity(quantity)?;

        let key = normalize_asset(asset);
        let available = self
            .lots
            .get(&key)
            .map(|queue| queue.iter().map(|l| l.remaining).sum())
            .unwrap_or(0.0);
        if available + QTY_EPSILON < quantity {
            return Err(Error::InsufficientLots {
                asset: key,
                requested: quantity,
                available,
            });
        }

        // Net proceeds for the whole sale; each portion takes its share
        let net_proceeds = quantity * unit_price - fees;

        let queue = self.lots.get_mut(&key).expect("availability checked above");
        let mut events = Vec::new();
        let mut unmatched = quantity;

        for lot in queue.iter_mut() {
            if unmatched <= QTY_EPSILON {
                break;
            }
            if lot.is_exhausted() {
                continue;
            }

            let portion = lot.remaining.min(unmatched);
            lot.remaining -= portion;
            unmatched -= portion;

            let share = portion / quantity;
            let cost_base = portion * lot.unit_cost + lot.fees * (portion / lot.quantity);
            let proceeds = net_proceeds * share;
            let holding_days = (date - lot.acquired).num_days();

            events.push(CgtEvent {
                asset: key.clone(),
                sale_date: date,
                acquired: lot.acquired,
                quantity: portion,
                cost_base,
                proceeds,
                gain: proceeds - cost_base,
                holding_days,
                discount_eligible: holding_days > DISCOUNT_HOLDING_DAYS,
            });
        }

        self.history.extend(events.iter().cloned());
        Ok(events)
    }

    /// Total remaining quantity held for an asset
    pub fn holdings(&self, asset: &str) -> f64 {
        self.lots
            .get(&normalize_asset(asset))
            .map(|queue| queue.iter().map(|l| l.remaining).sum())
            .unwrap_or(0.0)
    }

    /// All lots for an asset, including exhausted ones
    pub fn lots(&self, asset: &str) -> &[AssetLot] {
        self.lots
            .get(&normalize_asset(asset))
            .map(|queue| queue.as_slice())
            .unwrap_or(&[])
    }

    /// Every event emitted by this tracker, in emission order
    pub fn history(&self) -> &[CgtEvent] {
        &self.history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn approx(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "expected {b}, got {a}");
    }

    #[test]
    fn test_single_lot_sale_with_discount() {
        // 100 BHP @ 45.50 bought 2023-01-01, sold 2024-06-01 @ 52.00,
        // $19.95 brokerage on each leg.
        let mut tracker = LotTracker::new();
        tracker
            .track_purchase(AssetKind::Shares, "BHP", 100.0, d(2023, 1, 1), 45.50, 19.95)
            .unwrap();

        let events = tracker
            .track_sale("BHP", 100.0, d(2024, 6, 1), 52.00, 19.95)
            .unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.holding_days, 517);
        assert!(event.discount_eligible);
        approx(event.cost_base, 4569.95);
        approx(event.proceeds, 5180.05);
        approx(event.gain, 610.10);
        approx(tracker.holdings("BHP"), 0.0);
    }

    #[test]
    fn test_multi_lot_sale_mixed_discount() {
        // 50 units on day 0, 50 more on day 400, sell 70 on day 410:
        // all of lot 1 (eligible) plus 20 of lot 2 (not eligible).
        let start = d(2022, 1, 1);
        let mut tracker = LotTracker::new();
        tracker
            .track_purchase(AssetKind::Crypto, "ETH", 50.0, start, 100.0, 0.0)
            .unwrap();
        tracker
            .track_purchase(
                AssetKind::Crypto,
                "ETH",
                50.0,
                start + chrono::Duration::days(400),
                150.0,
                0.0,
            )
            .unwrap();

        let events = tracker
            .track_sale("ETH", 70.0, start + chrono::Duration::days(410), 200.0, 0.0)
            .unwrap();
        assert_eq!(events.len(), 2);

        approx(events[0].quantity, 50.0);
        assert_eq!(events[0].holding_days, 410);
        assert!(events[0].discount_eligible);

        approx(events[1].quantity, 20.0);
        assert_eq!(events[1].holding_days, 10);
        assert!(!events[1].discount_eligible);

        // Matched portions sum exactly to the sale quantity
        approx(events.iter().map(|e| e.quantity).sum::<f64>(), 70.0);
        approx(tracker.holdings("ETH"), 30.0);
    }

    #[test]
    fn test_discount_boundary_is_strictly_greater() {
        let acquired = d(2022, 6, 15);
        for (days, eligible) in [(365i64, false), (366, true)] {
            let mut tracker = LotTracker::new();
            tracker
                .track_purchase(AssetKind::Shares, "VAS", 10.0, acquired, 90.0, 0.0)
                .unwrap();
            let events = tracker
                .track_sale("VAS", 10.0, acquired + chrono::Duration::days(days), 95.0, 0.0)
                .unwrap();
            assert_eq!(events[0].holding_days, days);
            assert_eq!(events[0].discount_eligible, eligible, "at {} days", days);
        }
    }

    #[test]
    fn test_insufficient_lots_rejected_without_mutation() {
        let mut tracker = LotTracker::new();
        tracker
            .track_purchase(AssetKind::Shares, "BHP", 60.0, d(2023, 1, 1), 45.0, 0.0)
            .unwrap();
        tracker
            .track_purchase(AssetKind::Shares, "BHP", 40.0, d(2023, 2, 1), 46.0, 0.0)
            .unwrap();

        let err = tracker
            .track_sale("BHP", 150.0, d(2024, 1, 1), 50.0, 0.0)
            .unwrap_err();
        match err {
            Error::InsufficientLots {
                asset,
                requested,
                available,
            } => {
                assert_eq!(asset, "BHP");
                approx(requested, 150.0);
                approx(available, 100.0);
            }
            other => panic!("expected InsufficientLots, got {other}"),
        }

        // Lot state untouched
        approx(tracker.holdings("BHP"), 100.0);
        assert!(tracker.lots("BHP").iter().all(|l| l.remaining == l.quantity));
        assert!(tracker.history().is_empty());
    }

    #[test]
    fn test_sale_of_unknown_asset_is_insufficient() {
        let mut tracker = LotTracker::new();
        let err = tracker
            .track_sale("FMG", 1.0, d(2024, 1, 1), 20.0, 0.0)
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientLots { available, .. } if available == 0.0));
    }

    #[test]
    fn test_invalid_quantities_rejected_before_mutation() {
        let mut tracker = LotTracker::new();
        for bad in [0.0, -5.0, f64::NAN] {
            assert!(matches!(
                tracker.track_purchase(AssetKind::Shares, "BHP", bad, d(2023, 1, 1), 45.0, 0.0),
                Err(Error::InvalidQuantity(_))
            ));
            assert!(matches!(
                tracker.track_sale("BHP", bad, d(2024, 1, 1), 50.0, 0.0),
                Err(Error::InvalidQuantity(_))
            ));
        }
        assert!(tracker.lots("BHP").is_empty());
    }

    #[test]
    fn test_exhausted_lot_retained_for_audit() {
        let mut tracker = LotTracker::new();
        tracker
            .track_purchase(AssetKind::Shares, "BHP", 50.0, d(2023, 1, 1), 45.0, 0.0)
            .unwrap();
        tracker
            .track_sale("BHP", 50.0, d(2023, 6, 1), 48.0, 0.0)
            .unwrap();

        let lots = tracker.lots("BHP");
        assert_eq!(lots.len(), 1);
        assert!(lots[0].is_exhausted());
        approx(lots[0].quantity, 50.0);
    }

    #[test]
    fn test_same_day_same_price_lots_not_merged() {
        let mut tracker = LotTracker::new();
        tracker
            .track_purchase(AssetKind::Shares, "BHP", 10.0, d(2023, 1, 1), 45.0, 5.0)
            .unwrap();
        tracker
            .track_purchase(AssetKind::Shares, "BHP", 10.0, d(2023, 1, 1), 45.0, 5.0)
            .unwrap();
        assert_eq!(tracker.lots("BHP").len(), 2);
    }

    #[test]
    fn test_out_of_order_purchase_resorts_queue() {
        let mut tracker = LotTracker::new();
        tracker
            .track_purchase(AssetKind::Shares, "BHP", 10.0, d(2023, 6, 1), 50.0, 0.0)
            .unwrap();
        // Backfilled earlier purchase
        tracker
            .track_purchase(AssetKind::Shares, "BHP", 10.0, d(2023, 1, 1), 40.0, 0.0)
            .unwrap();

        let events = tracker
            .track_sale("BHP", 10.0, d(2023, 12, 1), 55.0, 0.0)
            .unwrap();
        // The January lot must be consumed first despite arriving second
        assert_eq!(events[0].acquired, d(2023, 1, 1));
        approx(events[0].cost_base, 400.0);
    }

    #[test]
    fn test_fifo_conservation_across_history() {
        let mut tracker = LotTracker::new();
        let purchased = [30.0, 20.0, 50.0];
        for (i, qty) in purchased.iter().enumerate() {
            tracker
                .track_purchase(
                    AssetKind::Shares,
                    "WDS",
                    *qty,
                    d(2023, 1, 1) + chrono::Duration::days(i as i64 * 30),
                    30.0,
                    0.0,
                )
                .unwrap();
        }

        let mut sold = 0.0;
        for qty in [25.0, 40.0, 10.0] {
            tracker
                .track_sale("WDS", qty, d(2024, 1, 1), 35.0, 0.0)
                .unwrap();
            sold += qty;
            // remaining + sold == purchased, at every point
            approx(
                tracker.holdings("WDS") + sold,
                purchased.iter().sum::<f64>(),
            );
        }
        // No lot ever goes negative
        assert!(tracker.lots("WDS").iter().all(|l| l.remaining >= 0.0));
    }

    #[test]
    fn test_lot_fees_apportioned_by_consumed_share() {
        let mut tracker = LotTracker::new();
        // $20 of acquisition fees over 100 units; selling 25 carries $5
        tracker
            .track_purchase(AssetKind::Shares, "BHP", 100.0, d(2023, 1, 1), 40.0, 20.0)
            .unwrap();
        let events = tracker
            .track_sale("BHP", 25.0, d(2023, 3, 1), 44.0, 0.0)
            .unwrap();
        approx(events[0].cost_base, 25.0 * 40.0 + 5.0);
    }

    #[test]
    fn test_asset_symbols_are_normalized() {
        let mut tracker = LotTracker::new();
        tracker
            .track_purchase(AssetKind::Crypto, " btc ", 1.0, d(2023, 1, 1), 30_000.0, 0.0)
            .unwrap();
        approx(tracker.holdings("BTC"), 1.0);
        assert!(tracker
            .track_sale("Btc", 1.0, d(2023, 2, 1), 35_000.0, 10.0)
            .is_ok());
    }

    #[test]
    fn test_asset_kind_round_trip() {
        for kind in [AssetKind::Shares, AssetKind::Crypto, AssetKind::Other] {
            let parsed: AssetKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert_eq!("etf".parse::<AssetKind>().unwrap(), AssetKind::Shares);
        assert!("property".parse::<AssetKind>().is_err());
    }
}
