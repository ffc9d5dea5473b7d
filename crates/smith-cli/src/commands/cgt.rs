//! Compute CGT events from a trade ledger CSV

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use smith_core::{AssetKind, CgtEvent, LotTracker};

/// One row of a trade ledger CSV
#[derive(Debug, Deserialize)]
pub(crate) struct TradeRecord {
    /// "buy" or "sell"
    pub action: String,
    #[serde(default)]
    pub kind: Option<String>,
    pub asset: String,
    pub quantity: f64,
    pub date: NaiveDate,
    pub unit_price: f64,
    #[serde(default)]
    pub fees: f64,
}

pub fn cmd_cgt(file: &Path, asset_filter: Option<&str>) -> Result<()> {
    let mut reader = csv::Reader::from_path(file)
        .with_context(|| format!("Failed to open trade ledger {}", file.display()))?;

    let mut tracker = LotTracker::new();
    let mut events: Vec<CgtEvent> = Vec::new();

    for record in reader.deserialize() {
        let record: TradeRecord = record.context("Invalid trade row")?;
        if let Some(filter) = asset_filter {
            if !record.asset.trim().eq_ignore_ascii_case(filter) {
                continue;
            }
        }

        match record.action.to_lowercase().as_str() {
            "buy" | "purchase" => {
                let kind = record
                    .kind
                    .as_deref()
                    .map(|s| s.parse::<AssetKind>())
                    .transpose()
                    .map_err(|e| anyhow!(e))?
                    .unwrap_or_default();
                tracker.track_purchase(
                    kind,
                    &record.asset,
                    record.quantity,
                    record.date,
                    record.unit_price,
                    record.fees,
                )?;
            }
            "sell" | "sale" => {
                events.extend(tracker.track_sale(
                    &record.asset,
                    record.quantity,
                    record.date,
                    record.unit_price,
                    record.fees,
                )?);
            }
            other => bail!("Unknown trade action: {}", other),
        }
    }

    if events.is_empty() {
        println!("No disposals in the ledger; nothing to report.");
        return Ok(());
    }

    println!(
        "{:<8} {:>10} {:>12} {:>12} {:>12} {:>9} {:>9}",
        "asset", "qty", "cost base", "proceeds", "gain", "held", "discount"
    );
    for event in &events {
        println!(
            "{:<8} {:>10.4} {:>12.2} {:>12.2} {:>12.2} {:>8}d {:>9}",
            event.asset,
            event.quantity,
            event.cost_base,
            event.proceeds,
            event.gain,
            event.holding_days,
            if event.discount_eligible { "yes" } else { "no" }
        );
    }

    let gains: f64 = events.iter().filter(|e| e.gain > 0.0).map(|e| e.gain).sum();
    let losses: f64 = events.iter().filter(|e| e.gain < 0.0).map(|e| e.gain).sum();
    let discountable: f64 = events
        .iter()
        .filter(|e| e.discount_eligible && e.gain > 0.0)
        .map(|e| e.gain)
        .sum();

    println!();
    println!("Gross capital gains:      {:>12.2}", gains);
    println!("Capital losses:           {:>12.2}", losses);
    println!("Discount-eligible gains:  {:>12.2}", discountable);
    println!("Net (before discount):    {:>12.2}", gains + losses);

    Ok(())
}
