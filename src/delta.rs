use std::collections::HashMap;

use crate::error::Error;
use crate::types::{MatchedPriceRow, PricedComparison};

/// Enrich every matched row with its difference to the origin-region price.
///
/// The origin price per meter is looked up through a map built once, never
/// by rescanning the row set. A meter whose origin row is missing (offering
/// discontinued in the origin region after resolution) is fatal — its deltas
/// would have no anchor.
pub fn compute_deltas(rows: Vec<MatchedPriceRow>) -> Result<Vec<PricedComparison>, Error> {
    let origin_prices: HashMap<String, f64> = rows
        .iter()
        .filter(|r| r.is_origin_region)
        .map(|r| (r.orig_meter_id.clone(), r.retail_price))
        .collect();

    rows.into_iter()
        .map(|row| {
            let origin = *origin_prices
                .get(&row.orig_meter_id)
                .ok_or_else(|| Error::MissingOriginPrice(row.orig_meter_id.clone()))?;
            let diff = row.retail_price - origin;
            let percentage = if origin == 0.0 {
                None
            } else {
                Some(round2(diff / origin))
            };
            Ok(PricedComparison {
                row,
                price_diff_to_origin: diff,
                percentage_diff_to_origin: percentage,
            })
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
