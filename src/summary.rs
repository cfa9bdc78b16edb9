use std::collections::BTreeMap;

use crate::types::{PricedComparison, SummaryEntry};

/// Partition each meter's target regions into cheaper / same / costlier
/// relative to the origin price. Region names are sorted ascending so the
/// summary is deterministic. A meter without an origin row is skipped, not
/// an error — the fatal checks upstream already cover the corrupt cases.
pub fn build_summary(comparisons: &[PricedComparison]) -> Vec<SummaryEntry> {
    let mut by_meter: BTreeMap<&str, Vec<&PricedComparison>> = BTreeMap::new();
    for comparison in comparisons {
        by_meter
            .entry(&comparison.row.orig_meter_id)
            .or_default()
            .push(comparison);
    }

    let mut entries = Vec::new();
    for (meter_id, rows) in &by_meter {
        let Some(origin) = rows.iter().find(|r| r.row.is_origin_region) else {
            continue;
        };
        let origin_price = origin.row.retail_price;

        let mut lower = Vec::new();
        let mut same = Vec::new();
        let mut higher = Vec::new();
        for comparison in rows.iter().filter(|r| !r.row.is_origin_region) {
            let region = comparison.row.region.clone();
            if comparison.row.retail_price < origin_price {
                lower.push(region);
            } else if comparison.row.retail_price > origin_price {
                higher.push(region);
            } else {
                same.push(region);
            }
        }
        lower.sort();
        same.sort();
        higher.sort();

        entries.push(SummaryEntry {
            orig_meter_id: meter_id.to_string(),
            meter_name: origin.row.meter_name.clone(),
            original_region: origin.row.region.clone(),
            lower_priced: lower,
            same_priced: same,
            higher_priced: higher,
        });
    }
    entries
}
