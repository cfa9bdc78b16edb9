use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::{normalize_tier, Catalog, CatalogItem, Filter};
use crate::error::Error;
use crate::types::MeterDescriptor;

/// Resolve every distinct input meter id to its canonical descriptor(s).
///
/// All ids go out as one membership filter; the catalog client batches it.
/// An id the catalog knows nothing about is fatal — matching cannot proceed
/// for an unresolved meter.
pub fn resolve_meters(
    catalog: &dyn Catalog,
    meter_ids: &BTreeSet<String>,
) -> Result<Vec<MeterDescriptor>, Error> {
    let filter = Filter::priced_consumption().any_of("meterId", meter_ids.iter().cloned());
    let rows = catalog.query(&filter)?;

    let mut by_id: BTreeMap<&str, Vec<&CatalogItem>> = meter_ids
        .iter()
        .map(|id| (id.as_str(), Vec::new()))
        .collect();
    for row in &rows {
        if let Some(bucket) = by_id.get_mut(row.meter_id.as_str()) {
            bucket.push(row);
        }
    }

    let mut descriptors = Vec::new();
    for (id, bucket) in &by_id {
        if bucket.is_empty() {
            return Err(Error::Resolution((*id).to_string()));
        }
        descriptors.extend(descriptors_from_rows(bucket));
    }
    Ok(descriptors)
}

/// Collapse the catalog rows for one input id into descriptors: one per
/// distinct (meter, product, SKU, region, unit) combination. A meter exposed
/// in several regions keeps one descriptor per region rather than being
/// discarded.
fn descriptors_from_rows(rows: &[&CatalogItem]) -> Vec<MeterDescriptor> {
    type Key<'a> = (&'a str, &'a str, &'a str, &'a str, &'a str);

    // Minimum tier per identity key, unit of measure excluded. A row with no
    // tiering pins the whole key to "untiered": anchoring to an arbitrary
    // bulk bracket when an untiered price exists would skew every delta.
    let mut tier_min: BTreeMap<Key<'_>, Option<f64>> = BTreeMap::new();
    for row in rows {
        let key = identity_key(row);
        let tier = normalize_tier(row.tier_minimum_units);
        tier_min
            .entry(key)
            .and_modify(|current| *current = merge_tier(*current, tier))
            .or_insert(tier);
    }

    let mut seen: BTreeSet<(Key<'_>, &str)> = BTreeSet::new();
    let mut descriptors = Vec::new();
    for row in rows {
        let key = identity_key(row);
        if !seen.insert((key, row.unit_of_measure.as_str())) {
            continue;
        }
        descriptors.push(MeterDescriptor {
            meter_id: row.meter_id.clone(),
            meter_name: row.meter_name.clone(),
            product_id: row.product_id.clone(),
            sku_name: row.sku_name.clone(),
            arm_region_name: row.arm_region_name.clone(),
            tier_minimum_units: tier_min[&key],
            unit_of_measure: row.unit_of_measure.clone(),
        });
    }
    descriptors
}

fn identity_key(row: &CatalogItem) -> (&str, &str, &str, &str, &str) {
    (
        &row.meter_id,
        &row.meter_name,
        &row.product_id,
        &row.sku_name,
        &row.arm_region_name,
    )
}

/// `None` means untiered and beats any tier; otherwise keep the lower one.
fn merge_tier(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (None, _) | (_, None) => None,
        (Some(x), Some(y)) => Some(x.min(y)),
    }
}
