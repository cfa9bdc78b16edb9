use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::catalog::{normalize_tier, Catalog, Filter};
use crate::error::Error;
use crate::types::{MatchedPriceRow, MeterDescriptor, UnitOfMeasureMismatch};

/// Match every descriptor against the target regions plus its own origin
/// region. One catalog round trip per descriptor dominates wall-clock time,
/// so descriptors run on the rayon pool; the progress callback is keyed by
/// descriptors completed.
pub fn match_regions(
    catalog: &dyn Catalog,
    descriptors: &[MeterDescriptor],
    target_regions: &[String],
    progress: Option<&(dyn Fn(usize, usize) + Sync)>,
) -> Result<(Vec<MatchedPriceRow>, Vec<UnitOfMeasureMismatch>), Error> {
    let total = descriptors.len();
    let done = AtomicUsize::new(0);

    let per_descriptor: Vec<_> = descriptors
        .par_iter()
        .map(|descriptor| {
            let result = match_one(catalog, descriptor, target_regions);
            let completed = done.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(cb) = progress {
                cb(completed, total);
            }
            result
        })
        .collect();

    let mut rows = Vec::new();
    let mut mismatches = Vec::new();
    for result in per_descriptor {
        let (r, m) = result?;
        rows.extend(r);
        mismatches.extend(m);
    }
    Ok((rows, mismatches))
}

fn match_one(
    catalog: &dyn Catalog,
    descriptor: &MeterDescriptor,
    target_regions: &[String],
) -> Result<(Vec<MatchedPriceRow>, Vec<UnitOfMeasureMismatch>), Error> {
    // The origin region is queried fresh alongside the targets rather than
    // reusing the descriptor's resolution-time price: it anchors every delta.
    let mut regions: BTreeSet<String> = target_regions.iter().cloned().collect();
    regions.insert(descriptor.arm_region_name.clone());

    let filter = Filter::priced_consumption()
        .eq("meterName", descriptor.meter_name.clone())
        .eq("productId", descriptor.product_id.clone())
        .eq("skuName", descriptor.sku_name.clone())
        .any_of("armRegionName", regions);
    let candidates = catalog.query(&filter)?;

    let anchor_tier = normalize_tier(descriptor.tier_minimum_units);

    let mut rows = Vec::new();
    let mut mismatches = Vec::new();
    for item in candidates {
        // Zero-priced rows are free/preview offers, not comparable prices.
        if item.retail_price <= 0.0 {
            continue;
        }
        // A row at a different bulk-discount bracket is not comparable.
        if normalize_tier(item.tier_minimum_units) != anchor_tier {
            continue;
        }
        if item.unit_of_measure != descriptor.unit_of_measure {
            mismatches.push(UnitOfMeasureMismatch {
                orig_meter_id: descriptor.meter_id.clone(),
                origin_unit: descriptor.unit_of_measure.clone(),
                target_meter_id: item.meter_id,
                target_unit: item.unit_of_measure,
            });
            continue;
        }
        rows.push(MatchedPriceRow {
            orig_meter_id: descriptor.meter_id.clone(),
            is_origin_region: item.arm_region_name == descriptor.arm_region_name,
            meter_id: item.meter_id,
            service_family: item.service_family,
            service_name: item.service_name,
            meter_name: item.meter_name,
            product_id: item.product_id,
            product_name: item.product_name,
            sku_name: item.sku_name,
            unit_of_measure: item.unit_of_measure,
            retail_price: item.retail_price,
            region: item.arm_region_name,
        });
    }
    Ok((rows, mismatches))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testutil::{item, StaticCatalog};

    fn descriptor(meter_id: &str, meter_name: &str, region: &str) -> MeterDescriptor {
        MeterDescriptor {
            meter_id: meter_id.to_string(),
            meter_name: meter_name.to_string(),
            product_id: "DZH318Z0BQPS".to_string(),
            sku_name: "D2 v3".to_string(),
            arm_region_name: region.to_string(),
            tier_minimum_units: None,
            unit_of_measure: "1 Hour".to_string(),
        }
    }

    fn regions(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn emits_one_row_per_region_and_flags_origin() {
        let catalog = StaticCatalog {
            items: vec![
                item("m1-eu", "D2 v3", "eastus", 0.096),
                item("m1-we", "D2 v3", "westeurope", 0.101),
                item("m1-jp", "D2 v3", "japaneast", 0.112),
            ],
        };
        let desc = descriptor("m1-eu", "D2 v3", "eastus");
        let (rows, mismatches) =
            match_regions(&catalog, &[desc], &regions(&["westeurope", "japaneast"]), None)
                .unwrap();

        assert!(mismatches.is_empty());
        assert_eq!(rows.len(), 3);
        for row in &rows {
            assert_eq!(row.orig_meter_id, "m1-eu");
            assert!(row.retail_price > 0.0);
            assert_eq!(row.is_origin_region, row.region == "eastus");
        }
        assert_eq!(
            rows.iter().filter(|r| r.is_origin_region).count(),
            1,
            "exactly one origin row"
        );
    }

    #[test]
    fn zero_priced_rows_are_dropped() {
        let catalog = StaticCatalog {
            items: vec![
                item("m1", "D2 v3", "eastus", 0.096),
                item("m1-free", "D2 v3", "westeurope", 0.0),
            ],
        };
        let desc = descriptor("m1", "D2 v3", "eastus");
        let (rows, _) = match_regions(&catalog, &[desc], &regions(&["westeurope"]), None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].region, "eastus");
    }

    #[test]
    fn rows_at_a_different_tier_are_dropped() {
        let mut bulk = item("m1-bulk", "D2 v3", "westeurope", 0.04);
        bulk.tier_minimum_units = Some(1000.0);
        let catalog = StaticCatalog {
            items: vec![item("m1", "D2 v3", "eastus", 0.096), bulk],
        };
        let desc = descriptor("m1", "D2 v3", "eastus");
        let (rows, _) = match_regions(&catalog, &[desc], &regions(&["westeurope"]), None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].region, "eastus");
    }

    #[test]
    fn mismatched_unit_is_reported_not_priced() {
        let mut odd_unit = item("m1-gb", "D2 v3", "westeurope", 0.05);
        odd_unit.unit_of_measure = "1 GB".to_string();
        let catalog = StaticCatalog {
            items: vec![item("m1", "D2 v3", "eastus", 0.096), odd_unit],
        };
        let desc = descriptor("m1", "D2 v3", "eastus");
        let (rows, mismatches) =
            match_regions(&catalog, &[desc], &regions(&["westeurope"]), None).unwrap();

        assert_eq!(rows.len(), 1);
        assert!(rows.iter().all(|r| r.region != "westeurope"));
        assert_eq!(mismatches.len(), 1);
        let mm = &mismatches[0];
        assert_eq!(mm.orig_meter_id, "m1");
        assert_eq!(mm.origin_unit, "1 Hour");
        assert_eq!(mm.target_meter_id, "m1-gb");
        assert_eq!(mm.target_unit, "1 GB");
    }

    #[test]
    fn region_without_an_offering_is_not_an_error() {
        let catalog = StaticCatalog {
            items: vec![item("m1", "D2 v3", "eastus", 0.096)],
        };
        let desc = descriptor("m1", "D2 v3", "eastus");
        let (rows, mismatches) =
            match_regions(&catalog, &[desc], &regions(&["brazilsouth"]), None).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(mismatches.is_empty());
    }

    #[test]
    fn matching_twice_yields_the_same_row_set() {
        let catalog = StaticCatalog {
            items: vec![
                item("m1-eu", "D2 v3", "eastus", 0.096),
                item("m1-we", "D2 v3", "westeurope", 0.101),
            ],
        };
        let descriptors = vec![descriptor("m1-eu", "D2 v3", "eastus")];
        let targets = regions(&["westeurope"]);

        let (first, _) = match_regions(&catalog, &descriptors, &targets, None).unwrap();
        let (second, _) = match_regions(&catalog, &descriptors, &targets, None).unwrap();

        let key = |r: &MatchedPriceRow| (r.meter_id.clone(), r.region.clone());
        let mut a: Vec<_> = first.iter().map(key).collect();
        let mut b: Vec<_> = second.iter().map(key).collect();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }
}
