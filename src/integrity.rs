use std::collections::BTreeSet;

use crate::error::Error;
use crate::types::MatchedPriceRow;

/// Full identity of a surviving row. Price bits included: two rows for the
/// same (meter, region) pair that differ only in price are exactly the
/// anomaly this check exists to catch.
type RowIdentity<'a> = (
    &'a str,
    &'a str,
    &'a str,
    &'a str,
    &'a str,
    &'a str,
    &'a str,
    u64,
);

/// Guard the delta stage against ambiguous catalog data: every
/// (orig meter, region) pair must map to at most one distinct surviving row.
/// Two prices for the same pair would make the deltas for that meter
/// arbitrary — origin duplicates corrupt the anchor, target duplicates land
/// twice in the summary buckets — so the run stops and the caller dumps the
/// raw match table instead of guessing.
pub fn check(rows: &[MatchedPriceRow]) -> Result<(), Error> {
    let mut distinct_rows: BTreeSet<RowIdentity<'_>> = BTreeSet::new();
    let mut distinct_pairs: BTreeSet<(&str, &str)> = BTreeSet::new();
    for row in rows {
        distinct_rows.insert(identity(row));
        distinct_pairs.insert((&row.orig_meter_id, &row.region));
    }

    if distinct_rows.len() > distinct_pairs.len() {
        return Err(Error::AmbiguousMatch {
            rows: distinct_rows.len(),
            pairs: distinct_pairs.len(),
        });
    }
    Ok(())
}

fn identity(row: &MatchedPriceRow) -> RowIdentity<'_> {
    (
        &row.orig_meter_id,
        &row.region,
        &row.meter_id,
        &row.meter_name,
        &row.product_id,
        &row.sku_name,
        &row.unit_of_measure,
        row.retail_price.to_bits(),
    )
}
