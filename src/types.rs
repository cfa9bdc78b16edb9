use serde::Serialize;

/// Canonical identity of a billable meter in its origin region, as resolved
/// from the retail catalog. Immutable after resolution.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterDescriptor {
    pub meter_id: String,
    pub meter_name: String,
    pub product_id: String,
    pub sku_name: String,
    pub arm_region_name: String,
    /// Lowest tier threshold observed for this meter. `None` means no
    /// tiering, which wins over any tiered row — comparing prices across
    /// different bulk-discount brackets would be meaningless.
    pub tier_minimum_units: Option<f64>,
    pub unit_of_measure: String,
}

/// One meter's price as observed in one candidate region.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedPriceRow {
    pub orig_meter_id: String,
    /// True exactly when this row's region equals the descriptor's origin
    /// region. At most one such row per meter survives the integrity check.
    pub is_origin_region: bool,
    pub meter_id: String,
    pub service_family: String,
    pub service_name: String,
    pub meter_name: String,
    pub product_id: String,
    pub product_name: String,
    pub sku_name: String,
    pub unit_of_measure: String,
    pub retail_price: f64,
    pub region: String,
}

/// A candidate row excluded because its billing unit differs from the origin
/// meter's. Surfaced to the operator verbatim, never priced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitOfMeasureMismatch {
    pub orig_meter_id: String,
    pub origin_unit: String,
    pub target_meter_id: String,
    pub target_unit: String,
}

/// A matched row enriched with its difference to the origin-region price.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedComparison {
    #[serde(flatten)]
    pub row: MatchedPriceRow,
    /// retail_price − origin price, same currency.
    pub price_diff_to_origin: f64,
    /// (retail_price − origin price) / origin price, rounded to 2 decimals.
    /// `None` when the origin price is zero.
    pub percentage_diff_to_origin: Option<f64>,
}

/// Per-meter partition of target regions by price relative to the origin.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryEntry {
    pub orig_meter_id: String,
    pub meter_name: String,
    pub original_region: String,
    pub lower_priced: Vec<String>,
    pub same_priced: Vec<String>,
    pub higher_priced: Vec<String>,
}
