/// Max values per OR-membership clause in a single catalog request. The
/// retail endpoint rejects oversized query strings, so membership sets are
/// chunked and the results merged client-side.
pub const DEFAULT_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone)]
enum Clause {
    /// Quoted string equality: `field eq 'value'`
    Eq(&'static str, String),
    /// Unquoted literal equality, for booleans: `field eq true`
    EqLiteral(&'static str, &'static str),
    /// OR-membership: `(field eq 'a' or field eq 'b')`
    AnyOf(&'static str, Vec<String>),
}

/// An OData `$filter` conjunction over retail catalog fields.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    /// The base predicate every pipeline query shares: currently-priced
    /// consumption meters in their primary region, priced in USD.
    pub fn priced_consumption() -> Self {
        Filter::default()
            .eq("currencyCode", "USD")
            .eq("type", "Consumption")
            .eq_literal("isPrimaryMeterRegion", "true")
    }

    pub fn eq(mut self, field: &'static str, value: impl Into<String>) -> Self {
        self.clauses.push(Clause::Eq(field, value.into()));
        self
    }

    fn eq_literal(mut self, field: &'static str, literal: &'static str) -> Self {
        self.clauses.push(Clause::EqLiteral(field, literal));
        self
    }

    pub fn any_of<I, S>(mut self, field: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.clauses
            .push(Clause::AnyOf(field, values.into_iter().map(Into::into).collect()));
        self
    }

    /// Render the filter into one or more `$filter` strings, splitting every
    /// membership clause into chunks of at most `batch_size` values. With
    /// multiple membership clauses this yields the cartesian product of
    /// chunks, so the merged responses cover the full filter.
    pub fn batches(&self, batch_size: usize) -> Vec<String> {
        let mut variants: Vec<Vec<String>> = vec![Vec::new()];

        for clause in &self.clauses {
            match clause {
                Clause::Eq(field, value) => {
                    let rendered = format!("{field} eq {}", quote(value));
                    for parts in &mut variants {
                        parts.push(rendered.clone());
                    }
                }
                Clause::EqLiteral(field, literal) => {
                    let rendered = format!("{field} eq {literal}");
                    for parts in &mut variants {
                        parts.push(rendered.clone());
                    }
                }
                Clause::AnyOf(field, values) => {
                    let chunks: Vec<String> = values
                        .chunks(batch_size.max(1))
                        .map(|chunk| render_membership(field, chunk))
                        .collect();
                    variants = variants
                        .iter()
                        .flat_map(|base| {
                            chunks.iter().map(move |chunk| {
                                let mut parts = base.clone();
                                parts.push(chunk.clone());
                                parts
                            })
                        })
                        .collect();
                }
            }
        }

        variants
            .into_iter()
            .map(|parts| parts.join(" and "))
            .collect()
    }

    /// Whether a catalog item satisfies this filter. Clauses over request
    /// fields the item does not carry (currencyCode, type,
    /// isPrimaryMeterRegion) are treated as satisfied.
    #[cfg(test)]
    pub(crate) fn matches(&self, item: &super::CatalogItem) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Eq(field, value) => {
                item_field(item, field).is_none_or(|actual| actual == value)
            }
            Clause::EqLiteral(..) => true,
            Clause::AnyOf(field, values) => item_field(item, field)
                .is_none_or(|actual| values.iter().any(|v| v == actual)),
        })
    }
}

#[cfg(test)]
fn item_field<'a>(item: &'a super::CatalogItem, field: &str) -> Option<&'a str> {
    match field {
        "meterId" => Some(&item.meter_id),
        "meterName" => Some(&item.meter_name),
        "productId" => Some(&item.product_id),
        "skuName" => Some(&item.sku_name),
        "armRegionName" => Some(&item.arm_region_name),
        _ => None,
    }
}

fn render_membership(field: &str, values: &[String]) -> String {
    if values.len() == 1 {
        return format!("{field} eq {}", quote(&values[0]));
    }
    let terms: Vec<String> = values
        .iter()
        .map(|v| format!("{field} eq {}", quote(v)))
        .collect();
    format!("({})", terms.join(" or "))
}

/// OData string literal: single quotes double as their own escape.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_conjunction_in_clause_order() {
        let filter = Filter::priced_consumption().eq("meterName", "D2 v3");
        let batches = filter.batches(DEFAULT_BATCH_SIZE);
        assert_eq!(
            batches,
            vec![
                "currencyCode eq 'USD' and type eq 'Consumption' and \
                 isPrimaryMeterRegion eq true and meterName eq 'D2 v3'"
            ]
        );
    }

    #[test]
    fn escapes_single_quotes() {
        let filter = Filter::default().eq("skuName", "O'Brien");
        assert_eq!(filter.batches(10), vec!["skuName eq 'O''Brien'"]);
    }

    #[test]
    fn single_value_membership_has_no_parens() {
        let filter = Filter::default().any_of("armRegionName", ["eastus"]);
        assert_eq!(filter.batches(10), vec!["armRegionName eq 'eastus'"]);
    }

    #[test]
    fn membership_renders_or_group() {
        let filter = Filter::default().any_of("armRegionName", ["eastus", "westeurope"]);
        assert_eq!(
            filter.batches(10),
            vec!["(armRegionName eq 'eastus' or armRegionName eq 'westeurope')"]
        );
    }

    #[test]
    fn oversized_membership_splits_into_batches() {
        let ids: Vec<String> = (0..25).map(|i| format!("id-{i:02}")).collect();
        let filter = Filter::default().any_of("meterId", ids);
        let batches = filter.batches(10);
        assert_eq!(batches.len(), 3);
        assert!(batches[0].contains("id-00"));
        assert!(batches[0].contains("id-09"));
        assert!(!batches[0].contains("id-10"));
        assert!(batches[2].contains("id-24"));
    }

    #[test]
    fn two_membership_clauses_yield_cartesian_product() {
        let filter = Filter::default()
            .any_of("meterId", (0..15).map(|i| format!("m{i}")))
            .any_of("armRegionName", ["eastus", "westeurope"]);
        // 2 meter-id chunks x 1 region chunk
        assert_eq!(filter.batches(10).len(), 2);
    }

    #[test]
    fn empty_membership_yields_no_requests() {
        let filter = Filter::default().any_of("meterId", Vec::<String>::new());
        assert!(filter.batches(10).is_empty());
    }
}
