use thiserror::Error;

/// Fatal pipeline failures. Every variant aborts the run with a non-zero
/// exit status; no partial `prices`/`pricemap` output is written past a
/// failed stage.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("catalog query failed: {0}")]
    CatalogQuery(String),

    #[error("meter id '{0}' not found in the retail catalog")]
    Resolution(String),

    /// The catalog produced more than one surviving row for at least one
    /// (meter, region) pair. The caller dumps the full match table before
    /// exiting; we never guess which row is authoritative.
    #[error(
        "ambiguous region match: {rows} distinct rows for {pairs} (meter, region) pairs"
    )]
    AmbiguousMatch { rows: usize, pairs: usize },

    #[error("no origin-region price found for meter '{0}'")]
    MissingOriginPrice(String),
}
