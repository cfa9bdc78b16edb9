mod filter;

pub use filter::{Filter, DEFAULT_BATCH_SIZE};

use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;

use crate::error::Error;

const RETAIL_PRICES_URL: &str = "https://prices.azure.com/api/retail/prices";
const API_VERSION: &str = "2023-01-01-preview";
const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_MS: u64 = 500;

/// One raw pricing record from the retail catalog. Field names mirror the
/// catalog's own camelCase JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub meter_id: String,
    pub meter_name: String,
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
    pub sku_name: String,
    #[serde(default)]
    pub service_family: String,
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub arm_region_name: String,
    pub unit_of_measure: String,
    pub retail_price: f64,
    #[serde(default)]
    pub tier_minimum_units: Option<f64>,
}

/// The catalog encodes "no tiering" both as an absent tierMinimumUnits and
/// as an explicit 0. Collapse both to `None` so tier comparisons and the
/// min-tier fold see one representation.
pub fn normalize_tier(tier: Option<f64>) -> Option<f64> {
    tier.filter(|t| *t != 0.0)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CatalogPage {
    items: Vec<CatalogItem>,
    #[serde(default)]
    next_page_link: Option<String>,
}

/// Read access to the pricing catalog. The pipeline only ever consumes this
/// trait, so tests run against an in-memory catalog.
pub trait Catalog: Sync {
    fn query(&self, filter: &Filter) -> Result<Vec<CatalogItem>, Error>;
}

/// HTTP client for the public Azure Retail Prices endpoint. Splits
/// membership clauses into request-sized batches, follows result pagination,
/// and retries transient failures with exponential backoff.
pub struct RetailCatalog {
    batch_size: usize,
}

impl RetailCatalog {
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size }
    }
}

impl Catalog for RetailCatalog {
    fn query(&self, filter: &Filter) -> Result<Vec<CatalogItem>, Error> {
        let mut items = Vec::new();
        for odata in filter.batches(self.batch_size) {
            items.extend(fetch_batch(&odata)?);
        }
        Ok(items)
    }
}

fn fetch_batch(odata: &str) -> Result<Vec<CatalogItem>, Error> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match fetch_all_pages(odata) {
            Ok(items) => return Ok(items),
            Err(e) if attempt < MAX_ATTEMPTS => {
                eprintln!("Warning: catalog request failed ({e}), retrying...");
                std::thread::sleep(Duration::from_millis(RETRY_BASE_MS << (attempt - 1)));
            }
            Err(e) => {
                return Err(Error::CatalogQuery(format!("$filter [{odata}]: {e:#}")));
            }
        }
    }
}

fn fetch_all_pages(odata: &str) -> anyhow::Result<Vec<CatalogItem>> {
    let body = ureq::get(RETAIL_PRICES_URL)
        .query("api-version", API_VERSION)
        .query("$filter", odata)
        .call()?
        .body_mut()
        .read_to_string()?;
    let mut page = parse_page(&body)?;

    let mut items = Vec::new();
    loop {
        items.append(&mut page.items);
        // NextPageLink is a complete URL carrying the continuation token
        let Some(next) = page.next_page_link.take().filter(|l| !l.is_empty()) else {
            break;
        };
        let body = ureq::get(&next).call()?.body_mut().read_to_string()?;
        page = parse_page(&body)?;
    }
    Ok(items)
}

fn parse_page(body: &str) -> anyhow::Result<CatalogPage> {
    if body.trim().is_empty() {
        bail!("catalog returned an empty response body");
    }
    serde_json::from_str(body).context("catalog returned no structured result")
}
