use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use serde::Serialize;

use crate::types::{
    MatchedPriceRow, MeterDescriptor, PricedComparison, SummaryEntry, UnitOfMeasureMismatch,
};

/// The four logical tables handed to the report renderer. `uomerrors` is
/// omitted from serialized output when empty.
#[derive(Serialize)]
pub struct Report<'a> {
    pub inputs: &'a [MeterDescriptor],
    pub prices: &'a [PricedComparison],
    pub pricemap: &'a [SummaryEntry],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub uomerrors: &'a [UnitOfMeasureMismatch],
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(headers.iter().map(|h| Cell::new(h)));
    table
}

/// Retail prices carry up to six significant decimals (e.g. $0.000912/hour).
fn format_price(price: f64) -> String {
    format!("{price:.6}")
}

fn format_diff(diff: f64) -> String {
    format!("{diff:+.6}")
}

fn format_percentage(percentage: Option<f64>) -> String {
    match percentage {
        Some(p) => format!("{:+.0}%", p * 100.0),
        None => "N/A".to_string(),
    }
}

fn format_tier(tier: Option<f64>) -> String {
    match tier {
        Some(t) => format!("{t}"),
        None => "-".to_string(),
    }
}

pub fn print_inputs(descriptors: &[MeterDescriptor]) {
    let mut table = new_table(&[
        "Meter Id", "Meter", "Product Id", "SKU", "Region", "Tier", "Unit",
    ]);
    for d in descriptors {
        table.add_row([
            Cell::new(&d.meter_id),
            Cell::new(&d.meter_name),
            Cell::new(&d.product_id),
            Cell::new(&d.sku_name),
            Cell::new(&d.arm_region_name),
            Cell::new(format_tier(d.tier_minimum_units)),
            Cell::new(&d.unit_of_measure),
        ]);
    }
    println!("{table}");
}

pub fn print_prices(prices: &[PricedComparison]) {
    let mut table = new_table(&[
        "Meter Id", "Meter", "SKU", "Region", "Origin", "Unit", "Price", "Diff", "Diff %",
    ]);
    for p in prices {
        table.add_row([
            Cell::new(&p.row.orig_meter_id),
            Cell::new(&p.row.meter_name),
            Cell::new(&p.row.sku_name),
            Cell::new(&p.row.region),
            Cell::new(if p.row.is_origin_region { "yes" } else { "" }),
            Cell::new(&p.row.unit_of_measure),
            Cell::new(format_price(p.row.retail_price)),
            Cell::new(format_diff(p.price_diff_to_origin)),
            Cell::new(format_percentage(p.percentage_diff_to_origin)),
        ]);
    }
    println!("{table}");
}

pub fn print_pricemap(entries: &[SummaryEntry]) {
    let mut table = new_table(&[
        "Meter Id", "Meter", "Origin Region", "Cheaper", "Same", "Costlier",
    ]);
    for e in entries {
        table.add_row([
            Cell::new(&e.orig_meter_id),
            Cell::new(&e.meter_name),
            Cell::new(&e.original_region),
            Cell::new(e.lower_priced.join(", ")),
            Cell::new(e.same_priced.join(", ")),
            Cell::new(e.higher_priced.join(", ")),
        ]);
    }
    println!("{table}");
}

pub fn print_uom_errors(errors: &[UnitOfMeasureMismatch]) {
    let mut table = new_table(&["Meter Id", "Origin Unit", "Target Meter Id", "Target Unit"]);
    for e in errors {
        table.add_row([
            Cell::new(&e.orig_meter_id),
            Cell::new(&e.origin_unit),
            Cell::new(&e.target_meter_id),
            Cell::new(&e.target_unit),
        ]);
    }
    println!("{table}");
}

/// Raw match table, printed for manual inspection when the integrity check
/// trips. No reduction, no guessing.
pub fn print_match_dump(rows: &[MatchedPriceRow]) {
    let mut table = new_table(&[
        "Orig Meter Id",
        "Origin",
        "Meter Id",
        "Meter",
        "Product Id",
        "Product",
        "SKU",
        "Region",
        "Unit",
        "Price",
    ]);
    for r in rows {
        table.add_row([
            Cell::new(&r.orig_meter_id),
            Cell::new(if r.is_origin_region { "yes" } else { "" }),
            Cell::new(&r.meter_id),
            Cell::new(&r.meter_name),
            Cell::new(&r.product_id),
            Cell::new(&r.product_name),
            Cell::new(&r.sku_name),
            Cell::new(&r.region),
            Cell::new(&r.unit_of_measure),
            Cell::new(format_price(r.retail_price)),
        ]);
    }
    eprintln!("{table}");
}

pub fn print_json(report: &Report) {
    println!(
        "{}",
        serde_json::to_string_pretty(report).expect("JSON serialization failed")
    );
}

/// Write each report table as `<name>-<timestamp>.json` under `dir`.
/// `uomerrors` is only written when there is something to report.
pub fn write_report_files(dir: &Path, report: &Report) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("cannot create output directory {}", dir.display()))?;
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");

    write_table(dir, &format!("inputs-{stamp}.json"), report.inputs)?;
    write_table(dir, &format!("prices-{stamp}.json"), report.prices)?;
    write_table(dir, &format!("pricemap-{stamp}.json"), report.pricemap)?;
    if !report.uomerrors.is_empty() {
        write_table(dir, &format!("uomerrors-{stamp}.json"), report.uomerrors)?;
    }
    Ok(())
}

fn write_table<T: Serialize>(dir: &Path, name: &str, rows: &[T]) -> Result<()> {
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(rows)?;
    fs::write(&path, json).with_context(|| format!("cannot write {}", path.display()))?;
    eprintln!("Wrote {}", path.display());
    Ok(())
}
