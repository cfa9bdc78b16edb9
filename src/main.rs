mod catalog;
mod cli;
mod config;
mod delta;
mod error;
mod input;
mod integrity;
mod matcher;
mod output;
mod resolve;
mod summary;
mod types;

use std::io::Write;

use anyhow::Result;
use clap::Parser;

use catalog::RetailCatalog;
use cli::Cli;
use error::Error;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config();

    let regions: Vec<String> = if !cli.regions.is_empty() {
        cli.regions.clone()
    } else {
        config.target_regions.clone().unwrap_or_default()
    };
    if regions.is_empty() {
        return Err(Error::Configuration(
            "no target regions given (use --regions or target_regions in config.toml)".to_string(),
        )
        .into());
    }

    let meter_ids = input::read_meter_ids(&cli.input)?;
    eprintln!("Found {} distinct meter ids.", meter_ids.len());

    let batch_size = cli
        .batch_size
        .or(config.batch_size)
        .unwrap_or(catalog::DEFAULT_BATCH_SIZE);
    let retail = RetailCatalog::new(batch_size);

    let descriptors = resolve::resolve_meters(&retail, &meter_ids)?;
    eprintln!("Resolved {} meter descriptors.", descriptors.len());

    let show_progress = !cli.cli;
    let progress_cb = |current: usize, total: usize| {
        eprint!("\x1b[2K\rMatching regions... {current}/{total}");
        let _ = std::io::stderr().flush();
    };
    let (matched, uom_errors) = matcher::match_regions(
        &retail,
        &descriptors,
        &regions,
        if show_progress {
            Some(&progress_cb)
        } else {
            None
        },
    )?;
    if show_progress {
        eprint!("\x1b[2K\r");
        let _ = std::io::stderr().flush();
    }

    // Duplicate rows for a (meter, region) pair would corrupt the deltas
    // and summary downstream: dump the raw matches and stop before any
    // prices/pricemap output exists.
    if let Err(err) = integrity::check(&matched) {
        eprintln!("{err}");
        eprintln!("Full match table for manual inspection:");
        output::print_match_dump(&matched);
        return Err(err.into());
    }

    let prices = delta::compute_deltas(matched)?;
    let pricemap = summary::build_summary(&prices);

    let report = output::Report {
        inputs: &descriptors,
        prices: &prices,
        pricemap: &pricemap,
        uomerrors: &uom_errors,
    };

    match cli.format {
        cli::OutputFormat::Json => output::print_json(&report),
        cli::OutputFormat::Table => {
            output::print_inputs(&descriptors);
            output::print_prices(&prices);
            output::print_pricemap(&pricemap);
            if !uom_errors.is_empty() {
                eprintln!(
                    "Excluded {} candidate rows with mismatched units of measure:",
                    uom_errors.len()
                );
                output::print_uom_errors(&uom_errors);
            }
        }
    }

    if let Some(ref dir) = cli.out {
        output::write_report_files(dir, &report)?;
    }

    Ok(())
}
