use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::env;
use std::fs;
use std::io;
use std::path::Path;
use tracing::info;

use tip_pool::{
    init_tracing, load_partner_sheet, write_partner_sheet, write_payouts, CashInventory, Cents,
    RecordExtractor, Session, Table,
};

const USAGE: &str = "usage:
  tip-pool extract <analyze-result.json>
  tip-pool calculate <partners.csv> <total-tips> [twenties tens fives ones]";

fn main() -> Result<()> {
    init_tracing();
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("extract") if args.len() == 3 => run_extract(Path::new(&args[2])),
        Some("calculate") if args.len() >= 4 => run_calculate(&args[2..]),
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }
}

/// Saved OCR output → partner sheet CSV on stdout
fn run_extract(path: &Path) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read OCR result: {:?}", path))?;
    let json: Value = serde_json::from_str(&content).context("Failed to parse OCR result JSON")?;

    // Accept either the whole poll response or just its analyzeResult
    let result = json.get("analyzeResult").unwrap_or(&json);
    let tables: Vec<Table> = match result.get("tables") {
        Some(tables) => serde_json::from_value(tables.clone()).context("Malformed tables in OCR result")?,
        None => Vec::new(),
    };

    let partners = RecordExtractor::new().extract(&tables);
    info!(tables = tables.len(), partners = partners.len(), "extraction finished");
    if partners.is_empty() {
        eprintln!("No partner data found. You can add partners manually.");
    }

    write_partner_sheet(io::stdout().lock(), &partners)?;
    Ok(())
}

/// Partner sheet + drawer → payout CSV on stdout, summary on stderr
fn run_calculate(args: &[String]) -> Result<()> {
    let partners = load_partner_sheet(Path::new(&args[0]))?;

    let total_tips: f64 = args[1]
        .trim_start_matches('$')
        .parse()
        .with_context(|| format!("Invalid total tips: {}", args[1]))?;
    if !total_tips.is_finite() {
        bail!("Invalid total tips: {}", args[1]);
    }

    let counts = args[2..]
        .iter()
        .map(|a| a.parse::<u32>().with_context(|| format!("Invalid bill count: {}", a)))
        .collect::<Result<Vec<u32>>>()?;
    let inventory = match counts.as_slice() {
        [] => CashInventory::default(),
        [twenties, tens, fives, ones] => CashInventory::new(*twenties, *tens, *fives, *ones),
        _ => bail!("expected four bill counts (twenties tens fives ones)\n{USAGE}"),
    };

    let mut session = Session::new();
    session.load_extracted(partners);
    session.set_inventory(inventory);

    let report = session.calculate(Cents::from_dollars(total_tips))?;
    write_payouts(io::stdout().lock(), &report.payouts)?;

    eprintln!("Total hours:  {:.2}", report.total_hours);
    eprintln!("Hourly rate:  ${:.2}", report.hourly_rate);
    eprintln!("Distributed:  ${}", report.distributed_total);
    let used = report.bills_used;
    eprintln!(
        "Bills needed: {} × $20, {} × $10, {} × $5, {} × $1",
        used.twenties, used.tens, used.fives, used.ones
    );
    if let Some(warning) = report.warning() {
        eprintln!("{warning}");
    }

    Ok(())
}
