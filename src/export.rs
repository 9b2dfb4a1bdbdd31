// 📤 CSV Export - payout sheet out, partner sheet in
// Necessary-only quoting: fields with a comma, quote or newline are quoted, quotes doubled

use crate::error::Result;
use crate::extraction::{parse_hours, PartnerCandidate};
use crate::session::PartnerPayout;
use anyhow::Context;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::File;
use std::io;
use std::path::Path;

pub const EXPORT_HEADERS: [&str; 8] = [
    "Partner Name",
    "Partner Number",
    "Tippable Hours",
    "Tip Amount",
    "20s",
    "10s",
    "5s",
    "1s",
];

pub const SHEET_HEADERS: [&str; 3] = ["Partner Name", "Partner Number", "Tippable Hours"];

/// `barista-tips-2026-03-04.csv`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("barista-tips-{}.csv", date.format("%Y-%m-%d"))
}

fn csv_writer<W: io::Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer)
}

/// One decimal, ties away from zero: 7.25 → "7.3".
fn format_hours(hours: f64) -> String {
    let tenths = (hours * 10.0 + 0.5 + 1e-9).floor() / 10.0;
    format!("{:.1}", tenths)
}

/// Write the payout sheet: hours with 1 decimal, tip amount with 2.
pub fn write_payouts<W: io::Write>(writer: W, payouts: &[PartnerPayout]) -> Result<()> {
    let mut wtr = csv_writer(writer);
    wtr.write_record(EXPORT_HEADERS)?;

    for payout in payouts {
        wtr.write_record([
            payout.partner.partner_name.clone(),
            payout.partner.partner_number.clone(),
            format_hours(payout.partner.tippable_hours),
            payout.tip_amount.to_string(),
            payout.bills.twenties.to_string(),
            payout.bills.tens.to_string(),
            payout.bills.fives.to_string(),
            payout.bills.ones.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn payouts_to_string(payouts: &[PartnerPayout]) -> Result<String> {
    let mut buffer = Vec::new();
    write_payouts(&mut buffer, payouts)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

// ============================================================================
// PARTNER SHEET (name, number, hours)
// ============================================================================

#[derive(Debug, Deserialize)]
struct SheetRow {
    #[serde(rename = "Partner Name", default)]
    partner_name: String,

    #[serde(rename = "Partner Number", default)]
    partner_number: String,

    #[serde(rename = "Tippable Hours", default)]
    tippable_hours: String,
}

/// Read a partner sheet. Hours are parsed as leniently as OCR text.
pub fn read_partner_sheet<R: io::Read>(reader: R) -> Result<Vec<PartnerCandidate>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut partners = Vec::new();
    for result in rdr.deserialize() {
        let row: SheetRow = result?;
        partners.push(PartnerCandidate {
            partner_name: row.partner_name,
            partner_number: row.partner_number,
            tippable_hours: parse_hours(&row.tippable_hours),
        });
    }

    Ok(partners)
}

pub fn load_partner_sheet(path: &Path) -> anyhow::Result<Vec<PartnerCandidate>> {
    let file = File::open(path).with_context(|| format!("Failed to open partner sheet: {:?}", path))?;
    read_partner_sheet(file).with_context(|| format!("Failed to parse partner sheet: {:?}", path))
}

pub fn write_partner_sheet<W: io::Write>(writer: W, partners: &[PartnerCandidate]) -> Result<()> {
    let mut wtr = csv_writer(writer);
    wtr.write_record(SHEET_HEADERS)?;

    for partner in partners {
        wtr.write_record([
            partner.partner_name.as_str(),
            partner.partner_number.as_str(),
            format_hours(partner.tippable_hours).as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
