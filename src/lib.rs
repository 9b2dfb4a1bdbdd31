// Tip Pool - Core Library
// Tip-sheet extraction from OCR tables, tip allocation and bill breakdown

pub mod allocation;
pub mod config;
pub mod denomination;
pub mod error;
pub mod export;
pub mod extraction;
pub mod mapping;
pub mod selection;
pub mod session;
pub mod table;

#[cfg(feature = "server")]
pub mod http;
#[cfg(feature = "server")]
pub mod ocr;

// Re-export commonly used types
pub use allocation::{allocate, hourly_rate, Allocation, Cents};
pub use config::{Credentials, OcrSettings, ServerSettings, Settings};
pub use denomination::{distribute, Bill, BillCounts, CashInventory, Denomination, Distribution};
pub use error::{Result, TipError};
pub use export::{
    export_file_name, load_partner_sheet, payouts_to_string, read_partner_sheet, write_partner_sheet,
    write_payouts,
};
pub use extraction::{parse_hours, PartnerCandidate, RecordExtractor};
pub use mapping::{ColumnMapper, ColumnMapping, Field};
pub use selection::{ScoredTable, ScoringRule, TableSelector, TextScope};
pub use session::{CalculationReport, PartnerEdit, PartnerId, PartnerPayout, PartnerRecord, Session};
pub use table::{Cell, CellKind, Table, TableGrid};

#[cfg(feature = "server")]
pub use ocr::{AnalyzeResult, AzureLayoutClient, DocumentAnalyzer, PollPolicy};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the tracing subscriber used by both binaries (`RUST_LOG`, default `info`).
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
