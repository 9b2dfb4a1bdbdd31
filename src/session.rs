// 🗂️ Session - the in-memory tip sheet a user works on
// Owns the partner list, the id counter and the cash drawer; runs calculations

use crate::allocation::{allocate, hourly_rate, Cents};
use crate::denomination::{distribute, BillCounts, CashInventory};
use crate::error::{Result, TipError};
use crate::extraction::PartnerCandidate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};
use uuid::Uuid;

pub const SHORTAGE_WARNING: &str = "Warning: Not enough bills to perfectly satisfy all partners. \
Some partners may receive less than their calculated amount.";

// ============================================================================
// PARTNER IDENTITY
// ============================================================================

/// Session-scoped partner id, rendered as `p1`, `p2`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartnerId(u64);

impl PartnerId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PartnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

impl FromStr for PartnerId {
    type Err = TipError;

    fn from_str(s: &str) -> Result<Self> {
        s.strip_prefix('p')
            .and_then(|n| n.parse::<u64>().ok())
            .map(PartnerId)
            .ok_or_else(|| TipError::invalid_input(format!("invalid partner id: {s}")))
    }
}

impl TryFrom<String> for PartnerId {
    type Error = TipError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PartnerId> for String {
    fn from(id: PartnerId) -> String {
        id.to_string()
    }
}

// ============================================================================
// PARTNER RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerRecord {
    pub id: PartnerId,
    pub partner_name: String,
    pub partner_number: String,
    pub tippable_hours: f64,
}

/// A user edit; `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerEdit {
    pub partner_name: Option<String>,
    pub partner_number: Option<String>,
    pub tippable_hours: Option<f64>,
}

fn check_hours(hours: f64) -> Result<f64> {
    if hours.is_finite() && hours >= 0.0 {
        Ok(hours)
    } else {
        Err(TipError::invalid_input(format!(
            "tippable hours must be a non-negative number, got {hours}"
        )))
    }
}

// ============================================================================
// CALCULATION REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerPayout {
    #[serde(flatten)]
    pub partner: PartnerRecord,
    pub tip_amount: Cents,
    pub bills: BillCounts,
    pub remaining: Cents,
    pub shortage: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationReport {
    pub session_id: Uuid,
    pub total_tips: Cents,
    pub total_hours: f64,
    pub hourly_rate: f64,
    pub payouts: Vec<PartnerPayout>,
    pub insufficient_bills: bool,
    pub distributed_total: Cents,
    pub bills_used: BillCounts,
    pub leftover: CashInventory,
}

impl CalculationReport {
    pub fn warning(&self) -> Option<&'static str> {
        self.insufficient_bills.then_some(SHORTAGE_WARNING)
    }
}

// ============================================================================
// SESSION
// ============================================================================

pub struct Session {
    id: Uuid,
    partners: Vec<PartnerRecord>,
    next_id: u64,
    inventory: CashInventory,
}

impl Session {
    pub fn new() -> Self {
        Session {
            id: Uuid::new_v4(),
            partners: Vec::new(),
            next_id: 1,
            inventory: CashInventory::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn partners(&self) -> &[PartnerRecord] {
        &self.partners
    }

    pub fn inventory(&self) -> CashInventory {
        self.inventory
    }

    pub fn set_inventory(&mut self, inventory: CashInventory) {
        self.inventory = inventory;
    }

    fn issue_id(&mut self) -> PartnerId {
        let id = PartnerId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn get(&self, id: PartnerId) -> Option<&PartnerRecord> {
        self.partners.iter().find(|p| p.id == id)
    }

    /// Replace the partner list with freshly extracted rows. Ids keep counting
    /// up from the previous load, they are never reused.
    pub fn load_extracted(&mut self, candidates: Vec<PartnerCandidate>) -> &[PartnerRecord] {
        let records: Vec<PartnerRecord> = candidates
            .into_iter()
            .map(|c| PartnerRecord {
                id: self.issue_id(),
                partner_name: c.partner_name,
                partner_number: c.partner_number,
                tippable_hours: if c.tippable_hours.is_finite() {
                    c.tippable_hours.max(0.0)
                } else {
                    0.0
                },
            })
            .collect();

        info!(session = %self.id, partners = records.len(), "loaded partners");
        self.partners = records;
        &self.partners
    }

    /// Append a blank row for manual entry.
    pub fn add_partner(&mut self) -> PartnerId {
        let id = self.issue_id();
        self.partners.push(PartnerRecord {
            id,
            partner_name: String::new(),
            partner_number: String::new(),
            tippable_hours: 0.0,
        });
        id
    }

    pub fn update_partner(&mut self, id: PartnerId, edit: PartnerEdit) -> Result<&PartnerRecord> {
        let hours = edit.tippable_hours.map(check_hours).transpose()?;

        let partner = self
            .partners
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| TipError::invalid_input(format!("unknown partner {id}")))?;

        if let Some(name) = edit.partner_name {
            partner.partner_name = name;
        }
        if let Some(number) = edit.partner_number {
            partner.partner_number = number;
        }
        if let Some(hours) = hours {
            partner.tippable_hours = hours;
        }

        Ok(partner)
    }

    pub fn remove_partner(&mut self, id: PartnerId) -> Result<PartnerRecord> {
        let position = self
            .partners
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| TipError::invalid_input(format!("unknown partner {id}")))?;
        Ok(self.partners.remove(position))
    }

    pub fn total_hours(&self) -> f64 {
        self.partners.iter().map(|p| p.tippable_hours).sum()
    }

    /// Allocate `total_tips` and break every share into bills from the
    /// session's drawer. The drawer itself is left as it is, so running the
    /// same calculation twice gives the same report.
    pub fn calculate(&self, total_tips: Cents) -> Result<CalculationReport> {
        let hours: Vec<(PartnerId, f64)> = self
            .partners
            .iter()
            .map(|p| (p.id, p.tippable_hours))
            .collect();

        let allocations = allocate(total_tips, &hours)?;
        let distribution = distribute(&allocations, &self.inventory);

        let payouts: Vec<PartnerPayout> = self
            .partners
            .iter()
            .zip(&distribution.payouts)
            .map(|(partner, payout)| PartnerPayout {
                partner: partner.clone(),
                tip_amount: payout.tip_amount,
                bills: payout.bills,
                remaining: payout.remaining,
                shortage: payout.shortage,
            })
            .collect();

        let total_hours = self.total_hours();
        let report = CalculationReport {
            session_id: self.id,
            total_tips,
            total_hours,
            hourly_rate: hourly_rate(total_tips, total_hours),
            insufficient_bills: distribution.insufficient_bills,
            distributed_total: distribution.distributed_total(),
            bills_used: distribution.bills_used(),
            leftover: distribution.leftover,
            payouts,
        };

        if report.insufficient_bills {
            warn!(session = %self.id, "drawer cannot cover every partner");
        }
        info!(
            session = %self.id,
            total_tips = %report.total_tips,
            distributed = %report.distributed_total,
            partners = report.payouts.len(),
            "calculated tips"
        );

        Ok(report)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
