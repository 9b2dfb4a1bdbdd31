// 🧾 Denomination Distributor - turn each share into physical bills
// Greedy largest-first over a depleting drawer; earlier partners get first claim

use crate::allocation::{Allocation, Cents};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A partner is short when more than this much stays unpaid.
const SHORTAGE_THRESHOLD: Cents = Cents(50);

// ============================================================================
// BILLS & INVENTORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bill {
    Twenty,
    Ten,
    Five,
    One,
}

impl Bill {
    /// Fixed greedy order, largest first
    pub const ALL: [Bill; 4] = [Bill::Twenty, Bill::Ten, Bill::Five, Bill::One];

    pub fn dollars(self) -> i64 {
        match self {
            Bill::Twenty => 20,
            Bill::Ten => 10,
            Bill::Five => 5,
            Bill::One => 1,
        }
    }

    pub fn value(self) -> Cents {
        Cents::from_whole_dollars(self.dollars())
    }
}

/// Bill counts, used both for the cash drawer and for a single payout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillCounts {
    #[serde(default)]
    pub twenties: u32,
    #[serde(default)]
    pub tens: u32,
    #[serde(default)]
    pub fives: u32,
    #[serde(default)]
    pub ones: u32,
}

/// The cash drawer available for one calculation run.
pub type CashInventory = BillCounts;

impl BillCounts {
    pub fn new(twenties: u32, tens: u32, fives: u32, ones: u32) -> Self {
        BillCounts {
            twenties,
            tens,
            fives,
            ones,
        }
    }

    pub fn count(&self, bill: Bill) -> u32 {
        match bill {
            Bill::Twenty => self.twenties,
            Bill::Ten => self.tens,
            Bill::Five => self.fives,
            Bill::One => self.ones,
        }
    }

    fn count_mut(&mut self, bill: Bill) -> &mut u32 {
        match bill {
            Bill::Twenty => &mut self.twenties,
            Bill::Ten => &mut self.tens,
            Bill::Five => &mut self.fives,
            Bill::One => &mut self.ones,
        }
    }

    /// Face value of all bills
    pub fn total(&self) -> Cents {
        Bill::ALL
            .iter()
            .map(|&bill| Cents(bill.value().0 * i64::from(self.count(bill))))
            .sum()
    }

    pub fn bill_count(&self) -> u32 {
        Bill::ALL.iter().map(|&bill| self.count(bill)).sum()
    }

    pub fn add(&mut self, other: &BillCounts) {
        for bill in Bill::ALL {
            *self.count_mut(bill) += other.count(bill);
        }
    }
}

// ============================================================================
// DISTRIBUTION
// ============================================================================

/// Bills handed to one partner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Denomination<Id> {
    pub partner_id: Id,
    pub tip_amount: Cents,
    #[serde(flatten)]
    pub bills: BillCounts,
    /// Still owed after the drawer ran out (negative when ones rounding
    /// paid out slightly more than the share).
    pub remaining: Cents,
    pub shortage: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distribution<Id> {
    pub payouts: Vec<Denomination<Id>>,
    /// Set when any partner is short
    pub insufficient_bills: bool,
    /// What is left in the drawer afterwards
    pub leftover: CashInventory,
}

impl<Id> Distribution<Id> {
    /// Total bills handed out, per denomination
    pub fn bills_used(&self) -> BillCounts {
        let mut used = BillCounts::default();
        for payout in &self.payouts {
            used.add(&payout.bills);
        }
        used
    }

    pub fn distributed_total(&self) -> Cents {
        self.payouts.iter().map(|p| p.bills.total()).sum()
    }
}

/// Break each allocation into bills from `inventory`, in allocation order.
///
/// The caller's inventory is not touched; a working copy is depleted and
/// returned as `leftover`. Counts never go below zero. Shortages are
/// reported, not raised.
pub fn distribute<Id: Clone>(allocations: &[Allocation<Id>], inventory: &CashInventory) -> Distribution<Id> {
    let mut available = *inventory;
    let mut insufficient_bills = false;

    let payouts = allocations
        .iter()
        .map(|allocation| {
            let (bills, remaining) = take_bills(allocation.tip_amount, &mut available);
            let shortage = remaining > SHORTAGE_THRESHOLD;
            if shortage {
                insufficient_bills = true;
                warn!(short_by = %remaining, "not enough bills for partner");
            }
            Denomination {
                partner_id: allocation.partner_id.clone(),
                tip_amount: allocation.tip_amount,
                bills,
                remaining,
                shortage,
            }
        })
        .collect();

    Distribution {
        payouts,
        insufficient_bills,
        leftover: available,
    }
}

/// Greedy pass for one amount. Ones use a rounded, not floored, count so a
/// partial dollar of 50 cents or more becomes one more bill.
fn take_bills(amount: Cents, available: &mut CashInventory) -> (BillCounts, Cents) {
    let mut remaining = amount;
    let mut bills = BillCounts::default();

    for bill in Bill::ALL {
        let value = bill.value().0;
        let wanted = if remaining.0 <= 0 {
            0
        } else if bill == Bill::One {
            (remaining.0 + value / 2) / value
        } else {
            remaining.0 / value
        };

        let stock = available.count_mut(bill);
        let used = wanted.min(i64::from(*stock)) as u32;
        *stock -= used;
        *bills.count_mut(bill) = used;
        remaining = remaining - Cents(value * i64::from(used));
    }

    (bills, remaining)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn owed(amounts: &[f64]) -> Vec<Allocation<usize>> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, &dollars)| Allocation {
                partner_id: i,
                tip_amount: Cents::from_dollars(dollars),
            })
            .collect()
    }

    #[test]
    fn test_exact_change_from_every_denomination() {
        let inventory = CashInventory::new(1, 1, 1, 10);
        let result = distribute(&owed(&[37.0]), &inventory);
        let payout = &result.payouts[0];

        assert_eq!(payout.bills, BillCounts::new(1, 1, 1, 2));
        assert_eq!(payout.remaining, Cents::ZERO);
        assert!(!payout.shortage);
        assert!(!result.insufficient_bills);
        assert_eq!(result.leftover, CashInventory::new(0, 0, 0, 8));
    }

    #[test]
    fn test_only_ones_available_is_a_shortage() {
        let inventory = CashInventory::new(0, 0, 0, 5);
        let result = distribute(&owed(&[37.0]), &inventory);
        let payout = &result.payouts[0];

        assert_eq!(payout.bills, BillCounts::new(0, 0, 0, 5));
        assert_eq!(payout.remaining, Cents::from_dollars(32.0));
        assert!(payout.shortage);
        assert!(result.insufficient_bills);
    }

    #[test]
    fn test_smaller_bills_cover_missing_large_ones() {
        let inventory = CashInventory::new(0, 5, 0, 0);
        let result = distribute(&owed(&[40.0]), &inventory);

        assert_eq!(result.payouts[0].bills, BillCounts::new(0, 4, 0, 0));
        assert!(!result.insufficient_bills);
    }

    #[test]
    fn test_earlier_partners_get_first_claim() {
        let inventory = CashInventory::new(1, 0, 0, 0);
        let result = distribute(&owed(&[20.0, 20.0]), &inventory);

        assert_eq!(result.payouts[0].bills.twenties, 1);
        assert!(!result.payouts[0].shortage);
        assert_eq!(result.payouts[1].bills.twenties, 0);
        assert!(result.payouts[1].shortage);
        assert!(result.insufficient_bills);
    }

    #[test]
    fn test_partial_dollar_rounds_ones() {
        let inventory = CashInventory::new(0, 0, 0, 10);
        let result = distribute(&owed(&[3.60, 3.40]), &inventory);

        assert_eq!(result.payouts[0].bills.ones, 4);
        assert_eq!(result.payouts[0].remaining, Cents(-40));
        assert_eq!(result.payouts[1].bills.ones, 3);
        assert_eq!(result.payouts[1].remaining, Cents(40));
        assert!(!result.insufficient_bills);
    }

    #[test]
    fn test_half_dollar_short_is_not_flagged() {
        let inventory = CashInventory::new(0, 0, 0, 0);
        let result = distribute(&owed(&[0.50, 0.51]), &inventory);

        assert!(!result.payouts[0].shortage);
        assert!(result.payouts[1].shortage);
    }

    #[test]
    fn test_inventory_bounds_hold() {
        let inventory = CashInventory::new(2, 3, 1, 7);
        let allocations = owed(&[63.25, 18.75, 41.0, 9.99, 120.0]);
        let result = distribute(&allocations, &inventory);

        let used = result.bills_used();
        for bill in Bill::ALL {
            assert!(used.count(bill) <= inventory.count(bill));
            assert_eq!(used.count(bill) + result.leftover.count(bill), inventory.count(bill));
        }
        assert!(result.distributed_total() <= inventory.total());
        for payout in &result.payouts {
            // ones rounding can overpay by at most half a dollar
            assert!(payout.bills.total() <= payout.tip_amount + Cents(50));
        }
    }

    #[test]
    fn test_caller_inventory_untouched_and_repeatable() {
        let inventory = CashInventory::new(3, 2, 2, 10);
        let allocations = owed(&[55.0, 27.5]);

        let first = distribute(&allocations, &inventory);
        let second = distribute(&allocations, &inventory);

        assert_eq!(inventory, CashInventory::new(3, 2, 2, 10));
        assert_eq!(first, second);
    }

    #[test]
    fn test_inventory_totals() {
        let inventory = CashInventory::new(2, 1, 1, 3);
        assert_eq!(inventory.total(), Cents::from_dollars(58.0));
        assert_eq!(inventory.bill_count(), 7);
    }
}
