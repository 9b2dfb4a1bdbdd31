// 💵 Tip Allocator - proportional shares, cent-exact
// Shares are rounded half-up to the cent; the rounding remainder goes to the last partner

use crate::error::{Result, TipError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

// ============================================================================
// MONEY
// ============================================================================

/// Whole cents. All money arithmetic happens here so totals stay exact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cents(pub i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);
    /// Largest pool `allocate` accepts ($1,000,000,000).
    pub const MAX_POOL: Cents = Cents(100_000_000_000);

    /// Round a dollar amount half-up to the nearest cent.
    pub fn from_dollars(dollars: f64) -> Self {
        Cents(round_half_up(dollars * 100.0))
    }

    pub fn from_whole_dollars(dollars: i64) -> Self {
        Cents(dollars * 100)
    }

    pub fn as_dollars(self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Add for Cents {
    type Output = Cents;
    fn add(self, rhs: Cents) -> Cents {
        Cents(self.0 + rhs.0)
    }
}

impl AddAssign for Cents {
    fn add_assign(&mut self, rhs: Cents) {
        self.0 += rhs.0;
    }
}

impl Sub for Cents {
    type Output = Cents;
    fn sub(self, rhs: Cents) -> Cents {
        Cents(self.0 - rhs.0)
    }
}

impl std::iter::Sum for Cents {
    fn sum<I: Iterator<Item = Cents>>(iter: I) -> Cents {
        iter.fold(Cents::ZERO, Add::add)
    }
}

// Serialized as a decimal dollar amount (e.g. 12.34) on every wire format
impl Serialize for Cents {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_dollars())
    }
}

impl<'de> Deserialize<'de> for Cents {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let dollars = f64::deserialize(deserializer)?;
        Ok(Cents::from_dollars(dollars))
    }
}

fn round_half_up(value: f64) -> i64 {
    // 1e-9 absorbs binary representation error such as 1.005 * 100 = 100.49999...
    (value + 0.5 + 1e-9).floor() as i64
}

// ============================================================================
// ALLOCATION
// ============================================================================

/// One partner's share of the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation<Id> {
    pub partner_id: Id,
    pub tip_amount: Cents,
}

/// Split `total_tips` across partners in proportion to their hours.
///
/// Input order matters: the partner listed last absorbs the rounding
/// remainder, so the allocations always sum to `total_tips` exactly.
///
/// # Errors
/// `InvalidInput` when total hours is zero (including an empty list), when
/// any hours value is negative or non-finite, or when `total_tips` is negative
/// or above [`Cents::MAX_POOL`].
pub fn allocate<Id: Clone>(total_tips: Cents, partners: &[(Id, f64)]) -> Result<Vec<Allocation<Id>>> {
    if total_tips < Cents::ZERO {
        return Err(TipError::invalid_input("total tips cannot be negative"));
    }
    if total_tips > Cents::MAX_POOL {
        return Err(TipError::InvalidInput(format!(
            "total tips cannot exceed ${}",
            Cents::MAX_POOL
        )));
    }
    if partners.iter().any(|(_, hours)| !hours.is_finite() || *hours < 0.0) {
        return Err(TipError::invalid_input(
            "tippable hours must be non-negative numbers",
        ));
    }

    let total_hours: f64 = partners.iter().map(|(_, hours)| hours).sum();
    if total_hours <= 0.0 {
        return Err(TipError::invalid_input(
            "total tippable hours is zero; cannot calculate tips",
        ));
    }

    let mut allocations: Vec<Allocation<Id>> = partners
        .iter()
        .map(|(id, hours)| {
            let share = (hours / total_hours) * total_tips.0 as f64;
            Allocation {
                partner_id: id.clone(),
                tip_amount: Cents(round_half_up(share)),
            }
        })
        .collect();

    let allocated: Cents = allocations.iter().map(|a| a.tip_amount).sum();
    let remainder = total_tips - allocated;

    if remainder != Cents::ZERO {
        if let Some(last) = allocations.last_mut() {
            last.tip_amount += remainder;
        }
    }

    Ok(allocations)
}

/// Total tips divided by total hours, in dollars per hour.
pub fn hourly_rate(total_tips: Cents, total_hours: f64) -> f64 {
    if total_hours > 0.0 {
        total_tips.as_dollars() / total_hours
    } else {
        0.0
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn amounts(allocations: &[Allocation<&str>]) -> Vec<i64> {
        allocations.iter().map(|a| a.tip_amount.0).collect()
    }

    #[test]
    fn test_proportional_split() {
        let result = allocate(Cents::from_dollars(100.0), &[("A", 10.0), ("B", 30.0)]).unwrap();

        assert_eq!(amounts(&result), vec![2500, 7500]);
        assert_eq!(result[0].partner_id, "A");
    }

    #[test]
    fn test_remainder_goes_to_last_partner() {
        let partners = [("A", 1.0), ("B", 1.0), ("C", 1.0)];
        let result = allocate(Cents::from_dollars(10.0), &partners).unwrap();

        assert_eq!(amounts(&result), vec![333, 333, 334]);
    }

    #[test]
    fn test_remainder_not_given_to_largest_share() {
        let partners = [("big", 5.0), ("small", 1.0), ("tiny", 1.0)];
        let result = allocate(Cents::from_dollars(1.0), &partners).unwrap();

        // 71.43 / 14.29 / 14.29 rounds to 71 + 14 + 14 = 99
        assert_eq!(amounts(&result), vec![71, 14, 15]);
    }

    #[test]
    fn test_overshoot_is_taken_from_last_partner() {
        // 0.5 cents each rounds up to 1 cent each
        let partners = [("A", 1.0), ("B", 1.0)];
        let result = allocate(Cents(1), &partners).unwrap();

        assert_eq!(amounts(&result), vec![1, 0]);
    }

    #[test]
    fn test_sum_is_exact_over_many_inputs() {
        let hours = [7.25, 3.5, 12.0, 0.0, 8.75, 1.33, 39.9];
        for total in [0, 1, 99, 1234, 100_001, 987_654] {
            let partners: Vec<(usize, f64)> = hours.iter().copied().enumerate().collect();
            let result = allocate(Cents(total), &partners).unwrap();
            let sum: Cents = result.iter().map(|a| a.tip_amount).sum();
            assert_eq!(sum, Cents(total), "total {}", total);
        }
    }

    #[test]
    fn test_zero_hours_is_invalid_input() {
        let err = allocate(Cents(5000), &[("A", 0.0), ("B", 0.0)]).unwrap_err();
        assert!(matches!(err, TipError::InvalidInput(_)));

        let empty: [(&str, f64); 0] = [];
        assert!(matches!(
            allocate(Cents(5000), &empty),
            Err(TipError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_negative_inputs_are_rejected() {
        assert!(allocate(Cents(-1), &[("A", 1.0)]).is_err());
        assert!(allocate(Cents(100), &[("A", -1.0), ("B", 3.0)]).is_err());
        assert!(allocate(Cents(100), &[("A", f64::NAN)]).is_err());
    }

    #[test]
    fn test_allocation_is_repeatable() {
        let partners = [("A", 4.5), ("B", 6.25), ("C", 2.0)];
        let first = allocate(Cents::from_dollars(413.27), &partners).unwrap();
        let second = allocate(Cents::from_dollars(413.27), &partners).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cents_from_dollars_rounds_half_up() {
        assert_eq!(Cents::from_dollars(1.005), Cents(101));
        assert_eq!(Cents::from_dollars(12.344), Cents(1234));
        assert_eq!(Cents::from_dollars(0.0), Cents::ZERO);
    }

    #[test]
    fn test_cents_display() {
        assert_eq!(Cents(3334).to_string(), "33.34");
        assert_eq!(Cents(5).to_string(), "0.05");
        assert_eq!(Cents(-120).to_string(), "-1.20");
    }

    #[test]
    fn test_rejects_pool_beyond_limit() {
        let partners = [("A", 1.0), ("B", 1.0)];
        let err = allocate(Cents::from_dollars(1e17), &partners).unwrap_err();
        assert!(matches!(err, TipError::InvalidInput(_)));

        let result = allocate(Cents::MAX_POOL, &partners).unwrap();
        assert_eq!(amounts(&result), vec![50_000_000_000, 50_000_000_000]);
    }

    #[test]
    fn test_hourly_rate() {
        assert_eq!(hourly_rate(Cents(10000), 40.0), 2.5);
        assert_eq!(hourly_rate(Cents(10000), 0.0), 0.0);
    }
}
