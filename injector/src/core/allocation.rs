//! Proportional multi-list budget allocation
//!
//! Splits a campaign's injection budget across its lists in proportion to
//! each list's available-lead count. The algorithm is pure and fully
//! deterministic: lists are visited in ascending list-number order, shares
//! are floored, and the rounding remainder is dropped rather than
//! redistributed, so the total allocated is never more than the budget
//! (and may be strictly less).

use std::collections::BTreeMap;

/// One list's available-lead count, as input to [`allocate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListAvailability {
    pub list_number: String,
    pub available: u32,
}

impl ListAvailability {
    pub fn new(list_number: impl Into<String>, available: u32) -> Self {
        Self {
            list_number: list_number.into(),
            available,
        }
    }
}

/// Distribute `total_budget` across lists proportionally to availability.
///
/// Lists with zero available leads receive nothing. A non-empty list whose
/// floored share rounds to zero is bumped to one while budget remains, so
/// small lists are not starved. A running cap guarantees the allocated sum
/// never exceeds the budget; once the remainder hits zero, later lists get
/// nothing. Returns only positive quotas.
pub fn allocate(total_budget: u32, lists: &[ListAvailability]) -> BTreeMap<String, u32> {
    let mut quotas = BTreeMap::new();

    let total_available: u64 = lists
        .iter()
        .map(|list| u64::from(list.available))
        .sum();
    if total_budget == 0 || total_available == 0 {
        return quotas;
    }

    // Fixed visiting order keeps the result deterministic regardless of
    // input order.
    let mut ordered: Vec<&ListAvailability> =
        lists.iter().filter(|list| list.available > 0).collect();
    ordered.sort_by(|a, b| a.list_number.cmp(&b.list_number));

    let mut remaining = total_budget;
    for list in ordered {
        if remaining == 0 {
            break;
        }

        // floor(total_budget * available / total_available)
        let mut quota =
            (u64::from(total_budget) * u64::from(list.available) / total_available) as u32;
        if quota == 0 {
            quota = 1;
        }
        quota = quota.min(remaining);
        remaining -= quota;

        quotas.insert(list.list_number.clone(), quota);
    }

    quotas
}
