//! Decision-point allocation.
//!
//! Every rescued subject is worth the same, and each has an integer cost
//! (its shortfall below the pass mark), so funding the cheapest shortfalls
//! first maximises the number of subjects lifted to exactly the pass mark
//! for a given budget.

use super::grade::{GradeValue, PASS_MARK};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub grade: GradeValue,
    pub exempt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub with_decision: GradeValue,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationPlan {
    /// Same order as the candidates.
    pub per_subject: Vec<Allocation>,
    pub spent: u32,
}

/// Shortfall a decision would have to cover, if the subject is in the
/// near-miss band at all.
pub fn eligible_cost(candidate: &Candidate, near_miss_cap: u32) -> Option<u32> {
    if candidate.exempt {
        return None;
    }
    let GradeValue::Real(g) = candidate.grade else {
        return None;
    };
    let cost = PASS_MARK - g;
    if cost <= 0 {
        return None;
    }
    let cost = cost as u32;
    (cost <= near_miss_cap).then_some(cost)
}

pub fn allocate(candidates: &[Candidate], budget: u32, near_miss_cap: u32) -> AllocationPlan {
    let mut per_subject: Vec<Allocation> = candidates
        .iter()
        .map(|c| Allocation {
            with_decision: c.grade,
            points: 0,
        })
        .collect();

    let mut eligible: Vec<(u32, usize)> = candidates
        .iter()
        .enumerate()
        .filter_map(|(i, c)| eligible_cost(c, near_miss_cap).map(|cost| (cost, i)))
        .collect();
    // Ties go to the subject declared first.
    eligible.sort_unstable();

    let mut remaining = budget;
    for (cost, i) in eligible {
        if cost > remaining {
            break;
        }
        remaining -= cost;
        per_subject[i] = Allocation {
            with_decision: GradeValue::Real(PASS_MARK),
            points: cost,
        };
    }

    AllocationPlan {
        per_subject,
        spent: budget - remaining,
    }
}
