//! Minimal-waste covering of a capacity deficit with expansion packages.
//!
//! Packages may be purchased in any multiplicity, so this is unbounded
//! change-making with an overshoot allowance.  The result priority is
//! strict: least waste first, then fewest packages, then the combination
//! whose package codes sort first.  [`Strategy::Exact`] guarantees that
//! ordering; [`Strategy::Bounded`] is a depth-first search with an
//! iteration cap that trades optimality for a hard upper bound on work,
//! and is only used when a caller opts in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::PackageDef;

/// Iteration budget of the bounded search.  Once spent, whatever candidate
/// was found so far is returned as-is.
const MAX_ITERATIONS: u32 = 5_000;

/// How a deficit gets covered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Full table search. Always optimal, cost grows with the deficit.
    #[default]
    Exact,
    /// Capped depth-first search. Fast and usually optimal, but results
    /// are heuristic: waste can be above the minimum once the cap trips.
    Bounded,
}

/// One line of a covering: a package and how many of it to buy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pick {
    pub package: PackageDef,
    pub quantity: u32,
}

impl Pick {
    pub fn capacity(&self) -> u64 {
        self.package.size as u64 * self.quantity as u64
    }
}

pub struct BomOptimizer {
    strategy: Strategy,
}

impl BomOptimizer {
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Cover `deficit` capacity units from `packages`.
    ///
    /// Returns `None` when no covering exists, which only happens with an
    /// empty package list.  A zero deficit yields an empty covering.  Picks
    /// come back sorted by package code.
    pub fn cover(&self, deficit: u64, packages: &[PackageDef]) -> Option<Vec<Pick>> {
        if deficit == 0 {
            return Some(Vec::new());
        }
        let usable: Vec<&PackageDef> = packages.iter().filter(|p| p.size > 0).collect();
        if usable.is_empty() {
            return None;
        }
        let picks = match self.strategy {
            Strategy::Exact => cover_exact(deficit, &usable),
            Strategy::Bounded => cover_bounded(deficit, &usable),
        };
        if let Some(picks) = &picks {
            let total: u64 = picks.iter().map(Pick::capacity).sum();
            log::debug!(
                "covered deficit {} with {} package line(s), waste {}",
                deficit,
                picks.len(),
                total.saturating_sub(deficit)
            );
        }
        picks
    }
}

/// Unbounded change-making over totals scaled down by the GCD of all
/// package sizes.  The table spans every achievable total up to one
/// largest-package past the deficit; the first reachable total at or above
/// the deficit therefore has minimal waste, and the entry stored for it
/// holds the minimal package count for that total.
///
/// Packages are processed in ascending code order and a table entry is only
/// replaced on strictly fewer packages, never on ties, so the back-pointer
/// path of every total keeps the first-found, lexicographically smallest
/// combination among the count-optimal ones.
fn cover_exact(deficit: u64, packages: &[&PackageDef]) -> Option<Vec<Pick>> {
    let mut sorted: Vec<&PackageDef> = packages.to_vec();
    sorted.sort_by(|a, b| a.code.cmp(&b.code));

    let sizes: Vec<u64> = sorted.iter().map(|p| p.size as u64).collect();
    let (unit, largest) = sizes
        .iter()
        .fold((0u64, 0u64), |(g, m), &s| (gcd(g, s), m.max(s)));

    let target = deficit.div_ceil(unit) as usize;
    let limit = (deficit + largest).div_ceil(unit) as usize;

    const UNREACHED: u32 = u32::MAX;
    let mut count = vec![UNREACHED; limit + 1];
    let mut parent = vec![usize::MAX; limit + 1];
    count[0] = 0;

    for (idx, &size) in sizes.iter().enumerate() {
        let step = (size / unit) as usize;
        for total in step..=limit {
            let below = count[total - step];
            if below != UNREACHED && below + 1 < count[total] {
                count[total] = below + 1;
                parent[total] = idx;
            }
        }
    }

    // Enough copies of the largest package always land inside the window,
    // so the scan cannot come up empty.
    let reached = (target..=limit).find(|&total| count[total] != UNREACHED)?;

    let mut quantities = vec![0u32; sorted.len()];
    let mut cursor = reached;
    while cursor > 0 {
        let idx = parent[cursor];
        quantities[idx] += 1;
        cursor -= (sizes[idx] / unit) as usize;
    }

    let picks = sorted
        .into_iter()
        .zip(quantities)
        .filter(|(_, quantity)| *quantity > 0)
        .map(|(package, quantity)| Pick {
            package: (*package).clone(),
            quantity,
        })
        .collect();
    Some(picks)
}

/// Depth-first covering with an iteration cap.
///
/// Large packages are pinned up front so the search only has to close the
/// tail of the deficit, then sizes are tried largest-first with waste-based
/// pruning.  When the cap trips before any exact cover is found the best
/// overshoot candidate seen so far wins, so the result is valid but not
/// necessarily waste-minimal.
fn cover_bounded(deficit: u64, packages: &[&PackageDef]) -> Option<Vec<Pick>> {
    let mut sorted: Vec<&PackageDef> = packages.to_vec();
    sorted.sort_by(|a, b| a.code.cmp(&b.code));

    // Deduplicate by size; the first (smallest) code per size wins.
    let mut by_size: BTreeMap<u64, &PackageDef> = BTreeMap::new();
    for &package in &sorted {
        by_size.entry(package.size as u64).or_insert(package);
    }
    let sizes: Vec<u64> = by_size.keys().rev().copied().collect();
    let largest = sizes[0];

    let prefill = (deficit / largest).saturating_sub(1);
    let remainder = deficit - prefill * largest;

    let mut search = Search {
        sizes: &sizes,
        iterations: 0,
        min_waste: u64::MAX,
        best: None,
    };
    search.run(remainder, &mut Vec::new());
    let combo = search.best?;

    let mut counts: BTreeMap<u64, u64> = BTreeMap::new();
    if prefill > 0 {
        counts.insert(largest, prefill);
    }
    for size in combo {
        *counts.entry(size).or_insert(0) += 1;
    }

    let mut picks: Vec<Pick> = counts
        .into_iter()
        .map(|(size, quantity)| Pick {
            package: (*by_size[&size]).clone(),
            quantity: quantity.min(u32::MAX as u64) as u32,
        })
        .collect();
    picks.sort_by(|a, b| a.package.code.cmp(&b.package.code));
    Some(picks)
}

struct Search<'a> {
    sizes: &'a [u64],
    iterations: u32,
    min_waste: u64,
    best: Option<Vec<u64>>,
}

impl Search<'_> {
    fn run(&mut self, remaining: u64, combo: &mut Vec<u64>) {
        if self.iterations >= MAX_ITERATIONS {
            return;
        }
        self.iterations += 1;

        if remaining == 0 {
            // Exact cover; among zero-waste combos the shortest one wins.
            let better = match &self.best {
                Some(best) => self.min_waste > 0 || combo.len() < best.len(),
                None => true,
            };
            if better {
                self.min_waste = 0;
                self.best = Some(combo.clone());
            }
            return;
        }

        for &size in self.sizes {
            if size <= remaining {
                combo.push(size);
                self.run(remaining - size, combo);
                combo.pop();
                if self.min_waste == 0 {
                    return;
                }
            } else {
                let waste = size - remaining;
                if waste < self.min_waste {
                    self.min_waste = waste;
                    let mut candidate = combo.clone();
                    candidate.push(size);
                    self.best = Some(candidate);
                }
            }
        }
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}
