use crate::core::{Currency, Pool};
use alloy::primitives::Address;

/// A simple path through the pool graph, as indices into the candidate pool list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolPath {
    pub pools: Vec<usize>,
}

impl PoolPath {
    pub fn hops(&self) -> usize {
        self.pools.len()
    }

    pub fn is_disjoint(&self, other: &PoolPath) -> bool {
        self.pools.iter().all(|p| !other.pools.contains(p))
    }
}

/// Enumerate simple paths from `from` to `to` of at most `max_hops` pools.
///
/// Nodes are wrapped currencies; pools are tried in input order, so the result
/// order depends only on the pool list.
pub fn enumerate_paths(pools: &[Pool], from: &Currency, to: &Currency, max_hops: usize) -> Vec<PoolPath> {
    let mut found = Vec::new();
    if max_hops == 0 || from.same_wrapped(to) {
        return found;
    }
    let mut visited = vec![from.wrapped_address()];
    let mut current = Vec::new();
    walk(pools, from, to, max_hops, &mut visited, &mut current, &mut found);
    found
}

fn walk(
    pools: &[Pool],
    node: &Currency,
    target: &Currency,
    max_hops: usize,
    visited: &mut Vec<Address>,
    current: &mut Vec<usize>,
    found: &mut Vec<PoolPath>,
) {
    for (index, pool) in pools.iter().enumerate() {
        if current.contains(&index) {
            continue;
        }
        let Some(next) = pool.other(node) else {
            continue;
        };
        if next.same_wrapped(node) {
            continue;
        }

        if next.same_wrapped(target) {
            let mut pools = current.clone();
            pools.push(index);
            found.push(PoolPath { pools });
            continue;
        }

        let next_address = next.wrapped_address();
        if current.len() + 1 >= max_hops || visited.contains(&next_address) {
            continue;
        }

        visited.push(next_address);
        current.push(index);
        walk(pools, next, target, max_hops, visited, current, found);
        current.pop();
        visited.pop();
    }
}

/// Ways to split 100% into `parts` positive multiples of `step` percent, in
/// lexicographic order.
pub fn distributions(parts: usize, step: u32) -> Vec<Vec<u32>> {
    let mut result = Vec::new();
    if parts == 0 || step == 0 || step > 100 || 100 % step != 0 {
        return result;
    }
    let units = (100 / step) as usize;
    let mut current = Vec::with_capacity(parts);
    compose(units, parts, step, &mut current, &mut result);
    result
}

fn compose(units: usize, parts: usize, step: u32, current: &mut Vec<u32>, result: &mut Vec<Vec<u32>>) {
    if parts == 1 {
        if units > 0 {
            current.push(units as u32 * step);
            result.push(current.clone());
            current.pop();
        }
        return;
    }
    for take in 1..units {
        if units - take < parts - 1 {
            break;
        }
        current.push(take as u32 * step);
        compose(units - take, parts - 1, step, current, result);
        current.pop();
    }
}

/// All `k`-combinations of pool-disjoint paths, in index order.
///
/// Combinations are produced on demand; nothing is materialized up front.
pub fn disjoint_combinations(paths: &[PoolPath], k: usize) -> DisjointCombinations<'_> {
    DisjointCombinations {
        paths,
        k,
        stack: Vec::with_capacity(k),
        started: false,
        done: k == 0 || k > paths.len(),
    }
}

/// Backtracking iterator behind [`disjoint_combinations`].
pub struct DisjointCombinations<'a> {
    paths: &'a [PoolPath],
    k: usize,
    stack: Vec<usize>,
    started: bool,
    done: bool,
}

impl DisjointCombinations<'_> {
    fn fits(&self, index: usize) -> bool {
        self.stack
            .iter()
            .all(|&chosen| self.paths[chosen].is_disjoint(&self.paths[index]))
    }
}

impl Iterator for DisjointCombinations<'_> {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }

        // resume after the combination handed out last
        let mut start = 0;
        if self.started {
            match self.stack.pop() {
                Some(last) => start = last + 1,
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
        self.started = true;

        loop {
            match (start..self.paths.len()).find(|&index| self.fits(index)) {
                Some(index) => {
                    self.stack.push(index);
                    if self.stack.len() == self.k {
                        return Some(self.stack.clone());
                    }
                    start = index + 1;
                }
                None => match self.stack.pop() {
                    Some(last) => start = last + 1,
                    None => {
                        self.done = true;
                        return None;
                    }
                },
            }
        }
    }
}
