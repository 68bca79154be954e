//! Ranking of coverage results for reports.
//!
//! A proteome run yields one result per covered protein, often tens of
//! thousands, while a report usually lists only the best covered few
//! (`report_proteins`). Those are selected in O(n log k) with a bounded min
//! heap over the front of the slice before the survivors are sorted.

use std::cmp::Ordering;

use itertools::Itertools;

use crate::result::CoverageResult;

/// Move the `k` best proteins of `ranked` to its front. `ranked[0]` then holds
/// the weakest of them, the cutoff a later protein has to beat; the rest are
/// in heap order, not sorted.
pub fn select_best<T: Ord>(ranked: &mut [T], k: usize) {
    if k == 0 || ranked.len() <= k {
        return;
    }

    let (best, rest) = ranked.split_at_mut(k);
    for parent in (0..k / 2).rev() {
        sift_down(best, parent);
    }
    debug_assert!(is_min_heap(best));

    for candidate in rest {
        if *candidate > best[0] {
            std::mem::swap(candidate, &mut best[0]);
            sift_down(best, 0);
        }
    }
    debug_assert!(is_min_heap(best));
}

fn is_min_heap<T: Ord>(heap: &[T]) -> bool {
    (1..heap.len()).all(|child| heap[(child - 1) / 2] <= heap[child])
}

/// Sink `heap[parent]` below any weaker child
fn sift_down<T: Ord>(heap: &mut [T], mut parent: usize) {
    loop {
        let weakest = [2 * parent + 1, 2 * parent + 2]
            .into_iter()
            .filter(|&child| child < heap.len())
            .fold(parent, |weakest, child| {
                if heap[child] < heap[weakest] {
                    child
                } else {
                    weakest
                }
            });
        if weakest == parent {
            return;
        }
        heap.swap(parent, weakest);
        parent = weakest;
    }
}

/// Orders results so that the "largest" is the best covered protein; ties
/// prefer the lexicographically smaller protein id
#[derive(Copy, Clone, Debug)]
struct Ranked<'a>(&'a CoverageResult);

impl Ord for Ranked<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .coverage
            .total_cmp(&other.0.coverage)
            .then_with(|| other.0.protein_id.cmp(&self.0.protein_id))
    }
}

impl PartialOrd for Ranked<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ranked<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked<'_> {}

/// Results by decreasing coverage, then protein id. With `k`, only the best
/// `k` are kept.
pub fn top_by_coverage<'a, I>(results: I, k: Option<usize>) -> Vec<&'a CoverageResult>
where
    I: IntoIterator<Item = &'a CoverageResult>,
{
    let mut ranked = results.into_iter().map(Ranked).collect_vec();
    if let Some(k) = k {
        select_best(&mut ranked, k);
        ranked.truncate(k);
    }
    ranked.sort_unstable_by(|a, b| b.cmp(a));
    ranked.into_iter().map(|r| r.0).collect()
}

#[cfg(test)]
mod tests {
    use std::fmt::Debug;

    use quickcheck_macros::quickcheck;

    use super::*;
    use crate::fasta::ProteinRecord;

    fn check<T: Ord + Clone + Debug>(mut data: Vec<T>, k: usize) {
        let k = k.min(data.len());
        let mut sorted = data.clone();
        sorted.sort_by(|a, b| b.cmp(a));

        select_best(&mut data, k);
        let top_k = &mut data[..k];
        assert!(is_min_heap(top_k) || k == sorted.len());

        top_k.sort_by(|a, b| b.cmp(a));
        assert_eq!(top_k, &sorted[..k]);
    }

    #[quickcheck]
    fn k_selection(data: Vec<i32>, k: usize) {
        check(data, k);
    }

    #[test]
    fn smoke() {
        check((0..500).collect(), 50);
        check((0..500).rev().collect(), 50);
        check(vec![3, 1, 2], 0);
    }

    fn result(id: &str, coverage: &[u32]) -> CoverageResult {
        let sequence = "A".repeat(coverage.len());
        let protein = ProteinRecord::new(id, sequence.as_str());
        CoverageResult::new(&protein, coverage.to_vec(), Default::default(), false).unwrap()
    }

    #[test]
    fn ranked_by_coverage_then_id() {
        let results = vec![
            result("P3", &[1, 0]),
            result("P1", &[1, 1]),
            result("P4", &[1, 0, 0, 0]),
            result("P2", &[0, 1]),
        ];
        let ids = |ranked: Vec<&CoverageResult>| {
            ranked
                .into_iter()
                .map(|r| r.protein_id.as_str())
                .collect::<Vec<_>>()
                .join(",")
        };

        assert_eq!(ids(top_by_coverage(&results, None)), "P1,P2,P3,P4");
        assert_eq!(ids(top_by_coverage(&results, Some(2))), "P1,P2");
        assert_eq!(ids(top_by_coverage(&results, Some(10))), "P1,P2,P3,P4");
        assert!(top_by_coverage(&results, Some(0)).is_empty());
    }
}
