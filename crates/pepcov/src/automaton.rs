//! Locate every peptide in the concatenated proteome with a single pass.
//!
//! Searching each peptide on its own costs one scan of a multi-megabase text
//! per peptide. Instead, all bare peptide sequences are compiled into one
//! Aho-Corasick automaton (a trie with failure links), and the proteome is
//! scanned once. Overlapping iteration reports every occurrence of every
//! pattern, including matches nested inside or overlapping other matches.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

use crate::peptide::{PatternIx, PeptideIndex};
use crate::proteome::ConcatenatedSequence;
use crate::Error;

/// One occurrence of a peptide: `text[start..=end] == pattern`
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Match {
    pub start: usize,
    /// Inclusive
    pub end: usize,
    pub pattern: PatternIx,
}

impl Match {
    pub fn len(&self) -> usize {
        self.end + 1 - self.start
    }
}

pub struct PeptideMatcher<'db> {
    automaton: AhoCorasick,
    peptides: &'db PeptideIndex,
}

impl<'db> PeptideMatcher<'db> {
    pub fn new(peptides: &'db PeptideIndex) -> Result<Self, Error> {
        log::trace!("building automaton over {} peptides", peptides.len());
        let automaton = AhoCorasickBuilder::new()
            .match_kind(MatchKind::Standard)
            .build(peptides.patterns())
            .map_err(Error::Automaton)?;
        Ok(PeptideMatcher {
            automaton,
            peptides,
        })
    }

    /// Scan `text` once, calling `f` on every match. Each reported span is
    /// compared against its pattern before it is handed out; a mismatch means
    /// the automaton is corrupt and aborts the scan.
    pub fn for_each_match<F>(&self, text: &ConcatenatedSequence, f: F) -> Result<(), Error>
    where
        F: FnMut(Match),
    {
        let haystack = text.as_bytes();
        let spans = self
            .automaton
            .find_overlapping_iter(haystack)
            .map(|m| (m.start(), m.end(), PatternIx(m.pattern().as_u32())));
        visit_spans(haystack, self.peptides, spans, f)
    }

    pub fn find_all(&self, text: &ConcatenatedSequence) -> Result<Vec<Match>, Error> {
        let mut matches = Vec::new();
        self.for_each_match(text, |m| matches.push(m))?;
        Ok(matches)
    }
}

/// Hand each half-open span to `f` as a [`Match`], stopping at the first one
/// that does not spell out its pattern
fn visit_spans<I, F>(
    haystack: &[u8],
    peptides: &PeptideIndex,
    spans: I,
    mut f: F,
) -> Result<(), Error>
where
    I: IntoIterator<Item = (usize, usize, PatternIx)>,
    F: FnMut(Match),
{
    for (start, end, pattern) in spans {
        f(check_span(haystack, start, end, pattern, peptides.pattern(pattern))?);
    }
    Ok(())
}

/// `haystack[start..end]` must equal `expected`
fn check_span(
    haystack: &[u8],
    start: usize,
    end: usize,
    pattern: PatternIx,
    expected: &str,
) -> Result<Match, Error> {
    match haystack.get(start..end) {
        Some(span) if start < end && span == expected.as_bytes() => Ok(Match {
            start,
            end: end - 1,
            pattern,
        }),
        _ => Err(Error::MatchIntegrity {
            start,
            end: end.saturating_sub(1),
            pattern: expected.into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fasta::ProteinRecord;
    use crate::group::{GroupAttribution, PeptideGroups};
    use crate::proteome::SEPARATOR;
    use quickcheck_macros::quickcheck;
    use std::collections::BTreeMap;

    fn index(peptides: &[&str]) -> PeptideIndex {
        let mut psms = BTreeMap::new();
        psms.insert(
            "unlabeled".to_string(),
            peptides.iter().map(|s| s.to_string()).collect(),
        );
        PeptideIndex::build(&PeptideGroups::new(&psms, None, GroupAttribution::Last))
    }

    fn proteome(seqs: &[&str]) -> ConcatenatedSequence {
        let proteins = seqs
            .iter()
            .enumerate()
            .map(|(ix, s)| ProteinRecord::new(format!("P{}", ix), s.to_string()))
            .collect::<Vec<_>>();
        ConcatenatedSequence::new(&proteins)
    }

    fn spans(index: &PeptideIndex, text: &ConcatenatedSequence) -> Vec<(usize, usize, String)> {
        let mut spans = PeptideMatcher::new(index)
            .unwrap()
            .find_all(text)
            .unwrap()
            .into_iter()
            .map(|m| (m.start, m.end, index.pattern(m.pattern).to_string()))
            .collect::<Vec<_>>();
        spans.sort();
        spans
    }

    #[test]
    fn overlapping_and_nested() {
        let index = index(&["AAA", "AA", "ABA", "BAB"]);
        let text = proteome(&["AAAABAB"]);
        assert_eq!(
            spans(&index, &text),
            vec![
                (0, 1, "AA".into()),
                (0, 2, "AAA".into()),
                (1, 2, "AA".into()),
                (1, 3, "AAA".into()),
                (2, 3, "AA".into()),
                (3, 5, "ABA".into()),
                (4, 6, "BAB".into()),
            ]
        );
    }

    #[test]
    fn matches_do_not_cross_proteins() {
        let index = index(&["CCCDDD", "CCC", "DDD"]);
        let text = proteome(&["AAABBBCCC", "DDDEEEFFF"]);
        assert_eq!(
            spans(&index, &text),
            vec![(6, 8, "CCC".into()), (10, 12, "DDD".into())]
        );
    }

    #[test]
    fn corrupt_span_aborts_scan() {
        let index = index(&["AA", "KL"]);
        let text = proteome(&["AAKL"]);
        let aa = PatternIx(0);
        let kl = PatternIx(1);
        assert_eq!(index.pattern(aa), "AA");

        // the second span claims `AA` but covers `AK`
        let mut visited = Vec::new();
        let err = visit_spans(
            text.as_bytes(),
            &index,
            vec![(0, 2, aa), (1, 3, aa), (2, 4, kl)],
            |m| visited.push(m),
        )
        .unwrap_err();

        match err {
            Error::MatchIntegrity {
                start,
                end,
                pattern,
            } => {
                assert_eq!((start, end), (1, 2));
                assert_eq!(pattern, "AA");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(
            visited,
            vec![Match {
                start: 0,
                end: 1,
                pattern: aa
            }]
        );
    }

    #[test]
    fn span_checks() {
        let haystack = b"AAKL";
        let kl = PatternIx(1);
        assert_eq!(
            check_span(haystack, 2, 4, kl, "KL").unwrap(),
            Match {
                start: 2,
                end: 3,
                pattern: kl
            }
        );
        // empty, reversed and out of bounds spans
        assert!(check_span(haystack, 2, 2, kl, "").is_err());
        assert!(check_span(haystack, 3, 2, kl, "KL").is_err());
        assert!(check_span(haystack, 3, 5, kl, "KL").is_err());
    }

    #[test]
    fn no_patterns() {
        let index = index(&[]);
        let text = proteome(&["MKLVQR"]);
        assert!(spans(&index, &text).is_empty());
    }

    /// Every reported match must spell out its pattern, never include the
    /// separator, and agree with a naive search
    #[quickcheck]
    fn agrees_with_naive_search(proteins: Vec<Vec<u8>>, peptides: Vec<(u8, u8, u8)>) -> bool {
        const AA: &[u8] = b"ACDE";
        let proteins = proteins
            .iter()
            .take(8)
            .map(|p| {
                p.iter()
                    .take(40)
                    .map(|b| AA[*b as usize % AA.len()] as char)
                    .collect::<String>()
            })
            .collect::<Vec<_>>();
        let refs = proteins.iter().map(String::as_str).collect::<Vec<_>>();
        let text = proteome(&refs);

        // Draw peptides from the proteins themselves so that most of them hit
        let peptides = peptides
            .iter()
            .filter_map(|(p, start, len)| {
                let seq = proteins.get(*p as usize % proteins.len().max(1))?;
                if seq.is_empty() {
                    return None;
                }
                let start = *start as usize % seq.len();
                let end = (start + 1 + *len as usize % 6).min(seq.len());
                Some(seq[start..end].to_string())
            })
            .collect::<Vec<_>>();
        let refs = peptides.iter().map(String::as_str).collect::<Vec<_>>();
        let index = index(&refs);

        let found = spans(&index, &text);
        let haystack = text.as_str();
        let mut expected = Vec::new();
        for pattern in index.patterns() {
            for start in 0..haystack.len() {
                if haystack[start..].starts_with(pattern.as_str()) {
                    expected.push((start, start + pattern.len() - 1, pattern.clone()));
                }
            }
        }
        expected.sort();

        found == expected
            && found.iter().all(|(start, end, pattern)| {
                let span = &haystack.as_bytes()[*start..=*end];
                span == pattern.as_bytes() && !span.contains(&SEPARATOR)
            })
    }
}
