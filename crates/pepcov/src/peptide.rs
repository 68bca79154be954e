use std::collections::BTreeSet;

use fnv::FnvHashMap;

use crate::group::PeptideGroups;
use crate::modification::{normalize_lossy, Modification, NormalizedPeptide};
use crate::proteome::SEPARATOR;

#[derive(Hash, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[repr(transparent)]
pub struct PatternIx(pub u32);

/// A distinct annotated peptide identification, e.g. `K[100]LVQR`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identification {
    pub psm: String,
    pub modifications: Vec<Modification>,
    /// Recognized group labels this identification is attributed to
    pub groups: Vec<String>,
}

/// Distinct bare peptide sequences (the automaton patterns), each with the
/// annotated identifications that normalize to it
#[derive(Clone, Debug, Default)]
pub struct PeptideIndex {
    patterns: Vec<String>,
    identifications: Vec<Vec<Identification>>,
    empty_groups: Vec<String>,
}

impl PeptideIndex {
    pub fn build(groups: &PeptideGroups) -> PeptideIndex {
        // The same identification submitted twice (in one or several groups)
        // is only counted once
        let distinct = groups
            .groups
            .values()
            .flatten()
            .map(String::as_str)
            .collect::<BTreeSet<_>>();

        let mut normalized: FnvHashMap<&str, NormalizedPeptide> = FnvHashMap::default();
        for psm in distinct {
            let peptide = normalize_lossy(psm);
            if peptide.sequence.is_empty() {
                log::warn!("skipping `{}`: no residues after removing modifications", psm);
                continue;
            }
            if peptide.sequence.as_bytes().contains(&SEPARATOR) {
                log::warn!(
                    "skipping `{}`: contains the reserved character `{}`",
                    psm,
                    SEPARATOR as char
                );
                continue;
            }
            normalized.insert(psm, peptide);
        }

        let empty_groups = groups
            .groups
            .iter()
            .filter(|(_, peptides)| {
                !peptides
                    .iter()
                    .any(|psm| normalized.contains_key(psm.as_str()))
            })
            .map(|(label, _)| label.clone())
            .collect::<Vec<_>>();
        for label in &empty_groups {
            log::warn!("group `{}` contains no usable peptides", label);
        }

        let mut by_sequence: FnvHashMap<String, Vec<Identification>> = FnvHashMap::default();
        for (psm, peptide) in normalized {
            by_sequence
                .entry(peptide.sequence)
                .or_default()
                .push(Identification {
                    psm: psm.into(),
                    modifications: peptide.modifications,
                    groups: groups.labels_of(psm).to_vec(),
                });
        }

        let mut entries = by_sequence.into_iter().collect::<Vec<_>>();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        for (_, ids) in &mut entries {
            ids.sort_unstable_by(|a, b| a.psm.cmp(&b.psm));
        }
        let (patterns, identifications) = entries.into_iter().unzip();

        PeptideIndex {
            patterns,
            identifications,
            empty_groups,
        }
    }

    /// Groups without a single identification left after normalization
    pub fn empty_groups(&self) -> &[String] {
        &self.empty_groups
    }

    /// Distinct bare sequences, in lexicographic order
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn pattern(&self, ix: PatternIx) -> &str {
        &self.patterns[ix.0 as usize]
    }

    pub fn identifications(&self, ix: PatternIx) -> &[Identification] {
        &self.identifications[ix.0 as usize]
    }

    /// Number of distinct annotated identifications sharing this bare sequence
    pub fn multiplicity(&self, ix: PatternIx) -> u32 {
        self.identifications[ix.0 as usize].len() as u32
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
