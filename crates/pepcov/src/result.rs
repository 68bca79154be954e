use std::collections::BTreeMap;

use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};

use crate::coverage::CoverageTracks;
use crate::digest::content_hash;
use crate::fasta::ProteinRecord;
use crate::proteome::ConcatenatedSequence;
use crate::Error;

/// Coverage and modification sites of a single protein for one job
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoverageResult {
    pub protein_id: String,
    /// Fraction of residues covered by at least one identification
    pub coverage: f64,
    pub sequence: String,
    pub gene: String,
    pub description: String,
    /// Number of identifications covering each residue
    pub sequence_coverage: Vec<u32>,
    /// Annotation label -> protein-relative positions
    pub ptms: BTreeMap<String, Vec<usize>>,
    pub has_pdb: bool,
    /// Digest of all other fields, see [`crate::digest`]
    pub content_hash: String,
}

pub type CoverageMap = BTreeMap<String, CoverageResult>;

/// Fraction of non-zero positions; `0.0` for an empty window
pub fn calculate_coverage(window: &[u32]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let covered = window.iter().filter(|&&x| x > 0).count();
    covered as f64 / window.len() as f64
}

/// Indices of non-zero entries
pub fn nonzero_positions(window: &[u32]) -> Vec<usize> {
    window
        .iter()
        .enumerate()
        .filter(|(_, x)| **x > 0)
        .map(|(ix, _)| ix)
        .collect()
}

impl CoverageResult {
    pub fn new(
        protein: &ProteinRecord,
        sequence_coverage: Vec<u32>,
        ptms: BTreeMap<String, Vec<usize>>,
        has_pdb: bool,
    ) -> Result<Self, Error> {
        let mut result = CoverageResult {
            protein_id: protein.id.clone(),
            coverage: calculate_coverage(&sequence_coverage),
            sequence: protein.sequence.clone(),
            gene: protein.gene.clone(),
            description: protein.description.clone(),
            sequence_coverage,
            ptms,
            has_pdb,
            content_hash: String::new(),
        };
        result.content_hash = content_hash(&result)?;
        Ok(result)
    }

    /// Number of residues covered at least once
    pub fn covered_residues(&self) -> usize {
        self.sequence_coverage.iter().filter(|&&x| x > 0).count()
    }
}

/// Number of marked positions per label, summed over all proteins
pub fn site_counts(results: &CoverageMap) -> BTreeMap<&str, usize> {
    let mut counts = BTreeMap::new();
    for (label, positions) in results.values().flat_map(|r| r.ptms.iter()) {
        *counts.entry(label.as_str()).or_insert(0) += positions.len();
    }
    counts
}

/// Slice the proteome-wide tracks back into per-protein results. Proteins
/// without any coverage are skipped.
pub fn assemble(
    proteins: &[ProteinRecord],
    sequence: &ConcatenatedSequence,
    tracks: &CoverageTracks,
    structures: &FnvHashSet<String>,
) -> Result<CoverageMap, Error> {
    let mut results = CoverageMap::new();

    for (protein, window) in proteins.iter().zip(sequence.separators().windows()) {
        let slice = &tracks.coverage[window.clone()];
        if calculate_coverage(slice) == 0.0 {
            continue;
        }

        let mut ptms = BTreeMap::new();
        if let Some(tracks) = &tracks.ptms {
            for (label, track) in tracks.iter() {
                let positions = nonzero_positions(&track[window.clone()]);
                if !positions.is_empty() {
                    ptms.insert(label.to_string(), positions);
                }
            }
        }

        if results.contains_key(&protein.id) {
            log::warn!("duplicate protein `{}`, keeping first result", protein.id);
            continue;
        }
        let has_pdb = structures.contains(&protein.id);
        let result = CoverageResult::new(protein, slice.to_vec(), ptms, has_pdb)?;
        results.insert(protein.id.clone(), result);
    }

    Ok(results)
}
