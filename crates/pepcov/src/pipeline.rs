//! One coverage job, from submitted identifications to per-protein results.
//!
//! Stages run strictly forward on the calling thread: group, index, build the
//! automaton, scan the proteome once, accumulate, then slice into results.
//! The job owns its concatenated sequence and every array; only the proteome
//! and the structure set are borrowed, so several jobs may share them.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};

use crate::automaton::PeptideMatcher;
use crate::coverage::CoverageTracks;
use crate::fasta::ProteinRecord;
use crate::group::{GroupAttribution, PeptideGroups};
use crate::modification::Color;
use crate::peptide::PeptideIndex;
use crate::proteome::ConcatenatedSequence;
use crate::result::{assemble, CoverageMap};
use crate::Error;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageJob {
    /// Group label -> annotated peptide identifications
    pub psms: BTreeMap<String, Vec<String>>,
    /// Modification or group label -> display color. `None` disables PTM
    /// and group tracking entirely.
    pub ptm_annotations: Option<BTreeMap<String, Color>>,
    #[serde(default)]
    pub attribution: GroupAttribution,
}

/// Protein ids of the structure set that do not occur in the proteome
pub fn unknown_proteins<'a>(
    proteins: &[ProteinRecord],
    structures: &'a FnvHashSet<String>,
) -> Vec<&'a str> {
    let known = proteins
        .iter()
        .map(|p| p.id.as_str())
        .collect::<FnvHashSet<_>>();
    let mut unknown = structures
        .iter()
        .map(String::as_str)
        .filter(|id| !known.contains(id))
        .collect::<Vec<_>>();
    unknown.sort_unstable();
    unknown
}

impl CoverageJob {
    pub fn new(psms: BTreeMap<String, Vec<String>>) -> Self {
        CoverageJob {
            psms,
            ..Default::default()
        }
    }

    pub fn with_annotations(mut self, annotations: BTreeMap<String, Color>) -> Self {
        self.ptm_annotations = Some(annotations);
        self
    }

    pub fn with_attribution(mut self, attribution: GroupAttribution) -> Self {
        self.attribution = attribution;
        self
    }

    /// Compute coverage of `proteins` by this job's identifications
    pub fn run(
        &self,
        proteins: &[ProteinRecord],
        structures: &FnvHashSet<String>,
    ) -> Result<CoverageMap, Error> {
        let start = Instant::now();

        for id in unknown_proteins(proteins, structures) {
            log::warn!("structure for unknown protein `{}`, ignoring", id);
        }

        let recognized = self
            .ptm_annotations
            .as_ref()
            .map(|annotations| annotations.keys().cloned().collect::<BTreeSet<_>>());

        let groups = PeptideGroups::new(&self.psms, recognized.as_ref(), self.attribution);
        let peptides = PeptideIndex::build(&groups);
        log::trace!("indexed {} distinct peptide sequences", peptides.len());

        let sequence = ConcatenatedSequence::new(proteins);
        log::trace!(
            "concatenated {} proteins into {} residues",
            proteins.len(),
            sequence.len()
        );

        let matches = PeptideMatcher::new(&peptides)?.find_all(&sequence)?;
        log::trace!("found {} peptide occurrences", matches.len());

        let labels = recognized
            .as_ref()
            .map(|labels| labels.iter().map(String::as_str));
        let mut tracks = CoverageTracks::zeroed(sequence.len(), labels);
        tracks.accumulate(&matches, &peptides);

        let results = assemble(proteins, &sequence, &tracks, structures)?;
        log::info!(
            "{} peptides covered {}/{} proteins in {}ms",
            peptides.len(),
            results.len(),
            proteins.len(),
            start.elapsed().as_millis()
        );
        Ok(results)
    }
}
