use fnv::FnvHashMap;

use crate::automaton::Match;
use crate::peptide::{PatternIx, PeptideIndex};

/// One position array per annotation label (modification or group)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PtmTracks {
    labels: Vec<String>,
    index: FnvHashMap<String, usize>,
    tracks: Vec<Vec<u32>>,
}

impl PtmTracks {
    pub fn zeroed<'a, I>(len: usize, labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut labels = labels.into_iter().map(String::from).collect::<Vec<_>>();
        labels.sort_unstable();
        labels.dedup();
        let index = labels
            .iter()
            .enumerate()
            .map(|(ix, label)| (label.clone(), ix))
            .collect();
        let tracks = vec![vec![0; len]; labels.len()];
        PtmTracks {
            labels,
            index,
            tracks,
        }
    }

    pub fn track(&self, label: &str) -> Option<&[u32]> {
        self.index.get(label).map(|&ix| self.tracks[ix].as_slice())
    }

    /// `(label, track)` pairs in label order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u32])> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.tracks.iter().map(Vec::as_slice))
    }
}

/// Per-position counts over the whole concatenated proteome
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoverageTracks {
    pub coverage: Vec<u32>,
    /// `None` when PTM bookkeeping is disabled for the job
    pub ptms: Option<PtmTracks>,
}

/// What a single match of a pattern adds to the tracks, resolved once per
/// pattern so the match loop does no string lookups
#[derive(Default)]
struct Contribution {
    multiplicity: u32,
    /// Group tracks incremented over the whole matched span, once per
    /// identification attributed to the group
    spans: Vec<usize>,
    /// `(track, offset)`: modification tracks incremented at `start + offset`
    points: Vec<(usize, usize)>,
}

impl CoverageTracks {
    pub fn zeroed<'a, I>(len: usize, labels: Option<I>) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        CoverageTracks {
            coverage: vec![0; len],
            ptms: labels.map(|labels| PtmTracks::zeroed(len, labels)),
        }
    }

    fn resolve(&self, peptides: &PeptideIndex, ix: PatternIx) -> Contribution {
        let mut contribution = Contribution {
            multiplicity: peptides.multiplicity(ix),
            ..Default::default()
        };

        let ptms = match &self.ptms {
            Some(ptms) => ptms,
            None => return contribution,
        };

        for id in peptides.identifications(ix) {
            for group in &id.groups {
                if let Some(&track) = ptms.index.get(group) {
                    contribution.spans.push(track);
                }
            }
            for m in &id.modifications {
                match ptms.index.get(&m.label) {
                    Some(&track) => contribution.points.push((track, m.offset)),
                    None => log::debug!("`{}` in `{}` has no annotation", m.label, id.psm),
                }
            }
        }
        contribution
    }

    /// Add every match to the coverage and PTM tracks. All updates are
    /// additions, so the order of `matches` does not matter.
    pub fn accumulate(&mut self, matches: &[Match], peptides: &PeptideIndex) {
        let contributions = (0..peptides.len())
            .map(|ix| self.resolve(peptides, PatternIx(ix as u32)))
            .collect::<Vec<_>>();

        for m in matches {
            let contribution = &contributions[m.pattern.0 as usize];
            for x in &mut self.coverage[m.start..=m.end] {
                *x += contribution.multiplicity;
            }

            if let Some(ptms) = &mut self.ptms {
                for &track in &contribution.spans {
                    for x in &mut ptms.tracks[track][m.start..=m.end] {
                        *x += 1;
                    }
                }
                for &(track, offset) in &contribution.points {
                    ptms.tracks[track][m.start + offset] += 1;
                }
            }
        }
    }
}
