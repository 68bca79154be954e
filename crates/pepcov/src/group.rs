use std::collections::{BTreeMap, BTreeSet};

use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};

/// Reserved label collecting every identification without a recognized group
pub const UNLABELED: &str = "unlabeled";

/// How to attribute a peptide identification that was submitted under more
/// than one recognized group. Groups are visited in lexicographic label order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupAttribution {
    /// The last group visited wins
    #[default]
    Last,
    /// The first group visited wins
    First,
    /// Attribute to every group
    All,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PeptideGroups {
    /// Working copy of the submitted groups, after folding unrecognized labels
    /// into [`UNLABELED`]
    pub groups: BTreeMap<String, Vec<String>>,
    /// Identification -> recognized group label(s)
    pub group_of_peptide: FnvHashMap<String, Vec<String>>,
}

impl PeptideGroups {
    /// Partition submitted identifications into recognized groups and the
    /// [`UNLABELED`] bucket. When `recognized` is `None`, labeling is disabled
    /// and the groups pass through unchanged.
    pub fn new(
        psms: &BTreeMap<String, Vec<String>>,
        recognized: Option<&BTreeSet<String>>,
        attribution: GroupAttribution,
    ) -> Self {
        let mut groups = psms.clone();

        if let Some(recognized) = recognized {
            let unrecognized = groups
                .keys()
                .filter(|label| *label != UNLABELED && !recognized.contains(*label))
                .cloned()
                .collect::<Vec<_>>();

            for label in unrecognized {
                if let Some(peptides) = groups.remove(&label) {
                    log::debug!(
                        "group `{}` has no annotation, folding {} peptides into `{}`",
                        label,
                        peptides.len(),
                        UNLABELED
                    );
                    groups
                        .entry(UNLABELED.into())
                        .or_insert_with(Vec::new)
                        .extend(peptides);
                }
            }
        }

        let mut group_of_peptide: FnvHashMap<String, Vec<String>> = FnvHashMap::default();
        for (label, peptides) in groups.iter().filter(|(label, _)| *label != UNLABELED) {
            for psm in peptides {
                match group_of_peptide.get_mut(psm) {
                    None => {
                        group_of_peptide.insert(psm.clone(), vec![label.clone()]);
                    }
                    Some(current) if current.contains(label) => {}
                    Some(current) => {
                        log::debug!(
                            "`{}` is submitted under `{}` and `{}`",
                            psm,
                            current.join(","),
                            label
                        );
                        match attribution {
                            GroupAttribution::Last => *current = vec![label.clone()],
                            GroupAttribution::First => {}
                            GroupAttribution::All => current.push(label.clone()),
                        }
                    }
                }
            }
        }

        PeptideGroups {
            groups,
            group_of_peptide,
        }
    }

    /// Labels attributed to an identification; empty for unlabeled ones
    pub fn labels_of(&self, psm: &str) -> &[String] {
        self.group_of_peptide
            .get(psm)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
