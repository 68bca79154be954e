use std::{collections::BTreeMap, fmt::Display};

use serde::{Deserialize, Serialize};

/// Display color attached to a modification or group label
pub type Color = (u8, u8, u8);

/// A single modified residue inside a peptide identification
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Modification {
    /// Full token text, e.g. `C[143]`. This is the key used in the annotation registry
    pub label: String,
    /// Position of the modified residue in the bare (markup-free) sequence
    pub offset: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct NormalizedPeptide {
    pub sequence: String,
    pub modifications: Vec<Modification>,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModificationError {
    /// `[` at the given byte position is not preceded by a residue
    MissingResidue(usize),
    /// `[` at the given byte position is never closed
    Unterminated(usize),
    /// Stray `]` at the given byte position
    Unbalanced(usize),
    /// Bracket content is not a mass
    InvalidMass(String),
}

impl Display for ModificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModificationError::MissingResidue(ix) => {
                write!(f, "modification at position {} has no residue", ix)
            }
            ModificationError::Unterminated(ix) => {
                write!(f, "unterminated modification at position {}", ix)
            }
            ModificationError::Unbalanced(ix) => write!(f, "unbalanced `]` at position {}", ix),
            ModificationError::InvalidMass(s) => write!(f, "invalid modification mass `{}`", s),
        }
    }
}

impl std::error::Error for ModificationError {}

/// `digits` or `digits.digits`
fn is_mass(s: &[u8]) -> bool {
    let (int, frac) = match s.iter().position(|&b| b == b'.') {
        Some(ix) => (&s[..ix], Some(&s[ix + 1..])),
        None => (s, None),
    };
    let digits = |x: &[u8]| !x.is_empty() && x.iter().all(u8::is_ascii_digit);
    digits(int) && frac.map(digits).unwrap_or(true)
}

/// Strip inline modification markup from a peptide identification.
///
/// The peptide is scanned once, left to right. Residues are copied into the bare
/// sequence; a `[mass]` block attaches to the residue written immediately before
/// it, so the recorded offset is already expressed in bare-sequence coordinates:
/// `A[100]BC[50]D` yields `ABCD` with modifications at offsets 0 and 2.
pub fn normalize(psm: &str) -> Result<NormalizedPeptide, ModificationError> {
    let bytes = psm.as_bytes();
    let mut sequence = Vec::with_capacity(bytes.len());
    let mut modifications = Vec::new();

    // Bare offset of the most recent residue, cleared once a modification
    // has been attached to it
    let mut residue: Option<usize> = None;

    let mut ix = 0;
    while ix < bytes.len() {
        match bytes[ix] {
            b'[' => {
                let offset = match residue.take() {
                    Some(offset) if ix > 0 && bytes[ix - 1].is_ascii_alphabetic() => offset,
                    _ => return Err(ModificationError::MissingResidue(ix)),
                };
                let close = bytes[ix + 1..]
                    .iter()
                    .position(|&b| b == b']')
                    .map(|p| ix + 1 + p)
                    .ok_or(ModificationError::Unterminated(ix))?;

                let mass = &bytes[ix + 1..close];
                if !is_mass(mass) {
                    return Err(ModificationError::InvalidMass(psm[ix + 1..close].into()));
                }

                modifications.push(Modification {
                    label: psm[ix - 1..=close].into(),
                    offset,
                });
                ix = close + 1;
            }
            b']' => return Err(ModificationError::Unbalanced(ix)),
            b => {
                residue = Some(sequence.len());
                sequence.push(b);
                ix += 1;
            }
        }
    }

    // Only ASCII brackets were removed, so the remainder is still valid UTF-8
    let sequence = String::from_utf8(sequence).unwrap_or_default();
    Ok(NormalizedPeptide {
        sequence,
        modifications,
    })
}

/// Remove every bracketed span from `psm` without interpreting it. Used as a
/// fallback when the markup cannot be parsed, so the identification still
/// contributes coverage.
pub fn strip_markup(psm: &str) -> String {
    let mut depth = 0usize;
    psm.chars()
        .filter(|&c| match c {
            '[' => {
                depth += 1;
                false
            }
            ']' => {
                depth = depth.saturating_sub(1);
                false
            }
            _ => depth == 0,
        })
        .collect()
}

/// Normalize a peptide identification, falling back to a markup-free sequence
/// with no modifications if the markup is malformed
pub fn normalize_lossy(psm: &str) -> NormalizedPeptide {
    match normalize(psm) {
        Ok(peptide) => peptide,
        Err(e) => {
            log::warn!("ignoring modifications of `{}`: {}", psm, e);
            NormalizedPeptide {
                sequence: strip_markup(psm),
                modifications: Vec::new(),
            }
        }
    }
}

/// Check user-supplied annotation labels. Labels containing brackets must be a
/// single modification token (`K[100]`); anything else is treated as a group
/// label. Invalid entries are logged and dropped.
pub fn validate_annotations(
    input: Option<BTreeMap<String, Color>>,
) -> Option<BTreeMap<String, Color>> {
    let input = input?;
    let mut output = BTreeMap::new();
    for (label, color) in input {
        if label.is_empty() {
            log::error!("Skipping invalid annotation label: empty");
            continue;
        }
        if label.contains(|c: char| c == '[' || c == ']') {
            match normalize(&label) {
                Ok(peptide)
                    if peptide.sequence.len() == 1
                        && peptide.modifications.len() == 1
                        && peptide.modifications[0].label == label => {}
                Ok(_) => {
                    log::error!(
                        "Skipping invalid annotation label: {} is not a single modified residue",
                        label
                    );
                    continue;
                }
                Err(e) => {
                    log::error!("Skipping invalid annotation label {}: {}", label, e);
                    continue;
                }
            }
        }
        output.insert(label, color);
    }
    Some(output)
}
