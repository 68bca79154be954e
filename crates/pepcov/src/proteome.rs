use std::ops::Range;

use crate::fasta::ProteinRecord;

/// Character placed between two protein sequences in the concatenated proteome
pub const SEPARATOR: u8 = b'|';

/// Separator positions bracketed by the virtual boundaries `0` and the total
/// length. With `n` proteins there are `n - 1` real separators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeparatorIndex(Vec<usize>);

impl SeparatorIndex {
    pub fn positions(&self) -> &[usize] {
        &self.0
    }

    /// Per-protein coordinate windows, in protein order.
    ///
    /// The leading boundary is virtual: the first protein starts at 0. Every
    /// other protein starts one past the separator that precedes it.
    pub fn windows(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.0.windows(2).enumerate().map(|(ix, w)| match ix {
            0 => w[0]..w[1],
            _ => w[0] + 1..w[1],
        })
    }
}

/// All protein sequences of a proteome joined by [`SEPARATOR`]
#[derive(Clone, Debug)]
pub struct ConcatenatedSequence {
    text: String,
    separators: SeparatorIndex,
}

impl ConcatenatedSequence {
    pub fn new(proteins: &[ProteinRecord]) -> Self {
        let total = proteins.iter().map(|p| p.sequence.len() + 1).sum::<usize>();
        let mut text = String::with_capacity(total);
        let mut bounds = Vec::with_capacity(proteins.len() + 1);
        bounds.push(0);

        for (ix, protein) in proteins.iter().enumerate() {
            if ix > 0 {
                bounds.push(text.len());
                text.push(SEPARATOR as char);
            }
            if protein.sequence.as_bytes().contains(&SEPARATOR) {
                log::warn!(
                    "protein `{}` contains the separator character `{}`",
                    protein.id,
                    SEPARATOR as char
                );
            }
            text.push_str(&protein.sequence);
        }
        bounds.push(text.len());

        ConcatenatedSequence {
            text,
            separators: SeparatorIndex(bounds),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn separators(&self) -> &SeparatorIndex {
        &self.separators
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proteins(seqs: &[&str]) -> Vec<ProteinRecord> {
        seqs.iter()
            .enumerate()
            .map(|(ix, s)| ProteinRecord::new(format!("P{}", ix + 1), s.to_string()))
            .collect()
    }

    #[test]
    fn windows_cover_each_protein() {
        let proteins = proteins(&["AAABBBCCC", "DDDEEEFFF", "MK"]);
        let seq = ConcatenatedSequence::new(&proteins);
        assert_eq!(seq.as_str(), "AAABBBCCC|DDDEEEFFF|MK");
        assert_eq!(seq.separators().positions(), &[0, 9, 19, 22]);

        let windows = seq.separators().windows().collect::<Vec<_>>();
        assert_eq!(windows, vec![0..9, 10..19, 20..22]);
        for (window, protein) in windows.into_iter().zip(&proteins) {
            assert_eq!(&seq.as_str()[window], protein.sequence);
        }
    }

    #[test]
    fn empty_proteins() {
        let proteins = proteins(&["", "MK", ""]);
        let seq = ConcatenatedSequence::new(&proteins);
        assert_eq!(seq.as_str(), "|MK|");
        // separator count is protein count - 1
        assert_eq!(seq.separators().positions().len(), proteins.len() + 1);
        let windows = seq.separators().windows().collect::<Vec<_>>();
        assert_eq!(windows, vec![0..0, 1..3, 4..4]);

        let seq = ConcatenatedSequence::new(&[]);
        assert!(seq.is_empty());
        assert_eq!(seq.separators().positions(), &[0, 0]);
    }
}
