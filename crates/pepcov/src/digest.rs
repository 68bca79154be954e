//! Content addressing of coverage results.
//!
//! Two jobs that produce bit-identical findings for a protein must produce the
//! same digest, so that storage can keep a single copy. The digest is SHA-256
//! over a canonical JSON form of the result: fields are emitted in
//! lexicographic key order, the PTM map is ordered, and the content hash
//! itself is left out. Coverage arrays are sums, so the digest does not depend
//! on the order in which identifications were submitted.

use std::collections::BTreeMap;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::result::CoverageResult;
use crate::Error;

/// Field order here is the canonical key order: keep it sorted
#[derive(Serialize)]
struct Canonical<'a> {
    coverage: f64,
    description: &'a str,
    gene: &'a str,
    has_pdb: bool,
    protein_id: &'a str,
    ptms: &'a BTreeMap<String, Vec<usize>>,
    sequence: &'a str,
    sequence_coverage: &'a [u32],
}

impl<'a> From<&'a CoverageResult> for Canonical<'a> {
    fn from(result: &'a CoverageResult) -> Self {
        Canonical {
            coverage: result.coverage,
            description: &result.description,
            gene: &result.gene,
            has_pdb: result.has_pdb,
            protein_id: &result.protein_id,
            ptms: &result.ptms,
            sequence: &result.sequence,
            sequence_coverage: &result.sequence_coverage,
        }
    }
}

/// Canonical serialization of every field but `content_hash`
pub fn canonical_bytes(result: &CoverageResult) -> Result<Vec<u8>, Error> {
    serde_json::to_vec(&Canonical::from(result)).map_err(Error::Json)
}

/// Lowercase hex SHA-256 of [`canonical_bytes`]
pub fn content_hash(result: &CoverageResult) -> Result<String, Error> {
    let mut hasher = Sha256::new();
    hasher.update(canonical_bytes(result)?);
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fasta::ProteinRecord;

    fn example(ptms: Vec<(&str, Vec<usize>)>) -> CoverageResult {
        let protein = ProteinRecord {
            id: "P1".into(),
            sequence: "MKLV".into(),
            gene: "EX1".into(),
            description: "Example protein".into(),
        };
        let ptms = ptms
            .into_iter()
            .map(|(label, positions)| (label.to_string(), positions))
            .collect();
        CoverageResult::new(&protein, vec![0, 1, 1, 0], ptms, true).unwrap()
    }

    #[test]
    fn canonical_form() {
        let result = example(vec![("g1", vec![1, 2]), ("K[100]", vec![1])]);
        let bytes = canonical_bytes(&result).unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{"coverage":0.5,"description":"Example protein","gene":"EX1","has_pdb":true,"protein_id":"P1","ptms":{"K[100]":[1],"g1":[1,2]},"sequence":"MKLV","sequence_coverage":[0,1,1,0]}"#
        );
        assert_eq!(
            result.content_hash,
            "7af1d2becd2c561934607de5a3ffa54b71f1616070154d8e59f55fcfbe4e43ec"
        );
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let a = example(vec![("g1", vec![1, 2]), ("K[100]", vec![1])]);
        let b = example(vec![("K[100]", vec![1]), ("g1", vec![1, 2])]);
        assert_eq!(a.content_hash, b.content_hash);
    }

    #[test]
    fn any_field_changes_the_digest() {
        let base = example(vec![("K[100]", vec![1])]);

        let mut other = base.clone();
        other.has_pdb = false;
        assert_ne!(content_hash(&other).unwrap(), base.content_hash);

        let mut other = base.clone();
        other.sequence_coverage[1] = 2;
        assert_ne!(content_hash(&other).unwrap(), base.content_hash);

        let mut other = base.clone();
        other.ptms.clear();
        assert_ne!(content_hash(&other).unwrap(), base.content_hash);

        // The stored digest itself is not part of the content
        let mut other = base.clone();
        other.content_hash = "stale".into();
        assert_eq!(content_hash(&other).unwrap(), base.content_hash);
    }
}
