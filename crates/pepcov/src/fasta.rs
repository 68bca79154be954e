use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};

/// A single entry of the reference proteome
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProteinRecord {
    pub id: String,
    pub sequence: String,
    pub gene: String,
    pub description: String,
}

impl ProteinRecord {
    pub fn new<S: Into<String>>(id: S, sequence: S) -> Self {
        ProteinRecord {
            id: id.into(),
            sequence: sequence.into(),
            gene: "N/A".into(),
            description: String::new(),
        }
    }
}

#[derive(Default)]
pub struct Fasta {
    pub proteins: Vec<ProteinRecord>,
}

impl Fasta {
    // Parse a string into a fasta database
    pub fn parse(contents: &str) -> Fasta {
        let mut proteins = Vec::new();
        let mut seen = FnvHashSet::default();
        let mut header: Option<&str> = None;
        let mut s = String::new();

        let mut push = |header: &str, sequence: String| {
            let record = parse_header(header, sequence);
            if seen.insert(record.id.clone()) {
                proteins.push(record);
            } else {
                log::warn!("duplicate protein `{}` in fasta, keeping first entry", record.id);
            }
        };

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(id) = line.strip_prefix('>') {
                if let Some(last) = header.take() {
                    push(last, std::mem::take(&mut s));
                }
                header = Some(id);
            } else if header.is_some() {
                s.push_str(line);
            }
        }

        if let Some(last) = header {
            push(last, s);
        }

        Fasta { proteins }
    }

    pub fn len(&self) -> usize {
        self.proteins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proteins.is_empty()
    }
}

/// UniProt style headers (`sp|Q99536|VAT1_HUMAN Synaptic vesicle ... OS=Homo sapiens GN=VAT1`)
/// are split into accession, gene and description. Anything else uses the first
/// whitespace-delimited token as the accession.
fn parse_header(header: &str, sequence: String) -> ProteinRecord {
    let (first, rest) = match header.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim()),
        None => (header, ""),
    };

    let id = match first.split('|').nth(1) {
        Some(acc) if !acc.is_empty() => acc,
        _ => first,
    };

    let gene = rest
        .split_ascii_whitespace()
        .find_map(|token| token.strip_prefix("GN="))
        .unwrap_or("N/A");

    let description = match rest.find(" OS=") {
        Some(ix) => &rest[..ix],
        None if rest.starts_with("OS=") => "",
        None => rest,
    };

    ProteinRecord {
        id: id.into(),
        sequence,
        gene: gene.into(),
        description: description.into(),
    }
}
