pub mod automaton;
pub mod coverage;
pub mod digest;
pub mod fasta;
pub mod group;
pub mod modification;
pub mod peptide;
pub mod pipeline;
pub mod proteome;
pub mod ranking;
pub mod result;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Json(serde_json::Error),
    Automaton(aho_corasick::BuildError),
    /// A match reported by the automaton does not spell out its pattern.
    /// Coverage computed from such a match would be meaningless, so the
    /// whole job is aborted.
    MatchIntegrity {
        start: usize,
        end: usize,
        pattern: String,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => e.fmt(f),
            Self::Json(e) => e.fmt(f),
            Self::Automaton(e) => e.fmt(f),
            Self::MatchIntegrity {
                start,
                end,
                pattern,
            } => write!(
                f,
                "matched span {}..={} does not equal peptide `{}`",
                start, end, pattern
            ),
        }
    }
}

impl std::error::Error for Error {}

pub fn read_fasta<S: AsRef<std::path::Path>>(path: S) -> Result<fasta::Fasta, Error> {
    let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
    Ok(fasta::Fasta::parse(&contents))
}

pub fn read_json<S, T>(path: S) -> Result<T, Error>
where
    S: AsRef<std::path::Path>,
    T: for<'de> serde::Deserialize<'de>,
{
    let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
    serde_json::from_str(&contents).map_err(Error::Json)
}
