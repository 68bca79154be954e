use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context};
use clap::ArgMatches;
use pepcov_core::group::GroupAttribution;
use pepcov_core::modification::{validate_annotations, Color};
use pepcov_core::pipeline::CoverageJob;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Uppercase residue letters, modification brackets and masses
const PSM_PATTERN: &str = r"^[A-Z\[\]\d.]*$";

#[derive(Serialize, Clone, Debug)]
/// Actual job parameters - may include overrides or default values not set by user
pub struct Job {
    pub version: String,
    pub name: String,
    pub fasta: String,
    pub psms: BTreeMap<String, Vec<String>>,
    pub ptm_annotations: Option<BTreeMap<String, Color>>,
    pub structures: Vec<String>,
    pub group_attribution: GroupAttribution,
    pub report_proteins: Option<usize>,
    pub output_paths: Vec<String>,

    #[serde(skip_serializing)]
    pub output_directory: PathBuf,
}

impl Job {
    pub fn coverage_job(&self) -> CoverageJob {
        CoverageJob {
            psms: self.psms.clone(),
            ptm_annotations: self.ptm_annotations.clone(),
            attribution: self.group_attribution,
        }
    }
}

#[derive(Deserialize, Default, Debug)]
/// Input job parameters deserialized from JSON file
pub struct Input {
    /// Stem of the job file, used to name outputs
    #[serde(skip)]
    name: String,
    psms: BTreeMap<String, Vec<String>>,
    ptm_annotations: Option<BTreeMap<String, Color>>,
    fasta: Option<String>,
    structures: Option<Vec<String>>,
    group_attribution: Option<GroupAttribution>,
    report_proteins: Option<usize>,
    output_directory: Option<String>,
}

/// One protein id per line; blank lines and `#` comments are skipped
pub fn read_structures<S: AsRef<Path>>(path: S) -> anyhow::Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

impl Input {
    pub fn from_arguments(matches: &ArgMatches) -> anyhow::Result<Vec<Self>> {
        let structures = match matches.get_one::<String>("structures") {
            Some(path) => Some(
                read_structures(path)
                    .with_context(|| format!("Failed to read structures from `{path}`"))?,
            ),
            None => None,
        };

        let mut inputs = Vec::new();
        for path in matches.get_many::<String>("jobs").into_iter().flatten() {
            let mut input = Input::load(path)
                .with_context(|| format!("Failed to read job from `{path}`"))?;

            // Handle JSON configuration overrides
            if let Some(output_directory) = matches.get_one::<String>("output_directory") {
                log::trace!("overriding `output_directory` parameter.");
                input.output_directory = Some(output_directory.into());
            }
            if let Some(fasta) = matches.get_one::<String>("fasta") {
                log::trace!("overriding `fasta` parameter.");
                input.fasta = Some(fasta.into());
            }
            if let Some(structures) = &structures {
                log::trace!("overriding `structures` parameter.");
                input.structures = Some(structures.clone());
            }
            if let Some(report_proteins) = matches.get_one::<usize>("report-proteins") {
                input.report_proteins = Some(*report_proteins);
            }

            ensure!(
                input.fasta.is_some(),
                "`fasta` must be set in `{path}`. For more information try '--help'"
            );
            inputs.push(input);
        }

        ensure!(
            !inputs.is_empty(),
            "at least one job file must be given. For more information try '--help'"
        );
        Ok(inputs)
    }

    pub fn load<S: AsRef<Path>>(path: S) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut input: Input = pepcov_core::read_json(path)?;
        input.name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("pepcov")
            .into();
        Ok(input)
    }

    fn check_psms(psms: &BTreeMap<String, Vec<String>>) -> anyhow::Result<()> {
        ensure!(!psms.is_empty(), "`psms` must contain at least one group");

        let valid = Regex::new(PSM_PATTERN)?;
        for (label, peptides) in psms {
            ensure!(label.is_ascii(), "group label `{label}` is not ASCII");
            for psm in peptides {
                ensure!(
                    valid.is_match(psm),
                    "invalid peptide `{psm}` in group `{label}`: only uppercase residues and `[mass]` modifications are allowed"
                );
            }
        }
        Ok(())
    }

    pub fn build(self) -> anyhow::Result<Job> {
        Self::check_psms(&self.psms)?;

        if let Some(annotations) = &self.ptm_annotations {
            for label in annotations.keys() {
                ensure!(label.is_ascii(), "annotation label `{label}` is not ASCII");
            }
        }
        let ptm_annotations = validate_annotations(self.ptm_annotations);

        let fasta = self.fasta.context("`fasta` must be provided!")?;

        let mut structures = self.structures.unwrap_or_default();
        structures.sort_unstable();
        structures.dedup();

        if self.report_proteins == Some(0) {
            log::warn!("`report_proteins: 0` will write an empty report");
        }

        let output_directory = match self.output_directory {
            Some(path) => {
                let path = PathBuf::from(path);
                std::fs::create_dir_all(&path)
                    .with_context(|| format!("Failed to create `{}`", path.display()))?;
                path
            }
            None => std::env::current_dir()?,
        };

        Ok(Job {
            version: clap::crate_version!().into(),
            name: self.name,
            fasta,
            psms: self.psms,
            ptm_annotations,
            structures,
            group_attribution: self.group_attribution.unwrap_or_default(),
            report_proteins: self.report_proteins,
            output_paths: Vec::new(),
            output_directory,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(json: &str) -> Input {
        let mut input: Input = serde_json::from_str(json).unwrap();
        input.name = "test".into();
        input
    }

    #[test]
    fn defaults() {
        let job = input(r#"{"psms": {"unlabeled": ["AAA"]}, "fasta": "x.fasta"}"#)
            .build()
            .unwrap();
        assert_eq!(job.name, "test");
        assert_eq!(job.group_attribution, GroupAttribution::Last);
        assert!(job.ptm_annotations.is_none());
        assert!(job.structures.is_empty());
        assert!(job.report_proteins.is_none());
        assert_eq!(job.output_directory, std::env::current_dir().unwrap());
    }

    #[test]
    fn any_uppercase_residue() {
        let job = input(r#"{"psms": {"unlabeled": ["AAA", "BBB"], "g1": ["DDDE", "XZ[1]U"]}, "fasta": "x.fasta"}"#)
            .build()
            .unwrap();
        assert_eq!(job.psms["unlabeled"], vec!["AAA", "BBB"]);
        assert_eq!(job.psms["g1"], vec!["DDDE", "XZ[1]U"]);

        // empty groups are accepted, the core reports them
        assert!(input(r#"{"psms": {"g1": []}, "fasta": "x.fasta"}"#)
            .build()
            .is_ok());
    }

    #[test]
    fn full_job() {
        let job = input(
            r#"{
                "psms": {"g1": ["K[100]LVQR", "M[15.99]K"]},
                "ptm_annotations": {"K[100]": [255, 0, 0], "g1": [0, 0, 255], "[1]": [0, 0, 0]},
                "fasta": "x.fasta",
                "structures": ["P2", "P1", "P2"],
                "group_attribution": "all",
                "report_proteins": 10
            }"#,
        )
        .build()
        .unwrap();
        assert_eq!(job.group_attribution, GroupAttribution::All);
        assert_eq!(job.structures, vec!["P1", "P2"]);
        assert_eq!(job.report_proteins, Some(10));

        // a bracket with no residue is dropped from the registry
        let annotations = job.ptm_annotations.clone().unwrap();
        assert_eq!(annotations.len(), 2);
        assert_eq!(annotations["K[100]"], (255, 0, 0));

        let coverage = job.coverage_job();
        assert_eq!(coverage.attribution, GroupAttribution::All);
        assert_eq!(coverage.psms["g1"], vec!["K[100]LVQR", "M[15.99]K"]);
    }

    #[test]
    fn invalid_jobs() {
        // no groups
        assert!(input(r#"{"psms": {}, "fasta": "x"}"#).build().is_err());
        // lowercase and unknown residues
        assert!(input(r#"{"psms": {"g1": ["pepTIDE"]}, "fasta": "x"}"#)
            .build()
            .is_err());
        assert!(input(r#"{"psms": {"g1": ["PEP*"]}, "fasta": "x"}"#)
            .build()
            .is_err());
        // non-ASCII labels
        assert!(input(r#"{"psms": {"gruppe-ä": ["PEP"]}, "fasta": "x"}"#)
            .build()
            .is_err());
        assert!(
            input(r#"{"psms": {"g1": ["PEP"]}, "ptm_annotations": {"ä": [1, 2, 3]}, "fasta": "x"}"#)
                .build()
                .is_err()
        );
        // colors out of range fail to parse
        assert!(serde_json::from_str::<Input>(
            r#"{"psms": {"g1": ["PEP"]}, "ptm_annotations": {"g1": [256, 0, 0]}}"#
        )
        .is_err());
        // fasta is required
        assert!(input(r#"{"psms": {"g1": ["PEP"]}}"#).build().is_err());
        // psms are required
        assert!(serde_json::from_str::<Input>(r#"{"fasta": "x"}"#).is_err());
    }
}
