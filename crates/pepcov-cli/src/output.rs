use std::path::{Path, PathBuf};

use anyhow::Context;
use pepcov_core::ranking::top_by_coverage;
use pepcov_core::result::{nonzero_positions, CoverageMap, CoverageResult};

use crate::input::Job;
use crate::runner::Runner;

/// Compact ascending 0-based positions into 1-based ranges: `1-3,5-6,8`
pub fn compact_ranges(positions: &[usize]) -> String {
    let mut out = String::new();
    let mut iter = positions.iter().copied().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while let Some(next) = iter.next_if(|&next| next == end + 1) {
            end = next;
        }

        if !out.is_empty() {
            out.push(',');
        }
        out.push_str(itoa::Buffer::new().format(start + 1));
        if end > start {
            out.push('-');
            out.push_str(itoa::Buffer::new().format(end + 1));
        }
    }
    out
}

impl Runner {
    // Create a path for `<job>.<suffix>` in the job's output directory
    fn make_path(&self, job: &Job, suffix: &str) -> PathBuf {
        job.output_directory.join(format!("{}.{}", job.name, suffix))
    }

    fn write_bytes(path: &Path, bytes: Vec<u8>) -> anyhow::Result<String> {
        std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write `{}`", path.display()))?;
        Ok(path.display().to_string())
    }

    pub fn write_json(&self, job: &Job, results: &CoverageMap) -> anyhow::Result<String> {
        let path = self.make_path(job, "coverage.json");
        let bytes = serde_json::to_vec_pretty(results)?;
        Self::write_bytes(&path, bytes)
    }

    pub fn serialize_result(&self, result: &CoverageResult) -> csv::ByteRecord {
        let covered = nonzero_positions(&result.sequence_coverage);
        let ptms = result
            .ptms
            .iter()
            .map(|(label, positions)| format!("{}={}", label, compact_ranges(positions)))
            .collect::<Vec<_>>()
            .join(";");

        let mut record = csv::ByteRecord::new();
        record.push_field(result.protein_id.as_bytes());
        record.push_field(result.gene.as_bytes());
        record.push_field(result.description.as_bytes());
        record.push_field(ryu::Buffer::new().format(result.coverage).as_bytes());
        record.push_field(itoa::Buffer::new().format(covered.len()).as_bytes());
        record.push_field(compact_ranges(&covered).as_bytes());
        record.push_field(ptms.as_bytes());
        let has_pdb = if result.has_pdb { "true" } else { "false" };
        record.push_field(has_pdb.as_bytes());
        record.push_field(result.content_hash.as_bytes());
        record
    }

    /// Proteins ranked by coverage, truncated to `report_proteins` when set
    pub fn write_tsv(&self, job: &Job, results: &CoverageMap) -> anyhow::Result<String> {
        let path = self.make_path(job, "coverage.tsv");

        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(vec![]);

        let headers = csv::ByteRecord::from(vec![
            "protein_id",
            "gene",
            "description",
            "coverage",
            "covered_residues",
            "covered_ranges",
            "ptms",
            "has_pdb",
            "content_hash",
        ]);

        wtr.write_byte_record(&headers)?;
        for result in top_by_coverage(results.values(), job.report_proteins) {
            wtr.write_byte_record(&self.serialize_result(result))?;
        }

        wtr.flush()?;
        let bytes = wtr.into_inner()?;
        Self::write_bytes(&path, bytes)
    }

    /// Resolved job parameters, listing every output including this file
    pub fn write_job(&self, job: &mut Job) -> anyhow::Result<()> {
        let path = self.make_path(job, "job.json");
        job.output_paths.push(path.display().to_string());
        let bytes = serde_json::to_vec_pretty(&*job)?;
        Self::write_bytes(&path, bytes)?;
        Ok(())
    }
}
