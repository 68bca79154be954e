use std::time::Instant;

use anyhow::{ensure, Context};
use fnv::{FnvHashMap, FnvHashSet};
use log::info;
use pepcov_core::fasta::ProteinRecord;
use pepcov_core::result::{site_counts, CoverageMap};
use rayon::prelude::*;

use crate::input::Job;

pub struct Runner {
    pub jobs: Vec<Job>,
    /// FASTA path -> proteins, each distinct proteome loaded once and shared
    /// read-only by every job that names it
    proteomes: FnvHashMap<String, Vec<ProteinRecord>>,
    start: Instant,
}

impl Runner {
    pub fn new(jobs: Vec<Job>) -> anyhow::Result<Self> {
        let start = Instant::now();

        let mut names = FnvHashSet::default();
        for job in &jobs {
            ensure!(
                names.insert((job.output_directory.clone(), job.name.as_str())),
                "more than one job named `{}` writes to `{}`",
                job.name,
                job.output_directory.display()
            );
        }

        let mut proteomes = FnvHashMap::default();
        for job in &jobs {
            if proteomes.contains_key(&job.fasta) {
                continue;
            }
            let fasta = pepcov_core::read_fasta(&job.fasta)
                .with_context(|| format!("Failed to read FASTA from `{}`", job.fasta))?;
            if fasta.is_empty() {
                log::warn!("no proteins found in `{}`", job.fasta);
            }
            info!(
                "loaded {} proteins from `{}` in {:#?}",
                fasta.len(),
                job.fasta,
                start.elapsed()
            );
            proteomes.insert(job.fasta.clone(), fasta.proteins);
        }

        Ok(Self {
            jobs,
            proteomes,
            start,
        })
    }

    /// Compute coverage for a single job. Nothing is written.
    pub fn coverage(&self, job: &Job) -> anyhow::Result<CoverageMap> {
        let proteins = self
            .proteomes
            .get(&job.fasta)
            .with_context(|| format!("proteome `{}` was not loaded", job.fasta))?;
        let structures = job.structures.iter().cloned().collect::<FnvHashSet<_>>();
        job.coverage_job()
            .run(proteins, &structures)
            .with_context(|| format!("job `{}` failed", job.name))
    }

    fn process_job(&self, mut job: Job) -> anyhow::Result<Job> {
        let start = Instant::now();
        let results = self.coverage(&job)?;

        job.output_paths.push(self.write_json(&job, &results)?);
        job.output_paths.push(self.write_tsv(&job, &results)?);
        self.write_job(&mut job)?;

        for (label, sites) in site_counts(&results) {
            info!("`{}`: {} sites marked `{}`", job.name, sites, label);
        }
        info!(
            "`{}`: {} proteins covered in {:#?}",
            job.name,
            results.len(),
            start.elapsed()
        );
        Ok(job)
    }

    /// Run every job, `parallel` at a time. Each job runs start to finish on
    /// one worker thread.
    pub fn run(mut self, parallel: usize) -> anyhow::Result<Vec<Job>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(parallel.max(1))
            .build()?;

        let jobs = std::mem::take(&mut self.jobs);
        let finished = pool.install(|| {
            jobs.into_par_iter()
                .map(|job| self.process_job(job))
                .collect::<anyhow::Result<Vec<_>>>()
        })?;

        info!(
            "finished {} jobs in {}s",
            finished.len(),
            self.start.elapsed().as_secs()
        );
        Ok(finished)
    }
}
