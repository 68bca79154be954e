use clap::{value_parser, Arg, Command, ValueHint};
use pepcov_cli::input::Input;
use pepcov_cli::runner::Runner;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::default()
        .filter_level(log::LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("PEPCOV_LOG", "error,pepcov=info"))
        .init();

    let matches = Command::new("pepcov")
        .version(clap::crate_version!())
        .author(clap::crate_authors!())
        .about("Map peptide identifications and their modifications onto a proteome")
        .arg(
            Arg::new("jobs")
                .required(true)
                .num_args(1..)
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help("Paths to job files (JSON). Outputs are named after each file")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("fasta")
                .short('f')
                .long("fasta")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help(
                    "Path to FASTA proteome. Overrides the FASTA file \
                     specified in every job file.",
                )
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("output_directory")
                .short('o')
                .long("output_directory")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help(
                    "Path where coverage results will be written. \
                     Overrides the directory specified in every job file.",
                )
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("structures")
                .short('s')
                .long("structures")
                .value_parser(clap::builder::NonEmptyStringValueParser::new())
                .help(
                    "File listing protein ids with a known 3D structure, one per line. \
                     Overrides the structures listed in every job file.",
                )
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("batch-size")
                .long("batch-size")
                .value_parser(value_parser!(u16).range(1..))
                .help("Number of jobs to process in parallel (default = # of CPUs/2)")
                .value_hint(ValueHint::Other),
        )
        .arg(
            Arg::new("report-proteins")
                .long("report-proteins")
                .value_parser(value_parser!(usize))
                .help("Only report the N best covered proteins in the TSV output")
                .value_hint(ValueHint::Other),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Written by {author-with-newline}Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    let parallel = matches
        .get_one::<u16>("batch-size")
        .copied()
        .unwrap_or_else(|| num_cpus::get() as u16 / 2)
        .max(1) as usize;

    let jobs = Input::from_arguments(&matches)?
        .into_iter()
        .map(Input::build)
        .collect::<anyhow::Result<Vec<_>>>()?;

    let finished = Runner::new(jobs)?.run(parallel)?;
    println!("{}", serde_json::to_string_pretty(&finished)?);

    Ok(())
}
