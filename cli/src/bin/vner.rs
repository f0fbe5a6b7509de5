//! Command line front end of `vner_eval`: corpus processing, dataset statistics, sampling, prompt
//! rendering and scoring of model outputs.

use ahash::AHashMap;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use either::Either;
use serde::Deserialize;
use serde_jsonlines::json_lines;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use vner_eval::corpus::process_corpus;
use vner_eval::dataset::sampler::{
    create_few_shot_examples, create_validation_set, save_validation_and_examples,
    FewShotExample, SamplingStrategy, DEFAULT_FEW_SHOT_EXAMPLES, DEFAULT_MAX_TEXT_LENGTH,
    DEFAULT_SEED, DEFAULT_VALIDATION_SIZE,
};
use vner_eval::dataset::stats::DatasetStatistics;
use vner_eval::dataset::{DatasetLoader, Record, Split};
use vner_eval::prompt::{build_prompt, PromptStyle};
use vner_eval::{
    parse_response, score_with, Comparison, EntityMap, EntityType, MatchPolicy, OutputScale,
    Reporter, ScoringConfig, ScoringConfigBuilder, SortBy, DEFAULT_THRESHOLD,
};

#[derive(Parser)]
#[command(name = "vner")]
#[command(about = "Evaluate LLM named entity extraction on Vietnamese news")]
#[command(version)]
struct Cli {
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert the raw ENAMEX-tagged corpus into processed JSON splits
    Process {
        /// Directory holding the raw `train`, `dev` and `test` directories
        #[arg(short, long)]
        raw_dir: PathBuf,

        /// Output directory of the processed splits
        #[arg(short, long, default_value = "data/processed")]
        out_dir: PathBuf,
    },

    /// Print statistics of one split, or of every split
    Stats {
        #[arg(short, long, default_value = "data/processed")]
        data_dir: PathBuf,

        #[arg(short, long)]
        split: Option<Split>,
    },

    /// Draw the validation subset and the few-shot examples
    Sample {
        #[arg(short, long, default_value = "data/processed")]
        data_dir: PathBuf,

        #[arg(short, long, default_value = "data/samples")]
        output_dir: PathBuf,

        #[arg(long, default_value_t = DEFAULT_VALIDATION_SIZE)]
        size: usize,

        /// Sampling strategy: random, diverse or balanced
        #[arg(long, default_value = "diverse")]
        strategy: SamplingStrategy,

        #[arg(long, default_value_t = DEFAULT_FEW_SHOT_EXAMPLES)]
        num_examples: usize,

        /// Accept any example with at least one entity
        #[arg(long)]
        no_quality_filter: bool,

        /// Maximum length, in characters, of a few-shot example
        #[arg(long, default_value_t = DEFAULT_MAX_TEXT_LENGTH)]
        max_text_length: usize,

        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },

    /// Render the prompt of a single record
    Prompt {
        #[arg(short, long, default_value = "data/processed")]
        data_dir: PathBuf,

        #[arg(short, long, default_value = "dev")]
        split: Split,

        /// Position of the record in the split
        #[arg(short, long, default_value_t = 0)]
        index: usize,

        /// Prompt style: zero_shot, few_shot, cot or instruct
        #[arg(long, default_value = "zero_shot")]
        style: PromptStyle,

        /// JSON file of few-shot examples
        #[arg(short, long)]
        examples: Option<PathBuf>,
    },

    /// Score a JSON-Lines file of model outputs against a split
    Score {
        /// JSON-Lines file of `{"id", "method", "response"}` objects
        predictions: PathBuf,

        #[arg(short, long, default_value = "data/processed")]
        data_dir: PathBuf,

        #[arg(short, long, default_value = "dev")]
        split: Split,

        /// Similarity threshold of the fuzzy matching
        #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
        threshold: f64,

        /// Match on case-folded exact strings instead
        #[arg(long)]
        exact: bool,

        /// Report scores in [0, 100]
        #[arg(long)]
        percentage: bool,

        /// Entity types to score (comma-separated, default: all)
        #[arg(long, value_delimiter = ',')]
        types: Option<Vec<EntityType>>,

        /// Order of the summary table: f1, accuracy or none
        #[arg(long, default_value = "f1")]
        sort_by: SortBy,

        /// Print a CSV-like report per method instead of the tables
        #[arg(long)]
        csv: bool,
    },
}

/// One line of a model output file.
#[derive(Debug, Deserialize)]
struct ModelOutput {
    #[serde(with = "either::serde_untagged")]
    id: Either<i64, String>,
    method: String,
    response: String,
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn read_outputs(path: &Path) -> Result<Vec<ModelOutput>> {
    json_lines::<ModelOutput, _>(path)
        .with_context(|| format!("Could not open {}", path.display()))?
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("Invalid model output in {}", path.display()))
}

fn read_examples(path: &Path) -> Result<Vec<FewShotExample>> {
    let file = File::open(path).with_context(|| format!("Could not open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Invalid few-shot examples in {}", path.display()))
}

/// Parses every output and scores each method against `records`, paired by id. A record without
/// a response from a method is scored as an empty prediction.
fn score_outputs(records: &[Record], outputs: &[ModelOutput], config: &ScoringConfig) -> Comparison {
    let mut methods: Vec<&str> = Vec::new();
    let mut parsed: AHashMap<&str, AHashMap<String, EntityMap>> = AHashMap::new();
    for output in outputs {
        let by_id = parsed.entry(output.method.as_str()).or_insert_with(|| {
            methods.push(output.method.as_str());
            AHashMap::new()
        });
        by_id.insert(output.id.to_string(), parse_response(&output.response));
    }

    let ground_truths: Vec<EntityMap> = records.iter().map(|r| r.ground_truth.clone()).collect();
    let mut comparison = Comparison::new();
    for method in methods {
        let Some(by_id) = parsed.get(method) else {
            continue;
        };
        let mut missing = 0;
        let predictions: Vec<EntityMap> = records
            .iter()
            .map(|record| match by_id.get(&record.id_key()) {
                Some(prediction) => prediction.clone(),
                None => {
                    missing += 1;
                    EntityMap::default()
                }
            })
            .collect();
        if missing > 0 {
            warn!(method, missing, "records without a response");
        }
        comparison.push(method, score_with(&predictions, &ground_truths, config));
    }
    comparison
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(log_level(cli.verbose).into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Process { raw_dir, out_dir } => {
            for (split, count, path) in process_corpus(&raw_dir, &out_dir)? {
                println!("{split}: {count} records -> {}", path.display());
            }
        }
        Commands::Stats { data_dir, split } => {
            let mut loader = DatasetLoader::new(data_dir);
            let splits = match split {
                Some(split) => vec![split],
                None => Split::all_splits(),
            };
            for split in splits {
                let records = loader.load_split(split)?;
                println!("== {split} ==");
                println!("{}", DatasetStatistics::from_records(records));
            }
        }
        Commands::Sample {
            data_dir,
            output_dir,
            size,
            strategy,
            num_examples,
            no_quality_filter,
            max_text_length,
            seed,
        } => {
            let mut loader = DatasetLoader::new(data_dir);
            let validation = create_validation_set(loader.load_split(Split::Dev)?, size, strategy, seed);
            let examples = create_few_shot_examples(
                loader.load_split(Split::Train)?,
                num_examples,
                !no_quality_filter,
                max_text_length,
                seed,
            );
            if examples.len() < num_examples {
                warn!(
                    requested = num_examples,
                    found = examples.len(),
                    "not enough few-shot candidates"
                );
            }
            let (validation_path, examples_path) =
                save_validation_and_examples(&output_dir, &validation, &examples)?;
            println!(
                "{} validation records -> {}",
                validation.len(),
                validation_path.display()
            );
            println!("{} examples -> {}", examples.len(), examples_path.display());
        }
        Commands::Prompt {
            data_dir,
            split,
            index,
            style,
            examples,
        } => {
            let examples = match examples {
                Some(path) => read_examples(&path)?,
                None => Vec::new(),
            };
            let mut loader = DatasetLoader::new(data_dir);
            let records = loader.load_split(split)?;
            let Some(record) = records.get(index) else {
                bail!("{split} has {} records, no record at index {index}", records.len());
            };
            println!("{}", build_prompt(style, &record.text, &examples));
        }
        Commands::Score {
            predictions,
            data_dir,
            split,
            threshold,
            exact,
            percentage,
            types,
            sort_by,
            csv,
        } => {
            let mut builder = ScoringConfigBuilder::new();
            builder = if exact {
                builder.policy(MatchPolicy::Exact)
            } else {
                builder.threshold(threshold)
            };
            if percentage {
                builder = builder.scale(OutputScale::Percentage);
            }
            if let Some(types) = types {
                builder = builder.entity_types(types);
            }
            let config = builder.build();
            info!(%split, "scoring with {}", config);

            let mut loader = DatasetLoader::new(data_dir);
            let records = loader.load_split(split)?;
            let outputs = read_outputs(&predictions)?;
            let comparison = score_outputs(records, &outputs, &config);
            if comparison.is_empty() {
                bail!("No model output found in {}", predictions.display());
            }

            if csv {
                for (method, report) in comparison.sorted(sort_by) {
                    println!("# {method}");
                    print!("{}", Reporter::from(report));
                }
            } else {
                for (method, report) in comparison.sorted(sort_by) {
                    println!("{}", report.display_as(method));
                }
                println!("{}", comparison.summary(sort_by));
                println!("{}", comparison.detailed(config.entity_types()));
            }
        }
    }
    Ok(())
}
