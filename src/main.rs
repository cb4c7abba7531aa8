//! DomainPair CLI
//!
//! Command-line entry point for inspecting class-directory datasets and
//! building balanced pair datasets for few-shot domain adaptation.

use std::path::PathBuf;

use anyhow::Result;
use burn::data::dataset::Dataset;
use clap::{Parser, Subcommand};
use tracing::info;

use domainpair::utils::logging::{init_logging, LogConfig};
use domainpair::{build_pair_datasets, ClassificationDataset, PairConfig};

/// Balanced pair dataset construction for few-shot domain adaptation
#[derive(Parser, Debug)]
#[command(name = "domainpair")]
#[command(version = "0.1.0")]
#[command(about = "Balanced-pair dataset construction for domain adaptation", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a class-directory dataset and print its statistics
    Inspect {
        /// Dataset root (one subdirectory per class)
        root: PathBuf,
    },

    /// Build the train/validation pair datasets and print their layout
    Pairs {
        /// Source domain root
        #[arg(short, long)]
        source: PathBuf,

        /// Target domain root
        #[arg(short, long)]
        target: PathBuf,

        /// Shot count: per-class cap on target samples
        #[arg(short, long, default_value = "6")]
        k: usize,

        /// Budget divisor for large datasets
        #[arg(long, default_value = "1")]
        pair_factor: usize,

        /// Split the source/target domains independently instead of
        /// splitting the pair index space (requires k >= 3)
        #[arg(long, default_value = "false")]
        independent: bool,

        /// Validation fraction for the constrained split
        #[arg(long, default_value = "0.25")]
        validation_split: f64,

        /// Build only the cross-domain groups with flipped labels
        #[arg(long, default_value = "false")]
        adversarial: bool,

        /// Random seed for reproducibility
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    init_logging(&log_config).map_err(|e| anyhow::anyhow!(e))?;

    match cli.command {
        Commands::Inspect { root } => inspect(&root),
        Commands::Pairs {
            source,
            target,
            k,
            pair_factor,
            independent,
            validation_split,
            adversarial,
            seed,
        } => {
            let config = PairConfig {
                k,
                pair_factor,
                constrained_validation: !independent,
                validation_split,
                adv_stage: adversarial,
                seed,
                ..PairConfig::default()
            };
            pairs(&source, &target, &config)
        }
    }
}

fn inspect(root: &PathBuf) -> Result<()> {
    let dataset = ClassificationDataset::new(root)?;

    println!("Dataset: {}", dataset.root_dir().display());
    println!(
        "{} samples across {} classes",
        dataset.len(),
        dataset.num_classes()
    );
    for (name, count) in dataset.class_names().iter().zip(dataset.class_counts()) {
        println!("  {:<30} {}", name, count);
    }
    Ok(())
}

fn pairs(source: &PathBuf, target: &PathBuf, config: &PairConfig) -> Result<()> {
    info!("Building pair datasets (k = {}, seed = {})", config.k, config.seed);
    let splits = build_pair_datasets(source, target, config)?;

    let groups = splits.train.groups();
    println!("Classes: {}", splits.class_names.join(", "));
    println!("Shared budget: {}", groups.budget());
    let caps = groups.capacities();
    println!(
        "Capacities: ss-same {}, st-same {}, ss-diff {}, st-diff {}",
        caps.source_same, caps.cross_same, caps.source_diff, caps.cross_diff
    );
    for g in 0..groups.num_groups() {
        println!("Group {}: {} pairs", g, groups.group(g).len());
    }
    println!("Train pairs: {}", splits.train.len());
    println!("Validation pairs: {}", splits.validation.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_pairs_defaults_to_constrained() {
        let cli = parse(&["domainpair", "pairs", "--source", "a", "--target", "b"]);
        match cli.command {
            Commands::Pairs { independent, .. } => assert!(!independent),
            _ => panic!("expected pairs subcommand"),
        }
    }

    #[test]
    fn test_independent_flag_selects_independent_split() {
        let cli = parse(&[
            "domainpair",
            "pairs",
            "--source",
            "a",
            "--target",
            "b",
            "--independent",
        ]);
        match cli.command {
            Commands::Pairs { independent, .. } => assert!(independent),
            _ => panic!("expected pairs subcommand"),
        }
    }
}
