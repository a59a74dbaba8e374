use anyhow::Result;
use clap::{Arg, ArgMatches, Command, ValueHint};
use log::LevelFilter;
use std::path::PathBuf;

use vml_cli::train::input::TrainConfig;
use vml_cli::train::trainer;
use vml_models::io::{read_dataset, write_dataset};

const MODEL_NAMES: [&str; 11] = [
    "perceptron",
    "polynomial_regression",
    "bayesian_linear_regression",
    "softmax_regression",
    "knn",
    "kmeans",
    "gaussian_mixture",
    "lvq1",
    "naive_bayes",
    "decision_tree",
    "svm",
];

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("VML_LOG", "error,vml=info"))
        .init();

    let matches = Command::new("vml")
        .version(clap::crate_version!())
        .about("VML - train classic machine-learning models on labeled 2D datasets")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("train")
                .about("Train a model on a labeled dataset and write its predictions")
                .arg(
                    Arg::new("config")
                        .help("Path to the JSON training configuration file")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("train_data")
                        .short('d')
                        .long("data")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Path to the training data (*.csv or *.json). \
                             Overrides the training data specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("File path that the predictions CSV will be written to.")
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("model")
                        .short('m')
                        .long("model")
                        .help(
                            "Model to train with its default hyperparameters. \
                             Overrides the model specified in the configuration file.",
                        )
                        .value_parser(MODEL_NAMES),
                )
                .arg(
                    Arg::new("steps")
                        .short('s')
                        .long("steps")
                        .help("Number of training steps for iterative models.")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed of the first restart; restart i uses seed + i.")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("restarts")
                        .short('r')
                        .long("restarts")
                        .help("Number of independent restarts, trained in parallel.")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert a labeled dataset between the CSV and JSON formats")
                .arg(
                    Arg::new("input")
                        .help("Dataset to read (*.csv or *.json)")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output")
                        .help("Dataset to write (*.csv or *.json)")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                ),
        )
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
        .get_matches();

    match matches.subcommand() {
        Some(("train", sub_m)) => handle_train(sub_m),
        Some(("convert", sub_m)) => handle_convert(sub_m),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let Some(config_path) = matches.get_one::<PathBuf>("config") else {
        eprintln!("[VML::Train] No config file provided; printing a template config.");
        println!("{}", serde_json::to_string_pretty(&TrainConfig::default())?);
        return Ok(());
    };
    log::info!("[VML::Train] Training from config: {:?}", config_path);

    let params = TrainConfig::from_arguments(config_path, matches)?;

    match trainer::run_training(&params) {
        Ok(_) => Ok(()),
        Err(e) => {
            log::error!("Training failed: {:#}", e);
            std::process::exit(1)
        }
    }
}

fn handle_convert(matches: &ArgMatches) -> Result<()> {
    let input: &PathBuf = matches
        .get_one("input")
        .ok_or_else(|| anyhow::anyhow!("Missing input path"))?;
    let output: &PathBuf = matches
        .get_one("output")
        .ok_or_else(|| anyhow::anyhow!("Missing output path"))?;

    let data = read_dataset(input)?;
    write_dataset(output, &data)?;
    log::info!(
        "[VML::Convert] Wrote {} from {:?} to {:?}",
        data.summary(),
        input,
        output
    );
    Ok(())
}
