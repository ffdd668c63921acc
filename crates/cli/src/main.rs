use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use data_loader::{DEFAULT_TEST_FRACTION, SCORE_SCALE};
use predictor::{parse_budget, FeatureImportance, MovieModel, PipelineConfig};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// MARP - Movie Audience Rating Predictor
#[derive(Parser)]
#[command(name = "marp")]
#[command(about = "Predict a movie's audience score from its metadata", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train on the IMDB dataset and report the held-out R² score
    Train {
        #[command(flatten)]
        training: TrainingArgs,

        /// Write the fitted model to this JSON file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Number of features to list in the importance report
        #[arg(long, default_value = "10")]
        top: usize,
    },

    /// Predict the audience score of one movie
    Predict {
        #[command(flatten)]
        source: ModelSource,

        /// Release date, YYYY-MM-DD
        #[arg(long)]
        date: String,

        /// Genres, comma separated (e.g. "Comedy, Action")
        #[arg(long, default_value = "")]
        genre: String,

        /// Cast in billing order, comma separated
        #[arg(long, default_value = "")]
        cast: String,

        /// Original language (e.g. English)
        #[arg(long)]
        lang: String,

        /// Budget; "," and "_" separators are allowed
        #[arg(long)]
        budget: String,

        /// ISO 3166 country code (e.g. US, AU, KR)
        #[arg(long)]
        country: String,
    },

    /// Show the most important features of a model
    Importance {
        #[command(flatten)]
        source: ModelSource,

        /// Number of features to list
        #[arg(long, default_value = "10")]
        top: usize,
    },
}

#[derive(Args)]
struct TrainingArgs {
    /// Path to the IMDB movies CSV
    #[arg(short, long, default_value = "data/imdb_movies.csv")]
    data: PathBuf,

    /// Fraction of the most recent movies held out for testing
    #[arg(long, default_value_t = DEFAULT_TEST_FRACTION)]
    test_fraction: f64,

    /// JSON file with pipeline and booster settings
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Either a saved model or the data to train one on.
#[derive(Args)]
struct ModelSource {
    /// Load a model saved by `marp train --save` instead of training
    #[arg(long)]
    model: Option<PathBuf>,

    #[command(flatten)]
    training: TrainingArgs,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            training,
            save,
            top,
        } => handle_train(&training, save, top)?,
        Commands::Predict {
            source,
            date,
            genre,
            cast,
            lang,
            budget,
            country,
        } => handle_predict(&source, &date, &genre, &cast, &lang, &budget, &country)?,
        Commands::Importance { source, top } => handle_importance(&source, top)?,
    }

    Ok(())
}

/// Handle the 'train' command
fn handle_train(training: &TrainingArgs, save: Option<PathBuf>, top: usize) -> Result<()> {
    let model = train_model(training)?;

    println!(
        "{} Test R² score: {}",
        "✓".green(),
        format!("{:.4}", model.test_score()?).bold()
    );
    print_importance(model.feature_importance()?, top);

    if let Some(path) = save {
        model
            .save(&path)
            .with_context(|| format!("Failed to save model to {}", path.display()))?;
        println!("{} Saved model to {}", "✓".green(), path.display());
    }
    Ok(())
}

/// Handle the 'predict' command
fn handle_predict(
    source: &ModelSource,
    date: &str,
    genre: &str,
    cast: &str,
    lang: &str,
    budget: &str,
    country: &str,
) -> Result<()> {
    let budget = match parse_budget(budget) {
        Ok(budget) => budget,
        Err(err) => bail!("{}. Example: --budget 75,000,000", err),
    };
    let model = obtain_model(source)?;

    let score = match model.inference(
        date,
        &split_list(genre),
        &split_list(cast),
        lang,
        budget,
        country,
    ) {
        Ok(score) => score,
        Err(err) if err.is_validation() => bail!("{}. Example: --date 2023-03-02", err),
        Err(err) => return Err(err).context("Inference failed"),
    };

    println!(
        "Your movie will have an estimated audience/user score of: {}",
        format!("{:.1}", score * SCORE_SCALE).bold().green()
    );
    Ok(())
}

/// Handle the 'importance' command
fn handle_importance(source: &ModelSource, top: usize) -> Result<()> {
    let model = obtain_model(source)?;
    print_importance(model.feature_importance()?, top);
    Ok(())
}

/// Load the saved model if one was given, otherwise train a fresh one.
fn obtain_model(source: &ModelSource) -> Result<MovieModel> {
    match &source.model {
        Some(path) => {
            let start = Instant::now();
            let model = MovieModel::load(path)
                .with_context(|| format!("Failed to load model from {}", path.display()))?;
            info!("Loaded model in {:?}", start.elapsed());
            Ok(model)
        }
        None => train_model(&source.training),
    }
}

fn train_model(training: &TrainingArgs) -> Result<MovieModel> {
    let config = match &training.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    println!("Training on {}...", training.data.display());
    let start = Instant::now();
    let mut model = MovieModel::new(config);
    model
        .fit_path(&training.data, training.test_fraction)
        .context("Failed to train model")?;
    println!("{} Trained model in {:?}", "✓".green(), start.elapsed());
    Ok(model)
}

fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Helper function to print the top features
fn print_importance(importance: &[FeatureImportance], top: usize) {
    println!("{}", "Feature Importance:".bold().blue());
    for (rank, feature) in importance.iter().take(top).enumerate() {
        println!(
            "{}. {:<24} {:.4}",
            (rank + 1).to_string().green(),
            feature.feature,
            feature.importance
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_trims_and_drops_empty() {
        assert_eq!(
            split_list(" Comedy, Action ,,"),
            vec!["Comedy".to_string(), "Action".to_string()]
        );
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_predict_arguments_parse() {
        let cli = Cli::try_parse_from([
            "marp",
            "predict",
            "--model",
            "model.json",
            "--date",
            "2023-03-02",
            "--cast",
            "Michael B. Jordan, Tessa Thompson",
            "--lang",
            "English",
            "--budget",
            "75,000,000",
            "--country",
            "AU",
        ])
        .unwrap();
        match cli.command {
            Commands::Predict { source, cast, .. } => {
                assert_eq!(source.model, Some(PathBuf::from("model.json")));
                assert_eq!(source.training.test_fraction, DEFAULT_TEST_FRACTION);
                assert_eq!(split_list(&cast).len(), 2);
            }
            _ => panic!("expected predict"),
        }
    }
}
