use anyhow::{Context, Result};
use data_loader::{DEFAULT_TEST_FRACTION, MovieDataset};
use std::path::Path;
use std::time::Instant;

fn main() -> Result<()> {
    let path = Path::new("data/imdb_movies.csv");

    println!("Loading IMDB movies dataset...\n");

    let start = Instant::now();
    let dataset = MovieDataset::load_from_csv(path).context("Failed to load dataset")?;
    let elapsed = start.elapsed();

    let (train, test) = dataset.train_test_split(DEFAULT_TEST_FRACTION)?;
    let appearances: usize = dataset.movies().iter().map(|m| m.cast.len()).sum();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Movies: {}", dataset.len());
    println!("Cast appearances: {}", appearances);
    println!("Train / test: {} / {}", train.len(), test.len());
    println!("\nPerformance: {:.0} movies/second",
             dataset.len() as f64 / elapsed.as_secs_f64());
    Ok(())
}
