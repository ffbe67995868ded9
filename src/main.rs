use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use log::info;
use percept::{ImageClassifier, ScoredClass};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Model locator: a local model directory or a served base URL
    #[arg(short, long)]
    model_url: String,

    /// Images to classify: data: payloads, file:// URLs, or http(s) URLs
    #[arg(required = true)]
    images: Vec<String>,

    /// Delay between readiness polls, in milliseconds
    #[arg(long, default_value_t = 1000)]
    poll_delay_ms: u64,

    /// Number of readiness polls before giving up
    #[arg(long, default_value_t = 20)]
    max_attempts: u32,

    /// Print at most this many classes per image
    #[arg(short, long, default_value_t = 5)]
    top: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("building classifier for model at {}", args.model_url);
    let start_time = Instant::now();

    let classifier = ImageClassifier::builder()
        .with_model_url(&args.model_url)
        .with_readiness(Duration::from_millis(args.poll_delay_ms), args.max_attempts)
        .build();

    for (i, image) in args.images.iter().enumerate() {
        info!("classifying {}/{}: {}", i + 1, args.images.len(), image);
        match classifier.classify(image).await {
            Ok(ranked) => print_ranked(image, &ranked, args.top),
            Err(e) => {
                eprintln!("error classifying {}: {}", image, e);
                return Err(e.into());
            }
        }
    }

    if let Some(info) = classifier.info() {
        info!(
            "done: {} classes, {}x{} input, total {:.2?}",
            info.num_classes,
            info.input_size.0,
            info.input_size.1,
            start_time.elapsed()
        );
    }
    Ok(())
}

fn print_ranked(image: &str, ranked: &[ScoredClass], top: usize) {
    println!("{}", image);
    for entry in ranked.iter().take(top) {
        println!("  {}: {:.4}", entry.class_name, entry.score);
    }
    if ranked.is_empty() {
        println!("  (no labeled classes)");
    }
}
