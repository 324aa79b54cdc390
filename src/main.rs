// This file is part of haarcascade, a Viola-Jones face detection engine: Haar-like
// rectangle features, AdaBoost-trained decision stumps and an attentional cascade,
// as described in the following paper:
//
//      Rapid object detection using a boosted cascade of simple features,
//      Paul Viola, Michael Jones.
//      In CVPR 2001.
//
// You can redistribute haarcascade source codes and/or modify it under the terms
// of the BSD 2-Clause License.
//
// You should have received a copy of the BSD 2-Clause License along with the software.
// If not, see < https://opensource.org/licenses/BSD-2-Clause>.

//! Command line front end: train a cascade from image folders, evaluate it, profile it.
//!
//! Usage:
//!   haarcascade train --train-faces DIR --train-non-faces DIR \
//!                     --valid-faces DIR --valid-non-faces DIR --output FILE
//!   haarcascade evaluate --model FILE --faces DIR --non-faces DIR
//!   haarcascade profile --model FILE --faces DIR --non-faces DIR

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use haarcascade::{
    generate_all_features, load_model, save_model, Cascade, CascadeTrainer, Image, SampleSet,
    Statistics, TrainingParams,
};
use image::imageops::{self, FilterType};
use log::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "haarcascade")]
#[command(author, version, about = "Viola-Jones cascade training and evaluation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a cascade and save it
    Train(TrainArgs),
    /// Print detection and error rates of a saved cascade
    Evaluate(DatasetArgs),
    /// Print per-stage pass rates and timings of a saved cascade
    Profile(DatasetArgs),
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Face images for training
    #[arg(long)]
    train_faces: PathBuf,

    /// Non-face images for training
    #[arg(long)]
    train_non_faces: PathBuf,

    /// Face images for validation
    #[arg(long)]
    valid_faces: PathBuf,

    /// Non-face images for validation
    #[arg(long)]
    valid_non_faces: PathBuf,

    /// Output model file
    #[arg(short, long)]
    output: PathBuf,

    /// Side length of the square training window
    #[arg(long, default_value = "19")]
    canvas: u32,

    /// Maximum false positive rate per stage
    #[arg(short = 'f', long, default_value = "0.5")]
    max_false_positive_rate: f64,

    /// Minimum detection rate per stage
    #[arg(short = 'd', long, default_value = "0.6")]
    min_detection_rate: f64,

    /// Overall false positive rate at which training stops
    #[arg(long, default_value = "0.0001")]
    target: f64,
}

#[derive(Args, Debug)]
struct DatasetArgs {
    /// Model file written by `train`
    #[arg(short, long)]
    model: PathBuf,

    /// Face images
    #[arg(long)]
    faces: PathBuf,

    /// Non-face images
    #[arg(long)]
    non_faces: PathBuf,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Command::Train(args) => train(args),
        Command::Evaluate(args) => evaluate(args),
        Command::Profile(args) => profile(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn train(args: &TrainArgs) -> Result<(), Box<dyn Error>> {
    let params = TrainingParams {
        max_false_positive_rate: args.max_false_positive_rate,
        min_detection_rate: args.min_detection_rate,
        target_false_positive_rate: args.target,
    };
    let trainer = CascadeTrainer::new(params)?;

    let training = load_samples(&args.train_faces, &args.train_non_faces, args.canvas, args.canvas)?;
    let validation = load_samples(&args.valid_faces, &args.valid_non_faces, args.canvas, args.canvas)?;

    let features = generate_all_features(args.canvas, args.canvas);
    info!("{} candidate features", features.len());

    let started = Instant::now();
    let outcome = trainer.train(features, &training, &validation)?;
    info!(
        "trained {} stages in {:.1}s",
        outcome.cascade.stage_count(),
        started.elapsed().as_secs_f64()
    );
    for (stage, summary) in outcome.stages.iter().enumerate() {
        info!(
            "stage {}: {} stumps, D {:.4}, F {:.6}",
            stage, summary.stumps, summary.detection_rate, summary.false_positive_rate
        );
    }
    info!("training set: {}", outcome.statistics);

    save_model(&outcome.cascade, &args.output)?;
    info!("model saved to {}", args.output.display());
    Ok(())
}

fn evaluate(args: &DatasetArgs) -> Result<(), Box<dyn Error>> {
    let cascade = load_model(&args.model)?;
    let samples = load_samples(
        &args.faces,
        &args.non_faces,
        cascade.canvas_width(),
        cascade.canvas_height(),
    )?;

    let statistics = Statistics::evaluate(&cascade, &samples);
    println!("Detection rate:      {:.4}", statistics.detection_rate());
    println!("False positive rate: {:.6}", statistics.false_positive_rate());
    println!("False negative rate: {:.4}", statistics.false_negative_rate());
    println!("Accuracy:            {:.4}", statistics.accuracy());
    Ok(())
}

fn profile(args: &DatasetArgs) -> Result<(), Box<dyn Error>> {
    let cascade = load_model(&args.model)?;
    let samples = load_samples(
        &args.faces,
        &args.non_faces,
        cascade.canvas_width(),
        cascade.canvas_height(),
    )?;
    if samples.is_empty() {
        return Err("no images found".into());
    }

    let workload = cascade.stage_workload(&samples);
    let timings = time_stages(&cascade, &samples);
    let total: Duration = timings.iter().sum();
    let statistics = Statistics::evaluate(&cascade, &samples);
    let accepted = statistics.true_positives + statistics.false_positives;

    println!("stage  stumps  evaluated  passed  time/sample");
    for (stage, ensemble) in cascade.stages().iter().enumerate() {
        let evaluated = workload[stage];
        let passed = workload.get(stage + 1).copied().unwrap_or(accepted);
        let per_sample = if evaluated == 0 {
            0.0
        } else {
            timings[stage].as_secs_f64() * 1e6 / evaluated as f64
        };
        println!(
            "{:>5}  {:>6}  {:>9}  {:>6.4}  {:>9.3}us",
            stage,
            ensemble.len(),
            evaluated,
            if evaluated == 0 { 0.0 } else { passed as f64 / evaluated as f64 },
            per_sample
        );
    }
    println!(
        "expected time per sample: {:.3}us",
        total.as_secs_f64() * 1e6 / samples.len() as f64
    );
    Ok(())
}

/// Time spent in each stage over all samples, stopping at the first rejection.
fn time_stages(cascade: &Cascade, samples: &SampleSet) -> Vec<Duration> {
    let mut timings = vec![Duration::default(); cascade.stage_count()];
    for (integral, _) in samples.iter() {
        for (stage, ensemble) in cascade.stages().iter().enumerate() {
            let started = Instant::now();
            let accepted = ensemble.detect(integral);
            timings[stage] += started.elapsed();
            if !accepted {
                break;
            }
        }
    }
    timings
}

fn load_samples(
    faces: &Path,
    non_faces: &Path,
    width: u32,
    height: u32,
) -> Result<SampleSet, Box<dyn Error>> {
    let mut images = load_images(faces, width, height)?;
    let positives = images.len();
    images.extend(load_images(non_faces, width, height)?);

    let mut labels = vec![true; positives];
    labels.resize(images.len(), false);
    info!(
        "loaded {} faces from {} and {} non-faces from {}",
        positives,
        faces.display(),
        images.len() - positives,
        non_faces.display()
    );
    Ok(SampleSet::new(&images, &labels)?)
}

/// Decodes every image in `dir`, converted to gray and resized to `width` x `height`.
fn load_images(dir: &Path, width: u32, height: u32) -> Result<Vec<Image>, Box<dyn Error>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let decoded = match image::open(&path) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
                continue;
            }
        };
        let gray = decoded.to_luma8();
        let gray = if gray.dimensions() == (width, height) {
            gray
        } else {
            imageops::resize(&gray, width, height, FilterType::Triangle)
        };
        images.push(Image::from_luma(gray.as_raw(), width, height)?);
    }
    Ok(images)
}
