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

use haarcascade::{
    create_detector, generate_all_features, read_model, save_model, write_model, CascadeTrainer,
    Detector, Image, SampleSet, Statistics, TrainingEvent, TrainingParams,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CANVAS: u32 = 6;

fn positive_image(rng: &mut StdRng) -> Image {
    Image::from_fn(CANVAS, CANVAS, |x, _| {
        let base: f64 = if x < CANVAS / 2 { 0.9 } else { 0.1 };
        (base + rng.gen_range(-0.1..0.1)).max(0.0).min(1.0)
    })
}

fn negative_image(rng: &mut StdRng) -> Image {
    Image::from_fn(CANVAS, CANVAS, |_, _| rng.gen_range(0.0..1.0))
}

fn dataset(rng: &mut StdRng, positives: usize, negatives: usize) -> (Vec<Image>, Vec<bool>) {
    let mut images = Vec::new();
    let mut labels = Vec::new();
    for _ in 0..positives {
        images.push(positive_image(rng));
        labels.push(true);
    }
    for _ in 0..negatives {
        images.push(negative_image(rng));
        labels.push(false);
    }
    (images, labels)
}

struct Fixture {
    training: SampleSet,
    validation_images: Vec<Image>,
    validation: SampleSet,
}

fn fixture() -> Fixture {
    let mut rng = StdRng::seed_from_u64(2001);

    let (mut images, mut labels) = dataset(&mut rng, 40, 40);
    // a negative identical to a positive keeps every boosting error above zero
    images.push(images[0].clone());
    labels.push(false);
    let training = SampleSet::new(&images, &labels).unwrap();

    let (validation_images, validation_labels) = dataset(&mut rng, 100, 200);
    let validation = SampleSet::new(&validation_images, &validation_labels).unwrap();

    Fixture {
        training,
        validation_images,
        validation,
    }
}

fn params() -> TrainingParams {
    TrainingParams {
        max_false_positive_rate: 0.5,
        min_detection_rate: 0.6,
        target_false_positive_rate: 0.01,
    }
}

#[test]
fn test_training_stops_at_target() {
    let fixture = fixture();
    let trainer = CascadeTrainer::new(params()).unwrap();
    let outcome = trainer
        .train(
            generate_all_features(CANVAS, CANVAS),
            &fixture.training,
            &fixture.validation,
        )
        .unwrap();

    let stages = &outcome.stages;
    assert!(!stages.is_empty());
    assert_eq!(stages.len(), outcome.cascade.stage_count());

    let (last, earlier) = stages.split_last().unwrap();
    assert!(last.false_positive_rate <= 0.01);
    for summary in earlier {
        assert!(summary.false_positive_rate > 0.01);
    }

    let mut previous_fp_rate = 1.0;
    let mut previous_detection_rate = 1.0;
    for summary in stages {
        assert!(summary.stumps > 0);
        assert!(summary.false_positive_rate <= 0.5 * previous_fp_rate);
        assert!(summary.detection_rate >= 0.6 * previous_detection_rate);
        previous_fp_rate = summary.false_positive_rate;
        previous_detection_rate = summary.detection_rate;
    }

    // every stage accepts all positives it was trained on
    assert_eq!(1.0, outcome.statistics.detection_rate());

    let validation = Statistics::evaluate(&outcome.cascade, &fixture.validation);
    assert!((validation.false_positive_rate() - last.false_positive_rate).abs() < 1e-12);
    assert!((validation.detection_rate() - last.detection_rate).abs() < 1e-12);
}

#[test]
fn test_rejection_is_final() {
    let fixture = fixture();
    let trainer = CascadeTrainer::new(params()).unwrap();
    let outcome = trainer
        .train(
            generate_all_features(CANVAS, CANVAS),
            &fixture.training,
            &fixture.validation,
        )
        .unwrap();
    let cascade = &outcome.cascade;

    for image in &fixture.validation_images {
        let integral = haarcascade::IntegralImage::new(image);
        match cascade.rejected_on_stage(image) {
            Some(stage) => {
                assert!(stage < cascade.stage_count());
                assert!(!cascade.detect(image));
                for accepting in &cascade.stages()[..stage] {
                    assert!(accepting.detect(&integral));
                }
                assert!(!cascade.stages()[stage].detect(&integral));
            }
            None => {
                assert!(cascade.detect(image));
                assert!(cascade.stages().iter().all(|s| s.detect(&integral)));
            }
        }
    }

    let workload = cascade.stage_workload(&fixture.validation);
    assert_eq!(fixture.validation.len(), workload[0]);
    assert!(workload.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[test]
fn test_events_follow_training() {
    let fixture = fixture();
    let trainer = CascadeTrainer::new(params()).unwrap();
    let mut events = Vec::new();
    let outcome = trainer
        .train_with_observer(
            generate_all_features(CANVAS, CANVAS),
            &fixture.training,
            &fixture.validation,
            &mut |event: &TrainingEvent| events.push(event.clone()),
        )
        .unwrap();

    let stumps_added = events
        .iter()
        .filter(|e| matches!(e, TrainingEvent::StumpAdded { .. }))
        .count();
    let total_stumps: usize = outcome.stages.iter().map(|s| s.stumps).sum();
    assert_eq!(total_stumps, stumps_added);

    let rebuilt = events
        .iter()
        .filter(|e| matches!(e, TrainingEvent::PoolRebuilt { .. }))
        .count();
    assert_eq!(outcome.stages.len() - 1, rebuilt);

    match events.last() {
        Some(TrainingEvent::Finished { stages, statistics }) => {
            assert_eq!(outcome.cascade.stage_count(), *stages);
            assert_eq!(outcome.statistics, *statistics);
        }
        other => panic!("unexpected last event: {:?}", other),
    }
}

#[test]
fn test_saved_model_detects_the_same() {
    let fixture = fixture();
    let trainer = CascadeTrainer::new(params()).unwrap();
    let outcome = trainer
        .train(
            generate_all_features(CANVAS, CANVAS),
            &fixture.training,
            &fixture.validation,
        )
        .unwrap();

    let mut buf = Vec::new();
    write_model(&outcome.cascade, &mut buf).unwrap();
    let loaded = read_model(&buf[..]).unwrap();
    assert_eq!(outcome.cascade.stage_count(), loaded.stage_count());

    let path = std::env::temp_dir().join(format!("haarcascade-{}.cascade", std::process::id()));
    save_model(&outcome.cascade, &path).unwrap();
    let detector = create_detector(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!((CANVAS, CANVAS), detector.canvas_size());
    for image in &fixture.validation_images {
        let expected = outcome.cascade.rejected_on_stage(image);
        assert_eq!(expected, loaded.rejected_on_stage(image));
        assert_eq!(expected, detector.rejected_on_stage(image));
    }
}
