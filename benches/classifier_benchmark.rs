use criterion::{black_box, criterion_group, criterion_main, Criterion};
use issue_classifier::classifier::TextFeaturizer;
use issue_classifier::workflow::{self, FEATURES_COLUMN, LABEL_COLUMN};
use issue_classifier::{
    DataView, GitHubIssue, MaximumEntropyOptions, PredictionEngine, TextFeaturizerOptions, TransformSpec,
};

const AREAS: [&str; 4] = ["area-data", "area-ui", "area-networking", "area-build"];
const TOPICS: [&str; 4] = [
    "database connection query entity migration",
    "button window dialog theme layout",
    "socket proxy request handshake timeout",
    "compiler msbuild package restore target",
];

fn synthetic_issues(count: usize) -> Vec<GitHubIssue> {
    (0..count)
        .map(|i| {
            let class = i % AREAS.len();
            GitHubIssue::new(
                format!("Issue {} about {}", i, TOPICS[class]),
                format!("Steps to reproduce number {}: {} fails", i, TOPICS[class]),
            )
            .with_area(AREAS[class])
        })
        .collect()
}

fn bench_featurization(c: &mut Criterion) {
    let view = DataView::from_records(&synthetic_issues(200));
    let featurizer = TextFeaturizer::fit(&view, "Description", "Features", &TextFeaturizerOptions::default()).unwrap();
    let mut group = c.benchmark_group("Featurization");

    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("short_text", |b| b.iter(|| {
        featurizer.featurize(black_box("EF is crashing")).unwrap()
    }));

    group.bench_function("long_text", |b| b.iter(|| {
        featurizer.featurize(black_box(
            "When connecting to the database the application throws an exception \
             from the entity migration step. The query runs fine from the command line \
             but the connection is dropped after the handshake with the server."
        )).unwrap()
    }));

    group.finish();
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("Training");
    group.sample_size(10);

    for &count in &[50usize, 200] {
        let view = DataView::from_records(&synthetic_issues(count));
        group.bench_function(format!("rows_{}", count), |b| b.iter(|| {
            let mut pipeline = workflow::process_data();
            pipeline.push(TransformSpec::maximum_entropy(
                LABEL_COLUMN,
                FEATURES_COLUMN,
                MaximumEntropyOptions::default(),
            ));
            pipeline.fit(black_box(&view)).unwrap()
        }));
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let data = DataView::from_records(&synthetic_issues(200));
    let mut pipeline = workflow::process_data();
    pipeline.push(TransformSpec::maximum_entropy(LABEL_COLUMN, FEATURES_COLUMN, MaximumEntropyOptions::default()));
    pipeline.push(TransformSpec::map_key_to_value("PredictedLabel", "PredictedLabel"));
    let model = pipeline.fit(&data).unwrap();
    let engine = PredictionEngine::new(model, &data.schema()).unwrap();

    let mut group = c.benchmark_group("Prediction");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    let issue = GitHubIssue::new(workflow::SAMPLE_ISSUE_TITLE, workflow::SAMPLE_ISSUE_DESCRIPTION);
    group.bench_function("single_issue", |b| b.iter(|| {
        engine.predict(black_box(&issue)).unwrap()
    }));

    group.finish();
}

criterion_group!(
    benches,
    bench_featurization,
    bench_training,
    bench_prediction
);
criterion_main!(benches);
