//! Inference benchmark: clinical input → indices → features → logistic classifier → tier.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use masld_risk::model::{ClassifierSpec, LogisticClassifier, ModelManifest};
use masld_risk::features::{Standardization, StandardizationReference, FEATURE_NAMES};
use masld_risk::{assess_risk, ClinicalInput, LoadedModel, ModelHandle};

fn logistic_handle() -> ModelHandle {
    let columns: Vec<String> = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
    let coefficients = vec![0.01; columns.len()];
    let manifest = ModelManifest {
        name: "bench".to_string(),
        version: "0".to_string(),
        feature_columns: columns,
        reference: StandardizationReference {
            spise: Standardization { mean: 6.5, std: 1.2 },
            mets_ir: Standardization { mean: 35.0, std: 5.0 },
            spise_weight: 0.6,
            mets_ir_weight: 0.4,
        },
        classifier: ClassifierSpec::Logistic {
            intercept: -1.0,
            coefficients: coefficients.clone(),
        },
    };
    let classifier = LogisticClassifier::new(-1.0, coefficients);
    LoadedModel::new(manifest, Box::new(classifier)).unwrap().into()
}

fn bench_assess_logistic(c: &mut Criterion) {
    let handle = logistic_handle();
    let input = ClinicalInput::new(150.0, 100.0, 50.0, 25.0);

    c.bench_function("assess_risk_logistic_13f", |b| {
        b.iter(|| assess_risk(black_box(&input), &handle).unwrap())
    });
}

fn bench_assess_unavailable(c: &mut Criterion) {
    let handle = ModelHandle::unavailable("bench");
    let input = ClinicalInput::new(150.0, 100.0, 50.0, 25.0);

    c.bench_function("assess_risk_model_unavailable", |b| {
        b.iter(|| assess_risk(black_box(&input), &handle).is_err())
    });
}

criterion_group!(benches, bench_assess_logistic, bench_assess_unavailable);
criterion_main!(benches);
