//! Benchmarks for the fitting pipeline.
//!
//! Covers the composite model evaluation, a single bounded row fit and one
//! full seed-then-chain pass over a synthetic intensity.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dcm_fit::{
    DcmModel, FitConfig, FitEngine, FitParameters, Result, SequentialFitDriver, Spectrum, SpectrumSource,
};
use ndarray::{Array1, Array2};

struct InMemorySource {
    spectrum: Spectrum,
}

impl SpectrumSource for InMemorySource {
    fn load(&self, _intensity: f64) -> Result<Spectrum> {
        Ok(self.spectrum.clone())
    }
}

fn truth() -> FitParameters {
    FitParameters::from_slice(&[0.9, 0.2, 0.12, 1.1, -0.1, 0.13, 0.8, 0.05, 0.115, 0.1]).unwrap()
}

fn model(config: &FitConfig) -> DcmModel {
    DcmModel::new(config.resonances, config.lineshape_constant())
}

fn bench_model_eval(c: &mut Criterion) {
    let config = FitConfig::default();
    let model = model(&config);
    let params = truth();

    let mut group = c.benchmark_group("model_eval");
    for n in [283usize, 1962] {
        let axis = Array1::linspace(55.15, 57.45, n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &axis, |b, axis| {
            b.iter(|| model.evaluate(black_box(axis.view()), black_box(&params)))
        });
    }
    group.finish();
}

fn bench_row_fit(c: &mut Criterion) {
    let config = FitConfig::default();
    let engine = FitEngine::new(model(&config), config.solver.clone());
    let bounds = config.parameter_bounds().unwrap();

    let energies = Array1::linspace(55.15, 57.45, 283);
    let data = engine.model().evaluate(energies.view(), &truth());
    let guess = config.seed_guess();

    c.bench_function("bounded_row_fit", |b| {
        b.iter(|| {
            let _ = engine.fit_bounded(energies.view(), black_box(data.view()), black_box(&guess), &bounds);
        })
    });
}

fn bench_sequential_chain(c: &mut Criterion) {
    let mut config = FitConfig::default();
    config.intensities = vec![1.3];

    let axis = config.energy_axis().unwrap();
    let clean = model(&config).evaluate(axis.values(), &truth());
    let rows = 20;
    let od = Array2::from_shape_fn((rows, axis.len()), |(i, j)| clean[j] * (1.0 - 0.02 * i as f64));
    let spectrum = Spectrum::new(od, Array1::linspace(8.0, -2.0, rows)).unwrap();

    let mut group = c.benchmark_group("sequential_fit");
    group.sample_size(10); // Reduce sample size for slow benchmarks

    group.bench_function("one_intensity_20_rows", |b| {
        b.iter(|| {
            let source = InMemorySource {
                spectrum: spectrum.clone(),
            };
            let driver = SequentialFitDriver::new(&config, source).unwrap();
            black_box(driver.run().unwrap());
        })
    });

    group.finish();
}

criterion_group!(benches, bench_model_eval, bench_row_fit, bench_sequential_chain);
criterion_main!(benches);
