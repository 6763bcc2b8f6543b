use criterion::Criterion;
use orbitfit::{
    Driver, LikelihoodMode, ObservationSet, OrbitModel, SamplerConfig, SamplerKind, StopSignal,
    System, SystemConfig, read_formatted_csv, solve_kepler,
};
use orbitfit_test_util::orbit_fixture;
use rand::prelude::*;
use std::hint::black_box;
use std::sync::Arc;

pub fn bench_solve_kepler(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    for ecc in [0.1, 0.5, 0.95] {
        let mean_anomalies: Vec<f64> = (0..1000)
            .map(|_| rng.random_range(0.0..std::f64::consts::TAU))
            .collect();
        c.bench_function(format!("solve_kepler: ecc = {ecc}").as_str(), |b| {
            b.iter(|| {
                mean_anomalies
                    .iter()
                    .map(|&m| solve_kepler(black_box(m), ecc))
                    .sum::<f64>()
            })
        });
    }
}

pub fn bench_predict(c: &mut Criterion) {
    let fixture = orbit_fixture("edge_on");
    let observations = Arc::new(
        ObservationSet::new(read_formatted_csv(fixture.csv.as_bytes()).unwrap()).unwrap(),
    );
    let config = SystemConfig::new(fixture.truth.mtot, fixture.truth.plx);
    let system = System::new(&config, observations.clone()).unwrap();
    let params = system
        .sample_priors(10_000, &mut StdRng::seed_from_u64(0))
        .unwrap();
    c.bench_function("KeplerianOrbit::predict: edge_on, 10000 candidates", |b| {
        b.iter(|| {
            system
                .model()
                .predict(black_box(params.view()), &observations)
                .unwrap()
        })
    });

    for num_threads in [1, 4] {
        let mut sampler = SamplerConfig::new(SamplerKind::Rejection, LikelihoodMode::Chi2);
        sampler.num_threads = num_threads;
        sampler.rejection.num_samples = 10_000;
        sampler.seed = Some(0);
        let mut driver = Driver::with_system(system.clone(), &sampler).unwrap();
        c.bench_function(
            format!("Rejection sampling: edge_on, 10 samples, {num_threads} threads").as_str(),
            |b| b.iter(|| driver.run(10, &StopSignal::new()).unwrap()),
        );
    }
}
