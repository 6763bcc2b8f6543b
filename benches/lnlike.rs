use criterion::Criterion;
use orbitfit::ndarray::{Array2, Array3};
use orbitfit::{
    AngularIndices, Likelihood, LikelihoodMode, ObservationSet, compute_chi2, read_formatted_csv,
};
use orbitfit_test_util::{orbit_fixture, simulate_csv};
use rand::prelude::*;
use std::hint::black_box;
use std::sync::Arc;

pub fn bench_compute_chi2(c: &mut Criterion) {
    const N_EPOCHS: usize = 100;
    let mut rng = StdRng::seed_from_u64(0);
    let data = Array2::from_shape_fn((N_EPOCHS, 2), |_| rng.random_range(0.0..6.0));
    let errors = Array2::from_elem((N_EPOCHS, 2), 0.1);
    let angular: AngularIndices = (0..N_EPOCHS).step_by(2).collect();

    for n_candidates in [1, 100, 10_000] {
        let model =
            Array3::from_shape_fn((N_EPOCHS, 2, n_candidates), |_| rng.random_range(0.0..6.0));
        c.bench_function(
            format!("compute_chi2: {N_EPOCHS} epochs, {n_candidates} candidates").as_str(),
            |b| {
                b.iter(|| {
                    compute_chi2(
                        data.view(),
                        errors.view(),
                        black_box(&model),
                        &angular,
                    )
                    .unwrap()
                })
            },
        );
    }
}

pub fn bench_ln_like(c: &mut Criterion) {
    let fixture = orbit_fixture("eccentric");
    let mut rng = StdRng::seed_from_u64(1);
    let epochs: Vec<f64> = (0..200).map(|i| 55000.0 + 30.0 * i as f64).collect();
    let simulated = simulate_csv(&fixture.truth, &epochs, 3.0, &mut rng).unwrap();

    for (name, csv) in [("eccentric", fixture.csv), ("simulated", simulated.as_str())] {
        let observations =
            Arc::new(ObservationSet::new(read_formatted_csv(csv.as_bytes()).unwrap()).unwrap());
        let n_epochs = observations.n_epochs();
        let likelihood = Likelihood::new(observations, LikelihoodMode::Normalized);
        let model = Array3::from_shape_fn((n_epochs, 2, 10_000), |_| rng.random_range(0.0..6.0));
        c.bench_function(
            format!("Likelihood::ln_like: {name}, 10000 candidates").as_str(),
            |b| b.iter(|| likelihood.ln_like(black_box(&model)).unwrap()),
        );
    }
}
