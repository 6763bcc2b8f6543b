use criterion::{criterion_group, criterion_main};

mod lnlike;
use lnlike::{bench_compute_chi2, bench_ln_like};

mod orbit;
use orbit::{bench_predict, bench_solve_kepler};

criterion_group!(
    benches,
    bench_compute_chi2,
    bench_ln_like,
    bench_predict,
    bench_solve_kepler
);
criterion_main!(benches);
