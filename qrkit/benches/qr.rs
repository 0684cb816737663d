//! QR factorization benchmark.
//!
//! Square, tall, and wide shapes over f64, contiguous column-major input.
//! With `--features parallel`, each shape is also run under a worker team to
//! show the trailing-update distribution.

use qrkit::{factor_qr, Member};
use qrkit_view::{Matrix, Vector};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::hint::black_box;
use std::time::{Duration, Instant};

fn mean(durations: &[Duration]) -> Duration {
    let total_nanos: u128 = durations.iter().map(|d| d.as_nanos()).sum();
    Duration::from_nanos((total_nanos / durations.len() as u128) as u64)
}

fn bench_n(label: &str, warmup_iters: usize, iters: usize, mut f: impl FnMut()) -> Duration {
    for _ in 0..warmup_iters {
        f();
    }

    let mut samples = Vec::with_capacity(iters);
    for _ in 0..iters {
        let t0 = Instant::now();
        f();
        samples.push(t0.elapsed());
    }

    let avg = mean(&samples);
    println!("  {label}: {:.3} ms", avg.as_secs_f64() * 1e3);
    avg
}

fn run_case(case_name: &str, m: usize, n: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let a = Matrix::<f64>::from_fn_col_major(m, n, |_, _| rng.gen::<f64>() - 0.5);
    let k = m.min(n);

    let mut scratch = a.clone();
    let mut tau = Vector::<f64>::zeros(k);
    let mut work = Vector::<f64>::zeros(n);

    let serial = Member::host_serial();
    bench_n(&format!("{case_name}_serial_{m}x{n}"), 2, 5, || {
        scratch.data_mut().copy_from_slice(a.data());
        factor_qr(
            &serial,
            &mut scratch.view_mut(),
            &mut tau.view_mut(),
            &mut work.view_mut(),
        )
        .unwrap();
        black_box(scratch.data());
    });

    #[cfg(feature = "parallel")]
    {
        let team = Member::team(4);
        bench_n(&format!("{case_name}_team4_{m}x{n}"), 2, 5, || {
            scratch.data_mut().copy_from_slice(a.data());
            factor_qr(
                &team,
                &mut scratch.view_mut(),
                &mut tau.view_mut(),
                &mut work.view_mut(),
            )
            .unwrap();
            black_box(scratch.data());
        });
    }
}

fn main() {
    println!("square:");
    run_case("square", 256, 256, 1);
    println!("tall:");
    run_case("tall", 1024, 64, 2);
    println!("wide:");
    run_case("wide", 64, 1024, 3);
}
