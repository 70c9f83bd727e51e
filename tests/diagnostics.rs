//! Diagnostics computed through the public `ChainSet` interface.

use approx::assert_abs_diff_eq;
use mcmc_chains::{
    effective_sample_size, effective_sample_size_with, split_potential_scale_reduction,
    Array1, Array2, ChainSet, DiagnosticError, DiagnosticOptions, EssCap,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

const NUM_CHAINS: usize = 4;
const NUM_DRAWS: usize = 1000;
const SEED: u64 = 42;

/// Chains of i.i.d. standard normal draws for `mu`, a constant `fixed`
/// and `shifted`, whose first chain is offset by `offset`.
fn synthetic_set(offset: f64) -> ChainSet {
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut normal = |n: usize| -> Array1 { (0..n).map(|_| rng.sample(StandardNormal)).collect() };
    let chains: Vec<Array2> = (0..NUM_CHAINS)
        .map(|c| {
            let mu = normal(NUM_DRAWS);
            let fixed = vec![1.5; NUM_DRAWS];
            let shift = if c == 0 { offset } else { 0.0 };
            let shifted = normal(NUM_DRAWS).into_iter().map(|x| x + shift).collect();
            vec![mu, fixed, shifted]
        })
        .collect();
    ChainSet::from_draws(vec!["mu", "fixed", "shifted"], chains).unwrap()
}

#[test]
fn independent_normal_chains() {
    let set = synthetic_set(0.0);
    let mu = set.parameter_index("mu").unwrap();

    let ess = effective_sample_size(&set, mu).unwrap();
    let total = (NUM_CHAINS * NUM_DRAWS) as f64;
    assert!(ess.is_finite() && ess > 0.0);
    assert!((ess - total).abs() < 0.15 * total, "ess = {}", ess);

    let rhat = split_potential_scale_reduction(&set, mu).unwrap();
    assert!(rhat >= 0.0 && rhat < 1.05, "rhat = {}", rhat);
}

#[test]
fn shifted_chain_is_flagged() {
    let set = synthetic_set(10.0);
    let shifted = set.parameter_index("shifted").unwrap();
    let rhat = split_potential_scale_reduction(&set, shifted).unwrap();
    assert!(rhat > 1.1, "rhat = {}", rhat);
}

#[test]
fn constant_parameter_is_undefined() {
    let set = synthetic_set(0.0);
    let fixed = set.parameter_index("fixed").unwrap();
    assert!(effective_sample_size(&set, fixed).unwrap().is_nan());
    assert!(split_potential_scale_reduction(&set, fixed).unwrap().is_nan());

    let single = ChainSet::from_draws(vec!["c"], vec![vec![vec![0.7; 500]]]).unwrap();
    assert!(effective_sample_size(&single, 0).unwrap().is_nan());
    assert!(split_potential_scale_reduction(&single, 0).unwrap().is_nan());
}

#[test]
fn index_out_of_range() {
    let set = synthetic_set(0.0);
    let count = set.parameter_count();
    for index in [count, count + 1, usize::MAX].iter().copied() {
        match effective_sample_size(&set, index) {
            Err(DiagnosticError::IndexOutOfRange { index: i, count: c }) => {
                assert_eq!((i, c), (index, count));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(
            split_potential_scale_reduction(&set, index),
            Err(DiagnosticError::IndexOutOfRange { .. })
        ));
    }
    let msg = effective_sample_size(&set, 7).unwrap_err().to_string();
    assert!(msg.contains('7') && msg.contains('3'), "{}", msg);
}

#[test]
fn too_few_draws_is_distinct_from_bad_index() {
    let set = ChainSet::from_draws(vec!["x"], vec![vec![vec![1.0]], vec![vec![2.0]]]).unwrap();
    assert!(matches!(
        split_potential_scale_reduction(&set, 0),
        Err(DiagnosticError::InsufficientData { required: 2, found: 1 })
    ));
    assert!(matches!(
        effective_sample_size(&set, 0),
        Err(DiagnosticError::InsufficientData { .. })
    ));

    let empty = ChainSet::new(vec!["x"]);
    assert!(matches!(
        effective_sample_size(&empty, 0),
        Err(DiagnosticError::InsufficientData { .. })
    ));
}

#[test]
fn repeated_calls_are_bit_identical() {
    let set = synthetic_set(0.0);
    for p in 0..set.parameter_count() {
        let a = effective_sample_size(&set, p).unwrap();
        let b = effective_sample_size(&set, p).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
        let a = split_potential_scale_reduction(&set, p).unwrap();
        let b = split_potential_scale_reduction(&set, p).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn concurrent_reads_match_sequential() {
    let set = synthetic_set(3.0);
    let expected: Vec<(u64, u64)> = (0..set.parameter_count())
        .map(|p| {
            (
                effective_sample_size(&set, p).unwrap().to_bits(),
                split_potential_scale_reduction(&set, p).unwrap().to_bits(),
            )
        })
        .collect();

    let set = &set;
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..set.parameter_count())
            .map(|p| {
                s.spawn(move || {
                    (
                        effective_sample_size(set, p).unwrap().to_bits(),
                        split_potential_scale_reduction(set, p).unwrap().to_bits(),
                    )
                })
            })
            .collect();
        for (p, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap(), expected[p]);
        }
    });
}

#[test]
fn warmup_draws_are_excluded() {
    let mut rng = StdRng::seed_from_u64(SEED);
    let draws: Array1 = (0..400).map(|_| rng.sample(StandardNormal)).collect();
    let mut with_warmup: Array1 = vec![50.0; 100];
    with_warmup.extend_from_slice(&draws);

    let mut warm = ChainSet::new(vec!["x"]);
    warm.push_chain(100, vec![with_warmup]).unwrap();
    let kept = ChainSet::from_draws(vec!["x"], vec![vec![draws]]).unwrap();

    assert_eq!(
        effective_sample_size(&warm, 0).unwrap().to_bits(),
        effective_sample_size(&kept, 0).unwrap().to_bits()
    );
    assert_eq!(
        split_potential_scale_reduction(&warm, 0).unwrap().to_bits(),
        split_potential_scale_reduction(&kept, 0).unwrap().to_bits()
    );
}

#[test]
fn unequal_chains_are_trimmed_from_the_back() {
    let mut rng = StdRng::seed_from_u64(SEED);
    let a: Array1 = (0..600).map(|_| rng.sample(StandardNormal)).collect();
    let b: Array1 = (0..500).map(|_| rng.sample(StandardNormal)).collect();

    let ragged = ChainSet::from_draws(vec!["x"], vec![vec![a.clone()], vec![b.clone()]]).unwrap();
    let even = ChainSet::from_draws(vec!["x"], vec![vec![a[..500].to_vec()], vec![b]]).unwrap();
    assert_eq!(ragged.n_samples_per_chain(), 500);
    assert_eq!(
        effective_sample_size(&ragged, 0).unwrap().to_bits(),
        effective_sample_size(&even, 0).unwrap().to_bits()
    );
    assert_eq!(
        split_potential_scale_reduction(&ragged, 0).unwrap().to_bits(),
        split_potential_scale_reduction(&even, 0).unwrap().to_bits()
    );
}

#[test]
fn ess_cap_is_opt_in() {
    let set = synthetic_set(0.0);
    let total = (NUM_CHAINS * NUM_DRAWS) as f64;
    let capped = effective_sample_size_with(
        &set,
        0,
        &DiagnosticOptions::default().ess_cap(EssCap::NominalDraws),
    )
    .unwrap();
    let raw = effective_sample_size(&set, 0).unwrap();
    assert_abs_diff_eq!(capped, raw.min(total));
}

#[test]
fn tiny_scale_parameter_is_not_constant() {
    let mut rng = StdRng::seed_from_u64(SEED);
    let chains: Vec<Array2> = (0..NUM_CHAINS)
        .map(|_| {
            vec![(0..NUM_DRAWS)
                .map(|_| 1e-12 * rng.sample::<f64, _>(StandardNormal))
                .collect()]
        })
        .collect();
    let set = ChainSet::from_draws(vec!["eps"], chains).unwrap();

    let total = (NUM_CHAINS * NUM_DRAWS) as f64;
    let ess = effective_sample_size(&set, 0).unwrap();
    assert!((ess - total).abs() < 0.15 * total, "ess = {}", ess);
    let rhat = split_potential_scale_reduction(&set, 0).unwrap();
    assert!(rhat > 0.9 && rhat < 1.05, "rhat = {}", rhat);
}
