#![allow(clippy::cast_precision_loss, clippy::uninlined_format_args)]
use sampic_waveform::{interpolate, interpolate_par, Interpolator, KernelKind};

const KERNELS: [KernelKind; 2] = [KernelKind::WindowedSinc, KernelKind::Lanczos];

fn pulse(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let x = i as f64 - 20.0;
            1500.0 * (-x * x / 18.0).exp() + 210.0 + (i % 7) as f64
        })
        .collect()
}

fn slow_sine(n: usize, amplitude: f64) -> Vec<f64> {
    (0..n)
        .map(|i| amplitude * (2.0 * std::f64::consts::PI * i as f64 / 32.0).sin())
        .collect()
}

#[test]
fn test_exact_at_sample_instants() {
    let period = 1.0 / 6.4e9;
    let samples = pulse(64);
    let targets: Vec<f64> = (0..samples.len()).map(|k| k as f64 * period).collect();
    for kernel in KERNELS {
        for hw in 1..=5 {
            let out = interpolate(&samples, period, kernel, hw, &targets).unwrap();
            for (k, (&got, &want)) in out.iter().zip(&samples).enumerate() {
                assert!(
                    (got - want).abs() <= want.abs() * 1e-9,
                    "{} hw={} k={}",
                    kernel,
                    hw,
                    k
                );
            }
        }
    }
}

#[test]
fn test_bounded_for_band_limited_input() {
    let n = 128;
    let samples = slow_sine(n, 100.0);
    let max = samples.iter().fold(0.0f64, |m, s| m.max(s.abs()));
    for kernel in KERNELS {
        for hw in 2..=4 {
            // Interior targets only, where the kernel has full support.
            let targets: Vec<f64> = (hw * 10..(n - 1 - hw) * 10)
                .map(|i| i as f64 / 10.0)
                .collect();
            let out = interpolate(&samples, 1.0, kernel, hw, &targets).unwrap();
            for (t, y) in targets.iter().zip(&out) {
                assert!(
                    y.abs() <= 1.05 * max,
                    "{} hw={} t={} y={}",
                    kernel,
                    hw,
                    t,
                    y
                );
            }
        }
    }
}

#[test]
fn test_samples_outside_window_do_not_contribute() {
    let mut samples = vec![0.0; 64];
    samples[40] = 1e6;
    for kernel in KERNELS {
        let out = interpolate(&samples, 1.0, kernel, 3, &[5.3, 10.0, 36.49]).unwrap();
        assert_eq!(out, vec![0.0, 0.0, 0.0], "{}", kernel);
    }
}

#[test]
fn test_edges_truncate_instead_of_failing() {
    let samples = pulse(16);
    for kernel in KERNELS {
        let out = interpolate(&samples, 1.0, kernel, 4, &[-0.4, 0.2, 14.8, 15.4, 17.0]).unwrap();
        assert!(out.iter().all(|v| v.is_finite()));
    }
}

#[test]
fn test_parallel_matches_sequential() {
    let samples = pulse(64);
    let targets: Vec<f64> = (0..2000).map(|i| f64::from(i) * 0.031_7 - 1.0).collect();
    for kernel in KERNELS {
        let seq = interpolate(&samples, 1.0, kernel, 3, &targets).unwrap();
        let par = interpolate_par(&samples, 1.0, kernel, 3, &targets).unwrap();
        assert_eq!(seq, par);
    }
}

#[test]
fn test_shared_interpolator_across_threads() {
    let samples = pulse(48);
    let interpolator = Interpolator::new(KernelKind::Lanczos, 3, 1.0).unwrap();
    let expected = interpolator.evaluate(&samples, &[10.25, 20.5]).unwrap();
    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let got = interpolator.evaluate(&samples, &[10.25, 20.5]).unwrap();
                assert_eq!(got, expected);
            });
        }
    });
}
