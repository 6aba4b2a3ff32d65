//! Unit tests for core/ncbi_math

use blastcore::core::ncbi_math::{expm1, factorial, gcd, ln_factorial, ln_gamma, ln_gamma_int, log1p, nint, romberg_integrate};

#[test]
fn test_expm1_accurate_for_tiny_arguments() {
    for &x in &[1e-12f64, -1e-12, 1e-6, -3e-4, 0.05] {
        let expected = x.exp_m1();
        assert!(((expm1(x) - expected) / expected).abs() < 1e-12, "x = {}", x);
    }
    assert!((expm1(5.0) - (5.0f64.exp() - 1.0)).abs() < 1e-12);
}

#[test]
fn test_log1p_accurate_for_tiny_arguments() {
    for &x in &[1e-15f64, 1e-9, -1e-7, 0.2, 3.0] {
        let expected = x.ln_1p();
        assert!(((log1p(x) - expected) / expected).abs() < 1e-12, "x = {}", x);
    }
}

#[test]
fn test_factorial_agrees_with_ln_gamma() {
    for n in 0..=40 {
        let direct = factorial(n).ln();
        let tol = 1e-10 * direct.abs().max(1.0);
        assert!((direct - ln_gamma_int(n + 1)).abs() < tol, "n = {}", n);
        assert!((direct - ln_factorial(n as f64)).abs() < tol, "n = {}", n);
        assert!((direct - ln_gamma(n as f64 + 1.0).unwrap()).abs() < tol, "n = {}", n);
    }
}

#[test]
fn test_factorial_saturates_to_infinity() {
    assert_eq!(factorial(171), f64::INFINITY);
    assert_eq!(factorial(i32::MAX), f64::INFINITY);
    assert_eq!(factorial(-1), 0.0);
}

#[test]
fn test_romberg_integrates_exponential() {
    // Integral of exp(-x) over [0, 10]
    let v = romberg_integrate(|x: f64| (-x).exp(), 0.0, 10.0, 1e-10, 1, 1).unwrap();
    assert!((v - (1.0 - (-10.0f64).exp())).abs() < 1e-8);
}

#[test]
fn test_nint_rounds_half_away_from_zero() {
    assert_eq!(nint(2.5), 3);
    assert_eq!(nint(-2.5), -3);
    assert_eq!(nint(2.49), 2);
    assert_eq!(gcd(12, 18), 6);
}
