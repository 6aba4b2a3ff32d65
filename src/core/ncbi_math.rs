//! Numeric utilities used by scoring and statistics
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/ncbi_math.c
//!
//! Functions that return a HUGE_VAL sentinel in NCBI return `Option` here, so a
//! domain failure can never be confused with a legitimately huge value.

use std::f64::consts::{LN_2, PI};

/// ln(pi)
const LN_PI: f64 = 1.144_729_885_849_400_2;

/// Number of exact factorials kept in the table (0! through 34!)
pub const PRECOMPUTED_FACTORIAL: usize = 35;

/// Highest derivative order supported by `poly_gamma`
pub const POLYGAMMA_ORDER_MAX: usize = 4;

/// Maximum number of Romberg diagonals
const MAX_DIAGS: usize = 20;

/// Coefficients of the rational approximation used by `general_ln_gamma`
/// Reference: ncbi_math.c _default_gamma_coef
const GAMMA_COEF: [f64; 11] = [
    4.694_580_336_184_385e+04,
    -1.560_605_207_784_446e+05,
    2.065_049_568_014_106e+05,
    -1.388_934_775_095_388e+05,
    5.031_796_415_085_709e+04,
    -9.601_592_329_182_778e+03,
    8.785_855_930_895_250e+02,
    -3.155_153_906_098_611e+01,
    2.908_143_421_162_229e-01,
    -2.319_827_630_494_973e-04,
    1.251_639_670_050_933e-10,
];

const FACTORIALS: [f64; PRECOMPUTED_FACTORIAL] = [
    1.0,
    1.0,
    2.0,
    6.0,
    24.0,
    120.0,
    720.0,
    5040.0,
    40320.0,
    362880.0,
    3628800.0,
    39916800.0,
    479001600.0,
    6227020800.0,
    87178291200.0,
    1307674368000.0,
    20922789888000.0,
    355687428096000.0,
    6402373705728000.0,
    121645100408832000.0,
    2432902008176640000.0,
    51090942171709440000.0,
    1124000727777607680000.0,
    25852016738884976640000.0,
    620448401733239439360000.0,
    15511210043330985984000000.0,
    403291461126605635584000000.0,
    10888869450418352160768000000.0,
    304888344611713860501504000000.0,
    8841761993739701954543616000000.0,
    265252859812191058636308480000000.0,
    8222838654177922817725562880000000.0,
    263130836933693530167218012160000000.0,
    8683317618811886495518194401280000000.0,
    295232799039604140847618609643520000000.0,
];

/// e^x - 1 without cancellation near zero.
///
/// Reference: ncbi_math.c BLAST_Expm1
pub fn expm1(x: f64) -> f64 {
    let absx = x.abs();
    if absx > 0.33 {
        return x.exp() - 1.0;
    }
    if absx < 1.0e-16 {
        return x;
    }
    x * (1.0
        + x * (1.0 / 2.0
            + x * (1.0 / 6.0
                + x * (1.0 / 24.0
                    + x * (1.0 / 120.0
                        + x * (1.0 / 720.0
                            + x * (1.0 / 5040.0
                                + x * (1.0 / 40320.0
                                    + x * (1.0 / 362880.0
                                        + x * (1.0 / 3628800.0
                                            + x * (1.0 / 39916800.0
                                                + x * (1.0 / 479001600.0
                                                    + x / 6227020800.0))))))))))))
}

/// ln(1 + x) without cancellation near zero.
///
/// Reference: ncbi_math.c BLAST_Log1p
pub fn log1p(x: f64) -> f64 {
    if x.abs() >= 0.2 {
        return (x + 1.0).ln();
    }

    // Alternating series, two terms per pass, at most 500 terms.
    let mut sum = 0.0;
    let mut y = x;
    let mut i = 0u32;
    while i < 500 {
        i += 1;
        sum += y / i as f64;
        if y.abs() < f64::EPSILON {
            break;
        }
        y *= x;
        i += 1;
        sum -= y / i as f64;
        if y.abs() < f64::EPSILON {
            break;
        }
        y *= x;
    }
    sum
}

/// n! as a double. Exact for n <= 34; 0.0 for negative n, +inf once it
/// overflows.
///
/// Reference: ncbi_math.c BLAST_Factorial
pub fn factorial(n: i32) -> f64 {
    if n < 0 {
        return 0.0;
    }
    if (n as usize) < PRECOMPUTED_FACTORIAL {
        return FACTORIALS[n as usize];
    }
    ln_factorial(n as f64).exp()
}

/// ln(Gamma(n)) for integer n.
///
/// Reference: ncbi_math.c BLAST_LnGammaInt
pub fn ln_gamma_int(n: i32) -> f64 {
    if n > 1 && (n as usize) < PRECOMPUTED_FACTORIAL {
        return FACTORIALS[(n - 1) as usize].ln();
    }
    ln_gamma(n as f64).unwrap_or(f64::INFINITY)
}

/// ln(x!) for real x; 0.0 for x <= 0.
///
/// Reference: ncbi_math.c BLAST_LnFactorial
pub fn ln_factorial(x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    ln_gamma(x + 1.0).unwrap_or(f64::INFINITY)
}

/// ln(Gamma(x)). `None` at the poles (x = 0, -1, -2, ...).
pub fn ln_gamma(x: f64) -> Option<f64> {
    poly_gamma(x, 0)
}

/// Derivatives of ln(Gamma(x)): order 0 is ln(Gamma), order 1 digamma, and so on.
///
/// Valid for `order` in `0..=POLYGAMMA_ORDER_MAX`. Uses the rational approximation
/// for x >= 1, the recurrence Gamma(x + 1) = x Gamma(x) for 0 <= x < 1, and the
/// reflection formula for x < 0.
///
/// Reference: ncbi_math.c s_PolyGamma
pub fn poly_gamma(x: f64, order: usize) -> Option<f64> {
    if order > POLYGAMMA_ORDER_MAX {
        return None;
    }

    if x >= 1.0 {
        return general_ln_gamma(x, order);
    }

    if x < 0.0 {
        let mut value = general_ln_gamma(1.0 - x, order)?;
        if order % 2 == 0 {
            value = -value;
        }
        if order == 0 {
            let sx = (PI * x).sin().abs();
            if (x < -0.1 && (x.ceil() == x || sx < 2.0 * f64::EPSILON)) || sx == 0.0 {
                return None;
            }
            value += LN_PI - sx.ln();
        } else {
            let mut y = [0.0; POLYGAMMA_ORDER_MAX + 1];
            let mut px = x * PI;
            y[0] = px.sin();
            let mut tmp = 1.0;
            for yk in y.iter_mut().take(order + 1).skip(1) {
                tmp *= PI;
                px += PI / 2.0;
                *yk = tmp * px.sin();
            }
            value -= log_derivative(order, &y)?;
        }
        return Some(value);
    }

    let mut value = general_ln_gamma(1.0 + x, order)?;
    if order == 0 {
        if x == 0.0 {
            return None;
        }
        value -= x.ln();
    } else {
        let tmp = factorial(order as i32 - 1) * powi(x, -(order as i32))?;
        value += if order % 2 == 0 { tmp } else { -tmp };
    }
    Some(value)
}

/// Derivative of ln(u) given u and its derivatives.
///
/// Reference: ncbi_math.c s_LogDerivative
fn log_derivative(order: usize, u: &[f64]) -> Option<f64> {
    if order > POLYGAMMA_ORDER_MAX {
        return None;
    }
    if order > 0 && u[0] == 0.0 {
        return None;
    }

    let mut y = [0.0; POLYGAMMA_ORDER_MAX + 1];
    for i in 1..=order {
        y[i] = u[i] / u[0];
    }

    let value = match order {
        0 => {
            if u[0] > 0.0 {
                u[0].ln()
            } else {
                return None;
            }
        }
        1 => y[1],
        2 => y[2] - y[1] * y[1],
        3 => y[3] - 3.0 * y[2] * y[1] + 2.0 * y[1] * y[1] * y[1],
        _ => {
            let sq = y[1] * y[1];
            y[4] - 4.0 * y[3] * y[1] - 3.0 * y[2] * y[2] + 12.0 * y[2] * sq - 6.0 * sq * sq
        }
    };
    Some(value)
}

/// Rational approximation of the ln(Gamma) family for x >= 1.
///
/// Reference: ncbi_math.c s_GeneralLnGamma
fn general_ln_gamma(x: f64, order: usize) -> Option<f64> {
    let dim = GAMMA_COEF.len();
    let xx = x - 1.0;
    let tx = xx + dim as f64;

    let mut y = [0.0; POLYGAMMA_ORDER_MAX + 1];
    for (i, yi) in y.iter_mut().enumerate().take(order + 1) {
        let mut tmp = tx;
        // Least significant terms first.
        let mut value = 0.0;
        for (k, coef) in GAMMA_COEF.iter().enumerate().rev() {
            if k + 1 < dim {
                tmp -= 1.0;
            }
            value += if i == 0 {
                coef / tmp
            } else {
                coef / powi(tmp, i as i32 + 1)?
            };
        }
        if i > 0 {
            let f = factorial(i as i32);
            value *= if i % 2 == 0 { f } else { -f };
        }
        *yi = value;
    }
    y[0] += 1.0;

    let mut value = log_derivative(order, &y)?;
    let tmp = tx + 0.5;
    let dim = dim as f64;
    match order {
        0 => value += (LN_PI + LN_2) / 2.0 + (xx + 0.5) * tmp.ln() - tmp,
        1 => value += tmp.ln() - dim / tmp,
        2 => value += (tmp + dim) / (tmp * tmp),
        3 => value -= (1.0 + 2.0 * dim / tmp) / (tmp * tmp),
        _ => value += 2.0 * (1.0 + 3.0 * dim / tmp) / (tmp * tmp * tmp),
    }
    Some(value)
}

/// Romberg integration of `f` over `[p, q]`.
///
/// Iterates until the two most extrapolated estimates agree to within `eps`
/// (relative) for `epsit` consecutive passes, after at least `itmin` passes.
/// Returns `None` if `f` produces a non-finite value or the table of
/// `MAX_DIAGS` diagonals is exhausted without convergence.
///
/// Reference: ncbi_math.c BLAST_RombergIntegrate
pub fn romberg_integrate<F>(mut f: F, p: f64, q: f64, eps: f64, epsit: i32, itmin: i32) -> Option<f64>
where
    F: FnMut(f64) -> f64,
{
    let itmin = itmin.clamp(1, MAX_DIAGS as i32 - 1);
    let epsit = epsit.clamp(1, 3);
    let epsck = itmin - epsit;

    let finite = |v: f64| if v.is_finite() { Some(v) } else { None };

    let mut romb = [0.0_f64; MAX_DIAGS];
    let mut npts = 1usize;
    let mut h = q - p;

    let x0 = finite(f(p))?;
    let y0 = finite(f(q))?;
    romb[0] = 0.5 * h * (x0 + y0);

    let mut epsit_cnt = 0;
    for i in 1..MAX_DIAGS {
        let mut sum = 0.0;
        let mut x = p + 0.5 * h;
        for _ in 0..npts {
            sum += finite(f(x))?;
            x += h;
        }
        romb[i] = 0.5 * (romb[i - 1] + h * sum);

        // Richardson extrapolation, most extrapolated estimate ends in romb[0].
        let mut n = 4.0;
        for j in (0..i).rev() {
            romb[j] = (n * romb[j + 1] - romb[j]) / (n - 1.0);
            n *= 4.0;
        }

        if i as i32 > epsck {
            if (romb[1] - romb[0]).abs() > eps * romb[0].abs() {
                epsit_cnt = 0;
            } else {
                epsit_cnt += 1;
                if i as i32 >= itmin && epsit_cnt >= epsit {
                    return Some(romb[0]);
                }
            }
        }

        npts *= 2;
        h *= 0.5;
    }

    None
}

/// Greatest common divisor; `gcd(0, b) == |b|`.
///
/// Reference: ncbi_math.c BLAST_Gcd
pub fn gcd(a: i32, b: i32) -> i32 {
    let mut a = a.abs();
    let mut b = b.abs();
    if b > a {
        std::mem::swap(&mut a, &mut b);
    }
    while b != 0 {
        let c = a % b;
        a = b;
        b = c;
    }
    a
}

/// Divide a gap-cost triple by its common factor and return that factor.
///
/// When `b` is zero it is ignored in the factor.
///
/// Reference: ncbi_math.c BLAST_Gdb3
pub fn gdb3(a: &mut i32, b: &mut i32, c: &mut i32) -> i32 {
    let g = if *b == 0 { gcd(*a, *c) } else { gcd(*a, gcd(*b, *c)) };
    if g > 1 {
        *a /= g;
        *b /= g;
        *c /= g;
    }
    g
}

/// Nearest integer, halves rounded away from zero.
///
/// Reference: ncbi_math.c BLAST_Nint
pub fn nint(x: f64) -> i64 {
    let x = x + if x >= 0.0 { 0.5 } else { -0.5 };
    x as i64
}

/// x raised to an integer power by repeated squaring.
/// `None` for zero raised to a negative power.
///
/// Reference: ncbi_math.c BLAST_Powi
pub fn powi(x: f64, n: i32) -> Option<f64> {
    if n == 0 {
        return Some(1.0);
    }
    if x == 0.0 {
        return if n < 0 { None } else { Some(0.0) };
    }

    let mut x = x;
    let mut n = n as i64;
    if n < 0 {
        x = 1.0 / x;
        n = -n;
    }
    let mut y = 1.0;
    while n > 0 {
        if n & 1 != 0 {
            y *= x;
        }
        n /= 2;
        x *= x;
    }
    Some(y)
}
