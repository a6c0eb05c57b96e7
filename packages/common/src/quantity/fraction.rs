use std::fmt;

/// Denominators a rendered fraction may use: halves, thirds, quarters, eighths.
const DENOMINATORS: [u32; 4] = [2, 3, 4, 8];

/// Minimum improvement for a larger denominator to win over a smaller one.
const EPSILON: f64 = 1e-9;

/// A non-negative amount as a whole part plus a proper fraction in lowest terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixedNumber {
    pub whole: u64,
    pub numerator: u32,
    pub denominator: u32,
}

impl MixedNumber {
    /// Approximate `amount` using the closest kitchen fraction.
    ///
    /// Floating-point noise such as `0.333333` snaps to `1/3`. A remainder
    /// that snaps to zero or one folds into the whole part. Returns `None`
    /// for negative or non-finite input, and when the whole part does not
    /// fit in a `u64`.
    pub fn approximate(amount: f64) -> Option<Self> {
        // u64::MAX rounds up to 2^64 as f64, so this bound is exclusive.
        if !amount.is_finite() || amount < 0.0 || amount >= u64::MAX as f64 {
            return None;
        }

        let floor = amount.floor();
        let mut whole = floor as u64;
        let (mut numerator, mut denominator) = closest_fraction(amount - floor);

        if numerator == 0 {
            denominator = 1;
        } else if numerator == denominator {
            whole = whole.saturating_add(1);
            numerator = 0;
            denominator = 1;
        }

        let divisor = gcd(numerator, denominator);
        Some(Self {
            whole,
            numerator: numerator / divisor,
            denominator: denominator / divisor,
        })
    }

    pub fn is_zero(&self) -> bool {
        self.whole == 0 && self.numerator == 0
    }

    pub fn is_whole(&self) -> bool {
        self.numerator == 0
    }
}

impl fmt::Display for MixedNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.whole, self.numerator) {
            (whole, 0) => write!(f, "{whole}"),
            (0, n) => write!(f, "{n}/{}", self.denominator),
            (whole, n) => write!(f, "{whole} {n}/{}", self.denominator),
        }
    }
}

/// Closest `n/d` to `remainder` (in `[0, 1)`) over the allowed denominators.
/// Ties go to the smaller denominator.
fn closest_fraction(remainder: f64) -> (u32, u32) {
    let mut best = (0, 1);
    let mut best_err = remainder;

    for d in DENOMINATORS {
        let n = (remainder * f64::from(d)).round() as u32;
        let err = (remainder - f64::from(n) / f64::from(d)).abs();
        if err + EPSILON < best_err {
            best = (n, d);
            best_err = err;
        }
    }

    best
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}
