//! Dense real polynomials with a real-root finder.
//!
//! Roots are isolated recursively: the real roots of `p'` split the search
//! interval into monotone pieces, and each piece holds at most one root of
//! `p`, which is found by bisection. Only real roots are ever produced.

use std::ops::{Add, Mul, Neg, Sub};

/// Maximum bisection iterations per monotone interval.
const BISECTION_ITERATIONS: usize = 200;

/// Roots closer than this are merged.
const ROOT_MERGE_TOLERANCE: f64 = 1e-9;

/// Polynomial with coefficients in ascending order of degree.
#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial {
    coeffs: Vec<f64>,
}

impl Polynomial {
    /// Build from ascending coefficients, dropping negligible leading terms.
    pub fn new(coeffs: Vec<f64>) -> Self {
        let mut poly = Self { coeffs };
        poly.trim();
        poly
    }

    pub fn constant(c: f64) -> Self {
        Self::new(vec![c])
    }

    /// The polynomial `t`.
    pub fn identity() -> Self {
        Self::new(vec![0.0, 1.0])
    }

    pub fn zero() -> Self {
        Self { coeffs: Vec::new() }
    }

    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// Degree of the polynomial; the zero polynomial reports 0.
    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    fn trim(&mut self) {
        let scale = self.coeffs.iter().fold(0.0_f64, |m, c| m.max(c.abs()));
        let cutoff = scale * 1e-14;
        while let Some(&last) = self.coeffs.last() {
            if last.abs() <= cutoff {
                self.coeffs.pop();
            } else {
                break;
            }
        }
    }

    /// Evaluate with Horner's scheme.
    pub fn eval(&self, t: f64) -> f64 {
        self.coeffs.iter().rev().fold(0.0, |acc, &c| acc * t + c)
    }

    pub fn derivative(&self) -> Self {
        Self::new(
            self.coeffs
                .iter()
                .enumerate()
                .skip(1)
                .map(|(i, &c)| c * i as f64)
                .collect(),
        )
    }

    /// `q(t) = p(t + offset)`.
    pub fn shifted(&self, offset: f64) -> Self {
        let linear = Self::new(vec![offset, 1.0]);
        self.coeffs
            .iter()
            .rev()
            .fold(Self::zero(), |acc, &c| &(&acc * &linear) + &Self::constant(c))
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.coeffs.iter().map(|c| c * factor).collect())
    }

    /// Cauchy bound: every real root lies in `[-bound, bound]`.
    pub fn root_bound(&self) -> f64 {
        let Some(&lead) = self.coeffs.last() else {
            return 0.0;
        };
        let max_ratio = self.coeffs[..self.coeffs.len() - 1]
            .iter()
            .fold(0.0_f64, |m, c| m.max((c / lead).abs()));
        1.0 + max_ratio
    }

    /// All distinct real roots in `[lo, hi]`, sorted ascending.
    ///
    /// The zero polynomial and non-zero constants have no isolated roots.
    pub fn real_roots_in(&self, lo: f64, hi: f64) -> Vec<f64> {
        if lo.is_nan() || hi.is_nan() || lo > hi {
            return Vec::new();
        }
        let mut roots = match self.degree() {
            0 => Vec::new(),
            1 => vec![-self.coeffs[0] / self.coeffs[1]],
            2 => self.quadratic_roots(),
            _ => self.isolated_roots(lo, hi),
        };
        roots.retain(|r| r.is_finite() && *r >= lo && *r <= hi);
        roots.sort_by(f64::total_cmp);
        roots.dedup_by(|a, b| (*a - *b).abs() <= ROOT_MERGE_TOLERANCE);
        roots
    }

    /// Smallest real root in `[lo, hi]`, if any.
    pub fn min_root_in(&self, lo: f64, hi: f64) -> Option<f64> {
        self.real_roots_in(lo, hi).into_iter().next()
    }

    fn quadratic_roots(&self) -> Vec<f64> {
        let (c, b, a) = (self.coeffs[0], self.coeffs[1], self.coeffs[2]);
        let discriminant = b * b - 4.0 * a * c;
        let tolerance = 1e-12 * (b * b).max((4.0 * a * c).abs());
        if discriminant < -tolerance {
            return Vec::new();
        }
        if discriminant <= tolerance {
            return vec![-b / (2.0 * a)];
        }
        // Numerically stable form avoids cancellation
        let q = -0.5 * (b + b.signum() * discriminant.sqrt());
        if q == 0.0 {
            return vec![0.0];
        }
        vec![q / a, c / q]
    }

    fn isolated_roots(&self, lo: f64, hi: f64) -> Vec<f64> {
        let critical = self.derivative().real_roots_in(lo, hi);
        let touch_tolerance = 1e-9 * (1.0 + self.coeffs.iter().fold(0.0_f64, |m, c| m.max(c.abs())));

        let mut breakpoints = Vec::with_capacity(critical.len() + 2);
        breakpoints.push(lo);
        breakpoints.extend(critical.iter().copied());
        breakpoints.push(hi);

        let mut roots = Vec::new();
        for window in breakpoints.windows(2) {
            let (a, b) = (window[0], window[1]);
            let (fa, fb) = (self.eval(a), self.eval(b));
            if fa == 0.0 {
                roots.push(a);
            } else if fa.signum() != fb.signum() && fb != 0.0 {
                roots.push(self.bisect(a, b, fa));
            }
        }
        if self.eval(hi) == 0.0 {
            roots.push(hi);
        }
        // Double roots touch zero without a sign change
        roots.extend(
            critical
                .iter()
                .copied()
                .filter(|&c| self.eval(c).abs() <= touch_tolerance),
        );
        roots
    }

    fn bisect(&self, mut a: f64, mut b: f64, mut fa: f64) -> f64 {
        for _ in 0..BISECTION_ITERATIONS {
            let mid = 0.5 * (a + b);
            if mid <= a || mid >= b {
                break;
            }
            let fm = self.eval(mid);
            if fm == 0.0 {
                return mid;
            }
            if fm.signum() == fa.signum() {
                a = mid;
                fa = fm;
            } else {
                b = mid;
            }
        }
        0.5 * (a + b)
    }
}

impl Add for &Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &Polynomial) -> Polynomial {
        let len = self.coeffs.len().max(rhs.coeffs.len());
        Polynomial::new(
            (0..len)
                .map(|i| {
                    self.coeffs.get(i).copied().unwrap_or(0.0)
                        + rhs.coeffs.get(i).copied().unwrap_or(0.0)
                })
                .collect(),
        )
    }
}

impl Sub for &Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: &Polynomial) -> Polynomial {
        self + &(-rhs)
    }
}

impl Neg for &Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        self.scaled(-1.0)
    }
}

impl Mul for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: &Polynomial) -> Polynomial {
        if self.is_zero() || rhs.is_zero() {
            return Polynomial::zero();
        }
        let mut out = vec![0.0; self.coeffs.len() + rhs.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in rhs.coeffs.iter().enumerate() {
                out[i + j] += a * b;
            }
        }
        Polynomial::new(out)
    }
}
