//! Arithmetic operations over polynomials in rq.

use super::{Poly, Representation};
use itertools::izip;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

impl AddAssign<&Poly> for Poly {
    fn add_assign(&mut self, p: &Poly) {
        assert_eq!(self.ctx, p.ctx, "Incompatible contexts");
        assert_eq!(
            self.representation, p.representation,
            "Incompatible representations"
        );
        for (mut row, other, qi) in izip!(
            self.coefficients.outer_iter_mut(),
            p.coefficients.outer_iter(),
            self.ctx.q.iter()
        ) {
            qi.add_vec(row.as_slice_mut().unwrap(), other.as_slice().unwrap());
        }
    }
}

impl SubAssign<&Poly> for Poly {
    fn sub_assign(&mut self, p: &Poly) {
        assert_eq!(self.ctx, p.ctx, "Incompatible contexts");
        assert_eq!(
            self.representation, p.representation,
            "Incompatible representations"
        );
        for (mut row, other, qi) in izip!(
            self.coefficients.outer_iter_mut(),
            p.coefficients.outer_iter(),
            self.ctx.q.iter()
        ) {
            qi.sub_vec(row.as_slice_mut().unwrap(), other.as_slice().unwrap());
        }
    }
}

impl MulAssign<&Poly> for Poly {
    fn mul_assign(&mut self, p: &Poly) {
        assert_eq!(self.ctx, p.ctx, "Incompatible contexts");
        assert_eq!(
            self.representation,
            Representation::Ntt,
            "Multiplication requires the Ntt representation"
        );
        assert_eq!(
            p.representation,
            Representation::Ntt,
            "Multiplication requires the Ntt representation"
        );
        for (mut row, other, qi) in izip!(
            self.coefficients.outer_iter_mut(),
            p.coefficients.outer_iter(),
            self.ctx.q.iter()
        ) {
            qi.mul_vec(row.as_slice_mut().unwrap(), other.as_slice().unwrap());
        }
    }
}

impl Add<&Poly> for &Poly {
    type Output = Poly;
    fn add(self, p: &Poly) -> Poly {
        let mut q = self.clone();
        q += p;
        q
    }
}

impl Sub<&Poly> for &Poly {
    type Output = Poly;
    fn sub(self, p: &Poly) -> Poly {
        let mut q = self.clone();
        q -= p;
        q
    }
}

impl Mul<&Poly> for &Poly {
    type Output = Poly;
    fn mul(self, p: &Poly) -> Poly {
        let mut q = self.clone();
        q *= p;
        q
    }
}

impl Poly {
    /// Multiply the polynomial by an integer scalar, in place.
    pub fn mul_scalar(&mut self, scalar: u64) {
        for (mut row, qi) in self
            .coefficients
            .outer_iter_mut()
            .zip(self.ctx.q.iter())
        {
            qi.scalar_mul_vec(row.as_slice_mut().unwrap(), scalar);
        }
    }
}

impl Neg for &Poly {
    type Output = Poly;
    fn neg(self) -> Poly {
        let mut out = self.clone();
        for (mut row, qi) in out
            .coefficients
            .outer_iter_mut()
            .zip(out.ctx.q.iter())
        {
            qi.neg_vec(row.as_slice_mut().unwrap());
        }
        out
    }
}
