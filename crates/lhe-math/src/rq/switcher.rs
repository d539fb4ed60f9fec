//! Switching a polynomial to the next context of a modulus chain by
//! dropping the last modulus.

use super::{Poly, Representation};
use crate::{zq::Modulus, Error, Result};
use ndarray::s;

impl Poly {
    /// Divide the polynomial by the last modulus of its context with
    /// rounding, and drop the corresponding residues.
    ///
    /// The polynomial must be in power basis. After the call, it is
    /// associated with the next context of the chain.
    pub fn mod_switch_down_next(&mut self) -> Result<()> {
        if self.representation != Representation::PowerBasis {
            return Err(Error::IncorrectRepresentation(
                self.representation.clone(),
                Representation::PowerBasis,
            ));
        }
        let next_ctx = self
            .ctx
            .next_context
            .as_ref()
            .ok_or(Error::InvalidContext)?
            .clone();

        let q_len = self.ctx.q.len();
        let q_last = &self.ctx.q[q_len - 1];
        let half = q_last.modulus() >> 1;

        // Rounding is folded into the flooring division by adding half of
        // the dropped modulus before reducing.
        let last_plus_half: Vec<u64> = self
            .coefficients
            .row(q_len - 1)
            .iter()
            .map(|x| q_last.add(*x, half))
            .collect();

        for j in 0..q_len - 1 {
            let qj = &self.ctx.q[j];
            let inv = self.ctx.inv_last_qi_mod_qj[j];
            let inv_shoup = self.ctx.inv_last_qi_mod_qj_shoup[j];
            let half_mod_qj = qj.reduce(half);
            let mut row = self.coefficients.row_mut(j);
            for (x, lh) in row.iter_mut().zip(last_plus_half.iter()) {
                let correction = qj.sub(qj.reduce(*lh), half_mod_qj);
                *x = qj.mul_shoup(qj.sub(*x, correction), inv, inv_shoup);
            }
        }

        self.coefficients = self.coefficients.slice(s![..q_len - 1, ..]).to_owned();
        self.ctx = next_ctx;
        Ok(())
    }

    /// Same as [`Poly::mod_switch_down_next`], operating on a polynomial in
    /// Ntt representation: the dropped residues are inverse-transformed once
    /// and the correction is re-transformed under each remaining modulus.
    pub fn mod_switch_down_next_ntt(&mut self) -> Result<()> {
        if self.representation != Representation::Ntt {
            return Err(Error::IncorrectRepresentation(
                self.representation.clone(),
                Representation::Ntt,
            ));
        }
        let next_ctx = self
            .ctx
            .next_context
            .as_ref()
            .ok_or(Error::InvalidContext)?
            .clone();

        let q_len = self.ctx.q.len();
        let q_last = &self.ctx.q[q_len - 1];
        let half = q_last.modulus() >> 1;

        let mut last = self.coefficients.row(q_len - 1).to_vec();
        self.ctx.ops[q_len - 1].backward(&mut last);
        let last_plus_half: Vec<u64> = last.iter().map(|x| q_last.add(*x, half)).collect();

        for j in 0..q_len - 1 {
            let qj = &self.ctx.q[j];
            let inv = self.ctx.inv_last_qi_mod_qj[j];
            let inv_shoup = self.ctx.inv_last_qi_mod_qj_shoup[j];
            let half_mod_qj = qj.reduce(half);

            let mut correction: Vec<u64> = last_plus_half
                .iter()
                .map(|lh| qj.sub(qj.reduce(*lh), half_mod_qj))
                .collect();
            self.ctx.ops[j].forward(&mut correction);

            let mut row = self.coefficients.row_mut(j);
            for (x, c) in row.iter_mut().zip(correction.iter()) {
                *x = qj.mul_shoup(qj.sub(*x, *c), inv, inv_shoup);
            }
        }

        self.coefficients = self.coefficients.slice(s![..q_len - 1, ..]).to_owned();
        self.ctx = next_ctx;
        Ok(())
    }

    /// Divide the polynomial by the last modulus of its context while
    /// preserving its congruence modulo the message modulus `t`, and drop
    /// the corresponding residues.
    ///
    /// The dropped residues are completed to a multiple of `t` before the
    /// exact division, so the result is congruent to `self * q_last^(-1)`
    /// modulo `t`. Returns `q_last^(-1) mod t` so the caller can track the
    /// implicit scaling. The polynomial must be in Ntt representation.
    pub fn mod_switch_down_next_mod_t(&mut self, t: &Modulus) -> Result<u64> {
        if self.representation != Representation::Ntt {
            return Err(Error::IncorrectRepresentation(
                self.representation.clone(),
                Representation::Ntt,
            ));
        }
        let next_ctx = self
            .ctx
            .next_context
            .as_ref()
            .ok_or(Error::InvalidContext)?
            .clone();

        let q_len = self.ctx.q.len();
        let q_last = &self.ctx.q[q_len - 1];
        let inv_q_last_mod_t = t.inv(t.reduce(q_last.modulus())).ok_or_else(|| {
            Error::Default("The last modulus is not invertible modulo t".to_string())
        })?;

        let mut delta = self.coefficients.row(q_len - 1).to_vec();
        self.ctx.ops[q_len - 1].backward(&mut delta);

        // w = -delta * q_last^(-1) mod t, so that delta + q_last * w is both
        // congruent to delta modulo q_last and divisible by t.
        let w: Vec<u64> = delta
            .iter()
            .map(|d| t.mul(t.neg(t.reduce(*d)), inv_q_last_mod_t))
            .collect();

        for j in 0..q_len - 1 {
            let qj = &self.ctx.q[j];
            let inv = self.ctx.inv_last_qi_mod_qj[j];
            let inv_shoup = self.ctx.inv_last_qi_mod_qj_shoup[j];
            let q_last_mod_qj = qj.reduce(q_last.modulus());

            let mut correction: Vec<u64> = delta
                .iter()
                .zip(w.iter())
                .map(|(d, wi)| qj.add(qj.reduce(*d), qj.mul(qj.reduce(*wi), q_last_mod_qj)))
                .collect();
            self.ctx.ops[j].forward(&mut correction);

            let mut row = self.coefficients.row_mut(j);
            for (x, c) in row.iter_mut().zip(correction.iter()) {
                *x = qj.mul_shoup(qj.sub(*x, *c), inv, inv_shoup);
            }
        }

        self.coefficients = self.coefficients.slice(s![..q_len - 1, ..]).to_owned();
        self.ctx = next_ctx;
        Ok(inv_q_last_mod_t)
    }
}
