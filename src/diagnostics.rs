//! Singular value statistics for the charting collaborator.
//!
//! Two charts are drawn from a channel's spectrum: `log10 σ_j` against `j`,
//! and the cumulative share of energy against `j` with a marker at the
//! chosen rank.

use crate::Vector;

/// How much a singular value contributes to the total energy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnergyConvention {
    /// `σ`
    #[default]
    Magnitude,
    /// `σ²`, the share of the squared Frobenius norm.
    Squared,
}

impl EnergyConvention {
    fn weight(self, sigma: f64) -> f64 {
        match self {
            EnergyConvention::Magnitude => sigma,
            EnergyConvention::Squared => sigma * sigma,
        }
    }
}

/// Running share of the total energy held by the first `j + 1` components.
///
/// A channel without energy (empty or all zeros) yields all zeros.
pub fn cumulative_energy(s: &Vector, convention: EnergyConvention) -> Vector {
    let weights = s.mapv(|sigma| convention.weight(sigma));
    let total = weights.sum();

    if !(total > 0.0) {
        return Vector::zeros(s.len());
    }

    weights
        .iter()
        .scan(0.0, |running, &w| {
            *running += w;
            Some((*running / total).min(1.0))
        })
        .collect()
}

/// Share of the energy kept by a rank-`rank` approximation, i.e. the first
/// `rank` components. This is `cumulative_energy(s)[rank - 1]`, one index
/// before `rank` on the cumulative curve; rank 0 keeps nothing.
pub fn captured_energy(s: &Vector, rank: usize, convention: EnergyConvention) -> f64 {
    if rank == 0 || s.is_empty() {
        return 0.0;
    }

    let curve = cumulative_energy(s, convention);
    curve[rank.min(curve.len()) - 1]
}

/// `(j, log10 σ_j)` points for a semilog plot. Zero values have no
/// logarithm and are left out.
pub fn log_spectrum(s: &Vector) -> Vec<(usize, f64)> {
    s.iter()
        .enumerate()
        .filter(|&(_, &sigma)| sigma > 0.0)
        .map(|(j, &sigma)| (j, sigma.log10()))
        .collect()
}

/// Numbers stored by rank-`rank` factors of a `rows×cols` channel,
/// `rank·(rows + cols + 1)`, relative to the `rows·cols` raw samples.
pub fn storage_ratio(rows: usize, cols: usize, rank: usize) -> f64 {
    let raw = rows * cols;
    if raw == 0 {
        return 0.0;
    }
    (rank * (rows + cols + 1)) as f64 / raw as f64
}

/// Chart data for one channel.
///
/// `cumulative_energy[j]` covers components `0..=j`, so the marker for a
/// rank-`rank` reconstruction belongs at index `rank - 1` with height
/// `captured_energy`, not at index `rank`. At rank 0 there is no point on
/// the curve and `captured_energy` is 0.
#[derive(Clone, Debug, PartialEq)]
pub struct SpectrumReport {
    pub singular_values: Vector,
    pub cumulative_energy: Vector,
    pub rank: usize,
    pub captured_energy: f64,
}

impl SpectrumReport {
    pub fn new(s: &Vector, rank: usize, convention: EnergyConvention) -> Self {
        Self {
            singular_values: s.clone(),
            cumulative_energy: cumulative_energy(s, convention),
            rank,
            captured_energy: captured_energy(s, rank, convention),
        }
    }

    pub fn log_spectrum(&self) -> Vec<(usize, f64)> {
        log_spectrum(&self.singular_values)
    }
}
