use super::approximation::low_rank_approximate;
use super::jacobi::reduced_svd;
use crate::diagnostics::{EnergyConvention, SpectrumReport};
use crate::error::{Result, SvdError};
use crate::image::{self, Channel, ImageKind, PixelImage};
use crate::{Matrix, Vector};
use ndarray::{ArrayView2, ArrayView3, ArrayViewD, Ix2, Ix3};
use tracing::debug;

/// What to do with a rank beyond the largest one the factors support.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RankPolicy {
    /// Reconstruct at full rank instead.
    #[default]
    Clamp,
    /// Fail with `SvdError::InvalidRank`.
    Reject,
}

/// Reduced SVD of one channel, `U · diag(S) · Vt`.
#[derive(Clone, Debug, PartialEq)]
pub struct SvdTriple {
    pub u: Matrix,
    pub s: Vector,
    pub vt: Matrix,
}

impl SvdTriple {
    pub fn max_rank(&self) -> usize {
        self.s.len()
    }

    /// `(rows, cols)` of the decomposed channel.
    pub fn shape(&self) -> (usize, usize) {
        (self.u.nrows(), self.vt.ncols())
    }

    pub fn approximate(&self, rank: usize) -> Result<Matrix> {
        low_rank_approximate(&self.u, &self.s, &self.vt, rank)
    }
}

/// Independent decompositions of the red, green and blue planes.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorSvd {
    pub red: SvdTriple,
    pub green: SvdTriple,
    pub blue: SvdTriple,
}

impl ColorSvd {
    /// One rank is shared by all three channels, so the smallest ceiling wins.
    pub fn max_rank(&self) -> usize {
        self.red
            .max_rank()
            .min(self.green.max_rank())
            .min(self.blue.max_rank())
    }

    pub fn channels(&self) -> [(Channel, &SvdTriple); 3] {
        let [red, green, blue] = Channel::RGB;
        [(red, &self.red), (green, &self.green), (blue, &self.blue)]
    }

    pub fn approximate(&self, rank: usize) -> Result<[Matrix; 3]> {
        Ok([
            self.red.approximate(rank)?,
            self.green.approximate(rank)?,
            self.blue.approximate(rank)?,
        ])
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Factors {
    Grayscale(SvdTriple),
    Color(ColorSvd),
}

/// Factors of one image, kept so that every rank change only re-runs the
/// truncated product.
#[derive(Clone, Debug, PartialEq)]
pub struct Decomposition {
    factors: Factors,
    rank_policy: RankPolicy,
}

impl Decomposition {
    pub fn new(factors: Factors, rank_policy: RankPolicy) -> Self {
        Self {
            factors,
            rank_policy,
        }
    }

    pub fn factors(&self) -> &Factors {
        &self.factors
    }

    pub fn kind(&self) -> ImageKind {
        match self.factors {
            Factors::Grayscale(_) => ImageKind::Grayscale,
            Factors::Color(_) => ImageKind::Color,
        }
    }

    /// Largest rank a reconstruction can use; ranks `0..=max_rank()` are valid.
    pub fn max_rank(&self) -> usize {
        match &self.factors {
            Factors::Grayscale(triple) => triple.max_rank(),
            Factors::Color(color) => color.max_rank(),
        }
    }

    pub fn channels(&self) -> Vec<(Channel, &SvdTriple)> {
        match &self.factors {
            Factors::Grayscale(triple) => vec![(Channel::Luma, triple)],
            Factors::Color(color) => color.channels().to_vec(),
        }
    }

    /// Map a requested rank onto a usable one according to the rank policy.
    pub fn resolve_rank(&self, rank: usize) -> Result<usize> {
        let max_rank = self.max_rank();
        if rank <= max_rank {
            return Ok(rank);
        }

        match self.rank_policy {
            RankPolicy::Clamp => {
                debug!(rank, max_rank, "clamping rank");
                Ok(max_rank)
            }
            RankPolicy::Reject => Err(SvdError::InvalidRank { rank, max_rank }),
        }
    }

    /// Real-valued approximation of every channel, before clipping.
    pub fn reconstruct_channels(&self, rank: usize) -> Result<Vec<(Channel, Matrix)>> {
        let rank = self.resolve_rank(rank)?;
        self.channels()
            .into_iter()
            .map(|(channel, triple)| triple.approximate(rank).map(|approx| (channel, approx)))
            .collect()
    }

    /// Displayable image of the same shape as the input, rebuilt from the
    /// leading `rank` components of each channel.
    pub fn reconstruct(&self, rank: usize) -> Result<PixelImage> {
        let rank = self.resolve_rank(rank)?;
        debug!(rank, max_rank = self.max_rank(), "reconstructing image");

        match &self.factors {
            Factors::Grayscale(triple) => {
                let approx = triple.approximate(rank)?;
                Ok(PixelImage::Grayscale(image::to_pixels(&approx)))
            }
            Factors::Color(color) => {
                let planes = color.approximate(rank)?;
                Ok(PixelImage::Color(image::stack_channels(&planes)?))
            }
        }
    }

    /// Singular value diagnostics per channel, marked at `rank`.
    pub fn spectrum(
        &self,
        rank: usize,
        convention: EnergyConvention,
    ) -> Result<Vec<(Channel, SpectrumReport)>> {
        let rank = self.resolve_rank(rank)?;
        Ok(self
            .channels()
            .into_iter()
            .map(|(channel, triple)| {
                let report = SpectrumReport::new(&triple.s, rank, convention);
                (channel, report)
            })
            .collect())
    }
}

/// Computes channel-wise reduced SVDs.
///
/// Holds configuration only; the rank for a reconstruction is always passed
/// to the `Decomposition` it produces.
#[derive(Clone, Debug)]
pub struct Decomposer {
    tolerance: f64,
    max_sweeps: usize,
    rank_policy: RankPolicy,
}

impl Decomposer {
    pub fn new() -> Self {
        Self {
            tolerance: 1e-15,
            max_sweeps: 60,
            rank_policy: RankPolicy::Clamp,
        }
    }

    /// Relative threshold below which two columns count as orthogonal.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        if !(tolerance > 0.0) {
            panic!("Invalid tolerance: {}. Must be positive", tolerance);
        }
        self.tolerance = tolerance;
        self
    }

    pub fn max_sweeps(mut self, max_sweeps: usize) -> Self {
        if max_sweeps == 0 {
            panic!("Invalid max_sweeps: 0. Must be at least 1");
        }
        self.max_sweeps = max_sweeps;
        self
    }

    pub fn rank_policy(mut self, rank_policy: RankPolicy) -> Self {
        self.rank_policy = rank_policy;
        self
    }

    /// Thin SVD of a real-valued channel.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(rows = channel.nrows(), cols = channel.ncols())
    )]
    pub fn decompose_matrix(&self, channel: ArrayView2<f64>) -> SvdTriple {
        let (u, s, vt) = reduced_svd(channel, self.tolerance, self.max_sweeps);
        SvdTriple { u, s, vt }
    }

    pub fn decompose_grayscale(&self, pixels: ArrayView2<u8>) -> SvdTriple {
        self.decompose_matrix(pixels.mapv(f64::from).view())
    }

    /// Decompose the three planes of a channels-last color image separately.
    pub fn decompose_color(&self, pixels: ArrayView3<u8>) -> Result<ColorSvd> {
        image::classify(&pixels)?;

        let [red, green, blue] = [0, 1, 2].map(|index| {
            let plane = image::channel(&pixels, index);
            self.decompose_matrix(plane.view())
        });

        Ok(ColorSvd { red, green, blue })
    }

    pub fn decompose(&self, image: &PixelImage) -> Result<Decomposition> {
        let factors = match image {
            PixelImage::Grayscale(pixels) => {
                Factors::Grayscale(self.decompose_grayscale(pixels.view()))
            }
            PixelImage::Color(pixels) => Factors::Color(self.decompose_color(pixels.view())?),
        };

        Ok(Decomposition::new(factors, self.rank_policy))
    }

    /// Decompose an array whose dimensionality is only known at runtime.
    pub fn decompose_dyn(&self, pixels: ArrayViewD<u8>) -> Result<Decomposition> {
        let shape = pixels.shape().to_vec();
        let unsupported = |_| SvdError::UnsupportedImageShape {
            shape: shape.clone(),
        };

        let factors = match image::classify(&pixels)? {
            ImageKind::Grayscale => {
                let gray = pixels.into_dimensionality::<Ix2>().map_err(unsupported)?;
                Factors::Grayscale(self.decompose_grayscale(gray))
            }
            ImageKind::Color => {
                let color = pixels.into_dimensionality::<Ix3>().map_err(unsupported)?;
                Factors::Color(self.decompose_color(color)?)
            }
        };

        Ok(Decomposition::new(factors, self.rank_policy))
    }
}

impl Default for Decomposer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::cumulative_energy;
    use ndarray::{Array2, Array3, Axis, array};
    use ndarray_rand::RandomExt;
    use ndarray_rand::rand::SeedableRng;
    use ndarray_rand::rand::rngs::StdRng;
    use ndarray_rand::rand_distr::Uniform;

    fn frobenius(m: &Matrix) -> f64 {
        m.mapv(|x| x * x).sum().sqrt()
    }

    fn max_abs(m: &Matrix) -> f64 {
        m.iter().fold(0.0, |acc, &x| acc.max(x.abs()))
    }

    fn random_matrix(rows: usize, cols: usize, seed: u64) -> Matrix {
        let mut rng = StdRng::seed_from_u64(seed);
        Matrix::random_using((rows, cols), Uniform::new(0.0, 255.0), &mut rng)
    }

    #[test]
    fn test_example_scenario() {
        let image = array![[255u8, 0], [0, 255]];
        let original = image.mapv(f64::from);

        let triple = Decomposer::new().decompose_grayscale(image.view());
        assert_eq!(triple.max_rank(), 2);

        let full = triple.approximate(2).unwrap();
        assert!(max_abs(&(&original - &full)) < 1e-9);

        let partial = triple.approximate(1).unwrap();
        assert!(frobenius(&(&original - &partial)) > 1.0);
        assert!((partial.sum() - 255.0).abs() < 1e-9);

        let zero = triple.approximate(0).unwrap();
        assert_eq!(zero, array![[0.0, 0.0], [0.0, 0.0]]);
    }

    #[test]
    fn test_reconstruction_identity() {
        for (rows, cols, seed) in [(6, 4, 1), (4, 6, 2), (5, 5, 3), (1, 7, 4)] {
            let a = random_matrix(rows, cols, seed);
            let triple = Decomposer::new().decompose_matrix(a.view());

            let restored = triple.approximate(rows.min(cols)).unwrap();
            let scale = max_abs(&a).max(1.0);
            assert!(max_abs(&(&a - &restored)) / scale < 1e-9);
        }
    }

    #[test]
    fn test_monotonic_fidelity() {
        let a = random_matrix(9, 7, 42);
        let triple = Decomposer::new().decompose_matrix(a.view());

        let errors: Vec<f64> = (0..=triple.max_rank())
            .map(|k| frobenius(&(&a - &triple.approximate(k).unwrap())))
            .collect();

        for pair in errors.windows(2) {
            assert!(pair[0] >= pair[1] - 1e-9);
        }
        assert!(errors[errors.len() - 1] < 1e-8);
    }

    #[test]
    fn test_eckart_young_residual() {
        // The rank-k error equals the energy in the discarded singular values
        let a = random_matrix(8, 6, 7);
        let triple = Decomposer::new().decompose_matrix(a.view());

        for k in 0..=triple.max_rank() {
            let residual = frobenius(&(&a - &triple.approximate(k).unwrap()));
            let tail: f64 = triple.s.iter().skip(k).map(|s| s * s).sum::<f64>().sqrt();
            assert!((residual - tail).abs() < 1e-8 * tail.max(1.0));
        }
    }

    #[test]
    fn test_singular_values_ordered() {
        for seed in 0..5 {
            let a = random_matrix(7, 5, seed);
            let triple = Decomposer::new().decompose_matrix(a.view());

            assert!(triple.s.iter().all(|&s| s >= 0.0));
            for pair in triple.s.as_slice().unwrap().windows(2) {
                assert!(pair[0] >= pair[1]);
            }
        }
    }

    #[test]
    fn test_cumulative_energy_of_decomposition() {
        let a = random_matrix(6, 6, 11);
        let triple = Decomposer::new().decompose_matrix(a.view());

        let curve = cumulative_energy(&triple.s, EnergyConvention::Magnitude);
        assert!(curve[0] >= 0.0);
        for pair in curve.as_slice().unwrap().windows(2) {
            assert!(pair[1] >= pair[0]);
        }
        assert!((curve[curve.len() - 1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_color_channel_independence() {
        let mut image = Array3::<u8>::zeros((4, 4, 3));
        image.index_axis_mut(Axis(2), 0).fill(200);

        let color = Decomposer::new().decompose_color(image.view()).unwrap();

        assert!((color.red.s[0] - 800.0).abs() < 1e-9);
        assert!(color.red.s.iter().skip(1).all(|&s| s.abs() < 1e-9));
        assert!(color.green.s.iter().all(|&s| s == 0.0));
        assert!(color.blue.s.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_color_matches_standalone_channels() {
        let image = Array3::from_shape_fn((5, 4, 3), |(i, j, c)| {
            ((i * 37 + j * 11 + c * 53) % 256) as u8
        });
        let decomposer = Decomposer::new();
        let color = decomposer.decompose_color(image.view()).unwrap();

        let order: Vec<Channel> = color.channels().iter().map(|&(channel, _)| channel).collect();
        assert_eq!(order, Channel::RGB.to_vec());

        for (channel, triple) in color.channels() {
            let index = channel.color_index().unwrap();
            let plane: Array2<u8> = image.index_axis(Axis(2), index).to_owned();
            let standalone = decomposer.decompose_grayscale(plane.view());
            assert_eq!(triple.s, standalone.s);
        }
    }

    #[test]
    fn test_decompose_color_rejects_four_channels() {
        let image = Array3::<u8>::zeros((10, 10, 4));
        assert_eq!(
            Decomposer::new().decompose_color(image.view()),
            Err(SvdError::UnsupportedImageShape {
                shape: vec![10, 10, 4]
            })
        );
    }

    #[test]
    fn test_degenerate_channels() {
        let decomposer = Decomposer::new();

        let zero = decomposer.decompose_grayscale(Array2::<u8>::zeros((3, 5)).view());
        assert_eq!(zero.max_rank(), 3);
        assert!(zero.s.iter().all(|&s| s == 0.0));
        assert_eq!(zero.approximate(3).unwrap(), Matrix::zeros((3, 5)));

        let empty = decomposer.decompose_grayscale(Array2::<u8>::zeros((0, 5)).view());
        assert_eq!(empty.max_rank(), 0);
        assert_eq!(empty.shape(), (0, 5));
        assert_eq!(empty.approximate(0).unwrap().shape(), &[0, 5]);
    }

    #[test]
    fn test_reconstruct_grayscale_roundtrip() {
        let image = Array2::from_shape_fn((6, 5), |(i, j)| ((i * 41 + j * 23) % 256) as u8);
        let pixels = PixelImage::Grayscale(image.clone());

        let decomposition = Decomposer::new().decompose(&pixels).unwrap();
        assert_eq!(decomposition.kind(), ImageKind::Grayscale);
        assert_eq!(decomposition.max_rank(), 5);

        assert_eq!(decomposition.reconstruct(5).unwrap(), pixels);
        assert_eq!(
            decomposition.reconstruct(0).unwrap(),
            PixelImage::Grayscale(Array2::zeros((6, 5)))
        );
    }

    #[test]
    fn test_reconstruct_color_clips() {
        let image = Array3::from_shape_fn((4, 6, 3), |(i, j, c)| {
            if (i + j + c) % 2 == 0 { 255 } else { 0 }
        });
        let pixels = PixelImage::Color(image.clone());

        let decomposition = Decomposer::new().decompose(&pixels).unwrap();
        assert_eq!(decomposition.kind(), ImageKind::Color);
        assert_eq!(decomposition.max_rank(), 4);
        assert_eq!(decomposition.reconstruct(4).unwrap(), pixels);

        // Every partial reconstruction stays a valid 4x6x3 image
        for rank in 0..4 {
            match decomposition.reconstruct(rank).unwrap() {
                PixelImage::Color(approx) => assert_eq!(approx.shape(), &[4, 6, 3]),
                PixelImage::Grayscale(_) => panic!("expected a color image"),
            }
        }
    }

    #[test]
    fn test_rank_policy() {
        let pixels = PixelImage::Grayscale(array![[10u8, 20], [30, 40]]);

        let clamping = Decomposer::new().decompose(&pixels).unwrap();
        assert_eq!(clamping.resolve_rank(9), Ok(2));
        assert_eq!(clamping.reconstruct(9).unwrap(), pixels);

        let strict = Decomposer::new()
            .rank_policy(RankPolicy::Reject)
            .decompose(&pixels)
            .unwrap();
        assert_eq!(strict.resolve_rank(2), Ok(2));
        assert_eq!(
            strict.reconstruct(3),
            Err(SvdError::InvalidRank {
                rank: 3,
                max_rank: 2
            })
        );
    }

    #[test]
    fn test_decompose_dyn() {
        let decomposer = Decomposer::new();

        let gray = Array2::<u8>::ones((3, 4)).into_dyn();
        let decomposition = decomposer.decompose_dyn(gray.view()).unwrap();
        assert_eq!(decomposition.kind(), ImageKind::Grayscale);

        let color = Array3::<u8>::ones((3, 4, 3)).into_dyn();
        let decomposition = decomposer.decompose_dyn(color.view()).unwrap();
        assert_eq!(decomposition.kind(), ImageKind::Color);
        assert_eq!(decomposition.channels().len(), 3);

        let rgba = Array3::<u8>::ones((3, 4, 4)).into_dyn();
        assert!(decomposer.decompose_dyn(rgba.view()).is_err());
    }

    #[test]
    fn test_spectrum_per_channel() {
        let mut image = Array3::<u8>::zeros((4, 4, 3));
        image.index_axis_mut(Axis(2), 0).fill(100);
        let decomposition = Decomposer::new()
            .decompose(&PixelImage::Color(image))
            .unwrap();

        let reports = decomposition.spectrum(1, EnergyConvention::Magnitude).unwrap();
        assert_eq!(reports.len(), 3);

        let (channel, red) = &reports[0];
        assert_eq!(*channel, Channel::Red);
        assert!((red.captured_energy - 1.0).abs() < 1e-9);

        let (_, green) = &reports[1];
        assert_eq!(green.captured_energy, 0.0);
        assert!(green.cumulative_energy.iter().all(|&e| e == 0.0));
    }

    #[test]
    #[should_panic]
    fn test_invalid_tolerance() {
        let _ = Decomposer::new().tolerance(0.0);
    }
}
