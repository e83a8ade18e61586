//! Image compression by rank-truncated singular value decomposition.
//!
//! An image channel is factored once into `U · diag(S) · Vt`; any number of
//! rank-`k` approximations can then be rebuilt from the cached factors.
//!
//! ```rust
//! use imagesvd::{Decomposer, PixelImage};
//! use ndarray::array;
//!
//! let image = PixelImage::Grayscale(array![[255u8, 0], [0, 255]]);
//!
//! let decomposition = Decomposer::new().decompose(&image).unwrap();
//! assert_eq!(decomposition.max_rank(), 2);
//!
//! let restored = decomposition.reconstruct(2).unwrap();
//! assert_eq!(restored, image);
//! ```

pub use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayView3};

pub mod decomposition;
pub mod diagnostics;
pub mod error;
pub mod image;
pub mod metrics;

pub use decomposition::{
    ColorSvd, Decomposer, Decomposition, Factors, RankPolicy, SvdTriple, low_rank_approximate,
};
pub use diagnostics::{EnergyConvention, SpectrumReport};
pub use error::{Result, SvdError};
pub use image::{Channel, ImageKind, PixelImage, classify, dimensionality};

pub type Vector = Array1<f64>;
pub type Matrix = Array2<f64>;
