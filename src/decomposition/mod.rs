//! Channel-wise SVD and rank-truncated reconstruction.
//!
//! This module provides:
//! - `Decomposer`: computes reduced SVDs of grayscale and color images
//! - `Decomposition`: cached factors of one image, reconstructed at any rank
//! - `low_rank_approximate`: the truncated product `U_k · diag(S_k) · Vt_k`
//!
//! # Examples
//!
//! ## Grayscale image
//! ```rust
//! use imagesvd::{Decomposer, PixelImage};
//! use ndarray::array;
//!
//! let image = PixelImage::Grayscale(array![
//!     [10, 20, 30],
//!     [20, 40, 60],
//!     [30, 60, 95]
//! ]);
//!
//! let decomposition = Decomposer::new().decompose(&image).unwrap();
//!
//! // Rank is chosen by the caller on every reconstruction
//! let compressed = decomposition.reconstruct(1).unwrap();
//! let restored = decomposition.reconstruct(decomposition.max_rank()).unwrap();
//! assert_eq!(restored, image);
//! ```
//!
//! ## Color image
//! ```rust
//! use imagesvd::{Decomposer, PixelImage, RankPolicy};
//! use ndarray::Array3;
//!
//! let pixels = Array3::from_shape_fn((8, 6, 3), |(i, j, c)| (i * 20 + j * 7 + c * 40) as u8);
//!
//! let decomposer = Decomposer::new().rank_policy(RankPolicy::Reject);
//! let color = decomposer.decompose_color(pixels.view()).unwrap();
//! assert_eq!(color.max_rank(), 6);
//!
//! let [red, green, blue] = color.approximate(2).unwrap();
//! assert_eq!(red.shape(), &[8, 6]);
//! ```
//!
//! ## Raw factors
//! ```rust
//! use imagesvd::{Decomposer, low_rank_approximate};
//! use ndarray::array;
//!
//! let a = array![[3.0, 2.0, 2.0], [2.0, 3.0, -2.0]];
//! let triple = Decomposer::new().decompose_matrix(a.view());
//!
//! let zero = low_rank_approximate(&triple.u, &triple.s, &triple.vt, 0).unwrap();
//! assert_eq!(zero, ndarray::Array2::<f64>::zeros((2, 3)));
//! ```

mod approximation;
mod decomposer;
mod jacobi;

pub use approximation::low_rank_approximate;
pub use decomposer::{ColorSvd, Decomposer, Decomposition, Factors, RankPolicy, SvdTriple};
