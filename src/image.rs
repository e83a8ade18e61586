//! Pixel arrays at the boundary with the image I/O collaborator.
//!
//! Images arrive decoded as `u8` arrays, either `(height, width)` for
//! grayscale or `(height, width, 3)` with channels last for color.

use crate::Matrix;
use crate::error::{Result, SvdError};
use ndarray::{Array2, Array3, ArrayBase, ArrayD, ArrayView3, Axis, Data, Dimension, Ix2, Ix3};
use std::fmt;

const COLOR_CHANNELS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageKind {
    Grayscale,
    Color,
}

/// A single plane of an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Luma,
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const RGB: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    /// Position along the trailing axis of a color array.
    pub fn color_index(self) -> Option<usize> {
        match self {
            Channel::Luma => None,
            Channel::Red => Some(0),
            Channel::Green => Some(1),
            Channel::Blue => Some(2),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Luma => "luma",
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
        };
        f.write_str(name)
    }
}

/// Number of axes of the array: 2 for grayscale, 3 for channels-last color.
pub fn dimensionality<S, D>(image: &ArrayBase<S, D>) -> usize
where
    S: Data,
    D: Dimension,
{
    image.ndim()
}

/// Decide whether an array can be compressed, and how.
pub fn classify<S, D>(image: &ArrayBase<S, D>) -> Result<ImageKind>
where
    S: Data,
    D: Dimension,
{
    match (dimensionality(image), image.shape()) {
        (2, _) => Ok(ImageKind::Grayscale),
        (3, [_, _, COLOR_CHANNELS]) => Ok(ImageKind::Color),
        _ => Err(SvdError::UnsupportedImageShape {
            shape: image.shape().to_vec(),
        }),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PixelImage {
    Grayscale(Array2<u8>),
    Color(Array3<u8>),
}

impl PixelImage {
    /// Wrap a decoded array of unknown dimensionality.
    pub fn from_dyn(image: ArrayD<u8>) -> Result<Self> {
        let shape = image.shape().to_vec();
        let unsupported = |_| SvdError::UnsupportedImageShape {
            shape: shape.clone(),
        };

        match classify(&image)? {
            ImageKind::Grayscale => image
                .into_dimensionality::<Ix2>()
                .map(PixelImage::Grayscale)
                .map_err(unsupported),
            ImageKind::Color => image
                .into_dimensionality::<Ix3>()
                .map(PixelImage::Color)
                .map_err(unsupported),
        }
    }

    pub fn kind(&self) -> ImageKind {
        match self {
            PixelImage::Grayscale(_) => ImageKind::Grayscale,
            PixelImage::Color(_) => ImageKind::Color,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            PixelImage::Grayscale(pixels) => pixels.shape(),
            PixelImage::Color(pixels) => pixels.shape(),
        }
    }

    pub fn into_dyn(self) -> ArrayD<u8> {
        match self {
            PixelImage::Grayscale(pixels) => pixels.into_dyn(),
            PixelImage::Color(pixels) => pixels.into_dyn(),
        }
    }
}

/// Copy one plane of a channels-last color array into a real-valued matrix.
pub fn channel(image: &ArrayView3<u8>, index: usize) -> Matrix {
    image.index_axis(Axis(2), index).mapv(f64::from)
}

/// Clip to `[0, 255]` and round to the nearest intensity.
pub fn to_pixels(values: &Matrix) -> Array2<u8> {
    values.mapv(to_pixel)
}

/// Stack three reconstructed planes along a new trailing axis.
pub fn stack_channels(planes: &[Matrix; 3]) -> Result<Array3<u8>> {
    let (rows, cols) = planes[0].dim();
    for plane in &planes[1..] {
        if plane.dim() != (rows, cols) {
            return Err(SvdError::ShapeMismatch {
                expected: vec![rows, cols],
                found: plane.shape().to_vec(),
            });
        }
    }

    Ok(Array3::from_shape_fn((rows, cols, COLOR_CHANNELS), |(i, j, c)| {
        to_pixel(planes[c][[i, j]])
    }))
}

fn to_pixel(value: f64) -> u8 {
    value.clamp(0.0, 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array, IxDyn, array};

    #[test]
    fn test_shape_dispatch() {
        let gray = Array::<u8, _>::zeros((10, 10));
        let color = Array::<u8, _>::zeros((10, 10, 3));
        let rgba = Array::<u8, _>::zeros((10, 10, 4));

        assert_eq!(dimensionality(&gray), 2);
        assert_eq!(dimensionality(&color), 3);
        assert_eq!(classify(&gray), Ok(ImageKind::Grayscale));
        assert_eq!(classify(&color), Ok(ImageKind::Color));
        assert_eq!(
            classify(&rgba),
            Err(SvdError::UnsupportedImageShape {
                shape: vec![10, 10, 4]
            })
        );
    }

    #[test]
    fn test_classify_rejects_other_ranks() {
        let flat = Array::<u8, _>::zeros(IxDyn(&[16]));
        let volume = Array::<u8, _>::zeros(IxDyn(&[2, 4, 4, 3]));

        assert!(classify(&flat).is_err());
        assert!(classify(&volume).is_err());
    }

    #[test]
    fn test_from_dyn() {
        let gray = Array::<u8, _>::zeros(IxDyn(&[4, 5]));
        let image = PixelImage::from_dyn(gray).unwrap();
        assert_eq!(image.kind(), ImageKind::Grayscale);
        assert_eq!(image.shape(), &[4, 5]);

        let color = Array::<u8, _>::zeros(IxDyn(&[4, 5, 3]));
        let image = PixelImage::from_dyn(color).unwrap();
        assert_eq!(image.kind(), ImageKind::Color);
        assert_eq!(image.clone().into_dyn().shape(), &[4, 5, 3]);

        let rgba = Array::<u8, _>::zeros(IxDyn(&[4, 5, 4]));
        assert!(PixelImage::from_dyn(rgba).is_err());
    }

    #[test]
    fn test_rgb_order_matches_trailing_axis() {
        let indices: Vec<Option<usize>> = Channel::RGB.iter().map(|c| c.color_index()).collect();
        assert_eq!(indices, vec![Some(0), Some(1), Some(2)]);
        assert_eq!(Channel::Luma.color_index(), None);
        assert_eq!(Channel::RGB[1].to_string(), "green");
    }

    #[test]
    fn test_to_pixels_clips_and_rounds() {
        let values = array![[-12.0, 0.4], [127.5, 300.0]];
        assert_eq!(to_pixels(&values), array![[0u8, 0], [128, 255]]);
    }

    #[test]
    fn test_channel_split_and_stack() {
        let image = Array3::from_shape_fn((2, 3, 3), |(i, j, c)| (i * 30 + j * 10 + c) as u8);
        let view = image.view();

        let planes = [channel(&view, 0), channel(&view, 1), channel(&view, 2)];
        assert_eq!(planes[1], array![[1.0, 11.0, 21.0], [31.0, 41.0, 51.0]]);

        let stacked = stack_channels(&planes).unwrap();
        assert_eq!(stacked, image);
    }

    #[test]
    fn test_stack_channels_shape_mismatch() {
        let planes = [Matrix::zeros((2, 2)), Matrix::zeros((2, 2)), Matrix::zeros((2, 3))];
        assert!(stack_channels(&planes).is_err());
    }
}
