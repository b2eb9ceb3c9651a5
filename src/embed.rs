//! Raster decoding with format fallback for the two report image slots.
//!
//! Screening uploads are almost always JPEG, so that decoder is tried
//! first, then PNG. Both failing collapses into a single error naming the
//! slot; the individual decoder errors are only logged.

use std::fmt;

use printpdf::image_crate::{self, GenericImageView, ImageFormat};
use thiserror::Error;
use tracing::debug;

/// One of the two independent image placements in the report layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Input,
    Result,
}

impl fmt::Display for ImageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSlot::Input => write!(f, "input image"),
            ImageSlot::Result => write!(f, "result image"),
        }
    }
}

#[derive(Error, Debug)]
#[error("Could not decode {slot} as JPEG or PNG")]
pub struct EmbedError {
    pub slot: ImageSlot,
}

/// A decoded raster ready to be placed on the page, with the pixel
/// dimensions needed to scale it into its fixed on-page region.
#[derive(Debug)]
pub struct DecodedImage {
    pub image: printpdf::Image,
    pub width_px: u32,
    pub height_px: u32,
}

const DECODE_ORDER: &[ImageFormat] = &[ImageFormat::Jpeg, ImageFormat::Png];

/// Decodes `bytes` as JPEG, falling back to PNG.
pub fn decode_report_image(bytes: &[u8], slot: ImageSlot) -> Result<DecodedImage, EmbedError> {
    for format in DECODE_ORDER {
        match image_crate::load_from_memory_with_format(bytes, *format) {
            Ok(decoded) => {
                let (width_px, height_px) = decoded.dimensions();
                return Ok(DecodedImage {
                    image: printpdf::Image::from_dynamic_image(&decoded),
                    width_px,
                    height_px,
                });
            }
            Err(err) => {
                debug!("{slot} did not decode as {format:?}: {err}");
            }
        }
    }

    Err(EmbedError { slot })
}


#[cfg(test)]
mod tests {
    use super::fixtures::{jpeg_bytes, png_bytes};
    use super::*;

    #[test]
    fn decodes_jpeg_on_first_attempt() {
        let decoded = decode_report_image(&jpeg_bytes(), ImageSlot::Input).unwrap();
        assert_eq!((decoded.width_px, decoded.height_px), (8, 4));
    }

    #[test]
    fn falls_back_to_png() {
        let decoded = decode_report_image(&png_bytes(), ImageSlot::Result).unwrap();
        assert_eq!((decoded.width_px, decoded.height_px), (8, 4));
    }

    #[test]
    fn undecodable_bytes_name_the_slot() {
        let err = decode_report_image(b"not an image", ImageSlot::Result).unwrap_err();
        assert_eq!(err.slot, ImageSlot::Result);
        assert!(err.to_string().contains("result image"));
    }

    #[test]
    fn empty_buffer_fails_cleanly() {
        assert!(decode_report_image(&[], ImageSlot::Input).is_err());
    }
}
