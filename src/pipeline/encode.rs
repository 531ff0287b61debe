//! Image normalisation: decoded upload → PNG bytes for the OCR engine.
//!
//! Uploads arrive as PNG or JPEG. Decoding them here rejects corrupt or
//! unsupported files before an OCR process is spawned, and re-encoding to
//! lossless PNG gives tesseract one well-supported format to read.

use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Decode `bytes` (PNG or JPEG) and re-encode the image as PNG.
pub fn normalise_image(bytes: &[u8]) -> Result<Vec<u8>, image::ImageError> {
    let img = image::load_from_memory(bytes)?;
    debug!("Decoded image {}x{} px", img.width(), img.height());
    encode_png(&img)
}

/// Encode a decoded image as PNG.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    debug!("Encoded image → {} bytes PNG", buf.len());
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn red_square() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])))
    }

    #[test]
    fn png_roundtrips_through_normalise() {
        let png = encode_png(&red_square()).expect("encode should succeed");
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let again = normalise_image(&png).expect("valid png");
        let decoded = image::load_from_memory(&again).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 10));
    }

    #[test]
    fn jpeg_is_converted_to_png() {
        let mut jpeg = Vec::new();
        DynamicImage::ImageRgb8(red_square().to_rgb8())
            .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();
        let png = normalise_image(&jpeg).expect("jpeg should decode");
        assert_eq!(&png[..4], b"\x89PNG");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(normalise_image(b"definitely not an image").is_err());
        assert!(normalise_image(&[]).is_err());
    }
}
