use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageUtilsError {
    #[error("Unsupported image format, upload a JPEG or PNG file")]
    UnsupportedFormat,
    #[error("Failed to decode image: {0}")]
    DecodeFailed(image::ImageError),
    #[error("Failed to encode image: {0}")]
    EncodeFailed(image::ImageError),
}

/// A decoded upload together with the container format it arrived in.
pub struct Upload {
    pub image: DynamicImage,
    pub format: ImageFormat,
}

impl Upload {
    /// Accepts JPEG and PNG content only.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageUtilsError> {
        let format = match image::guess_format(bytes) {
            Ok(format @ (ImageFormat::Jpeg | ImageFormat::Png)) => format,
            _ => return Err(ImageUtilsError::UnsupportedFormat),
        };
        let image = image::load_from_memory_with_format(bytes, format)
            .map_err(ImageUtilsError::DecodeFailed)?;
        Ok(Self { image, format })
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }
}

pub fn encode_jpeg(image: &RgbImage) -> Result<Vec<u8>, ImageUtilsError> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .map_err(ImageUtilsError::EncodeFailed)?;
    Ok(buf)
}
