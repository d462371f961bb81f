use std::io::Write;

use ::image::{codecs::jpeg::JpegEncoder, RgbImage};

use crate::{
    error::Error,
    image::{ImageWriter, Raster},
};

/// Quality used by common imaging libraries when none is requested.
pub const DEFAULT_QUALITY: u8 = 75;

pub struct JPEGImageWriter<'a, T: Write> {
    writer: T,
    image: &'a Raster,
    quality: u8,
}

impl<'a, T: Write> JPEGImageWriter<'a, T> {
    pub fn new(writer: T, image: &'a Raster) -> Self {
        Self::with_quality(writer, image, DEFAULT_QUALITY)
    }

    /// `quality` ranges from 1 to 100, larger values are clamped.
    pub fn with_quality(writer: T, image: &'a Raster, quality: u8) -> Self {
        Self {
            writer,
            image,
            quality: quality.clamp(1, 100),
        }
    }

    fn create_buffer(&self) -> crate::Result<RgbImage> {
        let (height, width) = self.image.shape();
        let unsupported = || Error::UnsupportedDimensions(height, width);
        let buffer_width = u32::try_from(width).map_err(|_| unsupported())?;
        let buffer_height = u32::try_from(height).map_err(|_| unsupported())?;
        RgbImage::from_raw(buffer_width, buffer_height, self.image.dots().to_vec())
            .ok_or_else(unsupported)
    }
}

impl<T: Write> ImageWriter for JPEGImageWriter<'_, T> {
    fn write_image(&mut self) -> crate::Result<()> {
        let buffer = self.create_buffer()?;
        JpegEncoder::new_with_quality(&mut self.writer, self.quality)
            .encode_image(&buffer)
            .map_err(Error::UnableToEncodeImage)?;
        self.writer.flush().map_err(Error::FailedToWriteImageData)
    }
}
