use std::io::{BufRead, Seek};

use ::image::ImageFormat;

use super::super::{ImageReader, Raster};
use crate::error::Error;

/// Decodes baseline and progressive JPEG files. Grayscale and CMYK inputs
/// are converted to 8 bit RGB.
pub struct JPEGImageReader<T: BufRead + Seek> {
    reader: T,
}

impl<T: BufRead + Seek> JPEGImageReader<T> {
    pub fn new(reader: T) -> Self {
        Self { reader }
    }
}

impl<T: BufRead + Seek> ImageReader for JPEGImageReader<T> {
    fn read_image(&mut self) -> crate::Result<Raster> {
        let decoded = ::image::load(&mut self.reader, ImageFormat::Jpeg)
            .map_err(Error::UnableToDecodeImage)?
            .to_rgb8();
        let (width, height) = decoded.dimensions();
        Raster::new(height as usize, width as usize, decoded.into_raw())
    }
}
