use std::io::{self, Write};

use crate::{
    error::Error,
    image::{ImageWriter, Raster, NUMBER_OF_CHANNELS},
};

const DOTS_PER_LINE: usize = 5;

/// Writes plain (P3) PPM files with a max value of 255.
pub struct PPMImageWriter<'a, T: Write> {
    writer: T,
    image: &'a Raster,
}

impl<'a, T: Write> PPMImageWriter<'a, T> {
    pub fn new(writer: T, image: &'a Raster) -> Self {
        Self { writer, image }
    }

    fn write_header(&mut self) -> io::Result<()> {
        writeln!(self.writer, "P3")?;
        writeln!(self.writer, "{} {}", self.image.width(), self.image.height())?;
        writeln!(self.writer, "{}", u8::MAX)
    }

    fn write_dots(&mut self) -> io::Result<()> {
        let width = self.image.width();
        for row in self.image.dots().chunks(width * NUMBER_OF_CHANNELS) {
            for line in row.chunks(DOTS_PER_LINE * NUMBER_OF_CHANNELS) {
                let line = line
                    .chunks(NUMBER_OF_CHANNELS)
                    .map(|dot| format!("{} {} {}", dot[0], dot[1], dot[2]))
                    .collect::<Vec<String>>()
                    .join("  ");
                writeln!(self.writer, "{}", line)?;
            }
        }
        Ok(())
    }
}

impl<T: Write> ImageWriter for PPMImageWriter<'_, T> {
    fn write_image(&mut self) -> crate::Result<()> {
        self.write_header().map_err(Error::FailedToWriteImageData)?;
        self.write_dots().map_err(Error::FailedToWriteImageData)?;
        self.writer.flush().map_err(Error::FailedToWriteImageData)
    }
}
