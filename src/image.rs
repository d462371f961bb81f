use std::{
    fs::{self, File, OpenOptions},
    io::{BufReader, BufWriter},
    path::Path,
};

use nalgebra::DMatrix;

use crate::error::Error;
use reader::{jpeg::JPEGImageReader, ppm::PPMImageReader};
use writer::{jpeg::JPEGImageWriter, ppm::PPMImageWriter};

pub mod reader;
pub mod writer;

pub const NUMBER_OF_CHANNELS: usize = 3;
const JPEG_FILE_EXTENSIONS: [&str; 2] = ["jpg", "jpeg"];
const PPM_FILE_EXTENSIONS: [&str; 1] = ["ppm"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Jpeg,
    Ppm,
}

impl FileFormat {
    /// Default extension of files written in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => JPEG_FILE_EXTENSIONS[0],
            Self::Ppm => PPM_FILE_EXTENSIONS[0],
        }
    }
}

pub trait ImageReader {
    fn read_image(&mut self) -> crate::Result<Raster>;
}

pub trait ImageWriter {
    fn write_image(&mut self) -> crate::Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    pub const ALL: [Channel; NUMBER_OF_CHANNELS] = [Self::Red, Self::Green, Self::Blue];

    pub fn index(&self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
        }
    }
}

/// An 8 bit RGB image of shape (height, width, 3), stored row major with
/// interleaved color components.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    height: usize,
    width: usize,
    dots: Vec<u8>,
}

impl Raster {
    pub fn new(height: usize, width: usize, dots: Vec<u8>) -> crate::Result<Self> {
        if height == 0 || width == 0 {
            return Err(Error::EmptyImage);
        }
        let expected = height
            .checked_mul(width)
            .and_then(|pixels| pixels.checked_mul(NUMBER_OF_CHANNELS));
        if expected != Some(dots.len()) {
            return Err(Error::MismatchOfSizeBetweenHeaderAndValues);
        }
        Ok(Self {
            height,
            width,
            dots,
        })
    }

    pub fn from_fn<F>(height: usize, width: usize, f: F) -> crate::Result<Self>
    where
        F: Fn(usize, usize, Channel) -> u8,
    {
        let mut dots = Vec::with_capacity(height * width * NUMBER_OF_CHANNELS);
        for row in 0..height {
            for column in 0..width {
                for channel in Channel::ALL {
                    dots.push(f(row, column, channel));
                }
            }
        }
        Self::new(height, width, dots)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Largest rank a channel matrix of this raster can have.
    pub fn max_rank(&self) -> usize {
        self.height.min(self.width)
    }

    pub fn dots(&self) -> &[u8] {
        &self.dots
    }

    pub fn sample(&self, row: usize, column: usize, channel: Channel) -> u8 {
        self.dots[(row * self.width + column) * NUMBER_OF_CHANNELS + channel.index()]
    }

    pub fn extract_channel(&self, channel: Channel) -> DMatrix<f64> {
        DMatrix::from_fn(self.height, self.width, |row, column| {
            self.sample(row, column, channel) as f64
        })
    }

    pub fn extract_channels(&self) -> [DMatrix<f64>; NUMBER_OF_CHANNELS] {
        Channel::ALL.map(|channel| self.extract_channel(channel))
    }

    /// Stacks three channel matrices along the color axis. Values are rounded
    /// and clipped into the 8 bit domain.
    pub fn assemble(
        red: &DMatrix<f64>,
        green: &DMatrix<f64>,
        blue: &DMatrix<f64>,
    ) -> crate::Result<Self> {
        let expected = red.shape();
        for matrix in [green, blue] {
            if matrix.shape() != expected {
                return Err(Error::ShapeMismatch {
                    expected,
                    actual: matrix.shape(),
                });
            }
        }
        let (height, width) = expected;
        let mut dots = Vec::with_capacity(height * width * NUMBER_OF_CHANNELS);
        for row in 0..height {
            for column in 0..width {
                dots.push(clamp_to_pixel(red[(row, column)]));
                dots.push(clamp_to_pixel(green[(row, column)]));
                dots.push(clamp_to_pixel(blue[(row, column)]));
            }
        }
        Self::new(height, width, dots)
    }
}

pub fn clamp_to_pixel(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Determines the file format from the extension of `path`, ignoring case.
pub fn check_file_format(path: &Path) -> crate::Result<FileFormat> {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.to_ascii_lowercase())
        .unwrap_or_default();
    if JPEG_FILE_EXTENSIONS.contains(&extension.as_str()) {
        Ok(FileFormat::Jpeg)
    } else if PPM_FILE_EXTENSIONS.contains(&extension.as_str()) {
        Ok(FileFormat::Ppm)
    } else {
        Err(Error::UnsupportedFormat(path_to_string(path)))
    }
}

fn open_input_file(path: &Path) -> crate::Result<File> {
    if !path.is_file() {
        return Err(Error::InputFileNotFound(path_to_string(path)));
    }
    File::open(path).map_err(|e| Error::UnableToOpenInputFileForReading(path_to_string(path), e))
}

fn open_output_file(path: &Path) -> crate::Result<File> {
    if let Some(directory) = path.parent() {
        if !directory.as_os_str().is_empty() && !directory.is_dir() {
            fs::create_dir_all(directory).map_err(|e| {
                Error::UnableToCreateOutputDirectory(path_to_string(directory), e)
            })?;
        }
    }
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| Error::UnableToOpenOutputFileForWriting(path_to_string(path), e))
}

pub fn load(path: &Path) -> crate::Result<Raster> {
    let format = check_file_format(path)?;
    let reader = BufReader::new(open_input_file(path)?);
    let raster = match format {
        FileFormat::Jpeg => JPEGImageReader::new(reader).read_image()?,
        FileFormat::Ppm => PPMImageReader::new(reader).read_image()?,
    };
    log::info!(
        "Loaded '{}' with {}x{} pixels",
        path.display(),
        raster.width(),
        raster.height()
    );
    Ok(raster)
}

/// Writes the raster in the format named by the extension of `path` and
/// returns the size of the written file in bytes.
pub fn save(raster: &Raster, path: &Path) -> crate::Result<u64> {
    let format = check_file_format(path)?;
    let writer = BufWriter::new(open_output_file(path)?);
    match format {
        FileFormat::Jpeg => JPEGImageWriter::new(writer, raster).write_image()?,
        FileFormat::Ppm => PPMImageWriter::new(writer, raster).write_image()?,
    }
    let size = file_size(path)?;
    log::info!("Saved '{}' ({} bytes)", path.display(), size);
    Ok(size)
}

pub fn file_size(path: &Path) -> crate::Result<u64> {
    fs::metadata(path)
        .map(|metadata| metadata.len())
        .map_err(|e| Error::UnableToReadFileSize(path_to_string(path), e))
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use nalgebra::DMatrix;

    use super::{check_file_format, clamp_to_pixel, Channel, FileFormat, Raster};
    use crate::error::Error;

    fn gradient_raster(height: usize, width: usize) -> Raster {
        Raster::from_fn(height, width, |row, column, channel| {
            ((row * 31 + column * 17 + channel.index() * 80) % 256) as u8
        })
        .unwrap()
    }

    #[test]
    fn extract_then_assemble_is_lossless() {
        let raster = gradient_raster(7, 5);
        let [red, green, blue] = raster.extract_channels();
        let assembled = Raster::assemble(&red, &green, &blue).unwrap();
        assert_eq!(assembled, raster);
    }

    #[test]
    fn extract_channel_has_image_shape() {
        let raster = gradient_raster(3, 8);
        let blue = raster.extract_channel(Channel::Blue);
        assert_eq!(blue.shape(), (3, 8));
        assert_eq!(blue[(2, 5)], raster.sample(2, 5, Channel::Blue) as f64);
    }

    #[test]
    fn assemble_clips_out_of_range_values() {
        let red = DMatrix::from_element(2, 2, -3.7);
        let green = DMatrix::from_element(2, 2, 255.4);
        let blue = DMatrix::from_element(2, 2, 301.0);
        let raster = Raster::assemble(&red, &green, &blue).unwrap();
        assert_eq!(raster.sample(1, 1, Channel::Red), 0);
        assert_eq!(raster.sample(1, 1, Channel::Green), 255);
        assert_eq!(raster.sample(1, 1, Channel::Blue), 255);
    }

    #[test]
    fn assemble_rejects_mismatching_shapes() {
        let red = DMatrix::zeros(2, 3);
        let green = DMatrix::zeros(2, 3);
        let blue = DMatrix::zeros(3, 2);
        match Raster::assemble(&red, &green, &blue) {
            Err(Error::ShapeMismatch { expected, actual }) => {
                assert_eq!(expected, (2, 3));
                assert_eq!(actual, (3, 2));
            }
            _ => panic!("Shape mismatch was not detected"),
        }
    }

    #[test]
    fn clamp_rounds_to_nearest() {
        assert_eq!(clamp_to_pixel(159.9999), 160);
        assert_eq!(clamp_to_pixel(12.49), 12);
        assert_eq!(clamp_to_pixel(f64::NAN), 0);
    }

    #[test]
    fn new_rejects_wrong_number_of_dots() {
        assert!(matches!(
            Raster::new(2, 2, vec![0; 11]),
            Err(Error::MismatchOfSizeBetweenHeaderAndValues)
        ));
        assert!(matches!(Raster::new(0, 2, vec![]), Err(Error::EmptyImage)));
        assert!(matches!(
            Raster::new(usize::MAX, 2, vec![0; 6]),
            Err(Error::MismatchOfSizeBetweenHeaderAndValues)
        ));
    }

    #[test]
    fn max_rank_is_smaller_dimension() {
        assert_eq!(gradient_raster(4, 9).max_rank(), 4);
        assert_eq!(gradient_raster(6, 2).max_rank(), 2);
    }

    #[test]
    fn format_follows_extension() {
        let format_of = |path: &str| check_file_format(Path::new(path)).ok();
        assert_eq!(format_of("images/cat.ppm"), Some(FileFormat::Ppm));
        assert_eq!(format_of("images/CAT.PPM"), Some(FileFormat::Ppm));
        assert_eq!(format_of("images/cat.jpg"), Some(FileFormat::Jpeg));
        assert_eq!(format_of("images/cat.JPEG"), Some(FileFormat::Jpeg));
        assert!(matches!(
            check_file_format(Path::new("images/cat.png")),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(check_file_format(Path::new("images/cat")).is_err());
    }
}
