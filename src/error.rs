use std::fmt::Display;

#[derive(Debug)]
pub enum Error {
    MissingImage,
    InvalidRank {
        rank: usize,
        max_rank: usize,
    },
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    UnsupportedFormat(String),
    PPMFileDoesNotContainRequiredToken(&'static str),
    ParsingOfTokenFailed(&'static str),
    IncompletePixelParsed(usize),
    MismatchOfSizeBetweenHeaderAndValues,
    UnsupportedMaxValue(u16),
    InputFileNotFound(String),
    UnableToOpenInputFileForReading(String, std::io::Error),
    UnableToOpenOutputFileForWriting(String, std::io::Error),
    UnableToCreateOutputDirectory(String, std::io::Error),
    UnableToReadFileSize(String, std::io::Error),
    FailedToWriteImageData(std::io::Error),
    ColorValueExceedsMaxValue(u16, u16),
    EmptyImage,
    DecompositionFailed(&'static str),
    UnableToDecodeImage(::image::ImageError),
    UnableToEncodeImage(::image::ImageError),
    UnsupportedDimensions(usize, usize),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingImage => write!(f, "No image source was provided"),
            Self::InvalidRank { rank, max_rank } => {
                write!(
                    f,
                    "Invalid number of singular values {}. Expected a value between 1 and {}.",
                    rank, max_rank
                )
            }
            Self::ShapeMismatch { expected, actual } => {
                write!(
                    f,
                    "Shape mismatch. Expected {}x{}, but got {}x{}.",
                    expected.0, expected.1, actual.0, actual.1
                )
            }
            Self::UnsupportedFormat(path) => {
                write!(
                    f,
                    "Unsupported image format of '{}'. Expected a .jpg, .jpeg or .ppm file.",
                    path
                )
            }
            Self::PPMFileDoesNotContainRequiredToken(token_name) => {
                write!(f, "Expected token '{}' not found in PPM file", token_name)
            }
            Self::ParsingOfTokenFailed(token_name) => {
                write!(f, "Parsing of token '{}' failed", token_name)
            }
            Self::IncompletePixelParsed(number_of_tokens_parsed) => {
                write!(
                    f,
                    "Incomplete pixel parsed. Expected 3 components, but got {}.",
                    number_of_tokens_parsed
                )
            }
            Self::MismatchOfSizeBetweenHeaderAndValues => {
                write!(
                    f,
                    "Number of pixels do not match the size, provided in header"
                )
            }
            Self::UnsupportedMaxValue(max_value) => {
                write!(
                    f,
                    "Maximum color value {} is not supported. Only 8 bit channels are accepted.",
                    max_value
                )
            }
            Self::InputFileNotFound(path) => {
                write!(f, "Input file '{}' not found", path)
            }
            Self::UnableToOpenInputFileForReading(path, error) => {
                write!(
                    f,
                    "Unable to open input file '{}' for reading: {}",
                    path, error
                )
            }
            Self::UnableToOpenOutputFileForWriting(path, error) => {
                write!(
                    f,
                    "Unable to open output file '{}' for writing: {}",
                    path, error
                )
            }
            Self::UnableToCreateOutputDirectory(path, error) => {
                write!(f, "Unable to create output directory '{}': {}", path, error)
            }
            Self::UnableToReadFileSize(path, error) => {
                write!(f, "Unable to read size of file '{}': {}", path, error)
            }
            Self::FailedToWriteImageData(error) => {
                write!(f, "Failed to write image data: {}", error)
            }
            Self::ColorValueExceedsMaxValue(value, max_value) => {
                write!(
                    f,
                    "Color value {} must not be greater than max value of {}",
                    value, max_value
                )
            }
            Self::EmptyImage => write!(f, "Image must have at least one row and one column"),
            Self::DecompositionFailed(channel) => {
                write!(f, "Singular value decomposition of {} channel failed", channel)
            }
            Self::UnableToDecodeImage(error) => write!(f, "Unable to decode image: {}", error),
            Self::UnableToEncodeImage(error) => write!(f, "Unable to encode image: {}", error),
            Self::UnsupportedDimensions(height, width) => {
                write!(
                    f,
                    "Image of {}x{} pixels exceeds the supported dimensions",
                    width, height
                )
            }
        }
    }
}

impl std::error::Error for Error {}
