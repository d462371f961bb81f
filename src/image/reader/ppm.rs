use std::io::Read;

use super::super::ImageReader;
use super::super::{Raster, NUMBER_OF_CHANNELS};
use crate::error::Error;

pub struct PPMImageReader<T: Read> {
    reader: T,
}

impl<T: Read> PPMImageReader<T> {
    pub fn new(reader: T) -> Self {
        Self { reader }
    }
}

impl<T: Read> ImageReader for PPMImageReader<T> {
    fn read_image(&mut self) -> crate::Result<Raster> {
        let mut tokenizer = PPMTokenizer::new(&mut self.reader);
        let mut parser = PPMParser::new(&mut tokenizer);
        parser.parse_tokens()
    }
}

struct PPMTokenizer<'a, R: Read> {
    reader: &'a mut R,
    buffer: Vec<u8>,
}

impl<'a, R: Read> PPMTokenizer<'a, R> {
    fn new(reader: &'a mut R) -> Self {
        PPMTokenizer {
            reader,
            buffer: Vec::new(),
        }
    }

    /// Reads the binary raster following the header of a P6 file. The single
    /// whitespace after the max value was already consumed by `next`.
    fn read_raw_samples(&mut self, count: usize) -> Option<Vec<u8>> {
        let mut samples = Vec::new();
        (&mut *self.reader)
            .take(count as u64)
            .read_to_end(&mut samples)
            .ok()?;
        (samples.len() == count).then_some(samples)
    }
}

impl<R: Read> Iterator for PPMTokenizer<'_, R> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        self.buffer.clear();
        let mut byte = [0; 1];
        let mut in_comment = false;

        while self.reader.read(&mut byte).unwrap_or(0) > 0 {
            if in_comment {
                if byte[0] == b'\n' {
                    in_comment = false;
                }
                continue;
            }
            if byte[0] == b'#' {
                in_comment = true;
                continue;
            }
            if byte[0].is_ascii_whitespace() {
                if !self.buffer.is_empty() {
                    break;
                }
            } else {
                self.buffer.push(byte[0]);
            }
        }

        if self.buffer.is_empty() {
            return None;
        }

        Some(String::from_utf8_lossy(&self.buffer).into_owned())
    }
}

const MAGIC_NUMBER_TOKEN_NAME: &str = "P3/P6 Header";
const WIDTH_HEADER_TOKEN_NAME: &str = "Width Header";
const HEIGHT_HEADER_TOKEN_NAME: &str = "Height Header";
const MAX_VALUE_HEADER_TOKEN_NAME: &str = "Max Value Header";
const COLOR_COMPONENT_VALUE_TOKEN_NAME: &str = "Color Component Value";
const MAX_SUPPORTED_VALUE: u16 = u8::MAX as u16;
const MAX_SUPPORTED_PIXEL_COUNT: usize = 1 << 28;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Ascii,
    Binary,
}

#[derive(Clone, Copy)]
struct Dot {
    buffer: [u16; NUMBER_OF_CHANNELS],
    index: usize,
}

impl Dot {
    fn new() -> Self {
        Self {
            buffer: [u16::default(); NUMBER_OF_CHANNELS],
            index: 0,
        }
    }

    fn push_color_component(&mut self, component: u16) {
        if self.is_complete() {
            return;
        }
        self.buffer[self.index] = component;
        self.index += 1;
    }

    fn is_complete(&self) -> bool {
        self.index == NUMBER_OF_CHANNELS
    }

    fn reset(&mut self) {
        self.index = 0;
    }

    fn is_empty(&self) -> bool {
        self.index == 0
    }
}

struct PPMParser<'a, 'b, R: Read> {
    tokenizer: &'a mut PPMTokenizer<'b, R>,
}

impl<'a, 'b, R: Read> PPMParser<'a, 'b, R> {
    fn new(tokenizer: &'a mut PPMTokenizer<'b, R>) -> Self {
        Self { tokenizer }
    }

    fn parse_tokens(&mut self) -> crate::Result<Raster> {
        let header = self.parse_header()?;
        let encoding = Self::check_header_version(&header)?;
        let width = self.parse_dimension(WIDTH_HEADER_TOKEN_NAME)?;
        let height = self.parse_dimension(HEIGHT_HEADER_TOKEN_NAME)?;
        let max_value = self.parse_max_value()?;
        let pixel_count = Self::pixel_count(width, height)?;
        let samples: Vec<u16> = match encoding {
            Encoding::Ascii => {
                let dots = self.parse_all_dots()?;
                Self::check_parsed_dots_length_match_header_information(&dots, pixel_count)?;
                dots.iter().flat_map(|dot| dot.buffer).collect()
            }
            Encoding::Binary => self.parse_binary_samples(pixel_count)?,
        };
        let samples = samples
            .into_iter()
            .map(|sample| Self::scale_to_eight_bit(sample, max_value))
            .collect::<crate::Result<Vec<u8>>>()?;
        Raster::new(height, width, samples)
    }

    /// Rejects headers whose pixel count overflows or exceeds what can
    /// reasonably be held in memory.
    fn pixel_count(width: usize, height: usize) -> crate::Result<usize> {
        width
            .checked_mul(height)
            .filter(|count| *count <= MAX_SUPPORTED_PIXEL_COUNT)
            .ok_or(Error::MismatchOfSizeBetweenHeaderAndValues)
    }

    fn check_parsed_dots_length_match_header_information(
        dots: &[Dot],
        pixel_count: usize,
    ) -> crate::Result<()> {
        if dots.len() != pixel_count {
            return Err(Error::MismatchOfSizeBetweenHeaderAndValues);
        }
        Ok(())
    }

    fn check_header_version(header: &str) -> crate::Result<Encoding> {
        match header {
            "P3" => Ok(Encoding::Ascii),
            "P6" => Ok(Encoding::Binary),
            _ => Err(Error::PPMFileDoesNotContainRequiredToken(
                MAGIC_NUMBER_TOKEN_NAME,
            )),
        }
    }

    fn parse_header(&mut self) -> crate::Result<String> {
        self.tokenizer
            .next()
            .ok_or(Error::PPMFileDoesNotContainRequiredToken(
                MAGIC_NUMBER_TOKEN_NAME,
            ))
    }

    fn parse_dimension(&mut self, token_name: &'static str) -> crate::Result<usize> {
        self.tokenizer
            .next()
            .ok_or(Error::PPMFileDoesNotContainRequiredToken(token_name))?
            .parse()
            .map_err(|_| Error::ParsingOfTokenFailed(token_name))
    }

    fn parse_max_value(&mut self) -> crate::Result<u16> {
        let max_value: u16 = self
            .tokenizer
            .next()
            .ok_or(Error::PPMFileDoesNotContainRequiredToken(
                MAX_VALUE_HEADER_TOKEN_NAME,
            ))?
            .parse()
            .map_err(|_| Error::ParsingOfTokenFailed(MAX_VALUE_HEADER_TOKEN_NAME))?;
        if max_value == 0 || max_value > MAX_SUPPORTED_VALUE {
            return Err(Error::UnsupportedMaxValue(max_value));
        }
        Ok(max_value)
    }

    fn parse_all_dots(&mut self) -> crate::Result<Vec<Dot>> {
        let mut current_dot = Dot::new();
        let mut dots = Vec::new();
        for token in self.tokenizer.by_ref() {
            let component = Self::parse_color_value(&token)?;
            current_dot.push_color_component(component);
            if current_dot.is_complete() {
                dots.push(current_dot);
                current_dot.reset();
            }
        }
        Self::check_pixel_was_complete(&current_dot)?;
        Ok(dots)
    }

    fn parse_binary_samples(&mut self, pixel_count: usize) -> crate::Result<Vec<u16>> {
        let count = pixel_count * NUMBER_OF_CHANNELS;
        let samples = self
            .tokenizer
            .read_raw_samples(count)
            .ok_or(Error::MismatchOfSizeBetweenHeaderAndValues)?;
        Ok(samples.into_iter().map(u16::from).collect())
    }

    fn check_pixel_was_complete(dot: &Dot) -> crate::Result<()> {
        if !dot.is_empty() {
            return Err(Error::IncompletePixelParsed(dot.index));
        }
        Ok(())
    }

    fn parse_color_value(token: &str) -> crate::Result<u16> {
        token
            .parse()
            .map_err(|_| Error::ParsingOfTokenFailed(COLOR_COMPONENT_VALUE_TOKEN_NAME))
    }

    fn scale_to_eight_bit(sample: u16, max_value: u16) -> crate::Result<u8> {
        if sample > max_value {
            return Err(Error::ColorValueExceedsMaxValue(sample, max_value));
        }
        let max_value = max_value as u32;
        let scaled = (sample as u32 * MAX_SUPPORTED_VALUE as u32 + max_value / 2) / max_value;
        Ok(scaled as u8)
    }
}
