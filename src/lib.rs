use std::path::Path;

pub use cli::CLIParser;
pub use compression::{
    compression_ratio, sweep_ranks, CompressionOptions, CompressionOutcome, CompressionReport,
    ImageCompressor, ImageSource,
};
pub use error::Error;
pub use crate::image::{Channel, FileFormat, Raster};

mod cli;
pub mod compression;
mod error;
pub mod image;
mod logger;
pub mod metric;
pub mod rank_search;
pub mod svd;

pub type Result<T> = std::result::Result<T, error::Error>;

pub struct Arguments {
    input_file: std::path::PathBuf,
    output_file: std::path::PathBuf,
    rank: Option<usize>,
    verbose: bool,
    number_of_threads: usize,
    error_threshold: f64,
    max_iterations: Option<usize>,
    sweep_step: Option<usize>,
}

impl Arguments {
    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

fn create_compressor(arguments: &Arguments, rank: Option<usize>) -> Result<ImageCompressor> {
    let options = CompressionOptions::from(arguments);
    let source = ImageSource::from_path(&arguments.input_file);
    ImageCompressor::with_options(rank, Some(source), &options)
}

/// Compresses the input image with the requested or searched rank and stores
/// the result at the output path.
pub fn compress_image(arguments: &Arguments) -> Result<Option<CompressionReport>> {
    image::check_file_format(&arguments.input_file)?;
    image::check_file_format(&arguments.output_file)?;
    let mut compressor = create_compressor(arguments, arguments.rank)?;
    let outcome = compressor.compress_to(Some(&arguments.output_file), arguments.verbose)?;
    Ok(outcome.report)
}

/// Stores one compression per multiple of `step` inside `output_directory`.
pub fn sweep_image_ranks(
    arguments: &Arguments,
    step: usize,
    output_directory: &Path,
) -> Result<Vec<CompressionReport>> {
    image::check_file_format(&arguments.input_file)?;
    let mut compressor = create_compressor(arguments, Some(1))?;
    sweep_ranks(&mut compressor, step, output_directory)
}

pub fn run(arguments: &Arguments) -> Result<Vec<CompressionReport>> {
    match arguments.sweep_step {
        Some(step) => sweep_image_ranks(arguments, step, &arguments.output_file),
        None => compress_image(arguments).map(|report| report.into_iter().collect()),
    }
}
