use std::{fmt::Display, path::Path, thread};

use crate::{image::Raster, rank_search::RankSearchOptions, svd::check_rank, Arguments};

mod compressor;

pub use compressor::{ImageCompressor, ImageSource};

#[derive(Clone, Debug)]
pub struct CompressionOptions {
    pub number_of_threads: usize,
    pub search: RankSearchOptions,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            number_of_threads: thread::available_parallelism()
                .map(|threads| threads.get())
                .unwrap_or(1),
            search: RankSearchOptions::default(),
        }
    }
}

impl From<&Arguments> for CompressionOptions {
    fn from(value: &Arguments) -> Self {
        Self {
            number_of_threads: value.number_of_threads,
            search: RankSearchOptions {
                threshold: value.error_threshold,
                max_iterations: value.max_iterations,
            },
        }
    }
}

/// Pixel count of one channel divided by the number of values needed to store
/// the first `rank` columns of U, singular values and rows of Vt.
pub fn compression_ratio(shape: (usize, usize), rank: usize) -> crate::Result<f64> {
    let (height, width) = shape;
    check_rank(rank, height.min(width))?;
    let uncompressed = (height * width) as f64;
    let compressed = (height * rank + rank + rank * width) as f64;
    Ok(uncompressed / compressed)
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompressionReport {
    pub name: String,
    pub rank: usize,
    pub compression_ratio: f64,
    pub original_size: Option<u64>,
    pub output_size: Option<u64>,
}

fn format_kilobytes(size: Option<u64>) -> String {
    match size {
        Some(size) => format!("{} kB", size as f64 / 1000.0),
        None => String::from("unknown"),
    }
}

impl Display for CompressionReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Current rank: {}", self.rank)?;
        writeln!(f, "Compression Ratio: {}", self.compression_ratio)?;
        writeln!(f, "Original file size: {}", format_kilobytes(self.original_size))?;
        write!(f, "Compressed file size: {}", format_kilobytes(self.output_size))
    }
}

pub struct CompressionOutcome {
    pub raster: Raster,
    pub report: Option<CompressionReport>,
}

/// Compresses the image at ranks `step`, `2 * step`, ... below the maximal
/// rank and stores every result as `<name>-<rank>.<extension>` in
/// `output_directory`, keeping the format of the source image. The rank of the
/// compressor is restored afterwards.
pub fn sweep_ranks(
    compressor: &mut ImageCompressor,
    step: usize,
    output_directory: &Path,
) -> crate::Result<Vec<CompressionReport>> {
    let max_rank = compressor.max_rank();
    check_rank(step, max_rank)?;
    let previous_rank = compressor.rank();
    let extension = compressor.file_format().extension();
    let mut reports = Vec::new();
    let mut rank = step;
    while rank < max_rank {
        compressor.set_rank(rank)?;
        let output_file =
            output_directory.join(format!("{}-{}.{}", compressor.name(), rank, extension));
        let outcome = compressor.compress_to(Some(&output_file), true)?;
        reports.extend(outcome.report);
        rank += step;
    }
    compressor.set_rank(previous_rank)?;
    Ok(reports)
}
