use std::{
    fmt::Display,
    path::{Path, PathBuf},
    sync::mpsc,
};

use threadpool::ThreadPool;

use super::{compression_ratio, CompressionOptions, CompressionOutcome, CompressionReport};
use crate::{
    error::Error,
    image::{self, Channel, FileFormat, Raster, NUMBER_OF_CHANNELS},
    logger,
    metric::{ErrorMetric, EuclideanNrmse},
    rank_search::{RankEvaluator, RankSearchOptions, RankSearchOutcome, RankSelector},
    svd::{check_rank, ChannelDecomposition},
};

pub enum ImageSource {
    File(PathBuf),
    Memory { name: String, raster: Raster },
}

impl ImageSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn from_raster(name: impl Into<String>, raster: Raster) -> Self {
        Self::Memory {
            name: name.into(),
            raster,
        }
    }

    fn name(&self) -> String {
        match self {
            Self::File(path) => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default(),
            Self::Memory { name, .. } => name.clone(),
        }
    }

    fn load(&self) -> crate::Result<Raster> {
        match self {
            Self::File(path) => image::load(path),
            Self::Memory { raster, .. } => Ok(raster.clone()),
        }
    }

    /// In-memory rasters are written losslessly.
    fn file_format(&self) -> FileFormat {
        match self {
            Self::File(path) => image::check_file_format(path).unwrap_or(FileFormat::Ppm),
            Self::Memory { .. } => FileFormat::Ppm,
        }
    }

    fn byte_size(&self) -> crate::Result<Option<u64>> {
        match self {
            Self::File(path) => image::file_size(path).map(Some),
            Self::Memory { .. } => Ok(None),
        }
    }
}

/// Approximates an RGB image by truncating the singular value decomposition
/// of each color channel to the current rank.
///
/// The decompositions are computed once per image source and reused for
/// every rank, so changing the rank is cheap.
pub struct ImageCompressor {
    source: ImageSource,
    name: String,
    original: Raster,
    rank: usize,
    decompositions: Option<Vec<ChannelDecomposition>>,
    threadpool: ThreadPool,
    search_options: RankSearchOptions,
}

impl ImageCompressor {
    pub fn new(rank: Option<usize>, source: Option<ImageSource>) -> crate::Result<Self> {
        Self::with_options(rank, source, &CompressionOptions::default())
    }

    /// Without a rank the compressor starts with the rank found by the
    /// automatic rank search.
    pub fn with_options(
        rank: Option<usize>,
        source: Option<ImageSource>,
        options: &CompressionOptions,
    ) -> crate::Result<Self> {
        let source = source.ok_or(Error::MissingImage)?;
        let original = source.load()?;
        let mut compressor = Self {
            name: source.name(),
            source,
            original,
            rank: 1,
            decompositions: None,
            threadpool: ThreadPool::new(options.number_of_threads.max(1)),
            search_options: options.search.clone(),
        };
        match rank {
            Some(rank) => {
                compressor.set_rank(rank)?;
                log::info!("Number of singular values initialized to {}", rank);
            }
            None => {
                log::info!("No number of singular values given, searching for one");
                compressor.select_rank()?;
            }
        }
        Ok(compressor)
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Format of the image source, used for files derived from it.
    pub fn file_format(&self) -> FileFormat {
        self.source.file_format()
    }

    pub fn original(&self) -> &Raster {
        &self.original
    }

    pub fn max_rank(&self) -> usize {
        self.original.max_rank()
    }

    /// Leaves the current rank untouched when `rank` is out of range.
    pub fn set_rank(&mut self, rank: usize) -> crate::Result<()> {
        check_rank(rank, self.max_rank())?;
        self.rank = rank;
        Ok(())
    }

    /// Replaces the image and drops the cached decompositions. A rank that is
    /// too large for the new image is clamped to its maximal rank.
    pub fn set_source(&mut self, source: ImageSource) -> crate::Result<()> {
        let original = source.load()?;
        self.name = source.name();
        self.source = source;
        self.original = original;
        self.decompositions = None;
        if self.rank > self.max_rank() {
            log::warn!(
                "Rank {} exceeds the new image, clamping to {}",
                self.rank,
                self.max_rank()
            );
            self.rank = self.max_rank();
        }
        Ok(())
    }

    pub fn select_rank(&mut self) -> crate::Result<RankSearchOutcome> {
        self.select_rank_with(&EuclideanNrmse)
    }

    /// Searches the smallest rank meeting the error threshold under `metric`.
    /// A failed search keeps the rank the compressor had before.
    pub fn select_rank_with(
        &mut self,
        metric: &dyn ErrorMetric,
    ) -> crate::Result<RankSearchOutcome> {
        let previous_rank = self.rank;
        let selector = RankSelector::new(self.search_options.clone());
        let searched = selector.select(&mut CompressorEvaluator {
            compressor: self,
            metric,
        });
        let outcome = searched.and_then(|outcome| self.set_rank(outcome.rank).map(|_| outcome));
        if outcome.is_err() {
            self.rank = previous_rank;
        }
        outcome
    }

    pub fn compress(&mut self) -> crate::Result<Raster> {
        let rank = self.rank;
        let approximations = self
            .decompositions()?
            .iter()
            .map(|decomposition| decomposition.approximate(rank))
            .collect::<crate::Result<Vec<_>>>()?;
        match approximations.as_slice() {
            [red, green, blue] => Raster::assemble(red, green, blue),
            _ => Err(Error::DecompositionFailed("image")),
        }
    }

    /// Compresses the image, stores it at `output` if given and, when `verbose`
    /// is set, reports rank, compression ratio and file sizes.
    pub fn compress_to(
        &mut self,
        output: Option<&Path>,
        verbose: bool,
    ) -> crate::Result<CompressionOutcome> {
        let raster = self.compress()?;
        let output_size = match output {
            Some(path) => Some(image::save(&raster, path)?),
            None => None,
        };
        let report = if verbose {
            let report = self.report(output_size)?;
            log::info!(
                "Compressed '{}' with rank {} and compression ratio {:.4}",
                report.name,
                report.rank,
                report.compression_ratio
            );
            Some(report)
        } else {
            None
        };
        Ok(CompressionOutcome { raster, report })
    }

    pub fn report(&self, output_size: Option<u64>) -> crate::Result<CompressionReport> {
        Ok(CompressionReport {
            name: self.name.clone(),
            rank: self.rank,
            compression_ratio: compression_ratio(self.original.shape(), self.rank)?,
            original_size: self.source.byte_size()?,
            output_size,
        })
    }

    fn decompositions(&mut self) -> crate::Result<&[ChannelDecomposition]> {
        if self.decompositions.is_none() {
            let decompositions = self.decompose_channels()?;
            self.decompositions = Some(decompositions);
        }
        Ok(self.decompositions.as_deref().unwrap_or_default())
    }

    fn decompose_channels(&self) -> crate::Result<Vec<ChannelDecomposition>> {
        let (sender, receiver) = mpsc::channel();
        for channel in Channel::ALL {
            let sender = sender.clone();
            let matrix = self.original.extract_channel(channel);
            self.threadpool.execute(move || {
                let result = ChannelDecomposition::new(matrix);
                let _ = sender.send((channel, result));
            });
        }
        drop(sender);

        let mut decompositions: [Option<ChannelDecomposition>; NUMBER_OF_CHANNELS] =
            [None, None, None];
        for (channel, result) in receiver.iter() {
            let decomposition = result.map_err(|e| match e {
                Error::DecompositionFailed(_) => Error::DecompositionFailed(channel.name()),
                other => other,
            })?;
            logger::log_singular_values(channel.name(), decomposition.singular_values());
            decompositions[channel.index()] = Some(decomposition);
        }
        Channel::ALL
            .iter()
            .map(|channel| {
                decompositions[channel.index()]
                    .take()
                    .ok_or(Error::DecompositionFailed(channel.name()))
            })
            .collect()
    }
}

impl Display for ImageCompressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Image Compressor is using {} singular values", self.rank)
    }
}

struct CompressorEvaluator<'a> {
    compressor: &'a mut ImageCompressor,
    metric: &'a dyn ErrorMetric,
}

impl RankEvaluator for CompressorEvaluator<'_> {
    fn upper_rank(&self) -> usize {
        self.compressor.max_rank()
    }

    fn evaluate(&mut self, rank: usize) -> crate::Result<f64> {
        self.compressor.set_rank(rank)?;
        let candidate = self.compressor.compress()?;
        self.metric
            .normalized_error(self.compressor.original(), &candidate)
    }
}
