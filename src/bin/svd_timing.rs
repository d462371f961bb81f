use std::time::{Duration, Instant};

use svd_image_compressor::svd::{approximate, ChannelDecomposition};
use svd_image_compressor::{Channel, Raster};

const IMAGE_WIDTH: usize = 320;
const IMAGE_HEIGHT: usize = 240;
const RANKS: [usize; 6] = [1, 5, 10, 20, 60, 120];

fn create_test_image() -> Raster {
    Raster::from_fn(IMAGE_HEIGHT, IMAGE_WIDTH, |y, x, channel| {
        ((x + y * 8 + channel.index() * 40) % 256) as u8
    })
    .expect("Test image dimensions are valid")
}

fn calculate_std_deviation_in_micros(mean: &Duration, measurements: &[Duration]) -> u64 {
    let mean_micros = mean.as_micros() as i128;
    let sum = measurements
        .iter()
        .map(|m| m.as_micros() as i128 - mean_micros)
        .map(|v| v.pow(2).unsigned_abs())
        .sum::<u128>();
    let variance = sum / measurements.len() as u128;
    (variance as f64).sqrt().round() as u64
}

fn print_summary(label: &str, durations: &[Duration]) {
    let min_duration = durations.iter().min().unwrap();
    let max_duration = durations.iter().max().unwrap();
    let avg_duration = durations.iter().sum::<Duration>() / durations.len() as u32;
    let std_deviation = calculate_std_deviation_in_micros(&avg_duration, durations);

    println!(
        "{}: Min: {}, Max: {}, Average: {}, Std Deviation: {}",
        label,
        min_duration.as_micros(),
        max_duration.as_micros(),
        avg_duration.as_micros(),
        std_deviation,
    );
}

const NUMBER_OF_ROUNDS: u32 = 5;

fn main() {
    println!("Creating test image");
    let test_image = create_test_image();
    let matrix = test_image.extract_channel(Channel::Red);
    let mut recomputed: Vec<Duration> = Vec::new();
    let mut cached: Vec<Duration> = Vec::new();

    for round in 1..=NUMBER_OF_ROUNDS {
        println!("Starting round {}", round);

        let start = Instant::now();
        for rank in RANKS {
            approximate(&matrix, rank).unwrap();
        }
        recomputed.push(start.elapsed());

        let start = Instant::now();
        let decomposition = ChannelDecomposition::new(matrix.clone()).unwrap();
        for rank in RANKS {
            decomposition.approximate(rank).unwrap();
        }
        cached.push(start.elapsed());

        println!(
            "Finished round {}: recomputed {} microseconds, cached {} microseconds",
            round,
            recomputed[recomputed.len() - 1].as_micros(),
            cached[cached.len() - 1].as_micros(),
        );
    }

    print_summary("Recomputed", &recomputed);
    print_summary("Cached", &cached);
}
