use std::path::PathBuf;
use std::{env, fs};

use svd_image_compressor::{compress_image, image, run, CLIParser, Error};

const INPUT_IMAGE_PATH: &str = "tests/gradient.ppm";

fn get_project_root_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn get_input_image_path() -> PathBuf {
    let mut root_path = get_project_root_path();
    root_path.push(INPUT_IMAGE_PATH);
    root_path
}

fn get_result_path(name: &str) -> PathBuf {
    let mut root_path = get_project_root_path();
    root_path.push("tests");
    root_path.push("results");
    root_path.push(name);
    root_path
}

fn cleanup(path: &PathBuf) {
    if path.is_file() {
        fs::remove_file(path).expect("Deletion of output file failed");
    } else if path.is_dir() {
        fs::remove_dir_all(path).expect("Deletion of output directory failed");
    }
}

fn parse(arguments: &[&str]) -> svd_image_compressor::Arguments {
    let mut cli_parser = CLIParser::new();
    let mut all_arguments = vec!["test"];
    all_arguments.extend_from_slice(arguments);
    cli_parser.parse(all_arguments)
}

#[test]
fn test_compress_with_given_rank() {
    let result_image_path = get_result_path("rank-2.ppm");
    cleanup(&result_image_path);
    let arguments = parse(&[
        get_input_image_path().to_str().unwrap(),
        result_image_path.to_str().unwrap(),
        "-k",
        "2",
        "-v",
    ]);
    let report = compress_image(&arguments)
        .expect("Compression failed")
        .expect("Verbose compression must produce a report");
    assert!(result_image_path.exists(), "Output file was not created");
    assert_eq!(report.rank, 2);
    assert_eq!(report.name, "gradient");
    assert_eq!(report.compression_ratio, 48.0 / 30.0);
    assert_eq!(
        report.original_size,
        Some(fs::metadata(get_input_image_path()).unwrap().len())
    );
    assert_eq!(
        report.output_size,
        Some(fs::metadata(&result_image_path).unwrap().len())
    );
    let compressed = image::load(&result_image_path).unwrap();
    assert_eq!(compressed.shape(), (6, 8));
    cleanup(&result_image_path);
}

#[test]
fn test_full_rank_reproduces_input() {
    let result_image_path = get_result_path("rank-6.ppm");
    cleanup(&result_image_path);
    let arguments = parse(&[
        get_input_image_path().to_str().unwrap(),
        result_image_path.to_str().unwrap(),
        "--rank",
        "6",
    ]);
    let report = compress_image(&arguments).expect("Compression failed");
    assert!(report.is_none());
    let original = image::load(&get_input_image_path()).unwrap();
    let compressed = image::load(&result_image_path).unwrap();
    assert_eq!(compressed, original);
    cleanup(&result_image_path);
}

#[test]
fn test_compress_with_searched_rank() {
    let result_image_path = get_result_path("searched.ppm");
    cleanup(&result_image_path);
    let arguments = parse(&[
        get_input_image_path().to_str().unwrap(),
        result_image_path.to_str().unwrap(),
        "-k",
        "0",
        "-v",
    ]);
    let reports = run(&arguments).expect("Compression failed");
    assert_eq!(reports.len(), 1);
    assert!(reports[0].rank >= 1 && reports[0].rank <= 6);
    assert!(result_image_path.exists(), "Output file was not created");
    cleanup(&result_image_path);
}

#[test]
fn test_sweep_stores_every_step() {
    let result_directory = get_result_path("sweep");
    cleanup(&result_directory);
    let arguments = parse(&[
        get_input_image_path().to_str().unwrap(),
        result_directory.to_str().unwrap(),
        "--sweep",
        "2",
    ]);
    let reports = run(&arguments).expect("Sweep failed");
    let ranks: Vec<usize> = reports.iter().map(|report| report.rank).collect();
    assert_eq!(ranks, vec![2, 4]);
    assert!(result_directory.join("gradient-2.ppm").is_file());
    assert!(result_directory.join("gradient-4.ppm").is_file());
    cleanup(&result_directory);
}

#[test]
fn test_missing_input_file() {
    let arguments = parse(&[
        get_result_path("does-not-exist.ppm").to_str().unwrap(),
        get_result_path("never-written.ppm").to_str().unwrap(),
        "-k",
        "1",
    ]);
    match compress_image(&arguments) {
        Err(Error::InputFileNotFound(_)) => (),
        _ => panic!("Missing input file not detected"),
    }
}

#[test]
fn test_unsupported_input_format() {
    let arguments = parse(&["tests/gradient.gif", "tests/results/out.ppm", "-k", "1"]);
    match compress_image(&arguments) {
        Err(Error::UnsupportedFormat(path)) => assert_eq!(path, "tests/gradient.gif"),
        _ => panic!("Unsupported format not detected"),
    }
}

#[test]
fn test_unsupported_output_format() {
    let arguments = parse(&[
        get_input_image_path().to_str().unwrap(),
        "tests/results/out.bmp",
        "-k",
        "1",
    ]);
    match compress_image(&arguments) {
        Err(Error::UnsupportedFormat(path)) => assert_eq!(path, "tests/results/out.bmp"),
        _ => panic!("Unsupported format not detected"),
    }
}

fn create_jpeg_input(name: &str) -> PathBuf {
    let jpeg_path = get_result_path(name);
    cleanup(&jpeg_path);
    let arguments = parse(&[
        get_input_image_path().to_str().unwrap(),
        jpeg_path.to_str().unwrap(),
        "-k",
        "6",
    ]);
    compress_image(&arguments).expect("Conversion to JPEG failed");
    jpeg_path
}

#[test]
fn test_compress_jpeg_to_jpeg() {
    let input_path = create_jpeg_input("jpeg-input.jpg");
    let result_image_path = get_result_path("jpeg-rank-2.jpeg");
    cleanup(&result_image_path);
    let arguments = parse(&[
        input_path.to_str().unwrap(),
        result_image_path.to_str().unwrap(),
        "-k",
        "2",
        "-v",
    ]);
    let report = compress_image(&arguments)
        .expect("Compression failed")
        .expect("Verbose compression must produce a report");
    assert_eq!(report.name, "jpeg-input");
    assert_eq!(report.rank, 2);
    assert_eq!(
        report.original_size,
        Some(fs::metadata(&input_path).unwrap().len())
    );
    assert_eq!(
        report.output_size,
        Some(fs::metadata(&result_image_path).unwrap().len())
    );
    let compressed = image::load(&result_image_path).unwrap();
    assert_eq!(compressed.shape(), (6, 8));
    cleanup(&result_image_path);
    cleanup(&input_path);
}

#[test]
fn test_sweep_keeps_jpeg_format() {
    let input_path = create_jpeg_input("jpeg-sweep.jpg");
    let result_directory = get_result_path("jpeg-sweep");
    cleanup(&result_directory);
    let arguments = parse(&[
        input_path.to_str().unwrap(),
        result_directory.to_str().unwrap(),
        "--sweep",
        "3",
    ]);
    let reports = run(&arguments).expect("Sweep failed");
    assert_eq!(reports.len(), 1);
    assert!(result_directory.join("jpeg-sweep-3.jpg").is_file());
    cleanup(&result_directory);
    cleanup(&input_path);
}
