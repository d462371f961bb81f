pub mod jpeg;
pub mod ppm;
