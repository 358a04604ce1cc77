pub mod decoder;
pub mod encoder;
pub mod merger;
pub mod resample;
