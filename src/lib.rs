//! voicecue: turn a text script into a merged voice-over with caption timing.
//!
//! The stages run in order: [`segment`] cleans and splits the script,
//! [`synth`] renders and measures each unit, [`timeline`] places the units
//! back to back, [`audio::merger`] joins their audio, [`captions`] cuts
//! display-sized chunks and [`metadata`] writes the results.
//! [`pipeline::run_script`] drives a whole run.

pub mod audio;
pub mod captions;
pub mod config;
pub mod error;
pub mod metadata;
pub mod pipeline;
pub mod segment;
pub mod synth;
pub mod timeline;
pub mod types;

pub use error::{PipelineError, Result};
pub use pipeline::{run_file, run_script, OutputPaths, PipelineOptions, RunReport};
