//! Plumbing shared by the shadow scanner crates: progress reporting, logging setup, and reading
//! config files.

mod io;
pub mod logger;
mod time;

pub use crate::io::read_json;
pub use crate::time::{elapsed_seconds, prettyprint_time, prettyprint_usize, Timer};

const PROGRESS_FREQUENCY_SECONDS: f64 = 0.2;
