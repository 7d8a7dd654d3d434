//! Per-frame inputs and outputs of gaze estimation.

mod observation;
mod result;

pub use observation::*;
pub use result::*;
