//! sb-av: on-demand transcoding via subprocess pipelines.
//!
//! A bounded gate caps concurrent ffmpeg sessions; the returned stream
//! owns both the child process and its gate slot, so dropping the stream
//! (client disconnect included) kills the pipeline and frees the slot
//! exactly once.

pub mod gate;
pub mod transcoder;

pub use gate::TranscodeGate;
pub use transcoder::{codec_info, ffmpeg_available, CodecInfo, TranscodeOptions, TranscodeStream};
