//! sb-probe: container codec sniffing and subtitle conversion.
//!
//! The sniffer reads bounded head and tail windows of a file and reports
//! codec labels by marker search; it never parses container structure.
//! The SRT converter is a pure text transform.

pub mod sniff;
pub mod srt;

pub use sniff::sniff_container_codecs;
pub use srt::srt_to_vtt;
