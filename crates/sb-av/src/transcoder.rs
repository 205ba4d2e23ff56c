//! ffmpeg/ffprobe subprocess pipeline.
//!
//! The contract: copy streams already in the target codec, re-encode the
//! rest. Video targets fragmented MP4 (playable over a pipe); audio
//! targets MP3. A start offset seeks before the input and preserves
//! timestamps so the client progress bar stays correct.

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::OwnedSemaphorePermit;

use sb_core::{Error, Result};

use crate::gate::TranscodeGate;

/// Parameters for one transcode session.
#[derive(Debug, Clone, Default)]
pub struct TranscodeOptions {
    /// Target container/codec: `mp4` (default), `mp3`, or `aac`.
    pub format: String,
    /// Target bitrate such as `2M`; empty lets ffmpeg decide.
    pub bitrate: String,
    /// Start offset in seconds.
    pub offset: f64,
}

/// Codec names reported by ffprobe for the primary streams.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodecInfo {
    pub video_codec: String,
    pub audio_codec: String,
}

/// Whether `ffmpeg` is reachable through `PATH`.
pub fn ffmpeg_available() -> bool {
    find_in_path("ffmpeg")
}

fn find_in_path(name: &str) -> bool {
    let Some(path_var) = std::env::var_os("PATH") else {
        return false;
    };
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return true;
        }
        if cfg!(windows) && dir.join(format!("{name}.exe")).is_file() {
            return true;
        }
    }
    false
}

/// Probe the primary video and audio codec names via ffprobe.
///
/// Probe failures degrade to empty names, which the argument builder
/// treats as "re-encode".
pub async fn codec_info(input: &Path) -> CodecInfo {
    CodecInfo {
        video_codec: probe_stream(input, "v:0").await,
        audio_codec: probe_stream(input, "a:0").await,
    }
}

async fn probe_stream(input: &Path, selector: &str) -> String {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            selector,
            "-show_entries",
            "stream=codec_name",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(input)
        .stdin(Stdio::null())
        .output()
        .await;

    match output {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout).trim().to_string(),
        _ => String::new(),
    }
}

/// Build the ffmpeg argument list for the session.
fn build_args(input: &Path, opts: &TranscodeOptions, codec: &CodecInfo) -> Vec<String> {
    let format = if opts.format.is_empty() {
        "mp4"
    } else {
        opts.format.as_str()
    };

    let mut args: Vec<String> = vec!["-hide_banner".into(), "-loglevel".into(), "error".into()];
    if opts.offset > 0.0 {
        args.push("-ss".into());
        args.push(format!("{}", opts.offset));
    }
    args.push("-i".into());
    args.push(input.to_string_lossy().to_string());

    if format == "mp3" || format == "aac" {
        // Audio session.
        if codec.audio_codec == format {
            args.push("-acodec".into());
            args.push("copy".into());
        } else {
            args.push("-acodec".into());
            args.push("libmp3lame".into());
            if !opts.bitrate.is_empty() {
                args.push("-b:a".into());
                args.push(opts.bitrate.clone());
            }
        }
    } else {
        // Video session targeting fragmented MP4.
        if codec.video_codec == "h264" {
            args.push("-vcodec".into());
            args.push("copy".into());
        } else {
            args.push("-vcodec".into());
            args.push("libx264".into());
            args.push("-pix_fmt".into());
            args.push("yuv420p".into());
            if !opts.bitrate.is_empty() {
                args.push("-b:v".into());
                args.push(opts.bitrate.clone());
            }
        }

        if codec.audio_codec == "aac" || codec.audio_codec == "mp3" {
            args.push("-acodec".into());
            args.push("copy".into());
        } else {
            args.push("-acodec".into());
            args.push("aac".into());
        }

        args.push("-movflags".into());
        args.push("frag_keyframe+empty_moov+default_base_moof".into());

        if opts.offset > 0.0 {
            args.push("-copyts".into());
        }
    }

    args.push("-f".into());
    args.push(format.to_string());
    args.push("-map_metadata".into());
    args.push("-1".into());
    args.push("pipe:1".into());
    args
}

/// A live transcode session: the subprocess stdout plus its gate slot.
///
/// Dropping the stream kills the subprocess and frees the slot; both
/// happen at most once regardless of how the stream is torn down.
pub struct TranscodeStream {
    child: Child,
    stdout: ChildStdout,
    _permit: OwnedSemaphorePermit,
}

impl TranscodeStream {
    /// Claim a gate slot and start an ffmpeg session for `input`.
    ///
    /// A full gate fails fast with a busy error before any subprocess
    /// work. A spawn failure releases the slot on the way out.
    pub async fn start(
        gate: &TranscodeGate,
        input: &Path,
        opts: TranscodeOptions,
    ) -> Result<TranscodeStream> {
        Self::start_with_program(gate, PathBuf::from("ffmpeg"), input, opts).await
    }

    /// As [`TranscodeStream::start`] with an explicit program path (tests).
    pub async fn start_with_program(
        gate: &TranscodeGate,
        program: PathBuf,
        input: &Path,
        opts: TranscodeOptions,
    ) -> Result<TranscodeStream> {
        let permit = gate.try_acquire()?;

        let codec = codec_info(input).await;
        let args = build_args(input, &opts, &codec);
        tracing::debug!(input = %input.display(), ?args, "starting transcode");

        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::tool("ffmpeg", format!("failed to spawn: {e}")))?;
        // `permit` is dropped on the error path above, releasing the slot.

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::tool("ffmpeg", "stdout not captured"))?;

        Ok(TranscodeStream {
            child,
            stdout,
            _permit: permit,
        })
    }

    /// Subprocess PID, when still running.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }
}

impl AsyncRead for TranscodeStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stdout).poll_read(cx, buf)
    }
}
