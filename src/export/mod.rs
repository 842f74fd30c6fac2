//! MP3 export pipeline.
//!
//! Takes the samples of one take, writes them to a temporary WAV, and hands
//! that to ffmpeg to produce a compressed file for distribution. An empty
//! take is a no-op: no transcode runs and no file is written. A transcode
//! failure is non-fatal; the caller keeps its samples and can retry.

use anyhow::{anyhow, Result};
use hound::WavWriter;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Default output filename for exported takes.
pub const DEFAULT_EXPORT_NAME: &str = "recording.mp3";

/// Exports captured samples to a compressed audio file.
///
/// Returns `false` without touching the filesystem when `samples` is empty.
///
/// # Arguments
/// * `format` - ffmpeg codec and options, e.g. "libmp3lame -ar 44100 -b:a 192k"
///
/// # Errors
/// - If the temporary WAV cannot be written
/// - If ffmpeg is missing or the transcode fails
pub fn export_samples(
    samples: &[i16],
    sample_rate: u32,
    format: &str,
    output: &Path,
) -> Result<bool> {
    if samples.is_empty() {
        tracing::warn!("Export requested with no captured audio; skipping");
        return Ok(false);
    }

    let temp_wav = temp_wav_path();
    write_wav(samples, sample_rate, &temp_wav)?;

    let result = transcode(&temp_wav, output, format);

    if let Err(e) = std::fs::remove_file(&temp_wav) {
        tracing::debug!("Failed to remove temp file: {}", e);
    }

    result?;

    let file_size = std::fs::metadata(output)?.len();
    tracing::info!(
        "Exported {} ({} bytes, format: {})",
        output.display(),
        file_size,
        format
    );
    Ok(true)
}

/// Transcodes an existing audio file (a stored take's WAV) to the export
/// format.
///
/// # Errors
/// - If the input file does not exist
/// - If ffmpeg is missing or the transcode fails
pub fn export_file(input: &Path, format: &str, output: &Path) -> Result<()> {
    if !input.exists() {
        return Err(anyhow!("Audio file not found: {}", input.display()));
    }
    transcode(input, output, format)?;

    let file_size = std::fs::metadata(output)?.len();
    tracing::info!("Exported {} ({} bytes)", output.display(), file_size);
    Ok(())
}

/// Writes mono i16 PCM samples as a WAV file.
pub fn write_wav(samples: &[i16], sample_rate: u32, path: &Path) -> Result<()> {
    let wav_spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, wav_spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    tracing::debug!("WAV written: {}", path.display());
    Ok(())
}

/// Runs ffmpeg to convert `input` into `output` per the format string.
///
/// The format string is "codec [options]"; options are forwarded to ffmpeg
/// verbatim.
fn transcode(input: &Path, output: &Path, format: &str) -> Result<()> {
    let format_parts: Vec<&str> = format.split_whitespace().collect();
    if format_parts.is_empty() {
        return Err(anyhow!("Invalid format string: empty"));
    }
    let codec = format_parts[0];

    let ffmpeg_path = find_ffmpeg()?;

    let mut cmd = Command::new(&ffmpeg_path);
    cmd.arg("-loglevel")
        .arg("error")
        .arg("-i")
        .arg(input)
        .arg("-vn")
        .arg("-acodec")
        .arg(codec)
        .arg("-y");

    for option in &format_parts[1..] {
        cmd.arg(option);
    }

    cmd.arg(output);

    let cmd_output = cmd.output()?;

    if cmd_output.status.success() {
        tracing::debug!("Audio transcoded to {} format", codec);
        Ok(())
    } else {
        let error_msg = String::from_utf8_lossy(&cmd_output.stderr);
        tracing::error!("ffmpeg transcode failed: {}", error_msg);
        Err(anyhow!("Audio encoding failed: {error_msg}"))
    }
}

fn temp_wav_path() -> PathBuf {
    std::env::temp_dir().join(format!("vrec_{}.wav", std::process::id()))
}

/// Locates the ffmpeg binary on the system.
///
/// Checks common installation locations by platform, then falls back to a
/// PATH search via `which`/`where`.
///
/// # Errors
/// - If ffmpeg cannot be found anywhere
pub fn find_ffmpeg() -> Result<PathBuf> {
    let candidates = if cfg!(target_os = "macos") {
        vec![
            PathBuf::from("/opt/homebrew/bin/ffmpeg"),
            PathBuf::from("/usr/local/bin/ffmpeg"),
            PathBuf::from("/usr/bin/ffmpeg"),
        ]
    } else if cfg!(target_os = "linux") {
        vec![
            PathBuf::from("/usr/bin/ffmpeg"),
            PathBuf::from("/usr/local/bin/ffmpeg"),
            PathBuf::from("/snap/bin/ffmpeg"),
        ]
    } else if cfg!(target_os = "windows") {
        vec![
            PathBuf::from("C:\\ffmpeg\\bin\\ffmpeg.exe"),
            PathBuf::from("C:\\Program Files\\ffmpeg\\bin\\ffmpeg.exe"),
            PathBuf::from("C:\\Program Files (x86)\\ffmpeg\\bin\\ffmpeg.exe"),
        ]
    } else {
        vec![]
    };

    for path in candidates {
        if path.exists() {
            tracing::debug!("Found ffmpeg at: {}", path.display());
            return Ok(path);
        }
    }

    let ffmpeg_path = find_in_path("ffmpeg")?;
    tracing::debug!("Found ffmpeg in PATH at: {}", ffmpeg_path.display());
    Ok(ffmpeg_path)
}

/// Searches for a binary in the system PATH.
fn find_in_path(binary_name: &str) -> Result<PathBuf> {
    let search_cmd = if cfg!(target_os = "windows") {
        "where"
    } else {
        "which"
    };

    let output = Command::new(search_cmd)
        .arg(binary_name)
        .output()
        .map_err(|e| anyhow!("Failed to search PATH for {binary_name}: {e}"))?;

    if output.status.success() {
        let path_str = String::from_utf8_lossy(&output.stdout);
        let path = PathBuf::from(path_str.trim());
        if !path.as_os_str().is_empty() {
            return Ok(path);
        }
    }

    Err(anyhow!(
        "ffmpeg not found. Please install ffmpeg:\n\
         macOS: brew install ffmpeg\n\
         Linux: apt install ffmpeg (Debian/Ubuntu) or dnf install ffmpeg (Fedora)\n\
         Windows: Download from https://ffmpeg.org/download.html"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_take_export_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("recording.mp3");

        let exported =
            export_samples(&[], 44100, "libmp3lame -ar 44100 -b:a 192k", &output).unwrap();

        assert!(!exported);
        assert!(!output.exists(), "no file may be produced for an empty take");
    }

    #[test]
    fn wav_round_trip_preserves_samples() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("check.wav");
        let samples = vec![0i16, 42, -42, 32767, -32768];

        write_wav(&samples, 22050, &path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 22050);
        let read: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read, samples);
    }

    #[test]
    fn export_of_missing_input_file_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("ghost.wav");
        let output = dir.path().join("out.mp3");
        assert!(export_file(&missing, "libmp3lame", &output).is_err());
    }

    #[test]
    fn find_ffmpeg_reports_location_or_absence() {
        // Succeeds wherever ffmpeg is installed; absence is fine on CI
        match find_ffmpeg() {
            Ok(path) => println!("Found ffmpeg at: {}", path.display()),
            Err(e) => println!("ffmpeg not found (expected on CI): {e}"),
        }
    }
}
