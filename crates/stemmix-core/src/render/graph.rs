//! Filter graph construction for the offline render
//!
//! The transcoder consumes one named input per stem and a filter graph
//! expression that applies each channel's snapshotted gain, then mixes
//! everything into a single stream. The mix takes its duration from
//! the first input and does NOT auto-normalize: the user's relative
//! loudness choices are exactly what ends up in the file.

use std::path::PathBuf;

use crate::engine::GainValue;
use crate::types::{MixFormat, Part};

/// One staged input channel: a stem plus its snapshotted gain
#[derive(Debug, Clone)]
pub struct ChannelInput {
    pub part: Part,
    pub url: String,
    pub gain: GainValue,
}

/// Everything one render needs, captured at export click time
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// User-chosen name of the output file (sanitized before use)
    pub mix_name: String,
    /// Container format (decides extension and encoding parameters)
    pub format: MixFormat,
    /// Output bitrate in kbps for lossy formats
    pub bitrate_kbps: Option<u32>,
    /// Mix duration in seconds (drives the progress ratio)
    pub duration_seconds: f64,
    /// Present stems with their gain snapshot, in vocabulary order
    pub channels: Vec<ChannelInput>,
    /// Where the finished file lands; None means the user's download dir
    pub output_dir: Option<PathBuf>,
}

/// Default output bitrate when the descriptor does not carry one
pub const DEFAULT_BITRATE_KBPS: u32 = 256;

/// Format one channel's gain as a volume filter argument.
///
/// A silenced channel becomes an explicit zero multiplier — never a
/// non-finite dB string, which the transcoder would reject.
fn volume_arg(gain: GainValue) -> String {
    match gain {
        GainValue::Silence => "0".to_string(),
        GainValue::Db(db) => format!("{:.2}dB", db),
    }
}

/// Build the filter graph expression for the given channels.
///
/// Shape: `[0:a]volume=0.00dB[a0];[1:a]volume=-6.02dB[a1];...
/// [a0][a1]amix=inputs=2:duration=first:normalize=0[mix]`
pub fn build_filter_graph(channels: &[ChannelInput]) -> String {
    let mut graph = String::new();

    for (i, channel) in channels.iter().enumerate() {
        graph.push_str(&format!(
            "[{}:a]volume={}[a{}];",
            i,
            volume_arg(channel.gain),
            i
        ));
    }

    for i in 0..channels.len() {
        graph.push_str(&format!("[a{}]", i));
    }
    graph.push_str(&format!(
        "amix=inputs={}:duration=first:normalize=0[mix]",
        channels.len()
    ));

    graph
}

/// Encoding arguments for the output file: lossless formats get a
/// fixed 16-bit sample format, lossy formats the configured bitrate.
pub fn output_encoding_args(format: MixFormat, bitrate_kbps: Option<u32>) -> Vec<String> {
    if format.is_lossy() {
        vec![
            "-b:a".to_string(),
            format!("{}k", bitrate_kbps.unwrap_or(DEFAULT_BITRATE_KBPS)),
        ]
    } else {
        vec!["-sample_fmt".to_string(), "s16".to_string()]
    }
}

/// Sanitize a user-entered mix name into a clean filename: keep
/// alphanumerics, dash, whitespace, comma, brackets, underscore and
/// dot; drop everything else.
pub fn valid_filename(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .filter(|c| {
            c.is_alphanumeric() || c.is_whitespace() || "-_.,[]()".contains(*c)
        })
        .collect();

    if cleaned.is_empty() {
        "mix".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(part: Part, gain: GainValue) -> ChannelInput {
        ChannelInput {
            part,
            url: format!("http://host/{}.mp3", part.name()),
            gain,
        }
    }

    /// Volumes {100, 50, 80, 100} → 0dB, -6.02dB, -1.94dB, 0dB
    #[test]
    fn test_graph_encodes_snapshotted_gains() {
        let channels = vec![
            channel(Part::Vocals, GainValue::from_volume_pct(100.0)),
            channel(Part::Accomp, GainValue::from_volume_pct(50.0)),
            channel(Part::Bass, GainValue::from_volume_pct(80.0)),
            channel(Part::Drums, GainValue::from_volume_pct(100.0)),
        ];

        let graph = build_filter_graph(&channels);
        assert!(graph.contains("[0:a]volume=0.00dB[a0]"));
        assert!(graph.contains("[1:a]volume=-6.02dB[a1]"));
        assert!(graph.contains("[2:a]volume=-1.94dB[a2]"));
        assert!(graph.contains("[3:a]volume=0.00dB[a3]"));
        assert!(graph.ends_with("[a0][a1][a2][a3]amix=inputs=4:duration=first:normalize=0[mix]"));
    }

    /// A muted channel becomes volume=0, never a non-finite dB value
    #[test]
    fn test_muted_channel_is_explicit_zero_gain() {
        let channels = vec![
            channel(Part::Vocals, GainValue::Silence),
            channel(Part::Drums, GainValue::from_volume_pct(100.0)),
        ];

        let graph = build_filter_graph(&channels);
        assert!(graph.contains("[0:a]volume=0[a0]"));
        assert!(!graph.contains("inf"));
        assert!(!graph.contains("NaN"));
    }

    #[test]
    fn test_lossy_output_carries_bitrate() {
        let args = output_encoding_args(MixFormat::Mp3, Some(320));
        assert_eq!(args, vec!["-b:a", "320k"]);

        let args = output_encoding_args(MixFormat::Mp3, None);
        assert_eq!(args, vec!["-b:a", "256k"]);
    }

    #[test]
    fn test_lossless_output_is_16_bit() {
        let args = output_encoding_args(MixFormat::Flac, Some(320));
        assert_eq!(args, vec!["-sample_fmt", "s16"]);

        let args = output_encoding_args(MixFormat::Wav, None);
        assert_eq!(args, vec!["-sample_fmt", "s16"]);
    }

    #[test]
    fn test_valid_filename() {
        assert_eq!(valid_filename("john's mix in 2004"), "johns mix in 2004");
        assert_eq!(valid_filename("  trimmed  "), "trimmed");
        assert_eq!(valid_filename("a/b\\c:d*e"), "abcde");
        assert_eq!(valid_filename("???"), "mix");
        assert_eq!(valid_filename("Night Drive (remix) [v2]"), "Night Drive (remix) [v2]");
    }
}
