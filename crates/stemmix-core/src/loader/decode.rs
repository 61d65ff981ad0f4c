//! Stem fetching and decoding
//!
//! One stem travels: URL (or local path) -> raw bytes -> symphonia
//! decode -> stereo downmix -> rubato resample to the engine rate.

use std::io::{Cursor, Read};
use std::path::Path;

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::LoadError;
use crate::types::{Sample, StereoBuffer};

/// Fetch the raw bytes of one stem.
///
/// HTTP(S) URLs go through a single GET with no retries; anything else
/// is treated as a local path (used by tests and offline descriptors).
pub fn fetch_stem(source: &str) -> Result<Vec<u8>, LoadError> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let response = ureq::get(source).call().map_err(|e| LoadError::Fetch {
            url: source.to_string(),
            message: e.to_string(),
        })?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| LoadError::Fetch {
                url: source.to_string(),
                message: e.to_string(),
            })?;
        Ok(bytes)
    } else {
        Ok(std::fs::read(Path::new(source))?)
    }
}

/// Decode encoded stem bytes into a stereo buffer at `target_rate`
pub fn decode_stem(
    bytes: Vec<u8>,
    source_name: &str,
    target_rate: u32,
) -> Result<StereoBuffer, LoadError> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = source_name
        .split(['?', '#'])
        .next()
        .and_then(|p| p.rsplit('.').next())
    {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| LoadError::Decode(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(LoadError::NoAudioTrack)?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| LoadError::Decode(e.to_string()))?;

    let mut left: Vec<Sample> = Vec::new();
    let mut right: Vec<Sample> = Vec::new();
    let mut source_rate = 0u32;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            // End of stream surfaces as an IO error
            Err(SymphoniaError::IoError(_)) => break,
            Err(e) => return Err(LoadError::Decode(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                source_rate = spec.rate;
                let channels = spec.channels.count();

                let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                sample_buf.copy_interleaved_ref(decoded);

                for frame in sample_buf.samples().chunks(channels.max(1)) {
                    match frame.len() {
                        0 => {}
                        1 => {
                            left.push(frame[0]);
                            right.push(frame[0]);
                        }
                        // Stereo or more: take the first two channels
                        _ => {
                            left.push(frame[0]);
                            right.push(frame[1]);
                        }
                    }
                }
            }
            // Recoverable corruption: skip the packet
            Err(SymphoniaError::DecodeError(_)) => (),
            Err(e) => return Err(LoadError::Decode(e.to_string())),
        }
    }

    if left.is_empty() || source_rate == 0 {
        return Err(LoadError::NoAudioTrack);
    }

    if source_rate != target_rate {
        (left, right) = resample_stereo(left, right, source_rate, target_rate)?;
    }

    Ok(StereoBuffer::from_channels(&left, &right))
}

/// Resample both channels in one shot with rubato's sinc resampler
fn resample_stereo(
    left: Vec<Sample>,
    right: Vec<Sample>,
    source_rate: u32,
    target_rate: u32,
) -> Result<(Vec<Sample>, Vec<Sample>), LoadError> {
    log::debug!(
        "Resampling stem from {} Hz to {} Hz ({} samples)",
        source_rate,
        target_rate,
        left.len()
    );

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(
        target_rate as f64 / source_rate as f64,
        2.0,
        params,
        left.len(),
        2,
    )
    .map_err(|e| LoadError::Resample(e.to_string()))?;

    let waves_in = vec![left, right];
    let mut waves_out = resampler
        .process(&waves_in, None)
        .map_err(|e| LoadError::Resample(e.to_string()))?;

    let right_out = waves_out.pop().unwrap_or_default();
    let left_out = waves_out.pop().unwrap_or_default();
    Ok((left_out, right_out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SAMPLE_RATE;

    /// Write a small WAV file and decode it back through the full path
    #[test]
    fn test_decode_wav_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vocals.wav");

        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..4410 {
            let value = ((i as f32 * 0.01).sin() * 16000.0) as i16;
            writer.write_sample(value).unwrap();
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();

        let source = path.to_string_lossy().to_string();
        let bytes = fetch_stem(&source).unwrap();
        let buffer = decode_stem(bytes, &source, SAMPLE_RATE).unwrap();

        assert_eq!(buffer.len(), 4410);
        // Signal survived the round trip
        assert!(buffer.iter().any(|s| s.left.abs() > 0.1));
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = decode_stem(vec![0u8; 64], "noise.mp3", SAMPLE_RATE);
        assert!(result.is_err());
    }

    #[test]
    fn test_fetch_missing_file_fails() {
        assert!(fetch_stem("/nonexistent/stem.mp3").is_err());
    }
}
