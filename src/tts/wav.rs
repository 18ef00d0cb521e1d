use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tempfile::NamedTempFile;

use super::engine::RawAudio;
use crate::error::AppError;

fn spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

fn to_pcm(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

/// Write samples as 16-bit mono PCM WAV
fn encode_into<W: Write + Seek>(out: W, samples: &[f32], sample_rate: u32) -> Result<(), AppError> {
    let mut writer = WavWriter::new(out, spec(sample_rate))?;
    for &sample in samples {
        writer.write_sample(to_pcm(sample))?;
    }
    writer.finalize()?;
    Ok(())
}

/// A WAV file written for one request. The file is deleted when this drops.
pub struct StagedAudio {
    file: NamedTempFile,
}

impl StagedAudio {
    /// Write `audio` to a uniquely named file in `dir`.
    pub fn write(dir: &Path, audio: &RawAudio) -> Result<Self, AppError> {
        let mut file = tempfile::Builder::new()
            .prefix("tts-")
            .suffix(".wav")
            .tempfile_in(dir)?;

        encode_into(
            BufWriter::new(file.as_file_mut()),
            &audio.samples,
            audio.sample_rate,
        )?;

        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Read the staged file back as an encoded clip.
    pub fn read(&self) -> Result<EncodedClip, AppError> {
        EncodedClip::from_wav(std::fs::read(self.path())?)
    }
}

/// WAV bytes plus the facts the response reports about them.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedClip {
    pub bytes: Vec<u8>,
    pub sample_count: u32,
    pub sample_rate: u32,
}

impl EncodedClip {
    pub fn from_wav(bytes: Vec<u8>) -> Result<Self, AppError> {
        let (sample_rate, sample_count) = {
            let reader = WavReader::new(Cursor::new(&bytes))?;
            (reader.spec().sample_rate, reader.duration())
        };

        Ok(Self {
            bytes,
            sample_count,
            sample_rate,
        })
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        f64::from(self.sample_count) / f64::from(self.sample_rate)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}
