/// Sound engine: procedural sound effects via rodio.
///
/// All sounds are generated as in-memory WAV buffers at init time.
/// Playback is fire-and-forget (non-blocking) via rodio's Sink.
///
/// Compile without the "sound" feature to disable audio entirely
/// (the stub SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::f32::consts::TAU;
    use std::io::Cursor;
    use std::sync::Arc;

    use log::debug;
    use rodio::{OutputStream, OutputStreamHandle, Sink};

    const SAMPLE_RATE: u32 = 22050;

    /// Pre-generated WAV buffers for each sound effect.
    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_push: Arc<Vec<u8>>,
        sfx_bump: Arc<Vec<u8>>,
        sfx_win: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        pub fn new() -> Option<Self> {
            let (stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    debug!("no audio output: {e}");
                    return None;
                }
            };

            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_push: Arc::new(make_wav(&gen_push())),
                sfx_bump: Arc::new(make_wav(&gen_bump())),
                sfx_win: Arc::new(make_wav(&gen_win())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach();
                }
            }
        }

        pub fn play_push(&self) { self.play(&self.sfx_push); }
        pub fn play_bump(&self) { self.play(&self.sfx_bump); }
        pub fn play_win(&self) { self.play(&self.sfx_win); }
    }

    // ════════════════════════════════════════════════════════════
    //  Waveform generators: mono f32 samples in [-1, 1]
    // ════════════════════════════════════════════════════════════

    fn samples_for(duration: f32) -> usize {
        (SAMPLE_RATE as f32 * duration) as usize
    }

    /// Push: low scrape, a falling tone under a little noise.
    pub(super) fn gen_push() -> Vec<f32> {
        let n = samples_for(0.09);
        let mut rng: u32 = 0x2545_f491;
        (0..n)
            .map(|i| {
                let t = i as f32 / n as f32;
                let ti = i as f32 / SAMPLE_RATE as f32;
                let freq = 140.0 - t * 50.0;
                let tone = (ti * freq * TAU).sin();
                rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
                let noise = (rng as f32 / u32::MAX as f32) * 2.0 - 1.0;
                let env = (1.0 - t).powf(1.5);
                (tone * 0.7 + noise * 0.3) * env * 0.35
            })
            .collect()
    }

    /// Bump: very short square-ish thud.
    pub(super) fn gen_bump() -> Vec<f32> {
        let n = samples_for(0.05);
        (0..n)
            .map(|i| {
                let ti = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - i as f32 / n as f32;
                let s = (ti * 90.0 * TAU).sin();
                s.signum() * env * 0.15
            })
            .collect()
    }

    /// Win: ascending fanfare G4→C5→E5→G5 with a held final note.
    pub(super) fn gen_win() -> Vec<f32> {
        let notes = [392.0_f32, 523.0, 659.0, 784.0];
        let mut samples = Vec::new();
        for (k, &freq) in notes.iter().enumerate() {
            let dur = if k + 1 == notes.len() { 0.35 } else { 0.09 };
            let n = samples_for(dur);
            for i in 0..n {
                let t = i as f32 / SAMPLE_RATE as f32;
                let env = 1.0 - (i as f32 / n as f32) * 0.8;
                let wave = (t * freq * TAU).sin() * 0.7
                    + (t * freq * 2.0 * TAU).sin() * 0.3;
                samples.push(wave * env * 0.3);
            }
        }
        samples
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: 16-bit PCM mono
    // ════════════════════════════════════════════════════════════

    pub(super) fn make_wav(samples: &[f32]) -> Vec<u8> {
        let bits_per_sample: u16 = 16;
        let block_align: u16 = bits_per_sample / 8;
        let byte_rate = SAMPLE_RATE * block_align as u32;
        let data_size = samples.len() as u32 * block_align as u32;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&(36 + data_size).to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&1u16.to_le_bytes()); // mono
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());
        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when the sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_push(&self) {}
    pub fn play_bump(&self) {}
    pub fn play_win(&self) {}
}

#[cfg(all(test, feature = "sound"))]
mod tests {
    use super::inner::*;

    #[test]
    fn wav_header_matches_payload() {
        let samples = gen_push();
        let wav = make_wav(&samples);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + samples.len() * 2);
        let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(data_size as usize, samples.len() * 2);
    }

    #[test]
    fn samples_stay_in_range() {
        for samples in [gen_push(), gen_bump(), gen_win()] {
            assert!(!samples.is_empty());
            assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));
        }
    }

    #[test]
    fn out_of_range_samples_are_clamped() {
        let wav = make_wav(&[2.0, -2.0]);
        assert_eq!(i16::from_le_bytes([wav[44], wav[45]]), i16::MAX);
        assert_eq!(i16::from_le_bytes([wav[46], wav[47]]), -i16::MAX);
    }
}
