// Standard MIDI File output for rendered voices.
//
// SMF format 1: track 0 carries the piece name and a fixed 120 BPM tempo,
// then one track per voice on its own channel. Event times come from the
// integer sample steps of each note, scaled by a whole number of ticks
// per step, so contiguous notes stay contiguous in the file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use hs_core::note::VoiceNotes;
use hs_core::traits::ScoreWriter;
use midly::num::{u4, u7, u15, u24, u28};
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
};

use crate::error::ExportError;

/// Ticks per quarter note in MIDI output.
pub const TICKS_PER_QUARTER: u16 = 480;

/// 120 BPM.
const TEMPO_US_PER_QUARTER: u32 = 500_000;

/// Ticks per second at the fixed tempo.
const TICKS_PER_SECOND: f64 =
    TICKS_PER_QUARTER as f64 * 1_000_000.0 / TEMPO_US_PER_QUARTER as f64;

/// Channel 10 (index 9) is the General MIDI percussion channel.
const DRUM_CHANNEL: usize = 9;

/// Largest delta a MIDI variable-length quantity can carry.
const MAX_DELTA: u64 = (1 << 28) - 1;

/// Ticks covered by one sample step, never less than one.
///
/// # Errors
/// Returns `ExportError::InvalidDuration` unless `unit_duration` is finite
/// and > 0.
///
/// # Example
/// ```
/// use hs_export::midi::ticks_per_step;
/// assert_eq!(ticks_per_step(0.2).unwrap(), 192);
/// assert_eq!(ticks_per_step(0.0001).unwrap(), 1);
/// ```
pub fn ticks_per_step(unit_duration: f64) -> Result<u32, ExportError> {
    if !unit_duration.is_finite() || unit_duration <= 0.0 {
        return Err(ExportError::InvalidDuration {
            value: unit_duration,
        });
    }
    let ticks = (unit_duration * TICKS_PER_SECOND).round();
    if ticks > f64::from(u32::MAX) {
        return Err(ExportError::InvalidDuration {
            value: unit_duration,
        });
    }
    Ok((ticks as u32).max(1))
}

fn channel_for(voice: usize) -> Result<u4, ExportError> {
    let raw = if voice < DRUM_CHANNEL { voice } else { voice + 1 };
    if raw > 15 {
        return Err(ExportError::TooManyVoices { count: voice + 1 });
    }
    Ok(u4::new(raw as u8))
}

fn delta(voice: usize, ticks: u64) -> Result<u28, ExportError> {
    if ticks > MAX_DELTA {
        return Err(ExportError::DeltaOverflow {
            voice: voice + 1,
            ticks,
        });
    }
    Ok(u28::new(ticks as u32))
}

fn meta(kind: MetaMessage<'_>) -> TrackEvent<'_> {
    TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(kind),
    }
}

fn voice_track<'a>(
    notes: &'a VoiceNotes,
    ticks_per_step: u64,
) -> Result<Track<'a>, ExportError> {
    let voice = notes.voice;
    let channel = channel_for(voice)?;
    let midi = |delta, message| TrackEvent {
        delta,
        kind: TrackEventKind::Midi { channel, message },
    };

    let mut track: Track<'a> = Vec::with_capacity(notes.events.len() * 2 + 3);
    track.push(meta(MetaMessage::TrackName(notes.series_id.as_bytes())));
    track.push(midi(
        u28::new(0),
        MidiMessage::ProgramChange {
            program: u7::new(notes.program.get()),
        },
    ));

    let mut last_tick: u64 = 0;
    for event in &notes.events {
        let key = u8::try_from(event.pitch)
            .ok()
            .filter(|p| *p <= 127)
            .ok_or(ExportError::PitchOutOfRange {
                voice: voice + 1,
                pitch: event.pitch,
            })?;
        let on_tick = event.start_step * ticks_per_step;
        let off_tick = event.end_step * ticks_per_step;

        track.push(midi(
            delta(voice, on_tick - last_tick)?,
            MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(event.velocity.min(127)),
            },
        ));
        track.push(midi(
            delta(voice, off_tick - on_tick)?,
            MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(0),
            },
        ));
        last_tick = off_tick;
    }

    track.push(meta(MetaMessage::EndOfTrack));
    Ok(track)
}

/// Build an in-memory SMF for a set of voices sharing one unit duration.
///
/// # Errors
/// Returns an `ExportError` for out-of-range pitches, more than 15 voices,
/// mismatched or invalid unit durations, or gaps too long for a delta-time.
pub fn build_smf<'a>(title: &'a str, voices: &'a [VoiceNotes]) -> Result<Smf<'a>, ExportError> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    smf.tracks.push(vec![
        meta(MetaMessage::TrackName(title.as_bytes())),
        meta(MetaMessage::Tempo(u24::new(TEMPO_US_PER_QUARTER))),
        meta(MetaMessage::EndOfTrack),
    ]);

    let Some(first) = voices.first() else {
        return Ok(smf);
    };
    if let Some(other) = voices
        .iter()
        .find(|v| v.unit_duration.to_bits() != first.unit_duration.to_bits())
    {
        return Err(ExportError::MixedDurations {
            first: first.unit_duration,
            other: other.unit_duration,
        });
    }
    if voices.len() > 15 {
        return Err(ExportError::TooManyVoices {
            count: voices.len(),
        });
    }

    let ticks = u64::from(ticks_per_step(first.unit_duration)?);
    let exact = first.unit_duration * TICKS_PER_SECOND;
    if (exact - exact.round()).abs() > 1e-9 {
        log::debug!(
            "Durée unitaire {} s arrondie à {ticks} ticks",
            first.unit_duration
        );
    }

    for notes in voices {
        smf.tracks.push(voice_track(notes, ticks)?);
    }
    Ok(smf)
}

/// Writes a piece as a Standard MIDI File.
#[derive(Clone, Debug)]
pub struct MidiWriter {
    path: PathBuf,
    title: String,
}

impl MidiWriter {
    /// Writer targeting `path`, with a default title.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            title: "Streamflow".to_string(),
        }
    }

    /// Set the piece name stored in track 0.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Encode voices to SMF bytes without touching the disk.
    ///
    /// # Errors
    /// See [`build_smf`].
    pub fn encode(&self, voices: &[VoiceNotes]) -> Result<Vec<u8>, ExportError> {
        let smf = build_smf(&self.title, voices)?;
        let mut buf = Vec::new();
        smf.write_std(&mut buf)?;
        Ok(buf)
    }
}

impl ScoreWriter for MidiWriter {
    fn write(&self, voices: &[VoiceNotes]) -> Result<()> {
        let bytes = self.encode(voices)?;
        std::fs::write(&self.path, &bytes)
            .with_context(|| format!("Impossible d'écrire {}", self.path.display()))?;
        log::info!(
            "MIDI écrit : {} ({} piste(s), {} octets)",
            self.path.display(),
            voices.len() + 1,
            bytes.len()
        );
        Ok(())
    }
}
