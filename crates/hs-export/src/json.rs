use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use hs_core::note::{NoteEvent, VoiceNotes, piece_duration};
use hs_core::traits::{ScoreWriter, SiteInfo};
use serde::Serialize;

/// Summary of one voice, optionally with its note events.
#[derive(Clone, Debug, Serialize)]
pub struct VoiceSummary<'a> {
    /// Voice number, 1-based.
    pub voice: usize,
    /// Gauge identifier.
    pub gauge: &'a str,
    /// Site metadata, when the lookup resolved it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<&'a SiteInfo>,
    /// Instrument program.
    pub program: u8,
    /// General MIDI instrument name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument: Option<&'static str>,
    /// Number of note events.
    pub event_count: usize,
    /// Duration in seconds.
    pub duration: f64,
    /// Full note list, only when events were requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<&'a [NoteEvent]>,
}

/// Whole-piece summary.
#[derive(Clone, Debug, Serialize)]
pub struct PieceSummary<'a> {
    /// Piece title, as written in the MIDI tempo track.
    pub title: &'a str,
    /// Longest voice, in seconds.
    pub duration: f64,
    /// One summary per voice, in voice order.
    pub voices: Vec<VoiceSummary<'a>>,
}

impl<'a> PieceSummary<'a> {
    /// Summarize `voices`, attaching site metadata by gauge id.
    ///
    /// # Example
    /// ```
    /// use std::collections::BTreeMap;
    /// use hs_core::instrument::Program;
    /// use hs_core::note::{NoteEvent, VoiceNotes};
    /// use hs_export::json::PieceSummary;
    /// let voices = vec![VoiceNotes {
    ///     voice: 0, series_id: "05484900".into(), program: Program::default(),
    ///     unit_duration: 0.5, total_steps: 3,
    ///     events: vec![NoteEvent::from_steps(60, 0, 3, 0.5, 100, Program::default())],
    /// }];
    /// let sites = BTreeMap::new();
    /// let summary = PieceSummary::new("Raccoon", &voices, &sites, false);
    /// assert_eq!(summary.duration, 1.5);
    /// assert_eq!(summary.voices[0].voice, 1);
    /// assert!(summary.voices[0].site.is_none());
    /// ```
    #[must_use]
    pub fn new(
        title: &'a str,
        voices: &'a [VoiceNotes],
        sites: &'a BTreeMap<String, SiteInfo>,
        with_events: bool,
    ) -> Self {
        Self {
            title,
            duration: piece_duration(voices),
            voices: voices
                .iter()
                .map(|v| VoiceSummary {
                    voice: v.voice + 1,
                    gauge: &v.series_id,
                    site: sites.get(&v.series_id),
                    program: v.program.get(),
                    instrument: v.program.name(),
                    event_count: v.events.len(),
                    duration: v.duration(),
                    events: with_events.then_some(v.events.as_slice()),
                })
                .collect(),
        }
    }
}

/// Serialize every voice's note events and summary as pretty JSON.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn notes_to_json(
    title: &str,
    voices: &[VoiceNotes],
    sites: &BTreeMap<String, SiteInfo>,
) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&PieceSummary::new(title, voices, sites, true))
}

/// Writes the JSON note dump to a file.
#[derive(Clone, Debug)]
pub struct JsonWriter {
    path: PathBuf,
    title: String,
    sites: BTreeMap<String, SiteInfo>,
}

impl JsonWriter {
    /// Writer to `path`, without site metadata.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            sites: BTreeMap::new(),
        }
    }

    /// Attach site metadata to the voice summaries.
    #[must_use]
    pub fn with_sites(mut self, sites: BTreeMap<String, SiteInfo>) -> Self {
        self.sites = sites;
        self
    }
}

impl ScoreWriter for JsonWriter {
    fn write(&self, voices: &[VoiceNotes]) -> Result<()> {
        let json = notes_to_json(&self.title, voices, &self.sites)
            .context("Sérialisation JSON des notes")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Impossible d'écrire {}", self.path.display()))?;
        log::info!("Notes écrites : {}", self.path.display());
        Ok(())
    }
}
