use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use hs_core::config::PieceConfig;
use hs_core::note::{VoiceNotes, piece_duration};
use hs_core::traits::{SeriesSource, SiteInfo, SiteLookup};
use hs_map::voice::{PipelineParams, VoiceInput, render_voices};
use hs_source::dataset::select_series;

/// A rendered piece, ready for the score writers.
#[derive(Debug)]
pub struct Piece {
    /// Note events per voice, in voice order.
    pub voices: Vec<VoiceNotes>,
    /// First and last day covered by any voice.
    pub span: Option<(NaiveDate, NaiveDate)>,
}

impl Piece {
    /// Longest voice, in seconds.
    #[must_use]
    pub fn duration(&self) -> f64 {
        piece_duration(&self.voices)
    }

    /// Calendar days covered, both ends inclusive.
    #[must_use]
    pub fn days(&self) -> i64 {
        self.span
            .map_or(0, |(first, last)| (last - first).num_days() + 1)
    }

    /// Gauge identifiers, in voice order.
    #[must_use]
    pub fn gauges(&self) -> Vec<&str> {
        self.voices.iter().map(|v| v.series_id.as_str()).collect()
    }
}

/// Build the per-voice inputs: slice each gauge to the configured range,
/// apply the missing-sample policy and resolve the scale.
///
/// # Errors
/// Returns an error naming the voice if its gauge is unknown, its range is
/// empty, a sample is missing under `MissingPolicy::Reject`, its scale is
/// unknown, or its offset pushes the played scale out of the MIDI range.
pub fn build_inputs(
    config: &PieceConfig,
    source: &dyn SeriesSource,
) -> Result<(Vec<VoiceInput>, Option<(NaiveDate, NaiveDate)>)> {
    let mut inputs = Vec::with_capacity(config.voices.len());
    let mut span: Option<(NaiveDate, NaiveDate)> = None;

    for (i, voice) in config.voices.iter().enumerate() {
        let ctx = || format!("Voix {} ({})", i + 1, voice.series);
        let series =
            select_series(source, &voice.series, config.start, config.end).with_context(ctx)?;
        let values = series.defined_values(config.missing).with_context(ctx)?;
        let scale = voice.resolve_scale().with_context(ctx)?;
        let played = voice.played_scale().with_context(ctx)?;

        if let Some((first, last)) = series.span() {
            span = Some(match span {
                Some((a, b)) => (a.min(first), b.max(last)),
                None => (first, last),
            });
        }
        let pitches = played.pitches();
        log::debug!(
            "Voix {} : {} sur {} échantillon(s), gamme {} (étiage {}, crue {})",
            i + 1,
            values.len(),
            series.len(),
            voice.scale,
            pitches[0],
            pitches[pitches.len() - 1]
        );

        inputs.push(VoiceInput {
            series_id: voice.series.clone(),
            values,
            scale: scale.pitches().to_vec(),
            program: voice.program,
            invert: voice.invert,
            offset: voice.offset,
        });
    }
    Ok((inputs, span))
}

/// Run the full pipeline for every configured voice.
///
/// # Errors
/// Returns the first failing voice's error, with its index and stage.
pub fn render_piece(config: &PieceConfig, source: &dyn SeriesSource) -> Result<Piece> {
    let (inputs, span) = build_inputs(config, source)?;
    let params = PipelineParams::from(config);
    let rendered = render_voices(&inputs, &params)?;

    let piece = Piece {
        voices: rendered.into_iter().map(|r| r.notes).collect(),
        span,
    };
    log::info!(
        "{} voix rendue(s) : {:.1} s, {} jour(s)",
        piece.voices.len(),
        piece.duration(),
        piece.days()
    );
    Ok(piece)
}

/// Resolve site metadata for every gauge of the piece.
///
/// Gauges without a result are logged and left out.
#[must_use]
pub fn resolve_sites(lookup: &dyn SiteLookup, piece: &Piece) -> BTreeMap<String, SiteInfo> {
    let gauges = piece.gauges();
    let sites = lookup.lookup(&gauges);
    for gauge in gauges.iter().filter(|g| !sites.contains_key(**g)) {
        log::warn!("Pas de métadonnées pour la jauge {gauge}");
    }
    sites
}

#[cfg(test)]
mod tests {
    use super::*;
    use hs_core::config::VoiceConfig;
    use hs_core::series::MissingPolicy;
    use hs_map::error::{RenderError, Stage};
    use hs_source::dataset::JsonDataset;

    const DATA: &str = r#"{
        "A": {
            "2012-01-01": 10.0, "2012-01-02": 20.0, "2012-01-03": 40.0,
            "2012-01-04": 80.0, "2012-01-05": 160.0
        },
        "B": {
            "2012-01-02": 5.0, "2012-01-03": "", "2012-01-04": 5.0,
            "2012-01-05": 6.0, "2012-01-06": 9.0
        }
    }"#;

    fn config(voices: Vec<VoiceConfig>) -> PieceConfig {
        PieceConfig {
            start: None,
            end: None,
            exclude: Vec::new(),
            voices,
            ..PieceConfig::default()
        }
    }

    fn dataset() -> JsonDataset {
        JsonDataset::parse(DATA, &[]).unwrap()
    }

    #[test]
    fn renders_every_voice_over_the_selected_range() {
        let mut cfg = config(vec![
            VoiceConfig::new("A", "Chromatic", 0),
            VoiceConfig::new("A", "C Major Pentatonic", 42),
        ]);
        cfg.end = NaiveDate::from_ymd_opt(2012, 1, 4);
        let piece = render_piece(&cfg, &dataset()).unwrap();

        assert_eq!(piece.voices.len(), 2);
        assert_eq!(piece.voices[0].total_steps, 4);
        assert_eq!(piece.days(), 4);
        assert!((piece.duration() - 0.8).abs() < 1e-12);
        // log spacing: doubling flows climb one bin at a time
        let pitches: Vec<i32> = piece.voices[0].events.iter().map(|e| e.pitch).collect();
        assert_eq!(pitches.first(), Some(&36));
        assert_eq!(pitches.last(), Some(&83));
    }

    #[test]
    fn missing_sample_is_rejected_by_default() {
        let cfg = config(vec![VoiceConfig::new("B", "Chromatic", 0)]);
        let err = render_piece(&cfg, &dataset()).unwrap_err();
        assert!(format!("{err:#}").contains("2012-01-03"));
    }

    #[test]
    fn missing_sample_can_be_dropped() {
        let mut cfg = config(vec![
            VoiceConfig::new("A", "Chromatic", 0),
            VoiceConfig::new("B", "Chromatic", 0),
        ]);
        cfg.missing = MissingPolicy::Drop;
        let piece = render_piece(&cfg, &dataset()).unwrap();
        assert_eq!(piece.voices[1].total_steps, 4);
        assert_eq!(
            piece.span,
            Some((
                NaiveDate::from_ymd_opt(2012, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2012, 1, 6).unwrap()
            ))
        );
        assert_eq!(piece.days(), 6);
    }

    #[test]
    fn unknown_gauge_names_the_voice() {
        let cfg = config(vec![
            VoiceConfig::new("A", "Chromatic", 0),
            VoiceConfig::new("Z", "Chromatic", 0),
        ]);
        let err = render_piece(&cfg, &dataset()).unwrap_err();
        assert!(format!("{err:#}").starts_with("Voix 2 (Z)"));
    }

    #[test]
    fn pipeline_error_carries_voice_and_stage() {
        let mut cfg = config(vec![VoiceConfig::new("A", "Chromatic", 0)]);
        cfg.voices.push(VoiceConfig::new("A", "Chromatic", 0));
        cfg.start = NaiveDate::from_ymd_opt(2012, 1, 5);
        // one sample only: fine, degenerate range
        let piece = render_piece(&cfg, &dataset()).unwrap();
        assert_eq!(piece.voices[1].events.len(), 1);

        let data = r#"{ "N": { "2012-01-01": 3.0, "2012-01-02": -1.0 } }"#;
        let source = JsonDataset::parse(data, &[]).unwrap();
        let cfg = config(vec![VoiceConfig::new("N", "Chromatic", 0)]);
        let err = render_piece(&cfg, &source).unwrap_err();
        let Some(RenderError::Voice(voice_err)) = err.downcast_ref::<RenderError>() else {
            panic!("expected a voice error, got {err:#}");
        };
        assert_eq!(voice_err.voice, 0);
        assert_eq!(voice_err.stage, Stage::Quantize);
    }

    #[test]
    fn played_scale_must_stay_in_midi_range() {
        let mut high = VoiceConfig::new("A", "Chromatic", 0);
        high.offset = 100;
        let cfg = config(vec![VoiceConfig::new("A", "Chromatic", 0), high]);
        let err = render_piece(&cfg, &dataset()).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.starts_with("Voix 2 (A)"), "{msg}");
        assert!(msg.contains("outside 0..=127"), "{msg}");

        let mut inverted = VoiceConfig::new("A", "Chromatic", 0);
        inverted.invert = true;
        inverted.offset = -12;
        let cfg = config(vec![inverted]);
        let (inputs, _) = build_inputs(&cfg, &dataset()).unwrap();
        assert!(inputs[0].invert);
        assert_eq!(inputs[0].offset, -12);
        let piece = render_piece(&cfg, &dataset()).unwrap();
        let pitches: Vec<i32> = piece.voices[0].events.iter().map(|e| e.pitch).collect();
        assert_eq!(pitches.first(), Some(&(83 - 12)));
        assert_eq!(pitches.last(), Some(&(36 - 12)));
    }

    struct FixedLookup;

    impl SiteLookup for FixedLookup {
        fn lookup(&self, ids: &[&str]) -> BTreeMap<String, SiteInfo> {
            ids.iter()
                .filter(|id| **id == "A")
                .map(|id| {
                    (
                        (*id).to_string(),
                        SiteInfo {
                            latitude: 41.0,
                            longitude: -93.0,
                            name: "A RIVER".into(),
                        },
                    )
                })
                .collect()
        }
    }

    #[test]
    fn sites_are_resolved_for_known_gauges_only() {
        let mut cfg = config(vec![
            VoiceConfig::new("A", "Chromatic", 0),
            VoiceConfig::new("B", "Chromatic", 0),
        ]);
        cfg.missing = MissingPolicy::Drop;
        let piece = render_piece(&cfg, &dataset()).unwrap();
        let sites = resolve_sites(&FixedLookup, &piece);
        assert_eq!(sites.len(), 1);
        assert_eq!(sites["A"].name, "A RIVER");
    }
}
