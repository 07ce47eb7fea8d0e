use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::instrument::Program;
use crate::scale::Scale;
use crate::series::MissingPolicy;

/// Plage valide de la durée unitaire, en secondes.
pub const UNIT_DURATION_RANGE: (f64, f64) = (0.05, 2.0);

/// Named gauge trios: (name, root gauge, [upper gauges]).
///
/// Selecting a trio assigns voice 1 to the root gauge and voices 2 and 3
/// to the upper gauges.
pub const TRIOS: &[(&str, &str, [&str; 2])] = &[
    ("Raccoon River", "05484900", ["05482300", "05483450"]),
    ("Upper Des Moines", "05482000", ["05476750", "05479000"]),
    ("Lower Des Moines", "05490500", ["05487470", "05488200"]),
];

/// Gauges left out of the bundled dataset (incomplete records).
pub const DEFAULT_EXCLUDED: &[&str] = &[
    "05476500", "05476590", "05476735", "05478265", "05480080", "05480820", "05480930",
    "05489490", "05481510", "05482315", "05482430", "05483318", "05483349", "05483470",
    "05484600",
];

/// Placement of the bin edges over `[min, max]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum EdgeLayout {
    /// `n − 1` edges strictly inside the range, splitting it into `n`
    /// equal bins: the minimum lands on the first pitch, the maximum on
    /// the last, every pitch is reachable.
    #[default]
    Interior,
    /// `n − 1` edges from min to max inclusive (classic digitization
    /// layout): the minimum already sits on the first edge, so the first
    /// pitch is only reached by values below it.
    Spanning,
}

/// One voice of the piece.
///
/// # Example
/// ```
/// use hs_core::config::VoiceConfig;
/// let v = VoiceConfig::new("05484900", "Chromatic", 42);
/// assert!(!v.invert);
/// assert_eq!(v.offset, 0);
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct VoiceConfig {
    /// Gauge identifier of the series to sonify.
    pub series: String,
    /// Built-in scale name.
    pub scale: String,
    /// General MIDI program number.
    pub program: u8,
    /// Use the scale in reverse order (high flow → low pitch).
    #[serde(default)]
    pub invert: bool,
    /// Constant pitch offset applied after scale lookup.
    #[serde(default)]
    pub offset: i32,
}

impl VoiceConfig {
    /// Voice with no inversion and no offset.
    #[must_use]
    pub fn new(series: &str, scale: &str, program: u8) -> Self {
        Self {
            series: series.to_string(),
            scale: scale.to_string(),
            program,
            invert: false,
            offset: 0,
        }
    }

    /// Resolve the scale name.
    ///
    /// # Errors
    /// Returns `CoreError::UnknownScale` for names outside the table.
    pub fn resolve_scale(&self) -> Result<Scale, CoreError> {
        Scale::by_name(&self.scale)
    }

    /// Scale as heard: inverted if asked, then shifted by `offset`.
    ///
    /// # Errors
    /// Returns `CoreError::UnknownScale` for an unknown name and
    /// `CoreError::Config` if a played pitch leaves the MIDI range 0..=127.
    ///
    /// # Example
    /// ```
    /// use hs_core::config::VoiceConfig;
    /// let mut v = VoiceConfig::new("05484900", "C Major Pentatonic", 0);
    /// v.invert = true;
    /// v.offset = -12;
    /// let played = v.played_scale().unwrap();
    /// assert_eq!(played.pitches()[0], 72);
    /// ```
    pub fn played_scale(&self) -> Result<Scale, CoreError> {
        let scale = self.resolve_scale()?;
        let scale = if self.invert { scale.inverted() } else { scale };
        let played = scale
            .shifted(self.offset)
            .map_err(|e| CoreError::Config(e.to_string()))?;
        let (lo, hi) = played.range();
        if lo < 0 || hi > 127 {
            return Err(CoreError::Config(format!(
                "offset {} moves scale {} to {lo}..={hi}, outside 0..=127",
                self.offset, self.scale
            )));
        }
        Ok(played)
    }

    /// Validated program number.
    ///
    /// # Errors
    /// Returns `CoreError::Config` if the program exceeds 127.
    pub fn resolve_program(&self) -> Result<Program, CoreError> {
        Program::new(self.program)
    }
}

/// Configuration complète d'une pièce.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use hs_core::config::PieceConfig;
/// let config = PieceConfig::default();
/// assert_eq!(config.voices.len(), 3);
/// assert!((config.unit_duration - 0.2).abs() < f64::EPSILON);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PieceConfig {
    /// Title written into the score.
    pub title: String,
    /// Seconds per quantized sample, shared by every voice.
    pub unit_duration: f64,
    /// Note-on velocity for every event.
    pub velocity: u8,
    /// Bin edges in log space (requires strictly positive samples).
    pub log_scale: bool,
    /// Placement of the bin edges.
    pub edge_layout: EdgeLayout,
    /// Missing-sample handling.
    pub missing: MissingPolicy,
    /// First day of the selection, inclusive. `None` = series start.
    pub start: Option<NaiveDate>,
    /// Last day of the selection, inclusive. `None` = series end.
    pub end: Option<NaiveDate>,
    /// Gauges ignored at load time.
    pub exclude: Vec<String>,
    /// Voices, in score order.
    pub voices: Vec<VoiceConfig>,
}

impl Default for PieceConfig {
    fn default() -> Self {
        let (_, root, upper) = TRIOS[0];
        Self {
            title: "Streamflow".to_string(),
            unit_duration: 0.2,
            velocity: 100,
            log_scale: true,
            edge_layout: EdgeLayout::Interior,
            missing: MissingPolicy::Reject,
            start: NaiveDate::from_ymd_opt(2011, 10, 11),
            end: NaiveDate::from_ymd_opt(2019, 9, 30),
            exclude: DEFAULT_EXCLUDED.iter().map(ToString::to_string).collect(),
            voices: vec![
                VoiceConfig::new(root, "A Minor Pentatonic", 0),
                VoiceConfig {
                    invert: true,
                    ..VoiceConfig::new(upper[0], "C Major Pentatonic", 11)
                },
                VoiceConfig::new(upper[1], "C Major Pentatonic", 12),
            ],
        }
    }
}

impl PieceConfig {
    /// Reject every malformed value. Nothing is clamped.
    ///
    /// # Errors
    /// Returns the first problem found as a `CoreError`.
    pub fn validate(&self) -> Result<(), CoreError> {
        let (lo, hi) = UNIT_DURATION_RANGE;
        if !self.unit_duration.is_finite() || !(lo..=hi).contains(&self.unit_duration) {
            return Err(CoreError::Config(format!(
                "unit_duration {} outside [{lo}, {hi}] seconds",
                self.unit_duration
            )));
        }
        if !(1..=127).contains(&self.velocity) {
            return Err(CoreError::Config(format!(
                "velocity {} outside 1..=127",
                self.velocity
            )));
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(CoreError::Config(format!(
                    "start date {start} is after end date {end}"
                )));
            }
        }
        if self.voices.is_empty() {
            return Err(CoreError::Config("at least one voice is required".into()));
        }
        for (i, voice) in self.voices.iter().enumerate() {
            let tag = |e: CoreError| match e {
                CoreError::Config(msg) => CoreError::Config(format!("voice {}: {msg}", i + 1)),
                other => other,
            };
            voice.played_scale().map_err(tag)?;
            voice.resolve_program().map_err(tag)?;
        }
        Ok(())
    }

    /// Replace the voices' gauges with a named trio.
    ///
    /// Voices beyond the third keep their gauge; missing voices are added
    /// with the first voice's scale and program.
    ///
    /// # Errors
    /// Returns `CoreError::Config` if no trio has that name.
    ///
    /// # Example
    /// ```
    /// use hs_core::config::PieceConfig;
    /// let mut config = PieceConfig::default();
    /// config.apply_trio("upper des moines").unwrap();
    /// assert_eq!(config.voices[0].series, "05482000");
    /// assert_eq!(config.voices[2].series, "05479000");
    /// ```
    pub fn apply_trio(&mut self, name: &str) -> Result<(), CoreError> {
        let (_, root, upper) = TRIOS
            .iter()
            .find(|(n, _, _)| n.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| CoreError::Config(format!("unknown trio: {name}")))?;
        let template = self
            .voices
            .first()
            .cloned()
            .unwrap_or_else(|| VoiceConfig::new(root, "C Major Pentatonic", 0));
        let gauges = [*root, upper[0], upper[1]];
        for (i, gauge) in gauges.iter().enumerate() {
            if let Some(voice) = self.voices.get_mut(i) {
                voice.series = (*gauge).to_string();
            } else {
                self.voices.push(VoiceConfig {
                    series: (*gauge).to_string(),
                    ..template.clone()
                });
            }
        }
        Ok(())
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    piece: Option<PieceSection>,
    dataset: Option<DatasetSection>,
    voices: Option<Vec<VoiceConfig>>,
}

/// `[piece]` section, all fields optional for partial override.
#[derive(Deserialize)]
struct PieceSection {
    title: Option<String>,
    unit_duration: Option<f64>,
    velocity: Option<u8>,
    log_scale: Option<bool>,
    edge_layout: Option<EdgeLayout>,
    trio: Option<String>,
}

/// `[dataset]` section, all fields optional.
#[derive(Deserialize)]
struct DatasetSection {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    missing: Option<MissingPolicy>,
    exclude: Option<Vec<String>>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// The result is validated before being returned.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or if a value
/// is rejected by [`PieceConfig::validate`].
///
/// # Example
/// ```no_run
/// use hs_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/piece.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<PieceConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    let config = parse_config(&content)
        .with_context(|| format!("Configuration rejetée : {}", path.display()))?;
    log::debug!("Config chargée depuis {}", path.display());
    Ok(config)
}

/// Parse TOML text over the defaults, then validate.
///
/// # Errors
/// Returns an error on TOML syntax errors, unknown trio names, or
/// invalid values.
pub fn parse_config(content: &str) -> Result<PieceConfig> {
    let file: ConfigFile = toml::from_str(content).context("Erreur de parsing TOML")?;
    let mut config = PieceConfig::default();

    if let Some(v) = file.voices {
        config.voices = v;
    }

    if let Some(p) = file.piece {
        if let Some(v) = p.title {
            config.title = v;
        }
        if let Some(v) = p.unit_duration {
            config.unit_duration = v;
        }
        if let Some(v) = p.velocity {
            config.velocity = v;
        }
        if let Some(v) = p.log_scale {
            config.log_scale = v;
        }
        if let Some(v) = p.edge_layout {
            config.edge_layout = v;
        }
        if let Some(v) = p.trio {
            config.apply_trio(&v)?;
        }
    }

    if let Some(d) = file.dataset {
        if let Some(v) = d.start {
            config.start = Some(v);
        }
        if let Some(v) = d.end {
            config.end = Some(v);
        }
        if let Some(v) = d.missing {
            config.missing = v;
        }
        if let Some(v) = d.exclude {
            config.exclude = v;
        }
    }

    config.validate()?;
    Ok(config)
}
