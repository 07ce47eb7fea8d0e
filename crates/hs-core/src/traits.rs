use std::collections::BTreeMap;

use serde::Serialize;

use crate::note::VoiceNotes;
use crate::series::Series;

/// Fournit les séries numériques par identifiant de jauge.
///
/// Implémenté par : `JsonDataset`.
///
/// # Example
/// ```
/// use hs_core::traits::SeriesSource;
/// use hs_core::series::Series;
///
/// struct Empty;
/// impl SeriesSource for Empty {
///     fn series(&self, _id: &str) -> Option<&Series> { None }
///     fn ids(&self) -> Vec<&str> { vec![] }
/// }
/// assert!(Empty.series("05484900").is_none());
/// ```
pub trait SeriesSource {
    /// Full series for a gauge, or `None` if the source does not carry it.
    fn series(&self, id: &str) -> Option<&Series>;

    /// Every gauge identifier available, sorted.
    fn ids(&self) -> Vec<&str>;
}

/// Location and display name of a gauge site.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SiteInfo {
    /// Decimal latitude.
    pub latitude: f64,
    /// Decimal longitude.
    pub longitude: f64,
    /// Station display name.
    pub name: String,
}

/// Résout les métadonnées géographiques d'une liste de jauges.
///
/// Never fails: an identifier without a result is simply absent from the
/// returned map, and the caller omits that point.
///
/// Implémenté par : `UsgsSiteService`, `RdbFileLookup`.
pub trait SiteLookup {
    /// Metadata for as many of `ids` as can be resolved.
    fn lookup(&self, ids: &[&str]) -> BTreeMap<String, SiteInfo>;
}

/// Consomme les listes de notes par voix et les sérialise.
///
/// Implémenté par : `MidiWriter`.
pub trait ScoreWriter {
    /// Serialize every voice of the piece.
    ///
    /// # Errors
    /// Returns an error if the notes cannot be encoded or written.
    fn write(&self, voices: &[VoiceNotes]) -> anyhow::Result<()>;
}
