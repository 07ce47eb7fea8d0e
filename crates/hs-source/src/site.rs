use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use hs_core::traits::{SiteInfo, SiteLookup};

/// USGS site service endpoint (RDB output).
pub const USGS_SITE_URL: &str = "https://waterservices.usgs.gov/nwis/site/";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Parse a USGS RDB document into site metadata keyed by gauge id.
///
/// Comment lines (`#`) are skipped, the first remaining line names the
/// columns, the second (field widths) is ignored. Rows lacking a
/// parseable latitude or longitude are omitted.
///
/// # Example
/// ```
/// use hs_source::site::parse_rdb;
/// let rdb = "# comment\n\
///     site_no\tstation_nm\tdec_lat_va\tdec_long_va\n\
///     15s\t50s\t16s\t16s\n\
///     05484900\tRACCOON RIVER AT DES MOINES\t41.5833\t-93.6666\n";
/// let sites = parse_rdb(rdb);
/// assert_eq!(sites["05484900"].name, "RACCOON RIVER AT DES MOINES");
/// ```
#[must_use]
pub fn parse_rdb(text: &str) -> BTreeMap<String, SiteInfo> {
    let mut lines = text
        .lines()
        .filter(|l| !l.starts_with('#') && !l.trim().is_empty());

    let Some(header) = lines.next() else {
        return BTreeMap::new();
    };
    let columns: Vec<&str> = header.split('\t').map(str::trim).collect();
    let col = |name: &str| columns.iter().position(|c| *c == name);
    let (Some(id_col), Some(lat_col), Some(lon_col)) =
        (col("site_no"), col("dec_lat_va"), col("dec_long_va"))
    else {
        log::warn!("RDB sans colonnes site_no/dec_lat_va/dec_long_va");
        return BTreeMap::new();
    };
    let name_col = col("station_nm");

    // Ligne des largeurs de champ.
    lines.next();

    let mut sites = BTreeMap::new();
    for line in lines {
        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        let field = |i: usize| fields.get(i).copied().unwrap_or("");
        let (Ok(latitude), Ok(longitude)) =
            (field(lat_col).parse::<f64>(), field(lon_col).parse::<f64>())
        else {
            log::debug!("Site {} sans coordonnées, ignoré", field(id_col));
            continue;
        };
        let id = field(id_col);
        if id.is_empty() {
            continue;
        }
        sites.insert(
            id.to_string(),
            SiteInfo {
                latitude,
                longitude,
                name: name_col.map(field).unwrap_or_default().to_string(),
            },
        );
    }
    sites
}

/// Remote lookup against the USGS site service.
#[derive(Clone, Debug)]
pub struct UsgsSiteService {
    base_url: String,
    timeout: Duration,
}

impl Default for UsgsSiteService {
    fn default() -> Self {
        Self {
            base_url: USGS_SITE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl UsgsSiteService {
    /// Service at a custom base URL.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Override the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Request URL for a set of gauges.
    #[must_use]
    pub fn request_url(&self, ids: &[&str]) -> String {
        format!(
            "{}?format=rdb&sites={}&siteOutput=expanded",
            self.base_url,
            ids.join(",")
        )
    }

    fn fetch(&self, ids: &[&str]) -> Result<String> {
        let agent = ureq::AgentBuilder::new().timeout(self.timeout).build();
        let url = self.request_url(ids);
        log::debug!("GET {url}");
        agent
            .get(&url)
            .call()
            .with_context(|| format!("Requête site échouée : {url}"))?
            .into_string()
            .context("Réponse site illisible")
    }
}

impl SiteLookup for UsgsSiteService {
    fn lookup(&self, ids: &[&str]) -> BTreeMap<String, SiteInfo> {
        if ids.is_empty() {
            return BTreeMap::new();
        }
        match self.fetch(ids) {
            Ok(body) => {
                let sites = parse_rdb(&body);
                log::info!("{}/{} site(s) localisé(s)", sites.len(), ids.len());
                sites
            }
            Err(e) => {
                log::warn!("Métadonnées de site indisponibles : {e:#}");
                BTreeMap::new()
            }
        }
    }
}

/// Lookup from an RDB file saved on disk.
#[derive(Clone, Debug)]
pub struct RdbFileLookup {
    path: PathBuf,
}

impl RdbFileLookup {
    /// Lookup reading `path` on every call; the file need not exist yet.
    ///
    /// # Example
    /// ```
    /// use hs_core::traits::SiteLookup;
    /// use hs_source::site::RdbFileLookup;
    /// let lookup = RdbFileLookup::new("/nonexistent/sites.rdb");
    /// assert!(lookup.lookup(&["05484900"]).is_empty());
    /// ```
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SiteLookup for RdbFileLookup {
    fn lookup(&self, ids: &[&str]) -> BTreeMap<String, SiteInfo> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => parse_rdb(&text)
                .into_iter()
                .filter(|(id, _)| ids.contains(&id.as_str()))
                .collect(),
            Err(e) => {
                log::warn!("Impossible de lire {} : {e}", self.path.display());
                BTreeMap::new()
            }
        }
    }
}
