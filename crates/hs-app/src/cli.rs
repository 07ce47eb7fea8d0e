use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::Parser;

/// hydrosong — Sonification de débits de rivières en MIDI multi-voix.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Dataset JSON : jauge → { date → débit }.
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Fichier de configuration TOML. Défaut : config/piece.toml.
    #[arg(short, long, default_value = "config/piece.toml")]
    pub config: PathBuf,

    /// Trio de jauges nommé ("Raccoon River", "Upper Des Moines", "Lower Des Moines").
    #[arg(long)]
    pub trio: Option<String>,

    /// Premier jour inclus (AAAA-MM-JJ).
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Dernier jour inclus (AAAA-MM-JJ).
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Durée d'un échantillon en secondes, dans [0.05, 2.0].
    #[arg(long)]
    pub unit_duration: Option<f64>,

    /// Ignorer les jours sans mesure au lieu d'échouer.
    #[arg(long, default_value_t = false)]
    pub drop_missing: bool,

    /// Fichier MIDI de sortie. Défaut : hydrosong_<jauge 1>_<début>_<fin>.mid.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Écrire aussi les notes et le résumé en JSON.
    #[arg(long)]
    pub notes_json: Option<PathBuf>,

    /// Métadonnées de sites depuis un fichier RDB local.
    #[arg(long, conflicts_with = "fetch_sites")]
    pub sites_file: Option<PathBuf>,

    /// Interroger le service de sites USGS.
    #[arg(long, default_value_t = false)]
    pub fetch_sites: bool,

    /// Lister les gammes disponibles et quitter.
    #[arg(long, default_value_t = false)]
    pub list_scales: bool,

    /// Lister les instruments disponibles et quitter.
    #[arg(long, default_value_t = false)]
    pub list_instruments: bool,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    /// Dataset path, mandatory unless only listing tables.
    ///
    /// # Errors
    /// Returns an error if `--data` was not given.
    pub fn require_data(&self) -> anyhow::Result<&Path> {
        match self.data.as_deref() {
            Some(path) => Ok(path),
            None => anyhow::bail!("Aucun dataset spécifié. Utilisez --data <fichier.json>."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_command_line() {
        let cli = Cli::try_parse_from([
            "hydrosong",
            "--data",
            "flows.json",
            "--trio",
            "Upper Des Moines",
            "--start",
            "2012-01-01",
            "--unit-duration",
            "0.1",
            "--drop-missing",
            "-o",
            "out.mid",
            "--fetch-sites",
        ])
        .unwrap();
        assert_eq!(cli.require_data().unwrap(), Path::new("flows.json"));
        assert_eq!(cli.start, NaiveDate::from_ymd_opt(2012, 1, 1));
        assert_eq!(cli.unit_duration, Some(0.1));
        assert!(cli.drop_missing && cli.fetch_sites);
        assert_eq!(cli.out.as_deref(), Some(Path::new("out.mid")));
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn sites_sources_are_exclusive() {
        let res = Cli::try_parse_from([
            "hydrosong",
            "--sites-file",
            "sites.rdb",
            "--fetch-sites",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn data_is_required_to_render() {
        let cli = Cli::try_parse_from(["hydrosong", "--list-scales"]).unwrap();
        assert!(cli.require_data().is_err());
        assert!(cli.out.is_none());
    }

    #[test]
    fn bad_date_is_rejected() {
        assert!(Cli::try_parse_from(["hydrosong", "--start", "2012-13-01"]).is_err());
    }
}
