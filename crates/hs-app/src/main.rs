use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hs_core::config::{PieceConfig, load_config};
use hs_core::instrument::GM_INSTRUMENTS;
use hs_core::scale::BUILTIN_SCALES;
use hs_core::series::MissingPolicy;
use hs_core::traits::{ScoreWriter, SiteInfo, SiteLookup};
use hs_export::json::JsonWriter;
use hs_export::midi::MidiWriter;
use hs_source::dataset::load_dataset;
use hs_source::site::{RdbFileLookup, UsgsSiteService};

pub mod cli;
pub mod render;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Tables seules
    if cli.list_scales || cli.list_instruments {
        print_tables(&cli);
        return Ok(());
    }

    // 4. Charger la config + overrides CLI
    let config = resolve_config(&cli)?;
    let data = cli.require_data()?;

    // 5. Dataset
    let dataset = load_dataset(data, &config.exclude)?;

    // 6. Rendu des voix (parallèle)
    let piece = render::render_piece(&config, &dataset)?;

    // 7. Métadonnées de sites (optionnelles, jamais bloquantes)
    let sites = match site_lookup(&cli) {
        Some(lookup) => render::resolve_sites(lookup.as_ref(), &piece),
        None => BTreeMap::new(),
    };

    // 8. Écriture
    let out = cli
        .out
        .clone()
        .unwrap_or_else(|| default_output(&config, &piece));
    log::info!("Sortie MIDI : {}", out.display());
    MidiWriter::new(&out)
        .with_title(config.title.as_str())
        .write(&piece.voices)?;
    if let Some(ref path) = cli.notes_json {
        JsonWriter::new(path, config.title.as_str())
            .with_sites(sites.clone())
            .write(&piece.voices)?;
    }

    print_report(&piece, &sites);
    Ok(())
}

/// Resolve config: file if present, defaults otherwise, then CLI overrides.
fn resolve_config(cli: &cli::Cli) -> Result<PieceConfig> {
    let mut config = if cli.config.exists() {
        load_config(&cli.config)?
    } else {
        log::warn!(
            "Config introuvable : {}. Utilisation des défauts.",
            cli.config.display()
        );
        PieceConfig::default()
    };
    apply_overrides(cli, &mut config)?;
    Ok(config)
}

/// Apply command-line overrides and re-validate.
fn apply_overrides(cli: &cli::Cli, config: &mut PieceConfig) -> Result<()> {
    if let Some(ref trio) = cli.trio {
        config.apply_trio(trio).with_context(|| {
            format!("Trio inconnu : {trio}. Voir --help (ex: \"Raccoon River\")")
        })?;
    }
    if cli.start.is_some() {
        config.start = cli.start;
    }
    if cli.end.is_some() {
        config.end = cli.end;
    }
    if let Some(unit) = cli.unit_duration {
        config.unit_duration = unit;
    }
    if cli.drop_missing {
        config.missing = MissingPolicy::Drop;
    }
    config.validate().context("Paramètres rejetés")?;
    Ok(())
}

/// `hydrosong_<first gauge>_<start>_<end>.mid`, dates from the config or,
/// when open-ended, from the rendered span.
fn default_output(config: &PieceConfig, piece: &render::Piece) -> PathBuf {
    let gauge = config.voices.first().map_or("piece", |v| v.series.as_str());
    let start = config.start.or(piece.span.map(|(first, _)| first));
    let end = config.end.or(piece.span.map(|(_, last)| last));
    let date = |d: Option<chrono::NaiveDate>| d.map_or_else(|| "all".to_string(), |d| d.to_string());
    PathBuf::from(format!("hydrosong_{gauge}_{}_{}.mid", date(start), date(end)))
}

fn site_lookup(cli: &cli::Cli) -> Option<Box<dyn SiteLookup>> {
    if let Some(ref path) = cli.sites_file {
        Some(Box::new(RdbFileLookup::new(path)))
    } else if cli.fetch_sites {
        Some(Box::new(UsgsSiteService::default()))
    } else {
        None
    }
}

fn print_tables(cli: &cli::Cli) {
    if cli.list_scales {
        println!("Gammes :");
        for (name, pitches) in BUILTIN_SCALES {
            println!("  {name:<22} {} notes", pitches.len());
        }
    }
    if cli.list_instruments {
        println!("Instruments :");
        for (program, name) in GM_INSTRUMENTS {
            println!("  {program:>3}  {name}");
        }
    }
}

fn print_report(piece: &render::Piece, sites: &BTreeMap<String, SiteInfo>) {
    for voice in &piece.voices {
        let site = sites
            .get(&voice.series_id)
            .map_or_else(String::new, |s| format!(", {}", s.name));
        println!(
            "Voix {} : {}{site}, {} note(s), {:.1} s",
            voice.voice + 1,
            voice.series_id,
            voice.events.len(),
            voice.duration()
        );
    }
    println!(
        "Durée : {:.1} s pour {} jour(s)",
        piece.duration(),
        piece.days()
    );
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn cli(args: &[&str]) -> cli::Cli {
        let mut argv = vec!["hydrosong"];
        argv.extend_from_slice(args);
        cli::Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn overrides_replace_config_values() {
        let mut config = PieceConfig::default();
        let cli = cli(&[
            "--trio",
            "lower des moines",
            "--end",
            "2015-12-31",
            "--unit-duration",
            "0.5",
            "--drop-missing",
        ]);
        apply_overrides(&cli, &mut config).unwrap();
        assert_eq!(config.voices[0].series, "05490500");
        assert_eq!(config.end, chrono::NaiveDate::from_ymd_opt(2015, 12, 31));
        assert!((config.unit_duration - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.missing, MissingPolicy::Drop);
    }

    #[test]
    fn out_of_range_override_is_rejected() {
        let mut config = PieceConfig::default();
        assert!(apply_overrides(&cli(&["--unit-duration", "3.0"]), &mut config).is_err());
        let mut config = PieceConfig::default();
        assert!(apply_overrides(&cli(&["--trio", "Mississippi"]), &mut config).is_err());
        let mut config = PieceConfig::default();
        assert!(apply_overrides(&cli(&["--start", "2020-01-01"]), &mut config).is_err());
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let config = resolve_config(&cli(&["--config", "/nonexistent/piece.toml"])).unwrap();
        assert_eq!(config, PieceConfig::default());
    }

    #[test]
    fn config_file_is_loaded_then_overridden() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[piece]\ntitle = \"Crue\"\nunit_duration = 0.5\ntrio = \"Upper Des Moines\""
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let config = resolve_config(&cli(&["--config", path])).unwrap();
        assert_eq!(config.title, "Crue");
        assert!((config.unit_duration - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.voices[0].series, "05482000");

        let config = resolve_config(&cli(&["--config", path, "--unit-duration", "0.1"])).unwrap();
        assert!((config.unit_duration - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.title, "Crue");
    }

    #[test]
    fn invalid_config_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[piece]\nunit_duration = 9.0").unwrap();
        let path = file.path().to_str().unwrap();
        assert!(resolve_config(&cli(&["--config", path])).is_err());
    }

    #[test]
    fn output_name_follows_first_gauge_and_dates() {
        let config = PieceConfig::default();
        let piece = render::Piece {
            voices: Vec::new(),
            span: None,
        };
        assert_eq!(
            default_output(&config, &piece),
            PathBuf::from("hydrosong_05484900_2011-10-11_2019-09-30.mid")
        );

        let open = PieceConfig {
            start: None,
            end: None,
            ..PieceConfig::default()
        };
        let d = |s: &str| s.parse::<chrono::NaiveDate>().unwrap();
        let piece = render::Piece {
            voices: Vec::new(),
            span: Some((d("2012-01-01"), d("2012-01-06"))),
        };
        assert_eq!(
            default_output(&open, &piece),
            PathBuf::from("hydrosong_05484900_2012-01-01_2012-01-06.mid")
        );
    }

    #[test]
    fn site_lookup_follows_flags() {
        assert!(site_lookup(&cli(&[])).is_none());
        assert!(site_lookup(&cli(&["--fetch-sites"])).is_some());
        assert!(site_lookup(&cli(&["--sites-file", "sites.rdb"])).is_some());
    }
}
