// config.rs - viewer settings from command-line flags and environment variables
//
// Flags win over environment variables, which win over defaults.
//   --lang <code>       EARTH_VIEWER_LANG         (en)
//   --dpi <n>           EARTH_VIEWER_DPI          (300)
//   --save-dir <path>   EARTH_VIEWER_SAVE_DIR     (none)
//                       EARTH_VIEWER_TEXTURE      (NASA Blue Marble URL)
//                       EARTH_VIEWER_FEATURES     (Natural Earth base URL, "off" disables)
//                       EARTH_VIEWER_LAT_BANDS    (100)
//                       EARTH_VIEWER_LON_BANDS    (200)
//                       EARTH_VIEWER_STOCK_IMAGE  (on)

use crate::features::DEFAULT_FEATURES_URL;
use crate::texture::DEFAULT_TEXTURE_URL;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_DPI: f64 = 300.0;
pub use crate::plot::MAX_DPI;
pub const DEFAULT_LAT_BANDS: usize = 100;
pub const DEFAULT_LON_BANDS: usize = 200;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{name}: '{value}' is not a valid number")]
    InvalidNumber { name: String, value: String },
    #[error("{name} must be in {range}, got {value}")]
    OutOfRange {
        name: String,
        value: String,
        range: &'static str,
    },
    #[error("{0} expects a value")]
    MissingValue(String),
    #[error("unknown argument '{0}'")]
    UnknownArgument(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub lang: String,
    pub texture_source: String,
    /// `None` disables the vector layers.
    pub features_url: Option<String>,
    pub lat_bands: usize,
    pub lon_bands: usize,
    pub dpi: f64,
    pub stock_image: bool,
    pub save_dir: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            lang: crate::i18n::FALLBACK_LANG.to_string(),
            texture_source: DEFAULT_TEXTURE_URL.to_string(),
            features_url: Some(DEFAULT_FEATURES_URL.to_string()),
            lat_bands: DEFAULT_LAT_BANDS,
            lon_bands: DEFAULT_LON_BANDS,
            dpi: DEFAULT_DPI,
            stock_image: true,
            save_dir: None,
        }
    }
}

#[derive(Default)]
struct Flags {
    lang: Option<String>,
    dpi: Option<String>,
    save_dir: Option<String>,
}

fn parse_flags<I: IntoIterator<Item = String>>(args: I) -> Result<Flags, ConfigError> {
    let mut flags = Flags::default();
    let mut it = args.into_iter();
    while let Some(a) = it.next() {
        let slot = match a.as_str() {
            "--lang" => &mut flags.lang,
            "--dpi" => &mut flags.dpi,
            "--save-dir" => &mut flags.save_dir,
            _ => return Err(ConfigError::UnknownArgument(a)),
        };
        match it.next() {
            Some(v) => *slot = Some(v),
            None => return Err(ConfigError::MissingValue(a)),
        }
    }
    Ok(flags)
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        name: name.to_string(),
        value: value.to_string(),
    })
}

fn parse_switch(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(ConfigError::OutOfRange {
            name: name.to_string(),
            value: value.to_string(),
            range: "{0, 1, true, false, on, off}",
        }),
    }
}

impl ViewerConfig {
    /// Resolve from the process arguments and environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(std::env::args().skip(1), |k| std::env::var(k).ok())
    }

    /// `args` excludes the program name.
    pub fn resolve<I, E>(args: I, env: E) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
        E: Fn(&str) -> Option<String>,
    {
        let flags = parse_flags(args)?;
        let var = |k: &str| env(k).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        if let Some(v) = flags.lang.or_else(|| var("EARTH_VIEWER_LANG")) {
            cfg.lang = v.trim().to_string();
        }

        if let Some(v) = flags.dpi.or_else(|| var("EARTH_VIEWER_DPI")) {
            let dpi: f64 = parse_number("dpi", &v)?;
            if !(dpi > 0.0 && dpi <= MAX_DPI) {
                return Err(ConfigError::OutOfRange {
                    name: "dpi".into(),
                    value: v,
                    range: "(0, 750]",
                });
            }
            cfg.dpi = dpi;
        }

        cfg.save_dir = flags
            .save_dir
            .or_else(|| var("EARTH_VIEWER_SAVE_DIR"))
            .map(PathBuf::from);

        if let Some(v) = var("EARTH_VIEWER_TEXTURE") {
            cfg.texture_source = v.trim().to_string();
        }

        if let Some(v) = var("EARTH_VIEWER_FEATURES") {
            let v = v.trim();
            cfg.features_url = if v.eq_ignore_ascii_case("off") {
                None
            } else {
                Some(v.to_string())
            };
        }

        if let Some(v) = var("EARTH_VIEWER_LAT_BANDS") {
            cfg.lat_bands = parse_number("EARTH_VIEWER_LAT_BANDS", &v)?;
        }
        if let Some(v) = var("EARTH_VIEWER_LON_BANDS") {
            cfg.lon_bands = parse_number("EARTH_VIEWER_LON_BANDS", &v)?;
        }

        if let Some(v) = var("EARTH_VIEWER_STOCK_IMAGE") {
            cfg.stock_image = parse_switch("EARTH_VIEWER_STOCK_IMAGE", &v)?;
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(args: &[&str], vars: &[(&str, &str)]) -> Result<ViewerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ViewerConfig::resolve(args.iter().map(|s| s.to_string()), |k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_without_input() {
        assert_eq!(resolve(&[], &[]).unwrap(), ViewerConfig::default());
        let cfg = ViewerConfig::default();
        assert_eq!(cfg.dpi, 300.0);
        assert_eq!((cfg.lat_bands, cfg.lon_bands), (100, 200));
        assert!(cfg.features_url.is_some());
        assert!(cfg.save_dir.is_none());
    }

    #[test]
    fn flags_override_environment() {
        let cfg = resolve(
            &["--dpi", "72", "--lang", "zh-Hans"],
            &[("EARTH_VIEWER_DPI", "150"), ("EARTH_VIEWER_LANG", "en")],
        )
        .unwrap();
        assert_eq!(cfg.dpi, 72.0);
        assert_eq!(cfg.lang, "zh-Hans");
    }

    #[test]
    fn environment_sets_sources_and_switches() {
        let cfg = resolve(
            &[],
            &[
                ("EARTH_VIEWER_TEXTURE", "/tmp/earth.jpg"),
                ("EARTH_VIEWER_FEATURES", "off"),
                ("EARTH_VIEWER_STOCK_IMAGE", "false"),
                ("EARTH_VIEWER_SAVE_DIR", "out"),
                ("EARTH_VIEWER_LAT_BANDS", "32"),
            ],
        )
        .unwrap();
        assert_eq!(cfg.texture_source, "/tmp/earth.jpg");
        assert_eq!(cfg.features_url, None);
        assert!(!cfg.stock_image);
        assert_eq!(cfg.save_dir, Some(PathBuf::from("out")));
        assert_eq!(cfg.lat_bands, 32);
    }

    #[test]
    fn blank_environment_values_are_ignored() {
        let cfg = resolve(&[], &[("EARTH_VIEWER_DPI", "  ")]).unwrap();
        assert_eq!(cfg.dpi, DEFAULT_DPI);
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(matches!(
            resolve(&["--dpi", "abc"], &[]),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert!(matches!(
            resolve(&["--dpi", "0"], &[]),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(matches!(
            resolve(&["--dpi", "5000"], &[]),
            Err(ConfigError::OutOfRange { .. })
        ));
        assert!(matches!(
            resolve(&[], &[("EARTH_VIEWER_LON_BANDS", "-3")]),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert!(matches!(
            resolve(&[], &[("EARTH_VIEWER_STOCK_IMAGE", "maybe")]),
            Err(ConfigError::OutOfRange { .. })
        ));
    }

    #[test]
    fn dpi_limit_matches_what_the_figure_accepts() {
        let max = MAX_DPI.to_string();
        assert_eq!(resolve(&["--dpi", &max], &[]).unwrap().dpi, MAX_DPI);
        let over = (MAX_DPI + 1.0).to_string();
        assert!(matches!(
            resolve(&["--dpi", &over], &[]),
            Err(ConfigError::OutOfRange { .. })
        ));
    }

    #[test]
    fn malformed_arguments_are_errors() {
        assert_eq!(
            resolve(&["--dpi"], &[]),
            Err(ConfigError::MissingValue("--dpi".into()))
        );
        assert_eq!(
            resolve(&["--verbose"], &[]),
            Err(ConfigError::UnknownArgument("--verbose".into()))
        );
    }
}
