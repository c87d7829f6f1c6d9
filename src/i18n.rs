// i18n.rs - runtime message catalog for log lines, UI text and figure labels
//
// Catalogs are flat JSON maps of key -> text with {name} placeholders:
// - English is compiled in and is always the fallback
// - other languages come from assets/i18n/<lang>.json, next to the
//   executable first, then under the working directory
// A key missing from both catalogs renders as the key itself.

use once_cell::sync::OnceCell;
use std::{collections::HashMap, path::PathBuf, sync::RwLock};

pub const FALLBACK_LANG: &str = "en";

const EMBEDDED_EN: &str = include_str!("../assets/i18n/en.json");

/// Languages offered in the Language menu.
pub const LANGUAGES: [(&str, &str); 2] = [("en", "English"), ("zh-Hans", "简体中文")];

#[derive(Debug, Clone)]
pub struct I18n {
    pub lang: String,
    map: HashMap<String, String>,
    fallback_map: HashMap<String, String>,
}

impl I18n {
    fn lookup(&self, key: &str) -> String {
        self.map
            .get(key)
            .or_else(|| self.fallback_map.get(key))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

static I18N: OnceCell<RwLock<I18n>> = OnceCell::new();

fn parse_catalog(text: &str) -> Option<HashMap<String, String>> {
    serde_json::from_str(text).ok()
}

fn embedded_fallback() -> HashMap<String, String> {
    parse_catalog(EMBEDDED_EN).unwrap_or_default()
}

fn find_lang_file(lang: &str) -> Option<PathBuf> {
    let file = format!("{}.json", lang);

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let p = dir.join("assets").join("i18n").join(&file);
            if p.exists() {
                return Some(p);
            }
        }
    }

    let p = PathBuf::from("assets").join("i18n").join(&file);
    p.exists().then_some(p)
}

fn load_lang(lang: &str) -> HashMap<String, String> {
    if lang == FALLBACK_LANG {
        return embedded_fallback();
    }
    match find_lang_file(lang).and_then(|p| std::fs::read_to_string(p).ok()) {
        Some(text) => parse_catalog(&text).unwrap_or_else(|| {
            log::warn!("malformed catalog for language {lang}, using {FALLBACK_LANG}");
            HashMap::new()
        }),
        None => HashMap::new(),
    }
}

/// Select the active language. Later calls replace the current catalog.
pub fn init(lang: impl Into<String>) {
    let lang = lang.into();
    let i = I18n {
        map: load_lang(&lang),
        fallback_map: embedded_fallback(),
        lang,
    };

    if let Some(lock) = I18N.get() {
        if let Ok(mut w) = lock.write() {
            *w = i;
        }
    } else if let Err(cell) = I18N.set(RwLock::new(i)) {
        // lost an init race; apply ours on top
        if let (Some(lock), Ok(i)) = (I18N.get(), cell.into_inner()) {
            if let Ok(mut w) = lock.write() {
                *w = i;
            }
        }
    }
}

pub fn current_lang() -> String {
    I18N.get()
        .and_then(|l| l.read().ok().map(|i| i.lang.clone()))
        .unwrap_or_else(|| FALLBACK_LANG.to_string())
}

/// Localized text for `key`. Before `init` the embedded English catalog is used.
pub fn tr(key: &str) -> String {
    match I18N.get().and_then(|l| l.read().ok()) {
        Some(i) => i.lookup(key),
        None => embedded_fallback()
            .remove(key)
            .unwrap_or_else(|| key.to_string()),
    }
}

/// Localized text with `{name}` placeholders substituted. Unknown placeholders stay as-is.
pub fn tr_with(key: &str, args: &[(&str, String)]) -> String {
    let mut s = tr(key);
    for (k, v) in args {
        let placeholder = format!("{{{}}}", k);
        s = s.replace(&placeholder, v);
    }
    s
}
