// fonts.rs - locate a TrueType font for figure text
//
// Runtime search, nothing is bundled:
// - assets/ next to the executable or in the working directory first
// - then the usual system font directories per platform
// .ttc collections are tried too; ab_glyph reads their first face.

use ab_glyph::FontArc;
use std::path::PathBuf;

const ASSET_FILES: [&str; 4] = [
    "DejaVuSans.ttf",
    "NotoSans-Regular.ttf",
    "LiberationSans-Regular.ttf",
    "Roboto-Regular.ttf",
];

fn candidates() -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::new();

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            for f in ASSET_FILES {
                out.push(dir.join("assets").join(f));
            }
        }
    }
    for f in ASSET_FILES {
        out.push(PathBuf::from("assets").join(f));
    }

    if cfg!(windows) {
        let win_fonts = PathBuf::from(r"C:\Windows\Fonts");
        for f in ["arial.ttf", "segoeui.ttf", "tahoma.ttf", "verdana.ttf"] {
            out.push(win_fonts.join(f));
        }
    } else if cfg!(target_os = "macos") {
        for p in [
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "/Library/Fonts/Arial.ttf",
            "/System/Library/Fonts/Helvetica.ttc",
            "/System/Library/Fonts/Geneva.ttf",
        ] {
            out.push(PathBuf::from(p));
        }
    } else if cfg!(unix) {
        for p in [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
            "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
            "/usr/share/fonts/noto/NotoSans-Regular.ttf",
            "/usr/share/fonts/google-noto/NotoSans-Regular.ttf",
        ] {
            out.push(PathBuf::from(p));
        }
        if let Ok(home) = std::env::var("HOME") {
            let home = PathBuf::from(home);
            for f in ASSET_FILES {
                out.push(home.join(".local/share/fonts").join(f));
                out.push(home.join(".fonts").join(f));
            }
        }
    }

    out
}

/// First parseable font among the candidates, or `None` (text is then skipped).
pub fn find_figure_font() -> Option<FontArc> {
    for path in candidates() {
        let Ok(bytes) = std::fs::read(&path) else {
            continue;
        };
        if let Ok(font) = FontArc::try_from_vec(bytes) {
            log::info!(
                "{}",
                crate::i18n::tr_with("font.using", &[("path", path.display().to_string())])
            );
            return Some(font);
        }
    }

    log::warn!("{}", crate::i18n::tr("font.not_found"));
    None
}

fn ui_candidates() -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::new();

    if cfg!(windows) {
        let win_fonts = PathBuf::from(r"C:\Windows\Fonts");
        for f in ["msyh.ttf", "simhei.ttf", "Deng.ttf", "simsun.ttf"] {
            out.push(win_fonts.join(f));
        }
    } else if cfg!(target_os = "macos") {
        for p in [
            "/System/Library/Fonts/PingFang.ttc",
            "/System/Library/Fonts/Hiragino Sans GB.ttc",
            "/System/Library/Fonts/STHeiti Light.ttc",
            "/Library/Fonts/NotoSansSC-Regular.otf",
        ] {
            out.push(PathBuf::from(p));
        }
    } else if cfg!(unix) {
        for p in [
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/truetype/noto/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
            "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
            "/usr/share/fonts/truetype/wqy/wqy-zenhei.ttc",
        ] {
            out.push(PathBuf::from(p));
        }
    }

    for f in ["NotoSansSC-Regular.otf", "NotoSansSC-Regular.ttf", "NotoSansCJK-Regular.ttc"] {
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                out.push(dir.join("assets").join(f));
            }
        }
        out.push(PathBuf::from("assets").join(f));
    }

    out
}

/// Add a CJK-capable font to egui as a fallback behind its bundled fonts,
/// so the Chinese catalog renders.
pub fn install_ui_font(ctx: &egui::Context) {
    let found = ui_candidates().into_iter().find_map(|path| {
        let bytes = std::fs::read(&path).ok()?;
        // egui panics on fonts it cannot parse, so check with ab_glyph first
        FontArc::try_from_vec(bytes.clone()).ok()?;
        Some((path, bytes))
    });
    let Some((path, bytes)) = found else {
        log::debug!("no CJK UI font found, using egui defaults");
        return;
    };
    log::info!(
        "{}",
        crate::i18n::tr_with("font.using", &[("path", path.display().to_string())])
    );

    let mut fonts = egui::FontDefinitions::default();
    fonts.font_data.insert("ui".to_owned(), egui::FontData::from_owned(bytes));
    // appended, so egui's own fonts still win for Latin text
    for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
        if let Some(list) = fonts.families.get_mut(&family) {
            list.push("ui".to_owned());
        }
    }
    ctx.set_fonts(fonts);
}
