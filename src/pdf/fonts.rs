//! Font resolution for the PDF renderer.
//!
//! The layout needs a glyph set covering the full Polish alphabet, so the
//! resolver probes a fixed list of platform font files and embeds the
//! first one it can read. When none is found it falls back to the
//! built-in monospace font.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

/// Known platform locations of Unicode-capable sans fonts.
const FONT_CANDIDATES: &[&str] = &[
    // Linux
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
    // macOS
    "/Library/Fonts/Arial Unicode.ttf",
    "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    // Windows
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
];

/// Outcome of font resolution.
#[derive(Debug, Clone)]
pub enum ResolvedFont {
    /// A TTF file read from disk, embedded into the document.
    Ttf(Vec<u8>),
    /// No candidate found; the renderer uses the built-in monospace font.
    BuiltinMonospace,
}

/// Probes candidate font files in order.
#[derive(Debug, Clone)]
pub struct FontResolver {
    candidates: Vec<PathBuf>,
}

impl Default for FontResolver {
    fn default() -> Self {
        Self {
            candidates: FONT_CANDIDATES.iter().map(PathBuf::from).collect(),
        }
    }
}

impl FontResolver {
    /// Resolver with an explicit candidate list (first readable wins).
    pub fn with_candidates(candidates: Vec<PathBuf>) -> Self {
        Self { candidates }
    }

    pub fn resolve(&self) -> ResolvedFont {
        for path in &self.candidates {
            match fs::read(path) {
                Ok(bytes) if !bytes.is_empty() => {
                    debug!(path = %path.display(), "using platform font");
                    return ResolvedFont::Ttf(bytes);
                }
                _ => {}
            }
        }
        debug!("no platform font found, falling back to built-in monospace");
        ResolvedFont::BuiltinMonospace
    }
}
