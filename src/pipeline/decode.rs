//! PDF decoding: read each page's text layer into positioned glyphs via pdfium.
//!
//! pdfium reports character boxes in PDF user space (origin bottom-left).
//! Glyph `top` is converted to a distance from the page's top edge so rows
//! sort top to bottom. The loose box is preferred over the tight one: loose
//! boxes span the font's ascent, so every glyph on a baseline shares the
//! same top, while tight boxes hug each outline and would scatter a row
//! across buckets.
//!
//! The pdfium library is bound once, when the [`PdfiumSource`] is built,
//! and shared by every worker after that. Sharing needs pdfium-render's
//! `sync` feature; calls into the library are serialised behind its lock.

use super::input::GlyphSource;
use super::normalize::is_invisible;
use crate::document::{Document, Glyph, Page};
use crate::error::{ExtractError, PageError};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reads PDFs through a bound pdfium library.
pub struct PdfiumSource {
    pdfium: Pdfium,
    password: Option<String>,
}

impl PdfiumSource {
    /// Bind pdfium, from most-specific to least-specific location:
    ///
    /// 1. `lib_path` (a library file, or a directory holding one)
    /// 2. `PDFIUM_LIB_PATH`
    /// 3. the current directory
    /// 4. the system library search path
    pub fn bind(lib_path: Option<&Path>, password: Option<String>) -> Result<Self, ExtractError> {
        let explicit = lib_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

        let bindings = match explicit {
            Some(path) => {
                let file = if path.is_dir() {
                    Pdfium::pdfium_platform_library_name_at_path(&path)
                } else {
                    path
                };
                info!("Binding pdfium from {}", file.display());
                Pdfium::bind_to_library(&file)
            }
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| ExtractError::PdfiumBindingFailed(format!("{e:?}")))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
            password,
        })
    }
}

impl GlyphSource for PdfiumSource {
    fn read(&self, path: &Path) -> Result<Document, ExtractError> {
        let password = self.password.as_deref();
        let document = self
            .pdfium
            .load_pdf_from_file(path, password)
            .map_err(|e| {
                let err_str = format!("{:?}", e);
                if err_str.contains("Password") || err_str.contains("password") {
                    if password.is_some() {
                        ExtractError::WrongPassword {
                            path: path.to_path_buf(),
                        }
                    } else {
                        ExtractError::PasswordRequired {
                            path: path.to_path_buf(),
                        }
                    }
                } else {
                    ExtractError::CorruptPdf {
                        path: path.to_path_buf(),
                        detail: err_str,
                    }
                }
            })?;

        let pages: Vec<Result<Page, PageError>> = document
            .pages()
            .iter()
            .enumerate()
            .map(|(idx, page)| decode_page(&page, idx + 1))
            .collect();

        debug!("Decoded {} pages from {}", pages.len(), path.display());
        Ok(Document::new(file_name(path), pages))
    }
}

/// Map one page's text layer to glyphs.
fn decode_page(page: &PdfPage, page_num: usize) -> Result<Page, PageError> {
    let width = page.width().value;
    let height = page.height().value;
    let text = page.text().map_err(|e| PageError::TextUnavailable {
        page: page_num,
        detail: format!("{:?}", e),
    })?;

    let mut glyphs = Vec::new();
    for ch in text.chars().iter() {
        let Some(c) = ch.unicode_char() else {
            continue;
        };
        // pdfium synthesises CR/LF between text runs; they have no position.
        if c.is_control() || is_invisible(c) {
            continue;
        }
        let Ok(rect) = ch.loose_bounds().or_else(|_| ch.tight_bounds()) else {
            continue;
        };
        glyphs.push(Glyph::new(
            c,
            rect.left().value,
            height - rect.top().value,
            ch.scaled_font_size().value,
        ));
    }

    debug!("Page {}: {} glyphs", page_num, glyphs.len());
    Ok(Page::new(width, height, glyphs))
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
