//! Configuration types for degree-record extraction.
//!
//! Two layers:
//!
//! * [`LayoutProfile`]: the heuristic constants of one document family
//!   (title font size, row tolerance, marker words, which page holds what).
//!   Serializable, so a new family with different typography is a JSON file,
//!   not a code change.
//! * [`ExtractionConfig`]: how a batch runs: profile, worker count, pdfium
//!   binding, output naming, progress reporting. Built via
//!   [`ExtractionConfigBuilder`].

use crate::error::ExtractError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Heuristic constants for one family of degree brochures.
///
/// # Example
/// ```rust
/// use degree_layout::LayoutProfile;
///
/// let profile: LayoutProfile =
///     serde_json::from_str(r#"{ "title_min_font_size": 28.0 }"#).unwrap();
/// assert_eq!(profile.title_min_font_size, 28.0);
/// assert_eq!(profile.degree_token, "grado");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutProfile {
    /// Lines whose average glyph size reaches this value are title fragments. Default: 32.
    pub title_min_font_size: f32,

    /// Vertical bucket width for single-column line reconstruction. Default: 0.1.
    ///
    /// Glyph tops are rounded to a multiple of this value; glyphs that land
    /// on the same multiple form one row.
    pub row_tolerance: f32,

    /// Vertical bucket width for the two-column pass on the sections page. Default: 0.01.
    pub column_row_tolerance: f32,

    /// Case-insensitive token identifying the degree-type line. Default: "grado".
    pub degree_token: String,

    /// Case-insensitive token identifying faculty lines. Default: "facultad".
    pub faculty_token: String,

    /// Column-header token skipped inside the study plan. Default: "ECTS".
    pub ects_header_token: String,

    /// Marker opening the knowledge section. Default: "Conocimientos".
    pub knowledge_marker: String,

    /// Boilerplate stripped once after the knowledge marker. Default: "que se adquieren".
    pub knowledge_heading: String,

    /// Marker opening the outcomes section. Default: "Salidas".
    pub outcomes_marker: String,

    /// Boilerplate stripped once after the outcomes marker. Default: "profesionales".
    pub outcomes_heading: String,

    /// Which page carries which content.
    pub pages: PageRoles,
}

impl Default for LayoutProfile {
    fn default() -> Self {
        Self {
            title_min_font_size: 32.0,
            row_tolerance: 0.1,
            column_row_tolerance: 0.01,
            degree_token: "grado".into(),
            faculty_token: "facultad".into(),
            ects_header_token: "ECTS".into(),
            knowledge_marker: "Conocimientos".into(),
            knowledge_heading: "que se adquieren".into(),
            outcomes_marker: "Salidas".into(),
            outcomes_heading: "profesionales".into(),
            pages: PageRoles::default(),
        }
    }
}

impl LayoutProfile {
    /// Load a profile from a JSON file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ExtractError::InvalidConfig(format!("cannot read profile {}: {e}", path.display()))
        })?;
        let profile: Self = serde_json::from_str(&raw).map_err(|e| {
            ExtractError::InvalidConfig(format!("bad profile {}: {e}", path.display()))
        })?;
        profile.validate()?;
        Ok(profile)
    }

    /// Check every constant is usable.
    pub fn validate(&self) -> Result<(), ExtractError> {
        if !(self.title_min_font_size > 0.0) {
            return Err(ExtractError::InvalidConfig(format!(
                "title_min_font_size must be > 0, got {}",
                self.title_min_font_size
            )));
        }
        for (name, tol) in [
            ("row_tolerance", self.row_tolerance),
            ("column_row_tolerance", self.column_row_tolerance),
        ] {
            if !(tol > 0.0) || !tol.is_finite() {
                return Err(ExtractError::InvalidConfig(format!(
                    "{name} must be a positive number, got {tol}"
                )));
            }
        }
        for (name, value) in [
            ("degree_token", &self.degree_token),
            ("faculty_token", &self.faculty_token),
            ("ects_header_token", &self.ects_header_token),
            ("knowledge_marker", &self.knowledge_marker),
            ("outcomes_marker", &self.outcomes_marker),
        ] {
            if value.trim().is_empty() {
                return Err(ExtractError::InvalidConfig(format!("{name} must not be empty")));
            }
        }
        self.pages.validate()
    }
}

/// 1-indexed page numbers of the three content pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRoles {
    /// Title, degree type and faculties. Default: 1.
    pub title: usize,
    /// Study-plan table. Default: 2.
    pub plan: usize,
    /// Two-column knowledge / outcomes sections. Default: 3.
    pub sections: usize,
}

impl Default for PageRoles {
    fn default() -> Self {
        Self {
            title: 1,
            plan: 2,
            sections: 3,
        }
    }
}

impl PageRoles {
    /// Minimum page count a document needs.
    pub fn required_pages(&self) -> usize {
        self.title.max(self.plan).max(self.sections)
    }

    fn validate(&self) -> Result<(), ExtractError> {
        if self.title == 0 || self.plan == 0 || self.sections == 0 {
            return Err(ExtractError::InvalidConfig(
                "page roles are 1-indexed, minimum is 1".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration for a batch extraction run.
///
/// # Example
/// ```rust
/// use degree_layout::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .concurrency(8)
///     .title_min_font_size(30.0)
///     .build()
///     .unwrap();
/// assert_eq!(config.profile.title_min_font_size, 30.0);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Layout heuristics for the document family.
    pub profile: LayoutProfile,

    /// Number of documents processed at once. Default: 4.
    pub concurrency: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit pdfium library path; otherwise `PDFIUM_LIB_PATH`, `./`, then the system library.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Extension of written record files. Default: "json".
    pub output_extension: String,

    /// Rewrite records that already exist in the output directory. Default: true.
    pub overwrite: bool,

    /// Optional per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            profile: LayoutProfile::default(),
            concurrency: 4,
            password: None,
            pdfium_lib_path: None,
            output_extension: "json".into(),
            overwrite: true,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("profile", &self.profile)
            .field("concurrency", &self.concurrency)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("output_extension", &self.output_extension)
            .field("overwrite", &self.overwrite)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn profile(mut self, profile: LayoutProfile) -> Self {
        self.config.profile = profile;
        self
    }

    pub fn title_min_font_size(mut self, size: f32) -> Self {
        self.config.profile.title_min_font_size = size;
        self
    }

    pub fn row_tolerance(mut self, tol: f32) -> Self {
        self.config.profile.row_tolerance = tol;
        self
    }

    pub fn page_roles(mut self, roles: PageRoles) -> Self {
        self.config.profile.pages = roles;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn output_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.output_extension = ext.into().trim_start_matches('.').to_string();
        self
    }

    pub fn overwrite(mut self, v: bool) -> Self {
        self.config.overwrite = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(ExtractError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        if c.output_extension.is_empty() {
            return Err(ExtractError::InvalidConfig(
                "Output extension must not be empty".into(),
            ));
        }
        c.profile.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build() {
        let config = ExtractionConfig::builder().build().unwrap();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.profile.pages.required_pages(), 3);
        assert_eq!(config.output_extension, "json");
    }

    #[test]
    fn zero_concurrency_rejected() {
        let err = ExtractionConfig::builder().concurrency(0).build().unwrap_err();
        assert!(err.to_string().contains("Concurrency"));
    }

    #[test]
    fn non_positive_tolerance_rejected() {
        let err = ExtractionConfig::builder()
            .row_tolerance(0.0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("row_tolerance"), "got: {err}");
    }

    #[test]
    fn zero_page_role_rejected() {
        let roles = PageRoles {
            title: 0,
            ..PageRoles::default()
        };
        assert!(ExtractionConfig::builder().page_roles(roles).build().is_err());
    }

    #[test]
    fn output_extension_strips_leading_dot() {
        let config = ExtractionConfig::builder()
            .output_extension(".record")
            .build()
            .unwrap();
        assert_eq!(config.output_extension, "record");
    }

    #[test]
    fn profile_from_partial_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        std::fs::write(
            &path,
            r#"{ "title_min_font_size": 24, "pages": { "plan": 4 } }"#,
        )
        .unwrap();
        let profile = LayoutProfile::from_file(&path).unwrap();
        assert_eq!(profile.title_min_font_size, 24.0);
        assert_eq!(profile.pages.plan, 4);
        assert_eq!(profile.pages.title, 1);
        assert_eq!(profile.pages.required_pages(), 4);
        assert_eq!(profile.outcomes_marker, "Salidas");
    }

    #[test]
    fn debug_redacts_password() {
        let config = ExtractionConfig::builder().password("s3cret").build().unwrap();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("s3cret"));
    }
}
