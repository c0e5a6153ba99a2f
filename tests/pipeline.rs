//! End-to-end tests for degree-layout over glyph-dump fixtures.
//!
//! Fixtures are synthetic `*.glyphs.json` files written into a temporary
//! directory, so no pdfium library is needed. The PDF test at the bottom is
//! gated behind `E2E_ENABLED` and reads real brochures from `./test_cases/`.
//!
//! Run the PDF test with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=. cargo test --test pipeline -- --nocapture

use degree_layout::{
    extract_dir, extract_dir_sync, extract_file, extract_stream, DegreeRecord, DocumentStatus,
    ExtractionConfig, ExtractionIssue, ExtractionProgressCallback, Glyph, GlyphDump,
    GlyphDumpSource, LayoutProfile, Page, RecordCatalog, SubjectEntry, YearLabel,
};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Fixture builders ─────────────────────────────────────────────────────────

const WIDTH: f32 = 595.0;
const HEIGHT: f32 = 842.0;

/// Lay `text` out left to right from `x`, half an em per character.
fn row(text: &str, x: f32, top: f32, size: f32) -> Vec<Glyph> {
    text.chars()
        .enumerate()
        .map(|(i, c)| Glyph::new(c, x + i as f32 * size * 0.5, top, size))
        .collect()
}

fn title_page(title: &str, faculty: &str) -> Page {
    let mut glyphs = row(title, 40.0, 90.0, 40.0);
    glyphs.extend(row("Grado", 40.0, 170.0, 20.0));
    glyphs.extend(row(faculty, 40.0, 210.0, 12.0));
    Page::new(WIDTH, HEIGHT, glyphs)
}

fn plan_page(lines: &[&str]) -> Page {
    let glyphs = lines
        .iter()
        .enumerate()
        .flat_map(|(i, l)| row(l, 50.0, 80.0 + i as f32 * 14.0, 9.0))
        .collect();
    Page::new(WIDTH, HEIGHT, glyphs)
}

/// Left column: knowledge; right column: outcomes.
fn sections_page(knowledge: &[&str], outcomes: &[&str]) -> Page {
    let mut glyphs = Vec::new();
    for (i, l) in knowledge.iter().enumerate() {
        glyphs.extend(row(l, 30.0, 100.0 + i as f32 * 12.0, 8.0));
    }
    for (i, l) in outcomes.iter().enumerate() {
        glyphs.extend(row(l, 320.0, 100.0 + i as f32 * 12.0, 8.0));
    }
    Page::new(WIDTH, HEIGHT, glyphs)
}

fn turismo_pages() -> Vec<Page> {
    vec![
        title_page("GRADO EN TURISMO", "Facultad de Comercio y Turismo"),
        plan_page(&[
            "PRIMER CURSO",
            "Economía 6",
            "Historia del",
            "Turismo 6",
            "SEGUNDO CURSO",
            "Marketing 6,5",
        ]),
        sections_page(
            &["Conocimientos que se adquieren", "Trabajo en equipo."],
            &["Salidas profesionales", "Guía turístico."],
        ),
    ]
}

fn enfermeria_pages() -> Vec<Page> {
    vec![
        title_page("GRADO EN ENFERMERÍA", "Facultad de Enfermería, Fisioterapia y Podología"),
        plan_page(&[
            "Plan de estudios",
            "PRIMER CURSO",
            "Asignatura ECTS",
            "Anatomía Humana 9",
            "Bioquímica 6",
            "TERCER CURSO",
            "Prácticas Clínicas 4,5",
            "Trabajo Fin de Grado 6 + 3",
            "Optativa de",
        ]),
        sections_page(
            &["Conocimientos", "que se adquieren", "Cuidados.", "Ética profesional."],
            &["Salidas", "profesionales", "Hospitales.", "Atención primaria."],
        ),
    ]
}

fn write_dump(dir: &Path, stem: &str, pages: Vec<Page>) -> PathBuf {
    let path = dir.join(format!("{stem}.glyphs.json"));
    let json = serde_json::to_string(&GlyphDump { pages }).unwrap();
    std::fs::write(&path, json).unwrap();
    path
}

fn read_record(path: &Path) -> DegreeRecord {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

// ── Single-document scenarios ────────────────────────────────────────────────

#[test]
fn test_heading_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dump(dir.path(), "turismo", turismo_pages());
    let ext = extract_file(&path, &GlyphDumpSource, &LayoutProfile::default()).unwrap();

    assert_eq!(ext.record.title, "GRADO EN TURISMO");
    assert_eq!(ext.record.degree_type, "Grado");
    assert_eq!(ext.record.faculties, vec!["Facultad de Comercio y Turismo"]);
}

#[test]
fn test_study_plan_with_wrapped_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dump(dir.path(), "turismo", turismo_pages());
    let ext = extract_file(&path, &GlyphDumpSource, &LayoutProfile::default()).unwrap();
    let plan = &ext.record.study_plan;

    assert_eq!(
        plan.years().collect::<Vec<_>>(),
        vec![YearLabel::First, YearLabel::Second]
    );
    assert_eq!(
        plan.get(YearLabel::First).unwrap(),
        &[
            SubjectEntry::new("Economía", "6"),
            SubjectEntry::new("Historia del Turismo", "6"),
        ]
    );
    assert_eq!(
        plan.get(YearLabel::Second).unwrap(),
        &[SubjectEntry::new("Marketing", "6,5")]
    );
}

#[test]
fn test_sections() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dump(dir.path(), "turismo", turismo_pages());
    let ext = extract_file(&path, &GlyphDumpSource, &LayoutProfile::default()).unwrap();

    assert_eq!(ext.record.knowledge, "Trabajo en equipo.");
    assert_eq!(ext.record.outcomes, "Guía turístico.");
    assert!(ext.issues.is_empty(), "unexpected issues: {:?}", ext.issues);
}

#[test]
fn test_multiline_sections_and_plan_issues() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dump(dir.path(), "enfermeria", enfermeria_pages());
    let ext = extract_file(&path, &GlyphDumpSource, &LayoutProfile::default()).unwrap();
    let r = &ext.record;

    assert_eq!(r.knowledge, "Cuidados.\nÉtica profesional.");
    assert_eq!(r.outcomes, "Hospitales.\nAtención primaria.");
    assert_eq!(
        r.study_plan.get(YearLabel::Third).unwrap(),
        &[
            SubjectEntry::new("Prácticas Clínicas", "4,5"),
            SubjectEntry::new("Trabajo Fin de Grado", "6 + 3"),
        ]
    );
    assert_eq!(
        ext.issues,
        vec![
            ExtractionIssue::NoYearDetected { orphan_lines: 1 },
            ExtractionIssue::UnterminatedSubjectBuffer {
                year: YearLabel::Third,
                fragment: "Optativa de".into(),
            },
        ]
    );
}

#[test]
fn test_plan_without_year_headers_is_empty_not_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut pages = turismo_pages();
    pages[1] = plan_page(&["Economía 6", "Marketing 6,5"]);
    let path = write_dump(dir.path(), "sin_cursos", pages);

    let ext = extract_file(&path, &GlyphDumpSource, &LayoutProfile::default()).unwrap();
    assert!(ext.record.study_plan.is_empty());
    assert_eq!(ext.record.title, "GRADO EN TURISMO");

    let json: serde_json::Value = serde_json::from_str(&ext.record.to_json().unwrap()).unwrap();
    assert_eq!(json["plan_estudios"], serde_json::json!({}));
}

#[test]
fn test_serialized_record_shape() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dump(dir.path(), "turismo", turismo_pages());
    let ext = extract_file(&path, &GlyphDumpSource, &LayoutProfile::default()).unwrap();
    let json = ext.record.to_json().unwrap();

    // Non-ASCII stays unescaped.
    assert!(json.contains("Economía"));
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["degree_title"], "GRADO EN TURISMO");
    assert_eq!(
        value["plan_estudios"]["SEGUNDO CURSO"],
        serde_json::json!([{"subject": "Marketing", "ects": "6,5"}])
    );
    // Year keys keep first-declaration order.
    let primer = json.find("PRIMER CURSO").unwrap();
    let segundo = json.find("SEGUNDO CURSO").unwrap();
    assert!(primer < segundo);
}

// ── Batch scenarios ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_batch_isolation() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_dump(input.path(), "turismo", turismo_pages());
    write_dump(input.path(), "enfermeria", enfermeria_pages());
    // Two pages only: skipped, the rest of the batch still runs.
    write_dump(input.path(), "corto", turismo_pages()[..2].to_vec());
    std::fs::write(input.path().join("roto.glyphs.json"), "{oops").unwrap();
    std::fs::write(input.path().join("LEEME.txt"), "not an input").unwrap();

    let summary = extract_dir(input.path(), output.path(), &ExtractionConfig::default())
        .await
        .unwrap();

    assert_eq!(summary.total_documents, 4);
    assert_eq!(summary.extracted, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.orphan_plan_lines, 1);
    assert_eq!(summary.dropped_fragments, 1);

    let names: Vec<_> = summary.documents.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "corto.glyphs.json",
            "enfermeria.glyphs.json",
            "roto.glyphs.json",
            "turismo.glyphs.json"
        ]
    );
    let corto = &summary.documents[0];
    assert_eq!(corto.status, DocumentStatus::Skipped);
    assert!(corto.error.as_deref().unwrap().contains("needs at least 3"));

    assert!(output.path().join("turismo.json").exists());
    assert!(output.path().join("enfermeria.json").exists());
    assert!(!output.path().join("corto.json").exists());
    assert!(!output.path().join("roto.json").exists());
    assert_eq!(
        read_record(&output.path().join("turismo.json")).title,
        "GRADO EN TURISMO"
    );
}

#[test]
fn test_idempotent_output() {
    let input = tempfile::tempdir().unwrap();
    let out_a = tempfile::tempdir().unwrap();
    let out_b = tempfile::tempdir().unwrap();
    write_dump(input.path(), "turismo", turismo_pages());
    write_dump(input.path(), "enfermeria", enfermeria_pages());

    let config = ExtractionConfig::builder().concurrency(2).build().unwrap();
    extract_dir_sync(input.path(), out_a.path(), &config).unwrap();
    extract_dir_sync(input.path(), out_b.path(), &config).unwrap();

    for name in ["turismo.json", "enfermeria.json"] {
        let a = std::fs::read(out_a.path().join(name)).unwrap();
        let b = std::fs::read(out_b.path().join(name)).unwrap();
        assert_eq!(a, b, "{name} differs between runs");
    }
}

#[test]
fn test_no_overwrite_leaves_existing_records() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_dump(input.path(), "turismo", turismo_pages());
    std::fs::write(output.path().join("turismo.json"), "kept").unwrap();

    let config = ExtractionConfig::builder().overwrite(false).build().unwrap();
    let summary = extract_dir_sync(input.path(), output.path(), &config).unwrap();

    assert_eq!(summary.unchanged, 1);
    assert_eq!(summary.documents[0].status, DocumentStatus::Unchanged);
    assert_eq!(
        std::fs::read_to_string(output.path().join("turismo.json")).unwrap(),
        "kept"
    );
}

#[derive(Default)]
struct CountingCallback {
    started: AtomicUsize,
    completed: AtomicUsize,
    errored: AtomicUsize,
    batch_total: AtomicUsize,
}

impl ExtractionProgressCallback for CountingCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.batch_total.store(total_documents, Ordering::SeqCst);
    }
    fn on_document_start(&self, _name: &str) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }
    fn on_document_complete(&self, _name: &str, _subjects: usize, _issues: usize) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
    fn on_document_error(&self, _name: &str, _error: &str) {
        self.errored.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_progress_callback_events() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_dump(input.path(), "turismo", turismo_pages());
    write_dump(input.path(), "corto", turismo_pages()[..1].to_vec());

    let cb = Arc::new(CountingCallback::default());
    let config = ExtractionConfig::builder()
        .progress_callback(cb.clone())
        .build()
        .unwrap();
    tokio_test::block_on(extract_dir(input.path(), output.path(), &config)).unwrap();

    assert_eq!(cb.batch_total.load(Ordering::SeqCst), 2);
    assert_eq!(cb.started.load(Ordering::SeqCst), 2);
    assert_eq!(cb.completed.load(Ordering::SeqCst), 1);
    assert_eq!(cb.errored.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_stream_carries_records() {
    let input = tempfile::tempdir().unwrap();
    write_dump(input.path(), "turismo", turismo_pages());
    write_dump(input.path(), "enfermeria", enfermeria_pages());

    let mut reports: Vec<_> = extract_stream(input.path(), &ExtractionConfig::default())
        .unwrap()
        .collect()
        .await;
    reports.sort_by(|a, b| a.name.cmp(&b.name));

    let titles: Vec<_> = reports
        .iter()
        .map(|r| r.record.as_ref().unwrap().title.as_str())
        .collect();
    assert_eq!(titles, vec!["GRADO EN ENFERMERÍA", "GRADO EN TURISMO"]);
    assert!(reports.iter().all(|r| r.output.is_none()));
}

// ── Catalog over written records ─────────────────────────────────────────────

#[tokio::test]
async fn test_catalog_over_written_records() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_dump(input.path(), "turismo", turismo_pages());
    write_dump(input.path(), "enfermeria", enfermeria_pages());
    extract_dir(input.path(), output.path(), &ExtractionConfig::default())
        .await
        .unwrap();

    let catalog = RecordCatalog::load_dir(output.path()).unwrap();
    assert_eq!(catalog.len(), 2);

    let listing = degree_layout::render_subjects(&catalog.subjects("enfermeria"));
    assert_eq!(
        listing,
        "Grado: GRADO EN ENFERMERÍA\n\
         Asignaturas:\n  \
         - Anatomía Humana\n  \
         - Bioquímica\n  \
         - Prácticas Clínicas\n  \
         - Trabajo Fin de Grado\n"
    );

    let passages = catalog.section_passages();
    assert_eq!(passages.len(), 4);
    assert_eq!(
        passages[3].text,
        "Salidas profesionales para el grado de GRADO EN TURISMO: Guía turístico."
    );
    assert_eq!(passages[3].source_file, "turismo.json");
}

// ── Real PDFs (gated) ────────────────────────────────────────────────────────

#[test]
fn test_real_brochures() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP: set E2E_ENABLED=1 to run PDF tests");
        return;
    }
    let cases = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases");
    if !cases.exists() {
        println!("SKIP: no test_cases/ directory");
        return;
    }
    let output = tempfile::tempdir().unwrap();
    let summary = extract_dir_sync(&cases, output.path(), &ExtractionConfig::default()).unwrap();
    println!("{}", serde_json::to_string_pretty(&summary).unwrap());
    assert_eq!(summary.failed, 0, "failed documents: {:#?}", summary.documents);
    for doc in summary.documents.iter().filter(|d| d.status == DocumentStatus::Extracted) {
        assert!(doc.subjects > 0, "{} has an empty study plan", doc.name);
    }
}
