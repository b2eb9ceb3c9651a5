//! Report orchestration: field resolution, image slot handling, PDF
//! rendering via `printpdf`, and error classification.
//!
//! One `build` call is a single synchronous unit of work with no state
//! shared across calls, so callers may build reports concurrently. Fetch
//! and decode failures are absorbed per image slot; only structural
//! failures (document, fonts, drawing, serialization) abort the build.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use printpdf::{
    BuiltinFont, Color, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rgb,
};
use tracing::{info, warn};

use crate::embed::{decode_report_image, DecodedImage, ImageSlot};
use crate::error::ReportError;
use crate::fetch::{AssetFetcher, HttpFetcher};
use crate::layout::{
    compose_page, DoctorFields, PageLayout, PlacedImage, ReportFields, SlotState, TextColor,
    TextStyle, PAGE_HEIGHT_MM, PAGE_WIDTH_MM,
};
use crate::models::{format_date, now_display, ReportRequest};
use crate::sanitize::{sanitize, sanitize_default};

const DOCUMENT_TITLE: &str = "Medical Imaging AI Analysis Report";
const FINDING_MAX_LENGTH: usize = 100;
const REVIEW_MAX_LENGTH: usize = 300;
const IMAGE_DPI: f32 = 300.0;
const MM_PER_INCH: f32 = 25.4;

/// Builds screening report PDFs. Generic over the fetcher so tests can
/// substitute an in-memory one.
pub struct ReportBuilder<F = HttpFetcher> {
    fetcher: F,
}

impl ReportBuilder<HttpFetcher> {
    pub fn new() -> Self {
        Self {
            fetcher: HttpFetcher::default(),
        }
    }
}

impl Default for ReportBuilder<HttpFetcher> {
    fn default() -> Self {
        Self::new()
    }
}

struct ResolvedSlot {
    state: SlotState,
    decoded: Option<DecodedImage>,
}

impl ResolvedSlot {
    fn absent() -> Self {
        Self {
            state: SlotState::Absent,
            decoded: None,
        }
    }

    fn failed() -> Self {
        Self {
            state: SlotState::Failed,
            decoded: None,
        }
    }

    fn loaded(decoded: DecodedImage) -> Self {
        Self {
            state: SlotState::Loaded,
            decoded: Some(decoded),
        }
    }
}

impl<F: AssetFetcher> ReportBuilder<F> {
    pub fn with_fetcher(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Builds the report and returns the finished PDF bytes.
    ///
    /// Image failures degrade to placeholder lines and never surface here;
    /// every error this returns is one of the closed [`ReportError`] kinds.
    pub fn build(&self, request: &ReportRequest) -> Result<Vec<u8>, ReportError> {
        if request.cancer_type.trim().is_empty() {
            return Err(ReportError::Unexpected(
                "cancer type is required and must not be empty".into(),
            ));
        }

        info!(cancer_type = %request.cancer_type, "building screening report");

        let mut input = self.resolve_slot(request.input_image_url.as_deref(), ImageSlot::Input);
        let mut result = self.resolve_slot(request.result_image_url.as_deref(), ImageSlot::Result);

        let fields = resolve_fields(request, input.state, result.state);
        let page = compose_page(&fields);

        render_page(&page, &mut input, &mut result)
    }

    fn resolve_slot(&self, url: Option<&str>, slot: ImageSlot) -> ResolvedSlot {
        let Some(url) = url else {
            return ResolvedSlot::absent();
        };

        let bytes = match self.fetcher.fetch_bytes(url) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("{slot} unavailable: {err}");
                return ResolvedSlot::failed();
            }
        };

        match decode_report_image(&bytes, slot) {
            Ok(decoded) => ResolvedSlot::loaded(decoded),
            Err(err) => {
                warn!("{err}");
                ResolvedSlot::failed()
            }
        }
    }
}

// ─── Field resolution ─────────────────────────────────────────────────────────

/// Turns the raw request into display-ready field values: sanitized free
/// text, `N/A` fallbacks, formatted dates and the generation stamp.
fn resolve_fields(
    request: &ReportRequest,
    input_state: SlotState,
    result_state: SlotState,
) -> ReportFields {
    let ai = &request.ai_results;

    ReportFields {
        patient_name: request
            .patient
            .as_ref()
            .map(|p| p.display_name())
            .unwrap_or_else(|| "N/A".to_string()),
        patient_id: request
            .patient
            .as_ref()
            .and_then(|p| p.id.clone())
            .unwrap_or_else(|| "N/A".to_string()),
        appointment_id: request
            .appointment
            .as_ref()
            .and_then(|a| a.id.clone())
            .unwrap_or_else(|| "N/A".to_string()),
        appointment_date: format_date(
            request
                .appointment
                .as_ref()
                .and_then(|a| a.appointment_date.as_ref()),
        ),
        doctor: request.doctor.as_ref().map(|d| DoctorFields {
            name: d.display_name(),
            id: d.id.clone().unwrap_or_else(|| "N/A".to_string()),
        }),
        cancer_type: sanitize_default(&request.cancer_type),
        model_version: ai
            .ai_model_version
            .as_deref()
            .map(sanitize_default)
            .unwrap_or_else(|| "N/A".to_string()),
        classification: ai
            .classification
            .as_deref()
            .map(sanitize_default)
            .unwrap_or_else(|| "N/A".to_string()),
        confidence: ai
            .confidence
            .map(|c| format!("{c}%"))
            .unwrap_or_else(|| "N/A".to_string()),
        findings: ai
            .additional_findings
            .iter()
            .filter(|f| !f.trim().is_empty())
            .map(|f| sanitize(f, FINDING_MAX_LENGTH))
            .collect(),
        doctor_review: ai
            .doctor_review
            .as_deref()
            .map(|review| sanitize(review, REVIEW_MAX_LENGTH)),
        input_image: input_state,
        result_image: result_state,
        generated_at: now_display(),
    }
}

// ─── PDF rendering ────────────────────────────────────────────────────────────

fn fill_color(color: TextColor) -> Color {
    let (r, g, b) = match color {
        TextColor::Body => (0.0, 0.0, 0.0),
        TextColor::Title => (0.0, 0.3, 0.7),
        TextColor::Warning => (0.7, 0.3, 0.3),
        TextColor::Disclaimer => (0.5, 0.1, 0.1),
    };
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn render_page(
    page: &PageLayout,
    input: &mut ResolvedSlot,
    result: &mut ResolvedSlot,
) -> Result<Vec<u8>, ReportError> {
    let (doc, page_index, layer_index) = PdfDocument::new(
        DOCUMENT_TITLE,
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let layer = doc.get_page(page_index).get_layer(layer_index);

    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::DocumentCreation(format!("font embedding failed: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReportError::DocumentCreation(format!("font embedding failed: {e}")))?;

    draw_content(&layer, page, input, result, &font, &bold)?;

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ReportError::Serialization(e.to_string()))?;
    buf.into_inner()
        .map_err(|e| ReportError::Serialization(e.to_string()))
}

fn draw_content(
    layer: &PdfLayerReference,
    page: &PageLayout,
    input: &mut ResolvedSlot,
    result: &mut ResolvedSlot,
    font: &IndirectFontRef,
    bold: &IndirectFontRef,
) -> Result<(), ReportError> {
    for text in &page.texts {
        let face = match text.style {
            TextStyle::Regular => font,
            TextStyle::Bold => bold,
        };
        layer.set_fill_color(fill_color(text.color));
        layer.use_text(&text.text, text.size, Mm(text.x_mm), Mm(text.y_mm), face);
    }

    for placed in &page.images {
        let decoded = match placed.slot {
            ImageSlot::Input => input.decoded.take(),
            ImageSlot::Result => result.decoded.take(),
        };
        // The layout only reserves a region for slots the builder resolved
        // to Loaded, so a missing raster here is an internal inconsistency.
        let decoded = decoded.ok_or_else(|| {
            ReportError::ContentRender(format!("no decoded raster for {}", placed.slot))
        })?;
        place_image(layer, placed, decoded);
    }

    Ok(())
}

/// Draws a decoded raster stretched into its fixed on-page region.
fn place_image(layer: &PdfLayerReference, placed: &PlacedImage, decoded: DecodedImage) {
    let natural_width_mm = decoded.width_px as f32 / IMAGE_DPI * MM_PER_INCH;
    let natural_height_mm = decoded.height_px as f32 / IMAGE_DPI * MM_PER_INCH;

    let transform = ImageTransform {
        translate_x: Some(Mm(placed.x_mm)),
        translate_y: Some(Mm(placed.y_mm)),
        scale_x: Some(placed.width_mm / natural_width_mm),
        scale_y: Some(placed.height_mm / natural_height_mm),
        dpi: Some(IMAGE_DPI),
        ..Default::default()
    };

    decoded.image.add_to_layer(layer.clone(), transform);
}

// ─── File export ──────────────────────────────────────────────────────────────

/// Writes finished report bytes under `dir`, creating it if needed, and
/// returns the full path.
pub fn export_report_to_file(
    bytes: &[u8],
    dir: &Path,
    filename: &str,
) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(filename);
    fs::write(&path, bytes)?;
    Ok(path)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::fixtures::{jpeg_bytes, png_bytes};
    use crate::fetch::MockFetcher;
    use crate::models::{AiResults, AppointmentDate, AppointmentInfo, DoctorInfo, PatientInfo};

    const INPUT_URL: &str = "https://example.com/input.jpg";
    const RESULT_URL: &str = "https://example.com/result.png";

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn sample_request() -> ReportRequest {
        ReportRequest {
            cancer_type: "Breast Cancer".into(),
            ai_results: AiResults {
                classification: Some("Benign".into()),
                confidence: Some(95.0),
                additional_findings: vec!["No suspicious masses detected".into()],
                doctor_review: Some("Results reviewed and confirmed.".into()),
                ai_model_version: Some("v2.1.0".into()),
            },
            patient: Some(PatientInfo {
                first_name: Some("John".into()),
                last_name: Some("Doe".into()),
                id: Some("P12345".into()),
            }),
            doctor: Some(DoctorInfo {
                first_name: Some("Jane".into()),
                last_name: Some("Smith".into()),
                id: Some("D001".into()),
            }),
            appointment: Some(AppointmentInfo {
                id: Some("A67890".into()),
                appointment_date: Some(AppointmentDate::Timestamp {
                    seconds: 1640995200,
                }),
            }),
            input_image_url: Some(INPUT_URL.into()),
            result_image_url: Some(RESULT_URL.into()),
        }
    }

    fn builder_with_both_images() -> ReportBuilder<MockFetcher> {
        ReportBuilder::with_fetcher(
            MockFetcher::new()
                .with_response(INPUT_URL, jpeg_bytes())
                .with_response(RESULT_URL, png_bytes()),
        )
    }

    fn assert_pdf(bytes: &[u8]) {
        assert!(bytes.len() > 500, "suspiciously small PDF: {}", bytes.len());
        assert!(bytes.starts_with(b"%PDF"), "missing PDF header");
    }

    #[test]
    fn builds_report_with_both_images() {
        init_tracing();
        let bytes = builder_with_both_images()
            .build(&sample_request())
            .unwrap();
        assert_pdf(&bytes);
    }

    #[test]
    fn failed_input_fetch_degrades_without_error() {
        init_tracing();
        let builder = ReportBuilder::with_fetcher(
            MockFetcher::new().with_response(RESULT_URL, png_bytes()),
        );
        let bytes = builder.build(&sample_request()).unwrap();
        assert_pdf(&bytes);
    }

    #[test]
    fn both_image_failures_still_produce_a_report() {
        let builder = ReportBuilder::with_fetcher(MockFetcher::new());
        let bytes = builder.build(&sample_request()).unwrap();
        assert_pdf(&bytes);
    }

    #[test]
    fn undecodable_image_bytes_degrade_without_error() {
        let builder = ReportBuilder::with_fetcher(
            MockFetcher::new()
                .with_response(INPUT_URL, b"definitely not an image".to_vec())
                .with_response(RESULT_URL, png_bytes()),
        );
        let bytes = builder.build(&sample_request()).unwrap();
        assert_pdf(&bytes);
    }

    #[test]
    fn absent_image_urls_build_fine() {
        let mut request = sample_request();
        request.input_image_url = None;
        request.result_image_url = None;
        let builder = ReportBuilder::with_fetcher(MockFetcher::new());
        assert_pdf(&builder.build(&request).unwrap());
    }

    #[test]
    fn minimal_request_builds_with_fallbacks() {
        let request = ReportRequest {
            cancer_type: "Skin Cancer".into(),
            ai_results: AiResults {
                classification: None,
                confidence: None,
                additional_findings: Vec::new(),
                doctor_review: None,
                ai_model_version: None,
            },
            patient: None,
            doctor: None,
            appointment: None,
            input_image_url: None,
            result_image_url: None,
        };
        let builder = ReportBuilder::with_fetcher(MockFetcher::new());
        assert_pdf(&builder.build(&request).unwrap());
    }

    #[test]
    fn empty_cancer_type_is_rejected() {
        let mut request = sample_request();
        request.cancer_type = "   ".into();
        let err = builder_with_both_images().build(&request).unwrap_err();
        assert!(matches!(err, ReportError::Unexpected(_)));
    }

    #[test]
    fn resolved_fields_apply_fallbacks_and_sanitization() {
        let mut request = sample_request();
        request.patient = None;
        request.ai_results.doctor_review = Some("Confirmed \u{1F600} by review board".into());
        request.ai_results.confidence = None;

        let fields = resolve_fields(&request, SlotState::Absent, SlotState::Absent);
        assert_eq!(fields.patient_name, "N/A");
        assert_eq!(fields.patient_id, "N/A");
        assert_eq!(fields.confidence, "N/A");
        assert_eq!(
            fields.doctor_review.as_deref(),
            Some("Confirmed by review board")
        );
        assert_eq!(fields.doctor.as_ref().unwrap().name, "Dr. Jane Smith");
    }

    #[test]
    fn confidence_formats_as_percentage() {
        let fields = resolve_fields(&sample_request(), SlotState::Absent, SlotState::Absent);
        assert_eq!(fields.confidence, "95%");
    }

    #[test]
    fn zero_confidence_is_a_value_not_a_fallback() {
        let mut request = sample_request();
        request.ai_results.confidence = Some(0.0);
        let fields = resolve_fields(&request, SlotState::Absent, SlotState::Absent);
        assert_eq!(fields.confidence, "0%");
    }

    #[test]
    fn blank_findings_are_dropped_and_long_ones_truncated() {
        let mut request = sample_request();
        request.ai_results.additional_findings =
            vec!["  ".into(), "x".repeat(200), "clear margins".into()];

        let fields = resolve_fields(&request, SlotState::Absent, SlotState::Absent);
        assert_eq!(fields.findings.len(), 2);
        assert_eq!(fields.findings[0].chars().count(), FINDING_MAX_LENGTH + 3);
        assert_eq!(fields.findings[1], "clear margins");
    }

    #[test]
    fn builds_are_repeatable_with_identical_input() {
        let builder = builder_with_both_images();
        let request = sample_request();
        assert_pdf(&builder.build(&request).unwrap());
        assert_pdf(&builder.build(&request).unwrap());

        // Section content is a pure function of the fields; only the
        // generation stamp may differ between calls.
        let a = resolve_fields(&request, SlotState::Loaded, SlotState::Loaded);
        let mut b = resolve_fields(&request, SlotState::Loaded, SlotState::Loaded);
        b.generated_at = a.generated_at.clone();
        assert_eq!(compose_page(&a), compose_page(&b));
    }

    #[test]
    fn export_writes_bytes_under_target_dir() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("exports");
        let path = export_report_to_file(b"%PDF-1.3 test", &target, "report.pdf").unwrap();

        assert!(path.starts_with(&target));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.3 test");
    }
}
