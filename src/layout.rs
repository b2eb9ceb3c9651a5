//! Single-page, cursor-based report layout.
//!
//! `compose_page` consumes display-ready fields (already sanitized and
//! `N/A`-substituted) plus the resolved state of the two image slots and
//! produces a pure [`PageLayout`] of placed text and image regions. No PDF
//! types appear here, so section ordering, spacing and the missing-image
//! collapse are all unit-testable without a rendering backend.
//!
//! The page is fixed A4 (210×297 mm, i.e. 595×842 pt at 72 dpi) and always
//! exactly one page; content overflow is not handled.

use crate::embed::ImageSlot;

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;

const MARGIN_X: f32 = 18.0;
const INDENT_X: f32 = 21.0;
const LIST_X: f32 = 24.5;
const RESULT_COLUMN_X: f32 = 105.0;

const TITLE_Y: f32 = 282.0;
const TITLE_GAP: f32 = 14.0;
const HEADER_STEP: f32 = 7.0;
const LINE_STEP: f32 = 5.5;
const BLOCK_GAP: f32 = 8.5;
const FINDING_STEP: f32 = 5.0;
const REVIEW_HEADER_STEP: f32 = 6.5;
const SECTION_PAUSE: f32 = 3.5;

const IMAGE_DROP: f32 = 42.0;
const IMAGE_WIDTH: f32 = 70.0;
const IMAGE_HEIGHT: f32 = 35.0;
const IMAGE_ERROR_STEP: f32 = 7.0;
const IMAGES_TRAILING_GAP: f32 = 7.0;

const DISCLAIMER_Y: f32 = 17.0;
const DISCLAIMER_LINE_STEP: f32 = 3.5;
const GENERATED_Y: f32 = 9.0;
const DISCLAIMER_WRAP_CHARS: usize = 95;

const TITLE_SIZE: f32 = 22.0;
const HEADER_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 12.0;
const FINDING_SIZE: f32 = 11.0;
const IMAGE_ERROR_SIZE: f32 = 10.0;
const DISCLAIMER_SIZE: f32 = 9.0;
const GENERATED_SIZE: f32 = 8.0;

const REPORT_TITLE: &str = "Medical Imaging AI Analysis Report";
const DISCLAIMER: &str = "Disclaimer: This report is generated by an AI system and is for \
informational purposes only. Please consult a qualified medical professional for diagnosis \
and treatment.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextColor {
    Body,
    Title,
    Warning,
    Disclaimer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub text: String,
    pub x_mm: f32,
    pub y_mm: f32,
    pub size: f32,
    pub style: TextStyle,
    pub color: TextColor,
}

/// A fixed-size region an image slot renders into. The decoded raster
/// itself stays with the builder; the layout only records geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedImage {
    pub slot: ImageSlot,
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageLayout {
    pub texts: Vec<PlacedText>,
    pub images: Vec<PlacedImage>,
}

impl PageLayout {
    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts.iter().any(|t| t.text.contains(needle))
    }
}

/// Outcome of resolving one image slot before layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// No URL supplied; the slot is skipped entirely.
    Absent,
    /// Fetched and decoded; a fixed-size region is reserved.
    Loaded,
    /// Fetch or decode failed; a warning line is drawn instead.
    Failed,
}

/// Display-ready field values. All free text has been sanitized and all
/// optional values substituted before this point.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFields {
    pub patient_name: String,
    pub patient_id: String,
    pub appointment_id: String,
    pub appointment_date: String,
    pub doctor: Option<DoctorFields>,
    pub cancer_type: String,
    pub model_version: String,
    pub classification: String,
    pub confidence: String,
    pub findings: Vec<String>,
    pub doctor_review: Option<String>,
    pub input_image: SlotState,
    pub result_image: SlotState,
    pub generated_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoctorFields {
    pub name: String,
    pub id: String,
}

/// Vertical cursor measured from the page bottom, matching PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    y: f32,
}

impl Cursor {
    pub fn new(start_y: f32) -> Self {
        Self { y: start_y }
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn advance(&mut self, dy: f32) {
        self.y -= dy;
    }
}

struct Composer {
    page: PageLayout,
    cursor: Cursor,
}

impl Composer {
    fn new() -> Self {
        Self {
            page: PageLayout::default(),
            cursor: Cursor::new(TITLE_Y),
        }
    }

    fn text(&mut self, text: &str, x: f32, y: f32, size: f32, style: TextStyle, color: TextColor) {
        self.page.texts.push(PlacedText {
            text: text.to_string(),
            x_mm: x,
            y_mm: y,
            size,
            style,
            color,
        });
    }

    fn header(&mut self, text: &str) {
        self.text(
            text,
            MARGIN_X,
            self.cursor.y(),
            HEADER_SIZE,
            TextStyle::Bold,
            TextColor::Body,
        );
        self.cursor.advance(HEADER_STEP);
    }

    fn body_line(&mut self, text: &str, step: f32) {
        self.text(
            text,
            INDENT_X,
            self.cursor.y(),
            BODY_SIZE,
            TextStyle::Regular,
            TextColor::Body,
        );
        self.cursor.advance(step);
    }

    fn title(&mut self) {
        self.text(
            REPORT_TITLE,
            MARGIN_X,
            self.cursor.y(),
            TITLE_SIZE,
            TextStyle::Bold,
            TextColor::Title,
        );
        self.cursor.advance(TITLE_GAP);
    }

    fn patient_block(&mut self, fields: &ReportFields) {
        self.header("Patient Information:");
        self.body_line(&format!("Name: {}", fields.patient_name), LINE_STEP);
        self.body_line(&format!("Patient ID: {}", fields.patient_id), LINE_STEP);
        self.body_line(&format!("Appointment ID: {}", fields.appointment_id), LINE_STEP);
        self.body_line(&format!("Date: {}", fields.appointment_date), BLOCK_GAP);
    }

    fn doctor_block(&mut self, doctor: &DoctorFields) {
        self.header("Doctor:");
        self.body_line(&format!("Name: {}", doctor.name), LINE_STEP);
        self.body_line(&format!("Doctor ID: {}", doctor.id), BLOCK_GAP);
    }

    fn screening_block(&mut self, fields: &ReportFields) {
        self.header("Screening Details:");
        self.body_line(&format!("Cancer Type: {}", fields.cancer_type), LINE_STEP);
        self.body_line(&format!("AI Model Version: {}", fields.model_version), BLOCK_GAP);
    }

    fn results_block(&mut self, fields: &ReportFields) {
        self.header("AI Analysis Results:");
        self.body_line(&format!("Classification: {}", fields.classification), LINE_STEP);
        self.body_line(&format!("Confidence: {}", fields.confidence), LINE_STEP);
    }

    fn findings_block(&mut self, findings: &[String]) {
        if !findings.is_empty() {
            self.text(
                "Findings:",
                INDENT_X,
                self.cursor.y(),
                BODY_SIZE,
                TextStyle::Bold,
                TextColor::Body,
            );
            self.cursor.advance(LINE_STEP);
            for finding in findings {
                self.text(
                    &format!("- {finding}"),
                    LIST_X,
                    self.cursor.y(),
                    FINDING_SIZE,
                    TextStyle::Regular,
                    TextColor::Body,
                );
                self.cursor.advance(FINDING_STEP);
            }
        }
        self.cursor.advance(SECTION_PAUSE);
    }

    fn review_block(&mut self, review: &str) {
        self.text(
            "Doctor's Review:",
            MARGIN_X,
            self.cursor.y(),
            HEADER_SIZE,
            TextStyle::Bold,
            TextColor::Body,
        );
        self.cursor.advance(REVIEW_HEADER_STEP);
        self.body_line(review, BLOCK_GAP);
    }

    /// Image regions per slot. Each slot degrades independently; when the
    /// input slot did not load, the result image takes over the vertical
    /// position the input slot would have used so no gap is left.
    fn image_blocks(&mut self, fields: &ReportFields) {
        let mut input_loaded = false;
        let mut any_loaded = false;

        match fields.input_image {
            SlotState::Absent => {}
            SlotState::Loaded => {
                self.text(
                    "Input Image:",
                    MARGIN_X,
                    self.cursor.y(),
                    BODY_SIZE,
                    TextStyle::Bold,
                    TextColor::Body,
                );
                self.cursor.advance(IMAGE_DROP);
                self.place_image(ImageSlot::Input, MARGIN_X, self.cursor.y());
                input_loaded = true;
                any_loaded = true;
            }
            SlotState::Failed => {
                self.text(
                    "Input image could not be loaded.",
                    MARGIN_X,
                    self.cursor.y(),
                    IMAGE_ERROR_SIZE,
                    TextStyle::Regular,
                    TextColor::Warning,
                );
                self.cursor.advance(IMAGE_ERROR_STEP);
            }
        }

        match fields.result_image {
            SlotState::Absent => {}
            SlotState::Loaded => {
                let label_y = if input_loaded {
                    self.cursor.y() + IMAGE_DROP
                } else {
                    self.cursor.y()
                };
                self.text(
                    "Result Image:",
                    RESULT_COLUMN_X,
                    label_y,
                    BODY_SIZE,
                    TextStyle::Bold,
                    TextColor::Body,
                );
                let draw_y = if input_loaded {
                    self.cursor.y()
                } else {
                    self.cursor.y() - IMAGE_DROP
                };
                self.place_image(ImageSlot::Result, RESULT_COLUMN_X, draw_y);
                if !input_loaded {
                    self.cursor.advance(IMAGE_DROP);
                }
                any_loaded = true;
            }
            SlotState::Failed => {
                let error_y = if input_loaded {
                    self.cursor.y() + IMAGE_HEIGHT
                } else {
                    self.cursor.y()
                };
                self.text(
                    "Result image could not be loaded.",
                    RESULT_COLUMN_X,
                    error_y,
                    IMAGE_ERROR_SIZE,
                    TextStyle::Regular,
                    TextColor::Warning,
                );
                if !input_loaded {
                    self.cursor.advance(IMAGE_ERROR_STEP);
                }
            }
        }

        if any_loaded {
            self.cursor.advance(IMAGES_TRAILING_GAP);
        }
    }

    fn place_image(&mut self, slot: ImageSlot, x: f32, y: f32) {
        self.page.images.push(PlacedImage {
            slot,
            x_mm: x,
            y_mm: y,
            width_mm: IMAGE_WIDTH,
            height_mm: IMAGE_HEIGHT,
        });
    }

    /// Disclaimer and generation stamp sit at fixed positions near the
    /// page bottom, independent of how far the cursor descended.
    fn footer(&mut self, generated_at: &str) {
        let mut y = DISCLAIMER_Y;
        for line in wrap_text(DISCLAIMER, DISCLAIMER_WRAP_CHARS) {
            self.text(
                &line,
                MARGIN_X,
                y,
                DISCLAIMER_SIZE,
                TextStyle::Regular,
                TextColor::Disclaimer,
            );
            y -= DISCLAIMER_LINE_STEP;
        }
        self.text(
            &format!("Generated: {generated_at}"),
            MARGIN_X,
            GENERATED_Y,
            GENERATED_SIZE,
            TextStyle::Regular,
            TextColor::Body,
        );
    }
}

/// Lays out the whole report page in fixed section order.
pub fn compose_page(fields: &ReportFields) -> PageLayout {
    let mut composer = Composer::new();

    composer.title();
    composer.patient_block(fields);
    if let Some(doctor) = &fields.doctor {
        composer.doctor_block(doctor);
    }
    composer.screening_block(fields);
    composer.results_block(fields);
    composer.findings_block(&fields.findings);
    if let Some(review) = &fields.doctor_review {
        composer.review_block(review);
    }
    composer.image_blocks(fields);
    composer.footer(&fields.generated_at);

    composer.page
}

/// Greedy word wrap for footer text.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
