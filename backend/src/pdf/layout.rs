//! Fixed field coordinates for every supported consent template.
//!
//! Coordinates are in PDF points with the origin at the bottom-left corner of
//! the page; moving a field up means increasing `y`. The values are hand-tuned
//! against the exact template assets shipped with the deployment and are data,
//! not logic: a regenerated template PDF requires re-measuring every anchor.
//!
//! Page one carries the capture date/time, the patient and specialist tables
//! and the "I, ____, with identity document ____" declaration line. Page two
//! carries both signature boxes and the patient document number next to the
//! patient's signature.

/// Anchor for a single text run.
#[derive(Debug, Clone, Copy)]
pub struct TextAnchor {
    pub x: f64,
    pub y: f64,
}

/// Bounding box a signature image is drawn into.
#[derive(Debug, Clone, Copy)]
pub struct SignatureBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug)]
pub struct PageOne {
    pub day: TextAnchor,
    pub month: TextAnchor,
    pub year: TextAnchor,
    pub hour: TextAnchor,

    pub patient_first_surname: TextAnchor,
    pub patient_second_surname: TextAnchor,
    pub patient_given_names: TextAnchor,
    pub patient_document: TextAnchor,
    pub patient_age: TextAnchor,
    pub patient_phone: TextAnchor,

    pub specialist_first_surname: TextAnchor,
    pub specialist_second_surname: TextAnchor,
    pub specialist_given_names: TextAnchor,

    pub declarant_name: TextAnchor,
    pub declarant_document: TextAnchor,
}

#[derive(Debug)]
pub struct PageTwo {
    pub patient_signature: SignatureBox,
    pub patient_document: TextAnchor,
    pub specialist_signature: SignatureBox,
}

#[derive(Debug)]
pub struct TemplateLayout {
    /// File name of the pristine template inside the configured templates
    /// directory.
    pub template_file: &'static str,
    pub page1: PageOne,
    pub page2: PageTwo,
}

const fn at(x: f64, y: f64) -> TextAnchor {
    TextAnchor { x, y }
}

const fn slot(x: f64, y: f64, width: f64, height: f64) -> SignatureBox {
    SignatureBox {
        x,
        y,
        width,
        height,
    }
}

static FO_HCR_13: TemplateLayout = TemplateLayout {
    template_file: "FO-HCR-13.pdf",
    page1: PageOne {
        day: at(120.0, 880.0),
        month: at(200.0, 880.0),
        year: at(270.0, 880.0),
        hour: at(335.0, 880.0),

        patient_first_surname: at(90.0, 857.0),
        patient_second_surname: at(170.0, 857.0),
        patient_given_names: at(276.0, 857.0),
        patient_document: at(375.0, 857.0),
        patient_age: at(465.0, 857.0),
        patient_phone: at(513.0, 857.0),

        // Specialist headers sit around y~785, the data row just below.
        specialist_first_surname: at(220.0, 800.0),
        specialist_second_surname: at(350.0, 800.0),
        specialist_given_names: at(490.0, 800.0),

        declarant_name: at(60.0, 748.5),
        declarant_document: at(350.0, 748.5),
    },
    page2: PageTwo {
        patient_signature: slot(195.0, 670.0, 190.0, 55.0),
        patient_document: at(445.0, 690.0),
        specialist_signature: slot(390.0, 630.0, 190.0, 55.0),
    },
};

/// FORM-2 through FORM-5 are printed on the same stationery grid and share
/// every coordinate; only the template asset differs.
const fn standard_form(template_file: &'static str) -> TemplateLayout {
    TemplateLayout {
        template_file,
        page1: PageOne {
            day: at(120.0, 882.93),
            month: at(205.0, 882.93),
            year: at(305.0, 882.93),
            hour: at(430.0, 882.93),

            patient_first_surname: at(90.0, 817.0),
            patient_second_surname: at(165.0, 817.0),
            patient_given_names: at(286.0, 817.0),
            patient_document: at(380.0, 817.0),
            patient_age: at(465.0, 817.0),
            patient_phone: at(525.0, 817.0),

            specialist_first_surname: at(210.0, 768.0),
            specialist_second_surname: at(340.0, 768.0),
            specialist_given_names: at(490.0, 768.0),

            declarant_name: at(70.0, 748.5),
            declarant_document: at(380.0, 748.5),
        },
        page2: PageTwo {
            patient_signature: slot(240.0, 560.0, 190.0, 55.0),
            patient_document: at(450.0, 585.0),
            specialist_signature: slot(410.0, 520.0, 190.0, 55.0),
        },
    }
}

static FORM_2: TemplateLayout = standard_form("FORM-2.pdf");
static FORM_3: TemplateLayout = standard_form("FORM-3.pdf");
static FORM_4: TemplateLayout = standard_form("FORM-4.pdf");
static FORM_5: TemplateLayout = standard_form("FORM-5.pdf");

/// Identifiers of every supported consent form.
pub const SUPPORTED: [&str; 5] = ["FO-HCR-13", "FORM-2", "FORM-3", "FORM-4", "FORM-5"];

/// Looks up the coordinate table for a template identifier. `None` means the
/// template is unsupported and the request must be rejected before rendering.
pub fn resolve(template_id: &str) -> Option<&'static TemplateLayout> {
    match template_id {
        "FO-HCR-13" => Some(&FO_HCR_13),
        "FORM-2" => Some(&FORM_2),
        "FORM-3" => Some(&FORM_3),
        "FORM-4" => Some(&FORM_4),
        "FORM-5" => Some(&FORM_5),
        _ => None,
    }
}
