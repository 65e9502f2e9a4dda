//! Fills a consent template PDF at the coordinates of a [`TemplateLayout`].
//!
//! The template is loaded from bytes, never touched on disk: text runs are
//! appended to the page content streams in Helvetica 10pt and the two
//! signature PNGs are embedded as image XObjects with an alpha soft mask, then
//! the whole document is serialized into a fresh byte buffer. Field content is
//! deterministic for identical inputs; byte-identical files are not guaranteed
//! because the library emits its own generation metadata.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;

use crate::error::ApiError;
use crate::pdf::layout::{SignatureBox, TemplateLayout, TextAnchor};

const FONT_SIZE: u32 = 10;
const FONT_RESOURCE: &str = "F1";
const DATA_URL_MARKER: &str = "base64,";

/// Text values drawn onto a consent template. The declarant line repeats the
/// patient's full name and document number in the "I, ____" sentence of the
/// form body.
#[derive(Debug, Clone)]
pub struct ConsentText {
    pub day: String,
    pub month: String,
    pub year: String,
    pub hour: String,

    pub patient_first_surname: String,
    pub patient_second_surname: String,
    pub patient_given_names: String,
    pub patient_document: String,
    pub patient_age: String,
    pub patient_phone: String,

    pub specialist_first_surname: String,
    pub specialist_second_surname: String,
    pub specialist_given_names: String,

    pub declarant_name: String,
}

/// Strips the data-URL prefix from a captured signature and decodes the
/// payload. The `base64,` marker must be present; its absence or an
/// undecodable payload is a hard reject before any drawing happens.
pub fn decode_signature(data_url: &str) -> Result<Vec<u8>, ApiError> {
    let index = data_url
        .find(DATA_URL_MARKER)
        .ok_or_else(|| ApiError::Validation("signature is not a base64 data URL".to_string()))?;
    BASE64
        .decode(&data_url[index + DATA_URL_MARKER.len()..])
        .map_err(|e| ApiError::Validation(format!("signature payload is not valid base64: {}", e)))
}

/// Renders a filled consent form: all page-one text, the patient document
/// number on page two, and both signature images in their slots. Templates
/// with a single page receive the page-two content on that page, matching the
/// behavior of the original forms that were folded onto one sheet.
pub fn fill_template(
    template: &[u8],
    layout: &TemplateLayout,
    text: &ConsentText,
    patient_signature: &[u8],
    specialist_signature: &[u8],
) -> Result<Vec<u8>, ApiError> {
    let mut doc = Document::load_mem(template)?;
    let pages = doc.get_pages();
    let page1 = pages
        .get(&1)
        .copied()
        .ok_or_else(|| ApiError::Render("template has no pages".to_string()))?;
    let page2 = pages.get(&2).copied().unwrap_or(page1);

    draw_text(&mut doc, page1, &page_one_runs(layout, text))?;
    draw_text(
        &mut doc,
        page2,
        &[(text.patient_document.as_str(), layout.page2.patient_document)],
    )?;
    place_signature(
        &mut doc,
        page2,
        patient_signature,
        "SigPatient",
        &layout.page2.patient_signature,
    )?;
    place_signature(
        &mut doc,
        page2,
        specialist_signature,
        "SigSpecialist",
        &layout.page2.specialist_signature,
    )?;

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| ApiError::Render(e.to_string()))?;
    Ok(out)
}

fn page_one_runs<'a>(
    layout: &TemplateLayout,
    text: &'a ConsentText,
) -> Vec<(&'a str, TextAnchor)> {
    let p1 = &layout.page1;
    vec![
        (text.day.as_str(), p1.day),
        (text.month.as_str(), p1.month),
        (text.year.as_str(), p1.year),
        (text.hour.as_str(), p1.hour),
        (text.patient_first_surname.as_str(), p1.patient_first_surname),
        (text.patient_second_surname.as_str(), p1.patient_second_surname),
        (text.patient_given_names.as_str(), p1.patient_given_names),
        (text.patient_document.as_str(), p1.patient_document),
        (text.patient_age.as_str(), p1.patient_age),
        (text.patient_phone.as_str(), p1.patient_phone),
        (text.specialist_first_surname.as_str(), p1.specialist_first_surname),
        (text.specialist_second_surname.as_str(), p1.specialist_second_surname),
        (text.specialist_given_names.as_str(), p1.specialist_given_names),
        (text.declarant_name.as_str(), p1.declarant_name),
        (text.patient_document.as_str(), p1.declarant_document),
    ]
}

/// Stamps a batch of text runs onto one page as a single appended content
/// stream, registering the Helvetica font resource on the way.
fn draw_text(
    doc: &mut Document,
    page_id: ObjectId,
    runs: &[(&str, TextAnchor)],
) -> Result<(), ApiError> {
    if runs.is_empty() {
        return Ok(());
    }
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    set_page_resource(doc, page_id, b"Font", FONT_RESOURCE, font_id)?;

    let mut ops = String::new();
    for (value, anchor) in runs {
        if value.is_empty() {
            continue;
        }
        ops.push_str(&format!(
            "BT\n/{} {} Tf\n{} {} Td\n({}) Tj\nET\n",
            FONT_RESOURCE,
            FONT_SIZE,
            anchor.x,
            anchor.y,
            encode_text(value)?
        ));
    }
    append_content(doc, page_id, ops.into_bytes())
}

/// Embeds a decoded signature PNG as a DeviceRGB image XObject with its alpha
/// channel as a DeviceGray soft mask, then draws it inside the slot's box.
fn place_signature(
    doc: &mut Document,
    page_id: ObjectId,
    png: &[u8],
    name: &str,
    slot: &SignatureBox,
) -> Result<(), ApiError> {
    let img = image::load_from_memory(png)
        .map_err(|e| ApiError::Validation(format!("signature is not a decodable image: {}", e)))?
        .to_rgba8();
    let (width, height) = img.dimensions();

    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    let mut alpha = Vec::with_capacity(width as usize * height as usize);
    for pixel in img.pixels() {
        let [r, g, b, a] = pixel.0;
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
    }

    let smask_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        deflate(&alpha)?,
    ));
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
            "SMask" => Object::Reference(smask_id),
        },
        deflate(&rgb)?,
    ));
    set_page_resource(doc, page_id, b"XObject", name, image_id)?;

    let ops = format!(
        "q\n{} 0 0 {} {} {} cm\n/{} Do\nQ\n",
        slot.width, slot.height, slot.x, slot.y, name
    );
    append_content(doc, page_id, ops.into_bytes())
}

/// Registers `name -> object` under the given resource category (`Font`,
/// `XObject`) of a page, creating dictionaries as needed. Handles resources
/// stored inline in the page dictionary as well as behind an indirect
/// reference.
fn set_page_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &[u8],
    name: &str,
    object_id: ObjectId,
) -> Result<(), ApiError> {
    let resources_ref = {
        let page = doc.get_object(page_id)?.as_dict()?;
        match page.get(b"Resources") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        }
    };

    let resources = match resources_ref {
        Some(id) => doc.get_object_mut(id)?.as_dict_mut()?,
        None => {
            // A page without its own Resources inherits them from the Pages
            // ancestry; copy the inherited dictionary onto the page first so
            // the template's own fonts and XObjects stay reachable.
            if !doc.get_object(page_id)?.as_dict()?.has(b"Resources") {
                let inherited =
                    inherited_resources(doc, page_id)?.unwrap_or_else(Dictionary::new);
                let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
                page.set("Resources", Object::Dictionary(inherited));
            }
            doc.get_object_mut(page_id)?
                .as_dict_mut()?
                .get_mut(b"Resources")?
                .as_dict_mut()?
        }
    };

    if !resources.has(category) {
        resources.set(category, Object::Dictionary(dictionary! {}));
    }
    resources
        .get_mut(category)?
        .as_dict_mut()?
        .set(name.as_bytes().to_vec(), Object::Reference(object_id));
    Ok(())
}

/// Walks the Pages ancestry looking for a Resources entry the page inherits.
fn inherited_resources(
    doc: &Document,
    page_id: ObjectId,
) -> Result<Option<Dictionary>, ApiError> {
    let mut current = page_id;
    loop {
        let node = doc.get_object(current)?.as_dict()?;
        match node.get(b"Resources") {
            Ok(Object::Reference(id)) => {
                return Ok(Some(doc.get_object(*id)?.as_dict()?.clone()));
            }
            Ok(Object::Dictionary(resources)) => return Ok(Some(resources.clone())),
            _ => {}
        }
        match node.get(b"Parent") {
            Ok(Object::Reference(parent)) => current = *parent,
            _ => return Ok(None),
        }
    }
}

/// Appends a content stream to a page, preserving whatever Contents shape the
/// template already uses (single reference, array, or nothing).
fn append_content(doc: &mut Document, page_id: ObjectId, ops: Vec<u8>) -> Result<(), ApiError> {
    let stream_id = doc.add_object(Stream::new(dictionary! {}, ops));
    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    let new_contents = match page.remove(b"Contents") {
        Some(Object::Reference(existing)) => Object::Array(vec![
            Object::Reference(existing),
            Object::Reference(stream_id),
        ]),
        Some(Object::Array(mut array)) => {
            array.push(Object::Reference(stream_id));
            Object::Array(array)
        }
        _ => Object::Reference(stream_id),
    };
    page.set("Contents", new_contents);
    Ok(())
}

/// Encodes a text run as a PDF literal string in the WinAnsi encoding
/// declared on the stamped font. Delimiters are backslash-escaped, bytes
/// above the ASCII range are written as octal escapes, and characters with no
/// WinAnsi slot are rejected so names never degrade into mojibake.
fn encode_text(text: &str) -> Result<String, ApiError> {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let byte = win_ansi_byte(c).ok_or_else(|| {
            ApiError::Validation(format!("character '{}' cannot be written onto the form", c))
        })?;
        match byte {
            b'(' | b')' | b'\\' => {
                out.push('\\');
                out.push(byte as char);
            }
            0x20..=0x7e => out.push(byte as char),
            _ => out.push_str(&format!("\\{:03o}", byte)),
        }
    }
    Ok(out)
}

/// WinAnsi (code page 1252) slot for a character. Printable ASCII and the
/// Latin-1 block map straight through; the 0x80..0x9F range holds the CP1252
/// specials instead of control codes.
fn win_ansi_byte(c: char) -> Option<u8> {
    match c {
        '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => Some(c as u8),
        '\u{20ac}' => Some(0x80), // euro sign
        '\u{201a}' => Some(0x82),
        '\u{0192}' => Some(0x83),
        '\u{201e}' => Some(0x84),
        '\u{2026}' => Some(0x85),
        '\u{2020}' => Some(0x86),
        '\u{2021}' => Some(0x87),
        '\u{02c6}' => Some(0x88),
        '\u{2030}' => Some(0x89),
        '\u{0160}' => Some(0x8a),
        '\u{2039}' => Some(0x8b),
        '\u{0152}' => Some(0x8c),
        '\u{017d}' => Some(0x8e),
        '\u{2018}' => Some(0x91),
        '\u{2019}' => Some(0x92),
        '\u{201c}' => Some(0x93),
        '\u{201d}' => Some(0x94),
        '\u{2022}' => Some(0x95),
        '\u{2013}' => Some(0x96),
        '\u{2014}' => Some(0x97),
        '\u{02dc}' => Some(0x98),
        '\u{2122}' => Some(0x99),
        '\u{0161}' => Some(0x9a),
        '\u{203a}' => Some(0x9b),
        '\u{0153}' => Some(0x9c),
        '\u{017e}' => Some(0x9e),
        '\u{0178}' => Some(0x9f),
        _ => None,
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, ApiError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| ApiError::Render(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| ApiError::Render(e.to_string()))
}

#[cfg(test)]
pub(crate) mod testutil {
    use lopdf::{dictionary, Document, Object, Stream};

    /// Builds a minimal valid PDF with the requested number of empty Letter
    /// pages, standing in for a real consent template asset.
    pub(crate) fn blank_template(page_count: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for _ in 0..page_count {
            let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ],
                "Contents" => Object::Reference(content_id),
            });
            kids.push(Object::Reference(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => page_count as i64,
                "Kids" => kids,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    /// A small opaque PNG, the shape a captured signature arrives in after
    /// decoding.
    pub(crate) fn png_bytes() -> Vec<u8> {
        let mut img = image::RgbaImage::new(6, 4);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgba([20, 20, 20, 255]);
        }
        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    pub(crate) fn png_data_url() -> String {
        use base64::engine::general_purpose::STANDARD as BASE64;
        use base64::Engine;
        format!("data:image/png;base64,{}", BASE64.encode(png_bytes()))
    }
}
