//! PDF fixtures built with lopdf.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// One piece of text placed on a page.
pub struct Placed<'a> {
    pub x: i64,
    pub y: i64,
    pub size: i64,
    pub text: &'a str,
}

pub fn placed(x: i64, y: i64, size: i64, text: &str) -> Placed<'_> {
    Placed { x, y, size, text }
}

/// Build a Letter-sized PDF with one page per entry, every text drawn in
/// Helvetica.
pub fn build_pdf(pages: &[Vec<Placed<'_>>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for page in pages {
        let mut operations = Vec::new();
        for item in page {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), item.size.into()]));
            operations.push(Operation::new("Td", vec![item.x.into(), item.y.into()]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(item.text)],
            ));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// A one-page worksheet with a heading and two paragraphs.
pub fn text_pdf() -> Vec<u8> {
    build_pdf(&[vec![
        placed(72, 720, 18, "Handwriting Practice"),
        placed(72, 680, 12, "Copy each sentence below."),
        placed(72, 620, 12, "The quick brown fox jumps over the lazy dog."),
    ]])
}

/// A one-page worksheet with an instruction line and a 3x3 grid of words.
pub fn table_pdf() -> Vec<u8> {
    build_pdf(&[vec![
        placed(72, 720, 14, "Spelling Words"),
        placed(72, 660, 12, "Word"),
        placed(250, 660, 12, "Sound"),
        placed(420, 660, 12, "Sentence"),
        placed(72, 640, 12, "cat"),
        placed(250, 640, 12, "short a"),
        placed(420, 640, 12, "The cat sat."),
        placed(72, 620, 12, "kite"),
        placed(250, 620, 12, "long i"),
        placed(420, 620, 12, "Fly a kite."),
    ]])
}

/// `count` pages, each with one numbered line.
pub fn multi_page_pdf(count: usize) -> Vec<u8> {
    let texts: Vec<String> = (1..=count).map(|n| format!("Page {} practice", n)).collect();
    let pages: Vec<Vec<Placed<'_>>> = texts
        .iter()
        .map(|text| vec![placed(72, 720, 12, text)])
        .collect();
    build_pdf(&pages)
}
