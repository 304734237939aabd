#![allow(dead_code)]

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// Lays out each page's lines top to bottom in a Courier text block.
fn build_report_pdf(pages: &[Vec<String>]) -> Result<Document, Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids = Vec::new();
    for lines in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("TL", vec![14.into()]),
            Operation::new("Td", vec![40.into(), 800.into()]),
        ];
        for line in lines {
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(line.as_str())],
            ));
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        page_ids.push(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        }));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();
    Ok(doc)
}

pub fn report_pdf_bytes(pages: &[Vec<String>]) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut doc = build_report_pdf(pages)?;
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

pub fn write_report_pdf(path: &Path, pages: &[Vec<String>]) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = build_report_pdf(pages)?;
    doc.save(path)?;
    Ok(())
}

/// A single-page BAKU daily mud report with two running pumps and two shakers.
pub fn baku_report(well: &str, date: &str, mud_weight: &str) -> Vec<Vec<String>> {
    vec![
        vec![
            "BAKU STATE DAILY MUD REPORT".to_string(),
            format!("Well Name: {well} Field: Absheron"),
            format!("Report #17 {date}"),
            format!("MUD WT {mud_weight} ppg"),
            "PV = 12 cP".to_string(),
            "YP = 8 lb/100ft2".to_string(),
            "PUMP #1 310 gpm".to_string(),
            "PUMP #2 290 gpm".to_string(),
            "Screens API 140 ppb".to_string(),
            "Shaker 1  Shaker 2".to_string(),
        ],
    ]
}
