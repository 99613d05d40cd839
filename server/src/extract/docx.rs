//! DOCX text extraction
//!
//! A .docx file is a ZIP container; the body lives in `word/document.xml`
//! as WordprocessingML. Text is the concatenation of `w:t` runs, with one
//! newline per paragraph.

use crate::error::{AppError, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};

const DOCUMENT_PART: &str = "word/document.xml";

pub fn extract_docx_text(data: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))
        .map_err(|e| AppError::Extraction(format!("Not a DOCX container: {}", e)))?;

    let xml = {
        let mut part = archive
            .by_name(DOCUMENT_PART)
            .map_err(|e| AppError::Extraction(format!("Missing {}: {}", DOCUMENT_PART, e)))?;
        let mut xml = String::new();
        part.read_to_string(&mut xml)
            .map_err(|e| AppError::Extraction(format!("Unreadable {}: {}", DOCUMENT_PART, e)))?;
        xml
    };

    document_xml_to_text(&xml)
}

fn document_xml_to_text(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    // Tab stops in paragraph properties are also `w:tab`, only runs count
    let mut in_run = false;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| AppError::Extraction(format!("Malformed document XML: {}", e)))?;

        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"w:r" => in_run = true,
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:r" => in_run = false,
                b"w:t" => in_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" if in_run => text.push('\t'),
                b"w:br" | b"w:cr" if in_run => text.push('\n'),
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => {
                let unescaped = t
                    .unescape()
                    .map_err(|e| AppError::Extraction(format!("Bad text run: {}", e)))?;
                text.push_str(&unescaped);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn build_docx(document_xml: &str) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(DOCUMENT_PART, FileOptions::<()>::default()).unwrap();
        zip.write_all(document_xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    fn body(paragraphs: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            paragraphs
        )
    }

    #[test]
    fn test_paragraphs_and_runs() {
        let xml = body(
            r#"<w:p><w:r><w:t>Photosynthesis</w:t></w:r><w:r><w:t xml:space="preserve"> converts light.</w:t></w:r></w:p>
<w:p><w:r><w:t>Chlorophyll &amp; carotenoids</w:t></w:r></w:p>"#,
        );

        let text = extract_docx_text(&build_docx(&xml)).unwrap();

        assert_eq!(text, "Photosynthesis converts light.\nChlorophyll & carotenoids\n");
    }

    #[test]
    fn test_tabs_breaks_and_tab_stops() {
        let xml = body(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>Term</w:t><w:tab/><w:t>Definition</w:t><w:br/><w:t>Next line</w:t></w:r></w:p><w:p/>"#,
        );

        let text = extract_docx_text(&build_docx(&xml)).unwrap();

        assert_eq!(text, "Term\tDefinition\nNext line\n\n");
    }

    #[test]
    fn test_not_a_zip() {
        let err = extract_docx_text(b"plain text pretending").unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }

    #[test]
    fn test_zip_without_document_part() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/styles.xml", FileOptions::<()>::default()).unwrap();
        zip.write_all(b"<w:styles/>").unwrap();
        let data = zip.finish().unwrap().into_inner();

        let err = extract_docx_text(&data).unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
    }
}
