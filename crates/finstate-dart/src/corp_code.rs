//! Parsing of the bulk `corpCode.xml` directory download.
//!
//! OpenDART ships the directory as a zip archive holding a single XML file:
//!
//! ```xml
//! <result>
//!   <list>
//!     <corp_code>00126380</corp_code>
//!     <corp_name>삼성전자</corp_name>
//!     <stock_code>005930</stock_code>
//!     <modify_date>20230110</modify_date>
//!   </list>
//! </result>
//! ```

use finstate_core::{CorpEntry, DataError, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Extracts the XML document from the downloaded archive.
pub(crate) fn unpack_archive(bytes: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| DataError::Parse(format!("corpCode archive: {}", e)))?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| DataError::Parse(format!("corpCode archive entry: {}", e)))?;
        if !file.name().to_ascii_lowercase().ends_with(".xml") {
            continue;
        }

        let mut xml = String::new();
        file.read_to_string(&mut xml)
            .map_err(|e| DataError::Parse(format!("corpCode archive entry: {}", e)))?;
        return Ok(xml);
    }

    Err(DataError::Parse(
        "corpCode archive holds no XML file".to_string(),
    ))
}

/// Parses the directory XML into entries, in document order.
pub(crate) fn parse_corp_codes(xml: &str) -> Result<Vec<CorpEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<CorpEntry> = None;
    let mut field: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "list" {
                    current = Some(CorpEntry {
                        corp_code: String::new(),
                        corp_name: String::new(),
                        stock_code: None,
                        modify_date: None,
                    });
                } else {
                    field = Some(name);
                }
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| DataError::Parse(format!("corpCode XML: {}", e)))?;
                let text = text.trim();
                if let (Some(entry), Some(name)) = (current.as_mut(), field.as_deref()) {
                    set_field(entry, name, text);
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"list" {
                    if let Some(entry) = current.take() {
                        if !entry.corp_code.is_empty() {
                            entries.push(entry);
                        }
                    }
                }
                field = None;
            }
            Ok(_) => {}
            Err(e) => {
                return Err(DataError::Parse(format!(
                    "corpCode XML at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
        }
        buf.clear();
    }

    Ok(entries)
}

fn set_field(entry: &mut CorpEntry, name: &str, text: &str) {
    let optional = || (!text.is_empty()).then(|| text.to_string());
    match name {
        "corp_code" => entry.corp_code = text.to_string(),
        "corp_name" => entry.corp_name = text.to_string(),
        "stock_code" => entry.stock_code = optional(),
        "modify_date" => entry.modify_date = optional(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<result>
    <list>
        <corp_code>00434003</corp_code>
        <corp_name>다코</corp_name>
        <stock_code> </stock_code>
        <modify_date>20170630</modify_date>
    </list>
    <list>
        <corp_code>00126380</corp_code>
        <corp_name>삼성전자</corp_name>
        <stock_code>005930</stock_code>
        <modify_date>20230110</modify_date>
    </list>
    <list>
        <corp_code>00164779</corp_code>
        <corp_name>SK하이닉스 &amp; Co</corp_name>
        <stock_code>000660</stock_code>
        <modify_date>20230221</modify_date>
    </list>
</result>"#;

    #[test]
    fn test_parse_corp_codes() {
        let entries = parse_corp_codes(SAMPLE).unwrap();
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].corp_code, "00434003");
        assert_eq!(entries[0].stock_code, None);
        assert_eq!(entries[0].modify_date.as_deref(), Some("20170630"));

        assert_eq!(entries[1].corp_name, "삼성전자");
        assert_eq!(entries[1].stock_code.as_deref(), Some("005930"));

        assert_eq!(entries[2].corp_name, "SK하이닉스 & Co");
    }

    #[test]
    fn test_unlisted_entries_have_no_company() {
        let entries = parse_corp_codes(SAMPLE).unwrap();
        assert!(entries[0].to_company().is_none());
        assert_eq!(
            entries[1].to_company().unwrap().ticker.as_str(),
            "005930"
        );
    }

    #[test]
    fn test_parse_malformed_xml() {
        let result = parse_corp_codes("<result><list><corp_code>1</list></result>");
        assert!(matches!(result, Err(DataError::Parse(_))));
    }

    #[test]
    fn test_unpack_rejects_non_zip() {
        let result = unpack_archive(b"not a zip archive");
        assert!(matches!(result, Err(DataError::Parse(_))));
    }
}
