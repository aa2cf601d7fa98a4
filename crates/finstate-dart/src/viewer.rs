//! Section index of a filing as published by the DART viewer.
//!
//! The viewer page (`dsaf001/main.do`) builds its table of contents from inline
//! script assignments such as `node1['text'] = "II. 사업의 내용";`, one block per
//! section. Each block carries the coordinates of the section's HTML rendering.

use finstate_core::SubDocument;
use regex::Regex;
use std::sync::LazyLock;

/// Viewer page of a filing.
pub(crate) const MAIN_URL: &str = "https://dart.fss.or.kr/dsaf001/main.do";

/// Renders one section of a filing.
const SECTION_URL: &str = "https://dart.fss.or.kr/report/viewer.do";

static NODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"node\d+\['text'\]\s*=\s*"(?P<text>[^"]*)";\s*"#,
        r#"node\d+\['id'\]\s*=\s*"\d*";\s*"#,
        r#"node\d+\['rcpNo'\]\s*=\s*"(?P<rcp>\d*)";\s*"#,
        r#"node\d+\['dcmNo'\]\s*=\s*"(?P<dcm>\d*)";\s*"#,
        r#"node\d+\['eleId'\]\s*=\s*"(?P<ele>\d*)";\s*"#,
        r#"node\d+\['offset'\]\s*=\s*"(?P<offset>\d*)";\s*"#,
        r#"node\d+\['length'\]\s*=\s*"(?P<length>\d*)";\s*"#,
        r#"node\d+\['dtd'\]\s*=\s*"(?P<dtd>[^"]*)";"#,
    ))
    .expect("viewer node regex")
});

/// Parses every section of a viewer page, in document order.
pub(crate) fn parse_sections(html: &str, rcept_no: &str) -> Vec<SubDocument> {
    NODE_RE
        .captures_iter(html)
        .map(|caps| {
            let rcp = match &caps["rcp"] {
                "" => rcept_no,
                rcp => rcp,
            };
            SubDocument {
                title: clean_title(&caps["text"]),
                url: format!(
                    "{}?rcpNo={}&dcmNo={}&eleId={}&offset={}&length={}&dtd={}",
                    SECTION_URL,
                    rcp,
                    &caps["dcm"],
                    &caps["ele"],
                    &caps["offset"],
                    &caps["length"],
                    &caps["dtd"]
                ),
            }
        })
        .collect()
}

/// Moves sections whose title contains `text_match` to the front.
///
/// Document order is kept within both groups. An empty match keeps every section
/// where it is.
pub(crate) fn rank_sections(sections: Vec<SubDocument>, text_match: &str) -> Vec<SubDocument> {
    if text_match.is_empty() {
        return sections;
    }
    let needle = normalize(text_match);
    let (mut hits, misses): (Vec<_>, Vec<_>) = sections
        .into_iter()
        .partition(|s| normalize(&s.title).contains(&needle));
    hits.extend(misses);
    hits
}

fn clean_title(raw: &str) -> String {
    raw.replace("&nbsp;", " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// Titles differ in spacing between filings ("주식의 총수" vs "주식의총수").
fn normalize(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}
