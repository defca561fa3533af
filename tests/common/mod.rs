#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook};
use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

pub fn fixture_bytes(name: &str) -> Vec<u8> {
    fs::read(fixture_path(name)).expect("read fixture")
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }
}

/// One `<questions>` row: `(sid, gid, qid, type, title, other)`.
pub type QuestionRow<'a> = (u64, u64, u64, &'a str, &'a str, &'a str);

/// One `<subquestions>` row: `(parent_qid, gid, qid, title, scale_id)`.
pub type SubquestionRow<'a> = (u64, u64, u64, &'a str, u8);

/// Renders a minimal survey definition with the given rows.
pub fn survey_xml(questions: &[QuestionRow], subquestions: &[SubquestionRow]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<document>\n");
    xml.push_str(" <LimeSurveyDocType>Survey</LimeSurveyDocType>\n <questions>\n  <rows>\n");
    for (sid, gid, qid, kind, title, other) in questions {
        xml.push_str(&format!(
            "   <row><qid><![CDATA[{qid}]]></qid><parent_qid><![CDATA[0]]></parent_qid><sid><![CDATA[{sid}]]></sid><gid><![CDATA[{gid}]]></gid><type><![CDATA[{kind}]]></type><title><![CDATA[{title}]]></title><other><![CDATA[{other}]]></other></row>\n"
        ));
    }
    xml.push_str("  </rows>\n </questions>\n");
    if !subquestions.is_empty() {
        xml.push_str(" <subquestions>\n  <rows>\n");
        for (parent_qid, gid, qid, title, scale) in subquestions {
            xml.push_str(&format!(
                "   <row><qid><![CDATA[{qid}]]></qid><parent_qid><![CDATA[{parent_qid}]]></parent_qid><gid><![CDATA[{gid}]]></gid><title><![CDATA[{title}]]></title><scale_id><![CDATA[{scale}]]></scale_id></row>\n"
            ));
        }
        xml.push_str("  </rows>\n </subquestions>\n");
    }
    xml.push_str("</document>\n");
    xml
}

/// A cell written into a generated workbook.
#[derive(Debug, Clone)]
pub enum Cell {
    Empty,
    Text(&'static str),
    Number(f64),
    /// A number shown through an Excel number format such as `yyyy-mm-dd`.
    Formatted(f64, &'static str),
}

/// Builds an xlsx workbook whose first sheet holds `rows`; extra sheets get a
/// single decoy header so tests can prove only the first sheet is read.
pub fn workbook_bytes(rows: &[Vec<Cell>], extra_sheets: usize) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            match cell {
                Cell::Empty => {}
                Cell::Text(text) => {
                    sheet
                        .write_string(r as u32, c as u16, *text)
                        .expect("write string");
                }
                Cell::Number(value) => {
                    sheet
                        .write_number(r as u32, c as u16, *value)
                        .expect("write number");
                }
                Cell::Formatted(value, num_format) => {
                    let format = Format::new().set_num_format(*num_format);
                    sheet
                        .write_number_with_format(r as u32, c as u16, *value, &format)
                        .expect("write formatted number");
                }
            }
        }
    }
    for _ in 0..extra_sheets {
        let decoy = workbook.add_worksheet();
        decoy.write_string(0, 0, "decoy").expect("write decoy");
    }
    workbook.save_to_buffer().expect("save workbook")
}
