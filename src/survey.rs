//! Survey-definition (`.lss`) parsing.
//!
//! A survey definition is an XML `<document>` whose sections are tables dumped
//! row by row. Only two sections matter for importing responses:
//!
//! - `<questions>`: one row per top-level question (`sid`, `gid`, `qid`,
//!   `type`, `title`, `other`).
//! - `<subquestions>`: one row per subquestion (`parent_qid`, `gid`, `qid`,
//!   `title`, `scale_id`), attached to the question with the same
//!   `(qid, gid)` as its `(parent_qid, gid)`.
//!
//! Parsing is a pure function of the input bytes.

use std::fmt;

use log::{debug, warn};
use roxmltree::{Document, Node};
use serde::Serialize;

use crate::error::SchemaError;

/// Question type codes as they appear in the `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuestionType {
    ArrayDualScale,
    FivePointChoice,
    ArrayFivePoint,
    ArrayTenPoint,
    ArrayYesUncertainNo,
    Date,
    ArrayIncreaseSameDecrease,
    Array,
    Gender,
    ArrayByColumn,
    LanguageSwitch,
    MultipleNumerical,
    List,
    MultipleChoice,
    Numerical,
    ListWithComment,
    MultipleChoiceWithComments,
    MultipleShortText,
    Ranking,
    ShortText,
    LongText,
    HugeText,
    TextDisplay,
    YesNo,
    ListDropdown,
    ArrayNumbers,
    ArrayTexts,
    FileUpload,
    Equation,
}

impl QuestionType {
    pub fn from_code(code: &str) -> Result<Self, SchemaError> {
        let kind = match code {
            "1" => QuestionType::ArrayDualScale,
            "5" => QuestionType::FivePointChoice,
            "A" => QuestionType::ArrayFivePoint,
            "B" => QuestionType::ArrayTenPoint,
            "C" => QuestionType::ArrayYesUncertainNo,
            "D" => QuestionType::Date,
            "E" => QuestionType::ArrayIncreaseSameDecrease,
            "F" => QuestionType::Array,
            "G" => QuestionType::Gender,
            "H" => QuestionType::ArrayByColumn,
            "I" => QuestionType::LanguageSwitch,
            "K" => QuestionType::MultipleNumerical,
            "L" => QuestionType::List,
            "M" => QuestionType::MultipleChoice,
            "N" => QuestionType::Numerical,
            "O" => QuestionType::ListWithComment,
            "P" => QuestionType::MultipleChoiceWithComments,
            "Q" => QuestionType::MultipleShortText,
            "R" => QuestionType::Ranking,
            "S" => QuestionType::ShortText,
            "T" => QuestionType::LongText,
            "U" => QuestionType::HugeText,
            "X" => QuestionType::TextDisplay,
            "Y" => QuestionType::YesNo,
            "!" => QuestionType::ListDropdown,
            ":" => QuestionType::ArrayNumbers,
            ";" => QuestionType::ArrayTexts,
            "|" => QuestionType::FileUpload,
            "*" => QuestionType::Equation,
            other => return Err(SchemaError::UnknownQuestionType(other.to_string())),
        };
        Ok(kind)
    }

    pub fn code(&self) -> char {
        match self {
            QuestionType::ArrayDualScale => '1',
            QuestionType::FivePointChoice => '5',
            QuestionType::ArrayFivePoint => 'A',
            QuestionType::ArrayTenPoint => 'B',
            QuestionType::ArrayYesUncertainNo => 'C',
            QuestionType::Date => 'D',
            QuestionType::ArrayIncreaseSameDecrease => 'E',
            QuestionType::Array => 'F',
            QuestionType::Gender => 'G',
            QuestionType::ArrayByColumn => 'H',
            QuestionType::LanguageSwitch => 'I',
            QuestionType::MultipleNumerical => 'K',
            QuestionType::List => 'L',
            QuestionType::MultipleChoice => 'M',
            QuestionType::Numerical => 'N',
            QuestionType::ListWithComment => 'O',
            QuestionType::MultipleChoiceWithComments => 'P',
            QuestionType::MultipleShortText => 'Q',
            QuestionType::Ranking => 'R',
            QuestionType::ShortText => 'S',
            QuestionType::LongText => 'T',
            QuestionType::HugeText => 'U',
            QuestionType::TextDisplay => 'X',
            QuestionType::YesNo => 'Y',
            QuestionType::ListDropdown => '!',
            QuestionType::ArrayNumbers => ':',
            QuestionType::ArrayTexts => ';',
            QuestionType::FileUpload => '|',
            QuestionType::Equation => '*',
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Axis of a subquestion. Only dual-axis arrays use [`Scale::Secondary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Scale {
    Primary,
    Secondary,
}

impl Scale {
    fn parse(raw: &str) -> Result<Self, SchemaError> {
        match raw {
            "0" => Ok(Scale::Primary),
            "1" => Ok(Scale::Secondary),
            other => Err(SchemaError::InvalidScale(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subquestion {
    pub qid: u64,
    pub title: String,
    pub scale: Scale,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub kind: QuestionType,
    pub gid: u64,
    pub qid: u64,
    pub title: String,
    pub has_other: bool,
    pub subquestions: Vec<Subquestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveySchema {
    pub survey_id: u64,
    pub questions: Vec<Question>,
}

impl SurveySchema {
    /// Name of the response table this survey writes into.
    pub fn table_name(&self) -> String {
        format!("survey_{}", self.survey_id)
    }
}

pub fn parse_survey(bytes: &[u8]) -> Result<SurveySchema, SchemaError> {
    let text = std::str::from_utf8(bytes)?;
    let document = Document::parse(text)?;
    let root = document.root_element();
    if root.tag_name().name() != "document" {
        return Err(SchemaError::UnexpectedRoot(
            root.tag_name().name().to_string(),
        ));
    }

    let question_rows =
        section_rows(root, "questions").ok_or(SchemaError::MissingSection("questions"))?;

    let mut survey_id: Option<u64> = None;
    let mut questions: Vec<Question> = Vec::with_capacity(question_rows.len());
    for (idx, row) in question_rows.iter().enumerate() {
        let fields = RowFields::new(*row, "questions", idx + 1);
        let sid = fields.number("sid")?;
        if let Some(previous) = survey_id.filter(|previous| *previous != sid) {
            warn!("Question rows disagree on survey id ({previous} vs {sid}); keeping {sid}");
        }
        survey_id = Some(sid);

        let gid = fields.number("gid")?;
        let qid = fields.number("qid")?;
        let question = Question {
            kind: QuestionType::from_code(fields.required("type")?)?,
            gid,
            qid,
            title: fields.required("title")?.to_string(),
            has_other: fields.optional("other") == Some("Y"),
            subquestions: Vec::new(),
        };
        // Multilingual exports repeat each question once per language.
        if let Some(existing) = questions.iter().find(|q| q.gid == gid && q.qid == qid) {
            if *existing != question {
                return Err(SchemaError::DuplicateQuestion { gid, qid });
            }
            debug!("Skipping repeated row for question {qid} in group {gid}");
            continue;
        }
        questions.push(question);
    }
    let survey_id = survey_id.ok_or(SchemaError::NoQuestions)?;

    let subquestion_rows = section_rows(root, "subquestions").unwrap_or_default();
    for (idx, row) in subquestion_rows.iter().enumerate() {
        let fields = RowFields::new(*row, "subquestions", idx + 1);
        let parent_qid = fields.number("parent_qid")?;
        let gid = fields.number("gid")?;
        let qid = fields.number("qid")?;
        let scale = match fields.optional("scale_id") {
            Some(raw) => Scale::parse(raw)?,
            None => Scale::Primary,
        };
        let parent = questions
            .iter_mut()
            .find(|q| q.qid == parent_qid && q.gid == gid)
            .ok_or(SchemaError::ParentNotFound {
                qid,
                parent_qid,
                gid,
            })?;
        let subquestion = Subquestion {
            qid,
            title: fields.required("title")?.to_string(),
            scale,
        };
        if let Some(existing) = parent.subquestions.iter().find(|sq| sq.qid == qid) {
            if *existing != subquestion {
                return Err(SchemaError::DuplicateSubquestion { qid, parent_qid });
            }
            debug!("Skipping repeated row for subquestion {qid} of question {parent_qid}");
            continue;
        }
        parent.subquestions.push(subquestion);
    }

    debug!(
        "Parsed survey {survey_id}: {} question(s), {} subquestion(s)",
        questions.len(),
        questions.iter().map(|q| q.subquestions.len()).sum::<usize>()
    );
    Ok(SurveySchema {
        survey_id,
        questions,
    })
}

fn section_rows<'a, 'input>(
    root: Node<'a, 'input>,
    section: &str,
) -> Option<Vec<Node<'a, 'input>>> {
    let section = child_element(root, section)?;
    let rows = child_element(section, "rows")
        .map(|rows| {
            rows.children()
                .filter(|node| node.is_element() && node.has_tag_name("row"))
                .collect()
        })
        .unwrap_or_default();
    Some(rows)
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.has_tag_name(name))
}

struct RowFields<'a, 'input> {
    row: Node<'a, 'input>,
    section: &'static str,
    index: usize,
}

impl<'a, 'input> RowFields<'a, 'input> {
    fn new(row: Node<'a, 'input>, section: &'static str, index: usize) -> Self {
        Self {
            row,
            section,
            index,
        }
    }

    fn optional(&self, field: &str) -> Option<&'a str> {
        child_element(self.row, field)
            .and_then(|node| node.text())
            .map(str::trim)
    }

    fn required(&self, field: &'static str) -> Result<&'a str, SchemaError> {
        self.optional(field)
            .filter(|value| !value.is_empty())
            .ok_or(SchemaError::MissingField {
                section: self.section,
                row: self.index,
                field,
            })
    }

    fn number(&self, field: &'static str) -> Result<u64, SchemaError> {
        let raw = self.required(field)?;
        raw.parse::<u64>().map_err(|_| SchemaError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
    }
}
