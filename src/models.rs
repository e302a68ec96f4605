use crate::schema::questions;
use chrono::{DateTime, Utc};
use failure::Fail;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Question kind as exposed on the API (`OPEN`/`MCQ`). The database keeps
/// its own labels; translation happens only at this boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "OPEN")]
    Open,
    #[serde(rename = "MCQ")]
    Mcq,
}

impl QuestionType {
    pub fn db_label(self) -> &'static str {
        match self {
            QuestionType::Open => "discursiva",
            QuestionType::Mcq => "multipla_escolha",
        }
    }

    /// Rows predating the type column may hold anything; unknown labels
    /// read as open-answer.
    pub fn from_db_label(label: &str) -> QuestionType {
        if label == "multipla_escolha" {
            QuestionType::Mcq
        } else {
            QuestionType::Open
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QuestionType::Open => write!(f, "OPEN"),
            QuestionType::Mcq => write!(f, "MCQ"),
        }
    }
}

impl FromStr for QuestionType {
    type Err = failure::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "OPEN" => Ok(QuestionType::Open),
            "MCQ" => Ok(QuestionType::Mcq),
            _ => Err(failure::format_err!("unknown question type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(rename = "facil")]
    Facil,
    #[serde(rename = "medio")]
    Medio,
    #[serde(rename = "dificil")]
    Dificil,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Facil => "facil",
            Difficulty::Medio => "medio",
            Difficulty::Dificil => "dificil",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = failure::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "facil" => Ok(Difficulty::Facil),
            "medio" => Ok(Difficulty::Medio),
            "dificil" => Ok(Difficulty::Dificil),
            _ => Err(failure::format_err!("unknown difficulty: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Queryable)]
pub struct Question {
    pub id: i32,
    pub text: String,
    pub difficulty: String,
    pub type_: String,
    pub answer: String,
    pub options: Option<Vec<String>>,
    pub correct_index: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

/// Wire form of a question row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionJson {
    pub id: i32,
    pub text: String,
    pub difficulty: String,
    #[serde(rename = "type")]
    pub type_: QuestionType,
    pub answer: String,
    pub options: Option<Vec<String>>,
    pub correct_index: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl From<Question> for QuestionJson {
    fn from(q: Question) -> QuestionJson {
        QuestionJson {
            id: q.id,
            text: q.text,
            difficulty: q.difficulty,
            type_: QuestionType::from_db_label(&q.type_),
            answer: q.answer,
            options: q.options,
            correct_index: q.correct_index,
            created_at: q.created_at,
            used_at: q.used_at,
        }
    }
}

/// Create/update payload as received from the API, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    pub text: String,
    pub difficulty: Option<Difficulty>,
    #[serde(rename = "type")]
    pub type_: Option<QuestionType>,
    pub answer: Option<String>,
    pub options: Option<Vec<String>>,
    pub correct_index: Option<i32>,
}

#[derive(Debug, PartialEq, Fail)]
pub enum ValidationError {
    #[fail(display = "question text is required")]
    EmptyText,
    #[fail(display = "multiple choice questions need 4 filled-in options (A, B, C and D)")]
    BadOptions,
    #[fail(display = "correctIndex must be between 0 and 3")]
    BadCorrectIndex,
    #[fail(display = "answer is required for open questions")]
    MissingAnswer,
}

/// A payload that passed validation and upholds the per-type invariants:
/// MCQ rows carry exactly 4 non-empty options and an in-range index, open
/// rows carry a non-empty answer and no options.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionData {
    pub text: String,
    pub difficulty: Difficulty,
    pub type_: QuestionType,
    pub answer: String,
    pub options: Option<Vec<String>>,
    pub correct_index: Option<i32>,
}

impl QuestionInput {
    pub fn validate(self) -> Result<QuestionData, ValidationError> {
        let text = self.text.trim().to_owned();
        if text.is_empty() {
            return Err(ValidationError::EmptyText);
        }
        let type_ = self.type_.unwrap_or(QuestionType::Open);
        let difficulty = self.difficulty.unwrap_or(Difficulty::Facil);
        let answer = self
            .answer
            .map(|a| a.trim().to_owned())
            .filter(|a| !a.is_empty());
        match type_ {
            QuestionType::Mcq => {
                let options = self
                    .options
                    .unwrap_or_default()
                    .iter()
                    .map(|o| o.trim().to_owned())
                    .collect::<Vec<_>>();
                if options.len() != 4 || options.iter().any(|o| o.is_empty()) {
                    return Err(ValidationError::BadOptions);
                }
                let correct_index = self.correct_index.unwrap_or(0);
                if !(0..=3).contains(&correct_index) {
                    return Err(ValidationError::BadCorrectIndex);
                }
                let answer = answer.unwrap_or_else(|| options[correct_index as usize].clone());
                Ok(QuestionData {
                    text,
                    difficulty,
                    type_,
                    answer,
                    options: Some(options),
                    correct_index: Some(correct_index),
                })
            }
            QuestionType::Open => {
                let answer = answer.ok_or(ValidationError::MissingAnswer)?;
                Ok(QuestionData {
                    text,
                    difficulty,
                    type_,
                    answer,
                    options: None,
                    correct_index: None,
                })
            }
        }
    }
}

/// Insert/replace form of a validated question. `created_at` and `used_at`
/// are deliberately absent: the former is set by the table default, the
/// latter belongs to the consumption gate alone.
#[derive(Insertable, AsChangeset)]
#[table_name = "questions"]
#[changeset_options(treat_none_as_null = "true")]
pub struct QuestionRecord<'a> {
    pub text: &'a str,
    pub difficulty: &'a str,
    pub type_: &'a str,
    pub answer: &'a str,
    pub options: Option<Vec<String>>,
    pub correct_index: Option<i32>,
}

impl QuestionData {
    pub fn as_record(&self) -> QuestionRecord {
        QuestionRecord {
            text: &self.text,
            difficulty: self.difficulty.as_str(),
            type_: self.type_.db_label(),
            answer: &self.answer,
            options: self.options.clone(),
            correct_index: self.correct_index,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPage {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
    pub count: usize,
    pub data: Vec<QuestionJson>,
}

#[derive(Debug, Serialize)]
pub struct DrawResponse {
    pub limit: i64,
    pub count: usize,
    pub data: Vec<QuestionJson>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UseResponse {
    pub message: String,
    pub id: i32,
    pub used_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiMessage {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mcq_input() -> QuestionInput {
        QuestionInput {
            text: "What is the capital of Brazil?".into(),
            difficulty: Some(Difficulty::Facil),
            type_: Some(QuestionType::Mcq),
            answer: None,
            options: Some(vec!["A".into(), "B".into(), "C".into(), "D".into()]),
            correct_index: Some(2),
        }
    }

    #[test]
    fn mcq_answer_derived_from_correct_index() {
        let data = mcq_input().validate().unwrap();
        assert_eq!(data.answer, "C");
        assert_eq!(data.correct_index, Some(2));
        assert_eq!(data.options.as_ref().unwrap().len(), 4);
    }

    #[test]
    fn mcq_explicit_answer_kept() {
        let mut input = mcq_input();
        input.answer = Some("  C  ".into());
        let data = input.validate().unwrap();
        assert_eq!(data.answer, "C");
    }

    #[test]
    fn mcq_options_trimmed() {
        let mut input = mcq_input();
        input.options = Some(vec![" A ".into(), "B".into(), "C ".into(), " D".into()]);
        let data = input.validate().unwrap();
        assert_eq!(
            data.options.unwrap(),
            vec!["A".to_owned(), "B".into(), "C".into(), "D".into()]
        );
    }

    #[test]
    fn mcq_needs_four_options() {
        let mut input = mcq_input();
        input.options = Some(vec!["A".into(), "B".into(), "C".into()]);
        assert_eq!(input.validate(), Err(ValidationError::BadOptions));
        let mut input = mcq_input();
        input.options = None;
        assert_eq!(input.validate(), Err(ValidationError::BadOptions));
    }

    #[test]
    fn mcq_rejects_blank_option() {
        let mut input = mcq_input();
        input.options = Some(vec!["A".into(), "   ".into(), "C".into(), "D".into()]);
        assert_eq!(input.validate(), Err(ValidationError::BadOptions));
    }

    #[test]
    fn mcq_rejects_out_of_range_index() {
        let mut input = mcq_input();
        input.correct_index = Some(4);
        assert_eq!(input.validate(), Err(ValidationError::BadCorrectIndex));
        let mut input = mcq_input();
        input.correct_index = Some(-1);
        assert_eq!(input.validate(), Err(ValidationError::BadCorrectIndex));
    }

    #[test]
    fn mcq_missing_index_defaults_to_zero() {
        let mut input = mcq_input();
        input.correct_index = None;
        let data = input.validate().unwrap();
        assert_eq!(data.correct_index, Some(0));
        assert_eq!(data.answer, "A");
    }

    #[test]
    fn open_requires_answer() {
        let input = QuestionInput {
            text: "Explain HTML.".into(),
            ..Default::default()
        };
        assert_eq!(input.validate(), Err(ValidationError::MissingAnswer));
    }

    #[test]
    fn open_has_no_options() {
        let input = QuestionInput {
            text: "Explain HTML.".into(),
            answer: Some("a markup language".into()),
            options: Some(vec!["x".into(); 4]),
            correct_index: Some(1),
            ..Default::default()
        };
        let data = input.validate().unwrap();
        assert_eq!(data.type_, QuestionType::Open);
        assert_eq!(data.options, None);
        assert_eq!(data.correct_index, None);
    }

    #[test]
    fn blank_text_rejected() {
        let input = QuestionInput {
            text: "   ".into(),
            answer: Some("42".into()),
            ..Default::default()
        };
        assert_eq!(input.validate(), Err(ValidationError::EmptyText));
    }

    #[test]
    fn type_labels_round_trip() {
        assert_eq!(QuestionType::Mcq.db_label(), "multipla_escolha");
        assert_eq!(QuestionType::Open.db_label(), "discursiva");
        assert_eq!(
            QuestionType::from_db_label("multipla_escolha"),
            QuestionType::Mcq
        );
        assert_eq!(QuestionType::from_db_label("discursiva"), QuestionType::Open);
        // legacy rows with junk in the column read as open-answer
        assert_eq!(QuestionType::from_db_label("whatever"), QuestionType::Open);
    }

    #[test]
    fn input_uses_camel_case_wire_names() {
        let input: QuestionInput = serde_json::from_str(
            r#"{"text":"q","type":"MCQ","options":["a","b","c","d"],"correctIndex":1}"#,
        )
        .unwrap();
        assert_eq!(input.type_, Some(QuestionType::Mcq));
        assert_eq!(input.correct_index, Some(1));
        let data = input.validate().unwrap();
        assert_eq!(data.answer, "b");
    }
}
