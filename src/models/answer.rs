// src/models/answer.rs

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::question::{Question, QuestionType};

/// A student's recorded answer, shaped by the question type.
///
/// A single-choice answer cannot hold two options and a short answer is
/// exactly one string, so there is no "which of several values counts"
/// question left for the grader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum AnswerValue {
    Single(String),
    Multi(BTreeSet<String>),
    Short(String),
}

impl AnswerValue {
    /// The answer under set semantics, as the grader compares it.
    pub fn values(&self) -> BTreeSet<&str> {
        match self {
            AnswerValue::Single(v) | AnswerValue::Short(v) => BTreeSet::from([v.as_str()]),
            AnswerValue::Multi(set) => set.iter().map(String::as_str).collect(),
        }
    }

    /// Flat list form used by the session view.
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            AnswerValue::Single(v) | AnswerValue::Short(v) => vec![v.clone()],
            AnswerValue::Multi(set) => set.iter().cloned().collect(),
        }
    }

    /// Interprets an answer-change event for `question`.
    ///
    /// `Ok(None)` means the event clears the answer. Choice values must be
    /// options of the question; a short answer takes one raw string, kept
    /// verbatim.
    pub fn from_payload(question: &Question, payload: AnswerPayload) -> Result<Option<Self>, AppError> {
        let mut values = payload.values;

        if question.question_type.has_options() {
            if let Some(unknown) = values.iter().find(|v| !question.has_option(v)) {
                return Err(AppError::BadRequest(format!(
                    "'{}' is not an option of question {}",
                    unknown, question.id
                )));
            }
        }

        let value = match question.question_type {
            // Last write wins when a client sends more than one.
            QuestionType::SingleChoice => values.pop().map(AnswerValue::Single),
            QuestionType::MultiChoice => {
                let set: BTreeSet<String> = values.into_iter().collect();
                (!set.is_empty()).then_some(AnswerValue::Multi(set))
            }
            QuestionType::ShortAnswer => {
                if values.len() > 1 {
                    return Err(AppError::BadRequest(format!(
                        "Question {} takes a single text answer",
                        question.id
                    )));
                }
                values
                    .pop()
                    .filter(|text| !text.is_empty())
                    .map(AnswerValue::Short)
            }
        };

        Ok(value)
    }
}

/// Answer-change event as sent by the client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerPayload {
    #[serde(default)]
    pub values: Vec<String>,
}

impl AnswerPayload {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Per-attempt mapping from question id to the recorded answer.
/// Unanswered questions have no entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AnswerStore {
    entries: BTreeMap<String, AnswerValue>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, question_id: &str) -> Option<&AnswerValue> {
        self.entries.get(question_id)
    }

    /// Inserts, replaces or (with `None`) removes the entry.
    pub fn record(&mut self, question_id: &str, value: Option<AnswerValue>) {
        match value {
            Some(v) => {
                self.entries.insert(question_id.to_string(), v);
            }
            None => {
                self.entries.remove(question_id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnswerValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, AnswerValue)> for AnswerStore {
    fn from_iter<T: IntoIterator<Item = (K, AnswerValue)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
