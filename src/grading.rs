// src/grading.rs

use serde::Serialize;

use crate::models::{answer::AnswerStore, exam::Exam};

/// Outcome of grading one attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeReport {
    pub correct_count: usize,
    pub total_questions: usize,
    /// Percentage in [0, 100], full precision.
    pub score: f64,
    pub verdicts: Vec<QuestionVerdict>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionVerdict {
    pub question_id: String,
    pub correct: bool,
}

impl GradeReport {
    /// Score rounded to two decimals for display, e.g. `"66.67"`.
    pub fn display_score(&self) -> String {
        format!("{:.2}", self.score)
    }
}

/// Grades `answers` against the answer key of `exam`.
///
/// A question counts as correct when the submitted values, taken as a set,
/// equal the set of correct answers. An unanswered question is always
/// wrong, even when its answer key is empty. Strings are compared exactly:
/// no trimming, no case folding.
pub fn grade(exam: &Exam, answers: &AnswerStore) -> GradeReport {
    let verdicts: Vec<QuestionVerdict> = exam
        .questions()
        .iter()
        .map(|question| {
            let correct = answers
                .get(&question.id)
                .is_some_and(|answer| answer.values() == question.correct_set());
            QuestionVerdict {
                question_id: question.id.clone(),
                correct,
            }
        })
        .collect();

    let correct_count = verdicts.iter().filter(|v| v.correct).count();
    let total_questions = verdicts.len();

    // Exams are never empty, but a zero here must not turn into NaN.
    let score = if total_questions == 0 {
        0.0
    } else {
        (correct_count as f64 / total_questions as f64) * 100.0
    };

    GradeReport {
        correct_count,
        total_questions,
        score,
        verdicts,
    }
}
