// src/seed.rs

//! Demo data loaded into the in-memory stores at startup.

use crate::models::{
    exam::Exam,
    question::{Question, QuestionType},
    user::Student,
};

fn question(
    id: &str,
    text: &str,
    question_type: QuestionType,
    options: &[&str],
    correct_answers: &[&str],
) -> Question {
    Question {
        id: id.to_string(),
        text: text.to_string(),
        question_type,
        options: options.iter().map(|s| s.to_string()).collect(),
        correct_answers: correct_answers.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn demo_exams() -> Vec<Exam> {
    let math = vec![
        question(
            "q1",
            "What is 15 x (20 - 5) : 3?",
            QuestionType::SingleChoice,
            &["75", "50", "25", "100"],
            &["75"],
        ),
        question(
            "q2",
            "Which of the following are prime numbers?",
            QuestionType::MultiChoice,
            &["2", "4", "7", "9", "11"],
            &["2", "7", "11"],
        ),
        question(
            "q3",
            "A square has sides of 8 cm. What is its area in cm²?",
            QuestionType::ShortAnswer,
            &[],
            &["64"],
        ),
    ];

    let science = vec![
        question(
            "q1",
            "The process by which plants make their own food is called...",
            QuestionType::SingleChoice,
            &["Respiration", "Photosynthesis", "Evaporation", "Transpiration"],
            &["Photosynthesis"],
        ),
        question(
            "q2",
            "Write the chemical formula of water.",
            QuestionType::ShortAnswer,
            &[],
            &["H2O"],
        ),
    ];

    // Both lists are non-empty with positive durations.
    [
        Exam::new("math-01", "Final Semester Exam - Mathematics", "Mathematics", 90, math),
        Exam::new("science-01", "Daily Quiz - Natural Science", "Natural Science", 45, science),
    ]
    .into_iter()
    .filter_map(Result::ok)
    .collect()
}

pub fn demo_students() -> Vec<Student> {
    (0..10)
        .map(|i| Student {
            id: format!("123456789{}", i),
            name: format!("Student {}", i + 1),
        })
        .collect()
}
