// src/store.rs

//! Exam and student storage.
//!
//! Handlers only see the traits; the in-memory implementations below keep
//! everything in process and lose it on restart.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    error::AppError,
    models::{exam::Exam, user::Student},
};

#[async_trait]
pub trait ExamStore: Send + Sync {
    /// All exams in insertion order.
    async fn list(&self) -> Vec<Arc<Exam>>;

    async fn get(&self, id: &str) -> Option<Arc<Exam>>;

    /// Rejects a duplicate id with `AppError::Conflict`.
    async fn insert(&self, exam: Exam) -> Result<Arc<Exam>, AppError>;
}

#[async_trait]
pub trait StudentStore: Send + Sync {
    /// All students, sorted by name.
    async fn list(&self) -> Vec<Student>;

    async fn get(&self, id: &str) -> Option<Student>;

    /// Rejects a duplicate id with `AppError::Conflict`.
    async fn insert(&self, student: Student) -> Result<(), AppError>;

    /// Returns `AppError::NotFound` for an unknown id.
    async fn remove(&self, id: &str) -> Result<(), AppError>;
}

#[derive(Default)]
pub struct InMemoryExamStore {
    exams: RwLock<Vec<Arc<Exam>>>,
}

impl InMemoryExamStore {
    pub fn new(exams: Vec<Exam>) -> Self {
        Self {
            exams: RwLock::new(exams.into_iter().map(Arc::new).collect()),
        }
    }
}

#[async_trait]
impl ExamStore for InMemoryExamStore {
    async fn list(&self) -> Vec<Arc<Exam>> {
        self.exams.read().await.clone()
    }

    async fn get(&self, id: &str) -> Option<Arc<Exam>> {
        self.exams.read().await.iter().find(|e| e.id == id).cloned()
    }

    async fn insert(&self, exam: Exam) -> Result<Arc<Exam>, AppError> {
        let mut exams = self.exams.write().await;
        if exams.iter().any(|e| e.id == exam.id) {
            return Err(AppError::Conflict(format!("Exam '{}' already exists", exam.id)));
        }
        let exam = Arc::new(exam);
        exams.push(exam.clone());
        Ok(exam)
    }
}

#[derive(Default)]
pub struct InMemoryStudentStore {
    students: RwLock<Vec<Student>>,
}

impl InMemoryStudentStore {
    pub fn new(students: Vec<Student>) -> Self {
        Self {
            students: RwLock::new(students),
        }
    }
}

#[async_trait]
impl StudentStore for InMemoryStudentStore {
    async fn list(&self) -> Vec<Student> {
        let mut students = self.students.read().await.clone();
        students.sort_by(|a, b| a.name.cmp(&b.name));
        students
    }

    async fn get(&self, id: &str) -> Option<Student> {
        self.students.read().await.iter().find(|s| s.id == id).cloned()
    }

    async fn insert(&self, student: Student) -> Result<(), AppError> {
        let mut students = self.students.write().await;
        if students.iter().any(|s| s.id == student.id) {
            return Err(AppError::Conflict(format!(
                "Student id '{}' is already registered",
                student.id
            )));
        }
        students.push(student);
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<(), AppError> {
        let mut students = self.students.write().await;
        let before = students.len();
        students.retain(|s| s.id != id);
        if students.len() == before {
            return Err(AppError::NotFound("Student not found".to_string()));
        }
        Ok(())
    }
}
