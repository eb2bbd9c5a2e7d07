// src/models/lesson.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A lesson row joined with its author's name from 'members'.
/// The author is nullable: deleting a member keeps their lessons.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Lesson {
    pub id: i64,
    pub title: String,
    pub lesson_date: NaiveDate,
    pub classroom: Option<String>,
    pub topic: Option<String>,
    pub overview: Option<String>,
    pub reading_materials: Option<String>,
    pub discussion_questions: Option<String>,
    pub author_id: Option<i64>,
    pub author_first_name: Option<String>,
    pub author_last_name: Option<String>,
}

/// Display-shaped lesson for the view layer: formatted date plus the
/// machine-readable one for edit forms, and the teacher's full name.
#[derive(Debug, Serialize)]
pub struct LessonView {
    pub id: i64,
    pub title: String,
    pub date: String,
    pub raw_date: String,
    pub classroom: Option<String>,
    pub topic: Option<String>,
    pub overview: Option<String>,
    pub reading_materials: Option<String>,
    pub discussion_questions: Option<String>,
    pub teacher: String,
}

impl From<Lesson> for LessonView {
    fn from(lesson: Lesson) -> Self {
        let teacher = match (&lesson.author_first_name, &lesson.author_last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            _ => "N/A".to_string(),
        };

        LessonView {
            id: lesson.id,
            title: lesson.title,
            date: format_lesson_date(Some(lesson.lesson_date)),
            raw_date: lesson.lesson_date.to_string(),
            classroom: lesson.classroom,
            topic: lesson.topic,
            overview: lesson.overview,
            reading_materials: lesson.reading_materials,
            discussion_questions: lesson.discussion_questions,
            teacher,
        }
    }
}

/// DTO for creating or replacing a lesson. Title and date are required;
/// everything else is optional.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLessonRequest {
    #[validate(length(min = 1, max = 200, message = "Lesson title is required."))]
    pub title: String,
    pub lesson_date: NaiveDate,
    #[validate(length(max = 100))]
    pub classroom: Option<String>,
    #[validate(length(max = 200))]
    pub topic: Option<String>,
    #[validate(length(max = 20000))]
    pub overview: Option<String>,
    #[validate(length(max = 20000))]
    pub reading_materials: Option<String>,
    #[validate(length(max = 20000))]
    pub discussion_questions: Option<String>,
}

/// Formats a lesson date as e.g. "Monday, January 5, 2026"; "N/A" when absent.
pub fn format_lesson_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.format("%A, %B %-d, %Y").to_string(),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_date_long_form() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        assert_eq!(format_lesson_date(Some(date)), "Monday, January 5, 2026");
    }

    #[test]
    fn missing_date_renders_na() {
        assert_eq!(format_lesson_date(None), "N/A");
    }

    #[test]
    fn view_falls_back_when_author_missing() {
        let lesson = Lesson {
            id: 1,
            title: "Intro".to_string(),
            lesson_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            classroom: None,
            topic: None,
            overview: None,
            reading_materials: None,
            discussion_questions: None,
            author_id: None,
            author_first_name: None,
            author_last_name: None,
        };
        let view = LessonView::from(lesson);
        assert_eq!(view.teacher, "N/A");
        assert_eq!(view.raw_date, "2026-03-02");
    }
}
