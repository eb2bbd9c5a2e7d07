// src/models/survey.rs
//
// Survey domain: question definitions, responses, and the aggregation report.
// Definitions and responses are distinct entities in distinct tables; the
// merge logic here is pure so it can be tested without a database.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

use crate::models::lesson::format_lesson_date;

/// Fallback shown for lessons whose teacher never configured questions.
pub const DEFAULT_SURVEY_QUESTIONS: [&str; 3] = [
    "How clear was the content presented?",
    "How engaging was the lesson?",
    "How effective was the instructor?",
];

/// A question definition row for one lesson.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuestionDefinition {
    pub lesson_id: i64,
    pub question: String,
    pub display_order: i32,
}

/// One member's stored answer, keyed by question text in the form view.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExistingAnswer {
    pub question: String,
    pub score: i32,
    pub comment: Option<String>,
}

/// Per-(lesson, question) mean score, as computed by the database.
#[derive(Debug, FromRow)]
pub struct QuestionAverageRow {
    pub lesson_id: i64,
    pub question: String,
    pub average: Option<f64>,
}

/// Per-lesson mean score across all questions and members.
#[derive(Debug, FromRow)]
pub struct LessonAverageRow {
    pub lesson_id: i64,
    pub average: Option<f64>,
}

/// Minimal lesson info carried into the report.
#[derive(Debug, FromRow)]
pub struct LessonSummary {
    pub id: i64,
    pub title: String,
    pub lesson_date: NaiveDate,
}

/// One question with its formatted average, for display.
#[derive(Debug, Serialize, PartialEq)]
pub struct QuestionAverage {
    pub text: String,
    pub average: String,
}

/// Aggregated survey results for one lesson.
#[derive(Debug, Serialize)]
pub struct LessonReport {
    pub lesson_id: i64,
    pub title: String,
    pub date: String,
    pub overall_average: String,
    pub questions: Vec<QuestionAverage>,
}

/// Orders definitions and projects their texts; a lesson with no definitions
/// gets the built-in fallback list.
///
/// The sort is stable, so ties on `display_order` keep query order.
pub fn question_texts(mut definitions: Vec<QuestionDefinition>) -> Vec<String> {
    if definitions.is_empty() {
        return DEFAULT_SURVEY_QUESTIONS
            .iter()
            .map(|q| q.to_string())
            .collect();
    }
    definitions.sort_by_key(|d| d.display_order);
    definitions.into_iter().map(|d| d.question).collect()
}

/// Two-decimal display form of an average; the placeholder when no numeric
/// responses exist. Never renders a synthetic 0 or NaN.
pub fn format_average(average: Option<f64>) -> String {
    match average {
        Some(avg) => format!("{:.2}", avg),
        None => "—".to_string(),
    }
}

/// Merges lessons, question definitions, and database-computed averages into
/// the teacher-facing report.
///
/// Per lesson, the question list is the union of the definition set (ordered
/// by `display_order`) and any question texts that only appear in responses,
/// appended afterward. The latter covers definitions edited after responses
/// were already recorded.
pub fn build_report(
    lessons: Vec<LessonSummary>,
    mut definitions: Vec<QuestionDefinition>,
    question_averages: Vec<QuestionAverageRow>,
    lesson_averages: Vec<LessonAverageRow>,
) -> Vec<LessonReport> {
    definitions.sort_by_key(|d| d.display_order);

    lessons
        .into_iter()
        .map(|lesson| {
            let mut texts: Vec<String> = definitions
                .iter()
                .filter(|d| d.lesson_id == lesson.id)
                .map(|d| d.question.clone())
                .collect();

            for avg in question_averages.iter().filter(|a| a.lesson_id == lesson.id) {
                if !texts.contains(&avg.question) {
                    texts.push(avg.question.clone());
                }
            }

            let questions = texts
                .into_iter()
                .map(|text| {
                    let average = question_averages
                        .iter()
                        .find(|a| a.lesson_id == lesson.id && a.question == text)
                        .and_then(|a| a.average);
                    QuestionAverage {
                        text,
                        average: format_average(average),
                    }
                })
                .collect();

            let overall = lesson_averages
                .iter()
                .find(|a| a.lesson_id == lesson.id)
                .and_then(|a| a.average);

            LessonReport {
                lesson_id: lesson.id,
                title: lesson.title,
                date: format_lesson_date(Some(lesson.lesson_date)),
                overall_average: format_average(overall),
                questions,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(lesson_id: i64, question: &str, display_order: i32) -> QuestionDefinition {
        QuestionDefinition {
            lesson_id,
            question: question.to_string(),
            display_order,
        }
    }

    fn summary(id: i64, title: &str) -> LessonSummary {
        LessonSummary {
            id,
            title: title.to_string(),
            lesson_date: NaiveDate::from_ymd_opt(2026, 2, 9).unwrap(),
        }
    }

    #[test]
    fn no_definitions_falls_back_to_defaults() {
        let texts = question_texts(vec![]);
        assert_eq!(texts.len(), 3);
        assert_eq!(texts[0], DEFAULT_SURVEY_QUESTIONS[0]);
        assert_eq!(texts[1], DEFAULT_SURVEY_QUESTIONS[1]);
        assert_eq!(texts[2], DEFAULT_SURVEY_QUESTIONS[2]);
    }

    #[test]
    fn definitions_sort_by_display_order() {
        let texts = question_texts(vec![def(1, "C", 2), def(1, "A", 0), def(1, "B", 1)]);
        assert_eq!(texts, vec!["A", "B", "C"]);
    }

    #[test]
    fn format_average_two_decimals_or_placeholder() {
        assert_eq!(format_average(Some(4.5)), "4.50");
        assert_eq!(format_average(Some(3.333333)), "3.33");
        assert_eq!(format_average(None), "—");
    }

    #[test]
    fn report_shows_placeholder_for_lesson_without_responses() {
        let report = build_report(
            vec![summary(1, "Quiet lesson")],
            vec![def(1, "Q1", 0), def(1, "Q2", 1)],
            vec![],
            vec![],
        );
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].overall_average, "—");
        assert!(report[0].questions.iter().all(|q| q.average == "—"));
    }

    #[test]
    fn report_mixes_averages_and_placeholders() {
        // Q1 got scores [4, 5]; defined Q2 got nothing.
        let report = build_report(
            vec![summary(1, "Lesson")],
            vec![def(1, "Q1", 0), def(1, "Q2", 1)],
            vec![QuestionAverageRow {
                lesson_id: 1,
                question: "Q1".to_string(),
                average: Some(4.5),
            }],
            vec![LessonAverageRow {
                lesson_id: 1,
                average: Some(4.5),
            }],
        );
        assert_eq!(
            report[0].questions,
            vec![
                QuestionAverage {
                    text: "Q1".to_string(),
                    average: "4.50".to_string()
                },
                QuestionAverage {
                    text: "Q2".to_string(),
                    average: "—".to_string()
                },
            ]
        );
        assert_eq!(report[0].overall_average, "4.50");
    }

    #[test]
    fn report_includes_questions_only_present_in_responses() {
        // "Old question" was removed from the definitions after members
        // answered it; it must still appear, after the defined ones.
        let report = build_report(
            vec![summary(1, "Lesson")],
            vec![def(1, "Current question", 0)],
            vec![QuestionAverageRow {
                lesson_id: 1,
                question: "Old question".to_string(),
                average: Some(3.0),
            }],
            vec![LessonAverageRow {
                lesson_id: 1,
                average: Some(3.0),
            }],
        );
        let texts: Vec<&str> = report[0].questions.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts, vec!["Current question", "Old question"]);
        assert_eq!(report[0].questions[1].average, "3.00");
    }

    #[test]
    fn report_scopes_definitions_to_their_lesson() {
        let report = build_report(
            vec![summary(1, "One"), summary(2, "Two")],
            vec![def(1, "Q-a", 0), def(2, "Q-b", 0)],
            vec![],
            vec![],
        );
        assert_eq!(report[0].questions.len(), 1);
        assert_eq!(report[0].questions[0].text, "Q-a");
        assert_eq!(report[1].questions[0].text, "Q-b");
    }
}
