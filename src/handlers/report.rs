// src/handlers/report.rs

use axum::{Json, extract::State, response::IntoResponse};
use sqlx::PgPool;

use crate::models::survey::{
    LessonAverageRow, LessonReport, LessonSummary, QuestionAverageRow, QuestionDefinition,
    build_report,
};

/// Loads everything the report needs in four queries: lessons, all question
/// definitions, per-(lesson, question) averages, and per-lesson averages.
/// The averages come out of Postgres already computed; the merge is pure.
async fn load_report(pool: &PgPool) -> Result<Vec<LessonReport>, sqlx::Error> {
    let lessons = sqlx::query_as::<_, LessonSummary>(
        "SELECT id, title, lesson_date FROM lessons ORDER BY lesson_date DESC",
    )
    .fetch_all(pool)
    .await?;

    let definitions = sqlx::query_as::<_, QuestionDefinition>(
        "SELECT lesson_id, question, display_order FROM survey_questions",
    )
    .fetch_all(pool)
    .await?;

    let question_averages = sqlx::query_as::<_, QuestionAverageRow>(
        r#"
        SELECT lesson_id, question, AVG(score)::float8 AS average
        FROM survey_responses
        GROUP BY lesson_id, question
        "#,
    )
    .fetch_all(pool)
    .await?;

    let lesson_averages = sqlx::query_as::<_, LessonAverageRow>(
        r#"
        SELECT lesson_id, AVG(score)::float8 AS average
        FROM survey_responses
        GROUP BY lesson_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(build_report(
        lessons,
        definitions,
        question_averages,
        lesson_averages,
    ))
}

/// Aggregated survey results across all lessons.
/// Teacher only. Degrades to an empty report on storage failure.
pub async fn survey_report(State(pool): State<PgPool>) -> impl IntoResponse {
    match load_report(&pool).await {
        Ok(lessons) => Json(serde_json::json!({
            "lessons": lessons,
            "error_message": "",
        })),
        Err(e) => {
            tracing::error!("Error loading survey responses summary: {:?}", e);
            Json(serde_json::json!({
                "lessons": [],
                "error_message": "Error loading survey responses.",
            }))
        }
    }
}
