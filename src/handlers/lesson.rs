// src/handlers/lesson.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::lesson::{CreateLessonRequest, Lesson, LessonView},
    utils::{html::clean_html, jwt::Claims},
};

/// Shared lesson projection with the author's name joined in.
const LESSON_SELECT: &str = r#"
    SELECT
        l.id, l.title, l.lesson_date, l.classroom, l.topic, l.overview,
        l.reading_materials, l.discussion_questions, l.author_id,
        m.first_name AS author_first_name, m.last_name AS author_last_name
    FROM lessons l
    LEFT JOIN members m ON l.author_id = m.id
"#;

/// Lists all lessons ordered by date, plus the distinct teachers and topics
/// for the list page's filter dropdowns.
///
/// A storage failure degrades to an empty list with an error message rather
/// than a 500; the lesson list page should always render.
pub async fn list_lessons(State(pool): State<PgPool>) -> impl IntoResponse {
    let query = format!("{} ORDER BY l.lesson_date ASC", LESSON_SELECT);

    match sqlx::query_as::<_, Lesson>(&query).fetch_all(&pool).await {
        Ok(lessons) => {
            let views: Vec<LessonView> = lessons.into_iter().map(LessonView::from).collect();

            let mut teachers: Vec<String> = views
                .iter()
                .map(|v| v.teacher.clone())
                .filter(|t| t != "N/A")
                .collect();
            teachers.sort();
            teachers.dedup();

            let mut topics: Vec<String> = views
                .iter()
                .filter_map(|v| v.topic.clone())
                .filter(|t| !t.trim().is_empty())
                .collect();
            topics.sort();
            topics.dedup();

            Json(serde_json::json!({
                "lessons": views,
                "teachers": teachers,
                "topics": topics,
                "error_message": null,
            }))
        }
        Err(e) => {
            tracing::error!("Failed to list lessons: {:?}", e);
            Json(serde_json::json!({
                "lessons": [],
                "teachers": [],
                "topics": [],
                "error_message": "Error loading lessons. Please try again later.",
            }))
        }
    }
}

/// The next lesson on or after today, for the dashboard.
/// Degrades to no lesson on storage failure.
pub async fn upcoming_lesson(State(pool): State<PgPool>) -> impl IntoResponse {
    let query = format!(
        "{} WHERE l.lesson_date >= CURRENT_DATE ORDER BY l.lesson_date ASC LIMIT 1",
        LESSON_SELECT
    );

    match sqlx::query_as::<_, Lesson>(&query)
        .fetch_optional(&pool)
        .await
    {
        Ok(lesson) => Json(serde_json::json!({
            "lesson": lesson.map(LessonView::from),
        })),
        Err(e) => {
            tracing::error!("Failed to fetch upcoming lesson: {:?}", e);
            Json(serde_json::json!({ "lesson": null }))
        }
    }
}

/// Fetches one lesson by id.
pub async fn get_lesson(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let query = format!("{} WHERE l.id = $1", LESSON_SELECT);

    let lesson = sqlx::query_as::<_, Lesson>(&query)
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Lesson not found".to_string()))?;

    Ok(Json(LessonView::from(lesson)))
}

/// Creates a lesson authored by the calling teacher.
/// Teacher only.
pub async fn create_lesson(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateLessonRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let id: (i64,) = sqlx::query_as(
        r#"
        INSERT INTO lessons
            (title, lesson_date, classroom, topic, overview, reading_materials,
             discussion_questions, author_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(&payload.title)
    .bind(payload.lesson_date)
    .bind(&payload.classroom)
    .bind(&payload.topic)
    .bind(payload.overview.as_deref().map(clean_html))
    .bind(payload.reading_materials.as_deref().map(clean_html))
    .bind(payload.discussion_questions.as_deref().map(clean_html))
    .bind(claims.member_id())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create lesson: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id.0 })),
    ))
}

/// Replaces a lesson's fields.
/// Teacher only.
pub async fn update_lesson(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateLessonRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM lessons WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?;
    exists.ok_or(AppError::NotFound("Lesson not found".to_string()))?;

    sqlx::query(
        r#"
        UPDATE lessons SET
            title = $1, lesson_date = $2, classroom = $3, topic = $4,
            overview = $5, reading_materials = $6, discussion_questions = $7
        WHERE id = $8
        "#,
    )
    .bind(&payload.title)
    .bind(payload.lesson_date)
    .bind(&payload.classroom)
    .bind(&payload.topic)
    .bind(payload.overview.as_deref().map(clean_html))
    .bind(payload.reading_materials.as_deref().map(clean_html))
    .bind(payload.discussion_questions.as_deref().map(clean_html))
    .bind(id)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update lesson {}: {:?}", id, e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(serde_json::json!({ "success": true })))
}

/// Deletes a lesson; its question definitions and responses cascade.
/// Teacher only.
pub async fn delete_lesson(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    sqlx::query("DELETE FROM lessons WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete lesson {}: {:?}", id, e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(serde_json::json!({ "success": true })))
}
