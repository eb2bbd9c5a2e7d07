// src/handlers/survey.rs
//
// The survey core: form view, submission, and question definition management.
// Submission and definition updates are wholesale replacements, each wrapped
// in a transaction so a racing resubmission serializes at the database and
// the last committed writer wins.

use std::collections::HashMap;

use axum::{
    Extension, Form, Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::{
        lesson::{Lesson, LessonView},
        survey::{ExistingAnswer, QuestionDefinition, question_texts},
    },
    utils::{
        form::{indexed_values, parse_score},
        html::clean_html,
        jwt::Claims,
    },
};

/// Resolves the active question list for a lesson: its definitions ordered by
/// display position, or the built-in defaults when none exist.
///
/// A query failure is logged and degrades to the defaults; the survey form
/// must always have questions to show.
pub async fn resolve_questions(pool: &PgPool, lesson_id: i64) -> Vec<String> {
    let definitions = sqlx::query_as::<_, QuestionDefinition>(
        r#"
        SELECT lesson_id, question, display_order
        FROM survey_questions
        WHERE lesson_id = $1
        ORDER BY display_order ASC, id ASC
        "#,
    )
    .bind(lesson_id)
    .fetch_all(pool)
    .await
    .unwrap_or_else(|e| {
        tracing::warn!(
            "Failed to fetch survey questions for lesson {}: {:?}",
            lesson_id,
            e
        );
        Vec::new()
    });

    question_texts(definitions)
}

#[derive(Debug, Deserialize)]
pub struct FeedbackQuery {
    pub success: Option<bool>,
    pub error: Option<bool>,
}

/// Survey landing page: all lessons, newest first.
/// Degrades to an empty list on storage failure.
pub async fn feedback_index(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<FeedbackQuery>,
) -> impl IntoResponse {
    let lessons = sqlx::query_as::<_, Lesson>(
        r#"
        SELECT
            l.id, l.title, l.lesson_date, l.classroom, l.topic, l.overview,
            l.reading_materials, l.discussion_questions, l.author_id,
            m.first_name AS author_first_name, m.last_name AS author_last_name
        FROM lessons l
        LEFT JOIN members m ON l.author_id = m.id
        ORDER BY l.lesson_date DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .unwrap_or_else(|e| {
        tracing::error!("Failed to fetch lessons for feedback: {:?}", e);
        Vec::new()
    });

    let views: Vec<LessonView> = lessons.into_iter().map(LessonView::from).collect();

    Json(serde_json::json!({
        "lessons": views,
        "success": params.success.unwrap_or(false),
        "is_teacher": claims.is_teacher(),
    }))
}

/// Survey form view for one lesson: the lesson header, the active question
/// list, and the member's existing answers keyed by question text so a
/// resubmission renders pre-filled.
///
/// Redirects to /feedback if the lesson does not exist (or cannot be fetched).
pub async fn survey_form(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(lesson_id): Path<i64>,
) -> Response {
    let lesson = sqlx::query_as::<_, Lesson>(
        r#"
        SELECT
            l.id, l.title, l.lesson_date, l.classroom, l.topic, l.overview,
            l.reading_materials, l.discussion_questions, l.author_id,
            m.first_name AS author_first_name, m.last_name AS author_last_name
        FROM lessons l
        LEFT JOIN members m ON l.author_id = m.id
        WHERE l.id = $1
        "#,
    )
    .bind(lesson_id)
    .fetch_optional(&pool)
    .await;

    let lesson = match lesson {
        Ok(Some(lesson)) => lesson,
        Ok(None) => return Redirect::to("/feedback").into_response(),
        Err(e) => {
            tracing::error!("Failed to fetch lesson {} for survey: {:?}", lesson_id, e);
            return Redirect::to("/feedback").into_response();
        }
    };

    let questions = resolve_questions(&pool, lesson_id).await;

    let existing = sqlx::query_as::<_, ExistingAnswer>(
        r#"
        SELECT question, score, comment
        FROM survey_responses
        WHERE member_id = $1 AND lesson_id = $2
        "#,
    )
    .bind(claims.member_id())
    .bind(lesson_id)
    .fetch_all(&pool)
    .await
    .unwrap_or_else(|e| {
        tracing::warn!("Failed to fetch existing responses: {:?}", e);
        Vec::new()
    });

    let existing_by_question: HashMap<String, serde_json::Value> = existing
        .into_iter()
        .map(|answer| {
            (
                answer.question,
                serde_json::json!({
                    "score": answer.score,
                    "comment": answer.comment,
                }),
            )
        })
        .collect();

    Json(serde_json::json!({
        "lesson": LessonView::from(lesson),
        "questions": questions,
        "existing_responses": existing_by_question,
    }))
    .into_response()
}

/// Replaces a member's answer set for a lesson in one transaction.
/// An empty answer set still clears prior answers; the insert is skipped.
async fn replace_responses(
    pool: &PgPool,
    member_id: i64,
    lesson_id: i64,
    answers: &[(String, i32, Option<String>)],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM survey_responses WHERE member_id = $1 AND lesson_id = $2")
        .bind(member_id)
        .bind(lesson_id)
        .execute(&mut *tx)
        .await?;

    for (question, score, comment) in answers {
        sqlx::query(
            r#"
            INSERT INTO survey_responses (member_id, lesson_id, question, score, comment)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(member_id)
        .bind(lesson_id)
        .bind(question)
        .bind(score)
        .bind(comment)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

/// Submits a member's survey answers for a lesson.
///
/// `question_i` / `comment_i` fields are paired positionally with the i-th
/// question of the lesson's active list. A missing or non-numeric score means
/// "no answer" and that question is excluded from the write entirely.
pub async fn submit_survey(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(lesson_id): Path<i64>,
    Form(form): Form<HashMap<String, String>>,
) -> Redirect {
    let member_id = claims.member_id();
    let questions = resolve_questions(&pool, lesson_id).await;

    let answers: Vec<(String, i32, Option<String>)> = questions
        .into_iter()
        .enumerate()
        .filter_map(|(i, question)| {
            let score = parse_score(form.get(&format!("question_{}", i + 1)))?;
            let comment = form
                .get(&format!("comment_{}", i + 1))
                .map(|c| clean_html(c))
                .filter(|c| !c.trim().is_empty());
            Some((question, score, comment))
        })
        .collect();

    match replace_responses(&pool, member_id, lesson_id, &answers).await {
        Ok(()) => Redirect::to("/feedback?success=true"),
        Err(e) => {
            tracing::error!(
                "Failed to save survey responses for member {} lesson {}: {:?}",
                member_id,
                lesson_id,
                e
            );
            Redirect::to(&format!("/feedback/survey/{}?error=true", lesson_id))
        }
    }
}

/// Returns the active question list for a lesson.
/// Teacher only.
pub async fn questions_json(
    State(pool): State<PgPool>,
    Path(lesson_id): Path<i64>,
) -> impl IntoResponse {
    let questions = resolve_questions(&pool, lesson_id).await;
    Json(serde_json::json!({ "questions": questions }))
}

/// Replaces the question definition set for a lesson.
/// Teacher only.
///
/// Collects trimmed non-empty `question_i` values in numeric index order and
/// stores them with zero-based display positions, stamped with the calling
/// teacher. Runs as a transaction: the old set is gone only if the new set
/// lands.
pub async fn update_questions(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(lesson_id): Path<i64>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let questions: Vec<String> = indexed_values(&form, "question_")
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect();

    if questions.is_empty() {
        return Err(AppError::BadRequest(
            "At least one question is required".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM survey_questions WHERE lesson_id = $1")
        .bind(lesson_id)
        .execute(&mut *tx)
        .await?;

    for (index, question) in questions.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO survey_questions (lesson_id, question, display_order, author_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(lesson_id)
        .bind(question)
        .bind(index as i32)
        .bind(claims.member_id())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(Json(serde_json::json!({ "success": true })))
}
