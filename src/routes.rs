// src/routes.rs

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, lesson, report, survey},
    state::AppState,
    utils::jwt::{auth_middleware, teacher_middleware},
};

/// Assembles the main application router.
///
/// * Public: auth and lesson reads.
/// * Logged-in: the feedback/survey flows.
/// * Teacher: lesson mutations, question management, the aggregate report.
/// * Global middleware (Trace, CORS) applied from outside in.
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let lesson_routes = Router::new()
        .route("/", get(lesson::list_lessons))
        .route("/upcoming", get(lesson::upcoming_lesson))
        .route("/{id}", get(lesson::get_lesson));

    // Lesson mutations live under /api/admin with the teacher check layered
    // on the whole sub-router.
    let admin_routes = Router::new()
        .route("/lessons", post(lesson::create_lesson))
        .route(
            "/lessons/{id}",
            delete(lesson::delete_lesson).put(lesson::update_lesson),
        )
        // Double middleware protection: Auth first, then teacher check
        .layer(middleware::from_fn(teacher_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Paths fixed by the survey form flows (redirect targets point here).
    let feedback_routes = Router::new()
        .route("/feedback", get(survey::feedback_index))
        .route(
            "/feedback/survey/{lessonid}",
            get(survey::survey_form).post(survey::submit_survey),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let teacher_survey_routes = Router::new()
        .route(
            "/feedback/survey/{lessonid}/questions-json",
            get(survey::questions_json),
        )
        .route(
            "/feedback/survey/{lessonid}/questions",
            post(survey::update_questions),
        )
        .route("/survey-responses", get(report::survey_report))
        .layer(middleware::from_fn(teacher_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/lessons", lesson_routes)
        .nest("/api/admin", admin_routes)
        .merge(feedback_routes)
        .merge(teacher_survey_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
