use std::sync::PoisonError;

use axum::{extract::State, routing::post, Json, Router};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use sqlx::SqlitePool;

use crate::{
    db::{queries::questions, Question},
    server::{
        app::{AppState, SharedRng},
        extract::ApiJson,
    },
    telemetry::QUIZ_QUESTIONS_SERVED,
};

use super::ApiResponse;

#[derive(Deserialize)]
struct QuizCategory {
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    id: Option<i64>,
}

#[derive(Deserialize)]
struct QuizBody {
    #[serde(default)]
    quiz_category: Option<QuizCategory>,
    #[serde(default)]
    previous_questions: Vec<i64>,
}

impl QuizBody {
    // id 0 is what the client sends for "All"
    fn category_id(&self) -> Option<i64> {
        self.quiz_category
            .as_ref()
            .and_then(|c| c.id)
            .filter(|id| *id != 0)
    }
}

#[derive(Serialize)]
struct QuizResponse {
    success: bool,
    question: Option<Question>,
}

async fn play_quiz(
    State(pool): State<SqlitePool>,
    State(rng): State<SharedRng>,
    ApiJson(body): ApiJson<QuizBody>,
) -> ApiResponse<Json<QuizResponse>> {
    let category_id = body.category_id();
    let candidates =
        questions::get_quiz_candidates(&pool, category_id, &body.previous_questions).await?;

    let question = {
        let mut rng = rng.lock().unwrap_or_else(PoisonError::into_inner);
        candidates.choose(&mut *rng).cloned()
    };

    match &question {
        Some(q) => {
            QUIZ_QUESTIONS_SERVED
                .with_label_values(&[q.category.to_string().as_str()])
                .inc();
            tracing::debug!(
                "Serving question {} after {} previous",
                q.id,
                body.previous_questions.len()
            );
        }
        None => tracing::debug!("Quiz exhausted for category {category_id:?}"),
    }

    Ok(Json(QuizResponse {
        success: true,
        question,
    }))
}

pub fn quizzes_router(state: AppState) -> Router {
    Router::new()
        .route("/quizzes", post(play_quiz))
        .with_state(state)
}
