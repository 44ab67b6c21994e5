use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{categories, questions},
        NewQuestion, Question,
    },
    server::{
        app::AppState,
        error::ApiError,
        extract::{ApiJson, ApiPath},
        pagination::{paginate, PageQuery},
    },
};

use super::{categories::category_map, ApiResponse};

#[derive(Deserialize)]
struct QuestionBody {
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    category: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    difficulty: Option<i64>,
}

impl QuestionBody {
    /// Empty strings and zero ids count as missing. Text is stored as sent.
    fn validate(self) -> Result<NewQuestion, ApiError> {
        let question = self.question.filter(|s| !s.is_empty());
        let answer = self.answer.filter(|s| !s.is_empty());
        let category = self.category.filter(|c| *c != 0);
        let difficulty = self.difficulty.filter(|d| *d != 0);

        match (question, answer, category, difficulty) {
            (Some(question), Some(answer), Some(category), Some(difficulty)) => Ok(NewQuestion {
                question,
                answer,
                category,
                difficulty,
            }),
            (question, answer, category, difficulty) => {
                let missing: Vec<&str> = [
                    ("question", question.is_none()),
                    ("answer", answer.is_none()),
                    ("category", category.is_none()),
                    ("difficulty", difficulty.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, missing)| missing.then_some(name))
                .collect();
                Err(ApiError::BadRequest(format!(
                    "missing required fields: {}",
                    missing.join(", ")
                )))
            }
        }
    }
}

#[derive(Deserialize)]
struct SearchBody {
    #[serde(default, rename = "searchTerm")]
    search_term: Option<String>,
}

#[derive(Serialize)]
struct QuestionsPage {
    success: bool,
    questions: Vec<Question>,
    total_questions: usize,
    categories: BTreeMap<i64, String>,
    current_category: Option<String>,
}

#[derive(Serialize)]
struct SearchResults {
    success: bool,
    questions: Vec<Question>,
    total_questions: usize,
}

#[derive(Serialize)]
struct Created {
    success: bool,
    created: i64,
}

#[derive(Serialize)]
struct Deleted {
    success: bool,
    deleted: i64,
}

async fn list_questions(
    State(pool): State<SqlitePool>,
    Query(page): Query<PageQuery>,
) -> ApiResponse<Json<QuestionsPage>> {
    let selection = questions::get_all_questions(&pool).await?;
    let total_questions = selection.len();
    let questions = paginate(selection, page.page());
    if questions.is_empty() {
        return Err(ApiError::NotFound);
    }

    Ok(Json(QuestionsPage {
        success: true,
        questions,
        total_questions,
        categories: category_map(&pool).await?,
        current_category: None,
    }))
}

async fn create_question(
    State(pool): State<SqlitePool>,
    ApiJson(body): ApiJson<QuestionBody>,
) -> ApiResponse<(StatusCode, Json<Created>)> {
    let new_question = body.validate()?;
    if categories::get_category(&pool, new_question.category)
        .await?
        .is_none()
    {
        return Err(ApiError::Unprocessable(format!(
            "unknown category {}",
            new_question.category
        )));
    }

    let id = questions::create_question(&pool, &new_question).await?;
    tracing::info!("Created question {id}");
    Ok((
        StatusCode::CREATED,
        Json(Created {
            success: true,
            created: id,
        }),
    ))
}

async fn delete_question(
    State(pool): State<SqlitePool>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResponse<Json<Deleted>> {
    let question = questions::get_question_by_id(&pool, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    // a concurrent delete may have won the race
    if !questions::delete_question(&pool, question.id).await? {
        return Err(ApiError::NotFound);
    }
    tracing::info!("Deleted question {}", question.id);
    Ok(Json(Deleted {
        success: true,
        deleted: question.id,
    }))
}

async fn search_questions(
    State(pool): State<SqlitePool>,
    Query(page): Query<PageQuery>,
    ApiJson(body): ApiJson<SearchBody>,
) -> ApiResponse<Json<SearchResults>> {
    // whitespace is part of the term and is matched as-is
    let term = body
        .search_term
        .filter(|term| !term.is_empty())
        .ok_or_else(|| ApiError::Unprocessable("empty search term".to_owned()))?;

    let selection = questions::search_questions(&pool, &term).await?;
    let total_questions = selection.len();
    Ok(Json(SearchResults {
        success: true,
        questions: paginate(selection, page.page()),
        total_questions,
    }))
}

pub fn questions_router(state: AppState) -> Router {
    Router::new()
        .route("/questions", get(list_questions).post(create_question))
        .route("/questions/search", post(search_questions))
        .route("/questions/{id}", delete(delete_question))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: &str) -> QuestionBody {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn accepts_numeric_strings() {
        let new = body(r#"{"question": "Q?", "answer": "A", "category": "3", "difficulty": "2"}"#)
            .validate()
            .unwrap();
        assert_eq!(new.category, 3);
        assert_eq!(new.difficulty, 2);
    }

    #[test]
    fn keeps_text_as_sent() {
        let new = body(r#"{"question": " Q? ", "answer": "A\n", "category": 1, "difficulty": 1}"#)
            .validate()
            .unwrap();
        assert_eq!(new.question, " Q? ");
        assert_eq!(new.answer, "A\n");

        let new = body(r#"{"question": "  ", "answer": " ", "category": 1, "difficulty": 1}"#)
            .validate()
            .unwrap();
        assert_eq!(new.question, "  ");
    }

    #[test]
    fn names_every_missing_field() {
        let err = body(r#"{"question": "", "category": 0, "difficulty": 4}"#)
            .validate()
            .unwrap_err();
        match err {
            ApiError::BadRequest(message) => {
                assert_eq!(message, "missing required fields: question, answer, category")
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
