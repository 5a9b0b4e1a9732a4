use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};

use crate::adaptive::{
    AdaptiveCandidate, AnswerOutcome, DifficultyTier, PerformanceInsights, SessionPerformance,
};
use crate::auth::AuthUser;
use crate::response::{json_error, AppError};
use crate::services::adaptive_difficulty::{AdaptiveError, AnswerRecorded};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/performance", get(performance))
        .route("/record-answer", post(record_answer))
        .route("/select-question", post(select_question))
        .route("/session-difficulty", post(session_difficulty))
}

#[derive(Serialize)]
struct PerformanceResponse {
    success: bool,
    performance: PerformanceInsights,
}

#[derive(Serialize)]
struct RecordAnswerResponse {
    success: bool,
    #[serde(flatten)]
    result: AnswerRecorded,
}

/// Question as posted by the quiz flow; fields we do not rank on are passed through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateQuestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, rename = "_id", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

impl AdaptiveCandidate for CandidateQuestion {
    fn candidate_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.object_id.as_deref())
    }

    fn difficulty_label(&self) -> Option<&str> {
        self.difficulty.as_deref()
    }
}

#[derive(Debug, Deserialize)]
struct SelectQuestionRequest {
    #[serde(default)]
    questions: Vec<CandidateQuestion>,
}

#[derive(Serialize)]
struct SelectQuestionResponse<'a> {
    success: bool,
    question: &'a CandidateQuestion,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionDifficultyRequest {
    current_difficulty: DifficultyTier,
    performance: SessionPerformance,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionDifficultyResponse {
    success: bool,
    difficulty: DifficultyTier,
    previous_difficulty: DifficultyTier,
}

async fn performance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    match state.adaptive().get_performance_insights(&user.id).await {
        Ok(performance) => Json(PerformanceResponse {
            success: true,
            performance,
        })
        .into_response(),
        Err(err) => failure("performance insights failed", &user, err),
    }
}

async fn record_answer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<AnswerOutcome>, JsonRejection>,
) -> Response {
    let Json(outcome) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return AppError::validation(rejection.body_text()).into_response(),
    };

    match state.adaptive().record_answer(&user.id, outcome).await {
        Ok(result) => Json(RecordAnswerResponse {
            success: true,
            result,
        })
        .into_response(),
        Err(err) => failure("record answer failed", &user, err),
    }
}

async fn select_question(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<SelectQuestionRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return AppError::validation(rejection.body_text()).into_response(),
    };

    let service = state.adaptive();
    match service
        .select_adaptive_question(&user.id, &request.questions)
        .await
    {
        Ok(Some(question)) => Json(SelectQuestionResponse {
            success: true,
            question,
        })
        .into_response(),
        Ok(None) => json_error(
            axum::http::StatusCode::BAD_REQUEST,
            "NO_CANDIDATES",
            "questions must contain at least one candidate",
        )
        .into_response(),
        Err(err) => failure("question selection failed", &user, err),
    }
}

async fn session_difficulty(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
    payload: Result<Json<SessionDifficultyRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return AppError::validation(rejection.body_text()).into_response(),
    };

    let difficulty = state
        .adaptive()
        .next_session_tier(request.current_difficulty, &request.performance);

    Json(SessionDifficultyResponse {
        success: true,
        difficulty,
        previous_difficulty: request.current_difficulty,
    })
    .into_response()
}

fn failure(context: &'static str, user: &AuthUser, err: AdaptiveError) -> Response {
    tracing::error!(user_id = %user.id, error = %err, "{context}");
    AppError::internal(err.to_string()).into_response()
}
