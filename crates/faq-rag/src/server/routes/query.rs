//! Question endpoints

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{
    query::required, response::ChatResponse, Answer, AskRequest, ChatRequest,
};

/// POST /api/ask - knowledge base first, vector index otherwise
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<Answer>> {
    let question = required(request.question.as_deref(), "Question")?;
    let prompt = request.prompt.as_deref();
    let context = request.context.as_deref();

    tracing::info!("Ask: \"{}\"", question);

    if let Some(answer) = state
        .qa()
        .ask_knowledge_base(&question, prompt, context)
        .await?
    {
        tracing::debug!("Answered from knowledge base with {} chunks", answer.chunks.len());
        return Ok(Json(answer));
    }

    state.index().ensure().await?;
    let answer = state.qa().ask_index(&question, prompt, context).await?;
    tracing::debug!("Answered from index with {} chunks", answer.chunks.len());
    Ok(Json(answer))
}

/// POST /api/chat - vector index only
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let query = required(request.query.as_deref(), "Query")?;
    tracing::info!("Chat: \"{}\"", query);

    state.index().ensure().await?;
    let answer = state.qa().chat(&query).await?;

    Ok(Json(ChatResponse {
        answer: answer.answer,
        chunks: answer.chunks,
    }))
}
