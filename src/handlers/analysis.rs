// POST /generate-analysis and POST /enhance-analysis handlers

use std::convert::Infallible;

use tracing::info;

use super::{failure, load_session, model_image_url, required, save_to_session, success};
use crate::analysis::EnhancedAnalysis;
use crate::error::ServiceError;
use crate::models::{
    EnhanceAnalysisRequest, EnhanceAnalysisResponse, GenerateAnalysisRequest, GenerateAnalysisResponse,
};
use crate::state::AppState;

pub async fn generate_analysis_handler(
    state: AppState,
    request: GenerateAnalysisRequest,
) -> Result<impl warp::Reply, Infallible> {
    info!("POST /generate-analysis");

    match generate_analysis(&state, request).await {
        Ok(analysis) => Ok(success(&GenerateAnalysisResponse {
            success: true,
            analysis,
        })),
        Err(e) => Ok(failure("Error generating analysis", &e, state.expose_errors())),
    }
}

async fn generate_analysis(state: &AppState, request: GenerateAnalysisRequest) -> Result<String, ServiceError> {
    let session_id = required(request.session_id, "sessionId is required")?;
    let session = load_session(state, &session_id).await?;
    let customer_image_url = model_image_url(state, &session).await?;

    let analysis = state
        .analyst
        .analyze(&customer_image_url, &session.similar_image_urls, session.item_type)
        .await?;

    let stored = analysis.clone();
    save_to_session(&state.sessions, &session_id, move |s| s.analysis = Some(stored)).await;
    Ok(analysis)
}

pub async fn enhance_analysis_handler(
    state: AppState,
    request: EnhanceAnalysisRequest,
) -> Result<impl warp::Reply, Infallible> {
    info!("POST /enhance-analysis");

    match enhance_analysis(&state, request).await {
        Ok(result) => Ok(success(&EnhanceAnalysisResponse {
            success: true,
            enhanced_analysis: result.enhanced_analysis,
            offer_text: result.offer_text,
        })),
        Err(e) => Ok(failure("Error enhancing analysis", &e, state.expose_errors())),
    }
}

async fn enhance_analysis(
    state: &AppState,
    request: EnhanceAnalysisRequest,
) -> Result<EnhancedAnalysis, ServiceError> {
    const MISSING: &str = "sessionId and analysisText are required";
    let session_id = required(request.session_id, MISSING)?;
    let analysis_text = required(request.analysis_text, MISSING)?;
    load_session(state, &session_id).await?;

    let result = state.analyst.enhance(&analysis_text).await?;

    let stored = result.clone();
    save_to_session(&state.sessions, &session_id, move |s| {
        s.enhanced_analysis = Some(stored.enhanced_analysis);
        s.offer_text = Some(stored.offer_text);
    })
    .await;
    Ok(result)
}
