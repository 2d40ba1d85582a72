// POST /generate-pdf handler

use std::convert::Infallible;

use tracing::info;

use super::{failure, required, success};
use crate::error::ServiceError;
use crate::models::{GeneratePdfRequest, GeneratePdfResponse};
use crate::report::ReportLinks;
use crate::state::AppState;

pub async fn generate_pdf_handler(
    state: AppState,
    request: GeneratePdfRequest,
) -> Result<impl warp::Reply, Infallible> {
    info!("POST /generate-pdf: postId={:?}", request.post_id);

    match generate_pdf(&state, request).await {
        Ok(links) => Ok(success(&GeneratePdfResponse {
            success: true,
            message: "PDF generated successfully".to_string(),
            pdf_link: links.pdf_link,
            doc_link: links.doc_link,
        })),
        Err(e) => Ok(failure("Error generating PDF", &e, state.expose_errors())),
    }
}

async fn generate_pdf(state: &AppState, request: GeneratePdfRequest) -> Result<ReportLinks, ServiceError> {
    let post_id = required(request.post_id, "postId is required")?;
    let reports = state
        .reports
        .as_ref()
        .ok_or_else(|| ServiceError::ConfigError("Report generation is not configured".to_string()))?;

    reports.generate(&post_id, request.session_id.as_deref()).await
}
