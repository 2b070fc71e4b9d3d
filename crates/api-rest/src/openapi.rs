use crate::handlers;
use api_shared::{ErrorBody, ErrorDetail, HealthRes};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::edit_form,
        handlers::submit_edit_form,
        handlers::view_discharge_summary
    ),
    components(schemas(HealthRes, ErrorBody, ErrorDetail)),
    tags((name = "discharge-summaries", description = "In-patient discharge summary editing"))
)]
pub struct ApiDoc;
