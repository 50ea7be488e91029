use shared::error::{ErrorCode, ErrorReport, SceneException};

/// Classifies an error by the `SceneException` it carries, either as a
/// context layer or as a cause, falling back to `Internal`.
pub fn error_report(err: &anyhow::Error) -> ErrorReport {
    let code = err
        .downcast_ref::<SceneException>()
        .or_else(|| {
            err.chain()
                .find_map(|cause| cause.downcast_ref::<SceneException>())
        })
        .map(|exception| exception.code)
        .unwrap_or(ErrorCode::Internal);
    ErrorReport::new(code, format!("{err:#}"))
}
