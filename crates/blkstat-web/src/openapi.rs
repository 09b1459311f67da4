//! OpenAPI documentation definition.

use blkstat_core::storage::DeviceSnapshot;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(crate::handlers::handle_stats, crate::handlers::handle_health),
    components(schemas(DeviceSnapshot)),
    info(
        title = "blkstat API",
        version = "1.0",
        description = "Per-device block I/O rates sampled from /sys/block/<device>/stat"
    )
)]
pub(crate) struct ApiDoc;
