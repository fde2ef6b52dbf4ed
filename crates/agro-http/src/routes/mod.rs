mod documents;
mod lookups;
mod resources;
mod users;

use crate::state::SharedState;
use agro_domain::{Crop, FieldActivity, FieldDocument, FieldTreatment, Irrigation, Production, SoilAnalysis};
use agro_service::MAX_UPLOAD_BYTES;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

pub use resources::Resource;

/// Margen para las cabeceras multipart sobre el tamaño máximo del fichero.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn api_router() -> Router<SharedState> {
  Router::new().route("/health", get(lookups::health))
               .route("/api/auth/register", post(users::register))
               .route("/api/auth/login", post(users::login))
               .route("/api/users/me", get(users::me))
               .route("/api/users", get(users::list).post(users::create).delete(users::delete_all))
               .route("/api/users/:id", get(users::get_one).put(users::update).delete(users::delete_one))
               .merge(resources::routes::<Crop>("/api/crops"))
               .merge(resources::routes::<Irrigation>("/api/irrigations"))
               .merge(resources::routes::<SoilAnalysis>("/api/soil-analyses"))
               .merge(resources::routes::<Production>("/api/productions"))
               .merge(resources::routes::<FieldActivity>("/api/activities"))
               .merge(resources::routes::<FieldTreatment>("/api/treatments"))
               .merge(resources::routes::<FieldDocument>("/api/documents"))
               .route("/api/documents/upload", post(documents::upload))
               .route("/api/documents/:id/file", get(documents::download))
               .route("/api/journal/export", get(lookups::export_journal))
               .route("/api/weather", get(lookups::weather))
               .route("/api/crop-info", get(lookups::crop_info_list))
               .route("/api/crop-info/:name", get(lookups::crop_info_one))
               .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD))
}
