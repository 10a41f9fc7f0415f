use actix_cors::Cors;
use actix_web::{error::JsonPayloadError, http::header, middleware::from_fn, web};
use std::sync::Arc;

use crate::{
    api::error,
    middlewares::authentication,
    modules::upload::{self, ensure_layout, FileStorage, FsStorage, Rejection, UploadConfig},
};

/// Creates the upload layout and hands back storage rooted at it.
pub async fn init_storage(config: &UploadConfig) -> Result<FsStorage, error::SystemError> {
    ensure_layout(&config.root, &config.folders).await?;
    Ok(FsStorage::new(&config.root))
}

/// Large enough for a base64-encoded file of `max_file_size` bytes. Bodies past the
/// limit get the same "too large" reason as oversized uploads.
pub fn json_config(max_file_size: usize) -> web::JsonConfig {
    web::JsonConfig::default().limit(max_file_size.div_ceil(3) * 4 + 64 * 1024).error_handler(
        move |err, _req| match err {
            JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
                error::Error::from(error::SystemError::from(Rejection::ExceedsLimit {
                    max: max_file_size,
                }))
                .into()
            }
            other => error::Error::bad_request(other.to_string()).into(),
        },
    )
}

pub fn cors(frontend_url: &str) -> Cors {
    Cors::default()
        .allowed_origin(frontend_url)
        .allowed_methods(vec!["GET", "POST", "DELETE"])
        .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
        .supports_credentials()
        .max_age(3600)
}

pub fn routes<S>(base_url: String, secret: Arc<str>) -> impl FnOnce(&mut web::ServiceConfig)
where
    S: FileStorage + Send + Sync + 'static,
{
    move |cfg: &mut web::ServiceConfig| {
        cfg.service(web::scope(&base_url).configure(upload::route::public_configure::<S>))
            .service(
                web::scope("/api").service(
                    web::scope("/upload")
                        .wrap(from_fn(authentication(secret)))
                        .configure(upload::route::configure::<S>),
                ),
            );
    }
}
