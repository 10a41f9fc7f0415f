use actix_web::web;

use crate::modules::upload::{handle, storage::FileStorage};

/// Authenticated upload endpoints, mounted under `/api/upload`.
pub fn configure<S>(cfg: &mut web::ServiceConfig)
where
    S: FileStorage + Send + Sync + 'static,
{
    cfg.service(web::resource("/image").route(web::post().to(handle::upload_image::<S>)))
        .service(web::resource("/images").route(web::post().to(handle::upload_images::<S>)))
        .service(web::resource("/base64").route(web::post().to(handle::upload_base64::<S>)))
        .service(web::resource("").route(web::delete().to(handle::delete_file::<S>)));
}

/// Public read access to stored files, mounted under the upload URL prefix.
pub fn public_configure<S>(cfg: &mut web::ServiceConfig)
where
    S: FileStorage + Send + Sync + 'static,
{
    cfg.service(
        web::resource("/{folder}/{filename}").route(web::get().to(handle::serve_file::<S>)),
    );
}
