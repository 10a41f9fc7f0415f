use actix_web::{middleware::Logger, web, App, HttpServer};
use std::sync::Arc;

use crate::modules::upload::{FileUploadService, FsStorage, UploadConfig};

mod api;
mod configs;
mod constants;
mod middlewares;
mod modules;
#[cfg(test)]
mod test;
mod utils;

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Environment variables loaded from .env file");

    let env = constants::Env::from_env().map_err(std::io::Error::other)?;
    let config = UploadConfig::from_env(&env);

    let storage = configs::init_storage(&config)
        .await
        .map_err(|e| std::io::Error::other(format!("Upload storage init error: {e}")))?;

    let base_url = config.base_url.clone();
    let max_file_size = config.max_file_size;
    let upload_service = FileUploadService::new(Arc::new(storage), config);
    let secret: Arc<str> = env.jwt_secret.clone().into();
    let frontend_url = env.frontend_url.clone();

    log::info!("Starting server at http://{}:{}", env.ip, env.port);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(configs::cors(&frontend_url))
            .app_data(web::Data::new(upload_service.clone()))
            .app_data(configs::json_config(max_file_size))
            .service(health_check)
            .configure(configs::routes::<FsStorage>(base_url.clone(), secret.clone()))
    })
    .bind((env.ip.as_str(), env.port))?
    .workers(env.workers)
    .run()
    .await
}
