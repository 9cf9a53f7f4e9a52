mod config;
mod db;
mod errors;
mod models;
mod routes;
mod upload;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::middleware::Logger;
use actix_web::web::Data;
use actix_web::{App, HttpServer, web};
use env_logger::Env;

use crate::config::Config;
use crate::db::Db;
use crate::routes::{health, images};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Init logger to show info by default, but can be overridden by RUST_LOG
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cfg = Config::init();

    let db = Db::connect_and_migrate(&cfg.database_path)
        .await
        .expect("database init failed");

    log::info!("Starting server at {}", cfg.listen);

    let listen_addr = cfg.listen.clone();
    let uploads_dir = cfg.uploads_dir.clone();
    HttpServer::new(move || {
        let cors = Cors::permissive()
            .allowed_methods(vec!["GET", "POST", "DELETE"])
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(Data::new(cfg.clone()))
            .app_data(Data::new(db.clone()))
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(health::health_check))
                    .route("/upload", web::post().to(images::upload_image))
                    .route("/images/{id}", web::get().to(images::get_image))
                    .route("/images/{id}", web::delete().to(images::delete_image)),
            )
            .service(Files::new("/uploads", uploads_dir.clone()))
    })
    .bind(listen_addr)?
    .run()
    .await
}
