// src/main.rs

mod app_state;
mod auth;
mod cache;
mod config;
mod db;
mod models;
mod pages;
mod route_gate;
mod tasks;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http, middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use crate::app_state::AppState;
use crate::auth::{login, logout, signup};
use crate::cache::DashboardCache;
use crate::pages::{dashboard_page, login_page, signup_page};
use crate::route_gate::RouteGate;
use crate::tasks::{create_task, delete_task, get_tasks, update_task};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = config::Config::from_env();
    let mongodb = Arc::new(db::MongoDB::init(&config.mongo_uri, &config.database_name).await);
    let dashboard_cache = Arc::new(DashboardCache::default());

    println!("Server running at http://{}", config.bind_addr);
    println!("Allowed CORS Origin: {}", config.frontend_origin);

    let bind_addr = config.bind_addr.clone();

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&config.frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                http::header::CONTENT_TYPE,
                http::header::ACCEPT,
                http::header::AUTHORIZATION,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(RouteGate::new(config.jwt_secret.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(web::Data::new(AppState {
                mongodb: mongodb.clone(),
                config: config.clone(),
                dashboard_cache: dashboard_cache.clone(),
            }))
            // AUTH PAGES + SESSION
            .route("/login", web::get().to(login_page))
            .route("/login", web::post().to(login))
            .route("/signup", web::get().to(signup_page))
            .route("/signup", web::post().to(signup))
            .route("/logout", web::post().to(logout))
            // DASHBOARD (page + task actions)
            .service(
                web::scope("/dashboard")
                    .route("", web::get().to(dashboard_page))
                    .route("/tasks", web::get().to(get_tasks))
                    .route("/tasks", web::post().to(create_task))
                    .route("/tasks/{task_id}", web::put().to(update_task))
                    .route("/tasks/{task_id}", web::delete().to(delete_task)),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
