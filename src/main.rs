extern crate actix_web;
extern crate chrono;
extern crate dotenv;
extern crate jsonwebtoken;
extern crate serde;
extern crate thiserror;

mod config;
mod context;
mod core;
mod database;
mod error;
mod handlers;
mod impls;
mod middlewares;
mod response;

use actix_web::web::{delete, get, post, put, scope, Data};
use actix_web::HttpServer;
use config::Config;
use database::pg::PgSqlxManager;
use middlewares::jwt::JWTMiddleware;
use middlewares::membership::OrganizationMember;
use sqlx::postgres::PgPoolOptions;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Config::from_env()?;
    let pool = PgPoolOptions::new().max_connections(config.max_connections).connect(&config.database_url).await?;
    log::info!("listening on {}:{}", config.bind_address, config.port);
    let secret = config.jwt_secret.clone().into_bytes();
    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(Data::new(PgSqlxManager::new(pool.clone())))
            .service(
                scope("organizations/{organization_id}")
                    .wrap(OrganizationMember::new(pool.clone(), "organization_id"))
                    .wrap(JWTMiddleware::new(secret.clone()))
                    .service(
                        scope("branches")
                            .route("", get().to(handlers::branch::list))
                            .route("mine", get().to(handlers::branch::mine))
                            .route("{branch_id}/users", post().to(handlers::branch::assign_user)),
                    )
                    .service(
                        scope("incomes")
                            .route("", post().to(handlers::income::create))
                            .route("search", post().to(handlers::income::search))
                            .route("summary", post().to(handlers::income::summary))
                            .route("{income_id}", get().to(handlers::income::detail))
                            .route("{income_id}", put().to(handlers::income::update))
                            .route("{income_id}", delete().to(handlers::income::delete)),
                    )
                    .service(
                        scope("expenses")
                            .route("", post().to(handlers::expense::create))
                            .route("search", post().to(handlers::expense::search))
                            .route("summary", post().to(handlers::expense::summary))
                            .route("{expense_id}", get().to(handlers::expense::detail))
                            .route("{expense_id}", put().to(handlers::expense::update))
                            .route("{expense_id}", delete().to(handlers::expense::delete)),
                    )
                    .service(
                        scope("pledges")
                            .route("", post().to(handlers::pledge::create))
                            .route("search", post().to(handlers::pledge::search))
                            .route("{pledge_id}", get().to(handlers::pledge::detail))
                            .route("{pledge_id}", put().to(handlers::pledge::update))
                            .route("{pledge_id}", delete().to(handlers::pledge::delete))
                            .route("{pledge_id}/payments", get().to(handlers::pledge::payments))
                            .route("{pledge_id}/payments", post().to(handlers::pledge::record_payment))
                            .route("{pledge_id}/payments/{payment_id}", delete().to(handlers::pledge::delete_payment)),
                    )
                    .service(
                        scope("attendance")
                            .route("occasions", get().to(handlers::attendance::occasions))
                            .route("occasions/{occasion_id}/sessions", get().to(handlers::attendance::sessions))
                            .route("records/search", post().to(handlers::attendance::search))
                            .route("sessions/{session_id}/records", put().to(handlers::attendance::mark))
                            .route("sessions/{session_id}/summary", get().to(handlers::attendance::summary)),
                    )
                    .service(
                        scope("groups")
                            .route("", post().to(handlers::group::create))
                            .route("search", post().to(handlers::group::search))
                            .route("{group_id}", get().to(handlers::group::detail))
                            .route("{group_id}", put().to(handlers::group::update))
                            .route("{group_id}/close", post().to(handlers::group::close))
                            .route("{group_id}/members", get().to(handlers::group::members))
                            .route("{group_id}/members", put().to(handlers::group::assign_member))
                            .route("{group_id}/members/{member_id}", delete().to(handlers::group::remove_member)),
                    ),
            )
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await?;
    Ok(())
}
