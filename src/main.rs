use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use obra_control_server::{
    config::AppConfig, database, models::session::SessionMiddlewareFactory, routes,
};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("obra_control_server=debug,actix_web=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config: AppConfig =
        AppConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    database::connect(&config.mongodb_uri, &config.database_name)
        .await
        .map_err(io::Error::other)?;

    tracing::info!(host = %config.host, port = config.port, "starting server");

    let bind = (config.host.clone(), config.port);
    HttpServer::new(move || {
        let cors = match &config.cors_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header(),
            None => Cors::permissive(),
        };
        App::new()
            .wrap(SessionMiddlewareFactory)
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(config.clone()))
            .configure(routes::configure)
    })
    .bind(bind)?
    .run()
    .await
}
