use std::{error::Error, sync::Arc};

use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use tokio::{fs, net, task};
use tower_http::cors::CorsLayer;
use tracing_subscriber::{
    layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter,
};

use outage_tickets::{
    config::Db,
    db::{self, Repository},
    server::{self, AppState},
    Config,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = fs::read_to_string("config.toml").await?;
    let config = toml::from_str::<Config>(&config)?;

    let repo: Arc<dyn Repository> = match &config.db {
        Db::Postgres { url, users } => {
            let (db_client, db_connection) = db::connect(url).await?;

            task::spawn(async move {
                if let Err(e) = db_connection.await {
                    panic!("database connection failed: {e}");
                }
            });

            db_client.migrate().await?;
            for user in users {
                db_client.write_user(&db::seed_user(user)).await?;
            }
            tracing::info!(seeded = users.len(), "connected to postgres");
            Arc::new(db_client)
        }
        Db::Memory { users } => {
            tracing::info!(seeded = users.len(), "using in-memory store");
            Arc::new(db::Memory::with_users(users.iter().map(db::seed_user)))
        }
    };

    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);
    for origin in &config.http.cors.allowed_origins {
        cors = cors.allow_origin(origin.parse::<HeaderValue>()?);
    }

    let app = server::router(Arc::new(AppState::new(repo, &config.jwt)))
        .layer(cors);

    let listener = net::TcpListener::bind(config.http.server.addr).await?;
    tracing::info!(addr = %config.http.server.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
