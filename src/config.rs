use std::{net, time};

use serde::Deserialize;

use crate::db::user::Role;

#[derive(Deserialize)]
pub struct Config {
    pub db: Db,
    pub http: Http,
    pub jwt: Jwt,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Db {
    Postgres {
        url: String,
        /// Inserted on startup unless the login already exists.
        #[serde(default)]
        users: Vec<SeedUser>,
    },

    /// Volatile store, populated with the listed users on startup.
    Memory {
        #[serde(default)]
        users: Vec<SeedUser>,
    },
}

#[derive(Deserialize)]
pub struct SeedUser {
    pub name: String,
    pub login: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Deserialize)]
pub struct Http {
    pub server: Server,
    pub cors: Cors,
}

#[derive(Deserialize)]
pub struct Server {
    pub addr: net::SocketAddr,
}

#[derive(Deserialize)]
pub struct Cors {
    pub allowed_origins: Vec<String>,
}

#[derive(Deserialize)]
pub struct Jwt {
    pub secret: String,
    #[serde(with = "humantime_serde")]
    pub expiration_time: time::Duration,
}
