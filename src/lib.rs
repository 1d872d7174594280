use sqlx::{Pool, Postgres};

use crate::{config::Config, gateway::Gateway, payments::Stripe, storage::ObjectStore};

pub mod config;
pub mod editor;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod middlewares;
pub mod models;
pub mod payments;
pub mod positions;
pub mod schema;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod test_init_app;

/// Process-wide handles, built once in `main` and shared with every handler.
pub struct GlobalState{
    pub pool: Pool<Postgres>,
    pub config: Config,
    pub gateway: Gateway,
    pub stripe: Stripe,
    pub storage: ObjectStore,
}
