use std::sync::Arc;

use crate::{
    config::JwtConfig,
    db::{DbPool, OrmConn},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub jwt: Arc<JwtConfig>,
}
