pub mod attendance;
pub mod branch;
pub mod expense;
pub mod group;
pub mod income;
pub mod pledge;

use crate::actix_web::web::Data;
use crate::database::pg::PgSqlxManager;
use chrono::{NaiveDate, Utc};

pub(crate) type DB = Data<PgSqlxManager>;

/// Date presets resolve against the server's current UTC date.
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}
