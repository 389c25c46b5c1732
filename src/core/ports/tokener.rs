use crate::error::Error;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub trait Payload: Serialize + for<'d> Deserialize<'d> {
    /// The authenticated user the token was issued to.
    fn subject(&self) -> Uuid;
}

pub trait Tokener<P: Payload> {
    fn gen_token(&self, payload: &P) -> Result<String, Error>;
    fn verify_token(&self, token: &str) -> Result<P, Error>;
}
