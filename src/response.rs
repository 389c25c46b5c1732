use crate::serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct Created {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct Marked {
    pub marked: usize,
}
