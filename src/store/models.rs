use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A persisted collection container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bin {
    /// Store-generated identifier
    pub id: i32,

    /// Display name
    pub name: String,

    /// Where the bin is placed
    pub location: String,

    /// Free-form fill/condition status (e.g. "empty", "full")
    pub status: String,

    /// Date associated with the bin record, serialized as `YYYY-MM-DD`
    pub date: NaiveDate,
}

/// Fields for a bin that has not been inserted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBin {
    pub name: String,
    pub location: String,
    pub status: String,
    pub date: NaiveDate,
}

/// Link between a user id and a bin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Assignment {
    /// Store-generated identifier
    pub id: i32,

    /// Principal uid the bin is assigned to
    pub user_id: String,

    /// References `Bin::id`
    pub bin_id: i32,
}

/// Fields for an assignment that has not been inserted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAssignment {
    pub user_id: String,
    pub bin_id: i32,
}
