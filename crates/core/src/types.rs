/// All surrogate keys are MySQL `BIGINT AUTO_INCREMENT`.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Calendar date of a movement or reservation (no time component).
pub type Date = chrono::NaiveDate;

/// Stock quantities are whole units.
pub type Quantity = i32;
