pub mod ordering;
pub mod record_id;
pub mod rows;
pub mod timestamp;
