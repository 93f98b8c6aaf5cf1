pub mod header;
pub mod schedule_fields;
