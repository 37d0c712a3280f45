pub mod calendar;
pub mod entry_key;
pub mod handlers;
pub mod storage;
