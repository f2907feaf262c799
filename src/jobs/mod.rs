// Jobs module - Scheduled background work

pub mod tax_history_sync;
