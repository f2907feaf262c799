// Services module - External clients and business logic

pub mod esi;
pub mod tax_history;
