// Models module - Database entity representations

pub mod aggregate;
pub mod character_payout;
pub mod corp_payout;
pub mod corp_tax;
pub mod corporation;
pub mod per_member;
pub mod tax_history;
pub mod user;
pub mod wallet;

pub use character_payout::CharacterPayoutTaxConfiguration;
pub use corp_payout::CorpTaxPayoutTaxConfiguration;
pub use corp_tax::CorpTaxConfiguration;
pub use corporation::EveCorporation;
pub use per_member::CorpTaxPerMemberTaxConfiguration;
pub use tax_history::CorpTaxHistory;
pub use user::User;
