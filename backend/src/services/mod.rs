pub mod consents;
pub mod users;
