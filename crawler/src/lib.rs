pub mod client;
pub mod delivery;
pub mod fetch;
pub mod harvest;
