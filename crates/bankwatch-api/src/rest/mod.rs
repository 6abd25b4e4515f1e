// REST surface of the entity store.

mod client;
mod entities;
mod hierarchy;
mod profiles;
pub mod query;
pub mod types;

pub use client::RestClient;
