//! Infrastructure layer: storage, identity, realtime connections and DTOs.

pub mod dto;
pub mod identity;
pub mod realtime;
pub mod repository;
pub mod seed;

pub use identity::InMemoryIdentityVerifier;
pub use seed::{Seed, SeedError};
