//! Token handling (HS256 JWT claims, agent credential minting).

pub mod jwt;
