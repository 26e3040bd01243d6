//! Helpers for tests: throwaway SQLite databases, a scripted payment provider and a small seeded catalog.
pub mod prepare_env;
pub mod scripted_provider;
pub mod seed;
