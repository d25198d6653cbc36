//! `PostgreSQL` sequence provider for Basniowa.
//!
//! Reserves identifier blocks from a named row in the `id_sequences` table. Each
//! reservation is a single `UPDATE … RETURNING` statement, so several processes sharing the
//! database never receive overlapping blocks.
//!
//! # Example
//!
//! ```no_run
//! use basniowa_postgres::{PostgresSequenceConfig, PostgresSequenceProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PostgresSequenceConfig::from_env();
//! let provider = PostgresSequenceProvider::connect(&config).await?;
//! provider.ensure_schema().await?;
//! # Ok(())
//! # }
//! ```

pub mod sequence;

pub use sequence::{PostgresSequenceConfig, PostgresSequenceProvider};
