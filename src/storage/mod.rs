//! Storage backends: four repositories, three interchangeable providers (spec §4.5).
//!
//! Grounded on the teacher's `memory::Store` trait family (`InMemoryVectorStore`,
//! `SqliteStore`, `SqliteVecStore`): here the single key/value `Store` surface
//! is specialized into one typed repository trait per entity
//! ([`ResourceRepository`], [`ItemRepository`], [`CategoryRepository`],
//! [`CategoryItemRepository`]), each implemented three times — `in_memory`,
//! `relational` (embeddings as a serialized-float text column), and `vector`
//! (embeddings in a native `sqlite-vec` column with k-NN push-down).

mod error;
mod filter;
mod repository;
mod similarity;

pub mod in_memory;
pub mod relational;
pub mod vector;

pub use error::StorageError;
pub use filter::{FilterValue, WhereFilter};
pub use repository::{
    CategoryItemRepository, CategoryRepository, ItemRepository, RepositorySet, ResourceRepository,
    Scored,
};
pub use similarity::cosine_similarity;
