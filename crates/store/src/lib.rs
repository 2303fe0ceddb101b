#![deny(unused_must_use)]
//! Concrete adapters for the four capability ports plus blob storage:
//! Redis (`KeyValueStore`), Qdrant (`VectorIndex`), Postgres
//! (`RelationalStore`), S3 (uploaded-document blobs).

pub mod blob;
pub mod postgres_relational;
pub mod qdrant_vector;
pub mod redis_kv;

pub use blob::BlobStore;
pub use postgres_relational::PostgresRelationalStore;
pub use qdrant_vector::QdrantVectorIndex;
pub use redis_kv::RedisKeyValueStore;
