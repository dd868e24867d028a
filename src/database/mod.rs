pub mod document;
pub mod memory;
pub mod postgres;
pub mod store;

pub use document::{
    parse_id, DeleteResult, Document, Filter, InsertOneResult, Projection, UpdateResult, ID_FIELD,
};
pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;
pub use store::{DocumentStore, StoreError};
