pub mod cloudinary;
pub mod memory_store;
pub mod mock_media;
pub mod pg_store;

pub use cloudinary::CloudinaryAdapter;
pub use memory_store::InMemoryStore;
pub use mock_media::MockMediaStore;
pub use pg_store::PgDocumentStore;
