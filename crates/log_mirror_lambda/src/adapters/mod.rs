pub mod checkpoint;
pub mod credentials;
pub mod object_store;
