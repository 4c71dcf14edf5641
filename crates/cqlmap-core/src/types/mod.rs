mod blob;
mod counter;
mod timestamp;

pub use blob::Blob;
pub use counter::Counter;
pub use timestamp::Timestamp;
pub use uuid::Uuid;
