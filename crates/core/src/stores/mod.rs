pub mod file;
pub mod memory;
pub mod remote;
pub mod vision;

pub use file::FileBlobStore;
pub use memory::MemoryBlobStore;
pub use remote::HttpRemoteSearcher;
pub use vision::HttpImageAnalyzer;
