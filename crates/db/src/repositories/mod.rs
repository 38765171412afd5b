mod import_repo;
mod upload_repo;

pub use import_repo::ImportRepo;
pub use upload_repo::UploadRepo;
