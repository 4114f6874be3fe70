pub mod document;
pub mod download;
pub mod episodes;
pub mod export;
pub mod identity;
