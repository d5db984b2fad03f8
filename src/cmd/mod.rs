pub mod init;
pub mod list;
pub mod migrate;
pub mod root;
