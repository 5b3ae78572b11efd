pub mod apply;
pub mod index;
pub mod init;
pub mod render;
pub mod versions;
