pub mod extract;
pub mod generate;
pub mod init;
pub mod install;
pub mod status;
pub mod sync;
pub mod validate;
pub mod visualize;
