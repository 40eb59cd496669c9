pub mod init;
pub mod university;
