pub mod university;
