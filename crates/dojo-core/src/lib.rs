pub mod domain;
pub mod notebook;
pub mod periodic;
pub mod pseudo;
pub mod report;
pub mod table;
