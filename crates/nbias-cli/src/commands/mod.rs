pub mod decrypt;
pub mod edit;
pub mod encrypt;
pub mod info;
pub mod misc;
