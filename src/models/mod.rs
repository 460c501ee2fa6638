pub mod certificate;
pub mod course;
