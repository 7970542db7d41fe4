pub mod input;
pub mod timer;
pub mod typist;
