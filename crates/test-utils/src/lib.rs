//! Test utilities shared across signupd crates.

mod test_dir;

pub use test_dir::TestDir;
