//! Finding catalog ids directly: from catalog URLs and from links embedded in release pages.

pub mod embedded;
pub mod kp;
