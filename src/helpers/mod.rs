//! Helper functions shared by the renderer, generator and server

pub mod cloudinary;
mod date;
mod html;
mod url;

pub use cloudinary::{is_cloudinary_url, transform_url, Transformation};
pub use date::*;
pub use html::*;
pub use url::*;
