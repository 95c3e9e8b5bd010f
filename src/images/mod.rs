pub mod services;

pub use services::{discard_image, presign_image, read_image_field, replace_image};
