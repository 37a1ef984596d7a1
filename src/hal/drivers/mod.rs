pub mod image_dir;
pub mod offline;

pub use image_dir::ImageDirDriver;
pub use offline::OfflineDriver;
