pub mod io;
pub mod preprocess;

pub use io::{load_image, resize_rgb, save_image, target_dimensions};
pub use preprocess::{deprocess, preprocess, BGR_MEAN};
