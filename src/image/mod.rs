pub mod f32;
pub mod io;
pub mod region;
pub mod traits;

pub use self::f32::ImageF32;
pub use self::region::{Region, Span};
pub use self::traits::{ImageView, ImageViewMut, Rows};
