pub mod ss;
pub mod window;
