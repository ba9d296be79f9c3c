pub mod color;
pub mod value;

pub use color::Color;
pub use value::{as_bool, as_number, display_string, is_blank, number_compare, values_equal};
