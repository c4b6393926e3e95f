pub mod comparison;
pub mod response;

mod axes_draw;
