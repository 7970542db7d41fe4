pub mod keyboard_diagram;
pub mod prompt_area;
pub mod selector;
pub mod status_bar;
