pub mod chart;
pub mod gameplay;
pub mod judgment;
pub mod scroll;
pub mod tile;
