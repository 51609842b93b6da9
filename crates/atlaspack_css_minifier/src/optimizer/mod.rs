pub mod level1;
pub mod level2;
