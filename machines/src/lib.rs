pub mod cmos_ram;
pub mod colorbars;
pub mod registry;
pub mod rom_loader;

pub use colorbars::ColorBars;
