pub mod capture;
pub mod dma;
pub mod negotiate;
