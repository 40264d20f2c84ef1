pub mod callback_bridge;
pub mod gain;
pub mod mixer;
pub mod ring_buffer;
pub mod silence;
