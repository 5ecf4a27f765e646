//! GPU command submission
//!
//! - [`CommandChain`] - fixed-capacity linked list of GP0 packets
//! - [`DmaEngine`] - linked-list and VRAM block transfers over DMA channel 2
//! - [`TextureUploader`] - VRAM uploads returning draw-ready descriptors
//! - [`FramePacer`] - double buffering paced to vertical blank
//! - [`setup_display`] - display timing and video mode

pub mod chain;
pub mod display;
pub mod dma;
pub mod frame;
pub mod texture;

pub use chain::{ChainError, CommandChain, Packets, CHAIN_BUFFER_SIZE};
pub use display::{detect_standard, setup_display};
pub use dma::{BlockLayout, DmaEngine, DmaError, DMA_MAX_CHUNK_SIZE};
pub use frame::{Frame, FrameContext, FramePacer, FrameTarget};
pub use texture::{TextureDescriptor, TextureUploader, UploadError, MAX_TEXTURE_SIZE};
