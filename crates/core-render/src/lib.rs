//! Framebuffer, region rendering, and tile geometry.
//!
//! Everything the partitioning strategies share: the coordinator-owned
//! [`Framebuffer`], the [`Region`] descriptor that addresses a rectangle in
//! both image space and a local staging buffer, the renderer that shades a
//! region, and the layout math ([`Strips`], [`BlockGrid`], [`Bands`],
//! [`TileCursor`]) that decides which rank owns which pixels.

pub mod framebuffer;
pub mod layout;
pub mod region;

pub use framebuffer::Framebuffer;
pub use layout::{Bands, BlockGrid, Strips, TileCursor};
pub use region::{Region, render_region};
