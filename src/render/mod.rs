//! Render tile & tile map (component F, §4.6), output framebuffer
//! (component G, §4.7), stream pipeline (component H, §4.8), and the
//! render context orchestrating workers over them (component J).

pub mod context;
pub mod events;
pub mod image;
pub mod output;
pub mod pipeline;
pub mod ray;
pub mod tile;
pub mod tile_map;

pub use context::{RenderContext, RenderStatus};
pub use events::{LoggingObserver, NullObserver, RenderObserver, TileEvent};
pub use image::{collect_channels, write_output, Channel, ImageWriter, InMemoryImage};
pub use output::{Feedback, OutputFramebuffer};
pub use pipeline::StreamPipeline;
pub use ray::{Ray, RayFlags};
pub use tile::{RenderTile, TileState};
pub use tile_map::{default_tile_size, TileLayout, TileMap};
