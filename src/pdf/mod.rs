//! PDF rendering of invoices: fixed A4 layout, Polish labels, platform
//! font probing with a monospace fallback.

mod fonts;
mod render;

pub use fonts::{FontResolver, ResolvedFont};
pub use render::render_invoice;
