//! CLI command implementations.
//!
//! Each submodule owns one `Commands` variant:
//!
//! | Module   | Commands handled |
//! |----------|------------------|
//! | `watch`  | `Watch`          |
//! | `render` | `Render`         |
//! | `docs`   | `Docs`           |
//! | `config` | `Config`         |

pub mod config;
pub mod docs;
pub mod render;
pub mod watch;

pub use config::cmd_config;
pub use docs::cmd_docs;
pub use render::cmd_render;
pub use watch::cmd_watch;
