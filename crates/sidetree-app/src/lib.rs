//! State transitions, scheduling and redraw for sidetree.
//!
//! Commands arrive as [`Event`]s. The [`Dispatcher`] runs them one at a time
//! through the registered [`Transition`]s, committing each resulting
//! [`Stage`]; the [`RedrawGate`] renders the newest commit; the [`Ticker`]
//! keeps the tree fresh in the background. [`Engine`] wires the three.
//!
//! # Example
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use sidetree_app::{CommandId, Engine, RenderError, Renderer, Stage, rows};
//! use sidetree_core::Settings;
//!
//! struct Print;
//!
//! #[async_trait]
//! impl Renderer for Print {
//!     async fn render(&self, stage: &Stage) -> Result<(), RenderError> {
//!         for row in rows(&stage.state) {
//!             println!("{}{}", "  ".repeat(row.depth), row.name);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # async fn demo() -> Result<(), sidetree_app::EngineError> {
//! let engine = Engine::new(Settings::load()?, std::env::current_dir().unwrap(), Print).await?;
//! engine.sender().sync(CommandId::ToggleHidden, serde_json::Value::Null)?;
//! engine.run().await;
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
mod queue;
mod redraw;
mod scheduler;
mod session;
mod state;
mod ticker;
mod transition;
mod transitions;
mod view;

pub use engine::Engine;
pub use error::{EngineError, RenderError, TransitionError};
pub use queue::{Event, EventClass, EventReceiver, EventSender, channel};
pub use redraw::{RedrawGate, Renderer};
pub use scheduler::{Dispatcher, Staged};
pub use session::{Session, StoredSession};
pub use state::{Forward, Stage, State};
pub use ticker::Ticker;
pub use transition::{CommandId, Context, Registry, Transition, parse_args};
pub use view::{Row, rows};
