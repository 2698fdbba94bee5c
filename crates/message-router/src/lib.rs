//! Typed messaging between Puzlog's extension contexts.
//!
//! The popup, the content scripts and the service worker never share state
//! directly. They exchange [`Message`]s through the [`ExtensionRuntime`]; only the
//! [`ServiceWorker`] writes records, and it pushes `stateUpdated` to the focused
//! tab after every write.

pub mod content;
pub mod errors;
pub mod popup;
pub mod protocol;
pub mod reporter;
pub mod router;
pub mod runtime;
pub mod tabs;
pub mod worker;

pub use content::ContentScriptContext;
pub use errors::RouterError;
pub use popup::{PopupClient, TabStatus};
pub use protocol::{Envelope, Message, MessageKind, Origin, Response};
pub use reporter::ElapsedReporter;
pub use router::{handler_fn, MessageHandler, MessageRouter};
pub use runtime::{ExtensionRuntime, DEFAULT_MESSAGE_TIMEOUT};
pub use tabs::{InMemoryTabHost, TabHost, TabId, TabInfo};
pub use worker::{ServiceWorker, WorkerConfig};
