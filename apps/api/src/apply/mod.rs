// Auto-apply orchestration
// Implements: compliance gate, per-platform throttle, payload mappers,
// extension message bus, submission with stub fallback, audit logging.
// Entry point is `engine::ApplyEngine::auto_apply`.

pub mod bus;
pub mod compliance;
pub mod engine;
pub mod handlers;
pub mod mappers;
pub mod payload;
pub mod submitter;
pub mod throttle;

pub use engine::{ApplyEngine, ApplyError, ApplyRequest};
pub use payload::{ApplyFile, ApplyPayload, FileKind, Platform};
