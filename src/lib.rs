//! An ECMA-262 abstract machine for ahead-of-time reachability analysis.
//!
//! The machine evaluates pre-bound, decorated ASTs (no parser, no JIT) at
//! specification granularity: completion records, property descriptors,
//! the nine essential internal methods, realms and execution contexts, the
//! iterator protocol, and promise job queues. Analysis drivers create a
//! realm, feed scripts through [`Interpreter::evaluate_script`], drain jobs
//! with [`Interpreter::run_jobs`] at checkpoints of their choosing, and
//! inspect the resulting object graph.
//!
//! Two error channels are kept strictly apart: thrown language values
//! travel as data (completions, [`interpreter::EvalError::Thrown`]), while
//! host-side faults (an unsupported construct, an exhausted step budget)
//! surface as typed [`EngineError`]s that no `catch` can swallow.

pub mod ast;
pub mod error;
pub mod interpreter;
pub mod types;

pub use error::EngineError;
pub use interpreter::{
    Completion, Interpreter, IteratorHint, PropertyDescriptor, PropertyKey, RealmId, ScriptId,
};
pub use types::{JsString, JsValue};
