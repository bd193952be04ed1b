//! The abstract machine: object heap, realms, execution contexts, and the
//! driver-facing evaluation surface.

use crate::ast::Program;
use crate::error::EngineError;
use crate::types::{JsString, JsSymbol, JsValue, WellKnownSymbol};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

mod types;
pub use types::*;

pub mod context;
pub mod realm;
pub use context::{ExecutionContext, ModuleId, ScriptId, ScriptOrModule};
pub use realm::{Intrinsic, Realm, RealmId};

mod helpers;
pub(crate) use helpers::*;
mod eval;
mod exec;
mod exotic;
mod function;
mod iterator;
mod jobs;
mod ordinary;
pub use iterator::IteratorHint;
pub use jobs::{Job, JobKind};

pub struct Interpreter {
    pub(crate) realms: Vec<realm::Realm>,
    /// Object heap: slot vector with a free list. Object lifetime is plain
    /// reference counting; slots only pin objects so ids stay valid.
    objects: Vec<Option<ObjRef>>,
    free_list: Vec<usize>,
    /// Realms of the pushed contexts, innermost last.
    pub(crate) realm_chain: Vec<RealmId>,
    pub(crate) well_known: WellKnownSymbols,
    next_symbol_id: u64,
    pub(crate) next_context_id: u64,
    pub(crate) job_queues: FxHashMap<String, VecDeque<jobs::Job>>,
    pub(crate) queue_order: Vec<String>,
    /// Remaining node-evaluation budget; `None` means unbounded.
    steps_remaining: Option<u64>,
    /// Throw completions that escaped a job with no capability to reject.
    pub uncaught_job_errors: Vec<JsValue>,
}

/// One instance of each well-known symbol (§6.1.5.1), shared by all realms
/// of the machine.
#[derive(Clone, Debug)]
pub struct WellKnownSymbols {
    pub iterator: JsSymbol,
    pub async_iterator: JsSymbol,
    pub has_instance: JsSymbol,
    pub to_primitive: JsSymbol,
    pub to_string_tag: JsSymbol,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let mut next_symbol_id = 1;
        let mut well_known = |which: WellKnownSymbol| {
            let sym = JsSymbol {
                id: next_symbol_id,
                description: Some(JsString::from_str(which.description())),
            };
            next_symbol_id += 1;
            sym
        };
        let well_known = WellKnownSymbols {
            iterator: well_known(WellKnownSymbol::Iterator),
            async_iterator: well_known(WellKnownSymbol::AsyncIterator),
            has_instance: well_known(WellKnownSymbol::HasInstance),
            to_primitive: well_known(WellKnownSymbol::ToPrimitive),
            to_string_tag: well_known(WellKnownSymbol::ToStringTag),
        };
        Self {
            realms: Vec::new(),
            objects: Vec::new(),
            free_list: Vec::new(),
            realm_chain: Vec::new(),
            well_known,
            next_symbol_id,
            next_context_id: 1,
            job_queues: FxHashMap::default(),
            queue_order: Vec::new(),
            steps_remaining: None,
            uncaught_job_errors: Vec::new(),
        }
    }

    /// Bound the number of node evaluations before the machine aborts with
    /// [`EngineError::BudgetExceeded`]. The only cancellation mechanism.
    pub fn set_step_budget(&mut self, budget: Option<u64>) {
        self.steps_remaining = budget;
    }

    pub(crate) fn check_budget(&mut self) -> Result<(), EngineError> {
        match &mut self.steps_remaining {
            None => Ok(()),
            Some(0) => Err(EngineError::BudgetExceeded),
            Some(n) => {
                *n -= 1;
                Ok(())
            }
        }
    }

    // ---- heap ----

    pub(crate) fn allocate_object_slot(&mut self, obj: ObjRef) -> u64 {
        let id = if let Some(slot) = self.free_list.pop() {
            self.objects[slot] = Some(obj.clone());
            slot as u64
        } else {
            self.objects.push(Some(obj.clone()));
            (self.objects.len() - 1) as u64
        };
        obj.borrow_mut().id = Some(id);
        id
    }

    pub fn get_object(&self, id: u64) -> Option<ObjRef> {
        self.objects.get(id as usize).and_then(|slot| slot.clone())
    }

    /// Resolve a value expected to be an object into its heap record.
    pub(crate) fn object_ref(&mut self, val: &JsValue) -> JsResult<ObjRef> {
        if let JsValue::Object(o) = val
            && let Some(obj) = self.get_object(o.id)
        {
            return Ok(obj);
        }
        Err(self.throw_type_error(&format!("{} is not an object", val.type_name())))
    }

    pub(crate) fn object_value(&self, obj: &ObjRef) -> JsValue {
        let id = obj
            .borrow()
            .id
            .unwrap_or_else(|| panic!("object escaped the heap without a slot"));
        JsValue::Object(crate::types::JsObject { id })
    }

    /// Allocate an object record with the given prototype and exotic tag.
    pub(crate) fn create_object(&mut self, prototype: Option<ObjRef>, kind: ObjectKind) -> ObjRef {
        let mut data = JsObjectData::new(kind);
        data.prototype = prototype;
        let obj = Rc::new(RefCell::new(data));
        self.allocate_object_slot(obj.clone());
        obj
    }

    pub(crate) fn create_symbol(&mut self, description: Option<JsString>) -> JsSymbol {
        let id = self.next_symbol_id;
        self.next_symbol_id += 1;
        JsSymbol { id, description }
    }

    // ---- error objects ----

    pub(crate) fn create_error_object(&mut self, proto: Intrinsic, message: &str) -> JsValue {
        let proto_obj = self.intrinsic(proto);
        let err = self.create_object(Some(proto_obj), ObjectKind::Error);
        err.borrow_mut().insert_property(
            PropertyKey::from_str("message"),
            PropertyDescriptor::data(JsValue::string(message), true, false, true),
        );
        self.object_value(&err)
    }

    pub(crate) fn create_type_error(&mut self, message: &str) -> JsValue {
        self.create_error_object(Intrinsic::TypeErrorPrototype, message)
    }

    pub(crate) fn create_range_error(&mut self, message: &str) -> JsValue {
        self.create_error_object(Intrinsic::RangeErrorPrototype, message)
    }

    /// A `TypeError` throw completion on the error channel.
    pub(crate) fn throw_type_error(&mut self, message: &str) -> EvalError {
        EvalError::Thrown(self.create_type_error(message))
    }

    pub(crate) fn throw_range_error(&mut self, message: &str) -> EvalError {
        EvalError::Thrown(self.create_range_error(message))
    }

    pub(crate) fn unsupported(&self, feature: &'static str) -> EvalError {
        log::warn!("unsupported specification clause reached: {feature}");
        EvalError::Engine(EngineError::Unsupported { feature })
    }

    // ---- driver surface ----

    /// Evaluate a decorated program as top-level script code of `realm`.
    ///
    /// Pushes a script execution context, performs
    /// GlobalDeclarationInstantiation, evaluates the statement list, pops the
    /// context, and hands the resulting completion to the driver unreduced
    /// (an unhandled `Throw` stays a `Throw`). Job queues are *not* drained
    /// here; the driver decides the checkpoint via [`Interpreter::run_jobs`].
    pub fn evaluate_script(
        &mut self,
        realm: RealmId,
        script: ScriptId,
        program: &Program,
    ) -> Result<Completion, EngineError> {
        let global_env = self.realms[realm.0].global_env.clone();
        let ctx = self.new_context(
            None,
            realm,
            Some(ScriptOrModule::Script(script)),
            Some(global_env.clone()),
            Some(global_env.clone()),
        );
        self.push_context(ctx);
        let result = (|| {
            match self.global_declaration_instantiation(&program.body, &global_env) {
                Ok(()) => {}
                Err(EvalError::Thrown(v)) => return Ok(Completion::Throw(v)),
                Err(EvalError::Engine(e)) => return Err(e),
            }
            self.evaluate_statements(&program.body, &global_env)
        })();
        self.pop_context();
        // §16.1.7: an empty script completion value is undefined.
        result.map(|c| c.update_empty(JsValue::Undefined))
    }

    /// Deterministic display string for reporting values to the driver.
    pub fn format_value(&self, val: &JsValue) -> String {
        match val {
            JsValue::Object(o) => {
                if let Some(obj) = self.get_object(o.id) {
                    let obj = obj.borrow();
                    if let Some(JsValue::String(msg)) =
                        obj.get_value(&PropertyKey::from_str("message"))
                    {
                        let name = match obj.get_value(&PropertyKey::from_str("name")) {
                            Some(JsValue::String(n)) => n.to_rust_string(),
                            _ => self.proto_error_name(&obj),
                        };
                        if name.is_empty() {
                            return msg.to_rust_string();
                        }
                        return format!("{name}: {}", msg.to_rust_string());
                    }
                    if let Some(JsFunction::Ecma(slots)) = &obj.callable {
                        return format!("[function {}]", slots.source.describe());
                    }
                    return format!("[object {}]", obj.kind.class_name());
                }
                format!("{val}")
            }
            _ => format!("{val}"),
        }
    }

    fn proto_error_name(&self, obj: &JsObjectData) -> String {
        let mut proto = obj.prototype.clone();
        while let Some(p) = proto {
            let b = p.borrow();
            if let Some(JsValue::String(n)) = b.get_value(&PropertyKey::from_str("name")) {
                return n.to_rust_string();
            }
            proto = b.prototype.clone();
        }
        String::new()
    }
}
