//! Named FIFO job queues (§9.5) and the promise scheduling they carry
//! (§27.2). The driver picks the checkpoint; `run_jobs` then drains every
//! queue to a fixed point.

use super::context::ScriptOrModule;
use super::*;
use crate::error::EngineError;
use crate::types::JsValue;
use std::collections::VecDeque;
use std::rc::Rc;

/// A pending abstract closure plus the realm and script/module it must run
/// under.
pub struct Job {
    pub realm: RealmId,
    pub script_or_module: Option<ScriptOrModule>,
    pub kind: JobKind,
}

pub enum JobKind {
    /// Plain host callback.
    Call {
        func: JsValue,
        this: JsValue,
        args: Vec<JsValue>,
    },
    /// §27.2.2.1 NewPromiseReactionJob
    PromiseReaction {
        reaction: PromiseReaction,
        argument: JsValue,
    },
    /// §27.2.2.2 NewPromiseResolveThenableJob
    PromiseResolveThenable {
        promise: JsValue,
        thenable: JsValue,
        then: JsValue,
    },
}

impl Interpreter {
    /// §9.5.4 HostEnqueueGenericJob — FIFO per queue; queues drain in the
    /// order they were first used.
    pub fn enqueue_job(&mut self, queue: &str, kind: JobKind) {
        let job = Job {
            realm: self.current_realm_id(),
            script_or_module: self.running_script_or_module(),
            kind,
        };
        if !self.job_queues.contains_key(queue) {
            self.queue_order.push(queue.to_string());
            self.job_queues.insert(queue.to_string(), VecDeque::new());
        }
        log::debug!("enqueue job on queue {queue:?}");
        self.job_queues.get_mut(queue).unwrap().push_back(job);
    }

    /// Drain all queues to a fixed point. Each job runs in a fresh minimal
    /// execution context. A throw completion escaping a job is routed to its
    /// capability when one exists, otherwise recorded in
    /// `uncaught_job_errors`; engine faults abort the drain.
    pub fn run_jobs(&mut self) -> Result<(), EngineError> {
        loop {
            let mut next = None;
            for name in &self.queue_order {
                if let Some(q) = self.job_queues.get_mut(name)
                    && let Some(job) = q.pop_front()
                {
                    next = Some((name.clone(), job));
                    break;
                }
            }
            let Some((queue, job)) = next else {
                return Ok(());
            };
            log::trace!("running job from queue {queue:?}");
            let ctx = self.new_context(None, job.realm, job.script_or_module, None, None);
            self.push_context(ctx);
            let result = self.run_job_kind(job.kind);
            self.pop_context();
            result?;
        }
    }

    fn run_job_kind(&mut self, kind: JobKind) -> Result<(), EngineError> {
        match kind {
            JobKind::Call { func, this, args } => {
                match self.call(&func, &this, &args) {
                    Ok(_) => Ok(()),
                    Err(EvalError::Thrown(v)) => {
                        self.uncaught_job_errors.push(v);
                        Ok(())
                    }
                    Err(EvalError::Engine(e)) => Err(e),
                }
            }
            JobKind::PromiseReaction { reaction, argument } => {
                let handler_result = match &reaction.handler {
                    None => match reaction.kind {
                        ReactionKind::Fulfill => Ok(argument),
                        ReactionKind::Reject => Err(EvalError::Thrown(argument)),
                    },
                    Some(handler) => {
                        self.call(&handler.clone(), &JsValue::Undefined, &[argument])
                    }
                };
                let Some(capability) = reaction.capability else {
                    if let Err(EvalError::Thrown(v)) = handler_result {
                        self.uncaught_job_errors.push(v);
                    } else if let Err(EvalError::Engine(e)) = handler_result {
                        return Err(e);
                    }
                    return Ok(());
                };
                let settle = match handler_result {
                    Ok(v) => self.call(&capability.resolve, &JsValue::Undefined, &[v]),
                    Err(EvalError::Thrown(v)) => {
                        self.call(&capability.reject, &JsValue::Undefined, &[v])
                    }
                    Err(EvalError::Engine(e)) => return Err(e),
                };
                match settle {
                    Ok(_) => Ok(()),
                    Err(EvalError::Thrown(v)) => {
                        self.uncaught_job_errors.push(v);
                        Ok(())
                    }
                    Err(EvalError::Engine(e)) => Err(e),
                }
            }
            JobKind::PromiseResolveThenable {
                promise,
                thenable,
                then,
            } => {
                let (resolve, reject) = self.create_resolving_functions(&promise);
                match self.call(&then, &thenable, &[resolve, reject.clone()]) {
                    Ok(_) => Ok(()),
                    Err(EvalError::Thrown(v)) => {
                        match self.call(&reject, &JsValue::Undefined, &[v]) {
                            Ok(_) => Ok(()),
                            Err(EvalError::Thrown(v)) => {
                                self.uncaught_job_errors.push(v);
                                Ok(())
                            }
                            Err(EvalError::Engine(e)) => Err(e),
                        }
                    }
                    Err(EvalError::Engine(e)) => Err(e),
                }
            }
        }
    }

    // ---- promises, scoped to reaction scheduling ----

    pub(crate) fn create_promise(&mut self) -> JsValue {
        let proto = self.intrinsic(Intrinsic::PromisePrototype);
        let obj = self.create_object(
            Some(proto),
            ObjectKind::Promise(Box::new(PromiseData::default())),
        );
        self.object_value(&obj)
    }

    fn with_promise_data<R>(
        &mut self,
        promise: &JsValue,
        f: impl FnOnce(&mut PromiseData) -> R,
    ) -> JsResult<R> {
        let obj = self.object_ref(promise)?;
        let mut borrow = obj.borrow_mut();
        match &mut borrow.kind {
            ObjectKind::Promise(data) => Ok(f(data)),
            _ => {
                drop(borrow);
                Err(self.throw_type_error("receiver is not a promise"))
            }
        }
    }

    // §27.2.1.5 NewPromiseCapability, specialized to the built-in
    // constructor: the capability's promise is always a plain promise
    // object with its own resolving functions.
    pub(crate) fn new_promise_capability(&mut self) -> JsResult<PromiseCapability> {
        let promise = self.create_promise();
        let (resolve, reject) = self.create_resolving_functions(&promise);
        Ok(PromiseCapability {
            promise,
            resolve,
            reject,
        })
    }

    // §27.2.1.3 CreateResolvingFunctions. The [[AlreadyResolved]] flag lives
    // on the promise record, shared by both functions.
    pub(crate) fn create_resolving_functions(&mut self, promise: &JsValue) -> (JsValue, JsValue) {
        let function_proto = self.intrinsic(Intrinsic::FunctionPrototype);

        let resolve_target = promise.clone();
        let resolve = self.create_builtin_object(
            Some(function_proto.clone()),
            "",
            1,
            false,
            Rc::new(move |interp: &mut Interpreter, _this, args, _nt| {
                let resolution = args.first().cloned().unwrap_or_default();
                interp.resolve_promise(&resolve_target, resolution)?;
                Ok(JsValue::Undefined)
            }),
        );

        let reject_target = promise.clone();
        let reject = self.create_builtin_object(
            Some(function_proto),
            "",
            1,
            false,
            Rc::new(move |interp: &mut Interpreter, _this, args, _nt| {
                let reason = args.first().cloned().unwrap_or_default();
                let fresh = interp.with_promise_data(&reject_target, |data| {
                    if data.already_resolved {
                        false
                    } else {
                        data.already_resolved = true;
                        true
                    }
                })?;
                if fresh {
                    interp.reject_promise(&reject_target, reason)?;
                }
                Ok(JsValue::Undefined)
            }),
        );

        (self.object_value(&resolve), self.object_value(&reject))
    }

    // §27.2.1.3.2 resolve-function steps, minus the constructor plumbing.
    fn resolve_promise(&mut self, promise: &JsValue, resolution: JsValue) -> JsResult<()> {
        let fresh = self.with_promise_data(promise, |data| {
            if data.already_resolved {
                false
            } else {
                data.already_resolved = true;
                true
            }
        })?;
        if !fresh {
            return Ok(());
        }
        if same_value(&resolution, promise) {
            let err = self.create_type_error("a promise cannot be resolved with itself");
            return self.reject_promise(promise, err);
        }
        if resolution.is_object() {
            let then = self.get(&resolution, &PropertyKey::from_str("then"));
            match then {
                Err(EvalError::Thrown(v)) => return self.reject_promise(promise, v),
                Err(EvalError::Engine(e)) => return Err(e.into()),
                Ok(then) if self.is_callable(&then) => {
                    self.enqueue_job(
                        "promise",
                        JobKind::PromiseResolveThenable {
                            promise: promise.clone(),
                            thenable: resolution,
                            then,
                        },
                    );
                    return Ok(());
                }
                Ok(_) => {}
            }
        }
        self.fulfill_promise(promise, resolution)
    }

    // §27.2.1.4 FulfillPromise
    fn fulfill_promise(&mut self, promise: &JsValue, value: JsValue) -> JsResult<()> {
        let reactions = self.with_promise_data(promise, |data| {
            debug_assert_eq!(data.state, PromiseState::Pending);
            data.state = PromiseState::Fulfilled;
            data.result = value.clone();
            data.reject_reactions.clear();
            std::mem::take(&mut data.fulfill_reactions)
        })?;
        self.trigger_promise_reactions(reactions, value);
        Ok(())
    }

    // §27.2.1.7 RejectPromise
    fn reject_promise(&mut self, promise: &JsValue, reason: JsValue) -> JsResult<()> {
        let reactions = self.with_promise_data(promise, |data| {
            debug_assert_eq!(data.state, PromiseState::Pending);
            data.state = PromiseState::Rejected;
            data.result = reason.clone();
            data.fulfill_reactions.clear();
            std::mem::take(&mut data.reject_reactions)
        })?;
        self.trigger_promise_reactions(reactions, reason);
        Ok(())
    }

    // §27.2.1.8 TriggerPromiseReactions
    fn trigger_promise_reactions(&mut self, reactions: Vec<PromiseReaction>, argument: JsValue) {
        for reaction in reactions {
            self.enqueue_job(
                "promise",
                JobKind::PromiseReaction {
                    reaction,
                    argument: argument.clone(),
                },
            );
        }
    }

    // §27.2.4.7.1 PromiseResolve — already-a-promise passes through.
    pub(crate) fn promise_resolve(&mut self, value: JsValue) -> JsResult<JsValue> {
        if let JsValue::Object(o) = &value
            && let Some(obj) = self.get_object(o.id)
            && matches!(obj.borrow().kind, ObjectKind::Promise(_))
        {
            return Ok(value);
        }
        let capability = self.new_promise_capability()?;
        self.call(&capability.resolve, &JsValue::Undefined, &[value])?;
        Ok(capability.promise)
    }

    // §27.2.5.4.1 PerformPromiseThen
    pub(crate) fn perform_promise_then(
        &mut self,
        promise: &JsValue,
        on_fulfilled: Option<JsValue>,
        on_rejected: Option<JsValue>,
        capability: Option<PromiseCapability>,
    ) -> JsResult<JsValue> {
        let fulfill_reaction = PromiseReaction {
            capability: capability.clone(),
            kind: ReactionKind::Fulfill,
            handler: on_fulfilled,
        };
        let reject_reaction = PromiseReaction {
            capability: capability.clone(),
            kind: ReactionKind::Reject,
            handler: on_rejected,
        };
        let pending = self.with_promise_data(promise, |data| match data.state {
            PromiseState::Pending => {
                data.fulfill_reactions.push(fulfill_reaction.clone());
                data.reject_reactions.push(reject_reaction.clone());
                None
            }
            PromiseState::Fulfilled => Some((fulfill_reaction.clone(), data.result.clone())),
            PromiseState::Rejected => Some((reject_reaction.clone(), data.result.clone())),
        })?;
        if let Some((reaction, argument)) = pending {
            self.enqueue_job("promise", JobKind::PromiseReaction { reaction, argument });
        }
        Ok(capability
            .map(|c| c.promise)
            .unwrap_or(JsValue::Undefined))
    }

    pub(crate) fn install_promise_prototype_methods(
        &mut self,
        realm: RealmId,
        promise_proto: &ObjRef,
    ) {
        let function_proto = self.realm_intrinsic(realm, Intrinsic::FunctionPrototype);
        let then = self.create_builtin_object(
            Some(function_proto),
            "then",
            2,
            false,
            Rc::new(|interp: &mut Interpreter, this, args, _nt| {
                // receiver check happens inside with_promise_data
                let on_fulfilled = args.first().filter(|v| interp.is_callable(v)).cloned();
                let on_rejected = args.get(1).filter(|v| interp.is_callable(v)).cloned();
                let capability = interp.new_promise_capability()?;
                interp.perform_promise_then(this, on_fulfilled, on_rejected, Some(capability))
            }),
        );
        let then_val = self.object_value(&then);
        promise_proto
            .borrow_mut()
            .insert_builtin(PropertyKey::from_str("then"), then_val);
    }
}
