//! The iterator protocol (§7.4), the array and list iterator objects, and
//! the async-from-sync adapter (§27.1.6).

use super::*;
use crate::types::JsValue;
use std::rc::Rc;

/// GetIterator hint (§7.4.3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IteratorHint {
    Sync,
    Async,
}

impl Interpreter {
    // §7.4.3 GetIterator / GetIteratorFromMethod. With the async hint and no
    // @@asyncIterator, the sync iterator is wrapped in the adapter.
    pub(crate) fn get_iterator(
        &mut self,
        obj: &JsValue,
        hint: IteratorHint,
        method: Option<JsValue>,
    ) -> JsResult<IteratorRecord> {
        let method = match method {
            Some(m) => Some(m),
            None => match hint {
                IteratorHint::Async => {
                    let async_key = PropertyKey::Symbol(self.well_known.async_iterator.clone());
                    match self.get_method(obj, &async_key)? {
                        Some(m) => Some(m),
                        None => {
                            let sync_key =
                                PropertyKey::Symbol(self.well_known.iterator.clone());
                            let sync_method = self.get_method(obj, &sync_key)?;
                            let sync = self.get_iterator_from_method(obj, sync_method)?;
                            return Ok(self.create_async_from_sync_iterator(sync));
                        }
                    }
                }
                IteratorHint::Sync => {
                    let key = PropertyKey::Symbol(self.well_known.iterator.clone());
                    self.get_method(obj, &key)?
                }
            },
        };
        self.get_iterator_from_method(obj, method)
    }

    fn get_iterator_from_method(
        &mut self,
        obj: &JsValue,
        method: Option<JsValue>,
    ) -> JsResult<IteratorRecord> {
        let Some(method) = method else {
            return Err(self.throw_type_error(&format!("{} is not iterable", obj.type_name())));
        };
        let iterator = self.call(&method, obj, &[])?;
        if !iterator.is_object() {
            return Err(self.throw_type_error("result of the Symbol.iterator method is not an object"));
        }
        let next_method = self.get(&iterator, &PropertyKey::from_str("next"))?;
        Ok(IteratorRecord {
            iterator,
            next_method,
            done: false,
        })
    }

    // §7.4.4 IteratorNext
    pub(crate) fn iterator_next(
        &mut self,
        record: &IteratorRecord,
        value: Option<&JsValue>,
    ) -> JsResult<JsValue> {
        let args: &[JsValue] = match value {
            Some(v) => std::slice::from_ref(v),
            None => &[],
        };
        let result = self.call(&record.next_method, &record.iterator, args)?;
        if !result.is_object() {
            return Err(self.throw_type_error("iterator result is not an object"));
        }
        Ok(result)
    }

    // §7.4.5 IteratorComplete
    pub(crate) fn iterator_complete(&mut self, result: &JsValue) -> JsResult<bool> {
        let done = self.get(result, &PropertyKey::from_str("done"))?;
        Ok(to_boolean(&done))
    }

    // §7.4.7 IteratorValue
    pub(crate) fn iterator_value(&mut self, result: &JsValue) -> JsResult<JsValue> {
        self.get(result, &PropertyKey::from_str("value"))
    }

    /// §7.4.8 IteratorStep — `None` once exhausted. The record's `done` flag
    /// latches so a finished iterator is never stepped again.
    pub(crate) fn iterator_step(
        &mut self,
        record: &mut IteratorRecord,
    ) -> JsResult<Option<JsValue>> {
        if record.done {
            return Ok(None);
        }
        let result = self.iterator_next(record, None)?;
        if self.iterator_complete(&result)? {
            record.done = true;
            return Ok(None);
        }
        Ok(Some(self.iterator_value(&result)?))
    }

    // §7.4.9 IteratorClose. Precedence: an outer throw completion survives
    // any failure of the `return` call; otherwise an inner throw propagates;
    // a non-object inner result is itself a TypeError.
    pub(crate) fn iterator_close_completion(
        &mut self,
        record: &IteratorRecord,
        completion: Completion,
    ) -> EvalResult {
        let inner = match self.get_method(&record.iterator, &PropertyKey::from_str("return")) {
            Ok(None) => return Ok(completion),
            Ok(Some(method)) => self.call(&method, &record.iterator, &[]),
            Err(e) => Err(e),
        };
        if let Completion::Throw(v) = completion {
            return Ok(Completion::Throw(v));
        }
        match inner {
            Err(EvalError::Thrown(v)) => Ok(Completion::Throw(v)),
            Err(EvalError::Engine(e)) => Err(e),
            Ok(JsValue::Object(_)) => Ok(completion),
            Ok(_) => {
                let err = self.create_type_error("iterator.return did not return an object");
                Ok(Completion::Throw(err))
            }
        }
    }

    // §7.4.13 AsyncIteratorClose without the awaits: the `return` call is
    // issued and its promise (if any) is left to the job queue.
    pub(crate) fn async_iterator_close(
        &mut self,
        record: &IteratorRecord,
        completion: Completion,
    ) -> EvalResult {
        self.iterator_close_completion(record, completion)
    }

    // §7.4.12 CreateIterResultObject
    pub(crate) fn create_iter_result_object(&mut self, value: JsValue, done: bool) -> JsValue {
        let proto = self.intrinsic(Intrinsic::ObjectPrototype);
        let obj = self.create_object(Some(proto), ObjectKind::Ordinary);
        {
            let mut o = obj.borrow_mut();
            o.insert_value(PropertyKey::from_str("value"), value);
            o.insert_value(PropertyKey::from_str("done"), JsValue::Boolean(done));
        }
        self.object_value(&obj)
    }

    // §7.4.14 CreateListIteratorRecord — yields a fixed list of values.
    pub(crate) fn create_list_iterator(&mut self, items: Vec<JsValue>) -> IteratorRecord {
        let proto = self.intrinsic(Intrinsic::IteratorPrototype);
        let obj = self.create_object(Some(proto), ObjectKind::ListIterator { items, index: 0 });
        let function_proto = self.intrinsic(Intrinsic::FunctionPrototype);
        let next = self.create_builtin_object(
            Some(function_proto),
            "next",
            0,
            false,
            Rc::new(|interp: &mut Interpreter, this, _args, _nt| {
                let obj = interp.object_ref(this)?;
                let step = {
                    let mut borrow = obj.borrow_mut();
                    match &mut borrow.kind {
                        ObjectKind::ListIterator { items, index } => {
                            if *index < items.len() {
                                let v = items[*index].clone();
                                *index += 1;
                                Some((v, false))
                            } else {
                                Some((JsValue::Undefined, true))
                            }
                        }
                        _ => None,
                    }
                };
                match step {
                    Some((value, done)) => Ok(interp.create_iter_result_object(value, done)),
                    None => Err(interp.throw_type_error("next called on incompatible receiver")),
                }
            }),
        );
        let next_val = self.object_value(&next);
        obj.borrow_mut()
            .insert_builtin(PropertyKey::from_str("next"), next_val.clone());
        IteratorRecord {
            iterator: self.object_value(&obj),
            next_method: next_val,
            done: false,
        }
    }

    // §23.1.5.1 CreateArrayIterator (value kind only) — works over anything
    // with `length`, which also serves arguments objects.
    pub(crate) fn create_array_iterator(&mut self, target: &ObjRef) -> JsValue {
        let proto = self.intrinsic(Intrinsic::ArrayIteratorPrototype);
        let target_id = target.borrow().id.unwrap_or_default();
        let obj = self.create_object(
            Some(proto),
            ObjectKind::ArrayIterator {
                target: target_id,
                index: 0,
                done: false,
            },
        );
        self.object_value(&obj)
    }

    fn array_iterator_next(&mut self, this: &JsValue) -> JsResult<JsValue> {
        let obj = self.object_ref(this)?;
        let state = match &obj.borrow().kind {
            ObjectKind::ArrayIterator {
                target,
                index,
                done,
            } => Some((*target, *index, *done)),
            _ => None,
        };
        let Some((target_id, index, done)) = state else {
            return Err(self.throw_type_error("next called on incompatible receiver"));
        };
        if done {
            return Ok(self.create_iter_result_object(JsValue::Undefined, true));
        }
        let Some(target) = self.get_object(target_id) else {
            return Ok(self.create_iter_result_object(JsValue::Undefined, true));
        };
        let target_val = self.object_value(&target);
        let len_val = self.get(&target_val, &PropertyKey::from_str("length"))?;
        let len = self.to_length(&len_val)?;
        if (index as u64) >= len {
            if let ObjectKind::ArrayIterator { done, .. } = &mut obj.borrow_mut().kind {
                *done = true;
            }
            return Ok(self.create_iter_result_object(JsValue::Undefined, true));
        }
        let value = self.get(&target_val, &PropertyKey::from_index(index))?;
        if let ObjectKind::ArrayIterator { index, .. } = &mut obj.borrow_mut().kind {
            *index += 1;
        }
        Ok(self.create_iter_result_object(value, false))
    }

    // ---- async-from-sync (§27.1.6) ----

    // §27.1.6.1 CreateAsyncFromSyncIterator
    pub(crate) fn create_async_from_sync_iterator(
        &mut self,
        sync: IteratorRecord,
    ) -> IteratorRecord {
        let proto = self.intrinsic(Intrinsic::AsyncFromSyncIteratorPrototype);
        let obj = self.create_object(Some(proto), ObjectKind::AsyncFromSyncIterator { sync });
        let iterator = self.object_value(&obj);
        let next_method = self
            .get(&iterator, &PropertyKey::from_str("next"))
            .unwrap_or(JsValue::Undefined);
        IteratorRecord {
            iterator,
            next_method,
            done: false,
        }
    }

    fn async_from_sync_record(&mut self, this: &JsValue) -> JsResult<IteratorRecord> {
        let obj = self.object_ref(this)?;
        let sync = match &obj.borrow().kind {
            ObjectKind::AsyncFromSyncIterator { sync } => Some(sync.clone()),
            _ => None,
        };
        sync.ok_or_else(|| self.throw_type_error("receiver is not an async-from-sync iterator"))
    }

    // §27.1.6.4 AsyncFromSyncIteratorContinuation — the sync step's value is
    // promise-resolved, then re-wrapped into an iterator result once the
    // resolution job has run.
    fn async_from_sync_continuation(
        &mut self,
        capability: &PromiseCapability,
        value: JsValue,
        done: bool,
    ) -> JsResult<()> {
        let value_promise = self.promise_resolve(value)?;
        let function_proto = self.intrinsic(Intrinsic::FunctionPrototype);
        let unwrap = self.create_builtin_object(
            Some(function_proto),
            "",
            1,
            false,
            Rc::new(move |interp: &mut Interpreter, _this, args, _nt| {
                let v = args.first().cloned().unwrap_or_default();
                Ok(interp.create_iter_result_object(v, done))
            }),
        );
        let unwrap_val = self.object_value(&unwrap);
        self.perform_promise_then(
            &value_promise,
            Some(unwrap_val),
            None,
            Some(capability.clone()),
        )?;
        Ok(())
    }

    fn reject_capability(
        &mut self,
        capability: &PromiseCapability,
        err: EvalError,
    ) -> JsResult<JsValue> {
        match err {
            EvalError::Thrown(v) => {
                self.call(&capability.reject.clone(), &JsValue::Undefined, &[v])?;
                Ok(capability.promise.clone())
            }
            engine => Err(engine),
        }
    }

    // §27.1.6.2.1 %AsyncFromSyncIteratorPrototype%.next
    fn async_from_sync_next(&mut self, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
        let capability = self.new_promise_capability()?;
        let sync = match self.async_from_sync_record(this) {
            Ok(s) => s,
            Err(e) => return self.reject_capability(&capability, e),
        };
        let step = (|interp: &mut Interpreter| -> JsResult<(JsValue, bool)> {
            let result = interp.iterator_next(&sync, args.first())?;
            let done = interp.iterator_complete(&result)?;
            let value = interp.iterator_value(&result)?;
            Ok((value, done))
        })(self);
        match step {
            Ok((value, done)) => {
                self.async_from_sync_continuation(&capability, value, done)?;
                Ok(capability.promise)
            }
            Err(e) => self.reject_capability(&capability, e),
        }
    }

    // §27.1.6.2.2 %AsyncFromSyncIteratorPrototype%.return — a missing sync
    // `return` resolves to a finished result.
    fn async_from_sync_return(&mut self, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
        let capability = self.new_promise_capability()?;
        let sync = match self.async_from_sync_record(this) {
            Ok(s) => s,
            Err(e) => return self.reject_capability(&capability, e),
        };
        let step = (|interp: &mut Interpreter| -> JsResult<Option<(JsValue, bool)>> {
            let method = interp.get_method(&sync.iterator, &PropertyKey::from_str("return"))?;
            let Some(method) = method else {
                return Ok(None);
            };
            let result = interp.call(&method, &sync.iterator, args)?;
            if !result.is_object() {
                return Err(interp.throw_type_error("iterator.return did not return an object"));
            }
            let done = interp.iterator_complete(&result)?;
            let value = interp.iterator_value(&result)?;
            Ok(Some((value, done)))
        })(self);
        match step {
            Ok(Some((value, done))) => {
                self.async_from_sync_continuation(&capability, value, done)?;
                Ok(capability.promise)
            }
            Ok(None) => {
                let result = self.create_iter_result_object(
                    args.first().cloned().unwrap_or_default(),
                    true,
                );
                self.call(&capability.resolve.clone(), &JsValue::Undefined, &[result])?;
                Ok(capability.promise)
            }
            Err(e) => self.reject_capability(&capability, e),
        }
    }

    // §27.1.6.2.3 %AsyncFromSyncIteratorPrototype%.throw — a missing sync
    // `throw` rejects with the argument.
    fn async_from_sync_throw(&mut self, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
        let capability = self.new_promise_capability()?;
        let sync = match self.async_from_sync_record(this) {
            Ok(s) => s,
            Err(e) => return self.reject_capability(&capability, e),
        };
        let step = (|interp: &mut Interpreter| -> JsResult<Option<(JsValue, bool)>> {
            let method = interp.get_method(&sync.iterator, &PropertyKey::from_str("throw"))?;
            let Some(method) = method else {
                return Ok(None);
            };
            let result = interp.call(&method, &sync.iterator, args)?;
            if !result.is_object() {
                return Err(interp.throw_type_error("iterator.throw did not return an object"));
            }
            let done = interp.iterator_complete(&result)?;
            let value = interp.iterator_value(&result)?;
            Ok(Some((value, done)))
        })(self);
        match step {
            Ok(Some((value, done))) => {
                self.async_from_sync_continuation(&capability, value, done)?;
                Ok(capability.promise)
            }
            Ok(None) => {
                let reason = args.first().cloned().unwrap_or_default();
                self.call(&capability.reject.clone(), &JsValue::Undefined, &[reason])?;
                Ok(capability.promise)
            }
            Err(e) => self.reject_capability(&capability, e),
        }
    }

    // ---- intrinsic installation (called once per realm) ----

    pub(crate) fn install_iterator_intrinsics(
        &mut self,
        realm: RealmId,
        iterator_proto: &ObjRef,
        array_iterator_proto: &ObjRef,
        array_proto: &ObjRef,
        async_from_sync_proto: &ObjRef,
        generator_proto: &ObjRef,
    ) {
        let function_proto = self.realm_intrinsic(realm, Intrinsic::FunctionPrototype);

        // %Iterator.prototype%[@@iterator] returns the receiver.
        let self_iter = self.create_builtin_object(
            Some(function_proto.clone()),
            "[Symbol.iterator]",
            0,
            false,
            Rc::new(|_interp, this, _args, _nt| Ok(this.clone())),
        );
        let self_iter_val = self.object_value(&self_iter);
        iterator_proto.borrow_mut().insert_builtin(
            PropertyKey::Symbol(self.well_known.iterator.clone()),
            self_iter_val,
        );

        let array_next = self.create_builtin_object(
            Some(function_proto.clone()),
            "next",
            0,
            false,
            Rc::new(|interp: &mut Interpreter, this, _args, _nt| {
                interp.array_iterator_next(this)
            }),
        );
        let array_next_val = self.object_value(&array_next);
        array_iterator_proto
            .borrow_mut()
            .insert_builtin(PropertyKey::from_str("next"), array_next_val);

        // %Array.prototype%.values doubles as @@iterator.
        let values = self.create_builtin_object(
            Some(function_proto.clone()),
            "values",
            0,
            false,
            Rc::new(|interp: &mut Interpreter, this, _args, _nt| {
                let boxed = interp.to_object(this)?;
                let obj = interp.object_ref(&boxed)?;
                Ok(interp.create_array_iterator(&obj))
            }),
        );
        let values_val = self.object_value(&values);
        {
            let mut a = array_proto.borrow_mut();
            a.insert_builtin(PropertyKey::from_str("values"), values_val.clone());
            a.insert_builtin(
                PropertyKey::Symbol(self.well_known.iterator.clone()),
                values_val,
            );
        }

        let afs_next = self.create_builtin_object(
            Some(function_proto.clone()),
            "next",
            1,
            false,
            Rc::new(|interp: &mut Interpreter, this, args, _nt| {
                interp.async_from_sync_next(this, args)
            }),
        );
        let afs_return = self.create_builtin_object(
            Some(function_proto.clone()),
            "return",
            1,
            false,
            Rc::new(|interp: &mut Interpreter, this, args, _nt| {
                interp.async_from_sync_return(this, args)
            }),
        );
        let afs_throw = self.create_builtin_object(
            Some(function_proto.clone()),
            "throw",
            1,
            false,
            Rc::new(|interp: &mut Interpreter, this, args, _nt| {
                interp.async_from_sync_throw(this, args)
            }),
        );
        let (n, r, t) = (
            self.object_value(&afs_next),
            self.object_value(&afs_return),
            self.object_value(&afs_throw),
        );
        {
            let mut p = async_from_sync_proto.borrow_mut();
            p.insert_builtin(PropertyKey::from_str("next"), n);
            p.insert_builtin(PropertyKey::from_str("return"), r);
            p.insert_builtin(PropertyKey::from_str("throw"), t);
        }

        // Resuming a generator is not modeled; stepping one is a typed fault.
        let gen_next = self.create_builtin_object(
            Some(function_proto),
            "next",
            1,
            false,
            Rc::new(|interp: &mut Interpreter, _this, _args, _nt| {
                Err(interp.unsupported("generator object resumption"))
            }),
        );
        let gen_next_val = self.object_value(&gen_next);
        generator_proto
            .borrow_mut()
            .insert_builtin(PropertyKey::from_str("next"), gen_next_val);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JsString;

    fn machine() -> Interpreter {
        let mut interp = Interpreter::new();
        let realm = interp.create_realm();
        let ctx = interp.new_context(None, realm, None, None, None);
        interp.push_context(ctx);
        interp
    }

    #[test]
    fn list_iterator_yields_then_completes() {
        let mut interp = machine();
        let mut record = interp.create_list_iterator(vec![
            JsValue::Number(1.0),
            JsValue::Number(2.0),
        ]);
        let a = interp.iterator_step(&mut record).unwrap();
        assert!(matches!(a, Some(JsValue::Number(n)) if n == 1.0));
        let b = interp.iterator_step(&mut record).unwrap();
        assert!(matches!(b, Some(JsValue::Number(n)) if n == 2.0));
        assert!(interp.iterator_step(&mut record).unwrap().is_none());
        assert!(record.done);
        // latched: stepping again does not call next
        assert!(interp.iterator_step(&mut record).unwrap().is_none());
    }

    #[test]
    fn array_iterator_walks_elements_via_get() {
        let mut interp = machine();
        let items = vec![JsValue::string("x"), JsValue::string("y")];
        let array = interp.create_array_from(&items).unwrap();
        let array_val = interp.object_value(&array);
        let mut record = interp
            .get_iterator(&array_val, IteratorHint::Sync, None)
            .unwrap();
        let first = interp.iterator_step(&mut record).unwrap();
        assert!(matches!(first, Some(JsValue::String(s)) if s.to_rust_string() == "x"));
        let second = interp.iterator_step(&mut record).unwrap();
        assert!(matches!(second, Some(JsValue::String(s)) if s.to_rust_string() == "y"));
        assert!(interp.iterator_step(&mut record).unwrap().is_none());
    }

    #[test]
    fn get_iterator_rejects_non_iterable() {
        let mut interp = machine();
        let proto = interp.intrinsic(Intrinsic::ObjectPrototype);
        let plain = interp.create_object(Some(proto), ObjectKind::Ordinary);
        let val = interp.object_value(&plain);
        assert!(matches!(
            interp.get_iterator(&val, IteratorHint::Sync, None),
            Err(EvalError::Thrown(_))
        ));
    }

    #[test]
    fn close_prefers_outer_throw_over_inner_failure() {
        let mut interp = machine();
        let proto = interp.intrinsic(Intrinsic::IteratorPrototype);
        let iter = interp.create_object(Some(proto), ObjectKind::Ordinary);
        let function_proto = interp.intrinsic(Intrinsic::FunctionPrototype);
        let bad_return = interp.create_builtin_object(
            Some(function_proto),
            "return",
            0,
            false,
            Rc::new(|interp: &mut Interpreter, _this, _args, _nt| {
                Err(interp.throw_type_error("return failed"))
            }),
        );
        let bad_return_val = interp.object_value(&bad_return);
        iter.borrow_mut()
            .insert_builtin(PropertyKey::from_str("return"), bad_return_val);
        let record = IteratorRecord {
            iterator: interp.object_value(&iter),
            next_method: JsValue::Undefined,
            done: false,
        };

        let outer = JsValue::string("original");
        let closed = interp
            .iterator_close_completion(&record, Completion::Throw(outer))
            .unwrap();
        assert!(matches!(
            closed,
            Completion::Throw(JsValue::String(s)) if s.to_rust_string() == "original"
        ));

        // without an outer throw, the inner failure surfaces
        let closed = interp
            .iterator_close_completion(&record, Completion::Normal(JsValue::Undefined))
            .unwrap();
        assert!(matches!(closed, Completion::Throw(_)));
    }

    #[test]
    fn close_rejects_non_object_return_result() {
        let mut interp = machine();
        let proto = interp.intrinsic(Intrinsic::IteratorPrototype);
        let iter = interp.create_object(Some(proto), ObjectKind::Ordinary);
        let function_proto = interp.intrinsic(Intrinsic::FunctionPrototype);
        let scalar_return = interp.create_builtin_object(
            Some(function_proto),
            "return",
            0,
            false,
            Rc::new(|_interp, _this, _args, _nt| Ok(JsValue::Number(0.0))),
        );
        let scalar_return_val = interp.object_value(&scalar_return);
        iter.borrow_mut()
            .insert_builtin(PropertyKey::from_str("return"), scalar_return_val);
        let record = IteratorRecord {
            iterator: interp.object_value(&iter),
            next_method: JsValue::Undefined,
            done: false,
        };
        let closed = interp
            .iterator_close_completion(&record, Completion::Break(None))
            .unwrap();
        assert!(matches!(closed, Completion::Throw(_)));
    }

    #[test]
    fn close_without_return_method_is_transparent() {
        let mut interp = machine();
        let mut record = interp.create_list_iterator(vec![JsValue::Number(1.0)]);
        let _ = interp.iterator_step(&mut record).unwrap();
        let closed = interp
            .iterator_close_completion(&record, Completion::Break(Some("outer".to_string())))
            .unwrap();
        assert!(matches!(closed, Completion::Break(Some(label)) if label == "outer"));
    }

    #[test]
    fn async_hint_wraps_sync_iterator() {
        let mut interp = machine();
        let items = vec![JsValue::Number(1.0)];
        let array = interp.create_array_from(&items).unwrap();
        let array_val = interp.object_value(&array);
        let record = interp
            .get_iterator(&array_val, IteratorHint::Async, None)
            .unwrap();
        let obj = interp.object_ref(&record.iterator.clone()).unwrap();
        assert!(matches!(
            obj.borrow().kind,
            ObjectKind::AsyncFromSyncIterator { .. }
        ));

        // stepping it yields a pending promise; the resolution job delivers
        // the wrapped iterator result
        let result = interp
            .iterator_next(&record, None)
            .expect("next returns a promise");
        assert!(result.is_object());
        interp.run_jobs().unwrap();
        let settled = interp.object_ref(&result).unwrap();
        let state = match &settled.borrow().kind {
            ObjectKind::Promise(data) => (data.state, data.result.clone()),
            _ => panic!("expected a promise"),
        };
        assert_eq!(state.0, PromiseState::Fulfilled);
        let inner = state.1;
        let value = interp.get(&inner, &PropertyKey::from_str("value")).unwrap();
        let done = interp.get(&inner, &PropertyKey::from_str("done")).unwrap();
        assert!(matches!(value, JsValue::Number(n) if n == 1.0));
        assert!(matches!(done, JsValue::Boolean(false)));
    }

    #[test]
    fn async_close_issues_the_return_call_and_keeps_the_completion() {
        let mut interp = machine();
        let items = vec![JsValue::Number(1.0), JsValue::Number(2.0)];
        let array = interp.create_array_from(&items).unwrap();
        let array_val = interp.object_value(&array);
        let record = interp
            .get_iterator(&array_val, IteratorHint::Async, None)
            .unwrap();
        // the wrapper's `return` produces a promise that is left to the queue
        let closed = interp
            .async_iterator_close(&record, Completion::Break(None))
            .unwrap();
        assert!(matches!(closed, Completion::Break(None)));
        interp.run_jobs().unwrap();
        assert!(interp.uncaught_job_errors.is_empty());
    }

    #[test]
    fn string_values_are_not_iterable_without_wrapper_method() {
        // @@iterator is only installed on array-likes in this machine; a
        // plain string reports "not iterable" instead of silently spreading.
        let mut interp = machine();
        let val = JsValue::String(JsString::from_str("ab"));
        assert!(matches!(
            interp.get_iterator(&val, IteratorHint::Sync, None),
            Err(EvalError::Thrown(_))
        ));
    }
}
