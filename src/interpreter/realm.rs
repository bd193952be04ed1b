use super::context::ExecutionContext;
use super::types::*;
use super::Interpreter;
use crate::types::{JsString, JsValue};

/// Index of a realm in the machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RealmId(pub usize);

/// Well-known intrinsics, one table per Realm, built once at realm
/// construction and addressed by enum index instead of name lookups.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum Intrinsic {
    ObjectPrototype,
    FunctionPrototype,
    ThrowTypeError,
    ErrorPrototype,
    TypeErrorPrototype,
    RangeErrorPrototype,
    ArrayPrototype,
    StringPrototype,
    IteratorPrototype,
    ArrayIteratorPrototype,
    AsyncFromSyncIteratorPrototype,
    PromisePrototype,
    GeneratorPrototype,
}

impl Intrinsic {
    pub const COUNT: usize = 13;
}

/// Enum-indexed intrinsics table. Object identities are immutable after
/// construction; lookups are array indexing.
pub struct Intrinsics {
    table: Vec<ObjRef>,
}

impl Intrinsics {
    pub fn get(&self, which: Intrinsic) -> ObjRef {
        self.table[which as usize].clone()
    }
}

/// An isolated execution universe: intrinsics, global environment, global
/// object, and the execution-context stack of code running in it.
pub struct Realm {
    pub id: RealmId,
    pub intrinsics: Intrinsics,
    pub global_object: u64,
    pub global_this: JsValue,
    pub global_env: EnvRef,
    /// The execution-context stack; topmost is the running context.
    pub(crate) contexts: Vec<ExecutionContext>,
}

impl Interpreter {
    /// The named intrinsic of the current realm.
    pub(crate) fn intrinsic(&self, which: Intrinsic) -> ObjRef {
        let realm = self.current_realm_id();
        self.realms[realm.0].intrinsics.get(which)
    }

    pub(crate) fn realm_intrinsic(&self, realm: RealmId, which: Intrinsic) -> ObjRef {
        self.realms[realm.0].intrinsics.get(which)
    }

    /// §9.3.1 CreateRealm + §9.3.3 SetRealmGlobalObject +
    /// §9.3.4 SetDefaultGlobalBindings, folded into one constructor.
    pub fn create_realm(&mut self) -> RealmId {
        let id = RealmId(self.realms.len());

        // %Object.prototype% sits at the root of every chain.
        let object_proto = self.create_object(None, ObjectKind::Ordinary);

        // %Function.prototype% is itself callable and does nothing.
        let function_proto = self.create_builtin_object(
            Some(object_proto.clone()),
            "",
            0,
            false,
            std::rc::Rc::new(|_interp, _this, _args, _nt| Ok(JsValue::Undefined)),
        );

        // %ThrowTypeError%: anonymous, non-extensible, throws on entry.
        let throw_type_error = self.create_builtin_object(
            Some(function_proto.clone()),
            "",
            0,
            false,
            std::rc::Rc::new(|interp: &mut Interpreter, _this, _args, _nt| {
                Err(interp.throw_type_error(
                    "'caller', 'callee', and 'arguments' properties may not be accessed on \
                     strict mode functions or the arguments objects for calls to them",
                ))
            }),
        );
        throw_type_error.borrow_mut().extensible = false;

        let error_proto = self.create_object(Some(object_proto.clone()), ObjectKind::Ordinary);
        {
            let mut e = error_proto.borrow_mut();
            e.insert_builtin(PropertyKey::from_str("name"), JsValue::string("Error"));
            e.insert_builtin(PropertyKey::from_str("message"), JsValue::string(""));
        }
        let type_error_proto = self.create_object(Some(error_proto.clone()), ObjectKind::Ordinary);
        type_error_proto
            .borrow_mut()
            .insert_builtin(PropertyKey::from_str("name"), JsValue::string("TypeError"));
        let range_error_proto = self.create_object(Some(error_proto.clone()), ObjectKind::Ordinary);
        range_error_proto
            .borrow_mut()
            .insert_builtin(PropertyKey::from_str("name"), JsValue::string("RangeError"));

        let iterator_proto = self.create_object(Some(object_proto.clone()), ObjectKind::Ordinary);
        let array_iterator_proto =
            self.create_object(Some(iterator_proto.clone()), ObjectKind::Ordinary);
        let array_proto = {
            let obj = self.create_object(Some(object_proto.clone()), ObjectKind::Array);
            obj.borrow_mut().insert_property(
                PropertyKey::from_str("length"),
                PropertyDescriptor::data(JsValue::Number(0.0), true, false, false),
            );
            obj
        };
        let string_proto = self.create_object(
            Some(object_proto.clone()),
            ObjectKind::StringExotic {
                data: JsString::default(),
            },
        );
        string_proto.borrow_mut().insert_property(
            PropertyKey::from_str("length"),
            PropertyDescriptor::data(JsValue::Number(0.0), false, false, false),
        );
        let async_from_sync_proto =
            self.create_object(Some(object_proto.clone()), ObjectKind::Ordinary);
        let promise_proto = self.create_object(Some(object_proto.clone()), ObjectKind::Ordinary);
        let generator_proto =
            self.create_object(Some(iterator_proto.clone()), ObjectKind::Ordinary);

        // Table order must match the Intrinsic declaration order.
        let table = vec![
            object_proto.clone(),
            function_proto.clone(),
            throw_type_error,
            error_proto.clone(),
            type_error_proto,
            range_error_proto,
            array_proto.clone(),
            string_proto,
            iterator_proto.clone(),
            array_iterator_proto.clone(),
            async_from_sync_proto.clone(),
            promise_proto.clone(),
            generator_proto.clone(),
        ];
        debug_assert_eq!(table.len(), Intrinsic::COUNT);
        let intrinsics = Intrinsics { table };

        // Global object and environment.
        let global = self.create_object(Some(object_proto.clone()), ObjectKind::Ordinary);
        let global_id = global.borrow().id.unwrap_or(0);
        let global_this = self.object_value(&global);
        {
            let mut g = global.borrow_mut();
            for (name, value) in [
                ("undefined", JsValue::Undefined),
                ("NaN", JsValue::Number(f64::NAN)),
                ("Infinity", JsValue::Number(f64::INFINITY)),
            ] {
                g.insert_property(
                    PropertyKey::from_str(name),
                    PropertyDescriptor::data(value, false, false, false),
                );
            }
            g.insert_property(
                PropertyKey::from_str("globalThis"),
                PropertyDescriptor::data(global_this.clone(), true, false, true),
            );
        }
        let global_env = Environment::new(None);
        {
            let mut env = global_env.borrow_mut();
            env.this_value = Some(global_this.clone());
            for (name, value) in [
                ("undefined", JsValue::Undefined),
                ("NaN", JsValue::Number(f64::NAN)),
                ("Infinity", JsValue::Number(f64::INFINITY)),
                ("globalThis", global_this.clone()),
            ] {
                env.declare_initialized(name, BindingKind::Const, value);
            }
        }

        self.realms.push(Realm {
            id,
            intrinsics,
            global_object: global_id,
            global_this,
            global_env,
            contexts: Vec::new(),
        });

        self.install_object_prototype_methods(id, &object_proto);
        self.install_error_prototype_methods(id, &error_proto);
        self.install_iterator_intrinsics(
            id,
            &iterator_proto,
            &array_iterator_proto,
            &array_proto,
            &async_from_sync_proto,
            &generator_proto,
        );
        self.install_promise_prototype_methods(id, &promise_proto);

        log::debug!("created realm {} ({} intrinsics)", id.0, Intrinsic::COUNT);
        id
    }

    fn install_object_prototype_methods(&mut self, realm: RealmId, object_proto: &ObjRef) {
        let function_proto = self.realm_intrinsic(realm, Intrinsic::FunctionPrototype);
        let has_own = self.create_builtin_object(
            Some(function_proto.clone()),
            "hasOwnProperty",
            1,
            false,
            std::rc::Rc::new(|interp: &mut Interpreter, this, args, _nt| {
                let key_val = args.first().cloned().unwrap_or(JsValue::Undefined);
                let key = interp.to_property_key(&key_val)?;
                let this_obj = interp.to_object(this)?;
                let obj = interp.object_ref(&this_obj)?;
                let found = interp.object_get_own_property(&obj, &key)?.is_some();
                Ok(JsValue::Boolean(found))
            }),
        );
        let has_own_val = self.object_value(&has_own);
        let to_string = self.create_builtin_object(
            Some(function_proto),
            "toString",
            0,
            false,
            std::rc::Rc::new(|interp: &mut Interpreter, this, _args, _nt| {
                let tag = match this {
                    JsValue::Undefined => "Undefined".to_string(),
                    JsValue::Null => "Null".to_string(),
                    JsValue::Object(o) => match interp.get_object(o.id) {
                        Some(obj) => obj.borrow().kind.class_name().to_string(),
                        None => "Object".to_string(),
                    },
                    other => {
                        let mut name = other.type_name().to_string();
                        if let Some(first) = name.get_mut(0..1) {
                            first.make_ascii_uppercase();
                        }
                        name
                    }
                };
                Ok(JsValue::string(&format!("[object {tag}]")))
            }),
        );
        let to_string_val = self.object_value(&to_string);
        let mut p = object_proto.borrow_mut();
        p.insert_builtin(PropertyKey::from_str("hasOwnProperty"), has_own_val);
        p.insert_builtin(PropertyKey::from_str("toString"), to_string_val);
    }

    fn install_error_prototype_methods(&mut self, realm: RealmId, error_proto: &ObjRef) {
        let function_proto = self.realm_intrinsic(realm, Intrinsic::FunctionPrototype);
        let to_string = self.create_builtin_object(
            Some(function_proto),
            "toString",
            0,
            false,
            std::rc::Rc::new(|interp: &mut Interpreter, this, _args, _nt| {
                let obj = interp.object_ref(this)?;
                let name = match interp.get_with_receiver(&obj, &PropertyKey::from_str("name"), this)? {
                    JsValue::Undefined => "Error".to_string(),
                    v => interp.to_string_value(&v)?.to_rust_string(),
                };
                let message =
                    match interp.get_with_receiver(&obj, &PropertyKey::from_str("message"), this)? {
                        JsValue::Undefined => String::new(),
                        v => interp.to_string_value(&v)?.to_rust_string(),
                    };
                let text = if name.is_empty() {
                    message
                } else if message.is_empty() {
                    name
                } else {
                    format!("{name}: {message}")
                };
                Ok(JsValue::string(&text))
            }),
        );
        let to_string_val = self.object_value(&to_string);
        error_proto
            .borrow_mut()
            .insert_builtin(PropertyKey::from_str("toString"), to_string_val);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intrinsic_identity_is_stable() {
        let mut interp = Interpreter::new();
        let realm = interp.create_realm();
        let a = interp.realm_intrinsic(realm, Intrinsic::ObjectPrototype);
        let b = interp.realm_intrinsic(realm, Intrinsic::ObjectPrototype);
        assert!(std::rc::Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn realms_are_isolated() {
        let mut interp = Interpreter::new();
        let r1 = interp.create_realm();
        let r2 = interp.create_realm();
        let p1 = interp.realm_intrinsic(r1, Intrinsic::ObjectPrototype);
        let p2 = interp.realm_intrinsic(r2, Intrinsic::ObjectPrototype);
        assert!(!std::rc::Rc::ptr_eq(&p1, &p2));
        assert_ne!(
            interp.realms[r1.0].global_object,
            interp.realms[r2.0].global_object
        );
    }

    #[test]
    fn error_prototype_chain() {
        let mut interp = Interpreter::new();
        let realm = interp.create_realm();
        let te = interp.realm_intrinsic(realm, Intrinsic::TypeErrorPrototype);
        let err = interp.realm_intrinsic(realm, Intrinsic::ErrorPrototype);
        let proto = te.borrow().prototype.clone().unwrap();
        assert!(std::rc::Rc::ptr_eq(&proto, &err));
    }

    #[test]
    fn global_bindings_present() {
        let mut interp = Interpreter::new();
        let realm = interp.create_realm();
        let env = interp.realms[realm.0].global_env.clone();
        assert!(env.borrow().has("undefined"));
        assert!(env.borrow().has("NaN"));
        assert!(env.borrow().has("globalThis"));
        assert!(matches!(
            env.borrow().get("Infinity"),
            Some(Ok(JsValue::Number(n))) if n.is_infinite()
        ));
    }
}
