//! The essential internal methods (§10.1) and the abstract operations
//! layered on them (§7.3). Exotic overrides dispatch from here into the
//! behaviors in `exotic.rs`; everything else runs the ordinary algorithms.

use super::*;
use crate::types::JsValue;
use std::rc::Rc;

/// Which internal-method suite an object runs. Resolved once per call so no
/// `RefCell` borrow is held across re-entrant method dispatch.
#[derive(Clone, Copy, PartialEq, Eq)]
enum MethodSuite {
    Ordinary,
    Array,
    StringExotic,
    Arguments,
}

fn method_suite(obj: &ObjRef) -> MethodSuite {
    match obj.borrow().kind {
        ObjectKind::Array => MethodSuite::Array,
        ObjectKind::StringExotic { .. } => MethodSuite::StringExotic,
        ObjectKind::Arguments { .. } => MethodSuite::Arguments,
        _ => MethodSuite::Ordinary,
    }
}

// §10.1.1 OrdinaryGetPrototypeOf
pub(crate) fn ordinary_get_prototype_of(obj: &ObjRef) -> Option<ObjRef> {
    obj.borrow().prototype.clone()
}

// §10.1.2.1 OrdinarySetPrototypeOf — walks the candidate chain to refuse
// cycles; the walk stops at the first exotic link it cannot see through
// (none exist in this machine, every kind uses ordinary [[GetPrototypeOf]]).
pub(crate) fn ordinary_set_prototype_of(obj: &ObjRef, proto: Option<ObjRef>) -> bool {
    let current = obj.borrow().prototype.clone();
    match (&current, &proto) {
        (Some(a), Some(b)) if Rc::ptr_eq(a, b) => return true,
        (None, None) => return true,
        _ => {}
    }
    if !obj.borrow().extensible {
        return false;
    }
    let mut p = proto.clone();
    while let Some(ancestor) = p {
        if Rc::ptr_eq(&ancestor, obj) {
            return false;
        }
        p = ancestor.borrow().prototype.clone();
    }
    obj.borrow_mut().prototype = proto;
    true
}

// §10.1.5.1 OrdinaryGetOwnProperty
pub(crate) fn ordinary_get_own_property(
    obj: &ObjRef,
    key: &PropertyKey,
) -> Option<PropertyDescriptor> {
    obj.borrow().get_own(key).cloned()
}

// §10.1.6.3 ValidateAndApplyPropertyDescriptor. `obj` of `None` validates
// without applying (the IsCompatiblePropertyDescriptor form).
pub(crate) fn validate_and_apply_property_descriptor(
    obj: Option<&ObjRef>,
    key: &PropertyKey,
    extensible: bool,
    desc: &PropertyDescriptor,
    current: Option<&PropertyDescriptor>,
) -> bool {
    let Some(current) = current else {
        if !extensible {
            return false;
        }
        if let Some(obj) = obj {
            let stored = if desc.is_accessor_descriptor() {
                PropertyDescriptor {
                    get: Some(desc.get.clone().unwrap_or(JsValue::Undefined)),
                    set: Some(desc.set.clone().unwrap_or(JsValue::Undefined)),
                    enumerable: Some(desc.enumerable.unwrap_or(false)),
                    configurable: Some(desc.configurable.unwrap_or(false)),
                    ..Default::default()
                }
            } else {
                PropertyDescriptor {
                    value: Some(desc.value.clone().unwrap_or(JsValue::Undefined)),
                    writable: Some(desc.writable.unwrap_or(false)),
                    enumerable: Some(desc.enumerable.unwrap_or(false)),
                    configurable: Some(desc.configurable.unwrap_or(false)),
                    ..Default::default()
                }
            };
            obj.borrow_mut().insert_property(key.clone(), stored);
        }
        return true;
    };

    if desc.value.is_none()
        && desc.writable.is_none()
        && desc.get.is_none()
        && desc.set.is_none()
        && desc.enumerable.is_none()
        && desc.configurable.is_none()
    {
        return true;
    }

    if current.configurable == Some(false) {
        if desc.configurable == Some(true) {
            return false;
        }
        if let Some(e) = desc.enumerable
            && Some(e) != current.enumerable
        {
            return false;
        }
        if !desc.is_generic_descriptor()
            && desc.is_accessor_descriptor() != current.is_accessor_descriptor()
        {
            return false;
        }
        if current.is_accessor_descriptor() {
            if let Some(get) = &desc.get
                && !same_value(get, current.get.as_ref().unwrap_or(&JsValue::Undefined))
            {
                return false;
            }
            if let Some(set) = &desc.set
                && !same_value(set, current.set.as_ref().unwrap_or(&JsValue::Undefined))
            {
                return false;
            }
        } else if current.writable == Some(false) {
            if desc.writable == Some(true) {
                return false;
            }
            if let Some(value) = &desc.value
                && !same_value(value, current.value.as_ref().unwrap_or(&JsValue::Undefined))
            {
                return false;
            }
        }
    }

    if let Some(obj) = obj {
        let mut stored = if current.is_data_descriptor() && desc.is_accessor_descriptor() {
            // data → accessor flip keeps enumerable/configurable
            PropertyDescriptor {
                get: Some(JsValue::Undefined),
                set: Some(JsValue::Undefined),
                enumerable: current.enumerable,
                configurable: current.configurable,
                ..Default::default()
            }
        } else if current.is_accessor_descriptor() && desc.is_data_descriptor() {
            PropertyDescriptor {
                value: Some(JsValue::Undefined),
                writable: Some(false),
                enumerable: current.enumerable,
                configurable: current.configurable,
                ..Default::default()
            }
        } else {
            current.clone()
        };
        if let Some(v) = &desc.value {
            stored.value = Some(v.clone());
        }
        if let Some(w) = desc.writable {
            stored.writable = Some(w);
        }
        if let Some(g) = &desc.get {
            stored.get = Some(g.clone());
        }
        if let Some(s) = &desc.set {
            stored.set = Some(s.clone());
        }
        if let Some(e) = desc.enumerable {
            stored.enumerable = Some(e);
        }
        if let Some(c) = desc.configurable {
            stored.configurable = Some(c);
        }
        obj.borrow_mut().insert_property(key.clone(), stored);
    }
    true
}

// §10.1.6.1 OrdinaryDefineOwnProperty
pub(crate) fn ordinary_define_own_property(
    obj: &ObjRef,
    key: &PropertyKey,
    desc: &PropertyDescriptor,
) -> bool {
    let current = ordinary_get_own_property(obj, key);
    let extensible = obj.borrow().extensible;
    validate_and_apply_property_descriptor(Some(obj), key, extensible, desc, current.as_ref())
}

// §10.1.11.1 OrdinaryOwnPropertyKeys — integer indices ascending first,
// then string keys in creation order, then symbol keys in creation order.
pub(crate) fn ordinary_own_property_keys(obj: &ObjRef) -> Vec<PropertyKey> {
    let order = obj.borrow().property_order.clone();
    let mut indices: Vec<(u32, PropertyKey)> = Vec::new();
    let mut strings = Vec::new();
    let mut symbols = Vec::new();
    for key in order {
        match key.as_array_index() {
            Some(i) => indices.push((i, key)),
            None if key.is_symbol() => symbols.push(key),
            None => strings.push(key),
        }
    }
    indices.sort_by_key(|(i, _)| *i);
    let mut keys: Vec<PropertyKey> = indices.into_iter().map(|(_, k)| k).collect();
    keys.extend(strings);
    keys.extend(symbols);
    keys
}

impl Interpreter {
    // ---- the essential internal methods, with exotic dispatch ----

    /// [[GetPrototypeOf]]
    pub(crate) fn object_get_prototype_of(&self, obj: &ObjRef) -> Option<ObjRef> {
        ordinary_get_prototype_of(obj)
    }

    /// [[SetPrototypeOf]]
    pub(crate) fn object_set_prototype_of(&mut self, obj: &ObjRef, proto: Option<ObjRef>) -> bool {
        ordinary_set_prototype_of(obj, proto)
    }

    /// [[IsExtensible]]
    pub(crate) fn object_is_extensible(&self, obj: &ObjRef) -> bool {
        obj.borrow().extensible
    }

    /// [[PreventExtensions]] — always succeeds, and is one-way.
    pub(crate) fn object_prevent_extensions(&mut self, obj: &ObjRef) -> bool {
        obj.borrow_mut().extensible = false;
        true
    }

    /// [[GetOwnProperty]]
    pub(crate) fn object_get_own_property(
        &mut self,
        obj: &ObjRef,
        key: &PropertyKey,
    ) -> JsResult<Option<PropertyDescriptor>> {
        match method_suite(obj) {
            MethodSuite::Arguments => Ok(self.arguments_get_own_property(obj, key)),
            MethodSuite::StringExotic => Ok(self.string_exotic_get_own_property(obj, key)),
            _ => Ok(ordinary_get_own_property(obj, key)),
        }
    }

    /// [[DefineOwnProperty]]
    pub(crate) fn object_define_own_property(
        &mut self,
        obj: &ObjRef,
        key: &PropertyKey,
        desc: &PropertyDescriptor,
    ) -> JsResult<bool> {
        match method_suite(obj) {
            MethodSuite::Array => self.array_define_own_property(obj, key, desc),
            MethodSuite::StringExotic => Ok(self.string_exotic_define_own_property(obj, key, desc)),
            MethodSuite::Arguments => Ok(self.arguments_define_own_property(obj, key, desc)),
            MethodSuite::Ordinary => Ok(ordinary_define_own_property(obj, key, desc)),
        }
    }

    /// [[HasProperty]] — own (through the exotic view), then prototype chain.
    pub(crate) fn object_has_property(
        &mut self,
        obj: &ObjRef,
        key: &PropertyKey,
    ) -> JsResult<bool> {
        if self.object_get_own_property(obj, key)?.is_some() {
            return Ok(true);
        }
        match ordinary_get_prototype_of(obj) {
            Some(parent) => self.object_has_property(&parent, key),
            None => Ok(false),
        }
    }

    /// [[Get]] — `receiver` is the original base, threaded unchanged through
    /// the prototype walk so accessors see it as `this`.
    pub(crate) fn get_with_receiver(
        &mut self,
        obj: &ObjRef,
        key: &PropertyKey,
        receiver: &JsValue,
    ) -> JsResult<JsValue> {
        let desc = match self.object_get_own_property(obj, key)? {
            Some(d) => d,
            None => {
                return match ordinary_get_prototype_of(obj) {
                    Some(parent) => self.get_with_receiver(&parent, key, receiver),
                    None => Ok(JsValue::Undefined),
                };
            }
        };
        if desc.is_data_descriptor() {
            return Ok(desc.value.unwrap_or(JsValue::Undefined));
        }
        match desc.get {
            Some(getter) if !matches!(getter, JsValue::Undefined) => {
                self.call(&getter, receiver, &[])
            }
            _ => Ok(JsValue::Undefined),
        }
    }

    /// [[Set]] — ordinary for every kind except arguments exotic objects,
    /// whose parameter map must be written through *only* when the key is
    /// still mapped.
    pub(crate) fn set_with_receiver(
        &mut self,
        obj: &ObjRef,
        key: &PropertyKey,
        value: JsValue,
        receiver: &JsValue,
    ) -> JsResult<bool> {
        if method_suite(obj) == MethodSuite::Arguments {
            return self.arguments_set(obj, key, value, receiver);
        }
        self.ordinary_set(obj, key, value, receiver)
    }

    // §10.1.9.2 OrdinarySetWithOwnDescriptor
    pub(crate) fn ordinary_set(
        &mut self,
        obj: &ObjRef,
        key: &PropertyKey,
        value: JsValue,
        receiver: &JsValue,
    ) -> JsResult<bool> {
        let own = self.object_get_own_property(obj, key)?;
        let own = match own {
            Some(d) => d,
            None => match ordinary_get_prototype_of(obj) {
                Some(parent) => return self.set_with_receiver(&parent, key, value, receiver),
                None => PropertyDescriptor::data_default(JsValue::Undefined),
            },
        };
        if own.is_data_descriptor() {
            if own.writable == Some(false) {
                return Ok(false);
            }
            let JsValue::Object(_) = receiver else {
                return Ok(false);
            };
            let receiver_obj = self.object_ref(receiver)?;
            let existing = self.object_get_own_property(&receiver_obj, key)?;
            return match existing {
                Some(existing) => {
                    if existing.is_accessor_descriptor() || existing.writable == Some(false) {
                        return Ok(false);
                    }
                    let value_desc = PropertyDescriptor {
                        value: Some(value),
                        ..Default::default()
                    };
                    self.object_define_own_property(&receiver_obj, key, &value_desc)
                }
                None => self.create_data_property(&receiver_obj, key, value),
            };
        }
        match own.set {
            Some(setter) if !matches!(setter, JsValue::Undefined) => {
                self.call(&setter, receiver, &[value])?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// [[Delete]]
    pub(crate) fn object_delete(&mut self, obj: &ObjRef, key: &PropertyKey) -> JsResult<bool> {
        if method_suite(obj) == MethodSuite::Arguments {
            return Ok(self.arguments_delete(obj, key));
        }
        Ok(ordinary_delete(obj, key))
    }

    /// [[OwnPropertyKeys]]
    pub(crate) fn object_own_property_keys(&mut self, obj: &ObjRef) -> JsResult<Vec<PropertyKey>> {
        match method_suite(obj) {
            MethodSuite::StringExotic => Ok(self.string_exotic_own_property_keys(obj)),
            _ => Ok(ordinary_own_property_keys(obj)),
        }
    }

    // ---- operations on objects (§7.3) ----

    /// §7.3.2 Get
    pub(crate) fn get(&mut self, obj_val: &JsValue, key: &PropertyKey) -> JsResult<JsValue> {
        let obj = self.object_ref(obj_val)?;
        self.get_with_receiver(&obj, key, obj_val)
    }

    /// §7.3.3 GetV — property access on any language value; primitives are
    /// boxed transiently and the original value stays the receiver.
    pub(crate) fn get_v(&mut self, val: &JsValue, key: &PropertyKey) -> JsResult<JsValue> {
        if let JsValue::Object(_) = val {
            return self.get(val, key);
        }
        let boxed = self.to_object(val)?;
        let obj = self.object_ref(&boxed)?;
        self.get_with_receiver(&obj, key, val)
    }

    /// §7.3.4 Set (the throw-aware form)
    pub(crate) fn set_throw(
        &mut self,
        obj: &ObjRef,
        key: &PropertyKey,
        value: JsValue,
        throw: bool,
    ) -> JsResult<()> {
        let receiver = self.object_value(obj);
        let ok = self.set_with_receiver(obj, key, value, &receiver)?;
        if !ok && throw {
            return Err(self.throw_type_error(&format!("cannot set property '{key}'")));
        }
        Ok(())
    }

    /// §7.3.5 CreateDataProperty
    pub(crate) fn create_data_property(
        &mut self,
        obj: &ObjRef,
        key: &PropertyKey,
        value: JsValue,
    ) -> JsResult<bool> {
        let desc = PropertyDescriptor::data_default(value);
        self.object_define_own_property(obj, key, &desc)
    }

    /// §7.3.7 CreateDataPropertyOrThrow
    pub(crate) fn create_data_property_or_throw(
        &mut self,
        obj: &ObjRef,
        key: &PropertyKey,
        value: JsValue,
    ) -> JsResult<()> {
        if !self.create_data_property(obj, key, value)? {
            return Err(self.throw_type_error(&format!("cannot define property '{key}'")));
        }
        Ok(())
    }

    /// §7.3.8 DefinePropertyOrThrow
    pub(crate) fn define_property_or_throw(
        &mut self,
        obj: &ObjRef,
        key: &PropertyKey,
        desc: &PropertyDescriptor,
    ) -> JsResult<()> {
        if !self.object_define_own_property(obj, key, desc)? {
            return Err(self.throw_type_error(&format!("cannot define property '{key}'")));
        }
        Ok(())
    }

    /// §7.3.10 DeletePropertyOrThrow
    pub(crate) fn delete_property_or_throw(
        &mut self,
        obj: &ObjRef,
        key: &PropertyKey,
    ) -> JsResult<()> {
        if !self.object_delete(obj, key)? {
            return Err(self.throw_type_error(&format!("cannot delete property '{key}'")));
        }
        Ok(())
    }

    /// §7.3.12 HasOwnProperty
    pub(crate) fn has_own_property(&mut self, obj: &ObjRef, key: &PropertyKey) -> JsResult<bool> {
        Ok(self.object_get_own_property(obj, key)?.is_some())
    }

    /// §7.3.11 GetMethod — undefined and null erase to "no method"; any other
    /// non-callable value is a TypeError.
    pub(crate) fn get_method(
        &mut self,
        val: &JsValue,
        key: &PropertyKey,
    ) -> JsResult<Option<JsValue>> {
        let func = self.get_v(val, key)?;
        if func.is_nullish() {
            return Ok(None);
        }
        if !self.is_callable(&func) {
            return Err(self.throw_type_error(&format!("property '{key}' is not a function")));
        }
        Ok(Some(func))
    }

    /// §7.3.21 Invoke
    pub(crate) fn invoke(
        &mut self,
        val: &JsValue,
        key: &PropertyKey,
        args: &[JsValue],
    ) -> JsResult<JsValue> {
        let func = self.get_v(val, key)?;
        self.call(&func, val, args)
    }

    /// §10.1.12 OrdinaryObjectCreate
    pub(crate) fn ordinary_object_create(&mut self, proto: Option<ObjRef>) -> ObjRef {
        self.create_object(proto, ObjectKind::Ordinary)
    }

    /// §10.1.14 GetPrototypeFromConstructor — `newTarget.prototype` when it
    /// is an object, otherwise the fallback intrinsic of the constructor's
    /// own realm.
    pub(crate) fn get_prototype_from_constructor(
        &mut self,
        constructor: &JsValue,
        fallback: Intrinsic,
    ) -> JsResult<ObjRef> {
        let proto = self.get(constructor, &PropertyKey::from_str("prototype"))?;
        if let JsValue::Object(_) = proto {
            return self.object_ref(&proto);
        }
        let realm = self.function_realm(constructor);
        Ok(self.realm_intrinsic(realm, fallback))
    }

    /// §10.1.13 OrdinaryCreateFromConstructor
    pub(crate) fn ordinary_create_from_constructor(
        &mut self,
        constructor: &JsValue,
        fallback: Intrinsic,
        kind: ObjectKind,
    ) -> JsResult<ObjRef> {
        let proto = self.get_prototype_from_constructor(constructor, fallback)?;
        Ok(self.create_object(Some(proto), kind))
    }

    /// §6.2.6.4 FromPropertyDescriptor
    pub(crate) fn from_property_descriptor(&mut self, desc: &PropertyDescriptor) -> JsValue {
        let proto = self.intrinsic(Intrinsic::ObjectPrototype);
        let obj = self.ordinary_object_create(Some(proto));
        {
            let mut o = obj.borrow_mut();
            if let Some(v) = &desc.value {
                o.insert_value(PropertyKey::from_str("value"), v.clone());
            }
            if let Some(w) = desc.writable {
                o.insert_value(PropertyKey::from_str("writable"), JsValue::Boolean(w));
            }
            if let Some(g) = &desc.get {
                o.insert_value(PropertyKey::from_str("get"), g.clone());
            }
            if let Some(s) = &desc.set {
                o.insert_value(PropertyKey::from_str("set"), s.clone());
            }
            if let Some(e) = desc.enumerable {
                o.insert_value(PropertyKey::from_str("enumerable"), JsValue::Boolean(e));
            }
            if let Some(c) = desc.configurable {
                o.insert_value(PropertyKey::from_str("configurable"), JsValue::Boolean(c));
            }
        }
        self.object_value(&obj)
    }

    /// §6.2.6.5 ToPropertyDescriptor — mixing data and accessor fields in
    /// one source object is a TypeError.
    pub(crate) fn to_property_descriptor(
        &mut self,
        val: &JsValue,
    ) -> JsResult<PropertyDescriptor> {
        let obj = self.object_ref(val)?;
        let mut desc = PropertyDescriptor::default();
        if self.has_own_property(&obj, &PropertyKey::from_str("enumerable"))? {
            let v = self.get(val, &PropertyKey::from_str("enumerable"))?;
            desc.enumerable = Some(to_boolean(&v));
        }
        if self.has_own_property(&obj, &PropertyKey::from_str("configurable"))? {
            let v = self.get(val, &PropertyKey::from_str("configurable"))?;
            desc.configurable = Some(to_boolean(&v));
        }
        if self.has_own_property(&obj, &PropertyKey::from_str("value"))? {
            desc.value = Some(self.get(val, &PropertyKey::from_str("value"))?);
        }
        if self.has_own_property(&obj, &PropertyKey::from_str("writable"))? {
            let v = self.get(val, &PropertyKey::from_str("writable"))?;
            desc.writable = Some(to_boolean(&v));
        }
        if self.has_own_property(&obj, &PropertyKey::from_str("get"))? {
            let getter = self.get(val, &PropertyKey::from_str("get"))?;
            if !self.is_callable(&getter) && !matches!(getter, JsValue::Undefined) {
                return Err(self.throw_type_error("getter must be a function"));
            }
            desc.get = Some(getter);
        }
        if self.has_own_property(&obj, &PropertyKey::from_str("set"))? {
            let setter = self.get(val, &PropertyKey::from_str("set"))?;
            if !self.is_callable(&setter) && !matches!(setter, JsValue::Undefined) {
                return Err(self.throw_type_error("setter must be a function"));
            }
            desc.set = Some(setter);
        }
        if desc.is_accessor_descriptor() && (desc.value.is_some() || desc.writable.is_some()) {
            return Err(
                self.throw_type_error("property descriptor cannot be both data and accessor")
            );
        }
        Ok(desc)
    }
}

// §10.1.10.1 OrdinaryDelete
pub(crate) fn ordinary_delete(obj: &ObjRef, key: &PropertyKey) -> bool {
    let configurable = match obj.borrow().get_own(key) {
        None => return true,
        Some(desc) => desc.configurable == Some(true),
    };
    if configurable {
        obj.borrow_mut().remove_property(key);
        return true;
    }
    false
}
