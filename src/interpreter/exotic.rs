//! Exotic object behaviors (§10.4): arguments objects with a live
//! parameter map, string objects with synthetic index properties, and
//! arrays with `length` maintenance.

use super::ordinary::{
    ordinary_define_own_property, ordinary_delete, ordinary_get_own_property,
    ordinary_own_property_keys, validate_and_apply_property_descriptor,
};
use super::*;
use crate::ast::FormalParameters;
use crate::types::{JsString, JsValue};
use std::rc::Rc;

impl Interpreter {
    // ---- arguments exotic objects (§10.4.4) ----

    fn with_arguments_map<R>(obj: &ObjRef, f: impl FnOnce(&mut ParameterMap) -> R) -> R {
        let mut borrow = obj.borrow_mut();
        match &mut borrow.kind {
            ObjectKind::Arguments { map } => f(map),
            _ => unreachable!("arguments method dispatched on a non-arguments object"),
        }
    }

    // §10.4.4.1 [[GetOwnProperty]] — a mapped key reports the *binding's*
    // current value, not the stored one.
    pub(crate) fn arguments_get_own_property(
        &mut self,
        obj: &ObjRef,
        key: &PropertyKey,
    ) -> Option<PropertyDescriptor> {
        let mut desc = ordinary_get_own_property(obj, key)?;
        let mapped = Self::with_arguments_map(obj, |map| map.get(key));
        if let Some(live) = mapped {
            desc.value = Some(live);
        }
        Some(desc)
    }

    // §10.4.4.2 [[DefineOwnProperty]] — defining over a mapped index either
    // updates the binding or unlinks it, depending on what the descriptor
    // changes.
    pub(crate) fn arguments_define_own_property(
        &mut self,
        obj: &ObjRef,
        key: &PropertyKey,
        desc: &PropertyDescriptor,
    ) -> bool {
        let is_mapped = Self::with_arguments_map(obj, |map| map.contains(key));
        let mut new_desc = desc.clone();
        if is_mapped
            && desc.is_data_descriptor()
            && desc.value.is_none()
            && desc.writable == Some(false)
        {
            // keep the last mapped value visible after the unlink below
            new_desc.value = Self::with_arguments_map(obj, |map| map.get(key));
        }
        if !ordinary_define_own_property(obj, key, &new_desc) {
            return false;
        }
        if is_mapped {
            if desc.is_accessor_descriptor() {
                Self::with_arguments_map(obj, |map| map.remove(key));
            } else {
                if let Some(value) = &desc.value {
                    Self::with_arguments_map(obj, |map| map.set(key, value.clone()));
                }
                if desc.writable == Some(false) {
                    Self::with_arguments_map(obj, |map| map.remove(key));
                }
            }
        }
        true
    }

    // §10.4.4.4 [[Set]] — writes through to the argument binding only while
    // the key is still mapped and the write targets the arguments object
    // itself; an unlinked or foreign-receiver write is plain ordinary [[Set]].
    pub(crate) fn arguments_set(
        &mut self,
        obj: &ObjRef,
        key: &PropertyKey,
        value: JsValue,
        receiver: &JsValue,
    ) -> JsResult<bool> {
        let self_value = self.object_value(obj);
        let is_mapped = same_value(&self_value, receiver)
            && Self::with_arguments_map(obj, |map| map.contains(key));
        if is_mapped {
            Self::with_arguments_map(obj, |map| map.set(key, value.clone()));
        }
        self.ordinary_set(obj, key, value, receiver)
    }

    // §10.4.4.5 [[Delete]] — a successful delete unlinks the mapping.
    pub(crate) fn arguments_delete(&mut self, obj: &ObjRef, key: &PropertyKey) -> bool {
        let is_mapped = Self::with_arguments_map(obj, |map| map.contains(key));
        let result = ordinary_delete(obj, key);
        if result && is_mapped {
            Self::with_arguments_map(obj, |map| map.remove(key));
        }
        result
    }

    fn arguments_iterator_method(&mut self) -> JsValue {
        let function_proto = self.intrinsic(Intrinsic::FunctionPrototype);
        let values = self.create_builtin_object(
            Some(function_proto),
            "values",
            0,
            false,
            Rc::new(|interp: &mut Interpreter, this, _args, _nt| {
                let obj = interp.object_ref(this)?;
                Ok(interp.create_array_iterator(&obj))
            }),
        );
        self.object_value(&values)
    }

    // §10.4.4.7 CreateUnmappedArgumentsObject — strict functions and
    // non-simple parameter lists get a snapshot with a poisoned `callee`.
    pub(crate) fn create_unmapped_arguments_object(&mut self, args: &[JsValue]) -> JsValue {
        let proto = self.intrinsic(Intrinsic::ObjectPrototype);
        let obj = self.create_object(
            Some(proto),
            ObjectKind::Arguments {
                map: ParameterMap::default(),
            },
        );
        {
            let mut o = obj.borrow_mut();
            o.insert_property(
                PropertyKey::from_str("length"),
                PropertyDescriptor::data(JsValue::Number(args.len() as f64), true, false, true),
            );
            for (i, arg) in args.iter().enumerate() {
                o.insert_value(PropertyKey::from_index(i as u32), arg.clone());
            }
        }
        let iterator_fn = self.arguments_iterator_method();
        let poison = self.intrinsic(Intrinsic::ThrowTypeError);
        let poison_val = self.object_value(&poison);
        {
            let mut o = obj.borrow_mut();
            o.insert_property(
                PropertyKey::Symbol(self.well_known.iterator.clone()),
                PropertyDescriptor::data(iterator_fn, true, false, true),
            );
            o.insert_property(
                PropertyKey::from_str("callee"),
                PropertyDescriptor::accessor(
                    Some(poison_val.clone()),
                    Some(poison_val),
                    false,
                    false,
                ),
            );
        }
        self.object_value(&obj)
    }

    // §10.4.4.6 CreateMappedArgumentsObject — only reached for simple
    // parameter lists. The map is built from the last parameter backwards so
    // a duplicate name binds its final occurrence.
    pub(crate) fn create_mapped_arguments_object(
        &mut self,
        callee: &JsValue,
        formals: &FormalParameters,
        args: &[JsValue],
        env: &EnvRef,
    ) -> JsValue {
        debug_assert!(formals.is_simple_parameter_list());
        let names = formals.bound_names();
        let mut map = ParameterMap::default();
        let mut mapped_names: Vec<&str> = Vec::new();
        for (index, name) in names.iter().enumerate().rev() {
            if index < args.len() && !mapped_names.contains(&name.as_str()) {
                mapped_names.push(name);
                map.entries
                    .insert(index as u32, (env.clone(), name.clone()));
            }
        }

        let proto = self.intrinsic(Intrinsic::ObjectPrototype);
        let obj = self.create_object(Some(proto), ObjectKind::Arguments { map });
        {
            let mut o = obj.borrow_mut();
            o.insert_property(
                PropertyKey::from_str("length"),
                PropertyDescriptor::data(JsValue::Number(args.len() as f64), true, false, true),
            );
            for (i, arg) in args.iter().enumerate() {
                o.insert_value(PropertyKey::from_index(i as u32), arg.clone());
            }
        }
        let iterator_fn = self.arguments_iterator_method();
        {
            let mut o = obj.borrow_mut();
            o.insert_property(
                PropertyKey::Symbol(self.well_known.iterator.clone()),
                PropertyDescriptor::data(iterator_fn, true, false, true),
            );
            o.insert_property(
                PropertyKey::from_str("callee"),
                PropertyDescriptor::data(callee.clone(), true, false, true),
            );
        }
        self.object_value(&obj)
    }

    // ---- string exotic objects (§10.4.3) ----

    fn string_data(obj: &ObjRef) -> JsString {
        match &obj.borrow().kind {
            ObjectKind::StringExotic { data } => data.clone(),
            _ => unreachable!("string method dispatched on a non-string object"),
        }
    }

    // §10.4.3.5 StringGetOwnProperty — a synthetic, immutable one-code-unit
    // descriptor for indices inside the wrapped string.
    fn string_index_property(obj: &ObjRef, key: &PropertyKey) -> Option<PropertyDescriptor> {
        let index = key.as_array_index()?;
        let data = Self::string_data(obj);
        let unit = data.code_unit_at(index as usize)?;
        Some(PropertyDescriptor::data(
            JsValue::String(unit),
            false,
            true,
            false,
        ))
    }

    // §10.4.3.1 [[GetOwnProperty]]
    pub(crate) fn string_exotic_get_own_property(
        &mut self,
        obj: &ObjRef,
        key: &PropertyKey,
    ) -> Option<PropertyDescriptor> {
        ordinary_get_own_property(obj, key).or_else(|| Self::string_index_property(obj, key))
    }

    // §10.4.3.2 [[DefineOwnProperty]] — a synthetic index slot only accepts
    // descriptors compatible with its frozen shape.
    pub(crate) fn string_exotic_define_own_property(
        &mut self,
        obj: &ObjRef,
        key: &PropertyKey,
        desc: &PropertyDescriptor,
    ) -> bool {
        if let Some(string_desc) = Self::string_index_property(obj, key) {
            let extensible = obj.borrow().extensible;
            return validate_and_apply_property_descriptor(
                None,
                key,
                extensible,
                desc,
                Some(&string_desc),
            );
        }
        ordinary_define_own_property(obj, key, desc)
    }

    // §10.4.3.3 [[OwnPropertyKeys]] — synthetic string indices precede
    // everything the ordinary ordering would report.
    pub(crate) fn string_exotic_own_property_keys(&mut self, obj: &ObjRef) -> Vec<PropertyKey> {
        let len = Self::string_data(obj).len();
        let mut keys: Vec<PropertyKey> = (0..len as u32).map(PropertyKey::from_index).collect();
        for key in ordinary_own_property_keys(obj) {
            match key.as_array_index() {
                Some(i) if (i as usize) < len => {}
                _ => keys.push(key),
            }
        }
        keys
    }

    // §10.4.3.4 StringCreate
    pub(crate) fn create_string_object(&mut self, data: JsString) -> ObjRef {
        let len = data.len();
        let proto = self.intrinsic(Intrinsic::StringPrototype);
        let obj = self.create_object(Some(proto), ObjectKind::StringExotic { data });
        obj.borrow_mut().insert_property(
            PropertyKey::from_str("length"),
            PropertyDescriptor::data(JsValue::Number(len as f64), false, false, false),
        );
        obj
    }

    // ---- array exotic objects (§10.4.2) ----

    // §10.4.2.2 ArrayCreate
    pub(crate) fn array_create(
        &mut self,
        length: u64,
        proto: Option<ObjRef>,
    ) -> JsResult<ObjRef> {
        if length > u32::MAX as u64 {
            return Err(self.throw_range_error("invalid array length"));
        }
        let proto = proto.unwrap_or_else(|| self.intrinsic(Intrinsic::ArrayPrototype));
        let obj = self.create_object(Some(proto), ObjectKind::Array);
        obj.borrow_mut().insert_property(
            PropertyKey::from_str("length"),
            PropertyDescriptor::data(JsValue::Number(length as f64), true, false, false),
        );
        Ok(obj)
    }

    // §7.3.18 CreateArrayFromList
    pub(crate) fn create_array_from(&mut self, items: &[JsValue]) -> JsResult<ObjRef> {
        let array = self.array_create(0, None)?;
        for (i, item) in items.iter().enumerate() {
            self.create_data_property_or_throw(
                &array,
                &PropertyKey::from_index(i as u32),
                item.clone(),
            )?;
        }
        Ok(array)
    }

    fn array_length(obj: &ObjRef) -> (u32, bool) {
        let borrow = obj.borrow();
        let desc = borrow
            .get_own(&PropertyKey::from_str("length"))
            .expect("array without a length property");
        let len = match desc.value {
            Some(JsValue::Number(n)) => n as u32,
            _ => 0,
        };
        (len, desc.writable != Some(false))
    }

    // §10.4.2.1 [[DefineOwnProperty]] — index writes beyond `length` grow it,
    // unless `length` has been frozen.
    pub(crate) fn array_define_own_property(
        &mut self,
        obj: &ObjRef,
        key: &PropertyKey,
        desc: &PropertyDescriptor,
    ) -> JsResult<bool> {
        if *key == PropertyKey::from_str("length") {
            return self.array_set_length(obj, desc);
        }
        if let Some(index) = key.as_array_index() {
            let (old_len, len_writable) = Self::array_length(obj);
            if index >= old_len && !len_writable {
                return Ok(false);
            }
            if !ordinary_define_own_property(obj, key, desc) {
                return Ok(false);
            }
            if index >= old_len {
                let mut borrow = obj.borrow_mut();
                let len_key = PropertyKey::from_str("length");
                if let Some(len_desc) = borrow.properties.get_mut(&len_key) {
                    len_desc.value = Some(JsValue::Number((index + 1) as f64));
                }
            }
            return Ok(true);
        }
        Ok(ordinary_define_own_property(obj, key, desc))
    }

    // §10.4.2.4 ArraySetLength — truncation deletes trailing elements and
    // stops (reporting failure) at the first non-configurable one.
    pub(crate) fn array_set_length(
        &mut self,
        obj: &ObjRef,
        desc: &PropertyDescriptor,
    ) -> JsResult<bool> {
        let len_key = PropertyKey::from_str("length");
        let Some(value) = &desc.value else {
            return Ok(ordinary_define_own_property(obj, &len_key, desc));
        };
        let new_len = self.to_uint32(value)?;
        let number_len = self.to_number(value)?;
        if new_len as f64 != number_len {
            return Err(self.throw_range_error("invalid array length"));
        }
        let mut new_len_desc = desc.clone();
        new_len_desc.value = Some(JsValue::Number(new_len as f64));

        let (old_len, len_writable) = Self::array_length(obj);
        if new_len >= old_len {
            return Ok(ordinary_define_own_property(obj, &len_key, &new_len_desc));
        }
        if !len_writable {
            return Ok(false);
        }
        let new_writable = new_len_desc.writable != Some(false);
        if !new_writable {
            // defer the writability flip until after the deletions
            new_len_desc.writable = Some(true);
        }
        if !ordinary_define_own_property(obj, &len_key, &new_len_desc) {
            return Ok(false);
        }

        let mut doomed: Vec<u32> = obj
            .borrow()
            .property_order
            .iter()
            .filter_map(|k| k.as_array_index())
            .filter(|i| *i >= new_len)
            .collect();
        doomed.sort_unstable_by(|a, b| b.cmp(a));
        for index in doomed {
            let key = PropertyKey::from_index(index);
            if !ordinary_delete(obj, &key) {
                new_len_desc.value = Some(JsValue::Number((index + 1) as f64));
                if !new_writable {
                    new_len_desc.writable = Some(false);
                }
                ordinary_define_own_property(obj, &len_key, &new_len_desc);
                return Ok(false);
            }
        }
        if !new_writable {
            let freeze = PropertyDescriptor {
                writable: Some(false),
                ..Default::default()
            };
            ordinary_define_own_property(obj, &len_key, &freeze);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Pattern;

    fn machine() -> Interpreter {
        let mut interp = Interpreter::new();
        let realm = interp.create_realm();
        let ctx = interp.new_context(None, realm, None, None, None);
        interp.push_context(ctx);
        interp
    }

    fn simple_formals(names: &[&str]) -> FormalParameters {
        FormalParameters {
            items: names
                .iter()
                .map(|n| Pattern::Identifier(n.to_string()))
                .collect(),
        }
    }

    fn mapped_arguments(
        interp: &mut Interpreter,
        names: &[&str],
        args: &[JsValue],
    ) -> (ObjRef, EnvRef) {
        let env = Environment::new(None);
        for (i, name) in names.iter().enumerate() {
            let value = args.get(i).cloned().unwrap_or(JsValue::Undefined);
            env.borrow_mut()
                .declare_initialized(name, BindingKind::Var, value);
        }
        let formals = simple_formals(names);
        let callee = JsValue::Undefined;
        let val = interp.create_mapped_arguments_object(&callee, &formals, args, &env);
        let obj = interp.object_ref(&val).unwrap();
        (obj, env)
    }

    #[test]
    fn mapped_read_sees_binding_writes() {
        let mut interp = machine();
        let (obj, env) =
            mapped_arguments(&mut interp, &["a", "b"], &[JsValue::Number(1.0), JsValue::Number(2.0)]);
        env.borrow_mut().set("a", JsValue::Number(10.0)).unwrap();
        let desc = interp
            .arguments_get_own_property(&obj, &PropertyKey::from_str("0"))
            .unwrap();
        assert!(matches!(desc.value, Some(JsValue::Number(n)) if n == 10.0));
    }

    #[test]
    fn mapped_write_updates_binding() {
        let mut interp = machine();
        let (obj, env) = mapped_arguments(&mut interp, &["a"], &[JsValue::Number(1.0)]);
        let receiver = interp.object_value(&obj);
        interp
            .set_with_receiver(&obj, &PropertyKey::from_str("0"), JsValue::Number(5.0), &receiver)
            .unwrap();
        assert!(matches!(
            env.borrow().get("a"),
            Some(Ok(JsValue::Number(n))) if n == 5.0
        ));
    }

    #[test]
    fn delete_unlinks_mapping() {
        let mut interp = machine();
        let (obj, env) = mapped_arguments(&mut interp, &["a"], &[JsValue::Number(1.0)]);
        let key = PropertyKey::from_str("0");
        assert!(interp.object_delete(&obj, &key).unwrap());
        // re-create the property; it is no longer live
        interp
            .create_data_property(&obj, &key, JsValue::Number(2.0))
            .unwrap();
        env.borrow_mut().set("a", JsValue::Number(99.0)).unwrap();
        let desc = interp.arguments_get_own_property(&obj, &key).unwrap();
        assert!(matches!(desc.value, Some(JsValue::Number(n)) if n == 2.0));
    }

    #[test]
    fn define_nonwritable_keeps_value_but_unlinks() {
        let mut interp = machine();
        let (obj, env) = mapped_arguments(&mut interp, &["a"], &[JsValue::Number(1.0)]);
        let key = PropertyKey::from_str("0");
        let freeze = PropertyDescriptor {
            writable: Some(false),
            ..Default::default()
        };
        assert!(interp.arguments_define_own_property(&obj, &key, &freeze));
        // the last mapped value was captured at unlink time
        env.borrow_mut().set("a", JsValue::Number(42.0)).unwrap();
        let desc = interp.arguments_get_own_property(&obj, &key).unwrap();
        assert!(matches!(desc.value, Some(JsValue::Number(n)) if n == 1.0));
    }

    #[test]
    fn unmapped_callee_is_poisoned() {
        let mut interp = machine();
        let val = interp.create_unmapped_arguments_object(&[JsValue::Number(1.0)]);
        let result = interp.get(&val, &PropertyKey::from_str("callee"));
        assert!(matches!(result, Err(EvalError::Thrown(_))));
        // length is still a plain data property
        let len = interp.get(&val, &PropertyKey::from_str("length")).unwrap();
        assert!(matches!(len, JsValue::Number(n) if n == 1.0));
    }

    #[test]
    fn string_indices_are_synthetic_and_frozen() {
        let mut interp = machine();
        let obj = interp.create_string_object(JsString::from_str("hi"));
        let d0 = interp
            .string_exotic_get_own_property(&obj, &PropertyKey::from_str("0"))
            .unwrap();
        assert!(matches!(&d0.value, Some(JsValue::String(s)) if s.to_rust_string() == "h"));
        assert_eq!(d0.writable, Some(false));
        assert_eq!(d0.enumerable, Some(true));
        assert_eq!(d0.configurable, Some(false));
        assert!(interp
            .string_exotic_get_own_property(&obj, &PropertyKey::from_str("2"))
            .is_none());

        // redefinition must stay compatible with the frozen shape
        let same = PropertyDescriptor {
            value: Some(JsValue::string("h")),
            ..Default::default()
        };
        assert!(interp.string_exotic_define_own_property(&obj, &PropertyKey::from_str("0"), &same));
        let other = PropertyDescriptor {
            value: Some(JsValue::string("x")),
            ..Default::default()
        };
        assert!(!interp.string_exotic_define_own_property(&obj, &PropertyKey::from_str("0"), &other));
    }

    #[test]
    fn string_keys_lead_with_indices() {
        let mut interp = machine();
        let obj = interp.create_string_object(JsString::from_str("ab"));
        interp
            .create_data_property(&obj, &PropertyKey::from_str("extra"), JsValue::Undefined)
            .unwrap();
        let keys = interp.object_own_property_keys(&obj).unwrap();
        let rendered: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(rendered, vec!["0", "1", "length", "extra"]);
    }

    #[test]
    fn array_index_write_grows_length() {
        let mut interp = machine();
        let array = interp.array_create(0, None).unwrap();
        interp
            .create_data_property(&array, &PropertyKey::from_str("5"), JsValue::Number(1.0))
            .unwrap();
        let (len, _) = Interpreter::array_length(&array);
        assert_eq!(len, 6);
    }

    #[test]
    fn shrinking_length_deletes_elements() {
        let mut interp = machine();
        let items: Vec<JsValue> = (0..4).map(|i| JsValue::Number(i as f64)).collect();
        let array = interp.create_array_from(&items).unwrap();
        let shrink = PropertyDescriptor {
            value: Some(JsValue::Number(2.0)),
            ..Default::default()
        };
        assert!(interp.array_set_length(&array, &shrink).unwrap());
        assert!(!array.borrow().has_own(&PropertyKey::from_str("3")));
        assert!(!array.borrow().has_own(&PropertyKey::from_str("2")));
        assert!(array.borrow().has_own(&PropertyKey::from_str("1")));
        let (len, _) = Interpreter::array_length(&array);
        assert_eq!(len, 2);
    }

    #[test]
    fn truncation_stops_at_nonconfigurable_element() {
        let mut interp = machine();
        let items: Vec<JsValue> = (0..4).map(|i| JsValue::Number(i as f64)).collect();
        let array = interp.create_array_from(&items).unwrap();
        let pinned = PropertyDescriptor::data(JsValue::Number(2.0), true, true, false);
        assert!(interp
            .array_define_own_property(&array, &PropertyKey::from_str("2"), &pinned)
            .unwrap());
        let shrink = PropertyDescriptor {
            value: Some(JsValue::Number(0.0)),
            ..Default::default()
        };
        assert!(!interp.array_set_length(&array, &shrink).unwrap());
        // length landed just above the immovable element
        let (len, _) = Interpreter::array_length(&array);
        assert_eq!(len, 3);
        assert!(array.borrow().has_own(&PropertyKey::from_str("2")));
        assert!(!array.borrow().has_own(&PropertyKey::from_str("3")));
    }

    #[test]
    fn frozen_length_blocks_growth() {
        let mut interp = machine();
        let array = interp.array_create(2, None).unwrap();
        let freeze = PropertyDescriptor {
            writable: Some(false),
            ..Default::default()
        };
        assert!(interp.array_set_length(&array, &freeze).unwrap());
        let write = PropertyDescriptor::data_default(JsValue::Number(1.0));
        assert!(!interp
            .array_define_own_property(&array, &PropertyKey::from_str("7"), &write)
            .unwrap());
        // in-range writes still work
        assert!(interp
            .array_define_own_property(&array, &PropertyKey::from_str("1"), &write)
            .unwrap());
    }

    #[test]
    fn non_integral_length_is_a_range_error() {
        let mut interp = machine();
        let array = interp.array_create(0, None).unwrap();
        let bad = PropertyDescriptor {
            value: Some(JsValue::Number(1.5)),
            ..Default::default()
        };
        assert!(matches!(
            interp.array_set_length(&array, &bad),
            Err(EvalError::Thrown(_))
        ));
        assert!(matches!(
            interp.array_create(u32::MAX as u64 + 1, None),
            Err(EvalError::Thrown(_))
        ));
    }
}
