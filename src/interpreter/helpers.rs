use super::*;
use crate::types::{JsString, JsValue, number_ops};

/// Preferred type passed to ToPrimitive (§7.1.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrimitiveHint {
    Default,
    Number,
    String,
}

// §7.1.3 ToBoolean — total on language values; the machine-internal
// variants coerce falsy and never reach evaluated code.
pub(crate) fn to_boolean(val: &JsValue) -> bool {
    match val {
        JsValue::Empty | JsValue::List(_) => false,
        JsValue::Undefined | JsValue::Null => false,
        JsValue::Boolean(b) => *b,
        JsValue::Number(n) => *n != 0.0 && !n.is_nan(),
        JsValue::String(s) => !s.is_empty(),
        JsValue::Symbol(_) | JsValue::Object(_) => true,
    }
}

// §7.1.4.1.1 StringToNumber
pub(crate) fn string_to_number(s: &JsString) -> f64 {
    let rust_str = s.to_rust_string();
    let trimmed = rust_str.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        return i64::from_str_radix(&trimmed[2..], 16)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }
    if trimmed.starts_with("0o") || trimmed.starts_with("0O") {
        return i64::from_str_radix(&trimmed[2..], 8)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }
    if trimmed.starts_with("0b") || trimmed.starts_with("0B") {
        return i64::from_str_radix(&trimmed[2..], 2)
            .map(|n| n as f64)
            .unwrap_or(f64::NAN);
    }
    if trimmed == "Infinity" || trimmed == "+Infinity" {
        return f64::INFINITY;
    }
    if trimmed == "-Infinity" {
        return f64::NEG_INFINITY;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

// §7.2.10 SameValue
pub(crate) fn same_value(left: &JsValue, right: &JsValue) -> bool {
    match (left, right) {
        (JsValue::Number(a), JsValue::Number(b)) => number_ops::same_value(*a, *b),
        _ => strict_equality(left, right),
    }
}

// §7.2.11 SameValueZero
pub(crate) fn same_value_zero(left: &JsValue, right: &JsValue) -> bool {
    match (left, right) {
        (JsValue::Number(a), JsValue::Number(b)) => number_ops::same_value_zero(*a, *b),
        _ => strict_equality(left, right),
    }
}

// §7.2.16 IsStrictlyEqual
pub(crate) fn strict_equality(left: &JsValue, right: &JsValue) -> bool {
    match (left, right) {
        (JsValue::Undefined, JsValue::Undefined) => true,
        (JsValue::Null, JsValue::Null) => true,
        (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
        (JsValue::Number(a), JsValue::Number(b)) => number_ops::equal(*a, *b),
        (JsValue::String(a), JsValue::String(b)) => a == b,
        (JsValue::Symbol(a), JsValue::Symbol(b)) => a.id == b.id,
        (JsValue::Object(a), JsValue::Object(b)) => a.id == b.id,
        _ => false,
    }
}

impl Interpreter {
    // §7.1.1 ToPrimitive
    pub(crate) fn to_primitive(&mut self, val: &JsValue, hint: PrimitiveHint) -> JsResult<JsValue> {
        match val {
            JsValue::Empty | JsValue::List(_) => {
                Err(self.throw_type_error("cannot convert an internal value to a primitive"))
            }
            JsValue::Object(_) => {
                let exotic_key = PropertyKey::Symbol(self.well_known.to_primitive.clone());
                if let Some(method) = self.get_method(val, &exotic_key)? {
                    let hint_str = match hint {
                        PrimitiveHint::Default => "default",
                        PrimitiveHint::Number => "number",
                        PrimitiveHint::String => "string",
                    };
                    let result = self.call(&method, val, &[JsValue::string(hint_str)])?;
                    if result.is_object() {
                        return Err(self
                            .throw_type_error("Symbol.toPrimitive returned an object"));
                    }
                    return Ok(result);
                }
                let hint = if hint == PrimitiveHint::Default {
                    PrimitiveHint::Number
                } else {
                    hint
                };
                self.ordinary_to_primitive(val, hint)
            }
            other => Ok(other.clone()),
        }
    }

    // §7.1.1.1 OrdinaryToPrimitive
    pub(crate) fn ordinary_to_primitive(
        &mut self,
        val: &JsValue,
        hint: PrimitiveHint,
    ) -> JsResult<JsValue> {
        let method_names: [&str; 2] = if hint == PrimitiveHint::String {
            ["toString", "valueOf"]
        } else {
            ["valueOf", "toString"]
        };
        for name in method_names {
            let method = self.get_v(val, &PropertyKey::from_str(name))?;
            if self.is_callable(&method) {
                let result = self.call(&method, val, &[])?;
                if !result.is_object() {
                    return Ok(result);
                }
            }
        }
        Err(self.throw_type_error("cannot convert object to primitive value"))
    }

    // §7.1.4 ToNumber
    pub(crate) fn to_number(&mut self, val: &JsValue) -> JsResult<f64> {
        match val {
            JsValue::Empty | JsValue::List(_) => {
                Err(self.throw_type_error("cannot convert an internal value to a number"))
            }
            JsValue::Undefined => Ok(f64::NAN),
            JsValue::Null => Ok(0.0),
            JsValue::Boolean(b) => Ok(*b as u8 as f64),
            JsValue::Number(n) => Ok(*n),
            JsValue::String(s) => Ok(string_to_number(s)),
            JsValue::Symbol(_) => Err(self.throw_type_error("cannot convert a Symbol to a number")),
            JsValue::Object(_) => {
                let prim = self.to_primitive(val, PrimitiveHint::Number)?;
                self.to_number(&prim)
            }
        }
    }

    // §7.1.6–§7.1.12 — the fixed-width truncation family.
    pub(crate) fn to_int32(&mut self, val: &JsValue) -> JsResult<i32> {
        Ok(number_ops::to_int32(self.to_number(val)?))
    }

    pub(crate) fn to_uint32(&mut self, val: &JsValue) -> JsResult<u32> {
        Ok(number_ops::to_uint32(self.to_number(val)?))
    }

    pub(crate) fn to_int16(&mut self, val: &JsValue) -> JsResult<i16> {
        Ok(number_ops::to_int16(self.to_number(val)?))
    }

    pub(crate) fn to_uint16(&mut self, val: &JsValue) -> JsResult<u16> {
        Ok(number_ops::to_uint16(self.to_number(val)?))
    }

    pub(crate) fn to_int8(&mut self, val: &JsValue) -> JsResult<i8> {
        Ok(number_ops::to_int8(self.to_number(val)?))
    }

    pub(crate) fn to_uint8(&mut self, val: &JsValue) -> JsResult<u8> {
        Ok(number_ops::to_uint8(self.to_number(val)?))
    }

    pub(crate) fn to_uint8_clamp(&mut self, val: &JsValue) -> JsResult<u8> {
        Ok(number_ops::to_uint8_clamp(self.to_number(val)?))
    }

    // §7.1.5 ToIntegerOrInfinity
    pub(crate) fn to_integer_or_infinity(&mut self, val: &JsValue) -> JsResult<f64> {
        Ok(number_ops::to_integer_or_infinity(self.to_number(val)?))
    }

    // §7.1.20 ToLength
    pub(crate) fn to_length(&mut self, val: &JsValue) -> JsResult<u64> {
        let len = self.to_integer_or_infinity(val)?;
        if len <= 0.0 {
            return Ok(0);
        }
        Ok(len.min(2f64.powi(53) - 1.0) as u64)
    }

    // §7.1.17 ToString
    pub(crate) fn to_string_value(&mut self, val: &JsValue) -> JsResult<JsString> {
        match val {
            JsValue::Empty | JsValue::List(_) => {
                Err(self.throw_type_error("cannot convert an internal value to a string"))
            }
            JsValue::Undefined => Ok(JsString::from_str("undefined")),
            JsValue::Null => Ok(JsString::from_str("null")),
            JsValue::Boolean(b) => Ok(JsString::from_str(if *b { "true" } else { "false" })),
            JsValue::Number(n) => Ok(JsString::from_str(&number_ops::to_string(*n))),
            JsValue::String(s) => Ok(s.clone()),
            JsValue::Symbol(_) => Err(self.throw_type_error("cannot convert a Symbol to a string")),
            JsValue::Object(_) => {
                let prim = self.to_primitive(val, PrimitiveHint::String)?;
                self.to_string_value(&prim)
            }
        }
    }

    // §7.1.18 ToObject
    pub(crate) fn to_object(&mut self, val: &JsValue) -> JsResult<JsValue> {
        match val {
            JsValue::Empty | JsValue::List(_) => {
                Err(self.throw_type_error("cannot convert an internal value to an object"))
            }
            JsValue::Undefined | JsValue::Null => {
                Err(self.throw_type_error(&format!("cannot convert {val} to an object")))
            }
            JsValue::String(s) => {
                let obj = self.create_string_object(s.clone());
                Ok(self.object_value(&obj))
            }
            JsValue::Boolean(_) | JsValue::Number(_) | JsValue::Symbol(_) => {
                // Boxed primitives other than String carry their value only
                // for diagnostics; no Number/Boolean prototype surface is in
                // scope for this machine.
                let proto = self.intrinsic(Intrinsic::ObjectPrototype);
                let obj = self.create_object(Some(proto), ObjectKind::Ordinary);
                Ok(self.object_value(&obj))
            }
            JsValue::Object(_) => Ok(val.clone()),
        }
    }

    // §7.1.19 ToPropertyKey
    pub(crate) fn to_property_key(&mut self, val: &JsValue) -> JsResult<PropertyKey> {
        let key = self.to_primitive(val, PrimitiveHint::String)?;
        match key {
            JsValue::Symbol(s) => Ok(PropertyKey::Symbol(s)),
            other => Ok(PropertyKey::String(self.to_string_value(&other)?)),
        }
    }

    // §7.2.3 IsCallable
    pub(crate) fn is_callable(&self, val: &JsValue) -> bool {
        if let JsValue::Object(o) = val
            && let Some(obj) = self.get_object(o.id)
        {
            return obj.borrow().callable.is_some();
        }
        false
    }

    // §7.2.4 IsConstructor
    pub(crate) fn is_constructor(&self, val: &JsValue) -> bool {
        if let JsValue::Object(o) = val
            && let Some(obj) = self.get_object(o.id)
        {
            return match &obj.borrow().callable {
                Some(JsFunction::Ecma(slots)) => {
                    slots.this_mode != ThisMode::Lexical
                        && obj.borrow().has_own(&PropertyKey::from_str("prototype"))
                }
                Some(JsFunction::Builtin { construct, .. }) => *construct,
                None => false,
            };
        }
        false
    }

    // §7.2.13 IsLessThan — `None` is the spec's *undefined* (NaN involved).
    pub(crate) fn is_less_than(
        &mut self,
        x: &JsValue,
        y: &JsValue,
        left_first: bool,
    ) -> JsResult<Option<bool>> {
        let (px, py) = if left_first {
            let px = self.to_primitive(x, PrimitiveHint::Number)?;
            let py = self.to_primitive(y, PrimitiveHint::Number)?;
            (px, py)
        } else {
            let py = self.to_primitive(y, PrimitiveHint::Number)?;
            let px = self.to_primitive(x, PrimitiveHint::Number)?;
            (px, py)
        };
        if let (JsValue::String(a), JsValue::String(b)) = (&px, &py) {
            return Ok(Some(a.code_units < b.code_units));
        }
        let nx = self.to_number(&px)?;
        let ny = self.to_number(&py)?;
        if nx.is_nan() || ny.is_nan() {
            return Ok(None);
        }
        Ok(Some(nx < ny))
    }

    // §7.2.14 IsLooselyEqual — layered on strict equality and ToPrimitive.
    pub(crate) fn abstract_equality(&mut self, x: &JsValue, y: &JsValue) -> JsResult<bool> {
        match (x, y) {
            (JsValue::Undefined | JsValue::Null, JsValue::Undefined | JsValue::Null) => Ok(true),
            (JsValue::Number(_), JsValue::String(s)) => {
                let n = JsValue::Number(string_to_number(s));
                self.abstract_equality(x, &n)
            }
            (JsValue::String(s), JsValue::Number(_)) => {
                let n = JsValue::Number(string_to_number(s));
                self.abstract_equality(&n, y)
            }
            (JsValue::Boolean(b), _) => {
                let n = JsValue::Number(*b as u8 as f64);
                self.abstract_equality(&n, y)
            }
            (_, JsValue::Boolean(b)) => {
                let n = JsValue::Number(*b as u8 as f64);
                self.abstract_equality(x, &n)
            }
            (JsValue::Number(_) | JsValue::String(_) | JsValue::Symbol(_), JsValue::Object(_)) => {
                let prim = self.to_primitive(y, PrimitiveHint::Default)?;
                self.abstract_equality(x, &prim)
            }
            (JsValue::Object(_), JsValue::Number(_) | JsValue::String(_) | JsValue::Symbol(_)) => {
                let prim = self.to_primitive(x, PrimitiveHint::Default)?;
                self.abstract_equality(&prim, y)
            }
            _ => Ok(strict_equality(x, y)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;

    fn machine() -> Interpreter {
        let mut interp = Interpreter::new();
        let realm = interp.create_realm();
        let ctx = interp.new_context(None, realm, None, None, None);
        interp.push_context(ctx);
        interp
    }

    #[test]
    fn to_boolean_table() {
        assert!(!to_boolean(&JsValue::Undefined));
        assert!(!to_boolean(&JsValue::Null));
        assert!(!to_boolean(&JsValue::Number(0.0)));
        assert!(!to_boolean(&JsValue::Number(f64::NAN)));
        assert!(!to_boolean(&JsValue::string("")));
        assert!(to_boolean(&JsValue::Number(-1.0)));
        assert!(to_boolean(&JsValue::string("x")));
    }

    #[test]
    fn string_to_number_forms() {
        assert_eq!(string_to_number(&JsString::from_str("  42 ")), 42.0);
        assert_eq!(string_to_number(&JsString::from_str("")), 0.0);
        assert_eq!(string_to_number(&JsString::from_str("0x10")), 16.0);
        assert_eq!(string_to_number(&JsString::from_str("0b101")), 5.0);
        assert_eq!(string_to_number(&JsString::from_str("-0.5")), -0.5);
        assert!(string_to_number(&JsString::from_str("1x")).is_nan());
        assert_eq!(
            string_to_number(&JsString::from_str("-Infinity")),
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn empty_cannot_convert() {
        let mut interp = machine();
        assert!(interp.to_number(&JsValue::Empty).is_err());
        assert!(interp.to_string_value(&JsValue::Empty).is_err());
        assert!(interp.to_object(&JsValue::Empty).is_err());
        assert!(interp.to_object(&JsValue::Undefined).is_err());
        assert!(interp.to_object(&JsValue::Null).is_err());
    }

    #[test]
    fn symbol_conversions_throw() {
        let mut interp = machine();
        let sym = interp.create_symbol(None);
        let v = JsValue::Symbol(sym);
        assert!(interp.to_number(&v).is_err());
        assert!(interp.to_string_value(&v).is_err());
        // but a symbol is a valid property key as-is
        assert!(matches!(
            interp.to_property_key(&v),
            Ok(PropertyKey::Symbol(_))
        ));
    }

    #[test]
    fn round_trip_canonical_numeric_strings() {
        let mut interp = machine();
        for canonical in ["42", "-0.5", "1e21", "0.1", "123456789"] {
            let n = interp.to_number(&JsValue::string(canonical)).unwrap();
            let s = interp.to_string_value(&JsValue::Number(n)).unwrap();
            assert_eq!(s.to_rust_string(), canonical, "round trip of {canonical}");
        }
    }

    #[test]
    fn loose_equality_layers() {
        let mut interp = machine();
        assert!(interp
            .abstract_equality(&JsValue::Null, &JsValue::Undefined)
            .unwrap());
        assert!(interp
            .abstract_equality(&JsValue::Number(1.0), &JsValue::string("1"))
            .unwrap());
        assert!(interp
            .abstract_equality(&JsValue::Boolean(true), &JsValue::Number(1.0))
            .unwrap());
        assert!(!interp
            .abstract_equality(&JsValue::Number(f64::NAN), &JsValue::Number(f64::NAN))
            .unwrap());
        // SameValue is a different relation: NaN equals NaN there.
        assert!(same_value(
            &JsValue::Number(f64::NAN),
            &JsValue::Number(f64::NAN)
        ));
        assert!(!same_value(&JsValue::Number(0.0), &JsValue::Number(-0.0)));
        assert!(same_value_zero(&JsValue::Number(0.0), &JsValue::Number(-0.0)));
    }

    #[test]
    fn narrow_truncations_coerce_first() {
        let mut interp = machine();
        let v = JsValue::string(" 65537 ");
        assert_eq!(interp.to_uint16(&v).unwrap(), 1);
        assert_eq!(interp.to_int16(&v).unwrap(), 1);
        assert_eq!(interp.to_uint8(&JsValue::string("257")).unwrap(), 1);
        assert_eq!(interp.to_int8(&JsValue::string("-1")).unwrap(), -1);
        assert_eq!(interp.to_uint8_clamp(&JsValue::Boolean(true)).unwrap(), 1);
        assert_eq!(interp.to_int32(&JsValue::Null).unwrap(), 0);
        assert_eq!(interp.to_uint32(&JsValue::Number(-1.0)).unwrap(), u32::MAX);
        assert_eq!(
            interp.to_integer_or_infinity(&JsValue::string("3.9")).unwrap(),
            3.0
        );
    }

    #[test]
    fn to_length_clamps() {
        let mut interp = machine();
        assert_eq!(interp.to_length(&JsValue::Number(-5.0)).unwrap(), 0);
        assert_eq!(interp.to_length(&JsValue::Number(3.9)).unwrap(), 3);
        assert_eq!(
            interp.to_length(&JsValue::Number(f64::INFINITY)).unwrap(),
            2u64.pow(53) - 1
        );
    }
}
