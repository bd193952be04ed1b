use std::fmt;
use std::rc::Rc;

/// A language value per spec §6.1, plus the two machine-internal variants
/// (`Empty` and `List`) that spec algorithms pass around but that never
/// escape to evaluated code.
#[derive(Clone, Debug, PartialEq)]
pub enum JsValue {
    /// The absence of a completion value (spec "empty").
    Empty,
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    Symbol(JsSymbol),
    Object(JsObject),
    /// Internal List — argument lists and similar ordered sequences.
    List(Rc<Vec<JsValue>>),
}

impl Default for JsValue {
    fn default() -> Self {
        JsValue::Undefined
    }
}

/// Handle to an object record in the machine's heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JsObject {
    pub id: u64,
}

// UTF-16 code unit string per spec §6.1.4
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct JsString {
    pub code_units: Vec<u16>,
}

impl JsString {
    pub fn from_str(s: &str) -> Self {
        Self {
            code_units: s.encode_utf16().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.code_units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.code_units.len()
    }

    pub fn to_rust_string(&self) -> String {
        String::from_utf16_lossy(&self.code_units)
    }

    pub fn concat(&self, other: &JsString) -> JsString {
        let mut code_units = self.code_units.clone();
        code_units.extend_from_slice(&other.code_units);
        JsString { code_units }
    }

    /// One code unit at `index`, as a single-unit string.
    pub fn code_unit_at(&self, index: usize) -> Option<JsString> {
        self.code_units.get(index).map(|&u| JsString {
            code_units: vec![u],
        })
    }

    pub fn slice_utf16(&self, start: usize, end: usize) -> JsString {
        let s = start.min(self.code_units.len());
        let e = end.min(self.code_units.len());
        if s >= e {
            return JsString { code_units: vec![] };
        }
        JsString {
            code_units: self.code_units[s..e].to_vec(),
        }
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rust_string())
    }
}

#[derive(Clone, Debug)]
pub struct JsSymbol {
    pub id: u64,
    pub description: Option<JsString>,
}

impl PartialEq for JsSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for JsSymbol {}

impl std::hash::Hash for JsSymbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// Well-known symbols (§6.1.5.1), one instance each per machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WellKnownSymbol {
    AsyncIterator,
    HasInstance,
    Iterator,
    ToPrimitive,
    ToStringTag,
}

impl WellKnownSymbol {
    pub fn description(self) -> &'static str {
        match self {
            WellKnownSymbol::AsyncIterator => "Symbol.asyncIterator",
            WellKnownSymbol::HasInstance => "Symbol.hasInstance",
            WellKnownSymbol::Iterator => "Symbol.iterator",
            WellKnownSymbol::ToPrimitive => "Symbol.toPrimitive",
            WellKnownSymbol::ToStringTag => "Symbol.toStringTag",
        }
    }
}

impl JsValue {
    pub fn is_undefined(&self) -> bool {
        matches!(self, JsValue::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, JsValue::Null)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JsValue::Object(_))
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, JsValue::Undefined | JsValue::Null)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, JsValue::Empty)
    }

    pub fn string(s: &str) -> JsValue {
        JsValue::String(JsString::from_str(s))
    }

    /// The spec's Type(x) name, for diagnostics and TypeError messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            JsValue::Empty => "empty",
            JsValue::Undefined => "undefined",
            JsValue::Null => "null",
            JsValue::Boolean(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::String(_) => "string",
            JsValue::Symbol(_) => "symbol",
            JsValue::Object(_) => "object",
            JsValue::List(_) => "list",
        }
    }
}

// §6.1.6.1 Number type operations
pub mod number_ops {
    pub fn to_string(x: f64) -> String {
        if x.is_nan() {
            return "NaN".to_string();
        }
        if x == 0.0 {
            return "0".to_string();
        }
        if x.is_infinite() {
            return if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
        }
        // Use ryu for spec-compliant shortest representation
        let mut buf = ryu_js::Buffer::new();
        buf.format(x).to_string()
    }

    pub fn equal(x: f64, y: f64) -> bool {
        if x.is_nan() || y.is_nan() {
            return false;
        }
        x == y
    }

    pub fn same_value(x: f64, y: f64) -> bool {
        if x.is_nan() && y.is_nan() {
            return true;
        }
        if x == 0.0 && y == 0.0 {
            return x.is_sign_positive() == y.is_sign_positive();
        }
        x == y
    }

    pub fn same_value_zero(x: f64, y: f64) -> bool {
        if x.is_nan() && y.is_nan() {
            return true;
        }
        x == y
    }

    // §7.1.7 ToUint32 — true modulo-2^32 truncation; `rem_euclid` keeps the
    // result exact for any finite double, including those outside i64 range.
    pub fn to_uint32(x: f64) -> u32 {
        if !x.is_finite() || x == 0.0 {
            return 0;
        }
        x.trunc().rem_euclid(4_294_967_296.0) as u32
    }

    // §7.1.6 ToInt32
    pub fn to_int32(x: f64) -> i32 {
        to_uint32(x) as i32
    }

    // §7.1.9 ToUint16
    pub fn to_uint16(x: f64) -> u16 {
        (to_uint32(x) & 0xFFFF) as u16
    }

    // §7.1.8 ToInt16
    pub fn to_int16(x: f64) -> i16 {
        to_uint16(x) as i16
    }

    // §7.1.11 ToUint8
    pub fn to_uint8(x: f64) -> u8 {
        (to_uint32(x) & 0xFF) as u8
    }

    // §7.1.10 ToInt8
    pub fn to_int8(x: f64) -> i8 {
        to_uint8(x) as i8
    }

    // §7.1.12 ToUint8Clamp — round half to even at the .5 boundary.
    pub fn to_uint8_clamp(x: f64) -> u8 {
        if x.is_nan() || x <= 0.0 {
            return 0;
        }
        if x >= 255.0 {
            return 255;
        }
        let f = x.floor();
        if f + 0.5 < x {
            (f as u8) + 1
        } else if x < f + 0.5 {
            f as u8
        } else if (f as u64) % 2 == 0 {
            f as u8
        } else {
            (f as u8) + 1
        }
    }

    // Truncation used by §7.1.5 ToIntegerOrInfinity
    pub fn to_integer_or_infinity(n: f64) -> f64 {
        if n.is_nan() || n == 0.0 {
            0.0
        } else if n.is_infinite() {
            n
        } else {
            n.trunc()
        }
    }
}

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Empty => write!(f, "<empty>"),
            JsValue::Undefined => write!(f, "undefined"),
            JsValue::Null => write!(f, "null"),
            JsValue::Boolean(b) => write!(f, "{b}"),
            JsValue::Number(n) => write!(f, "{}", number_ops::to_string(*n)),
            JsValue::String(s) => write!(f, "{s}"),
            JsValue::Symbol(s) => {
                if let Some(desc) = &s.description {
                    write!(f, "Symbol({desc})")
                } else {
                    write!(f, "Symbol()")
                }
            }
            JsValue::Object(_) => write!(f, "[object Object]"),
            JsValue::List(items) => write!(f, "<list[{}]>", items.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_special_values() {
        assert_eq!(number_ops::to_string(f64::NAN), "NaN");
        assert_eq!(number_ops::to_string(0.0), "0");
        assert_eq!(number_ops::to_string(-0.0), "0");
        assert_eq!(number_ops::to_string(f64::INFINITY), "Infinity");
        assert_eq!(number_ops::to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(number_ops::to_string(42.0), "42");
        assert_eq!(number_ops::to_string(-0.5), "-0.5");
    }

    #[test]
    fn number_same_value() {
        assert!(number_ops::same_value(f64::NAN, f64::NAN));
        assert!(!number_ops::same_value(0.0, -0.0));
        assert!(number_ops::same_value(0.0, 0.0));
        assert!(number_ops::same_value_zero(0.0, -0.0));
    }

    #[test]
    fn to_int32_basics() {
        assert_eq!(number_ops::to_int32(f64::NAN), 0);
        assert_eq!(number_ops::to_int32(f64::INFINITY), 0);
        assert_eq!(number_ops::to_int32(0.0), 0);
        assert_eq!(number_ops::to_int32(42.9), 42);
        assert_eq!(number_ops::to_int32(-42.9), -42);
        assert_eq!(number_ops::to_int32(-1.0), -1);
        assert_eq!(number_ops::to_int32(2_147_483_648.0), -2_147_483_648);
    }

    #[test]
    fn to_int32_periodic_mod_2_pow_32() {
        let period = 4_294_967_296.0_f64;
        for x in [0.0, 1.0, -7.5, 123_456.0, 2_147_483_647.0] {
            assert_eq!(
                number_ops::to_int32(x),
                number_ops::to_int32(x + period),
                "period failed at {x}"
            );
            assert_eq!(
                number_ops::to_int32(x),
                number_ops::to_int32(x + 3.0 * period)
            );
        }
        // Far outside i64 range the modulo must still be exact.
        assert_eq!(number_ops::to_uint32(period * period), 0);
    }

    #[test]
    fn narrow_truncations() {
        assert_eq!(number_ops::to_uint16(65_536.0), 0);
        assert_eq!(number_ops::to_int16(32_768.0), -32_768);
        assert_eq!(number_ops::to_uint8(256.0), 0);
        assert_eq!(number_ops::to_int8(128.0), -128);
    }

    #[test]
    fn uint8_clamp_rounds_half_to_even() {
        assert_eq!(number_ops::to_uint8_clamp(f64::NAN), 0);
        assert_eq!(number_ops::to_uint8_clamp(-3.0), 0);
        assert_eq!(number_ops::to_uint8_clamp(300.0), 255);
        assert_eq!(number_ops::to_uint8_clamp(2.5), 2);
        assert_eq!(number_ops::to_uint8_clamp(3.5), 4);
        assert_eq!(number_ops::to_uint8_clamp(2.6), 3);
    }

    #[test]
    fn string_code_units() {
        let s = JsString::from_str("ab");
        assert_eq!(s.len(), 2);
        assert_eq!(s.code_unit_at(0), Some(JsString::from_str("a")));
        assert_eq!(s.code_unit_at(2), None);
        assert_eq!(s.concat(&JsString::from_str("cd")).to_rust_string(), "abcd");
        assert_eq!(s.slice_utf16(1, 2).to_rust_string(), "b");
        assert_eq!(s.slice_utf16(1, 9).to_rust_string(), "b");
        assert!(s.slice_utf16(2, 1).is_empty());
    }

    #[test]
    fn display_values() {
        assert_eq!(format!("{}", JsValue::Undefined), "undefined");
        assert_eq!(format!("{}", JsValue::Null), "null");
        assert_eq!(format!("{}", JsValue::Boolean(true)), "true");
        assert_eq!(format!("{}", JsValue::Number(42.0)), "42");
        assert_eq!(format!("{}", JsValue::string("hi")), "hi");
    }
}
