use crate::ast::{FormalParameters, FunctionKind, SourceInfo, Statement};
use crate::error::EngineError;
use crate::types::{JsString, JsSymbol, JsValue};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

use super::Interpreter;
use super::realm::RealmId;

/// A completion record (§6.2.4). Abrupt completions are data and must
/// propagate unchanged until one of the three sanctioned boundaries handles
/// them (function-call return folding, iterator close, job rejection).
#[derive(Clone, Debug)]
pub enum Completion {
    Normal(JsValue),
    Break(Option<String>),
    Continue(Option<String>),
    Return(JsValue),
    Throw(JsValue),
}

impl Completion {
    pub fn is_abrupt(&self) -> bool {
        !matches!(self, Completion::Normal(_))
    }

    /// §6.2.4.3 UpdateEmpty — replace an empty completion value with `old`.
    pub fn update_empty(self, old: JsValue) -> Completion {
        match self {
            Completion::Normal(JsValue::Empty) => Completion::Normal(old),
            Completion::Break(t) => Completion::Break(t),
            Completion::Continue(t) => Completion::Continue(t),
            other => other,
        }
    }

    /// Bridge a value-or-throw operation into statement-level completion
    /// handling; engine faults stay on the `Err` channel.
    pub fn from_value_result(r: JsResult<JsValue>) -> EvalResult {
        match r {
            Ok(v) => Ok(Completion::Normal(v)),
            Err(EvalError::Thrown(v)) => Ok(Completion::Throw(v)),
            Err(EvalError::Engine(e)) => Err(e),
        }
    }
}

/// Error channel of abstract operations that per the spec return "a value or
/// a throw completion": the thrown language value travels as data, while
/// host faults (unsupported clause, budget) abort typed.
#[derive(Clone, Debug)]
pub enum EvalError {
    Thrown(JsValue),
    Engine(EngineError),
}

impl From<EngineError> for EvalError {
    fn from(e: EngineError) -> Self {
        EvalError::Engine(e)
    }
}

pub type JsResult<T> = Result<T, EvalError>;

/// Result of evaluating a statement-shaped node.
pub type EvalResult = Result<Completion, EngineError>;

///// A property key: string or symbol (§6.1.7).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    String(JsString),
    Symbol(JsSymbol),
}

impl PropertyKey {
    pub fn from_str(s: &str) -> Self {
        PropertyKey::String(JsString::from_str(s))
    }

    pub fn from_index(i: u32) -> Self {
        PropertyKey::from_str(&i.to_string())
    }

    /// An array index is a canonical numeric string in [0, 2^32-1).
    pub fn as_array_index(&self) -> Option<u32> {
        let PropertyKey::String(s) = self else {
            return None;
        };
        let text = s.to_rust_string();
        if text.is_empty() || (text.len() > 1 && text.starts_with('0')) {
            return None;
        }
        if !text.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        match text.parse::<u32>() {
            Ok(n) if n < u32::MAX => Some(n),
            _ => None,
        }
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, PropertyKey::Symbol(_))
    }
}

impl std::fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{s}"),
            PropertyKey::Symbol(s) => match &s.description {
                Some(d) => write!(f, "Symbol({d})"),
                None => write!(f, "Symbol()"),
            },
        }
    }
}

/// §6.2.6 Property Descriptor — each field independently present or absent.
#[derive(Clone, Debug, Default)]
pub struct PropertyDescriptor {
    pub value: Option<JsValue>,
    pub writable: Option<bool>,
    pub get: Option<JsValue>,
    pub set: Option<JsValue>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    pub fn data(value: JsValue, writable: bool, enumerable: bool, configurable: bool) -> Self {
        Self {
            value: Some(value),
            writable: Some(writable),
            get: None,
            set: None,
            enumerable: Some(enumerable),
            configurable: Some(configurable),
        }
    }

    pub fn data_default(value: JsValue) -> Self {
        Self::data(value, true, true, true)
    }

    pub fn accessor(
        get: Option<JsValue>,
        set: Option<JsValue>,
        enumerable: bool,
        configurable: bool,
    ) -> Self {
        Self {
            value: None,
            writable: None,
            get,
            set,
            enumerable: Some(enumerable),
            configurable: Some(configurable),
        }
    }

    // §6.2.6.2 IsDataDescriptor
    pub fn is_data_descriptor(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    // §6.2.6.1 IsAccessorDescriptor
    pub fn is_accessor_descriptor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    // §6.2.6.3 IsGenericDescriptor
    pub fn is_generic_descriptor(&self) -> bool {
        !self.is_data_descriptor() && !self.is_accessor_descriptor()
    }

    /// §6.2.6.6 CompletePropertyDescriptor — fill absent fields with defaults.
    pub fn complete(mut self) -> Self {
        if self.is_generic_descriptor() || self.is_data_descriptor() {
            self.value.get_or_insert(JsValue::Undefined);
            self.writable.get_or_insert(false);
        } else {
            self.get.get_or_insert(JsValue::Undefined);
            self.set.get_or_insert(JsValue::Undefined);
        }
        self.enumerable.get_or_insert(false);
        self.configurable.get_or_insert(false);
        self
    }
}

pub type EnvRef = Rc<RefCell<Environment>>;

/// An environment record. Function environments additionally carry the
/// `this` binding and `new.target`; `this` resolution walks the parent
/// chain until it finds an environment that has one (arrow functions never
/// do — lexical this).
#[derive(Debug)]
pub struct Environment {
    pub(crate) bindings: FxHashMap<String, Binding>,
    pub(crate) parent: Option<EnvRef>,
    pub(crate) this_value: Option<JsValue>,
    pub(crate) new_target: Option<JsValue>,
}

#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub(crate) value: JsValue,
    pub(crate) kind: BindingKind,
    pub(crate) initialized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindingKind {
    Var,
    Let,
    Const,
}

/// Why a binding write was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingError {
    Immutable,
    Uninitialized,
}

impl Environment {
    pub fn new(parent: Option<EnvRef>) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            bindings: FxHashMap::default(),
            parent,
            this_value: None,
            new_target: None,
        }))
    }

    pub(crate) fn declare(&mut self, name: &str, kind: BindingKind) {
        self.bindings.insert(
            name.to_string(),
            Binding {
                value: JsValue::Undefined,
                kind,
                initialized: kind == BindingKind::Var,
            },
        );
    }

    pub(crate) fn declare_initialized(&mut self, name: &str, kind: BindingKind, value: JsValue) {
        self.bindings.insert(
            name.to_string(),
            Binding {
                value,
                kind,
                initialized: true,
            },
        );
    }

    pub(crate) fn has_local(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Write through the scope chain. Unresolved names land as an implicit
    /// global var (sloppy mode) on the outermost record.
    pub fn set(&mut self, name: &str, value: JsValue) -> Result<(), BindingError> {
        if let Some(binding) = self.bindings.get_mut(name) {
            if binding.kind == BindingKind::Const && binding.initialized {
                return Err(BindingError::Immutable);
            }
            binding.value = value;
            binding.initialized = true;
            Ok(())
        } else if let Some(parent) = &self.parent {
            parent.borrow_mut().set(name, value)
        } else {
            self.bindings.insert(
                name.to_string(),
                Binding {
                    value,
                    kind: BindingKind::Var,
                    initialized: true,
                },
            );
            Ok(())
        }
    }

    /// Read through the scope chain; `Err(Uninitialized)` is the TDZ.
    pub fn get(&self, name: &str) -> Option<Result<JsValue, BindingError>> {
        if let Some(binding) = self.bindings.get(name) {
            if !binding.initialized {
                return Some(Err(BindingError::Uninitialized));
            }
            Some(Ok(binding.value.clone()))
        } else if let Some(parent) = &self.parent {
            parent.borrow().get(name)
        } else {
            None
        }
    }

    pub fn has(&self, name: &str) -> bool {
        if self.bindings.contains_key(name) {
            true
        } else if let Some(parent) = &self.parent {
            parent.borrow().has(name)
        } else {
            false
        }
    }

    /// GetThisEnvironment (§9.4.3) flattened into a value lookup.
    pub fn get_this(&self) -> Option<JsValue> {
        if let Some(this) = &self.this_value {
            Some(this.clone())
        } else if let Some(parent) = &self.parent {
            parent.borrow().get_this()
        } else {
            None
        }
    }

    pub fn get_new_target(&self) -> Option<JsValue> {
        if self.this_value.is_some() {
            self.new_target.clone()
        } else if let Some(parent) = &self.parent {
            parent.borrow().get_new_target()
        } else {
            None
        }
    }
}

pub type ObjRef = Rc<RefCell<JsObjectData>>;

/// [[ThisMode]] of an ECMAScript function (§10.2).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThisMode {
    Lexical,
    Strict,
    Global,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstructorKind {
    Base,
    Derived,
}

/// Native steps of a built-in function: `(machine, this, arguments, newTarget)`.
pub type NativeSteps = Rc<dyn Fn(&mut Interpreter, &JsValue, &[JsValue], Option<&JsValue>) -> JsResult<JsValue>>;

/// Internal slots of an ECMAScript (user-defined) function object.
pub struct EcmaFunctionSlots {
    pub environment: EnvRef,
    pub formal_parameters: FormalParameters,
    pub ecmascript_code: Rc<Vec<Statement>>,
    pub this_mode: ThisMode,
    pub strict: bool,
    pub kind: FunctionKind,
    pub constructor_kind: ConstructorKind,
    pub is_class_constructor: bool,
    pub realm: RealmId,
    pub script_or_module: Option<super::context::ScriptOrModule>,
    pub home_name: Option<String>,
    pub source: SourceInfo,
}

pub enum JsFunction {
    Ecma(Rc<EcmaFunctionSlots>),
    Builtin {
        name: String,
        steps: NativeSteps,
        construct: bool,
    },
}

impl Clone for JsFunction {
    fn clone(&self) -> Self {
        match self {
            JsFunction::Ecma(slots) => JsFunction::Ecma(slots.clone()),
            JsFunction::Builtin {
                name,
                steps,
                construct,
            } => JsFunction::Builtin {
                name: name.clone(),
                steps: steps.clone(),
                construct: *construct,
            },
        }
    }
}

impl std::fmt::Debug for JsFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsFunction::Ecma(slots) => write!(f, "JsFunction::Ecma({:?})", slots.home_name),
            JsFunction::Builtin { name, .. } => write!(f, "JsFunction::Builtin({name:?})"),
        }
    }
}

/// The [[ParameterMap]] of an arguments exotic object: index → live binding.
#[derive(Debug, Default)]
pub struct ParameterMap {
    pub(crate) entries: FxHashMap<u32, (EnvRef, String)>,
}

impl ParameterMap {
    pub(crate) fn contains(&self, key: &PropertyKey) -> bool {
        key.as_array_index()
            .is_some_and(|i| self.entries.contains_key(&i))
    }

    pub(crate) fn get(&self, key: &PropertyKey) -> Option<JsValue> {
        let i = key.as_array_index()?;
        let (env, name) = self.entries.get(&i)?;
        match env.borrow().get(name) {
            Some(Ok(v)) => Some(v),
            _ => Some(JsValue::Undefined),
        }
    }

    pub(crate) fn set(&self, key: &PropertyKey, value: JsValue) {
        if let Some(i) = key.as_array_index()
            && let Some((env, name)) = self.entries.get(&i)
        {
            let _ = env.borrow_mut().set(name, value);
        }
    }

    pub(crate) fn remove(&mut self, key: &PropertyKey) {
        if let Some(i) = key.as_array_index() {
            self.entries.remove(&i);
        }
    }
}

/// §27.2 promise state, scoped to reaction scheduling.
#[derive(Debug, Default)]
pub struct PromiseData {
    pub state: PromiseState,
    pub result: JsValue,
    pub fulfill_reactions: Vec<PromiseReaction>,
    pub reject_reactions: Vec<PromiseReaction>,
    pub already_resolved: bool,
}

impl Default for PromiseState {
    fn default() -> Self {
        PromiseState::Pending
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromiseState {
    Pending,
    Fulfilled,
    Rejected,
}

#[derive(Clone, Debug)]
pub struct PromiseReaction {
    pub capability: Option<PromiseCapability>,
    pub kind: ReactionKind,
    pub handler: Option<JsValue>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReactionKind {
    Fulfill,
    Reject,
}

#[derive(Clone, Debug)]
pub struct PromiseCapability {
    pub promise: JsValue,
    pub resolve: JsValue,
    pub reject: JsValue,
}

/// §7.4.1 Iterator Record.
#[derive(Clone, Debug)]
pub struct IteratorRecord {
    pub iterator: JsValue,
    pub next_method: JsValue,
    pub done: bool,
}

/// Exotic behavior tag. The nine essential internal methods dispatch on
/// this; `Ordinary` delegates everything to the ordinary algorithms.
#[derive(Debug)]
pub enum ObjectKind {
    Ordinary,
    Array,
    StringExotic { data: JsString },
    Arguments { map: ParameterMap },
    Function,
    Error,
    Promise(Box<PromiseData>),
    ArrayIterator { target: u64, index: u32, done: bool },
    ListIterator { items: Vec<JsValue>, index: usize },
    AsyncFromSyncIterator { sync: IteratorRecord },
}

impl ObjectKind {
    pub fn class_name(&self) -> &'static str {
        match self {
            ObjectKind::Ordinary => "Object",
            ObjectKind::Array => "Array",
            ObjectKind::StringExotic { .. } => "String",
            ObjectKind::Arguments { .. } => "Arguments",
            ObjectKind::Function => "Function",
            ObjectKind::Error => "Error",
            ObjectKind::Promise(_) => "Promise",
            ObjectKind::ArrayIterator { .. } => "Array Iterator",
            ObjectKind::ListIterator { .. } => "List Iterator",
            ObjectKind::AsyncFromSyncIterator { .. } => "Async-from-Sync Iterator",
        }
    }
}

/// An object record: ordered own properties, prototype back reference,
/// extensibility, exotic tag, and (for functions) the callable slots.
pub struct JsObjectData {
    pub id: Option<u64>,
    pub kind: ObjectKind,
    pub properties: FxHashMap<PropertyKey, PropertyDescriptor>,
    pub property_order: Vec<PropertyKey>,
    pub prototype: Option<ObjRef>,
    pub extensible: bool,
    pub callable: Option<JsFunction>,
}

impl JsObjectData {
    pub(crate) fn new(kind: ObjectKind) -> Self {
        Self {
            id: None,
            kind,
            properties: FxHashMap::default(),
            property_order: Vec::new(),
            prototype: None,
            extensible: true,
            callable: None,
        }
    }

    pub fn get_own(&self, key: &PropertyKey) -> Option<&PropertyDescriptor> {
        self.properties.get(key)
    }

    pub fn has_own(&self, key: &PropertyKey) -> bool {
        self.properties.contains_key(key)
    }

    /// Install or replace a descriptor, preserving first-insertion order.
    pub fn insert_property(&mut self, key: PropertyKey, desc: PropertyDescriptor) {
        if !self.properties.contains_key(&key) {
            self.property_order.push(key.clone());
        }
        self.properties.insert(key, desc);
    }

    pub fn insert_value(&mut self, key: PropertyKey, value: JsValue) {
        self.insert_property(key, PropertyDescriptor::data_default(value));
    }

    /// Built-in method convention: writable, non-enumerable, configurable.
    pub fn insert_builtin(&mut self, key: PropertyKey, value: JsValue) {
        self.insert_property(key, PropertyDescriptor::data(value, true, false, true));
    }

    pub fn remove_property(&mut self, key: &PropertyKey) {
        self.properties.remove(key);
        self.property_order.retain(|k| k != key);
    }

    pub fn get_value(&self, key: &PropertyKey) -> Option<JsValue> {
        self.properties.get(key).and_then(|d| d.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_exclusivity_predicates() {
        let data = PropertyDescriptor::data(JsValue::Number(1.0), true, true, true);
        assert!(data.is_data_descriptor());
        assert!(!data.is_accessor_descriptor());

        let acc = PropertyDescriptor::accessor(Some(JsValue::Undefined), None, false, false);
        assert!(acc.is_accessor_descriptor());
        assert!(!acc.is_data_descriptor());

        let generic = PropertyDescriptor {
            enumerable: Some(true),
            ..Default::default()
        };
        assert!(generic.is_generic_descriptor());
    }

    #[test]
    fn complete_descriptor_defaults() {
        let d = PropertyDescriptor::default().complete();
        assert!(matches!(d.value, Some(JsValue::Undefined)));
        assert_eq!(d.writable, Some(false));
        assert_eq!(d.enumerable, Some(false));
        assert_eq!(d.configurable, Some(false));
    }

    #[test]
    fn array_index_keys() {
        assert_eq!(PropertyKey::from_str("0").as_array_index(), Some(0));
        assert_eq!(PropertyKey::from_str("42").as_array_index(), Some(42));
        assert_eq!(PropertyKey::from_str("01").as_array_index(), None);
        assert_eq!(PropertyKey::from_str("-1").as_array_index(), None);
        assert_eq!(PropertyKey::from_str("length").as_array_index(), None);
        assert_eq!(PropertyKey::from_str("4294967295").as_array_index(), None);
    }

    #[test]
    fn environment_tdz_and_const() {
        let env = Environment::new(None);
        env.borrow_mut().declare("x", BindingKind::Let);
        assert!(matches!(
            env.borrow().get("x"),
            Some(Err(BindingError::Uninitialized))
        ));
        env.borrow_mut().set("x", JsValue::Number(1.0)).unwrap();
        assert!(matches!(env.borrow().get("x"), Some(Ok(JsValue::Number(n))) if n == 1.0));

        env.borrow_mut()
            .declare_initialized("c", BindingKind::Const, JsValue::Number(2.0));
        assert_eq!(
            env.borrow_mut().set("c", JsValue::Number(3.0)),
            Err(BindingError::Immutable)
        );
    }

    #[test]
    fn this_resolution_walks_parents() {
        let outer = Environment::new(None);
        outer.borrow_mut().this_value = Some(JsValue::Number(7.0));
        let inner = Environment::new(Some(outer));
        assert!(matches!(inner.borrow().get_this(), Some(JsValue::Number(n)) if n == 7.0));
    }

    #[test]
    fn update_empty_keeps_abrupt() {
        let c = Completion::Normal(JsValue::Empty).update_empty(JsValue::Number(1.0));
        assert!(matches!(c, Completion::Normal(JsValue::Number(n)) if n == 1.0));
        let t = Completion::Throw(JsValue::Null).update_empty(JsValue::Number(1.0));
        assert!(matches!(t, Completion::Throw(JsValue::Null)));
    }
}
