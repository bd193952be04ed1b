//! Expression evaluation (§13). Every arm reduces to the abstract operations
//! in `ordinary`, `helpers`, and `function`; references are resolved eagerly
//! against the environment record instead of materializing Reference Records.

use super::*;
use crate::ast::{
    AssignOp, BinaryOp, Expression, Literal, LogicalOp, MemberProperty, PropertyDef, PropertyName,
    UnaryOp,
};
use crate::types::JsValue;

// §6.1.6.1.3 Number::exponentiate — `powf` alone disagrees with the
// language on NaN exponents and ±1 bases with infinite exponents.
fn exponentiate(base: f64, exponent: f64) -> f64 {
    if exponent.is_nan() {
        f64::NAN
    } else if exponent == 0.0 {
        1.0
    } else if base.abs() == 1.0 && exponent.is_infinite() {
        f64::NAN
    } else {
        base.powf(exponent)
    }
}

impl Interpreter {
    pub(crate) fn evaluate_expression(
        &mut self,
        expr: &Expression,
        env: &EnvRef,
    ) -> JsResult<JsValue> {
        self.check_budget()?;
        match expr {
            Expression::Literal(lit) => Ok(match lit {
                Literal::Null => JsValue::Null,
                Literal::Boolean(b) => JsValue::Boolean(*b),
                Literal::Number(n) => JsValue::Number(*n),
                Literal::String(s) => JsValue::string(s),
            }),
            Expression::Identifier(name) => self.resolve_identifier(name, env),
            Expression::This => Ok(env
                .borrow()
                .get_this()
                .unwrap_or_else(|| self.realms[self.current_realm_id().0].global_this.clone())),
            Expression::Array(elements) => {
                let values = self.evaluate_expression_list(elements, env)?;
                let array = self.create_array_from(&values)?;
                Ok(self.object_value(&array))
            }
            Expression::Object(defs) => self.evaluate_object_literal(defs, env),
            Expression::Function(f) => Ok(self.instantiate_function_expression(f, env)),
            Expression::Member { object, property } => {
                let base = self.evaluate_expression(object, env)?;
                let key = self.member_key(property, env)?;
                if base.is_nullish() {
                    return Err(self.throw_type_error(&format!(
                        "cannot read properties of {} (reading '{key}')",
                        base.type_name()
                    )));
                }
                self.get_v(&base, &key)
            }
            Expression::Call { callee, args } => {
                // A member callee supplies the receiver (§13.3.6.2).
                let (func, this) = match callee.as_ref() {
                    Expression::Member { object, property } => {
                        let base = self.evaluate_expression(object, env)?;
                        let key = self.member_key(property, env)?;
                        if base.is_nullish() {
                            return Err(self.throw_type_error(&format!(
                                "cannot read properties of {} (reading '{key}')",
                                base.type_name()
                            )));
                        }
                        (self.get_v(&base, &key)?, base)
                    }
                    other => (self.evaluate_expression(other, env)?, JsValue::Undefined),
                };
                let args = self.evaluate_expression_list(args, env)?;
                self.call(&func, &this, &args)
            }
            Expression::New { callee, args } => {
                let func = self.evaluate_expression(callee, env)?;
                let args = self.evaluate_expression_list(args, env)?;
                self.construct(&func, &args, None)
            }
            Expression::Unary { op, argument } => self.evaluate_unary(*op, argument, env),
            Expression::Binary { op, left, right } => {
                let left = self.evaluate_expression(left, env)?;
                let right = self.evaluate_expression(right, env)?;
                self.apply_binary(*op, &left, &right)
            }
            Expression::Logical { op, left, right } => {
                let left = self.evaluate_expression(left, env)?;
                let take_right = match op {
                    LogicalOp::And => to_boolean(&left),
                    LogicalOp::Or => !to_boolean(&left),
                    LogicalOp::Nullish => left.is_nullish(),
                };
                if take_right {
                    self.evaluate_expression(right, env)
                } else {
                    Ok(left)
                }
            }
            Expression::Conditional {
                test,
                consequent,
                alternate,
            } => {
                let test = self.evaluate_expression(test, env)?;
                if to_boolean(&test) {
                    self.evaluate_expression(consequent, env)
                } else {
                    self.evaluate_expression(alternate, env)
                }
            }
            Expression::Assignment { op, target, value } => {
                self.evaluate_assignment(*op, target, value, env)
            }
            Expression::Sequence(exprs) => {
                let mut last = JsValue::Undefined;
                for e in exprs {
                    last = self.evaluate_expression(e, env)?;
                }
                Ok(last)
            }
            Expression::Spread(_) => {
                Err(self.throw_type_error("spread is only valid in call and array positions"))
            }
        }
    }

    fn resolve_identifier(&mut self, name: &str, env: &EnvRef) -> JsResult<JsValue> {
        match env.borrow().get(name) {
            Some(Ok(value)) => Ok(value),
            Some(Err(BindingError::Uninitialized)) => Err(self.throw_reference_error(&format!(
                "cannot access '{name}' before initialization"
            ))),
            Some(Err(BindingError::Immutable)) => unreachable!("reads never report Immutable"),
            None => Err(self.throw_reference_error(&format!("{name} is not defined"))),
        }
    }

    // No ReferenceError intrinsic is carved out; the base Error prototype
    // carries the name.
    fn throw_reference_error(&mut self, message: &str) -> EvalError {
        let err = self.create_error_object(Intrinsic::ErrorPrototype, message);
        EvalError::Thrown(err)
    }

    /// Evaluate an argument or array-element list, expanding spread elements
    /// through the iterator protocol (§13.3.8.1).
    fn evaluate_expression_list(
        &mut self,
        exprs: &[Expression],
        env: &EnvRef,
    ) -> JsResult<Vec<JsValue>> {
        let mut out = Vec::with_capacity(exprs.len());
        for e in exprs {
            if let Expression::Spread(inner) = e {
                let spread = self.evaluate_expression(inner, env)?;
                let mut record = self.get_iterator(&spread, IteratorHint::Sync, None)?;
                while let Some(value) = self.iterator_step(&mut record)? {
                    out.push(value);
                }
            } else {
                out.push(self.evaluate_expression(e, env)?);
            }
        }
        Ok(out)
    }

    fn evaluate_object_literal(
        &mut self,
        defs: &[PropertyDef],
        env: &EnvRef,
    ) -> JsResult<JsValue> {
        let proto = self.intrinsic(Intrinsic::ObjectPrototype);
        let obj = self.create_object(Some(proto), ObjectKind::Ordinary);
        for def in defs {
            match def {
                PropertyDef::KeyValue(name, value) => {
                    let key = self.property_name_key(name, env)?;
                    let value = self.evaluate_expression(value, env)?;
                    self.create_data_property_or_throw(&obj, &key, value)?;
                }
                PropertyDef::Shorthand(name) => {
                    let value = self.resolve_identifier(name, env)?;
                    self.create_data_property_or_throw(&obj, &PropertyKey::from_str(name), value)?;
                }
                PropertyDef::Getter(name, f) => {
                    let key = self.property_name_key(name, env)?;
                    let getter = self.instantiate_function_expression(f, env);
                    // Absent `set` leaves an existing setter in place.
                    let desc = PropertyDescriptor::accessor(Some(getter), None, true, true);
                    self.define_property_or_throw(&obj, &key, &desc)?;
                }
                PropertyDef::Setter(name, f) => {
                    let key = self.property_name_key(name, env)?;
                    let setter = self.instantiate_function_expression(f, env);
                    let desc = PropertyDescriptor {
                        value: None,
                        writable: None,
                        get: None,
                        set: Some(setter),
                        enumerable: Some(true),
                        configurable: Some(true),
                    };
                    self.define_property_or_throw(&obj, &key, &desc)?;
                }
            }
        }
        Ok(self.object_value(&obj))
    }

    fn property_name_key(&mut self, name: &PropertyName, env: &EnvRef) -> JsResult<PropertyKey> {
        match name {
            PropertyName::Static(s) => Ok(PropertyKey::from_str(s)),
            PropertyName::Computed(e) => {
                let value = self.evaluate_expression(e, env)?;
                self.to_property_key(&value)
            }
        }
    }

    fn member_key(&mut self, property: &MemberProperty, env: &EnvRef) -> JsResult<PropertyKey> {
        match property {
            MemberProperty::Static(s) => Ok(PropertyKey::from_str(s)),
            MemberProperty::Computed(e) => {
                let value = self.evaluate_expression(e, env)?;
                self.to_property_key(&value)
            }
        }
    }

    fn evaluate_unary(
        &mut self,
        op: UnaryOp,
        argument: &Expression,
        env: &EnvRef,
    ) -> JsResult<JsValue> {
        match op {
            UnaryOp::TypeOf => {
                // typeof tolerates an unresolvable name (§13.5.3).
                if let Expression::Identifier(name) = argument
                    && !env.borrow().has(name)
                {
                    return Ok(JsValue::string("undefined"));
                }
                let value = self.evaluate_expression(argument, env)?;
                Ok(JsValue::string(self.type_of(&value)))
            }
            UnaryOp::Void => {
                self.evaluate_expression(argument, env)?;
                Ok(JsValue::Undefined)
            }
            UnaryOp::Delete => match argument {
                Expression::Member { object, property } => {
                    let base = self.evaluate_expression(object, env)?;
                    let key = self.member_key(property, env)?;
                    let boxed = self.to_object(&base)?;
                    let obj = self.object_ref(&boxed)?;
                    let deleted = self.object_delete(&obj, &key)?;
                    Ok(JsValue::Boolean(deleted))
                }
                // Bindings are not deletable (§13.5.1.2).
                Expression::Identifier(_) => Ok(JsValue::Boolean(false)),
                other => {
                    self.evaluate_expression(other, env)?;
                    Ok(JsValue::Boolean(true))
                }
            },
            UnaryOp::Minus => {
                let value = self.evaluate_expression(argument, env)?;
                Ok(JsValue::Number(-self.to_number(&value)?))
            }
            UnaryOp::Plus => {
                let value = self.evaluate_expression(argument, env)?;
                Ok(JsValue::Number(self.to_number(&value)?))
            }
            UnaryOp::Not => {
                let value = self.evaluate_expression(argument, env)?;
                Ok(JsValue::Boolean(!to_boolean(&value)))
            }
            UnaryOp::BitNot => {
                let value = self.evaluate_expression(argument, env)?;
                Ok(JsValue::Number(!self.to_int32(&value)? as f64))
            }
        }
    }

    fn type_of(&self, value: &JsValue) -> &'static str {
        match value {
            JsValue::Undefined | JsValue::Empty | JsValue::List(_) => "undefined",
            JsValue::Null => "object",
            JsValue::Boolean(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::String(_) => "string",
            JsValue::Symbol(_) => "symbol",
            JsValue::Object(_) => {
                if self.is_callable(value) {
                    "function"
                } else {
                    "object"
                }
            }
        }
    }

    pub(crate) fn apply_binary(
        &mut self,
        op: BinaryOp,
        left: &JsValue,
        right: &JsValue,
    ) -> JsResult<JsValue> {
        match op {
            BinaryOp::Add => self.binary_add(left, right),
            BinaryOp::Sub => self.numeric_binary(left, right, |a, b| a - b),
            BinaryOp::Mul => self.numeric_binary(left, right, |a, b| a * b),
            BinaryOp::Div => self.numeric_binary(left, right, |a, b| a / b),
            BinaryOp::Mod => self.numeric_binary(left, right, |a, b| a % b),
            BinaryOp::Exp => self.numeric_binary(left, right, exponentiate),
            BinaryOp::Eq => Ok(JsValue::Boolean(self.abstract_equality(left, right)?)),
            BinaryOp::NotEq => Ok(JsValue::Boolean(!self.abstract_equality(left, right)?)),
            BinaryOp::StrictEq => Ok(JsValue::Boolean(strict_equality(left, right))),
            BinaryOp::StrictNotEq => Ok(JsValue::Boolean(!strict_equality(left, right))),
            BinaryOp::Lt => {
                let r = self.is_less_than(left, right, true)?;
                Ok(JsValue::Boolean(r == Some(true)))
            }
            BinaryOp::Gt => {
                let r = self.is_less_than(right, left, false)?;
                Ok(JsValue::Boolean(r == Some(true)))
            }
            BinaryOp::Le => {
                let r = self.is_less_than(right, left, false)?;
                Ok(JsValue::Boolean(r == Some(false)))
            }
            BinaryOp::Ge => {
                let r = self.is_less_than(left, right, true)?;
                Ok(JsValue::Boolean(r == Some(false)))
            }
            BinaryOp::Shl => {
                let l = self.to_int32(left)?;
                let shift = self.to_uint32(right)? & 31;
                Ok(JsValue::Number((l << shift) as f64))
            }
            BinaryOp::Shr => {
                let l = self.to_int32(left)?;
                let shift = self.to_uint32(right)? & 31;
                Ok(JsValue::Number((l >> shift) as f64))
            }
            BinaryOp::UShr => {
                let l = self.to_uint32(left)?;
                let shift = self.to_uint32(right)? & 31;
                Ok(JsValue::Number((l >> shift) as f64))
            }
            BinaryOp::BitAnd => self.int32_binary(left, right, |a, b| a & b),
            BinaryOp::BitOr => self.int32_binary(left, right, |a, b| a | b),
            BinaryOp::BitXor => self.int32_binary(left, right, |a, b| a ^ b),
            BinaryOp::In => {
                if !right.is_object() {
                    return Err(self.throw_type_error(&format!(
                        "cannot use 'in' operator to search in {}",
                        right.type_name()
                    )));
                }
                let key = self.to_property_key(left)?;
                let obj = self.object_ref(right)?;
                Ok(JsValue::Boolean(self.object_has_property(&obj, &key)?))
            }
            BinaryOp::InstanceOf => {
                if !right.is_object() {
                    return Err(self.throw_type_error(&format!(
                        "right-hand side of 'instanceof' is {}",
                        right.type_name()
                    )));
                }
                let key = PropertyKey::Symbol(self.well_known.has_instance.clone());
                if let Some(method) = self.get_method(right, &key)? {
                    let result = self.call(&method, right, std::slice::from_ref(left))?;
                    return Ok(JsValue::Boolean(to_boolean(&result)));
                }
                if !self.is_callable(right) {
                    return Err(
                        self.throw_type_error("right-hand side of 'instanceof' is not callable")
                    );
                }
                Ok(JsValue::Boolean(self.ordinary_has_instance(right, left)?))
            }
        }
    }

    /// §13.15.3 ApplyStringOrNumericBinaryOperator for `+`.
    fn binary_add(&mut self, left: &JsValue, right: &JsValue) -> JsResult<JsValue> {
        let lp = self.to_primitive(left, PrimitiveHint::Default)?;
        let rp = self.to_primitive(right, PrimitiveHint::Default)?;
        if matches!(lp, JsValue::String(_)) || matches!(rp, JsValue::String(_)) {
            let ls = self.to_string_value(&lp)?;
            let rs = self.to_string_value(&rp)?;
            return Ok(JsValue::String(ls.concat(&rs)));
        }
        let ln = self.to_number(&lp)?;
        let rn = self.to_number(&rp)?;
        Ok(JsValue::Number(ln + rn))
    }

    fn numeric_binary(
        &mut self,
        left: &JsValue,
        right: &JsValue,
        f: impl FnOnce(f64, f64) -> f64,
    ) -> JsResult<JsValue> {
        let l = self.to_number(left)?;
        let r = self.to_number(right)?;
        Ok(JsValue::Number(f(l, r)))
    }

    fn int32_binary(
        &mut self,
        left: &JsValue,
        right: &JsValue,
        f: impl FnOnce(i32, i32) -> i32,
    ) -> JsResult<JsValue> {
        let l = self.to_int32(left)?;
        let r = self.to_int32(right)?;
        Ok(JsValue::Number(f(l, r) as f64))
    }

    fn evaluate_assignment(
        &mut self,
        op: AssignOp,
        target: &Expression,
        value: &Expression,
        env: &EnvRef,
    ) -> JsResult<JsValue> {
        match target {
            Expression::Identifier(name) => {
                let new_value = match op {
                    AssignOp::Assign => self.evaluate_expression(value, env)?,
                    compound => {
                        let old = self.resolve_identifier(name, env)?;
                        let rhs = self.evaluate_expression(value, env)?;
                        self.apply_binary(Self::compound_op(compound), &old, &rhs)?
                    }
                };
                match env.borrow_mut().set(name, new_value.clone()) {
                    Ok(()) => Ok(new_value),
                    Err(BindingError::Immutable) => {
                        Err(self.throw_type_error("assignment to constant variable"))
                    }
                    Err(BindingError::Uninitialized) => {
                        unreachable!("writes initialize rather than report a TDZ")
                    }
                }
            }
            Expression::Member { object, property } => {
                let base = self.evaluate_expression(object, env)?;
                let key = self.member_key(property, env)?;
                if base.is_nullish() {
                    return Err(self.throw_type_error(&format!(
                        "cannot set properties of {} (setting '{key}')",
                        base.type_name()
                    )));
                }
                let new_value = match op {
                    AssignOp::Assign => self.evaluate_expression(value, env)?,
                    compound => {
                        let old = self.get_v(&base, &key)?;
                        let rhs = self.evaluate_expression(value, env)?;
                        self.apply_binary(Self::compound_op(compound), &old, &rhs)?
                    }
                };
                let boxed = self.to_object(&base)?;
                let obj = self.object_ref(&boxed)?;
                self.set_throw(&obj, &key, new_value.clone(), true)?;
                Ok(new_value)
            }
            _ => Err(self.throw_type_error("invalid assignment target")),
        }
    }

    fn compound_op(op: AssignOp) -> BinaryOp {
        match op {
            AssignOp::Assign => unreachable!("plain assignment has no operator"),
            AssignOp::Add => BinaryOp::Add,
            AssignOp::Sub => BinaryOp::Sub,
            AssignOp::Mul => BinaryOp::Mul,
            AssignOp::Div => BinaryOp::Div,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FunctionExpr;
    use crate::types::JsString;

    fn machine() -> (Interpreter, EnvRef) {
        let mut interp = Interpreter::new();
        let realm = interp.create_realm();
        let env = interp.realms[realm.0].global_env.clone();
        let ctx = interp.new_context(None, realm, None, Some(env.clone()), Some(env.clone()));
        interp.push_context(ctx);
        (interp, env)
    }

    fn num(n: f64) -> Expression {
        Expression::Literal(Literal::Number(n))
    }

    fn string(s: &str) -> Expression {
        Expression::Literal(Literal::String(s.to_string()))
    }

    fn eval(interp: &mut Interpreter, env: &EnvRef, expr: Expression) -> JsValue {
        interp.evaluate_expression(&expr, env).unwrap()
    }

    #[test]
    fn addition_prefers_string_concatenation() {
        let (mut interp, env) = machine();
        let v = eval(
            &mut interp,
            &env,
            Expression::Binary {
                op: BinaryOp::Add,
                left: Box::new(string("1")),
                right: Box::new(num(2.0)),
            },
        );
        assert_eq!(v, JsValue::String(JsString::from_str("12")));

        let v = eval(
            &mut interp,
            &env,
            Expression::Binary {
                op: BinaryOp::Add,
                left: Box::new(num(1.0)),
                right: Box::new(num(2.0)),
            },
        );
        assert!(matches!(v, JsValue::Number(n) if n == 3.0));
    }

    #[test]
    fn comparisons_treat_nan_as_undefined() {
        let (mut interp, env) = machine();
        let nan = Expression::Literal(Literal::Number(f64::NAN));
        for op in [BinaryOp::Lt, BinaryOp::Gt, BinaryOp::Le, BinaryOp::Ge] {
            let v = eval(
                &mut interp,
                &env,
                Expression::Binary {
                    op,
                    left: Box::new(nan.clone()),
                    right: Box::new(num(1.0)),
                },
            );
            assert_eq!(v, JsValue::Boolean(false), "{op:?}");
        }
    }

    #[test]
    fn abstract_and_strict_equality_differ_on_coercion() {
        let (mut interp, env) = machine();
        let loose = eval(
            &mut interp,
            &env,
            Expression::Binary {
                op: BinaryOp::Eq,
                left: Box::new(string("1")),
                right: Box::new(num(1.0)),
            },
        );
        assert_eq!(loose, JsValue::Boolean(true));
        let strict = eval(
            &mut interp,
            &env,
            Expression::Binary {
                op: BinaryOp::StrictEq,
                left: Box::new(string("1")),
                right: Box::new(num(1.0)),
            },
        );
        assert_eq!(strict, JsValue::Boolean(false));
    }

    #[test]
    fn typeof_unresolvable_is_undefined() {
        let (mut interp, env) = machine();
        let v = eval(
            &mut interp,
            &env,
            Expression::Unary {
                op: UnaryOp::TypeOf,
                argument: Box::new(Expression::Identifier("missing".to_string())),
            },
        );
        assert_eq!(v, JsValue::String(JsString::from_str("undefined")));
    }

    #[test]
    fn unresolvable_read_throws() {
        let (mut interp, env) = machine();
        let r = interp.evaluate_expression(&Expression::Identifier("missing".to_string()), &env);
        assert!(matches!(r, Err(EvalError::Thrown(_))));
    }

    #[test]
    fn logical_operators_short_circuit() {
        let (mut interp, env) = machine();
        // false && missing — the right side must never evaluate
        let v = eval(
            &mut interp,
            &env,
            Expression::Logical {
                op: LogicalOp::And,
                left: Box::new(Expression::Literal(Literal::Boolean(false))),
                right: Box::new(Expression::Identifier("missing".to_string())),
            },
        );
        assert_eq!(v, JsValue::Boolean(false));

        // null ?? 5
        let v = eval(
            &mut interp,
            &env,
            Expression::Logical {
                op: LogicalOp::Nullish,
                left: Box::new(Expression::Literal(Literal::Null)),
                right: Box::new(num(5.0)),
            },
        );
        assert!(matches!(v, JsValue::Number(n) if n == 5.0));

        // 0 || "fallback"
        let v = eval(
            &mut interp,
            &env,
            Expression::Logical {
                op: LogicalOp::Or,
                left: Box::new(num(0.0)),
                right: Box::new(string("fallback")),
            },
        );
        assert_eq!(v, JsValue::String(JsString::from_str("fallback")));
    }

    #[test]
    fn object_literal_with_getter() {
        let (mut interp, env) = machine();
        let getter = Rc::new(FunctionExpr {
            name: None,
            params: crate::ast::FormalParameters::default(),
            body: Rc::new(vec![crate::ast::Statement::Return(Some(num(7.0)))]),
            is_arrow: false,
            kind: crate::ast::FunctionKind::Normal,
            strict: false,
            info: crate::ast::SourceInfo::synthetic("root.obj.get"),
        });
        let obj = Expression::Object(vec![
            PropertyDef::KeyValue(PropertyName::Static("a".to_string()), num(1.0)),
            PropertyDef::Getter(PropertyName::Static("b".to_string()), getter),
        ]);
        let read_b = Expression::Member {
            object: Box::new(obj),
            property: MemberProperty::Static("b".to_string()),
        };
        let v = eval(&mut interp, &env, read_b);
        assert!(matches!(v, JsValue::Number(n) if n == 7.0));
    }

    #[test]
    fn spread_expands_through_the_iterator_protocol() {
        let (mut interp, env) = machine();
        // [0, ...[1, 2]].length
        let arr = Expression::Array(vec![
            num(0.0),
            Expression::Spread(Box::new(Expression::Array(vec![num(1.0), num(2.0)]))),
        ]);
        let len = Expression::Member {
            object: Box::new(arr),
            property: MemberProperty::Static("length".to_string()),
        };
        let v = eval(&mut interp, &env, len);
        assert!(matches!(v, JsValue::Number(n) if n == 3.0));
    }

    #[test]
    fn member_read_on_nullish_throws() {
        let (mut interp, env) = machine();
        let r = interp.evaluate_expression(
            &Expression::Member {
                object: Box::new(Expression::Literal(Literal::Null)),
                property: MemberProperty::Static("x".to_string()),
            },
            &env,
        );
        assert!(matches!(r, Err(EvalError::Thrown(_))));
    }

    #[test]
    fn compound_assignment_through_member() {
        let (mut interp, env) = machine();
        // ({n: 1}).n += 2 — build the object, assign into a binding first
        env.borrow_mut().declare("o", BindingKind::Var);
        let make = Expression::Assignment {
            op: AssignOp::Assign,
            target: Box::new(Expression::Identifier("o".to_string())),
            value: Box::new(Expression::Object(vec![PropertyDef::KeyValue(
                PropertyName::Static("n".to_string()),
                num(1.0),
            )])),
        };
        eval(&mut interp, &env, make);
        let v = eval(
            &mut interp,
            &env,
            Expression::Assignment {
                op: AssignOp::Add,
                target: Box::new(Expression::Member {
                    object: Box::new(Expression::Identifier("o".to_string())),
                    property: MemberProperty::Static("n".to_string()),
                }),
                value: Box::new(num(2.0)),
            },
        );
        assert!(matches!(v, JsValue::Number(n) if n == 3.0));
        let check = Expression::Member {
            object: Box::new(Expression::Identifier("o".to_string())),
            property: MemberProperty::Static("n".to_string()),
        };
        assert!(matches!(eval(&mut interp, &env, check), JsValue::Number(n) if n == 3.0));
    }

    #[test]
    fn delete_removes_a_configurable_member() {
        let (mut interp, env) = machine();
        env.borrow_mut().declare("o", BindingKind::Var);
        let make = Expression::Assignment {
            op: AssignOp::Assign,
            target: Box::new(Expression::Identifier("o".to_string())),
            value: Box::new(Expression::Object(vec![PropertyDef::KeyValue(
                PropertyName::Static("x".to_string()),
                num(1.0),
            )])),
        };
        eval(&mut interp, &env, make);
        let del = Expression::Unary {
            op: UnaryOp::Delete,
            argument: Box::new(Expression::Member {
                object: Box::new(Expression::Identifier("o".to_string())),
                property: MemberProperty::Static("x".to_string()),
            }),
        };
        assert_eq!(eval(&mut interp, &env, del), JsValue::Boolean(true));
        let typeof_x = Expression::Unary {
            op: UnaryOp::TypeOf,
            argument: Box::new(Expression::Member {
                object: Box::new(Expression::Identifier("o".to_string())),
                property: MemberProperty::Static("x".to_string()),
            }),
        };
        assert_eq!(
            eval(&mut interp, &env, typeof_x),
            JsValue::String(JsString::from_str("undefined"))
        );
    }

    #[test]
    fn exponent_edge_cases_follow_the_numeric_type() {
        let (mut interp, env) = machine();
        let v = eval(
            &mut interp,
            &env,
            Expression::Binary {
                op: BinaryOp::Exp,
                left: Box::new(num(1.0)),
                right: Box::new(Expression::Literal(Literal::Number(f64::INFINITY))),
            },
        );
        assert!(matches!(v, JsValue::Number(n) if n.is_nan()));
        let v = eval(
            &mut interp,
            &env,
            Expression::Binary {
                op: BinaryOp::Exp,
                left: Box::new(num(2.0)),
                right: Box::new(num(10.0)),
            },
        );
        assert!(matches!(v, JsValue::Number(n) if n == 1024.0));
    }
}
