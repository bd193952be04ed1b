//! Function objects and the invocation protocol (§10.2, §10.3): ordinary
//! call and construct, built-in functions, and
//! FunctionDeclarationInstantiation.

use super::ordinary::ordinary_get_prototype_of;
use super::*;
use crate::ast::{
    FormalParameters, FunctionDecl, FunctionExpr, FunctionKind, Pattern, SourceInfo, Statement,
    top_level_lexical_declarations, top_level_lexically_declared_names,
    top_level_var_declared_names, top_level_var_scoped_functions,
};
use crate::error::EngineError;
use crate::types::JsValue;
use std::rc::Rc;

impl Interpreter {
    // §10.3.3 CreateBuiltinFunction — native steps with `length` and `name`
    // installed; the object is callable immediately.
    pub(crate) fn create_builtin_object(
        &mut self,
        proto: Option<ObjRef>,
        name: &str,
        length: u32,
        construct: bool,
        steps: NativeSteps,
    ) -> ObjRef {
        let func = self.create_object(proto, ObjectKind::Function);
        {
            let mut f = func.borrow_mut();
            f.callable = Some(JsFunction::Builtin {
                name: name.to_string(),
                steps,
                construct,
            });
            f.insert_property(
                PropertyKey::from_str("length"),
                PropertyDescriptor::data(JsValue::Number(length as f64), false, false, true),
            );
            f.insert_property(
                PropertyKey::from_str("name"),
                PropertyDescriptor::data(JsValue::string(name), false, false, true),
            );
        }
        func
    }

    /// §7.3.25 GetFunctionRealm, reduced to the cases this machine stores:
    /// ECMAScript functions carry their realm; everything else runs in the
    /// current one.
    pub(crate) fn function_realm(&self, func: &JsValue) -> RealmId {
        if let JsValue::Object(o) = func
            && let Some(obj) = self.get_object(o.id)
            && let Some(JsFunction::Ecma(slots)) = &obj.borrow().callable
        {
            return slots.realm;
        }
        self.current_realm_id()
    }

    // §10.2.3 OrdinaryFunctionCreate
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn function_create(
        &mut self,
        params: FormalParameters,
        body: Rc<Vec<Statement>>,
        env: EnvRef,
        lexical_this: bool,
        strict: bool,
        kind: FunctionKind,
        source: SourceInfo,
        name: Option<&str>,
    ) -> ObjRef {
        let this_mode = if lexical_this {
            ThisMode::Lexical
        } else if strict {
            ThisMode::Strict
        } else {
            ThisMode::Global
        };
        let length = params.expected_argument_count();
        let slots = EcmaFunctionSlots {
            environment: env,
            formal_parameters: params,
            ecmascript_code: body,
            this_mode,
            strict,
            kind,
            constructor_kind: ConstructorKind::Base,
            is_class_constructor: false,
            realm: self.current_realm_id(),
            script_or_module: self.running_script_or_module(),
            home_name: name.map(str::to_string),
            source,
        };
        let proto = self.intrinsic(Intrinsic::FunctionPrototype);
        let func = self.create_object(Some(proto), ObjectKind::Function);
        func.borrow_mut().callable = Some(JsFunction::Ecma(Rc::new(slots)));
        func.borrow_mut().insert_property(
            PropertyKey::from_str("length"),
            PropertyDescriptor::data(JsValue::Number(length as f64), false, false, true),
        );
        self.set_function_name(&func, name.unwrap_or(""));
        func
    }

    // §10.2.9 SetFunctionName — runs at most once per function.
    pub(crate) fn set_function_name(&mut self, func: &ObjRef, name: &str) {
        debug_assert!(!func.borrow().has_own(&PropertyKey::from_str("name")));
        func.borrow_mut().insert_property(
            PropertyKey::from_str("name"),
            PropertyDescriptor::data(JsValue::string(name), false, false, true),
        );
    }

    // §10.2.5 MakeConstructor — fresh prototype object with a back link.
    pub(crate) fn make_constructor(&mut self, func: &ObjRef) {
        let object_proto = self.intrinsic(Intrinsic::ObjectPrototype);
        let prototype = self.create_object(Some(object_proto), ObjectKind::Ordinary);
        let func_val = self.object_value(func);
        prototype.borrow_mut().insert_property(
            PropertyKey::from_str("constructor"),
            PropertyDescriptor::data(func_val, true, false, true),
        );
        let proto_val = self.object_value(&prototype);
        func.borrow_mut().insert_property(
            PropertyKey::from_str("prototype"),
            PropertyDescriptor::data(proto_val, true, false, false),
        );
    }

    fn attach_prototype_property(&mut self, func: &ObjRef, kind: FunctionKind) {
        match kind {
            FunctionKind::Normal => self.make_constructor(func),
            FunctionKind::Generator | FunctionKind::AsyncGenerator => {
                let gen_proto = self.intrinsic(Intrinsic::GeneratorPrototype);
                let prototype = self.create_object(Some(gen_proto), ObjectKind::Ordinary);
                let proto_val = self.object_value(&prototype);
                func.borrow_mut().insert_property(
                    PropertyKey::from_str("prototype"),
                    PropertyDescriptor::data(proto_val, true, false, false),
                );
            }
            FunctionKind::Async => {}
        }
    }

    // §15.2.4 InstantiateOrdinaryFunctionObject (and the generator/async
    // variants, which differ only in the prototype property).
    pub(crate) fn instantiate_function_object(
        &mut self,
        decl: &Rc<FunctionDecl>,
        env: &EnvRef,
    ) -> JsValue {
        let func = self.function_create(
            decl.params.clone(),
            decl.body.clone(),
            env.clone(),
            false,
            decl.strict,
            decl.kind,
            decl.info.clone(),
            Some(&decl.name),
        );
        self.attach_prototype_property(&func, decl.kind);
        self.object_value(&func)
    }

    /// Function expressions and arrow functions. A named function expression
    /// binds its own name immutably in a private scope around the closure.
    pub(crate) fn instantiate_function_expression(
        &mut self,
        expr: &FunctionExpr,
        env: &EnvRef,
    ) -> JsValue {
        if expr.is_arrow {
            let func = self.function_create(
                expr.params.clone(),
                expr.body.clone(),
                env.clone(),
                true,
                expr.strict,
                expr.kind,
                expr.info.clone(),
                None,
            );
            return self.object_value(&func);
        }
        let scope = match &expr.name {
            Some(_) => Environment::new(Some(env.clone())),
            None => env.clone(),
        };
        let func = self.function_create(
            expr.params.clone(),
            expr.body.clone(),
            scope.clone(),
            false,
            expr.strict,
            expr.kind,
            expr.info.clone(),
            expr.name.as_deref(),
        );
        self.attach_prototype_property(&func, expr.kind);
        let func_val = self.object_value(&func);
        if let Some(name) = &expr.name {
            scope
                .borrow_mut()
                .declare_initialized(name, BindingKind::Const, func_val.clone());
        }
        func_val
    }

    // ---- invocation (§7.3.13, §10.2.1, §10.2.2) ----

    /// §7.3.13 Call
    pub(crate) fn call(
        &mut self,
        func: &JsValue,
        this: &JsValue,
        args: &[JsValue],
    ) -> JsResult<JsValue> {
        self.check_budget()?;
        if !self.is_callable(func) {
            return Err(self.throw_type_error(&format!("{} is not a function", func.type_name())));
        }
        let func_obj = self.object_ref(func)?;
        let callable = func_obj
            .borrow()
            .callable
            .clone()
            .expect("is_callable object lost its [[Call]]");
        match callable {
            JsFunction::Builtin { steps, .. } => {
                self.builtin_call(&func_obj, |interp| steps(interp, this, args, None))
            }
            JsFunction::Ecma(slots) => self.ecma_call(&func_obj, &slots, func, this, args),
        }
    }

    /// Built-ins run in a minimal execution context of their own (§10.3.1):
    /// no code evaluation state, the function's realm, no environments.
    fn builtin_call(
        &mut self,
        func_obj: &ObjRef,
        steps: impl FnOnce(&mut Interpreter) -> JsResult<JsValue>,
    ) -> JsResult<JsValue> {
        let id = func_obj.borrow().id;
        let realm = self.current_realm_id();
        let script_or_module = self.running_script_or_module();
        let ctx = self.new_context(id, realm, script_or_module, None, None);
        self.push_context(ctx);
        let result = steps(self);
        self.pop_context();
        result
    }

    // §10.2.1 [[Call]] of an ECMAScript function object.
    fn ecma_call(
        &mut self,
        func_obj: &ObjRef,
        slots: &Rc<EcmaFunctionSlots>,
        func_val: &JsValue,
        this: &JsValue,
        args: &[JsValue],
    ) -> JsResult<JsValue> {
        if slots.is_class_constructor {
            return Err(self.throw_type_error("class constructor cannot be invoked without 'new'"));
        }
        let local_env = self.prepare_for_ordinary_call(func_obj, slots, None);
        let result = match self.ordinary_call_bind_this(slots, &local_env, this) {
            Ok(()) => self.ordinary_call_evaluate_body(slots, func_val, args, &local_env),
            Err(EvalError::Thrown(v)) => Ok(Completion::Throw(v)),
            Err(EvalError::Engine(e)) => Err(e),
        };
        self.pop_context();
        // Return folding: the completion stops here and becomes a value.
        match result {
            Err(e) => Err(e.into()),
            Ok(Completion::Return(v)) => Ok(v),
            Ok(Completion::Normal(_)) => Ok(JsValue::Undefined),
            Ok(Completion::Throw(v)) => Err(EvalError::Thrown(v)),
            Ok(other) => unreachable!("loop completion {other:?} escaped a function body"),
        }
    }

    /// §7.3.14 Construct. `new_target` defaults to the constructor itself.
    pub(crate) fn construct(
        &mut self,
        func: &JsValue,
        args: &[JsValue],
        new_target: Option<&JsValue>,
    ) -> JsResult<JsValue> {
        self.check_budget()?;
        if !self.is_constructor(func) {
            return Err(
                self.throw_type_error(&format!("{} is not a constructor", func.type_name()))
            );
        }
        let nt = new_target.cloned().unwrap_or_else(|| func.clone());
        let func_obj = self.object_ref(func)?;
        let callable = func_obj
            .borrow()
            .callable
            .clone()
            .expect("is_constructor object lost its [[Call]]");
        match callable {
            JsFunction::Builtin { steps, .. } => self.builtin_call(&func_obj, |interp| {
                steps(interp, &JsValue::Undefined, args, Some(&nt))
            }),
            JsFunction::Ecma(slots) => {
                if slots.constructor_kind == ConstructorKind::Derived {
                    return Err(self.unsupported("derived class constructors"));
                }
                let this_obj = self.ordinary_create_from_constructor(
                    &nt,
                    Intrinsic::ObjectPrototype,
                    ObjectKind::Ordinary,
                )?;
                let this_val = self.object_value(&this_obj);
                let local_env = self.prepare_for_ordinary_call(&func_obj, &slots, Some(nt));
                let result = match self.ordinary_call_bind_this(&slots, &local_env, &this_val) {
                    Ok(()) => self.ordinary_call_evaluate_body(&slots, func, args, &local_env),
                    Err(EvalError::Thrown(v)) => Ok(Completion::Throw(v)),
                    Err(EvalError::Engine(e)) => Err(e),
                };
                self.pop_context();
                match result {
                    Err(e) => Err(e.into()),
                    // an explicit object return replaces `this`
                    Ok(Completion::Return(JsValue::Object(o))) => Ok(JsValue::Object(o)),
                    Ok(Completion::Return(_)) | Ok(Completion::Normal(_)) => Ok(this_val),
                    Ok(Completion::Throw(v)) => Err(EvalError::Thrown(v)),
                    Ok(other) => {
                        unreachable!("loop completion {other:?} escaped a constructor body")
                    }
                }
            }
        }
    }

    // §10.2.1.1 PrepareForOrdinaryCall — new function environment over the
    // closure scope, pushed as the running context.
    fn prepare_for_ordinary_call(
        &mut self,
        func_obj: &ObjRef,
        slots: &Rc<EcmaFunctionSlots>,
        new_target: Option<JsValue>,
    ) -> EnvRef {
        let local_env = Environment::new(Some(slots.environment.clone()));
        local_env.borrow_mut().new_target = new_target;
        let id = func_obj.borrow().id;
        let ctx = self.new_context(
            id,
            slots.realm,
            slots.script_or_module,
            Some(local_env.clone()),
            Some(local_env.clone()),
        );
        self.push_context(ctx);
        local_env
    }

    // §10.2.1.2 OrdinaryCallBindThis
    fn ordinary_call_bind_this(
        &mut self,
        slots: &EcmaFunctionSlots,
        env: &EnvRef,
        this: &JsValue,
    ) -> JsResult<()> {
        let this_value = match slots.this_mode {
            ThisMode::Lexical => return Ok(()),
            ThisMode::Strict => this.clone(),
            ThisMode::Global => {
                if this.is_nullish() {
                    self.realms[slots.realm.0].global_this.clone()
                } else {
                    self.to_object(this)?
                }
            }
        };
        env.borrow_mut().this_value = Some(this_value);
        Ok(())
    }

    // §10.2.1.3 OrdinaryCallEvaluateBody
    fn ordinary_call_evaluate_body(
        &mut self,
        slots: &EcmaFunctionSlots,
        func_val: &JsValue,
        args: &[JsValue],
        env: &EnvRef,
    ) -> EvalResult {
        let feature = match slots.kind {
            FunctionKind::Normal => None,
            FunctionKind::Generator => Some("generator function bodies"),
            FunctionKind::Async => Some("async function bodies"),
            FunctionKind::AsyncGenerator => Some("async generator function bodies"),
        };
        if let Some(feature) = feature {
            log::warn!("unsupported specification clause reached: {feature}");
            return Err(EngineError::Unsupported { feature });
        }
        match self.function_declaration_instantiation(slots, func_val, args, env) {
            Ok(()) => {}
            Err(EvalError::Thrown(v)) => return Ok(Completion::Throw(v)),
            Err(EvalError::Engine(e)) => return Err(e),
        }
        self.evaluate_statements(&slots.ecmascript_code, env)
    }

    // §10.2.11 FunctionDeclarationInstantiation. Parameters, the arguments
    // object, var hoisting, top-level lexical declarations, and function
    // hoisting all land in the single function environment; a separate var
    // scope for parameter expressions is not modeled.
    pub(crate) fn function_declaration_instantiation(
        &mut self,
        slots: &EcmaFunctionSlots,
        func_val: &JsValue,
        args: &[JsValue],
        env: &EnvRef,
    ) -> JsResult<()> {
        let code = &slots.ecmascript_code;
        let formals = &slots.formal_parameters;
        let strict = slots.strict;
        let parameter_names = formals.bound_names();
        let simple = formals.is_simple_parameter_list();
        let has_parameter_expressions = formals.contains_expression();
        let var_names = top_level_var_declared_names(code);
        let functions = top_level_var_scoped_functions(code);
        let lex_names = top_level_lexically_declared_names(code);

        let mut arguments_object_needed = slots.this_mode != ThisMode::Lexical;
        if parameter_names.iter().any(|n| n == "arguments") {
            arguments_object_needed = false;
        } else if !has_parameter_expressions
            && (functions.iter().any(|f| f.name == "arguments")
                || lex_names.iter().any(|n| n == "arguments"))
        {
            arguments_object_needed = false;
        }

        {
            let mut e = env.borrow_mut();
            for name in &parameter_names {
                if !e.has_local(name) {
                    e.declare(name, BindingKind::Var);
                }
            }
        }

        if arguments_object_needed {
            let ao = if strict || !simple {
                self.create_unmapped_arguments_object(args)
            } else {
                self.create_mapped_arguments_object(func_val, formals, args, env)
            };
            let kind = if strict {
                BindingKind::Const
            } else {
                BindingKind::Var
            };
            env.borrow_mut().declare_initialized("arguments", kind, ao);
        }

        let mut arg_index = 0usize;
        for item in &formals.items {
            self.bind_parameter(item, args, &mut arg_index, env)?;
        }

        // var names not doubling as parameters hoist as undefined
        {
            let mut e = env.borrow_mut();
            for name in &var_names {
                if !e.has_local(name) {
                    e.declare(name, BindingKind::Var);
                }
            }
        }

        for decl in top_level_lexical_declarations(code) {
            let kind = if decl.is_constant_declaration() {
                BindingKind::Const
            } else {
                BindingKind::Let
            };
            let mut e = env.borrow_mut();
            for name in decl.bound_names() {
                e.declare(&name, kind);
            }
        }

        for f in functions {
            let fo = self.instantiate_function_object(f, env);
            let _ = env.borrow_mut().set(&f.name, fo);
        }
        Ok(())
    }

    /// IteratorBindingInitialization over an already-materialized argument
    /// list.
    fn bind_parameter(
        &mut self,
        pattern: &Pattern,
        args: &[JsValue],
        index: &mut usize,
        env: &EnvRef,
    ) -> JsResult<()> {
        match pattern {
            Pattern::Rest(inner) => {
                let rest = args.get(*index..).unwrap_or(&[]).to_vec();
                *index = args.len();
                let array = self.create_array_from(&rest)?;
                let value = self.object_value(&array);
                self.bind_pattern_value(inner, value, env)
            }
            _ => {
                let value = args.get(*index).cloned().unwrap_or(JsValue::Undefined);
                *index += 1;
                self.bind_pattern_value(pattern, value, env)
            }
        }
    }

    pub(crate) fn bind_pattern_value(
        &mut self,
        pattern: &Pattern,
        value: JsValue,
        env: &EnvRef,
    ) -> JsResult<()> {
        match pattern {
            Pattern::Identifier(name) => {
                match env.borrow_mut().set(name, value) {
                    Ok(()) => Ok(()),
                    Err(_) => Err(self.throw_type_error(&format!("cannot bind '{name}'"))),
                }
            }
            Pattern::Assign(inner, default) => {
                let value = if matches!(value, JsValue::Undefined) {
                    self.evaluate_expression(default, env)?
                } else {
                    value
                };
                self.bind_pattern_value(inner, value, env)
            }
            Pattern::Rest(inner) => self.bind_pattern_value(inner, value, env),
        }
    }

    // §7.3.22 OrdinaryHasInstance — prototype-chain walk; [[BoundTarget]]
    // is out of scope.
    pub(crate) fn ordinary_has_instance(
        &mut self,
        constructor: &JsValue,
        val: &JsValue,
    ) -> JsResult<bool> {
        if !self.is_callable(constructor) {
            return Ok(false);
        }
        let JsValue::Object(_) = val else {
            return Ok(false);
        };
        let proto = self.get(constructor, &PropertyKey::from_str("prototype"))?;
        let proto_obj = match proto {
            JsValue::Object(_) => self.object_ref(&proto)?,
            _ => return Err(self.throw_type_error("constructor prototype is not an object")),
        };
        let val_obj = self.object_ref(val)?;
        let mut current = ordinary_get_prototype_of(&val_obj);
        while let Some(p) = current {
            if Rc::ptr_eq(&p, &proto_obj) {
                return Ok(true);
            }
            current = ordinary_get_prototype_of(&p);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, Expression, Literal};

    fn machine() -> Interpreter {
        let mut interp = Interpreter::new();
        let realm = interp.create_realm();
        let ctx = interp.new_context(None, realm, None, None, None);
        interp.push_context(ctx);
        interp
    }

    fn identifier_params(names: &[&str]) -> FormalParameters {
        FormalParameters {
            items: names
                .iter()
                .map(|n| Pattern::Identifier(n.to_string()))
                .collect(),
        }
    }

    /// `function (a, b) { return a + b; }` built straight from AST nodes.
    fn adder(interp: &mut Interpreter) -> JsValue {
        let env = interp.realms[interp.current_realm_id().0].global_env.clone();
        let body = vec![Statement::Return(Some(Expression::Binary {
            op: BinaryOp::Add,
            left: Box::new(Expression::Identifier("a".to_string())),
            right: Box::new(Expression::Identifier("b".to_string())),
        }))];
        let func = interp.function_create(
            identifier_params(&["a", "b"]),
            Rc::new(body),
            env,
            false,
            false,
            FunctionKind::Normal,
            SourceInfo::synthetic("test.adder"),
            Some("add"),
        );
        interp.make_constructor(&func);
        interp.object_value(&func)
    }

    #[test]
    fn call_folds_return_into_a_value() {
        let mut interp = machine();
        let f = adder(&mut interp);
        let result = interp
            .call(&f, &JsValue::Undefined, &[JsValue::Number(40.0), JsValue::Number(2.0)])
            .unwrap();
        assert!(matches!(result, JsValue::Number(n) if n == 42.0));
    }

    #[test]
    fn missing_arguments_default_to_undefined() {
        let mut interp = machine();
        let f = adder(&mut interp);
        let result = interp
            .call(&f, &JsValue::Undefined, &[JsValue::Number(1.0)])
            .unwrap();
        // 1 + undefined is NaN
        assert!(matches!(result, JsValue::Number(n) if n.is_nan()));
    }

    #[test]
    fn falling_off_the_end_returns_undefined() {
        let mut interp = machine();
        let env = interp.realms[interp.current_realm_id().0].global_env.clone();
        let func = interp.function_create(
            FormalParameters::default(),
            Rc::new(vec![Statement::Empty]),
            env,
            false,
            false,
            FunctionKind::Normal,
            SourceInfo::synthetic("test.noop"),
            None,
        );
        let f = interp.object_value(&func);
        let result = interp.call(&f, &JsValue::Undefined, &[]).unwrap();
        assert!(matches!(result, JsValue::Undefined));
    }

    #[test]
    fn calling_a_non_function_throws() {
        let mut interp = machine();
        let result = interp.call(&JsValue::Number(1.0), &JsValue::Undefined, &[]);
        assert!(matches!(result, Err(EvalError::Thrown(_))));
    }

    #[test]
    fn context_stack_balances_across_throwing_calls() {
        let mut interp = machine();
        let function_proto = interp.intrinsic(Intrinsic::FunctionPrototype);
        let thrower = interp.create_builtin_object(
            Some(function_proto),
            "boom",
            0,
            false,
            Rc::new(|interp: &mut Interpreter, _this, _args, _nt| {
                Err(interp.throw_type_error("boom"))
            }),
        );
        let f = interp.object_value(&thrower);
        let depth_before = interp.realm_chain.len();
        let result = interp.call(&f, &JsValue::Undefined, &[]);
        assert!(matches!(result, Err(EvalError::Thrown(_))));
        assert_eq!(interp.realm_chain.len(), depth_before);
    }

    #[test]
    fn sloppy_call_boxes_this_to_global() {
        let mut interp = machine();
        let env = interp.realms[interp.current_realm_id().0].global_env.clone();
        let body = vec![Statement::Return(Some(Expression::This))];
        let func = interp.function_create(
            FormalParameters::default(),
            Rc::new(body),
            env,
            false,
            false,
            FunctionKind::Normal,
            SourceInfo::synthetic("test.this"),
            None,
        );
        let f = interp.object_value(&func);
        let result = interp.call(&f, &JsValue::Undefined, &[]).unwrap();
        let global_this = interp.realms[interp.current_realm_id().0].global_this.clone();
        assert!(same_value(&result, &global_this));
    }

    #[test]
    fn construct_returns_this_unless_body_returns_object() {
        let mut interp = machine();
        let f = adder(&mut interp);
        let instance = interp.construct(&f, &[], None).unwrap();
        let JsValue::Object(_) = instance else {
            panic!("construct must produce an object");
        };
        // new instance inherits from f.prototype
        let got = interp.ordinary_has_instance(&f, &instance).unwrap();
        assert!(got);
    }

    #[test]
    fn construct_on_non_constructor_throws() {
        let mut interp = machine();
        let function_proto = interp.intrinsic(Intrinsic::FunctionPrototype);
        let plain = interp.create_builtin_object(
            Some(function_proto),
            "plain",
            0,
            false,
            Rc::new(|_interp, _this, _args, _nt| Ok(JsValue::Undefined)),
        );
        let f = interp.object_value(&plain);
        assert!(matches!(
            interp.construct(&f, &[], None),
            Err(EvalError::Thrown(_))
        ));
    }

    #[test]
    fn rest_parameter_collects_tail() {
        let mut interp = machine();
        let env = interp.realms[interp.current_realm_id().0].global_env.clone();
        let params = FormalParameters {
            items: vec![
                Pattern::Identifier("head".to_string()),
                Pattern::Rest(Box::new(Pattern::Identifier("tail".to_string()))),
            ],
        };
        let body = vec![Statement::Return(Some(Expression::Member {
            object: Box::new(Expression::Identifier("tail".to_string())),
            property: crate::ast::MemberProperty::Static("length".to_string()),
        }))];
        let func = interp.function_create(
            params,
            Rc::new(body),
            env,
            false,
            false,
            FunctionKind::Normal,
            SourceInfo::synthetic("test.rest"),
            None,
        );
        let f = interp.object_value(&func);
        let result = interp
            .call(
                &f,
                &JsValue::Undefined,
                &[JsValue::Number(0.0), JsValue::Number(1.0), JsValue::Number(2.0)],
            )
            .unwrap();
        assert!(matches!(result, JsValue::Number(n) if n == 2.0));
    }

    #[test]
    fn default_parameter_evaluates_when_missing() {
        let mut interp = machine();
        let env = interp.realms[interp.current_realm_id().0].global_env.clone();
        let params = FormalParameters {
            items: vec![Pattern::Assign(
                Box::new(Pattern::Identifier("x".to_string())),
                Box::new(Expression::Literal(Literal::Number(7.0))),
            )],
        };
        let body = vec![Statement::Return(Some(Expression::Identifier(
            "x".to_string(),
        )))];
        let func = interp.function_create(
            params,
            Rc::new(body),
            env,
            false,
            false,
            FunctionKind::Normal,
            SourceInfo::synthetic("test.default"),
            None,
        );
        let f = interp.object_value(&func);
        let missing = interp.call(&f, &JsValue::Undefined, &[]).unwrap();
        assert!(matches!(missing, JsValue::Number(n) if n == 7.0));
        let given = interp
            .call(&f, &JsValue::Undefined, &[JsValue::Number(1.0)])
            .unwrap();
        assert!(matches!(given, JsValue::Number(n) if n == 1.0));
    }

    #[test]
    fn generator_body_is_a_typed_engine_fault() {
        let mut interp = machine();
        let env = interp.realms[interp.current_realm_id().0].global_env.clone();
        let func = interp.function_create(
            FormalParameters::default(),
            Rc::new(vec![]),
            env,
            false,
            false,
            FunctionKind::Generator,
            SourceInfo::synthetic("test.gen"),
            None,
        );
        let f = interp.object_value(&func);
        let result = interp.call(&f, &JsValue::Undefined, &[]);
        assert!(matches!(
            result,
            Err(EvalError::Engine(EngineError::Unsupported { .. }))
        ));
    }
}
