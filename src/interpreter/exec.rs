//! Statement evaluation (§14) plus GlobalDeclarationInstantiation (§16.1.11)
//! and BlockDeclarationInstantiation (§14.2.3). Completion values thread
//! through UpdateEmpty so `evaluate_script` reports the value ECMA-262
//! assigns to the program.

use super::*;
use crate::ast::{
    CatchClause, DoWhileStatement, ForInit, ForOfStatement, ForStatement, IfStatement, Statement,
    TryStatement, VarKind, VariableDeclaration, WhileStatement,
    lexically_scoped_declarations, top_level_lexical_declarations,
    top_level_lexically_declared_names, top_level_var_declared_names,
    top_level_var_scoped_functions, var_declared_names,
};
use crate::types::JsValue;

/// Reduce a value-or-throw operation inside statement evaluation: a thrown
/// value becomes a `Throw` completion, an engine fault exits on `Err`.
macro_rules! try_value {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(EvalError::Thrown(v)) => return Ok(Completion::Throw(v)),
            Err(EvalError::Engine(e)) => return Err(e),
        }
    };
}

impl Interpreter {
    /// §16.1.11 GlobalDeclarationInstantiation, flattened onto the single
    /// global environment record.
    pub(crate) fn global_declaration_instantiation(
        &mut self,
        body: &[Statement],
        env: &EnvRef,
    ) -> JsResult<()> {
        let lex_names = top_level_lexically_declared_names(body);
        let var_names = top_level_var_declared_names(body);
        for name in &lex_names {
            if var_names.contains(name) || env.borrow().has_local(name) {
                return Err(self.throw_type_error(&format!("redeclaration of {name:?}")));
            }
        }

        for decl in top_level_lexical_declarations(body) {
            let kind = if decl.is_constant_declaration() {
                BindingKind::Const
            } else {
                BindingKind::Let
            };
            for name in decl.bound_names() {
                env.borrow_mut().declare(&name, kind);
            }
        }

        for name in var_declared_names(body) {
            if !env.borrow().has_local(&name) {
                env.borrow_mut().declare(&name, BindingKind::Var);
            }
        }

        // Duplicate function declarations: the last one wins (§16.1.11 step
        // 8 keeps only the final declaration per name).
        let functions = top_level_var_scoped_functions(body);
        let mut last_for_name = Vec::new();
        for (i, decl) in functions.iter().enumerate() {
            if functions[i + 1..].iter().all(|d| d.name != decl.name) {
                last_for_name.push(*decl);
            }
        }
        for decl in last_for_name {
            let func = self.instantiate_function_object(decl, env);
            env.borrow_mut()
                .declare_initialized(&decl.name, BindingKind::Var, func);
        }
        Ok(())
    }

    /// §14.2.3 BlockDeclarationInstantiation on a fresh block scope.
    fn block_declaration_instantiation(&mut self, body: &[Statement], env: &EnvRef) {
        for decl in lexically_scoped_declarations(body) {
            match decl {
                crate::ast::ScopedDeclaration::Variable(v) => {
                    let kind = if v.is_constant_declaration() {
                        BindingKind::Const
                    } else {
                        BindingKind::Let
                    };
                    for name in v.bound_names() {
                        env.borrow_mut().declare(&name, kind);
                    }
                }
                crate::ast::ScopedDeclaration::Function(f) => {
                    let func = self.instantiate_function_object(f, env);
                    env.borrow_mut()
                        .declare_initialized(&f.name, BindingKind::Let, func);
                }
            }
        }
    }

    /// Evaluate a statement list, threading the completion value per
    /// §6.2.4.3: the value of the list is the value of its last
    /// value-producing statement.
    pub(crate) fn evaluate_statements(
        &mut self,
        stmts: &[Statement],
        env: &EnvRef,
    ) -> EvalResult {
        let mut value = JsValue::Empty;
        for stmt in stmts {
            match self.evaluate_statement(stmt, env)? {
                Completion::Normal(v) => {
                    if !v.is_empty() {
                        value = v;
                    }
                }
                abrupt => return Ok(abrupt.update_empty(value)),
            }
        }
        Ok(Completion::Normal(value))
    }

    pub(crate) fn evaluate_statement(&mut self, stmt: &Statement, env: &EnvRef) -> EvalResult {
        self.check_budget()?;
        match stmt {
            Statement::Empty => Ok(Completion::Normal(JsValue::Empty)),
            Statement::Expression(expr) => {
                Completion::from_value_result(self.evaluate_expression(expr, env))
            }
            Statement::Block(stmts) => {
                let block_env = Environment::new(Some(env.clone()));
                self.block_declaration_instantiation(stmts, &block_env);
                let result = self.evaluate_statements(stmts, &block_env)?;
                // §14.2.2: the block's value never leaks declaration results.
                Ok(result.update_empty(JsValue::Empty))
            }
            Statement::Variable(decl) => self.evaluate_variable_declaration(decl, env),
            Statement::If(s) => self.evaluate_if(s, env),
            Statement::While(s) => self.evaluate_while(s, env, &[]),
            Statement::DoWhile(s) => self.evaluate_do_while(s, env, &[]),
            Statement::For(s) => self.evaluate_for(s, env, &[]),
            Statement::ForOf(s) => self.evaluate_for_of(s, env, &[]),
            Statement::Return(expr) => {
                let value = match expr {
                    Some(expr) => try_value!(self.evaluate_expression(expr, env)),
                    None => JsValue::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Statement::Break(label) => Ok(Completion::Break(label.clone())),
            Statement::Continue(label) => Ok(Completion::Continue(label.clone())),
            Statement::Throw(expr) => {
                let value = try_value!(self.evaluate_expression(expr, env));
                Ok(Completion::Throw(value))
            }
            Statement::Try(s) => self.evaluate_try(s, env),
            Statement::Labeled(label, inner) => self.evaluate_labeled(label, inner, env),
            // Hoisted during declaration instantiation.
            Statement::FunctionDeclaration(_) => Ok(Completion::Normal(JsValue::Empty)),
        }
    }

    fn evaluate_variable_declaration(
        &mut self,
        decl: &VariableDeclaration,
        env: &EnvRef,
    ) -> EvalResult {
        for declarator in &decl.declarations {
            match &declarator.init {
                Some(init) => {
                    let value = try_value!(self.evaluate_expression(init, env));
                    try_value!(self.bind_pattern_value(&declarator.pattern, value, env));
                }
                None => {
                    // `var x;` leaves the hoisted binding alone; a lexical
                    // declaration without initializer initializes to
                    // undefined, ending its TDZ.
                    if decl.kind != VarKind::Var {
                        try_value!(self.bind_pattern_value(
                            &declarator.pattern,
                            JsValue::Undefined,
                            env
                        ));
                    }
                }
            }
        }
        Ok(Completion::Normal(JsValue::Empty))
    }

    fn evaluate_if(&mut self, s: &IfStatement, env: &EnvRef) -> EvalResult {
        let test = try_value!(self.evaluate_expression(&s.test, env));
        let completion = if to_boolean(&test) {
            self.evaluate_statement(&s.consequent, env)?
        } else if let Some(alternate) = &s.alternate {
            self.evaluate_statement(alternate, env)?
        } else {
            Completion::Normal(JsValue::Empty)
        };
        // §14.6.2 UpdateEmpty(stmtCompletion, undefined)
        Ok(completion.update_empty(JsValue::Undefined))
    }

    /// §14.7.1.1 LoopContinues — whether an iteration completion lets the
    /// loop proceed, given the loop's label set.
    fn loop_continues(completion: &Completion, labels: &[String]) -> bool {
        match completion {
            Completion::Normal(_) => true,
            Completion::Continue(None) => true,
            Completion::Continue(Some(l)) => labels.iter().any(|x| x == l),
            _ => false,
        }
    }

    /// A `break` targeting this loop (unlabeled or in the label set) ends it
    /// with a normal completion; anything else abrupt propagates.
    fn loop_exit(completion: Completion, labels: &[String], value: JsValue) -> EvalResult {
        match completion {
            Completion::Break(None) => Ok(Completion::Normal(value)),
            Completion::Break(Some(l)) if labels.iter().any(|x| x == &l) => {
                Ok(Completion::Normal(value))
            }
            other => Ok(other.update_empty(value)),
        }
    }

    fn evaluate_while(
        &mut self,
        s: &WhileStatement,
        env: &EnvRef,
        labels: &[String],
    ) -> EvalResult {
        let mut value = JsValue::Undefined;
        loop {
            let test = try_value!(self.evaluate_expression(&s.test, env));
            if !to_boolean(&test) {
                return Ok(Completion::Normal(value));
            }
            let completion = self.evaluate_statement(&s.body, env)?;
            if let Completion::Normal(v) = &completion
                && !v.is_empty()
            {
                value = v.clone();
            }
            if !Self::loop_continues(&completion, labels) {
                return Self::loop_exit(completion, labels, value);
            }
        }
    }

    fn evaluate_do_while(
        &mut self,
        s: &DoWhileStatement,
        env: &EnvRef,
        labels: &[String],
    ) -> EvalResult {
        let mut value = JsValue::Undefined;
        loop {
            let completion = self.evaluate_statement(&s.body, env)?;
            if let Completion::Normal(v) = &completion
                && !v.is_empty()
            {
                value = v.clone();
            }
            if !Self::loop_continues(&completion, labels) {
                return Self::loop_exit(completion, labels, value);
            }
            let test = try_value!(self.evaluate_expression(&s.test, env));
            if !to_boolean(&test) {
                return Ok(Completion::Normal(value));
            }
        }
    }

    fn evaluate_for(&mut self, s: &ForStatement, env: &EnvRef, labels: &[String]) -> EvalResult {
        // A lexical init gets its own scope; per-iteration copies give each
        // iteration fresh `let` bindings (§14.7.4.2).
        let (loop_env, per_iteration) = match &s.init {
            Some(ForInit::Variable(decl)) if decl.kind != VarKind::Var => {
                let loop_env = Environment::new(Some(env.clone()));
                let kind = if decl.is_constant_declaration() {
                    BindingKind::Const
                } else {
                    BindingKind::Let
                };
                for name in decl.bound_names() {
                    loop_env.borrow_mut().declare(&name, kind);
                }
                let per_iteration = if decl.is_constant_declaration() {
                    Vec::new()
                } else {
                    decl.bound_names()
                };
                match self.evaluate_variable_declaration(decl, &loop_env)? {
                    Completion::Normal(_) => {}
                    abrupt => return Ok(abrupt),
                }
                (loop_env, per_iteration)
            }
            Some(ForInit::Variable(decl)) => {
                match self.evaluate_variable_declaration(decl, env)? {
                    Completion::Normal(_) => {}
                    abrupt => return Ok(abrupt),
                }
                (env.clone(), Vec::new())
            }
            Some(ForInit::Expression(expr)) => {
                try_value!(self.evaluate_expression(expr, env));
                (env.clone(), Vec::new())
            }
            None => (env.clone(), Vec::new()),
        };

        let mut iteration_env = Self::copy_loop_bindings(&loop_env, env, &per_iteration);
        let mut value = JsValue::Undefined;
        loop {
            if let Some(test) = &s.test {
                let test = try_value!(self.evaluate_expression(test, &iteration_env));
                if !to_boolean(&test) {
                    return Ok(Completion::Normal(value));
                }
            }
            let completion = self.evaluate_statement(&s.body, &iteration_env)?;
            if let Completion::Normal(v) = &completion
                && !v.is_empty()
            {
                value = v.clone();
            }
            if !Self::loop_continues(&completion, labels) {
                return Self::loop_exit(completion, labels, value);
            }
            iteration_env = Self::copy_loop_bindings(&iteration_env, env, &per_iteration);
            if let Some(update) = &s.update {
                try_value!(self.evaluate_expression(update, &iteration_env));
            }
        }
    }

    /// CreatePerIterationEnvironment (§14.7.4.3): fresh bindings seeded with
    /// the values from the previous iteration. With no per-iteration names
    /// the source environment is shared unchanged.
    fn copy_loop_bindings(source: &EnvRef, parent: &EnvRef, names: &[String]) -> EnvRef {
        if names.is_empty() {
            return source.clone();
        }
        let fresh = Environment::new(Some(parent.clone()));
        for name in names {
            if let Some(Ok(value)) = source.borrow().get(name) {
                fresh
                    .borrow_mut()
                    .declare_initialized(name, BindingKind::Let, value);
            } else {
                fresh.borrow_mut().declare(name, BindingKind::Let);
            }
        }
        fresh
    }

    fn evaluate_for_of(
        &mut self,
        s: &ForOfStatement,
        env: &EnvRef,
        labels: &[String],
    ) -> EvalResult {
        let right = try_value!(self.evaluate_expression(&s.right, env));
        let mut record = try_value!(self.get_iterator(&right, IteratorHint::Sync, None));

        let mut value = JsValue::Undefined;
        loop {
            let next = match self.iterator_step(&mut record) {
                Ok(next) => next,
                Err(EvalError::Thrown(v)) => return Ok(Completion::Throw(v)),
                Err(EvalError::Engine(e)) => return Err(e),
            };
            let Some(next_value) = next else {
                return Ok(Completion::Normal(value));
            };

            let iteration_env = if s.kind == VarKind::Var {
                env.clone()
            } else {
                let fresh = Environment::new(Some(env.clone()));
                let kind = if s.kind == VarKind::Const {
                    BindingKind::Const
                } else {
                    BindingKind::Let
                };
                for name in s.pattern.bound_names() {
                    fresh.borrow_mut().declare(&name, kind);
                }
                fresh
            };

            if let Err(e) = self.bind_pattern_value(&s.pattern, next_value, &iteration_env) {
                record.done = true;
                return match e {
                    EvalError::Thrown(v) => {
                        self.iterator_close_completion(&record, Completion::Throw(v))
                    }
                    EvalError::Engine(e) => Err(e),
                };
            }

            let completion = self.evaluate_statement(&s.body, &iteration_env)?;
            if let Completion::Normal(v) = &completion
                && !v.is_empty()
            {
                value = v.clone();
            }
            if !Self::loop_continues(&completion, labels) {
                // §14.7.5.7: any loop exit closes the iterator, with throw
                // precedence handled by IteratorClose itself.
                record.done = true;
                let closed = self
                    .iterator_close_completion(&record, completion.update_empty(value.clone()))?;
                return Self::loop_exit(closed, labels, value);
            }
        }
    }

    fn evaluate_try(&mut self, s: &TryStatement, env: &EnvRef) -> EvalResult {
        let block_env = Environment::new(Some(env.clone()));
        self.block_declaration_instantiation(&s.block, &block_env);
        let block = self.evaluate_statements(&s.block, &block_env)?;

        let handled = match (&block, &s.handler) {
            (Completion::Throw(thrown), Some(handler)) => {
                self.evaluate_catch(handler, thrown.clone(), env)?
            }
            _ => block,
        };

        let result = match &s.finalizer {
            Some(finalizer) => {
                let fin_env = Environment::new(Some(env.clone()));
                self.block_declaration_instantiation(finalizer, &fin_env);
                match self.evaluate_statements(finalizer, &fin_env)? {
                    // §14.15.3: a normal finally result is discarded in
                    // favor of the try/catch completion.
                    Completion::Normal(_) => handled,
                    abrupt => abrupt,
                }
            }
            None => handled,
        };
        Ok(result.update_empty(JsValue::Undefined))
    }

    /// §14.15.2 CatchClauseEvaluation.
    fn evaluate_catch(
        &mut self,
        handler: &CatchClause,
        thrown: JsValue,
        env: &EnvRef,
    ) -> EvalResult {
        let catch_env = Environment::new(Some(env.clone()));
        if let Some(param) = &handler.param {
            for name in param.bound_names() {
                catch_env.borrow_mut().declare(&name, BindingKind::Let);
            }
            match self.bind_pattern_value(param, thrown, &catch_env) {
                Ok(()) => {}
                Err(EvalError::Thrown(v)) => return Ok(Completion::Throw(v)),
                Err(EvalError::Engine(e)) => return Err(e),
            }
        }
        self.block_declaration_instantiation(&handler.body, &catch_env);
        self.evaluate_statements(&handler.body, &catch_env)
    }

    /// §14.13.3: a labeled statement absorbs a `break` naming its own label;
    /// labels stack onto the directly nested breakable statement.
    fn evaluate_labeled(&mut self, label: &str, inner: &Statement, env: &EnvRef) -> EvalResult {
        let mut labels = vec![label.to_string()];
        let mut target = inner;
        while let Statement::Labeled(l, next) = target {
            labels.push(l.clone());
            target = next;
        }
        let completion = match target {
            Statement::While(s) => self.evaluate_while(s, env, &labels)?,
            Statement::DoWhile(s) => self.evaluate_do_while(s, env, &labels)?,
            Statement::For(s) => self.evaluate_for(s, env, &labels)?,
            Statement::ForOf(s) => self.evaluate_for_of(s, env, &labels)?,
            other => self.evaluate_statement(other, env)?,
        };
        match completion {
            Completion::Break(Some(l)) if labels.iter().any(|x| x == &l) => {
                Ok(Completion::Normal(JsValue::Undefined))
            }
            other => Ok(other.update_empty(JsValue::Undefined)),
        }
    }
}
