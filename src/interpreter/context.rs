use super::Interpreter;
use super::realm::RealmId;
use super::types::EnvRef;

/// Opaque identifier of a Script Record supplied by the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScriptId(pub u64);

/// Opaque identifier of a Module Record (module semantics live in an
/// external collaborator; the machine only threads the token through).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ModuleId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScriptOrModule {
    Script(ScriptId),
    Module(ModuleId),
}

/// §9.4 execution context.
///
/// "Suspended" is not a stored flag: a context is suspended exactly when it
/// is on the stack but not topmost, and running when it is topmost. Push and
/// pop are the only mutators, so the stack cannot desync from the flags it
/// replaces.
#[derive(Clone, Debug)]
pub struct ExecutionContext {
    /// The function object being evaluated, or `None` for top-level code
    /// and job bootstrap contexts.
    pub function: Option<u64>,
    pub realm: RealmId,
    pub script_or_module: Option<ScriptOrModule>,
    pub lexical_environment: Option<EnvRef>,
    pub variable_environment: Option<EnvRef>,
    /// Monotonically increasing identity, for diagnostics.
    pub id: u64,
}

impl Interpreter {
    pub(crate) fn new_context(
        &mut self,
        function: Option<u64>,
        realm: RealmId,
        script_or_module: Option<ScriptOrModule>,
        lexical_environment: Option<EnvRef>,
        variable_environment: Option<EnvRef>,
    ) -> ExecutionContext {
        let id = self.next_context_id;
        self.next_context_id += 1;
        ExecutionContext {
            function,
            realm,
            script_or_module,
            lexical_environment,
            variable_environment,
            id,
        }
    }

    /// Push `ctx`, suspending the previous running context of its realm.
    pub(crate) fn push_context(&mut self, ctx: ExecutionContext) {
        log::trace!(
            "push context #{} (realm {}, depth {})",
            ctx.id,
            ctx.realm.0,
            self.realms[ctx.realm.0].contexts.len() + 1
        );
        self.realm_chain.push(ctx.realm);
        self.realms[ctx.realm.0].contexts.push(ctx);
    }

    /// Pop the running context of the current realm, resuming its suspender.
    /// Popping an empty stack is a machine programming error.
    pub(crate) fn pop_context(&mut self) -> ExecutionContext {
        let realm = self
            .realm_chain
            .pop()
            .unwrap_or_else(|| panic!("pop_context with no running context"));
        let ctx = self.realms[realm.0]
            .contexts
            .pop()
            .unwrap_or_else(|| panic!("context stack underflow for realm {}", realm.0));
        log::trace!("pop context #{} (realm {})", ctx.id, realm.0);
        ctx
    }

    /// The realm of the running execution context.
    pub fn current_realm_id(&self) -> RealmId {
        self.realm_chain.last().copied().unwrap_or(RealmId(0))
    }

    /// The running execution context: the topmost entry of the current
    /// realm's stack.
    pub fn running_context(&self) -> Option<&ExecutionContext> {
        let realm = self.realm_chain.last()?;
        self.realms[realm.0].contexts.last()
    }

    pub(crate) fn running_script_or_module(&self) -> Option<ScriptOrModule> {
        self.running_context().and_then(|c| c.script_or_module)
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;

    #[test]
    fn running_is_topmost() {
        let mut interp = Interpreter::new();
        let realm = interp.create_realm();
        assert!(interp.running_context().is_none());

        let outer = interp.new_context(None, realm, Some(ScriptOrModule::Script(ScriptId(1))), None, None);
        let outer_id = outer.id;
        interp.push_context(outer);
        assert_eq!(interp.running_context().map(|c| c.id), Some(outer_id));

        let inner = interp.new_context(None, realm, None, None, None);
        let inner_id = inner.id;
        assert!(inner_id > outer_id, "context identity is monotonic");
        interp.push_context(inner);
        assert_eq!(interp.running_context().map(|c| c.id), Some(inner_id));

        let popped = interp.pop_context();
        assert_eq!(popped.id, inner_id);
        assert_eq!(interp.running_context().map(|c| c.id), Some(outer_id));
        assert_eq!(
            interp.running_script_or_module(),
            Some(ScriptOrModule::Script(ScriptId(1)))
        );
    }

    #[test]
    #[should_panic(expected = "no running context")]
    fn pop_without_push_is_fatal() {
        let mut interp = Interpreter::new();
        let _ = interp.create_realm();
        let _ = interp.pop_context();
    }
}
