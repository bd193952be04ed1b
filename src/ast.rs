/// Decorated AST consumed from the front-end collaborator.
///
/// The machine never parses program text: the front-end hands over nodes of
/// these shapes, already decorated with source positions, and the machine
/// supplies `Evaluate` (see `interpreter::exec` / `interpreter::eval`) plus
/// the static-semantics accessors defined here (BoundNames,
/// VarDeclaredNames, LexicallyDeclaredNames, ExpectedArgumentCount, …).
use std::rc::Rc;

/// Source position and structural path of a node, used for the diagnostic
/// string form of runtime objects. The path format (`root.body[2].Return`)
/// is a debugging aid, stable and human-readable, not a protocol.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SourceInfo {
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
    /// A short snippet of the originating source text.
    pub snippet: String,
    /// Structural path from the program root.
    pub path: String,
}

impl SourceInfo {
    pub fn new(line: u32, column: u32, snippet: &str, path: &str) -> Self {
        Self {
            line,
            column,
            snippet: snippet.to_string(),
            path: path.to_string(),
        }
    }

    /// For nodes built programmatically (tests, synthesized fragments).
    pub fn synthetic(path: &str) -> Self {
        Self {
            line: 0,
            column: 0,
            snippet: String::new(),
            path: path.to_string(),
        }
    }

    pub fn describe(&self) -> String {
        if self.snippet.is_empty() {
            format!("<{}> at {}:{}", self.path, self.line, self.column)
        } else {
            format!("{} at {}:{} ({})", self.snippet, self.line, self.column, self.path)
        }
    }
}

#[derive(Clone, Debug)]
pub struct Program {
    pub body: Vec<Statement>,
    pub info: SourceInfo,
}

#[derive(Clone, Debug)]
pub enum Statement {
    Empty,
    Expression(Expression),
    Block(Vec<Statement>),
    Variable(VariableDeclaration),
    If(IfStatement),
    While(WhileStatement),
    DoWhile(DoWhileStatement),
    For(ForStatement),
    ForOf(ForOfStatement),
    Return(Option<Expression>),
    Break(Option<String>),
    Continue(Option<String>),
    Throw(Expression),
    Try(TryStatement),
    Labeled(String, Box<Statement>),
    FunctionDeclaration(Rc<FunctionDecl>),
}

#[derive(Clone, Debug)]
pub struct VariableDeclaration {
    pub kind: VarKind,
    pub declarations: Vec<Declarator>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

#[derive(Clone, Debug)]
pub struct Declarator {
    pub pattern: Pattern,
    pub init: Option<Expression>,
}

#[derive(Clone, Debug)]
pub enum Pattern {
    Identifier(String),
    /// Binding with a default initializer.
    Assign(Box<Pattern>, Box<Expression>),
    Rest(Box<Pattern>),
}

#[derive(Clone, Debug)]
pub struct IfStatement {
    pub test: Expression,
    pub consequent: Box<Statement>,
    pub alternate: Option<Box<Statement>>,
}

#[derive(Clone, Debug)]
pub struct WhileStatement {
    pub test: Expression,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub struct DoWhileStatement {
    pub body: Box<Statement>,
    pub test: Expression,
}

#[derive(Clone, Debug)]
pub struct ForStatement {
    pub init: Option<ForInit>,
    pub test: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub enum ForInit {
    Variable(VariableDeclaration),
    Expression(Expression),
}

#[derive(Clone, Debug)]
pub struct ForOfStatement {
    pub kind: VarKind,
    pub pattern: Pattern,
    pub right: Expression,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub struct TryStatement {
    pub block: Vec<Statement>,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<Vec<Statement>>,
}

#[derive(Clone, Debug)]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: Vec<Statement>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionKind {
    Normal,
    Generator,
    Async,
    AsyncGenerator,
}

#[derive(Clone, Debug)]
pub struct FunctionDecl {
    pub name: String,
    pub params: FormalParameters,
    pub body: Rc<Vec<Statement>>,
    pub kind: FunctionKind,
    /// Whether the function body is strict mode code. Decided by the
    /// binding adapter; directives are not re-scanned here.
    pub strict: bool,
    pub info: SourceInfo,
}

#[derive(Clone, Debug)]
pub struct FunctionExpr {
    pub name: Option<String>,
    pub params: FormalParameters,
    pub body: Rc<Vec<Statement>>,
    pub is_arrow: bool,
    pub kind: FunctionKind,
    pub strict: bool,
    pub info: SourceInfo,
}

#[derive(Clone, Debug, Default)]
pub struct FormalParameters {
    pub items: Vec<Pattern>,
}

#[derive(Clone, Debug)]
pub enum Expression {
    Literal(Literal),
    Identifier(String),
    This,
    Array(Vec<Expression>),
    Object(Vec<PropertyDef>),
    Function(Rc<FunctionExpr>),
    Member {
        object: Box<Expression>,
        property: MemberProperty,
    },
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
    },
    New {
        callee: Box<Expression>,
        args: Vec<Expression>,
    },
    Unary {
        op: UnaryOp,
        argument: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Conditional {
        test: Box<Expression>,
        consequent: Box<Expression>,
        alternate: Box<Expression>,
    },
    Assignment {
        op: AssignOp,
        target: Box<Expression>,
        value: Box<Expression>,
    },
    Sequence(Vec<Expression>),
    Spread(Box<Expression>),
}

#[derive(Clone, Debug)]
pub enum Literal {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
}

#[derive(Clone, Debug)]
pub enum MemberProperty {
    Static(String),
    Computed(Box<Expression>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitNot,
    TypeOf,
    Void,
    Delete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Gt,
    Le,
    Ge,
    Shl,
    Shr,
    UShr,
    BitAnd,
    BitOr,
    BitXor,
    In,
    InstanceOf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    Nullish,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Clone, Debug)]
pub enum PropertyDef {
    KeyValue(PropertyName, Expression),
    Shorthand(String),
    Getter(PropertyName, Rc<FunctionExpr>),
    Setter(PropertyName, Rc<FunctionExpr>),
}

#[derive(Clone, Debug)]
pub enum PropertyName {
    Static(String),
    Computed(Box<Expression>),
}

/// A declaration reachable from LexicallyScopedDeclarations /
/// VarScopedDeclarations.
#[derive(Clone, Debug)]
pub enum ScopedDeclaration<'a> {
    Variable(&'a VariableDeclaration),
    Function(&'a Rc<FunctionDecl>),
}

// Static semantics: BoundNames (§8.2.1)
impl Pattern {
    pub fn bound_names(&self) -> Vec<String> {
        match self {
            Pattern::Identifier(name) => vec![name.clone()],
            Pattern::Assign(inner, _) | Pattern::Rest(inner) => inner.bound_names(),
        }
    }
}

impl VariableDeclaration {
    pub fn bound_names(&self) -> Vec<String> {
        self.declarations
            .iter()
            .flat_map(|d| d.pattern.bound_names())
            .collect()
    }

    // Static semantics: IsConstantDeclaration (§8.2.3)
    pub fn is_constant_declaration(&self) -> bool {
        self.kind == VarKind::Const
    }
}

impl FormalParameters {
    pub fn bound_names(&self) -> Vec<String> {
        self.items.iter().flat_map(|p| p.bound_names()).collect()
    }

    // Static semantics: ExpectedArgumentCount (§15.1.5) — parameters before
    // the first default or rest element.
    pub fn expected_argument_count(&self) -> usize {
        self.items
            .iter()
            .take_while(|p| matches!(p, Pattern::Identifier(_)))
            .count()
    }

    // Static semantics: ContainsExpression (§15.1.2)
    pub fn contains_expression(&self) -> bool {
        fn pattern_contains(p: &Pattern) -> bool {
            match p {
                Pattern::Identifier(_) => false,
                Pattern::Assign(_, _) => true,
                Pattern::Rest(inner) => pattern_contains(inner),
            }
        }
        self.items.iter().any(pattern_contains)
    }

    // Static semantics: IsSimpleParameterList (§15.1.3)
    pub fn is_simple_parameter_list(&self) -> bool {
        self.items
            .iter()
            .all(|p| matches!(p, Pattern::Identifier(_)))
    }

    pub fn has_duplicates(&self) -> bool {
        let names = self.bound_names();
        let mut seen = std::collections::HashSet::new();
        names.iter().any(|n| !seen.insert(n.clone()))
    }
}

// Static semantics: VarDeclaredNames (§8.2.6) — `var` bindings reachable
// without crossing a function boundary. Function declarations are *not*
// included here; at the top level of a script or function body they are
// var-scoped and reported by `top_level_var_scoped_declarations`.
pub fn var_declared_names(stmts: &[Statement]) -> Vec<String> {
    let mut names = Vec::new();
    collect_var_names(stmts, &mut names);
    names
}

fn collect_var_names(stmts: &[Statement], out: &mut Vec<String>) {
    for stmt in stmts {
        collect_var_names_stmt(stmt, out);
    }
}

fn collect_var_names_stmt(stmt: &Statement, out: &mut Vec<String>) {
    match stmt {
        Statement::Variable(decl) if decl.kind == VarKind::Var => {
            out.extend(decl.bound_names());
        }
        Statement::Block(stmts) => collect_var_names(stmts, out),
        Statement::If(s) => {
            collect_var_names_stmt(&s.consequent, out);
            if let Some(alt) = &s.alternate {
                collect_var_names_stmt(alt, out);
            }
        }
        Statement::While(s) => collect_var_names_stmt(&s.body, out),
        Statement::DoWhile(s) => collect_var_names_stmt(&s.body, out),
        Statement::For(s) => {
            if let Some(ForInit::Variable(decl)) = &s.init
                && decl.kind == VarKind::Var
            {
                out.extend(decl.bound_names());
            }
            collect_var_names_stmt(&s.body, out);
        }
        Statement::ForOf(s) => {
            if s.kind == VarKind::Var {
                out.extend(s.pattern.bound_names());
            }
            collect_var_names_stmt(&s.body, out);
        }
        Statement::Try(s) => {
            collect_var_names(&s.block, out);
            if let Some(handler) = &s.handler {
                collect_var_names(&handler.body, out);
            }
            if let Some(fin) = &s.finalizer {
                collect_var_names(fin, out);
            }
        }
        Statement::Labeled(_, inner) => collect_var_names_stmt(inner, out),
        _ => {}
    }
}

// Static semantics: LexicallyDeclaredNames (§8.2.4) — at the top level of a
// block: let/const bindings plus function declarations.
pub fn lexically_declared_names(stmts: &[Statement]) -> Vec<String> {
    let mut names = Vec::new();
    for stmt in stmts {
        match stmt {
            Statement::Variable(decl) if decl.kind != VarKind::Var => {
                names.extend(decl.bound_names());
            }
            Statement::FunctionDeclaration(f) => names.push(f.name.clone()),
            Statement::Labeled(_, inner) => {
                if let Statement::FunctionDeclaration(f) = inner.as_ref() {
                    names.push(f.name.clone());
                }
            }
            _ => {}
        }
    }
    names
}

// Static semantics: LexicallyScopedDeclarations (§8.2.5)
pub fn lexically_scoped_declarations(stmts: &[Statement]) -> Vec<ScopedDeclaration<'_>> {
    let mut decls = Vec::new();
    for stmt in stmts {
        match stmt {
            Statement::Variable(decl) if decl.kind != VarKind::Var => {
                decls.push(ScopedDeclaration::Variable(decl));
            }
            Statement::FunctionDeclaration(f) => decls.push(ScopedDeclaration::Function(f)),
            _ => {}
        }
    }
    decls
}

// At the top level of a script or function body, function declarations are
// var-scoped (§8.2.7 TopLevelVarScopedDeclarations).
pub fn top_level_var_declared_names(stmts: &[Statement]) -> Vec<String> {
    let mut names = var_declared_names(stmts);
    for stmt in stmts {
        if let Statement::FunctionDeclaration(f) = stmt {
            names.push(f.name.clone());
        }
    }
    names
}

pub fn top_level_var_scoped_functions(stmts: &[Statement]) -> Vec<&Rc<FunctionDecl>> {
    stmts
        .iter()
        .filter_map(|s| match s {
            Statement::FunctionDeclaration(f) => Some(f),
            _ => None,
        })
        .collect()
}

// TopLevelLexicallyDeclaredNames: let/const only, functions excluded.
pub fn top_level_lexically_declared_names(stmts: &[Statement]) -> Vec<String> {
    let mut names = Vec::new();
    for stmt in stmts {
        if let Statement::Variable(decl) = stmt
            && decl.kind != VarKind::Var
        {
            names.extend(decl.bound_names());
        }
    }
    names
}

pub fn top_level_lexical_declarations(stmts: &[Statement]) -> Vec<&VariableDeclaration> {
    stmts
        .iter()
        .filter_map(|s| match s {
            Statement::Variable(decl) if decl.kind != VarKind::Var => Some(decl),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var_decl(kind: VarKind, name: &str) -> Statement {
        Statement::Variable(VariableDeclaration {
            kind,
            declarations: vec![Declarator {
                pattern: Pattern::Identifier(name.to_string()),
                init: None,
            }],
        })
    }

    #[test]
    fn var_names_cross_blocks_not_functions() {
        let body = vec![
            var_decl(VarKind::Var, "a"),
            Statement::Block(vec![var_decl(VarKind::Var, "b"), var_decl(VarKind::Let, "c")]),
            Statement::FunctionDeclaration(Rc::new(FunctionDecl {
                name: "f".to_string(),
                params: FormalParameters::default(),
                body: Rc::new(vec![var_decl(VarKind::Var, "inner")]),
                kind: FunctionKind::Normal,
                strict: false,
                info: SourceInfo::synthetic("root.body[2]"),
            })),
        ];
        assert_eq!(var_declared_names(&body), vec!["a", "b"]);
        assert_eq!(top_level_var_declared_names(&body), vec!["a", "b", "f"]);
        assert_eq!(lexically_declared_names(&body), vec!["c", "f"]);
        assert_eq!(top_level_lexically_declared_names(&body), vec!["c"]);
    }

    #[test]
    fn formal_parameter_semantics() {
        let simple = FormalParameters {
            items: vec![
                Pattern::Identifier("a".to_string()),
                Pattern::Identifier("b".to_string()),
            ],
        };
        assert!(simple.is_simple_parameter_list());
        assert!(!simple.contains_expression());
        assert_eq!(simple.expected_argument_count(), 2);
        assert!(!simple.has_duplicates());

        let with_default = FormalParameters {
            items: vec![
                Pattern::Identifier("a".to_string()),
                Pattern::Assign(
                    Box::new(Pattern::Identifier("b".to_string())),
                    Box::new(Expression::Literal(Literal::Number(1.0))),
                ),
            ],
        };
        assert!(!with_default.is_simple_parameter_list());
        assert!(with_default.contains_expression());
        assert_eq!(with_default.expected_argument_count(), 1);

        let dup = FormalParameters {
            items: vec![
                Pattern::Identifier("a".to_string()),
                Pattern::Identifier("a".to_string()),
            ],
        };
        assert!(dup.has_duplicates());
    }

    #[test]
    fn source_info_describe() {
        let info = SourceInfo::new(3, 7, "return a + 1;", "root.body[0].Return");
        assert_eq!(info.describe(), "return a + 1; at 3:7 (root.body[0].Return)");
        let synth = SourceInfo::synthetic("root");
        assert_eq!(synth.describe(), "<root> at 0:0");
    }
}
