use crate::span::Spanned;

/// A parsed source file: an ordered list of function definitions.
#[derive(Clone, Debug, Default)]
pub struct Program {
    pub functions: Vec<FunctionDef>,
}

impl Program {
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| f.name.node == name)
    }
}

/// `name p1 p2 ... = body`, or a guarded definition whose body is a
/// [`Expr::Guards`] chain.
#[derive(Clone, Debug)]
pub struct FunctionDef {
    pub name: Spanned<String>,
    pub params: Vec<Spanned<String>>,
    pub body: Spanned<Expr>,
}

#[derive(Clone, Debug)]
pub enum Expr {
    /// `do { s1; s2; ... }`
    Do(Vec<Spanned<Expr>>),
    /// `if cond then a else b`; the else branch is optional.
    If {
        cond: Box<Spanned<Expr>>,
        then_branch: Box<Spanned<Expr>>,
        else_branch: Option<Box<Spanned<Expr>>>,
    },
    /// `| cond = body` clauses, tried in source order.
    Guards(Vec<Guard>),
    /// `name <- value`
    Assign {
        name: Spanned<String>,
        value: Box<Spanned<Expr>>,
    },
    /// A call, or a variable read when `args` is empty and the name is bound.
    Call(Call),
}

#[derive(Clone, Debug)]
pub struct Guard {
    pub cond: Spanned<Expr>,
    pub body: Spanned<Expr>,
}

#[derive(Clone, Debug)]
pub struct Call {
    pub name: Spanned<String>,
    pub args: Vec<Spanned<Arg>>,
}

impl Call {
    pub fn new(name: Spanned<String>, args: Vec<Spanned<Arg>>) -> Self {
        Self { name, args }
    }
}

/// A call argument.
#[derive(Clone, Debug)]
pub enum Arg {
    /// A parenthesized call: `(add a b)`.
    Call(Call),
    /// A bare name: a bound variable, or else a zero-argument call.
    Var(String),
    /// An integer literal. Occupies no memory cell.
    Const(i64),
}
