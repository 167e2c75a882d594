#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Bool(bool),
    /// A blank slot in an argument list, e.g. the middle of `SUM(1,,2)`.
    Empty,
    FieldRef(String),
    Call { name: String, args: Vec<Expr> },
    Unary(UnaryOp, Box<Expr>),
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Concat,
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl BinaryOp {
    /// Operators that can appear in a legacy formula once calls are reduced.
    pub fn is_legacy_arithmetic(self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div)
    }
}

impl Expr {
    pub fn contains_call(&self) -> bool {
        match self {
            Expr::Call { .. } => true,
            Expr::Unary(_, e) => e.contains_call(),
            Expr::Binary(l, _, r) => l.contains_call() || r.contains_call(),
            _ => false,
        }
    }
}

/// Which top-level rule a formula is evaluated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// No leading `=`: `COUNT('yes')`, `FIELD('q2')+FIELD('q3')`.
    Legacy,
    /// Leading `=`: `=SUM(A,B)+2`, `=IF(q2 > 2, "High", "Low")`.
    Excel,
}
