//! The closed expression tree a condition compiles to. Every leaf is one
//! of a fixed set of context accessors — there is no way to construct a
//! node that reaches outside `event_type`, `severity`, `source`, `tags`,
//! `data.<path>`, `windows[<name>].count()`, or `metrics[<name>]`.

#[derive(Debug, Clone, PartialEq)]
pub enum BinOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    In,
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    EventType,
    Severity,
    Source,
    Tags,
    DataPath(Vec<String>),
    WindowCount(String),
    Metric(String),
    StringLit(String),
    NumberLit(f64),
    BoolLit(bool),
    ListLit(Vec<Expr>),
    Not(Box<Expr>),
    BinOp(Box<Expr>, BinOp, Box<Expr>),
}
