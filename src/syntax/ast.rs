//! Abstract Syntax Tree handed over by the parser.
//!
//! Only the shapes inference needs are modelled; every expression and
//! declaration carries the span errors are reported against.

use super::span::Span;

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Char(char),
    Unit,
}

/// Unresolved type syntax, as written in annotations and declarations.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSyntax {
    /// `int`, `color`
    Named(String),
    /// `'a`
    Var(String),
    /// `int list`, `(string, int) result`
    App(String, Vec<TypeSyntax>),
    /// `a -> b`
    Arrow(Box<TypeSyntax>, Box<TypeSyntax>),
    /// `a * b`
    Tuple(Vec<TypeSyntax>),
    /// `{x: int}` or, when `open`, `{x: int, ..}`
    Record {
        fields: Vec<(String, TypeSyntax)>,
        open: bool,
    },
}

/// Patterns in `match` arms.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Wildcard,
    Var(String),
    Lit(Literal),
    Tuple(Vec<Pattern>),
    Construct {
        name: String,
        arg: Option<Box<Pattern>>,
    },
    /// `{x = p, ..}` when `open`
    Record {
        fields: Vec<(String, Pattern)>,
        open: bool,
    },
}

/// A `match` arm.
#[derive(Debug, Clone, PartialEq)]
pub struct Arm {
    pub pattern: Pattern,
    pub body: Expr,
}

/// Expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Lit {
        value: Literal,
        span: Span,
    },
    Var {
        name: String,
        span: Span,
    },
    /// `Module.name`
    Path {
        module: String,
        name: String,
        span: Span,
    },
    Fun {
        param: String,
        annotation: Option<TypeSyntax>,
        body: Box<Expr>,
        span: Span,
    },
    App {
        func: Box<Expr>,
        arg: Box<Expr>,
        span: Span,
    },
    Let {
        name: String,
        recursive: bool,
        annotation: Option<TypeSyntax>,
        value: Box<Expr>,
        body: Box<Expr>,
        span: Span,
    },
    If {
        cond: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
        span: Span,
    },
    Tuple {
        elements: Vec<Expr>,
        span: Span,
    },
    Record {
        fields: Vec<(String, Expr)>,
        span: Span,
    },
    Field {
        record: Box<Expr>,
        label: String,
        span: Span,
    },
    /// `{ record with label = value; ... }`
    Update {
        record: Box<Expr>,
        fields: Vec<(String, Expr)>,
        span: Span,
    },
    Construct {
        name: String,
        arg: Option<Box<Expr>>,
        span: Span,
    },
    Match {
        scrutinee: Box<Expr>,
        arms: Vec<Arm>,
        span: Span,
    },
    Annotate {
        expr: Box<Expr>,
        ty: TypeSyntax,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Lit { span, .. }
            | Expr::Var { span, .. }
            | Expr::Path { span, .. }
            | Expr::Fun { span, .. }
            | Expr::App { span, .. }
            | Expr::Let { span, .. }
            | Expr::If { span, .. }
            | Expr::Tuple { span, .. }
            | Expr::Record { span, .. }
            | Expr::Field { span, .. }
            | Expr::Update { span, .. }
            | Expr::Construct { span, .. }
            | Expr::Match { span, .. }
            | Expr::Annotate { span, .. } => *span,
        }
    }

    // === Constructors without source positions, for tooling and tests ===

    pub fn lit(value: Literal) -> Self {
        Expr::Lit {
            value,
            span: Span::default(),
        }
    }

    pub fn int(n: i64) -> Self {
        Expr::lit(Literal::Int(n))
    }

    pub fn bool(b: bool) -> Self {
        Expr::lit(Literal::Bool(b))
    }

    pub fn var(name: &str) -> Self {
        Expr::Var {
            name: name.to_string(),
            span: Span::default(),
        }
    }

    pub fn fun(param: &str, body: Expr) -> Self {
        Expr::Fun {
            param: param.to_string(),
            annotation: None,
            body: Box::new(body),
            span: Span::default(),
        }
    }

    pub fn app(func: Expr, arg: Expr) -> Self {
        Expr::App {
            func: Box::new(func),
            arg: Box::new(arg),
            span: Span::default(),
        }
    }

    /// Curried application to several arguments.
    pub fn call(func: Expr, args: impl IntoIterator<Item = Expr>) -> Self {
        args.into_iter().fold(func, Expr::app)
    }

    pub fn let_in(name: &str, value: Expr, body: Expr) -> Self {
        Expr::Let {
            name: name.to_string(),
            recursive: false,
            annotation: None,
            value: Box::new(value),
            body: Box::new(body),
            span: Span::default(),
        }
    }

    pub fn let_rec(name: &str, value: Expr, body: Expr) -> Self {
        Expr::Let {
            name: name.to_string(),
            recursive: true,
            annotation: None,
            value: Box::new(value),
            body: Box::new(body),
            span: Span::default(),
        }
    }

    pub fn tuple(elements: Vec<Expr>) -> Self {
        Expr::Tuple {
            elements,
            span: Span::default(),
        }
    }

    pub fn record(fields: Vec<(&str, Expr)>) -> Self {
        Expr::Record {
            fields: fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            span: Span::default(),
        }
    }

    pub fn field(record: Expr, label: &str) -> Self {
        Expr::Field {
            record: Box::new(record),
            label: label.to_string(),
            span: Span::default(),
        }
    }

    pub fn construct(name: &str, arg: Option<Expr>) -> Self {
        Expr::Construct {
            name: name.to_string(),
            arg: arg.map(Box::new),
            span: Span::default(),
        }
    }

    pub fn with_span(mut self, new_span: Span) -> Self {
        match &mut self {
            Expr::Lit { span, .. }
            | Expr::Var { span, .. }
            | Expr::Path { span, .. }
            | Expr::Fun { span, .. }
            | Expr::App { span, .. }
            | Expr::Let { span, .. }
            | Expr::If { span, .. }
            | Expr::Tuple { span, .. }
            | Expr::Record { span, .. }
            | Expr::Field { span, .. }
            | Expr::Update { span, .. }
            | Expr::Construct { span, .. }
            | Expr::Match { span, .. }
            | Expr::Annotate { span, .. } => *span = new_span,
        }
        self
    }
}

/// Right-hand side of a type declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDef {
    /// `A | B of t | ...`
    Variant(Vec<(String, Option<TypeSyntax>)>),
    /// `= t`
    Alias(TypeSyntax),
    /// Declared without a visible definition.
    Abstract,
}

/// Top-level and module-level declarations.
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Let {
        name: String,
        recursive: bool,
        annotation: Option<TypeSyntax>,
        value: Expr,
        span: Span,
    },
    Type {
        name: String,
        params: Vec<String>,
        def: TypeDef,
        span: Span,
    },
    Module {
        name: String,
        decls: Vec<Decl>,
        span: Span,
    },
    Expr {
        expr: Expr,
        span: Span,
    },
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Let { span, .. }
            | Decl::Type { span, .. }
            | Decl::Module { span, .. }
            | Decl::Expr { span, .. } => *span,
        }
    }
}
