use std::fmt;

use crate::diagnostics::Span;

/// A type as written by the programmer. Produced by the parser; resolved into a [`Type`] by
/// the type checker.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Named {
        name: String,
        args: Vec<TypeExpr>,
        span: Span,
    },
    Array(Box<TypeExpr>, Span),
    Result(Box<TypeExpr>, Box<TypeExpr>, Span),
    Function {
        params: Vec<TypeExpr>,
        result: Box<TypeExpr>,
        span: Span,
    },
}

impl TypeExpr {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Named { span, .. } => span.clone(),
            TypeExpr::Array(_, span) => span.clone(),
            TypeExpr::Result(_, _, span) => span.clone(),
            TypeExpr::Function { span, .. } => span.clone(),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named { name, args, .. } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{a}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
            TypeExpr::Array(inner, _) => write!(f, "[{inner}]"),
            TypeExpr::Result(ok, err, _) => write!(f, "Result<{ok}, {err}>"),
            TypeExpr::Function { params, result, .. } => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") -> {result}")
            }
        }
    }
}

/// The resolved, structural counterpart of [`TypeExpr`], attached to
/// AST nodes by the type checker.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Int,
    Float,
    Bool,
    String,
    Byte,
    Unit,
    Array(Box<Type>),
    Result(Box<Type>, Box<Type>),
    Function {
        params: Vec<Type>,
        result: Box<Type>,
    },
    /// The anonymous structural type of a record literal, fields kept
    /// in declaration order.
    Record(Vec<(String, Type)>),
    /// A use of a user-declared name, carrying resolved type arguments.
    /// Refined types structurally collapse to their base
    /// but keep their declared name so the verifier can look up
    /// invariants by name.
    Named { name: String, args: Vec<Type> },
}

impl Type {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    /// Sentinel returned after a checker diagnostic is raised, so later
    /// checks on the same expression don't cascade a second error from
    /// the same root cause.
    pub fn error() -> Type {
        Type::Named {
            name: "<error>".into(),
            args: Vec::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Type::Named { name, .. } if name == "<error>")
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "Int"),
            Type::Float => write!(f, "Float"),
            Type::Bool => write!(f, "Bool"),
            Type::String => write!(f, "String"),
            Type::Byte => write!(f, "Byte"),
            Type::Unit => write!(f, "Unit"),
            Type::Array(inner) => write!(f, "[{inner}]"),
            Type::Result(ok, err) => write!(f, "Result<{ok}, {err}>"),
            Type::Record(fields) => {
                write!(f, "{{")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {ty}")?;
                }
                write!(f, "}}")
            }
            Type::Function { params, result } => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") -> {result}")
            }
            Type::Named { name, args } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, a) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{a}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
        }
    }
}
