//! Two-environment type checker: a program-wide table of declared
//! types/functions/variants, and a per-function lexical [`Scope`] for
//! parameters and let-bindings. Annotates every [`Expr`] in place via
//! its `ty` cell rather than building a second tree; the one thing it
//! never does is stop at the first error, so a single `vbl check` run
//! surfaces every problem in the program.

mod scope;

use std::collections::HashMap;

use crate::ast::*;
use crate::diagnostics::{Diagnostic, DiagnosticSink, Pass, Span};

pub use scope::Scope;

pub struct Checker<'a> {
    types: HashMap<&'a str, &'a TypeDecl>,
    variants: HashMap<&'a str, (&'a str, &'a [TypeExpr])>,
    functions: HashMap<&'a str, &'a FnDecl>,
}

impl<'a> Checker<'a> {
    pub fn new(program: &'a Program) -> Self {
        let mut types = HashMap::new();
        let mut variants = HashMap::new();
        let mut functions = HashMap::new();

        for decl in &program.decls {
            match decl {
                Decl::Type(t) => {
                    types.insert(t.name.as_str(), t);
                    if let TypeDef::Sum(vs) = &t.def {
                        for v in vs {
                            variants.insert(v.name.as_str(), (t.name.as_str(), v.payload.as_slice()));
                        }
                    }
                }
                Decl::Function(f) => {
                    functions.insert(f.name.as_str(), f);
                }
            }
        }

        Checker {
            types,
            variants,
            functions,
        }
    }

    pub fn check(&self, program: &'a Program, sink: &mut DiagnosticSink) {
        let mut seen_types = HashMap::new();
        let mut seen_fns = HashMap::new();
        for decl in &program.decls {
            match decl {
                Decl::Type(t) => {
                    if seen_types.insert(t.name.as_str(), ()).is_some() {
                        sink.push(Diagnostic::error(
                            Pass::Semantic,
                            format!("type '{}' is already defined", t.name),
                            t.span.clone(),
                        ));
                    }
                }
                Decl::Function(f) => {
                    if seen_fns.insert(f.name.as_str(), ()).is_some() {
                        sink.push(Diagnostic::error(
                            Pass::Semantic,
                            format!("function '{}' is already defined", f.name),
                            f.span.clone(),
                        ));
                    }
                }
            }
        }

        for decl in &program.decls {
            match decl {
                Decl::Type(t) => self.check_type_decl(t, sink),
                Decl::Function(f) => self.check_fn_decl(f, sink),
            }
        }
    }

    fn check_type_decl(&self, decl: &TypeDecl, sink: &mut DiagnosticSink) {
        let base = match &decl.def {
            TypeDef::Alias(te) | TypeDef::Refined { base: te } => self.resolve_type_expr(te, sink),
            TypeDef::Sum(variants) => {
                for v in variants {
                    for payload in &v.payload {
                        self.resolve_type_expr(payload, sink);
                    }
                }
                return;
            }
        };

        let mut scope = Scope::new();
        scope.bind("value", base);
        for inv in &decl.invariants {
            let ty = self.check_expr(&inv.expr, &mut scope, sink);
            if !ty.is_error() && !matches!(ty, Type::Bool) {
                sink.push(Diagnostic::error(
                    Pass::Semantic,
                    format!("invariant must be a Bool expression, found {ty}"),
                    inv.span.clone(),
                ));
            }
        }
    }

    fn check_fn_decl(&self, decl: &FnDecl, sink: &mut DiagnosticSink) {
        let mut scope = Scope::new();
        let mut param_types = Vec::new();
        for p in &decl.params {
            let ty = self.resolve_type_expr(&p.ty, sink);
            scope.bind(p.name.clone(), ty.clone());
            param_types.push(ty);
        }
        let return_type = self.resolve_type_expr(&decl.return_type, sink);

        for pre in &decl.preconditions {
            let ty = self.check_expr(&pre.expr, &mut scope, sink);
            if !ty.is_error() && !matches!(ty, Type::Bool) {
                sink.push(Diagnostic::error(
                    Pass::Semantic,
                    format!("precondition must be a Bool expression, found {ty}"),
                    pre.span.clone(),
                ));
            }
        }

        let body_type = self.check_block(&decl.body, &mut scope, sink);
        if !body_type.is_error()
            && !return_type.is_error()
            && !self.assignable(&body_type, &return_type)
        {
            sink.push(Diagnostic::error(
                Pass::Semantic,
                format!(
                    "function '{}' declares return type {return_type} but its body has type {body_type}",
                    decl.name
                ),
                decl.span.clone(),
            ));
        }

        scope.bind("result", return_type);
        for post in &decl.postconditions {
            let ty = self.check_expr(&post.expr, &mut scope, sink);
            if !ty.is_error() && !matches!(ty, Type::Bool) {
                sink.push(Diagnostic::error(
                    Pass::Semantic,
                    format!("postcondition must be a Bool expression, found {ty}"),
                    post.span.clone(),
                ));
            }
        }
    }

    fn check_block(&self, block: &Block, scope: &mut Scope, sink: &mut DiagnosticSink) -> Type {
        scope.enter();
        let mut last = Type::Unit;
        for (i, stmt) in block.statements.iter().enumerate() {
            let is_last = i + 1 == block.statements.len();
            match stmt {
                Stmt::Let {
                    name,
                    annotation,
                    value,
                    span,
                } => {
                    let value_ty = self.check_expr(value, scope, sink);
                    let bound_ty = if let Some(ann) = annotation {
                        let declared = self.resolve_type_expr(ann, sink);
                        if !value_ty.is_error()
                            && !declared.is_error()
                            && !self.assignable(&value_ty, &declared)
                        {
                            sink.push(Diagnostic::error(
                                Pass::Semantic,
                                format!(
                                    "let binding '{name}' declared as {declared} but initialized with {value_ty}"
                                ),
                                span.clone(),
                            ));
                        }
                        declared
                    } else {
                        value_ty
                    };
                    scope.bind(name.clone(), bound_ty);
                }
                Stmt::Assign { target, value, span } => {
                    let value_ty = self.check_expr(value, scope, sink);
                    match scope.lookup(target) {
                        Some(existing) => {
                            if !value_ty.is_error()
                                && !existing.is_error()
                                && !self.assignable(&value_ty, &existing)
                            {
                                sink.push(Diagnostic::error(
                                    Pass::Semantic,
                                    format!(
                                        "cannot assign {value_ty} to '{target}' of type {existing}"
                                    ),
                                    span.clone(),
                                ));
                            }
                        }
                        None => sink.push(Diagnostic::error(
                            Pass::Semantic,
                            format!("assignment to undeclared variable '{target}'"),
                            span.clone(),
                        )),
                    }
                }
                Stmt::Expr(e) => {
                    let ty = self.check_expr(e, scope, sink);
                    if is_last {
                        last = ty;
                    }
                }
            }
        }
        scope.exit();
        last
    }

    fn check_expr(&self, expr: &Expr, scope: &mut Scope, sink: &mut DiagnosticSink) -> Type {
        let ty = self.infer(expr, scope, sink);
        expr.set_type(ty.clone());
        ty
    }

    fn infer(&self, expr: &Expr, scope: &mut Scope, sink: &mut DiagnosticSink) -> Type {
        match &expr.kind {
            ExprKind::Int(_) => Type::Int,
            ExprKind::Float(_) => Type::Float,
            ExprKind::Str(_) => Type::String,
            ExprKind::Bool(_) => Type::Bool,
            ExprKind::Ident(name) => {
                if let Some(ty) = scope.lookup(name) {
                    return ty;
                }
                if let Some((owner, payload)) = self.variants.get(name.as_str()) {
                    if payload.is_empty() {
                        return Type::Named {
                            name: owner.to_string(),
                            args: Vec::new(),
                        };
                    }
                    sink.push(Diagnostic::error(
                        Pass::Semantic,
                        format!("variant '{name}' requires {} argument(s)", payload.len()),
                        expr.span.clone(),
                    ));
                    return Type::error();
                }
                sink.push(Diagnostic::error(
                    Pass::Semantic,
                    format!("undefined variable '{name}'"),
                    expr.span.clone(),
                ));
                Type::error()
            }
            ExprKind::Binary { op, left, right } => {
                let lt = self.check_expr(left, scope, sink);
                let rt = self.check_expr(right, scope, sink);
                self.check_binary(*op, &lt, &rt, expr.span.clone(), sink)
            }
            ExprKind::Unary { op, operand } => {
                let ty = self.check_expr(operand, scope, sink);
                match op {
                    UnOp::Neg => {
                        if ty.is_error() || ty.is_numeric() {
                            ty
                        } else {
                            sink.push(Diagnostic::error(
                                Pass::Semantic,
                                format!("unary '-' requires a numeric operand, found {ty}"),
                                expr.span.clone(),
                            ));
                            Type::error()
                        }
                    }
                    UnOp::Not => {
                        if ty.is_error() || matches!(ty, Type::Bool) {
                            Type::Bool
                        } else {
                            sink.push(Diagnostic::error(
                                Pass::Semantic,
                                format!("unary '!' requires a Bool operand, found {ty}"),
                                expr.span.clone(),
                            ));
                            Type::error()
                        }
                    }
                }
            }
            ExprKind::Call { callee, args } => self.check_call(callee, args, expr.span.clone(), scope, sink),
            ExprKind::Member { object, field } => {
                let obj_ty = self.check_expr(object, scope, sink);
                match self.structural(&obj_ty) {
                    Type::Record(fields) => fields
                        .iter()
                        .find(|(name, _)| name == field)
                        .map(|(_, ty)| ty.clone())
                        .unwrap_or_else(|| {
                            sink.push(Diagnostic::error(
                                Pass::Semantic,
                                format!("type {obj_ty} has no field '{field}'"),
                                expr.span.clone(),
                            ));
                            Type::error()
                        }),
                    other if other.is_error() => Type::error(),
                    _ => {
                        sink.push(Diagnostic::error(
                            Pass::Semantic,
                            format!("type {obj_ty} is not a record"),
                            expr.span.clone(),
                        ));
                        Type::error()
                    }
                }
            }
            ExprKind::Array(items) => {
                let mut elem_ty: Option<Type> = None;
                for item in items {
                    let ty = self.check_expr(item, scope, sink);
                    if ty.is_error() {
                        continue;
                    }
                    match &elem_ty {
                        None => elem_ty = Some(ty),
                        Some(expected) if !self.assignable(&ty, expected) => {
                            sink.push(Diagnostic::error(
                                Pass::Semantic,
                                format!("array element has type {ty} but expected {expected}"),
                                item.span.clone(),
                            ));
                        }
                        _ => {}
                    }
                }
                Type::Array(Box::new(elem_ty.unwrap_or(Type::Unit)))
            }
            ExprKind::Record(fields) => {
                let mut resolved = Vec::with_capacity(fields.len());
                for (name, value) in fields {
                    let ty = self.check_expr(value, scope, sink);
                    resolved.push((name.clone(), ty));
                }
                Type::Record(resolved)
            }
            ExprKind::When {
                condition,
                then_branch,
                else_branch,
            } => {
                let cond_ty = self.check_expr(condition, scope, sink);
                if !cond_ty.is_error() && !matches!(cond_ty, Type::Bool) {
                    sink.push(Diagnostic::error(
                        Pass::Semantic,
                        format!("'when' condition must be Bool, found {cond_ty}"),
                        condition.span.clone(),
                    ));
                }
                let then_ty = self.check_block(then_branch, scope, sink);
                match else_branch {
                    Some(else_block) => {
                        let else_ty = self.check_block(else_block, scope, sink);
                        if !then_ty.is_error()
                            && !else_ty.is_error()
                            && !self.assignable(&then_ty, &else_ty)
                        {
                            sink.push(Diagnostic::error(
                                Pass::Semantic,
                                format!(
                                    "'when' branches disagree on type: {then_ty} vs {else_ty}"
                                ),
                                expr.span.clone(),
                            ));
                        }
                        then_ty
                    }
                    None => Type::Unit,
                }
            }
            ExprKind::Given { scrutinee, cases } => {
                let scrutinee_ty = self.check_expr(scrutinee, scope, sink);
                let mut result_ty: Option<Type> = None;
                for (pattern, case_expr) in cases {
                    scope.enter();
                    self.check_pattern(pattern, &scrutinee_ty, scope, sink);
                    let ty = self.check_expr(case_expr, scope, sink);
                    scope.exit();
                    if ty.is_error() {
                        continue;
                    }
                    match &result_ty {
                        None => result_ty = Some(ty),
                        Some(expected) if !self.assignable(&ty, expected) => {
                            sink.push(Diagnostic::error(
                                Pass::Semantic,
                                format!("'given' case has type {ty} but expected {expected}"),
                                case_expr.span.clone(),
                            ));
                        }
                        _ => {}
                    }
                }
                result_ty.unwrap_or(Type::Unit)
            }
            ExprKind::Paren(inner) => self.check_expr(inner, scope, sink),
        }
    }

    fn check_call(
        &self,
        callee: &Expr,
        args: &[Expr],
        span: Span,
        scope: &mut Scope,
        sink: &mut DiagnosticSink,
    ) -> Type {
        let ExprKind::Ident(name) = &callee.kind else {
            sink.push(Diagnostic::error(
                Pass::Semantic,
                "only named functions and constructors can be called".to_string(),
                callee.span.clone(),
            ));
            for a in args {
                self.check_expr(a, scope, sink);
            }
            return Type::error();
        };

        if name == "old" {
            if args.len() != 1 {
                sink.push(Diagnostic::error(
                    Pass::Semantic,
                    "'old' takes exactly one argument".to_string(),
                    span,
                ));
                return Type::error();
            }
            return self.check_expr(&args[0], scope, sink);
        }

        if let Some((owner, payload)) = self.variants.get(name.as_str()) {
            if args.len() != payload.len() {
                sink.push(Diagnostic::error(
                    Pass::Semantic,
                    format!(
                        "variant '{name}' expects {} argument(s), found {}",
                        payload.len(),
                        args.len()
                    ),
                    span,
                ));
            }
            for (arg, expected_te) in args.iter().zip(payload.iter()) {
                let arg_ty = self.check_expr(arg, scope, sink);
                let expected = self.resolve_type_expr(expected_te, sink);
                if !arg_ty.is_error() && !expected.is_error() && !self.assignable(&arg_ty, &expected) {
                    sink.push(Diagnostic::error(
                        Pass::Semantic,
                        format!("expected {expected} for variant argument, found {arg_ty}"),
                        arg.span.clone(),
                    ));
                }
            }
            return Type::Named {
                name: owner.to_string(),
                args: Vec::new(),
            };
        }

        let Some(decl) = self.functions.get(name.as_str()) else {
            sink.push(Diagnostic::error(
                Pass::Semantic,
                format!("call to undefined function '{name}'"),
                span,
            ));
            for a in args {
                self.check_expr(a, scope, sink);
            }
            return Type::error();
        };

        if args.len() != decl.params.len() {
            sink.push(Diagnostic::error(
                Pass::Semantic,
                format!(
                    "function '{name}' expects {} argument(s), found {}",
                    decl.params.len(),
                    args.len()
                ),
                span,
            ));
        }

        for (arg, param) in args.iter().zip(decl.params.iter()) {
            let arg_ty = self.check_expr(arg, scope, sink);
            let expected = self.resolve_type_expr(&param.ty, sink);
            if !arg_ty.is_error() && !expected.is_error() && !self.assignable(&arg_ty, &expected) {
                sink.push(Diagnostic::error(
                    Pass::Semantic,
                    format!(
                        "argument '{}' expects {expected}, found {arg_ty}",
                        param.name
                    ),
                    arg.span.clone(),
                ));
            }
        }
        for extra in args.iter().skip(decl.params.len()) {
            self.check_expr(extra, scope, sink);
        }

        self.resolve_type_expr(&decl.return_type, sink)
    }

    fn check_binary(
        &self,
        op: BinOp,
        lt: &Type,
        rt: &Type,
        span: Span,
        sink: &mut DiagnosticSink,
    ) -> Type {
        use BinOp::*;
        if lt.is_error() || rt.is_error() {
            return Type::error();
        }
        match op {
            Add | Sub | Mul | Div | Mod => {
                if lt.is_numeric() && lt == rt {
                    lt.clone()
                } else if matches!(op, Add) && matches!(lt, Type::String) && matches!(rt, Type::String) {
                    Type::String
                } else {
                    sink.push(Diagnostic::error(
                        Pass::Semantic,
                        format!("operator '{}' is not defined for {lt} and {rt}", op.text()),
                        span,
                    ));
                    Type::error()
                }
            }
            Lt | Gt | LtEq | GtEq => {
                if lt.is_numeric() && lt == rt {
                    Type::Bool
                } else {
                    sink.push(Diagnostic::error(
                        Pass::Semantic,
                        format!("operator '{}' requires matching numeric operands, found {lt} and {rt}", op.text()),
                        span,
                    ));
                    Type::error()
                }
            }
            Eq | NotEq => {
                if self.assignable(lt, rt) {
                    Type::Bool
                } else {
                    sink.push(Diagnostic::error(
                        Pass::Semantic,
                        format!("cannot compare {lt} with {rt}"),
                        span,
                    ));
                    Type::error()
                }
            }
            And | Or => {
                if matches!(lt, Type::Bool) && matches!(rt, Type::Bool) {
                    Type::Bool
                } else {
                    sink.push(Diagnostic::error(
                        Pass::Semantic,
                        format!("operator '{}' requires Bool operands, found {lt} and {rt}", op.text()),
                        span,
                    ));
                    Type::error()
                }
            }
        }
    }

    fn check_pattern(&self, pattern: &Pattern, scrutinee: &Type, scope: &mut Scope, sink: &mut DiagnosticSink) {
        match pattern {
            Pattern::Wildcard(_) => {}
            Pattern::Ident(name, _) => scope.bind(name.clone(), scrutinee.clone()),
            Pattern::Literal(lit, span) => {
                let lit_ty = match lit {
                    LiteralPattern::Int(_) => Type::Int,
                    LiteralPattern::Float(_) => Type::Float,
                    LiteralPattern::Str(_) => Type::String,
                    LiteralPattern::Bool(_) => Type::Bool,
                };
                if !scrutinee.is_error() && !self.assignable(&lit_ty, scrutinee) {
                    sink.push(Diagnostic::error(
                        Pass::Semantic,
                        format!("pattern of type {lit_ty} cannot match scrutinee of type {scrutinee}"),
                        span.clone(),
                    ));
                }
            }
            Pattern::Constructor {
                name,
                subpatterns,
                span,
            } => match self.variants.get(name.as_str()) {
                Some((owner, payload)) => {
                    if !scrutinee.is_error() {
                        let owner_ty = Type::Named {
                            name: owner.to_string(),
                            args: Vec::new(),
                        };
                        if !self.assignable(&owner_ty, scrutinee) {
                            sink.push(Diagnostic::error(
                                Pass::Semantic,
                                format!("pattern '{name}' does not belong to type {scrutinee}"),
                                span.clone(),
                            ));
                        }
                    }
                    if subpatterns.len() != payload.len() {
                        sink.push(Diagnostic::error(
                            Pass::Semantic,
                            format!(
                                "pattern '{name}' expects {} sub-pattern(s), found {}",
                                payload.len(),
                                subpatterns.len()
                            ),
                            span.clone(),
                        ));
                    }
                    let payload = payload.to_vec();
                    for (sub, te) in subpatterns.iter().zip(payload.iter()) {
                        let ty = self.resolve_type_expr(te, sink);
                        self.check_pattern(sub, &ty, scope, sink);
                    }
                }
                None => sink.push(Diagnostic::error(
                    Pass::Semantic,
                    format!("unknown constructor '{name}'"),
                    span.clone(),
                )),
            },
        }
    }

    fn resolve_type_expr(&self, te: &TypeExpr, sink: &mut DiagnosticSink) -> Type {
        match te {
            TypeExpr::Named { name, args, span } => match name.as_str() {
                "Int" => Type::Int,
                "Float" => Type::Float,
                "Bool" => Type::Bool,
                "String" => Type::String,
                "Byte" => Type::Byte,
                "Unit" => Type::Unit,
                other => {
                    if self.types.contains_key(other) {
                        Type::Named {
                            name: other.to_string(),
                            args: args.iter().map(|a| self.resolve_type_expr(a, sink)).collect(),
                        }
                    } else {
                        sink.push(Diagnostic::error(
                            Pass::Semantic,
                            format!("undefined type '{other}'"),
                            span.clone(),
                        ));
                        Type::error()
                    }
                }
            },
            TypeExpr::Array(inner, _) => Type::Array(Box::new(self.resolve_type_expr(inner, sink))),
            TypeExpr::Result(ok, err, _) => Type::Result(
                Box::new(self.resolve_type_expr(ok, sink)),
                Box::new(self.resolve_type_expr(err, sink)),
            ),
            TypeExpr::Function { params, result, .. } => Type::Function {
                params: params.iter().map(|p| self.resolve_type_expr(p, sink)).collect(),
                result: Box::new(self.resolve_type_expr(result, sink)),
            },
        }
    }

    /// Collapse aliases and refined types down to their base, the way
    /// assignability is actually checked; sum types stay nominal since
    /// distinct sums are never interchangeable.
    fn structural(&self, ty: &Type) -> Type {
        match ty {
            Type::Named { name, .. } => {
                if let Some(decl) = self.types.get(name.as_str()) {
                    match &decl.def {
                        TypeDef::Alias(base) | TypeDef::Refined { base } => {
                            let mut sink = DiagnosticSink::new();
                            let resolved = self.resolve_type_expr(base, &mut sink);
                            self.structural(&resolved)
                        }
                        TypeDef::Sum(_) => ty.clone(),
                    }
                } else {
                    ty.clone()
                }
            }
            other => other.clone(),
        }
    }

    fn assignable(&self, from: &Type, to: &Type) -> bool {
        if from.is_error() || to.is_error() {
            return true;
        }
        self.structural(from) == self.structural(to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn check(src: &str) -> DiagnosticSink {
        let tokens = Lexer::new(src).lex().expect("lex failed");
        let program = Parser::parse(tokens).expect("parse failed");
        let mut sink = DiagnosticSink::new();
        Checker::new(&program).check(&program, &mut sink);
        sink
    }

    #[test]
    fn accepts_well_typed_contracted_function() {
        let src = "define add(x: Int, y: Int) -> Int\n  expect x >= 0\n  expect y >= 0\n  ensure result >= x\ngiven\n  x + y\n";
        let sink = check(src);
        assert!(!sink.has_errors(), "{:?}", sink.all());
    }

    #[test]
    fn rejects_mismatched_return_type_s3() {
        let src = "define bad(x: Int) -> String\ngiven\n  x\n";
        let sink = check(src);
        assert!(sink.has_errors());
    }

    #[test]
    fn rejects_undefined_variable() {
        let src = "define f() -> Int\ngiven\n  y\n";
        let sink = check(src);
        assert!(sink.has_errors());
    }

    #[test]
    fn checks_sum_type_construction_and_matching() {
        let src = concat!(
            "type Option =\n",
            "  | Some(Int)\n",
            "  | None\n",
            "define unwrap_or(o: Option, default: Int) -> Int\n",
            "given\n",
            "  given o\n",
            "    Some(v) -> v\n",
            "    None -> default\n",
        );
        let sink = check(src);
        assert!(!sink.has_errors(), "{:?}", sink.all());
    }

    #[test]
    fn refined_type_invariant_must_be_bool() {
        let src = "type Positive = Int\n  invariant value\n";
        let sink = check(src);
        assert!(sink.has_errors());
    }

    #[test]
    fn record_field_access_is_checked() {
        let src = "define f() -> Int\ngiven\n  { x: 1, y: 2 }.x\n";
        let sink = check(src);
        assert!(!sink.has_errors(), "{:?}", sink.all());
    }

    #[test]
    fn unknown_field_access_is_an_error() {
        let src = "define f() -> Int\ngiven\n  { x: 1 }.z\n";
        let sink = check(src);
        assert!(sink.has_errors());
    }
}
