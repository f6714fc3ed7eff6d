//! Core type inference algorithm.
//!
//! Algorithm W over the [`Registry`]: names are instantiated at every use,
//! expression types are constrained through destructive unification, and
//! `let` bindings are generalized over the variables not free in their scope.

use std::collections::BTreeMap;

use crate::error::{InferError, TypeError};
use crate::syntax::{Arm, Expr, Literal, Pattern, Span, TypeSyntax};
use crate::types::{ConstructorType, RecordType, Scheme, Type};

use super::env::TypeEnv;
use super::registry::Registry;
use super::type_lookup::TypeVarScope;

/// Result type for inference operations.
pub type InferResult<T> = Result<T, InferError>;

/// Argument shape of a constructor, or of what it is applied to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Arity {
    /// Shape not known yet (a variable): any present argument fits.
    Any,
    Count(usize),
}

impl Arity {
    fn of_pattern(pattern: Option<&Pattern>) -> Arity {
        match pattern {
            None => Arity::Count(0),
            Some(Pattern::Tuple(elements)) => Arity::Count(elements.len()),
            Some(Pattern::Wildcard) | Some(Pattern::Var(_)) => Arity::Any,
            Some(_) => Arity::Count(1),
        }
    }

    fn count(self) -> usize {
        match self {
            Arity::Any => 1,
            Arity::Count(n) => n,
        }
    }

    fn agrees(self, other: Arity) -> bool {
        match (self, other) {
            (Arity::Count(0), Arity::Count(0)) => true,
            (Arity::Count(0), _) | (_, Arity::Count(0)) => false,
            (Arity::Any, _) | (_, Arity::Any) => true,
            (Arity::Count(a), Arity::Count(b)) => a == b,
        }
    }
}

fn literal_type(lit: &Literal) -> Type {
    match lit {
        Literal::Int(_) => Type::Int,
        Literal::Float(_) => Type::Float,
        Literal::Bool(_) => Type::Bool,
        Literal::String(_) => Type::String,
        Literal::Char(_) => Type::Char,
        Literal::Unit => Type::Unit,
    }
}

/// A constructor used as a plain value: nullary ones are the owner type
/// itself, the others are functions into it.
fn constructor_value(ty: Type) -> Type {
    match ty {
        Type::Constructor(ctor) => match ctor.arg {
            None => *ctor.owner,
            Some(arg) => Type::Func(arg, ctor.owner),
        },
        other => other,
    }
}

impl Registry {
    /// Infer the type of an expression, resolved for display.
    pub fn infer_type(&mut self, env: &TypeEnv, expr: &Expr) -> InferResult<Type> {
        let ty = self.infer_expr(env, expr)?;
        Ok(self.resolve_deep(&ty))
    }

    /// Unify the type `found` at `span` with the type the context expects.
    pub fn unify_at(&mut self, span: Span, found: &Type, expected: &Type) -> InferResult<()> {
        self.unify(found, expected).map_err(|err| err.at(span))
    }

    fn infer_expr(&mut self, env: &TypeEnv, expr: &Expr) -> InferResult<Type> {
        match expr {
            Expr::Lit { value, .. } => Ok(literal_type(value)),

            Expr::Var { name, span } => {
                let scheme = env.lookup_binding(name).map_err(|e| e.at(*span))?;
                let ty = self.instantiate(scheme);
                Ok(constructor_value(ty))
            }

            Expr::Path { module, name, span } => self.infer_path(env, module, name, *span),

            Expr::Fun {
                param,
                annotation,
                body,
                span,
            } => {
                let param_ty = match annotation {
                    Some(syntax) => self.lookup_annotation(env, syntax, *span)?,
                    None => self.fresh_var(),
                };
                let body_env = env.extend(param.clone(), Scheme::mono(param_ty.clone()));
                let body_ty = self.infer_expr(&body_env, body)?;
                Ok(Type::func(param_ty, body_ty))
            }

            Expr::App { func, arg, span } => self.infer_app(env, func, arg, *span),

            Expr::Let {
                name,
                recursive,
                annotation,
                value,
                body,
                span,
            } => {
                let scheme =
                    self.infer_binding(env, name, *recursive, annotation.as_ref(), value, *span)?;
                let body_env = env.extend(name.clone(), scheme);
                self.infer_expr(&body_env, body)
            }

            Expr::If {
                cond,
                then_branch,
                else_branch,
                span,
            } => {
                let cond_ty = self.infer_expr(env, cond)?;
                self.unify_at(cond.span(), &cond_ty, &Type::Bool)?;
                let then_ty = self.infer_expr(env, then_branch)?;
                let else_ty = self.infer_expr(env, else_branch)?;
                self.unify_at(*span, &else_ty, &then_ty)?;
                Ok(then_ty)
            }

            Expr::Tuple { elements, .. } => {
                let types = elements
                    .iter()
                    .map(|e| self.infer_expr(env, e))
                    .collect::<InferResult<Vec<_>>>()?;
                Ok(Type::tuple(types))
            }

            // Record literals are closed
            Expr::Record { fields, span } => {
                let fields = self.infer_fields(env, fields, *span)?;
                Ok(Type::Record(RecordType::closed(fields)))
            }

            Expr::Field {
                record,
                label,
                span,
            } => {
                let record_ty = self.infer_expr(env, record)?;
                let field_ty = self.fresh_var();
                let row = self.fresh_var();
                let expected = Type::record_open([(label.clone(), field_ty.clone())], row);
                self.unify_at(*span, &record_ty, &expected)?;
                Ok(field_ty)
            }

            // The updated record keeps its type, so every new value must fit
            // the field it replaces.
            Expr::Update {
                record,
                fields,
                span,
            } => {
                let record_ty = self.infer_expr(env, record)?;
                let fields = self.infer_fields(env, fields, *span)?;
                let row = self.fresh_var();
                let expected = Type::Record(RecordType::open(fields, row));
                self.unify_at(*span, &record_ty, &expected)?;
                Ok(record_ty)
            }

            Expr::Construct { name, arg, span } => {
                let ctor = self.lookup_constructor(env, name, *span)?;
                self.apply_constructor(env, ctor, arg.as_deref(), *span)
            }

            Expr::Match {
                scrutinee,
                arms,
                span,
            } => self.infer_match(env, scrutinee, arms, *span),

            Expr::Annotate {
                expr: inner,
                ty,
                span,
            } => {
                let inner_ty = self.infer_expr(env, inner)?;
                let annotated = self.lookup_annotation(env, ty, *span)?;
                self.unify_at(*span, &inner_ty, &annotated)?;
                Ok(annotated)
            }
        }
    }

    /// Infer and generalize the value of a `let` binding.
    ///
    /// A recursive binding sees itself monomorphically while its value is
    /// inferred.
    pub(crate) fn infer_binding(
        &mut self,
        env: &TypeEnv,
        name: &str,
        recursive: bool,
        annotation: Option<&TypeSyntax>,
        value: &Expr,
        span: Span,
    ) -> InferResult<Scheme> {
        let value_ty = if recursive {
            let self_ty = self.fresh_var();
            let rec_env = env.extend(name, Scheme::mono(self_ty.clone()));
            let value_ty = self.infer_expr(&rec_env, value)?;
            self.unify_at(span, &value_ty, &self_ty)?;
            value_ty
        } else {
            self.infer_expr(env, value)?
        };

        if let Some(syntax) = annotation {
            let annotated = self.lookup_annotation(env, syntax, span)?;
            self.unify_at(span, &value_ty, &annotated)?;
        }

        Ok(self.generalize_in(env, &value_ty))
    }

    fn lookup_annotation(
        &mut self,
        env: &TypeEnv,
        syntax: &TypeSyntax,
        span: Span,
    ) -> InferResult<Type> {
        let mut scope = TypeVarScope::flexible();
        syntax
            .lookup(env, self, &mut scope)
            .map_err(|e| e.at(span))
    }

    fn infer_fields(
        &mut self,
        env: &TypeEnv,
        fields: &[(String, Expr)],
        span: Span,
    ) -> InferResult<BTreeMap<String, Type>> {
        let mut types = BTreeMap::new();
        for (label, value) in fields {
            let ty = self.infer_expr(env, value)?;
            if types.insert(label.clone(), ty).is_some() {
                return Err(TypeError::DuplicateField {
                    field: label.clone(),
                }
                .at(span));
            }
        }
        Ok(types)
    }

    fn infer_path(
        &mut self,
        env: &TypeEnv,
        module: &str,
        name: &str,
        span: Span,
    ) -> InferResult<Type> {
        let scheme = env.lookup_binding(module).map_err(|e| e.at(span))?;
        let module_ty = self.instantiate(scheme);
        let Type::Module(module_ty) = self.resolve(&module_ty) else {
            return Err(TypeError::NotAModule {
                name: module.to_string(),
            }
            .at(span));
        };
        let member = module_ty.env.lookup_binding(name).map_err(|e| e.at(span))?;
        let ty = self.instantiate(member);
        Ok(constructor_value(ty))
    }

    /// Infer a function application.
    fn infer_app(
        &mut self,
        env: &TypeEnv,
        func: &Expr,
        arg: &Expr,
        span: Span,
    ) -> InferResult<Type> {
        if let Some(ctor) = self.constructor_callee(env, func) {
            return self.apply_constructor(env, ctor, Some(arg), span);
        }

        let func_ty = self.infer_expr(env, func)?;
        let arg_ty = self.infer_expr(env, arg)?;
        let ret_ty = self.fresh_var();
        self.unify_at(span, &Type::func(arg_ty, ret_ty.clone()), &func_ty)?;
        Ok(ret_ty)
    }

    /// The constructor a bare callee names, if it names one.
    fn constructor_callee(&mut self, env: &TypeEnv, func: &Expr) -> Option<ConstructorType> {
        let name = match func {
            Expr::Var { name, .. } | Expr::Construct { name, arg: None, .. } => name,
            _ => return None,
        };
        let scheme = env.lookup_binding(name).ok()?;
        if !matches!(scheme.body, Type::Constructor(_)) {
            return None;
        }
        match self.instantiate(scheme) {
            Type::Constructor(ctor) => Some(ctor),
            _ => None,
        }
    }

    fn lookup_constructor(
        &mut self,
        env: &TypeEnv,
        name: &str,
        span: Span,
    ) -> InferResult<ConstructorType> {
        let scheme = env.lookup_binding(name).map_err(|e| e.at(span))?;
        match self.instantiate(scheme) {
            Type::Constructor(ctor) => Ok(ctor),
            _ => Err(TypeError::NotAConstructor {
                name: name.to_string(),
            }
            .at(span)),
        }
    }

    /// Apply a constructor to an optional argument. The argument shape is
    /// checked against the declared one before the argument is unified.
    fn apply_constructor(
        &mut self,
        env: &TypeEnv,
        ctor: ConstructorType,
        arg: Option<&Expr>,
        span: Span,
    ) -> InferResult<Type> {
        let arg_ty = arg.map(|a| self.infer_expr(env, a)).transpose()?;
        let found = self.arity_of(arg_ty.as_ref());
        self.check_arity(&ctor, found, span)?;
        if let (Some(expected), Some(actual)) = (&ctor.arg, &arg_ty) {
            self.unify_at(span, actual, expected)?;
        }
        Ok(*ctor.owner)
    }

    fn arity_of(&self, ty: Option<&Type>) -> Arity {
        let Some(ty) = ty else {
            return Arity::Count(0);
        };
        let mut ty = self.resolve(ty);
        while let Type::Alias(alias) = ty {
            ty = self.resolve(&alias.target);
        }
        match ty {
            Type::Tuple(elements) => Arity::Count(elements.len()),
            Type::Var(_) => Arity::Any,
            _ => Arity::Count(1),
        }
    }

    fn check_arity(&self, ctor: &ConstructorType, found: Arity, span: Span) -> InferResult<()> {
        let expected = self.arity_of(ctor.arg.as_deref());
        if expected.agrees(found) {
            return Ok(());
        }
        Err(TypeError::ConstructorArity {
            constructor: ctor.name.clone(),
            expected: expected.count(),
            found: found.count(),
        }
        .at(span))
    }

    fn infer_match(
        &mut self,
        env: &TypeEnv,
        scrutinee: &Expr,
        arms: &[Arm],
        span: Span,
    ) -> InferResult<Type> {
        let scrutinee_ty = self.infer_expr(env, scrutinee)?;
        let result_ty = self.fresh_var();

        for arm in arms {
            let mut bindings = Vec::new();
            self.check_pattern(env, &arm.pattern, &scrutinee_ty, &mut bindings, span)?;
            let mut arm_env = env.copy();
            for (name, ty) in bindings {
                arm_env.add_binding(name, Scheme::mono(ty));
            }
            let body_ty = self.infer_expr(&arm_env, &arm.body)?;
            self.unify_at(arm.body.span(), &body_ty, &result_ty)?;
        }

        Ok(result_ty)
    }

    /// Check `pattern` against `expected`, collecting the variables it binds.
    fn check_pattern(
        &mut self,
        env: &TypeEnv,
        pattern: &Pattern,
        expected: &Type,
        bindings: &mut Vec<(String, Type)>,
        span: Span,
    ) -> InferResult<()> {
        match pattern {
            Pattern::Wildcard => Ok(()),

            Pattern::Var(name) => {
                bindings.push((name.clone(), expected.clone()));
                Ok(())
            }

            Pattern::Lit(value) => self.unify_at(span, &literal_type(value), expected),

            Pattern::Tuple(elements) => {
                let types: Vec<Type> = elements.iter().map(|_| self.fresh_var()).collect();
                self.unify_at(span, &Type::tuple(types.clone()), expected)?;
                for (element, ty) in elements.iter().zip(&types) {
                    self.check_pattern(env, element, ty, bindings, span)?;
                }
                Ok(())
            }

            Pattern::Construct { name, arg } => {
                let ctor = self.lookup_constructor(env, name, span)?;
                self.check_arity(&ctor, Arity::of_pattern(arg.as_deref()), span)?;
                self.unify_at(span, &ctor.owner, expected)?;
                if let (Some(arg), Some(arg_ty)) = (arg, &ctor.arg) {
                    self.check_pattern(env, arg, arg_ty, bindings, span)?;
                }
                Ok(())
            }

            Pattern::Record { fields, open } => {
                let mut types = BTreeMap::new();
                let mut nested = Vec::with_capacity(fields.len());
                for (label, field) in fields {
                    let ty = self.fresh_var();
                    if types.insert(label.clone(), ty.clone()).is_some() {
                        return Err(TypeError::DuplicateField {
                            field: label.clone(),
                        }
                        .at(span));
                    }
                    nested.push((field, ty));
                }
                let tail = if *open {
                    self.fresh_var()
                } else {
                    Type::EmptyRow
                };
                self.unify_at(span, &Type::Record(RecordType::open(types, tail)), expected)?;
                for (field, ty) in nested {
                    self.check_pattern(env, field, &ty, bindings, span)?;
                }
                Ok(())
            }
        }
    }
}
