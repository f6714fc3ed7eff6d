//! Declarations and whole programs.

use crate::error::InferError;
use crate::syntax::{Decl, Span, TypeDef, TypeSyntax};
use crate::types::{
    AliasType, ConstructorType, ModuleType, OpaqueType, Scheme, Type, TypeArgs,
};

use super::env::TypeEnv;
use super::infer::InferResult;
use super::registry::Registry;
use super::type_lookup::TypeVarScope;

/// Name under which top-level expressions are recorded.
const EXPRESSION: &str = "-";

/// Names a declaration introduced, in order.
#[derive(Clone, Debug, Default)]
pub struct Declared {
    pub values: Vec<(String, Scheme)>,
    pub types: Vec<(String, Scheme)>,
}

impl Declared {
    fn value(name: impl Into<String>, scheme: Scheme) -> Self {
        Declared {
            values: vec![(name.into(), scheme)],
            types: Vec::new(),
        }
    }
}

/// Outcome of checking a sequence of declarations.
#[derive(Clone, Debug)]
pub struct ProgramReport {
    /// Environment after every declaration that type-checked.
    pub env: TypeEnv,
    /// Value bindings introduced by successful declarations, in order.
    /// Top-level expressions appear under the name `-`.
    pub declared: Vec<(String, Scheme)>,
    pub errors: Vec<InferError>,
}

impl ProgramReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Registry {
    /// Infer one declaration, returning the extended environment.
    ///
    /// `env` is left untouched, so a failing declaration introduces nothing.
    pub fn infer_decl(&mut self, env: &TypeEnv, decl: &Decl) -> InferResult<(TypeEnv, Declared)> {
        match decl {
            Decl::Let {
                name,
                recursive,
                annotation,
                value,
                span,
            } => {
                let scheme =
                    self.infer_binding(env, name, *recursive, annotation.as_ref(), value, *span)?;
                let env = env.extend(name.clone(), scheme.clone());
                Ok((env, Declared::value(name.clone(), scheme)))
            }

            Decl::Type {
                name,
                params,
                def,
                span,
            } => self.infer_type_decl(env, name, params, def, *span),

            Decl::Module { name, decls, .. } => {
                let mut inner = env.copy();
                let mut members = TypeEnv::empty();
                for member in decls {
                    let (next, declared) = self.infer_decl(&inner, member)?;
                    for (value, scheme) in declared.values {
                        if value != EXPRESSION {
                            members.add_binding(value, scheme);
                        }
                    }
                    for (ty, scheme) in declared.types {
                        members.add_type(ty, scheme);
                    }
                    inner = next;
                }
                let scheme = Scheme::mono(Type::Module(ModuleType {
                    name: name.clone(),
                    env: Box::new(members),
                }));
                let env = env.extend(name.clone(), scheme.clone());
                Ok((env, Declared::value(name.clone(), scheme)))
            }

            Decl::Expr { expr, .. } => {
                let ty = self.infer_type(env, expr)?;
                let scheme = self.generalize_in(env, &ty);
                Ok((env.copy(), Declared::value(EXPRESSION, scheme)))
            }
        }
    }

    fn infer_type_decl(
        &mut self,
        env: &TypeEnv,
        name: &str,
        params: &[String],
        def: &TypeDef,
        span: Span,
    ) -> InferResult<(TypeEnv, Declared)> {
        let id = self.fresh_type_id();
        let gens: Vec<_> = params.iter().map(|_| self.fresh_generalized()).collect();
        let args: TypeArgs = params
            .iter()
            .cloned()
            .zip(gens.iter().map(|g| Type::Gen(*g)))
            .collect();
        let mut scope = TypeVarScope::fixed(args.iter().cloned());
        let mut declared = Declared::default();

        let env = match def {
            TypeDef::Variant(cases) => {
                let owner = Type::variant(id, args);
                let type_scheme = Scheme::poly(gens.clone(), owner.clone());
                // Registered first so the cases may refer to the type itself
                let mut env = env.extend_type(name, type_scheme.clone());
                declared.types.push((name.to_string(), type_scheme));

                for (ctor, arg) in cases {
                    let arg = arg
                        .as_ref()
                        .map(|syntax| self.lookup_decl_type(&env, syntax, &mut scope, span))
                        .transpose()?;
                    let scheme = Scheme::poly(
                        gens.clone(),
                        Type::Constructor(ConstructorType {
                            name: ctor.clone(),
                            owner: Box::new(owner.clone()),
                            arg: arg.map(Box::new),
                        }),
                    );
                    env.add_binding(ctor.clone(), scheme.clone());
                    declared.values.push((ctor.clone(), scheme));
                }
                env
            }

            TypeDef::Alias(syntax) => {
                let target = self.lookup_decl_type(env, syntax, &mut scope, span)?;
                let type_scheme = Scheme::poly(
                    gens,
                    Type::Alias(AliasType {
                        id,
                        params: args,
                        target: Box::new(target),
                    }),
                );
                declared.types.push((name.to_string(), type_scheme.clone()));
                env.extend_type(name, type_scheme)
            }

            TypeDef::Abstract => {
                let type_scheme = Scheme::poly(gens, Type::Opaque(OpaqueType { id, params: args }));
                declared.types.push((name.to_string(), type_scheme.clone()));
                env.extend_type(name, type_scheme)
            }
        };

        log::debug!(
            "declared type {} with {} constructor(s)",
            name,
            declared.values.len()
        );
        Ok((env, declared))
    }

    fn lookup_decl_type(
        &mut self,
        env: &TypeEnv,
        syntax: &TypeSyntax,
        scope: &mut TypeVarScope,
        span: Span,
    ) -> InferResult<Type> {
        syntax.lookup(env, self, scope).map_err(|e| e.at(span))
    }

    /// Check declarations in order, recovering at each top-level declaration.
    ///
    /// A failing declaration is reported and skipped; later declarations are
    /// checked against the environment built so far. Display names are
    /// assigned once every declaration has been seen.
    pub fn check_program(&mut self, env: &TypeEnv, decls: &[Decl]) -> ProgramReport {
        let mut env = env.copy();
        let mut declared = Vec::new();
        let mut errors = Vec::new();

        for decl in decls {
            match self.infer_decl(&env, decl) {
                Ok((next, introduced)) => {
                    for (name, scheme) in &introduced.values {
                        log::debug!("{} : {}", name, scheme.body);
                    }
                    declared.extend(introduced.values);
                    env = next;
                }
                Err(err) => {
                    log::debug!("declaration rejected: {}", err);
                    errors.push(err);
                }
            }
        }

        self.normalize_display_names();
        ProgramReport {
            env,
            declared,
            errors,
        }
    }
}
