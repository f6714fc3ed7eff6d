//! Resolution of written type syntax into type terms.

use std::collections::{BTreeMap, HashMap};

use crate::error::TypeError;
use crate::syntax::TypeSyntax;
use crate::types::{RecordType, Type};

use super::env::TypeEnv;
use super::registry::Registry;
use super::unify::UnifyResult;

/// How type-variable labels (`'a`) are resolved during a lookup.
#[derive(Debug, Clone)]
pub enum TypeVarScope {
    /// Annotations: each distinct label mints one fresh unification variable
    /// on first occurrence and reuses it afterwards.
    Flexible(HashMap<String, Type>),
    /// Type declarations: only the declared parameters are in scope.
    Fixed(HashMap<String, Type>),
}

impl TypeVarScope {
    pub fn flexible() -> Self {
        TypeVarScope::Flexible(HashMap::new())
    }

    pub fn fixed(params: impl IntoIterator<Item = (String, Type)>) -> Self {
        TypeVarScope::Fixed(params.into_iter().collect())
    }

    fn resolve(&mut self, label: &str, registry: &mut Registry) -> UnifyResult<Type> {
        match self {
            TypeVarScope::Flexible(vars) => Ok(vars
                .entry(label.to_string())
                .or_insert_with(|| registry.fresh_var())
                .clone()),
            TypeVarScope::Fixed(vars) => {
                vars.get(label)
                    .cloned()
                    .ok_or_else(|| TypeError::UnboundTypeVariable {
                        label: label.to_string(),
                    })
            }
        }
    }

    fn is_fixed(&self) -> bool {
        matches!(self, TypeVarScope::Fixed(_))
    }
}

/// Primitive type for a built-in type name.
fn primitive_named(name: &str) -> Option<Type> {
    match name {
        "int" => Some(Type::Int),
        "float" => Some(Type::Float),
        "bool" => Some(Type::Bool),
        "string" => Some(Type::String),
        "char" => Some(Type::Char),
        "unit" => Some(Type::Unit),
        _ => None,
    }
}

impl TypeSyntax {
    /// Resolve this syntax against the type-constructor table of `env`.
    pub fn lookup(
        &self,
        env: &TypeEnv,
        registry: &mut Registry,
        scope: &mut TypeVarScope,
    ) -> UnifyResult<Type> {
        match self {
            TypeSyntax::Named(name) => {
                apply_constructor(env, registry, name, Vec::new(), scope.is_fixed())
            }

            TypeSyntax::Var(label) => scope.resolve(label, registry),

            TypeSyntax::App(name, args) => {
                let args = args
                    .iter()
                    .map(|arg| arg.lookup(env, registry, scope))
                    .collect::<UnifyResult<Vec<_>>>()?;
                apply_constructor(env, registry, name, args, scope.is_fixed())
            }

            TypeSyntax::Arrow(param, ret) => {
                let param = param.lookup(env, registry, scope)?;
                let ret = ret.lookup(env, registry, scope)?;
                Ok(Type::func(param, ret))
            }

            TypeSyntax::Tuple(elements) => {
                let elements = elements
                    .iter()
                    .map(|e| e.lookup(env, registry, scope))
                    .collect::<UnifyResult<Vec<_>>>()?;
                Ok(Type::tuple(elements))
            }

            TypeSyntax::Record { fields, open } => {
                let mut resolved = BTreeMap::new();
                for (label, syntax) in fields {
                    let ty = syntax.lookup(env, registry, scope)?;
                    if resolved.insert(label.clone(), ty).is_some() {
                        return Err(TypeError::DuplicateField {
                            field: label.clone(),
                        });
                    }
                }
                let tail = match (open, scope.is_fixed()) {
                    (false, _) => Type::EmptyRow,
                    // Declared rows stay open per use
                    (true, true) => Type::Gen(registry.fresh_generalized()),
                    (true, false) => registry.fresh_var(),
                };
                Ok(Type::Record(RecordType {
                    fields: resolved,
                    tail: Box::new(tail),
                }))
            }
        }
    }
}

fn apply_constructor(
    env: &TypeEnv,
    registry: &mut Registry,
    name: &str,
    args: Vec<Type>,
    in_declaration: bool,
) -> UnifyResult<Type> {
    match env.lookup_type(name) {
        Ok(scheme) => {
            let scheme = scheme.clone();
            if in_declaration {
                registry.instantiate_declared(name, &scheme, args)
            } else {
                registry.instantiate_with(name, &scheme, args)
            }
        }
        Err(err) => match primitive_named(name) {
            Some(ty) if args.is_empty() => Ok(ty),
            Some(_) => Err(TypeError::TypeArity {
                name: name.to_string(),
                expected: 0,
                found: args.len(),
            }),
            None => Err(err),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GenId, Scheme, TypeId};

    fn named(name: &str) -> TypeSyntax {
        TypeSyntax::Named(name.to_string())
    }

    fn var(label: &str) -> TypeSyntax {
        TypeSyntax::Var(label.to_string())
    }

    fn option_env(registry: &mut Registry) -> (TypeEnv, TypeId) {
        let id = registry.fresh_type_id();
        let g = registry.fresh_generalized();
        let body = Type::variant(id, vec![("a".to_string(), Type::Gen(g))]);
        (
            TypeEnv::empty().extend_type("option", Scheme::poly(vec![g], body)),
            id,
        )
    }

    #[test]
    fn test_primitives_without_table() {
        let mut registry = Registry::new();
        let mut scope = TypeVarScope::flexible();
        let ty = TypeSyntax::Arrow(Box::new(named("int")), Box::new(named("bool")))
            .lookup(&TypeEnv::empty(), &mut registry, &mut scope)
            .unwrap();
        assert_eq!(ty, Type::func(Type::Int, Type::Bool));
    }

    #[test]
    fn test_flexible_labels_are_shared() {
        let mut registry = Registry::new();
        let mut scope = TypeVarScope::flexible();
        let ty = TypeSyntax::Arrow(Box::new(var("a")), Box::new(var("a")))
            .lookup(&TypeEnv::empty(), &mut registry, &mut scope)
            .unwrap();
        let Type::Func(param, ret) = ty else {
            panic!("expected function");
        };
        assert!(param.is_var());
        assert_eq!(param, ret);
    }

    #[test]
    fn test_fixed_scope_rejects_unknown_label() {
        let mut registry = Registry::new();
        let mut scope = TypeVarScope::fixed([("a".to_string(), Type::Gen(GenId(0)))]);
        assert_eq!(
            var("a")
                .lookup(&TypeEnv::empty(), &mut registry, &mut scope)
                .unwrap(),
            Type::Gen(GenId(0))
        );
        assert!(matches!(
            var("b").lookup(&TypeEnv::empty(), &mut registry, &mut scope),
            Err(TypeError::UnboundTypeVariable { .. })
        ));
    }

    #[test]
    fn test_application() {
        let mut registry = Registry::new();
        let (env, id) = option_env(&mut registry);
        let mut scope = TypeVarScope::flexible();
        let ty = TypeSyntax::App("option".to_string(), vec![named("int")])
            .lookup(&env, &mut registry, &mut scope)
            .unwrap();
        assert_eq!(ty, Type::variant(id, vec![("a".to_string(), Type::Int)]));
    }

    #[test]
    fn test_wrong_number_of_arguments() {
        let mut registry = Registry::new();
        let (env, _) = option_env(&mut registry);
        let mut scope = TypeVarScope::flexible();
        assert!(matches!(
            named("option").lookup(&env, &mut registry, &mut scope),
            Err(TypeError::TypeArity { expected: 1, found: 0, .. })
        ));
        assert!(matches!(
            TypeSyntax::App("int".to_string(), vec![named("bool")]).lookup(
                &env,
                &mut registry,
                &mut scope
            ),
            Err(TypeError::TypeArity { expected: 0, found: 1, .. })
        ));
    }

    #[test]
    fn test_unknown_constructor() {
        let mut registry = Registry::new();
        let mut scope = TypeVarScope::flexible();
        assert!(matches!(
            named("color").lookup(&TypeEnv::empty(), &mut registry, &mut scope),
            Err(TypeError::UnboundTypeConstructor { .. })
        ));
    }

    #[test]
    fn test_records() {
        let mut registry = Registry::new();
        let mut scope = TypeVarScope::flexible();
        let open = TypeSyntax::Record {
            fields: vec![("x".to_string(), named("int"))],
            open: true,
        }
        .lookup(&TypeEnv::empty(), &mut registry, &mut scope)
        .unwrap();
        let (_, tail) = registry.flatten_record(&open);
        assert!(tail.is_var());

        let duplicate = TypeSyntax::Record {
            fields: vec![
                ("x".to_string(), named("int")),
                ("x".to_string(), named("bool")),
            ],
            open: false,
        };
        assert!(matches!(
            duplicate.lookup(&TypeEnv::empty(), &mut registry, &mut scope),
            Err(TypeError::DuplicateField { .. })
        ));
    }
}
