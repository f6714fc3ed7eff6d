//! Built-in types and operators.
//!
//! This module provides the initial type environment:
//! - Primitive type names (`int`, `float`, `bool`, `string`, `char`, `unit`)
//! - The `option` and `list` variants with their constructors
//! - Arithmetic, comparison and pair operators

use crate::infer::{Registry, TypeEnv};
use crate::types::{ConstructorType, GenId, Scheme, Type};

/// Create the initial type environment with built-in bindings.
///
/// The nominal identities of `option` and `list` are issued by `registry`,
/// so the environment belongs to that registry's compilation unit.
pub fn initial_env(registry: &mut Registry) -> TypeEnv {
    let mut env = TypeEnv::empty();

    for (name, ty) in [
        ("int", Type::Int),
        ("float", Type::Float),
        ("bool", Type::Bool),
        ("string", Type::String),
        ("char", Type::Char),
        ("unit", Type::Unit),
    ] {
        env.add_type(name, Scheme::mono(ty));
    }

    // type 'a option = None | Some of 'a
    let a = registry.fresh_generalized();
    let option = Type::variant(registry.fresh_type_id(), vec![("a".to_string(), Type::Gen(a))]);
    env.add_type("option", Scheme::poly(vec![a], option.clone()));
    add_constructor(&mut env, a, "None", &option, None);
    add_constructor(&mut env, a, "Some", &option, Some(Type::Gen(a)));

    // type 'a list = Nil | Cons of 'a * 'a list
    let a = registry.fresh_generalized();
    let list = Type::variant(registry.fresh_type_id(), vec![("a".to_string(), Type::Gen(a))]);
    env.add_type("list", Scheme::poly(vec![a], list.clone()));
    add_constructor(&mut env, a, "Nil", &list, None);
    add_constructor(
        &mut env,
        a,
        "Cons",
        &list,
        Some(Type::Tuple(vec![Type::Gen(a), list.clone()])),
    );

    // Integer arithmetic
    for op in ["+", "-", "*", "/"] {
        env.add_binding(op, binary(Type::Int, Type::Int));
    }
    env.add_binding("+.", binary(Type::Float, Type::Float));
    env.add_binding("^", binary(Type::String, Type::String));

    // Polymorphic comparison
    for op in ["=", "<"] {
        let a = registry.fresh_generalized();
        env.add_binding(op, Scheme::poly(vec![a], binary_of(Type::Gen(a), Type::Bool)));
    }
    env.add_binding("not", Scheme::mono(Type::func(Type::Bool, Type::Bool)));

    // Pairs
    let a = registry.fresh_generalized();
    let b = registry.fresh_generalized();
    let pair = Type::Tuple(vec![Type::Gen(a), Type::Gen(b)]);
    env.add_binding(
        "fst",
        Scheme::poly(vec![a, b], Type::func(pair.clone(), Type::Gen(a))),
    );
    env.add_binding(
        "snd",
        Scheme::poly(vec![a, b], Type::func(pair, Type::Gen(b))),
    );

    env
}

fn add_constructor(env: &mut TypeEnv, param: GenId, name: &str, owner: &Type, arg: Option<Type>) {
    let ctor = Type::Constructor(ConstructorType {
        name: name.to_string(),
        owner: Box::new(owner.clone()),
        arg: arg.map(Box::new),
    });
    env.add_binding(name, Scheme::poly(vec![param], ctor));
}

/// `t -> t -> ret`, monomorphic.
fn binary(operand: Type, ret: Type) -> Scheme {
    Scheme::mono(binary_of(operand, ret))
}

fn binary_of(operand: Type, ret: Type) -> Type {
    Type::func_n([operand.clone(), operand], ret)
}
