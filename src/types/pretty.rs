//! Pretty-printing for types.
//!
//! Types print in ML notation: `int -> bool`, `int * string`,
//! `{x: int, ..'_a}`, `(int, bool) result`. Nominal types need the
//! type-constructor table of an environment to print by name, and
//! unification variables need the registry to print their display names.

use std::collections::HashMap;
use std::fmt::{self, Display, Write};

use crate::infer::{Registry, TypeEnv};

use super::ty::{GenId, Scheme, Type, TypeArgs, TypeId, VarId};

/// Binding strength of the position a type is printed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Arrow,
    Tuple,
    Atom,
}

/// Context for pretty-printing, tracking generalized-variable names.
pub struct PrettyContext<'a> {
    registry: Option<&'a Registry>,
    env: Option<&'a TypeEnv>,
    gen_names: HashMap<GenId, String>,
    next_name: usize,
}

impl<'a> PrettyContext<'a> {
    /// A context with no registry or environment: variables print by id and
    /// nominal types as `#<id>`.
    pub fn new() -> Self {
        PrettyContext {
            registry: None,
            env: None,
            gen_names: HashMap::new(),
            next_name: 0,
        }
    }

    /// Resolve variables through `registry` before printing.
    pub fn with_registry(mut self, registry: &'a Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Print nominal types by their names in `env`.
    pub fn with_env(mut self, env: &'a TypeEnv) -> Self {
        self.env = Some(env);
        self
    }

    fn gen_name(&mut self, id: GenId) -> String {
        if let Some(name) = self.gen_names.get(&id) {
            return name.clone();
        }
        let name = self.generate_name();
        self.gen_names.insert(id, name.clone());
        name
    }

    /// a, b, ..., z, a1, b1, ..., z1, a2, ...
    fn generate_name(&mut self) -> String {
        let idx = self.next_name;
        self.next_name += 1;

        let letter = char::from(b'a' + (idx % 26) as u8);
        if idx < 26 {
            letter.to_string()
        } else {
            format!("{}{}", letter, idx / 26)
        }
    }

    /// Format a type to a string.
    pub fn format_type(&mut self, ty: &Type) -> String {
        let ty = match self.registry {
            Some(registry) => registry.resolve_deep(ty),
            None => ty.clone(),
        };
        let mut s = String::new();
        // Writing into a String cannot fail
        let _ = self.write_type(&mut s, &ty, Prec::Arrow);
        s
    }

    /// Format a type scheme. Quantifiers are named in order; the scheme is
    /// printed as its body.
    pub fn format_scheme(&mut self, scheme: &Scheme) -> String {
        for var in &scheme.vars {
            self.gen_name(*var);
        }
        self.format_type(&scheme.body)
    }

    fn write_type<W: Write>(&mut self, w: &mut W, ty: &Type, prec: Prec) -> fmt::Result {
        match ty {
            Type::Int => write!(w, "int"),
            Type::Float => write!(w, "float"),
            Type::Bool => write!(w, "bool"),
            Type::String => write!(w, "string"),
            Type::Char => write!(w, "char"),
            Type::Unit => write!(w, "unit"),

            Type::Var(id) => self.write_var(w, *id),
            Type::Gen(id) => {
                let name = self.gen_name(*id);
                write!(w, "'{}", name)
            }

            Type::Func(arg, ret) => self.write_arrow(w, arg, ret, prec),

            Type::Tuple(elements) => {
                if prec > Prec::Tuple {
                    write!(w, "(")?;
                }
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(w, " * ")?;
                    }
                    self.write_type(w, element, Prec::Atom)?;
                }
                if prec > Prec::Tuple {
                    write!(w, ")")?;
                }
                Ok(())
            }

            Type::Record(_) | Type::EmptyRow => self.write_record(w, ty),

            Type::Variant(variant) => self.write_nominal(w, variant.id, &variant.args),
            Type::Alias(alias) => self.write_nominal(w, alias.id, &alias.params),
            Type::Opaque(opaque) => self.write_nominal(w, opaque.id, &opaque.params),

            Type::Constructor(ctor) => match &ctor.arg {
                Some(arg) => self.write_arrow(w, arg, &ctor.owner, prec),
                None => self.write_type(w, &ctor.owner, prec),
            },

            Type::Module(module) => write!(w, "module {}", module.name),
        }
    }

    fn write_var<W: Write>(&mut self, w: &mut W, id: VarId) -> fmt::Result {
        match self.registry.and_then(|r| r.display_name(id)) {
            Some(name) => write!(w, "'_{}", name),
            None => write!(w, "'_t{}", id.0),
        }
    }

    fn write_arrow<W: Write>(&mut self, w: &mut W, arg: &Type, ret: &Type, prec: Prec) -> fmt::Result {
        if prec > Prec::Arrow {
            write!(w, "(")?;
        }
        self.write_type(w, arg, Prec::Tuple)?;
        write!(w, " -> ")?;
        self.write_type(w, ret, Prec::Arrow)?;
        if prec > Prec::Arrow {
            write!(w, ")")?;
        }
        Ok(())
    }

    fn write_record<W: Write>(&mut self, w: &mut W, ty: &Type) -> fmt::Result {
        let mut fields = Vec::new();
        let mut tail = ty;
        while let Type::Record(record) = tail {
            fields.extend(record.fields.iter());
            tail = record.tail.as_ref();
        }
        fields.sort_by(|a, b| a.0.cmp(b.0));

        write!(w, "{{")?;
        for (i, (name, field)) in fields.iter().enumerate() {
            if i > 0 {
                write!(w, ", ")?;
            }
            write!(w, "{}: ", name)?;
            self.write_type(w, field, Prec::Arrow)?;
        }
        if !matches!(tail, Type::EmptyRow) {
            if !fields.is_empty() {
                write!(w, ", ")?;
            }
            write!(w, "..")?;
            self.write_type(w, tail, Prec::Atom)?;
        }
        write!(w, "}}")
    }

    fn write_nominal<W: Write>(&mut self, w: &mut W, id: TypeId, args: &TypeArgs) -> fmt::Result {
        match args.as_slice() {
            [] => {}
            [(_, arg)] => {
                self.write_type(w, arg, Prec::Atom)?;
                write!(w, " ")?;
            }
            _ => {
                write!(w, "(")?;
                for (i, (_, arg)) in args.iter().enumerate() {
                    if i > 0 {
                        write!(w, ", ")?;
                    }
                    self.write_type(w, arg, Prec::Arrow)?;
                }
                write!(w, ") ")?;
            }
        }
        match self.env.and_then(|env| env.type_name_of(id)) {
            Some(name) => write!(w, "{}", name),
            None => write!(w, "#{}", id.0),
        }
    }
}

impl Default for PrettyContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Display implementation for types using a fresh context.
impl Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ctx = PrettyContext::new();
        write!(f, "{}", ctx.format_type(self))
    }
}

impl Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ctx = PrettyContext::new();
        write!(f, "{}", ctx.format_scheme(self))
    }
}
