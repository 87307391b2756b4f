//! Parsed representation of a .vcc module — immutable once parsing is done,
//! read by all emitters.

use std::collections::BTreeSet;

use crate::types::VccType;

/// A resolved type annotation. `enum_values` is populated only for ENUM
/// arguments declared with a `{ ... }` value set.
#[derive(Debug, Clone)]
pub struct CType {
    pub vtype: VccType,
    pub enum_values: Vec<String>,
}

impl CType {
    pub fn plain(vtype: VccType) -> Self {
        CType {
            vtype,
            enum_values: Vec::new(),
        }
    }

    pub fn void() -> Self {
        CType::plain(VccType::Void)
    }

    pub fn ctype(&self) -> &'static str {
        self.vtype.ctype()
    }

    /// VCL-level spelling: `ENUM {a, b}` when a value set is present,
    /// otherwise the bare type name.
    pub fn vcl(&self) -> String {
        if self.enum_values.is_empty() {
            self.vtype.name().to_string()
        } else {
            format!("{} {{{}}}", self.vtype.name(), self.enum_values.join(", "))
        }
    }
}

/// One parameter of a signature.
#[derive(Debug, Clone)]
pub struct Argument {
    pub ctype: CType,
    pub name: Option<String>,
    pub default: Option<String>,
    pub optional: bool,
}

impl Argument {
    /// Field name in a generated argument struct. Anonymous arguments get a
    /// positional name; `index` is 1-based.
    pub fn field_name(&self, index: usize) -> String {
        match &self.name {
            Some(n) => n.clone(),
            None => format!("arg{}", index),
        }
    }
}

/// A function, method, or constructor prototype.
#[derive(Debug, Clone)]
pub struct Signature {
    /// Name as written in the source: `add`, or `.get` for methods.
    pub base_name: String,
    /// Fully qualified within the module: methods carry their object's name
    /// (`thing.get`).
    pub name: String,
    pub return_type: CType,
    pub args: Vec<Argument>,
    /// True once any optional argument was parsed; the calling convention
    /// then uses a generated argument-holder struct instead of positional
    /// arguments.
    pub uses_argstruct: bool,
}

impl Signature {
    /// The bare C identifier derived from `name`.
    pub fn c_name(&self) -> String {
        self.name.replace('.', "_")
    }
}

#[derive(Debug)]
pub struct MethodDecl {
    pub proto: Signature,
    pub docs: Vec<String>,
}

#[derive(Debug)]
pub struct ObjectDecl {
    /// The constructor as declared (`$Object thing(STRING name)`), return
    /// type fixed to VOID.
    pub constructor: Signature,
    /// Synthesized `<name>__init` — the constructor under its C entry name.
    pub init: Signature,
    /// Synthesized `<name>__fini` — no arguments, VOID.
    pub fini: Signature,
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug)]
pub enum DeclKind {
    Module,
    Prefix,
    Abi,
    Synopsis,
    Event { name: String },
    Function { proto: Signature },
    Object(Box<ObjectDecl>),
}

/// One stanza from the input, in source order, with its attached
/// documentation text.
#[derive(Debug)]
pub struct Declaration {
    pub kind: DeclKind,
    pub docs: Vec<String>,
    pub line: u32,
}

/// The root of the parse tree.
#[derive(Debug)]
pub struct Module {
    pub name: String,
    pub man_section: String,
    pub description: String,
    /// Symbol prefix for generated C names, `vmod_` unless `$Prefix`.
    pub prefix: String,
    pub strict_abi: bool,
    pub auto_synopsis: bool,
    /// Comment block preceding the first stanza, reproduced in the docs.
    pub copyright: String,
    /// Every distinct enum literal seen anywhere in the module, sorted.
    pub enums: BTreeSet<String>,
    pub declarations: Vec<Declaration>,
}

impl Module {
    /// Name of the function-pointer struct: `Vmod_<name>_Func`.
    pub fn func_struct(&self) -> String {
        format!("Vmod_{}_Func", self.name)
    }

    /// Opaque C struct name for an object: `struct vmod_<mod>_<obj>`.
    pub fn object_struct(&self, obj: &ObjectDecl) -> String {
        format!("struct {}{}_{}", self.prefix, self.name, obj.constructor.name)
    }

    /// Exported C symbol for a signature: prefix + C name.
    pub fn symbol(&self, sig: &Signature) -> String {
        format!("{}{}", self.prefix, sig.c_name())
    }

    /// Name of the generated argument-holder struct for a signature.
    pub fn argstruct_name(&self, sig: &Signature) -> String {
        format!("struct {}{}_arg", self.prefix, sig.c_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(name: &str) -> Signature {
        Signature {
            base_name: name.to_string(),
            name: name.to_string(),
            return_type: CType::void(),
            args: Vec::new(),
            uses_argstruct: false,
        }
    }

    #[test]
    fn c_name_replaces_dots() {
        let s = Signature {
            name: "thing.get".to_string(),
            ..sig(".get")
        };
        assert_eq!(s.c_name(), "thing_get");
    }

    #[test]
    fn enum_vcl_spelling() {
        let ct = CType {
            vtype: VccType::Enum,
            enum_values: vec!["one".into(), "two".into()],
        };
        assert_eq!(ct.vcl(), "ENUM {one, two}");
        assert_eq!(CType::plain(VccType::Int).vcl(), "INT");
    }

    #[test]
    fn anonymous_argument_field_name() {
        let a = Argument {
            ctype: CType::plain(VccType::Int),
            name: None,
            default: None,
            optional: false,
        };
        assert_eq!(a.field_name(2), "arg2");
    }
}
