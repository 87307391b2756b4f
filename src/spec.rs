//! Interface-spec records: the loader-facing ABI description embedded in the
//! generated C file.
//!
//! Each declaration becomes one or more records. A record is a single string
//! with NUL-separated fields; the whole table is terminated by a null
//! sentinel entry. Argument units are either a bare type tag, or — when the
//! argument carries a name, default, enum value set, or the optional flag —
//! an escape-coded sub-record introduced by the 0x01 escape byte, so decoded
//! names and values can never collide with plain type tags.
//!
//! Unit grammar:
//!
//! ```text
//! unit      = TYPE | ESC TYPE chunk*
//! chunk     = ESC ( 'N' name | 'D' default | 'E' literal | 'O' )
//! ```
//!
//! Both directions live here; the decoder exists so the encoding is testable
//! as a round trip and usable by loader-side tooling.

use crate::model::{Argument, CType, Module, DeclKind, Signature};

pub const ESC: char = '\u{1}';
pub const SEP: char = '\0';

/// Encoded records for a whole module, in declaration order, starting with
/// the `$VMOD` version header. Method, init and fini records follow their
/// `$OBJ` record; a decoder binds them to the most recent object.
pub fn records(module: &Module) -> Vec<String> {
    let mut out = vec![format!("$VMOD{}1.0", SEP)];
    let fstruct = module.func_struct();

    for decl in &module.declarations {
        match &decl.kind {
            DeclKind::Module | DeclKind::Prefix | DeclKind::Abi | DeclKind::Synopsis => {}
            DeclKind::Event { .. } => {
                out.push(format!("$EVENT{}{}._event", SEP, fstruct));
            }
            DeclKind::Function { proto } => {
                out.push(callable_record(
                    "$FUNC",
                    &format!("{}.{}", module.name, proto.name),
                    &format!("{}.{}", fstruct, proto.c_name()),
                    proto,
                ));
            }
            DeclKind::Object(obj) => {
                out.push(format!(
                    "$OBJ{sep}{}{sep}{}",
                    obj.constructor.name,
                    module.object_struct(obj),
                    sep = SEP
                ));
                let obj_vcl = format!("{}.{}", module.name, obj.constructor.name);
                out.push(callable_record(
                    "$INIT",
                    &obj_vcl,
                    &format!("{}.{}", fstruct, obj.init.c_name()),
                    &obj.init,
                ));
                out.push(callable_record(
                    "$FINI",
                    &obj_vcl,
                    &format!("{}.{}", fstruct, obj.fini.c_name()),
                    &obj.fini,
                ));
                for m in &obj.methods {
                    out.push(callable_record(
                        "$METHOD",
                        &format!("{}.{}", module.name, m.proto.name),
                        &format!("{}.{}", fstruct, m.proto.c_name()),
                        &m.proto,
                    ));
                }
            }
        }
    }
    out
}

fn callable_record(tag: &str, vcl_name: &str, cfunc: &str, sig: &Signature) -> String {
    let mut fields = vec![
        tag.to_string(),
        vcl_name.to_string(),
        cfunc.to_string(),
        encode_type(&sig.return_type),
    ];
    for arg in &sig.args {
        fields.push(encode_arg(arg));
    }
    fields.join(&SEP.to_string())
}

/// Encode a bare type annotation (return types).
pub fn encode_type(ctype: &CType) -> String {
    encode_unit(ctype, None, None, false)
}

/// Encode one argument unit.
pub fn encode_arg(arg: &Argument) -> String {
    encode_unit(&arg.ctype, arg.name.as_deref(), arg.default.as_deref(), arg.optional)
}

fn encode_unit(ctype: &CType, name: Option<&str>, default: Option<&str>, optional: bool) -> String {
    let tag = ctype.vtype.name();
    if name.is_none() && default.is_none() && ctype.enum_values.is_empty() && !optional {
        return tag.to_string();
    }
    let mut s = format!("{}{}", ESC, tag);
    if let Some(n) = name {
        s.push(ESC);
        s.push('N');
        s.push_str(n);
    }
    if let Some(d) = default {
        s.push(ESC);
        s.push('D');
        s.push_str(d);
    }
    for lit in &ctype.enum_values {
        s.push(ESC);
        s.push('E');
        s.push_str(lit);
    }
    if optional {
        s.push(ESC);
        s.push('O');
    }
    s
}

/// A decoded argument unit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedArg {
    pub vtype: String,
    pub name: Option<String>,
    pub default: Option<String>,
    pub enum_values: Vec<String>,
    pub optional: bool,
}

/// Decode one argument unit. `None` on a malformed unit.
pub fn decode_arg(unit: &str) -> Option<DecodedArg> {
    let Some(rest) = unit.strip_prefix(ESC) else {
        if unit.is_empty() || unit.contains(ESC) {
            return None;
        }
        return Some(DecodedArg {
            vtype: unit.to_string(),
            ..DecodedArg::default()
        });
    };

    let mut chunks = rest.split(ESC);
    let vtype = chunks.next()?.to_string();
    if vtype.is_empty() {
        return None;
    }
    let mut decoded = DecodedArg {
        vtype,
        ..DecodedArg::default()
    };
    for chunk in chunks {
        let mut chars = chunk.chars();
        match chars.next()? {
            'N' => decoded.name = Some(chars.as_str().to_string()),
            'D' => decoded.default = Some(chars.as_str().to_string()),
            'E' => decoded.enum_values.push(chars.as_str().to_string()),
            'O' if chars.as_str().is_empty() => decoded.optional = true,
            _ => return None,
        }
    }
    Some(decoded)
}

/// Split a record into its NUL-separated fields.
pub fn record_fields(record: &str) -> Vec<&str> {
    record.split(SEP).collect()
}
