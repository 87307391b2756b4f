//! Output generation. Three emitters share the parsed tree read-only:
//! C header, C glue, and RST documentation.

pub mod cglue;
pub mod header;
pub mod rst;

use crate::model::{Module, Signature};

fn file_warning(first: &str, mid: &str, last: &str) -> String {
    format!(
        "{}\n{} NB:  This file is machine generated, DO NOT EDIT!\n{}\n{} Edit vmod.vcc and run vmodgen instead\n{}\n\n",
        first, mid, mid, mid, last
    )
}

pub fn c_file_warning() -> String {
    file_warning("/*", " *", " */")
}

pub fn rst_file_warning() -> String {
    file_warning("..", "..", "..")
}

/// Wrap a C-prototype-like string at column 64, breaking after a comma or
/// opening parenthesis, continuation lines indented four spaces.
pub fn lwrap(proto: &str) -> String {
    const WIDTH: usize = 64;
    let mut lines: Vec<String> = Vec::new();
    let mut s = proto.to_string();
    let mut indent = "";
    while s.len() > WIDTH {
        let head = &s[..WIDTH];
        let brk = match head.rfind(',').or_else(|| head.rfind('(')) {
            Some(pos) => pos,
            None => break,
        };
        lines.push(format!("{}{}", indent, &s[..=brk]));
        s = s[brk + 1..].trim_start().to_string();
        indent = "    ";
    }
    if !s.is_empty() {
        lines.push(format!("{}{}", indent, s));
    }
    lines.join("\n") + "\n"
}

/// Length of a string with tabs expanded to 8-column stops.
pub fn expanded_len(s: &str) -> usize {
    let mut col = 0;
    for c in s.chars() {
        if c == '\t' {
            col = (col / 8 + 1) * 8;
        } else {
            col += 1;
        }
    }
    col
}

/// One member line of the function-pointer struct, typedef pointer name
/// tab-aligned to column 40.
pub fn cstruct_member(module_name: &str, c_name: &str) -> String {
    let mut a = format!("\ttd_{}_{}", module_name, c_name);
    while expanded_len(&a) < 40 {
        a.push('\t');
    }
    format!("{}*{};\n", a, c_name)
}

/// A full prototype line: return type, name, argument list. `extra` holds
/// the leading context arguments (VRT_CTX, object pointers). A signature
/// using the argument-struct convention takes a pointer to its generated
/// holder struct instead of positional arguments.
pub fn callable_proto(module: &Module, sig: &Signature, extra: &[&str], name: &str) -> String {
    let mut parts: Vec<String> = extra.iter().map(|s| s.to_string()).collect();
    if sig.uses_argstruct {
        parts.push(format!("{}*", module.argstruct_name(sig)));
    } else {
        for arg in &sig.args {
            parts.push(arg.ctype.ctype().to_string());
        }
    }
    format!(
        "{} {}({});",
        sig.return_type.ctype(),
        name,
        parts.join(", ")
    )
}

/// The typedef form of a prototype: `typedef <ret> td_<mod>_<cname>(...)`.
pub fn callable_typedef(module: &Module, sig: &Signature, extra: &[&str]) -> String {
    let td = format!("td_{}_{}", module.name, sig.c_name());
    format!("typedef {}", callable_proto(module, sig, extra, &td))
}

/// Definition of the argument-holder struct for a signature with optional
/// arguments: one validity flag per optional argument, then one typed field
/// per argument.
pub fn argstruct_def(module: &Module, sig: &Signature) -> String {
    let mut s = format!("\n{} {{\n", module.argstruct_name(sig));
    for arg in &sig.args {
        if arg.optional {
            s.push_str(&format!(
                "\tchar\t\t\tvalid_{};\n",
                arg.name.as_deref().expect("optional arguments are named")
            ));
        }
    }
    for (i, arg) in sig.args.iter().enumerate() {
        let ct = arg.ctype.ctype();
        s.push('\t');
        s.push_str(ct);
        if ct.len() < 8 {
            s.push('\t');
        }
        if ct.len() < 16 {
            s.push('\t');
        }
        s.push('\t');
        s.push_str(&arg.field_name(i + 1));
        s.push_str(";\n");
    }
    s.push_str("};\n");
    s
}
