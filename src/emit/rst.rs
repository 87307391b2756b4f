//! Documentation emitter. One RST document per module, in two variants:
//! the full page (with CONTENTS) and the manual page (without).

use crate::model::{DeclKind, MethodDecl, Module, ObjectDecl, Signature};

use super::rst_file_warning;

/// How a signature is displayed at the VCL level.
#[derive(Clone, Copy, PartialEq)]
enum ProtoKind {
    Function,
    Object,
    Method,
}

pub fn emit(module: &Module, man: bool) -> String {
    let mut out = rst_file_warning();
    out.push_str(".. role:: ref(emphasis)\n\n");

    for decl in &module.declarations {
        match &decl.kind {
            DeclKind::Module => {
                out.push_str(&format!(
                    ".. _vmod_{}({}):\n\n",
                    module.name, module.man_section
                ));
                out.push_str(&module_head(module));
                out.push('\n');
                out.push_str(&decl.docs.join("\n"));
                out.push_str("\n\n");
                if !man {
                    out.push_str(&contents_section(module));
                }
                out.push('\n');
            }
            DeclKind::Prefix | DeclKind::Abi | DeclKind::Synopsis => {
                out.push('\n');
                out.push_str(&decl.docs.join("\n"));
                out.push_str("\n\n\n");
            }
            // Event documentation is never rendered; the parser warns
            // about it instead.
            DeclKind::Event { .. } => {}
            DeclKind::Function { proto } => {
                out.push_str(&format!(".. _func_{}:\n\n", proto.name));
                out.push_str(&proto_section(proto, ProtoKind::Function));
                out.push('\n');
                out.push_str(&decl.docs.join("\n"));
                out.push_str("\n\n\n");
            }
            DeclKind::Object(obj) => {
                out.push_str(&format!(
                    ".. _obj_{}:\n\n",
                    obj.constructor.name
                ));
                out.push_str(&object_head(obj, &decl.docs));
                out.push_str("\n\n\n");
            }
        }
    }

    if !module.copyright.is_empty() {
        out.push_str(&copyright_section(module));
    }
    out
}

fn rst_hdr(text: &str, below: char, above: Option<char>) -> String {
    let rule = |c: char| c.to_string().repeat(text.chars().count());
    let mut s = String::new();
    if let Some(c) = above {
        s.push_str(&rule(c));
        s.push('\n');
    }
    s.push_str(text);
    s.push('\n');
    s.push_str(&rule(below));
    s.push('\n');
    s
}

fn module_head(module: &Module) -> String {
    let mut s = rst_hdr(
        &format!("{}{}", module.prefix, module.name),
        '=',
        Some('='),
    );
    s.push('\n');
    s.push_str(&rst_hdr(&module.description, '-', Some('-')));
    s.push('\n');
    s.push_str(&format!(":Manual section: {}\n", module.man_section));

    if module.auto_synopsis {
        s.push('\n');
        s.push_str(&rst_hdr("SYNOPSIS", '=', None));
        s.push_str("\n\n::\n\n");
        s.push_str(&format!("   import {} [from \"path\"] ;\n", module.name));
        s.push_str("   \n");
        for decl in &module.declarations {
            match &decl.kind {
                DeclKind::Function { proto } => {
                    s.push_str(&synopsis_line(proto, ProtoKind::Function));
                }
                DeclKind::Object(obj) => {
                    s.push_str(&synopsis_line(&obj.constructor, ProtoKind::Object));
                    for m in &obj.methods {
                        s.push_str(&synopsis_line(&m.proto, ProtoKind::Method));
                    }
                }
                _ => {}
            }
        }
        s.push('\n');
    }
    s
}

fn synopsis_line(sig: &Signature, kind: ProtoKind) -> String {
    format!("{}\n  \n", vcl_proto(sig, kind, true, "   "))
}

fn object_head(obj: &ObjectDecl, docs: &[String]) -> String {
    let mut s = proto_section(&obj.constructor, ProtoKind::Object);
    s.push('\n');
    s.push_str(&docs.join("\n"));
    s.push_str("\n\n");
    for m in &obj.methods {
        s.push_str(&method_block(m));
    }
    s
}

fn method_block(m: &MethodDecl) -> String {
    let mut s = format!(".. _func_{}:\n\n", m.proto.name);
    s.push_str(&proto_section(&m.proto, ProtoKind::Method));
    s.push('\n');
    s.push_str(&m.docs.join("\n"));
    s.push_str("\n\n\n");
    s
}

/// Section header for one callable. The long form is used inline when it
/// fits; otherwise the short form heads the section and the long form
/// follows in a literal block.
fn proto_section(sig: &Signature, kind: ProtoKind) -> String {
    let long = vcl_proto(sig, kind, false, "");
    if long.len() < 60 {
        return rst_hdr(&long, '-', None);
    }
    let mut short = vcl_proto(sig, kind, true, "");
    if short.len() > 60 {
        short = format!("{}(...)", sig.name);
    }
    let mut s = rst_hdr(&short, '-', None);
    s.push_str("\n::\n\n");
    s.push_str(&vcl_proto(sig, kind, false, "   "));
    s.push('\n');
    s
}

/// The VCL-level prototype. The short form drops enum value sets and
/// defaults. Private-data arguments never appear.
fn vcl_proto(sig: &Signature, kind: ProtoKind, short: bool, pfx: &str) -> String {
    let pfx = if kind == ProtoKind::Method {
        pfx.repeat(2)
    } else {
        pfx.to_string()
    };
    let mut s = pfx.clone();
    match kind {
        ProtoKind::Object => {
            s.push_str(&format!("new x{} = ", sig.name));
            s.push_str(&sig.name);
        }
        ProtoKind::Method => {
            s.push_str(&sig.return_type.vcl());
            s.push(' ');
            s.push_str(&format!("x{}", sig.name));
        }
        ProtoKind::Function => {
            s.push_str(&sig.return_type.vcl());
            s.push(' ');
            s.push_str(&sig.name);
        }
    }
    s.push('(');

    let mut parts: Vec<String> = Vec::new();
    for arg in &sig.args {
        if arg.ctype.vtype.is_priv() {
            continue;
        }
        let mut t = if short {
            arg.ctype.vtype.name().to_string()
        } else {
            arg.ctype.vcl()
        };
        if let Some(n) = &arg.name {
            t.push(' ');
            t.push_str(n);
        }
        if !short {
            if let Some(d) = &arg.default {
                t.push('=');
                t.push_str(d);
            }
        }
        if arg.optional {
            t = format!("[{}]", t);
        }
        parts.push(t);
    }

    let joined = parts.join(", ");
    if !short && s.len() + joined.len() > 68 {
        let cont = format!(",\n{}{}", pfx, pfx);
        s.push('\n');
        s.push_str(&pfx);
        s.push_str(&pfx);
        s.push_str(&parts.join(&cont));
        s.push('\n');
        s.push_str(&pfx);
        s.push(')');
    } else {
        s.push_str(&joined);
        s.push(')');
    }
    s
}

fn contents_section(module: &Module) -> String {
    let mut entries: Vec<(String, String)> = Vec::new();
    let mut add = |label: String| {
        let key = label.splitn(2, '_').nth(1).unwrap_or(&label).to_string();
        entries.push((key, label));
    };
    for decl in &module.declarations {
        match &decl.kind {
            DeclKind::Function { proto } => add(format!("func_{}", proto.name)),
            DeclKind::Object(obj) => {
                add(format!("obj_{}", obj.constructor.name));
                for m in &obj.methods {
                    add(format!("func_{}", m.proto.name));
                }
            }
            _ => {}
        }
    }
    entries.sort();

    let mut s = rst_hdr("CONTENTS", '=', None);
    s.push('\n');
    for (_, label) in entries {
        s.push_str(&format!("* :ref:`{}`\n", label));
    }
    s.push('\n');
    s
}

fn copyright_section(module: &Module) -> String {
    let mut s = rst_hdr("COPYRIGHT", '=', None);
    s.push_str("\n::\n\n");
    let mut text = module.copyright.replace("\n#", "\n ");
    if let Some(rest) = text.strip_prefix("#-\n") {
        text = rest.to_string();
    } else if let Some(rest) = text.strip_prefix("#\n") {
        text = rest.to_string();
    }
    s.push_str(&text);
    s.push('\n');
    s
}
