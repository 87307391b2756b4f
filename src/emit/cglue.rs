//! C glue emitter: typedefs, the function-pointer struct and its
//! initializer, the prototype text as a C string, the interface-spec table,
//! the JSON metadata blob, and the module descriptor record.

use serde_json::{json, Value};

use crate::model::{DeclKind, Module, ObjectDecl, Signature};
use crate::spec;

use super::{argstruct_def, c_file_warning, callable_typedef, cstruct_member, lwrap};

/// Emit the complete glue file. `output_prefix` names the companion header;
/// `file_id` is the per-build random identifier for the descriptor record.
pub fn emit(module: &Module, output_prefix: &str, file_id: &str) -> String {
    let mut out = c_file_warning();
    // The proto stream: the same typedefs and structs again, re-emitted as a
    // C string for inclusion in compiled VCL programs.
    let mut proto = String::new();

    out.push_str("#include \"config.h\"\n");
    out.push_str("#include <stdio.h>\n");
    for inc in ["vdef", "vrt", header_base(output_prefix), "vmod_abi"] {
        out.push_str(&format!("#include \"{}.h\"\n", inc));
    }
    out.push('\n');

    for lit in &module.enums {
        out.push_str(&format!(
            "VCL_ENUM {pfx}enum_{lit} = \"{lit}\";\n",
            pfx = module.prefix,
            lit = lit
        ));
    }
    out.push('\n');

    for decl in &module.declarations {
        if let DeclKind::Object(obj) = &decl.kind {
            out.push_str(&object_typedefs(module, obj, false));
            proto.push_str(&object_typedefs(module, obj, true));
        }
    }

    proto.push_str("/* Functions */\n");
    for decl in &module.declarations {
        if let DeclKind::Function { proto: sig } = &decl.kind {
            out.push_str(&lwrap(&callable_typedef(module, sig, &["VRT_CTX"])));
            if sig.uses_argstruct {
                proto.push_str(&argstruct_def(module, sig));
            }
            proto.push_str(&lwrap(&callable_typedef(module, sig, &["VRT_CTX"])));
        }
    }

    let cstruct = func_struct_def(module);
    out.push_str(&cstruct);
    proto.push_str(&cstruct);

    out.push_str(&format!("\n/*lint -esym(754, {}::*) */\n", module.func_struct()));
    out.push_str(&func_struct_init(module));

    out.push_str("\nstatic const char Vmod_Proto[] =\n");
    for line in proto.lines() {
        out.push_str(&format!("\t\"{}\\n\"\n", c_escape(line)));
    }
    out.push_str(&format!(
        "\t\"static struct {fs} {fs};\";\n",
        fs = module.func_struct()
    ));

    out.push_str(&spec_table(module));
    out.push_str(&json_blob(module));
    out.push_str(&descriptor(module, file_id));
    out
}

/// File-name component of the output prefix. The prefix may carry
/// directories, but the include in the generated C must not.
fn header_base(output_prefix: &str) -> &str {
    output_prefix
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(output_prefix)
}

fn object_typedefs(module: &Module, obj: &ObjectDecl, with_argstruct: bool) -> String {
    let sn = module.object_struct(obj);
    let handle = format!("{} **", sn);
    let this = format!("{} *", sn);

    let mut s = format!("/* Object {} */\n", obj.constructor.name);
    s.push_str(&format!("{};\n", sn));
    if with_argstruct && obj.init.uses_argstruct {
        s.push_str(&argstruct_def(module, &obj.init));
    }
    s.push_str(&lwrap(&callable_typedef(
        module,
        &obj.init,
        &["VRT_CTX", &handle, "const char *"],
    )));
    s.push_str(&lwrap(&callable_typedef(module, &obj.fini, &[&handle])));
    for m in &obj.methods {
        if with_argstruct && m.proto.uses_argstruct {
            s.push_str(&argstruct_def(module, &m.proto));
        }
        s.push_str(&lwrap(&callable_typedef(module, &m.proto, &["VRT_CTX", &this])));
    }
    s.push('\n');
    s
}

fn func_struct_def(module: &Module) -> String {
    let mut s = format!("\nstruct {} {{\n", module.func_struct());
    for decl in &module.declarations {
        match &decl.kind {
            DeclKind::Module | DeclKind::Prefix | DeclKind::Abi | DeclKind::Synopsis => {}
            DeclKind::Event { .. } => {
                s.push_str("\tvmod_event_f\t\t\t*_event;\n");
            }
            DeclKind::Function { proto } => {
                s.push_str(&cstruct_member(&module.name, &proto.c_name()));
            }
            DeclKind::Object(obj) => {
                s.push_str(&cstruct_member(&module.name, &obj.init.c_name()));
                s.push_str(&cstruct_member(&module.name, &obj.fini.c_name()));
                for m in &obj.methods {
                    s.push_str(&cstruct_member(&module.name, &m.proto.c_name()));
                }
            }
        }
    }
    for lit in &module.enums {
        s.push_str(&format!("\tVCL_ENUM\t\t\t*enum_{};\n", lit));
    }
    s.push_str("};\n");
    s
}

fn func_struct_init(module: &Module) -> String {
    let mut s = format!("\nstatic const struct {} Vmod_Func = {{\n", module.func_struct());
    for decl in &module.declarations {
        match &decl.kind {
            DeclKind::Module | DeclKind::Prefix | DeclKind::Abi | DeclKind::Synopsis => {}
            DeclKind::Event { name } => {
                s.push_str(&format!("\t{},\n", name));
            }
            DeclKind::Function { proto } => {
                s.push_str(&format!("\t{},\n", module.symbol(proto)));
            }
            DeclKind::Object(obj) => {
                s.push_str(&format!("\t{},\n", module.symbol(&obj.init)));
                s.push_str(&format!("\t{},\n", module.symbol(&obj.fini)));
                for m in &obj.methods {
                    s.push_str(&format!("\t{},\n", module.symbol(&m.proto)));
                }
            }
        }
    }
    s.push('\n');
    for lit in &module.enums {
        s.push_str(&format!("\t&{}enum_{},\n", module.prefix, lit));
    }
    s.push_str("};\n");
    s
}

// -- Spec table ---------------------------------------------------------------

fn spec_table(module: &Module) -> String {
    let mut s = format!("\nstatic const char * const Vmod_{}_Spec[] = {{\n", module.name);
    for record in spec::records(module) {
        s.push_str(&format!("\t\"{}\",\n", c_escape(&record)));
    }
    s.push_str("\t0\n};\n");
    s
}

/// Escape a record for inclusion in a C string literal. NUL and the spec
/// escape byte become three-digit octal escapes, so a following digit can
/// never extend them.
fn c_escape(text: &str) -> String {
    let mut s = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\0' => s.push_str("\\000"),
            '\u{1}' => s.push_str("\\001"),
            '"' => s.push_str("\\\""),
            '\\' => s.push_str("\\\\"),
            c => s.push(c),
        }
    }
    s
}

// -- JSON metadata ------------------------------------------------------------

fn json_blob(module: &Module) -> String {
    let value = json_value(module);
    let compact = serde_json::to_string(&value).expect("serializing metadata");

    let mut bytes: Vec<u8> = compact.clone().into_bytes();
    bytes.push(0);

    let mut s = format!(
        "\nstatic const char Vmod_{}_Json[{}] = {{\n",
        module.name,
        bytes.len()
    );
    let mut row = String::from("\t");
    for b in &bytes {
        row.push_str(&format!("{},", b));
        if row.len() >= 69 {
            s.push_str(&row);
            s.push('\n');
            row = String::from("\t");
        }
    }
    if row.len() > 1 {
        row.pop(); // trailing comma
        s.push_str(&row);
    }
    s.push_str("\n};\n\n");

    let pretty = serde_json::to_string_pretty(&value).expect("serializing metadata");
    for line in pretty.lines() {
        let commented = format!("// {}", line);
        if commented.chars().count() > 72 {
            // Truncate by characters, not bytes; defaults may carry
            // multibyte text.
            s.extend(commented.chars().take(72));
            s.push_str("[...]\n");
        } else {
            s.push_str(&commented);
            s.push('\n');
        }
    }
    s.push('\n');
    s
}

fn json_value(module: &Module) -> Value {
    let fstruct = module.func_struct();
    let mut records = vec![json!(["$VMOD", "1.0"])];
    for decl in &module.declarations {
        match &decl.kind {
            DeclKind::Module | DeclKind::Prefix | DeclKind::Abi | DeclKind::Synopsis => {}
            DeclKind::Event { .. } => {
                records.push(json!(["$EVENT", format!("{}._event", fstruct)]));
            }
            DeclKind::Function { proto } => {
                let mut rec = vec![json!("$FUNC"), json!(proto.name)];
                rec.extend(json_callable(module, proto, &proto.c_name()));
                records.push(Value::Array(rec));
            }
            DeclKind::Object(obj) => {
                let mut rec = vec![
                    json!("$OBJ"),
                    json!(obj.constructor.name),
                    json!(module.object_struct(obj)),
                ];
                let mut init = vec![json!("$INIT")];
                init.extend(json_callable(module, &obj.init, &obj.init.c_name()));
                rec.push(Value::Array(init));
                let mut fini = vec![json!("$FINI")];
                fini.extend(json_callable(module, &obj.fini, &obj.fini.c_name()));
                rec.push(Value::Array(fini));
                for m in &obj.methods {
                    let short = m
                        .proto
                        .name
                        .strip_prefix(&format!("{}.", obj.constructor.name))
                        .unwrap_or(&m.proto.name);
                    let mut meth = vec![json!("$METHOD"), json!(short)];
                    meth.extend(json_callable(module, &m.proto, &m.proto.c_name()));
                    rec.push(Value::Array(meth));
                }
                records.push(Value::Array(rec));
            }
        }
    }
    Value::Array(records)
}

/// Shared tail of a callable record: return type, C entry point, argument
/// struct name (or ""), then one array per argument with trailing nulls
/// trimmed.
fn json_callable(module: &Module, sig: &Signature, cfunc: &str) -> Vec<Value> {
    let fstruct = module.func_struct();
    let mut out = vec![
        json!([sig.return_type.vtype.name()]),
        json!(format!("{}.{}", fstruct, cfunc)),
    ];
    if sig.uses_argstruct {
        out.push(json!(module.argstruct_name(sig)));
    } else {
        out.push(json!(""));
    }
    for arg in &sig.args {
        let mut fields = vec![
            json!(arg.ctype.vtype.name()),
            arg.name.as_deref().map_or(Value::Null, |n| json!(n)),
            arg.default.as_deref().map_or(Value::Null, |d| json!(d)),
            if arg.ctype.enum_values.is_empty() {
                Value::Null
            } else {
                json!(arg.ctype.enum_values)
            },
        ];
        if arg.optional {
            fields.push(json!(true));
        }
        while fields.len() > 1 && fields.last() == Some(&Value::Null) {
            fields.pop();
        }
        out.push(Value::Array(fields));
    }
    out
}

// -- Module descriptor --------------------------------------------------------

fn descriptor(module: &Module, file_id: &str) -> String {
    let vmd = format!("Vmod_{}_Data", module.name);
    let mut s = String::new();
    for code in [714, 759, 765] {
        s.push_str(&format!("\n/*lint -esym({}, {}) */\n", code, vmd));
    }
    s.push_str(&format!("\nextern const struct vmod_data {};\n", vmd));
    s.push_str(&format!("\nconst struct vmod_data {} = {{\n", vmd));
    if module.strict_abi {
        s.push_str("\t.vrt_major =\t0,\n");
        s.push_str("\t.vrt_minor =\t0,\n");
    } else {
        s.push_str("\t.vrt_major =\tVRT_MAJOR_VERSION,\n");
        s.push_str("\t.vrt_minor =\tVRT_MINOR_VERSION,\n");
    }
    s.push_str(&format!("\t.name =\t\t\"{}\",\n", module.name));
    s.push_str("\t.func =\t\t&Vmod_Func,\n");
    s.push_str("\t.func_len =\tsizeof(Vmod_Func),\n");
    s.push_str("\t.proto =\tVmod_Proto,\n");
    s.push_str(&format!("\t.spec =\t\tVmod_{}_Spec,\n", module.name));
    s.push_str(&format!("\t.json =\t\tVmod_{}_Json,\n", module.name));
    s.push_str("\t.abi =\t\tVMOD_ABI_Version,\n");
    s.push_str(&format!("\t.file_id =\t\"{}\",\n", file_id));
    s.push_str("};\n");
    s
}
