//! Header emitter: forward declarations and prototypes for the module
//! implementation, in the native calling convention.

use crate::model::{DeclKind, Module, ObjectDecl};

use super::{argstruct_def, c_file_warning, callable_proto, lwrap};

pub fn emit(module: &Module) -> String {
    let mut out = c_file_warning();
    out.push_str("#ifndef VDEF_H_INCLUDED\n");
    out.push_str("#  error \"Include vdef.h first\"\n");
    out.push_str("#endif\n");
    out.push_str("#ifndef VRT_H_INCLUDED\n");
    out.push_str("#  error \"Include vrt.h first\"\n");
    out.push_str("#endif\n\n");

    for lit in &module.enums {
        out.push_str(&format!("extern VCL_ENUM {}enum_{};\n", module.prefix, lit));
    }
    out.push('\n');

    for decl in &module.declarations {
        match &decl.kind {
            DeclKind::Module | DeclKind::Prefix | DeclKind::Abi | DeclKind::Synopsis => {}
            DeclKind::Event { name } => {
                out.push_str(&format!("vmod_event_f {};\n", name));
            }
            DeclKind::Function { proto } => {
                if proto.uses_argstruct {
                    out.push_str(&argstruct_def(module, proto));
                }
                out.push_str(&lwrap(&callable_proto(
                    module,
                    proto,
                    &["VRT_CTX"],
                    &module.symbol(proto),
                )));
            }
            DeclKind::Object(obj) => {
                out.push_str(&emit_object(module, obj));
            }
        }
    }
    out
}

fn emit_object(module: &Module, obj: &ObjectDecl) -> String {
    let sn = module.object_struct(obj);
    let handle = format!("{} **", sn);
    let mut out = format!("{};\n", sn);

    if obj.init.uses_argstruct {
        out.push_str(&argstruct_def(module, &obj.init));
    }
    out.push_str(&lwrap(&callable_proto(
        module,
        &obj.init,
        &["VRT_CTX", &handle, "const char *"],
        &module.symbol(&obj.init),
    )));
    out.push_str(&lwrap(&callable_proto(
        module,
        &obj.fini,
        &[&handle],
        &module.symbol(&obj.fini),
    )));

    let this = format!("{} *", sn);
    for m in &obj.methods {
        if m.proto.uses_argstruct {
            out.push_str(&argstruct_def(module, &m.proto));
        }
        out.push_str(&lwrap(&callable_proto(
            module,
            &m.proto,
            &["VRT_CTX", &this],
            &module.symbol(&m.proto),
        )));
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn emit_for(body: &str) -> String {
        let input = format!("$Module foo 3 \"desc\"\n\nDocs.\n\n{}", body);
        emit(&parser::parse(&input, false).unwrap().module)
    }

    #[test]
    fn function_prototype() {
        // Scenario A: one prototype for add taking two ints, returning int.
        let h = emit_for("$Function INT add(INT a, INT b)\n\nDocs.\n");
        assert!(h.contains("VCL_INT vmod_add(VRT_CTX, VCL_INT, VCL_INT);\n"));
    }

    #[test]
    fn object_surface() {
        // Scenario B: opaque type, constructor, destructor, method.
        let h = emit_for(concat!(
            "$Object thing(STRING name)\n\nDocs.\n\n",
            "$Method INT .get(INT idx)\n\nDocs.\n"
        ));
        assert!(h.contains("struct vmod_foo_thing;\n"));
        assert!(h.contains(
            "VCL_VOID vmod_thing__init(VRT_CTX, struct vmod_foo_thing **,\n    const char *, VCL_STRING);\n"
        ));
        assert!(h.contains("VCL_VOID vmod_thing__fini(struct vmod_foo_thing **);\n"));
        assert!(h.contains(
            "VCL_INT vmod_thing_get(VRT_CTX, struct vmod_foo_thing *,\n    VCL_INT);\n"
        ));
    }

    #[test]
    fn enum_externs_sorted() {
        let h = emit_for("$Function VOID f(ENUM {z, a} v)\n\nDocs.\n");
        let a = h.find("extern VCL_ENUM vmod_enum_a;").unwrap();
        let z = h.find("extern VCL_ENUM vmod_enum_z;").unwrap();
        assert!(a < z);
    }

    #[test]
    fn event_prototype() {
        let h = emit_for("$Event ev_func\n");
        assert!(h.contains("vmod_event_f ev_func;\n"));
    }

    #[test]
    fn header_guards_present() {
        let h = emit_for("$Function VOID f()\n\nDocs.\n");
        assert!(h.starts_with("/*\n * NB:  This file is machine generated"));
        assert!(h.contains("#  error \"Include vdef.h first\""));
        assert!(h.contains("#  error \"Include vrt.h first\""));
    }

    #[test]
    fn custom_prefix_applies_to_symbols() {
        let input = "$Module foo 3 \"desc\"\n\nDocs.\n\n$Prefix xyz\n$Function VOID f()\n\nDocs.\n";
        let h = emit(&parser::parse(input, false).unwrap().module);
        assert!(h.contains("VCL_VOID xyz_f(VRT_CTX);\n"));
    }

    #[test]
    fn argstruct_emitted_before_prototype() {
        let h = emit_for("$Function VOID f(INT a, [STRING tag])\n\nDocs.\n");
        let def = h.find("struct vmod_f_arg {").unwrap();
        let proto = h.find("VCL_VOID vmod_f(VRT_CTX, struct vmod_f_arg*);").unwrap();
        assert!(def < proto);
        assert!(h.contains("valid_tag;"));
    }
}
