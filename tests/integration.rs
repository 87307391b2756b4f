//! End-to-end tests driving the vmodgen binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SAMPLE: &str = concat!(
    "# Copyright (c) holders\n",
    "#\n",
    "# Redistribution permitted.\n",
    "\n",
    "$Module demo 3 \"Demo module\"\n",
    "\n",
    "Module documentation.\n",
    "\n",
    "$Event ev_demo\n",
    "$Function INT add(INT a, INT b = 1)\n",
    "\n",
    "Adds two numbers.\n",
    "\n",
    "$Function VOID tune(ENUM {fast, safe} mode, [DURATION grace])\n",
    "\n",
    "Adjusts behaviour.\n",
    "\n",
    "$Object counter(INT start)\n",
    "\n",
    "A counter object.\n",
    "\n",
    "$Method INT .next()\n",
    "\n",
    "Returns the next value.\n",
);

fn vmodgen() -> Command {
    Command::cargo_bin("vmodgen").unwrap()
}

fn write_vcc(dir: &Path, text: &str) -> PathBuf {
    let p = dir.join("vmod.vcc");
    fs::write(&p, text).unwrap();
    p
}

fn compile_into(dir: &Path, text: &str) -> assert_cmd::assert::Assert {
    let input = write_vcc(dir, text);
    vmodgen()
        .arg("-o")
        .arg(dir.join("vcc_if"))
        .arg("-w")
        .arg(dir)
        .arg(&input)
        .assert()
}

#[test]
fn compiles_all_outputs() {
    let dir = TempDir::new().unwrap();
    compile_into(dir.path(), SAMPLE).success();

    let h = fs::read_to_string(dir.path().join("vcc_if.h")).unwrap();
    assert!(h.contains("VCL_INT vmod_add(VRT_CTX, VCL_INT, VCL_INT);"));
    assert!(h.contains("struct vmod_demo_counter;"));

    let c = fs::read_to_string(dir.path().join("vcc_if.c")).unwrap();
    assert!(c.contains("const struct vmod_data Vmod_demo_Data = {"));
    assert!(c.contains("static const char * const Vmod_demo_Spec[] = {"));
    assert!(c.contains("$METHOD\\000demo.counter.next"));

    let rst = fs::read_to_string(dir.path().join("vmod_demo.rst")).unwrap();
    assert!(rst.contains("=========\nvmod_demo\n========="));
    assert!(rst.contains("CONTENTS"));
    assert!(rst.contains("COPYRIGHT"));

    let man = fs::read_to_string(dir.path().join("vmod_demo.man.rst")).unwrap();
    assert!(!man.contains("CONTENTS"));

    for name in ["vcc_if.h", "vcc_if.c", "vmod_demo.rst", "vmod_demo.man.rst"] {
        assert!(!dir.path().join(format!("{}.tmp", name)).exists());
    }
}

#[test]
fn outputs_reproducible_except_file_id() {
    let a = TempDir::new().unwrap();
    let b = TempDir::new().unwrap();
    compile_into(a.path(), SAMPLE).success();
    compile_into(b.path(), SAMPLE).success();

    for name in ["vcc_if.h", "vmod_demo.rst", "vmod_demo.man.rst"] {
        let fa = fs::read_to_string(a.path().join(name)).unwrap();
        let fb = fs::read_to_string(b.path().join(name)).unwrap();
        assert_eq!(fa, fb, "{} differs between runs", name);
    }

    let strip = |p: &Path| -> String {
        fs::read_to_string(p.join("vcc_if.c"))
            .unwrap()
            .lines()
            .filter(|l| !l.contains(".file_id ="))
            .collect::<Vec<_>>()
            .join("\n")
    };
    assert_eq!(strip(a.path()), strip(b.path()));
}

#[test]
fn missing_input_exits_2() {
    let dir = TempDir::new().unwrap();
    vmodgen()
        .current_dir(dir.path())
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn defaults_to_vmod_vcc_in_cwd() {
    let dir = TempDir::new().unwrap();
    write_vcc(dir.path(), SAMPLE);
    vmodgen().current_dir(dir.path()).assert().success();
    assert!(dir.path().join("vcc_if.c").exists());
}

#[test]
fn unknown_stanza_exits_3_without_outputs() {
    let dir = TempDir::new().unwrap();
    let bad = "$Module demo 3 \"desc\"\n\nDocs.\n\n$Bogus nonsense\n";
    compile_into(dir.path(), bad)
        .failure()
        .code(3)
        .stderr(predicate::str::contains("format error"));
    assert!(!dir.path().join("vcc_if.h").exists());
    assert!(!dir.path().join("vmod_demo.rst").exists());
}

#[test]
fn unterminated_quote_exits_3() {
    let dir = TempDir::new().unwrap();
    let bad = "$Module demo 3 \"desc\"\n\nDocs.\n\n$Function VOID f(STRING s = \"oops)\n\nDocs.\n";
    compile_into(dir.path(), bad)
        .failure()
        .code(3)
        .stderr(predicate::str::contains("syntax error at line"));
}

#[test]
fn unknown_type_exits_4() {
    let dir = TempDir::new().unwrap();
    let bad = "$Module demo 3 \"desc\"\n\nDocs.\n\n$Function GADGET f()\n\nDocs.\n";
    compile_into(dir.path(), bad)
        .failure()
        .code(4)
        .stderr(predicate::str::contains("type error"));
}

#[test]
fn method_outside_object_exits_3() {
    let dir = TempDir::new().unwrap();
    let bad = "$Module demo 3 \"desc\"\n\nDocs.\n\n$Method INT .next()\n\nDocs.\n";
    compile_into(dir.path(), bad)
        .failure()
        .code(3)
        .stderr(predicate::str::contains("format error"));
}

#[test]
fn missing_docs_warns_then_fails_under_strict() {
    let lenient = TempDir::new().unwrap();
    let text = "$Module demo 3 \"desc\"\n\nDocs.\n\n$Function VOID f()\n";
    compile_into(lenient.path(), text)
        .success()
        .stderr(predicate::str::contains("warning:"));
    assert!(lenient.path().join("vcc_if.h").exists());

    let strict = TempDir::new().unwrap();
    let input = write_vcc(strict.path(), text);
    vmodgen()
        .arg("-N")
        .arg("-o")
        .arg(strict.path().join("vcc_if"))
        .arg("-w")
        .arg(strict.path())
        .arg(&input)
        .assert()
        .failure()
        .code(3);
    assert!(!strict.path().join("vcc_if.h").exists());
}

#[test]
fn boilerplate_flag_writes_automake_fragment() {
    let dir = TempDir::new().unwrap();
    let input = write_vcc(dir.path(), SAMPLE);
    vmodgen()
        .current_dir(dir.path())
        .arg("-b")
        .arg(&input)
        .assert()
        .success();
    let am = fs::read_to_string(dir.path().join("automake_boilerplate.am")).unwrap();
    assert!(am.contains("libvmod_demo.la"));
}
