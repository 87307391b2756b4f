//! Compilation driver: read the input, parse it, run every emitter, then
//! publish all outputs at once.
//!
//! Output files are written as `<name>.tmp` and renamed into place only
//! after every file has been fully written. A failed compile therefore
//! never leaves a half-overwritten output behind; at worst an orphaned
//! `.tmp` file remains.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::Rng;

use crate::emit::{cglue, header, rst};
use crate::parser;

pub struct Options {
    pub input: PathBuf,
    pub output_prefix: String,
    pub rstdir: PathBuf,
    pub strict: bool,
    pub boilerplate: bool,
}

pub fn compile(opts: &Options) -> Result<()> {
    let text = fs::read_to_string(&opts.input)
        .with_context(|| format!("failed to read {}", opts.input.display()))?;
    let parsed = parser::parse(&text, opts.strict)?;
    for w in &parsed.warnings {
        eprintln!("warning: {}", w);
    }
    let module = &parsed.module;

    let mut outputs = OutputSet::default();
    outputs.add(
        opts.rstdir.join(format!("vmod_{}.rst", module.name)),
        rst::emit(module, false),
    );
    outputs.add(
        opts.rstdir.join(format!("vmod_{}.man.rst", module.name)),
        rst::emit(module, true),
    );
    outputs.add(
        PathBuf::from(format!("{}.h", opts.output_prefix)),
        header::emit(module),
    );
    outputs.add(
        PathBuf::from(format!("{}.c", opts.output_prefix)),
        cglue::emit(module, &opts.output_prefix, &random_file_id()),
    );
    if opts.boilerplate {
        outputs.add(
            PathBuf::from("automake_boilerplate.am"),
            am_boilerplate(&module.name, opts.strict),
        );
    }
    outputs.commit()
}

/// All pending output files. Nothing touches a final path until `commit`.
#[derive(Default)]
struct OutputSet {
    files: Vec<(PathBuf, String)>,
}

impl OutputSet {
    fn add(&mut self, path: PathBuf, contents: String) {
        self.files.push((path, contents));
    }

    fn commit(self) -> Result<()> {
        for (path, contents) in &self.files {
            let tmp = tmp_path(path);
            fs::write(&tmp, contents)
                .with_context(|| format!("failed to write {}", tmp.display()))?;
        }
        for (path, _) in &self.files {
            fs::rename(tmp_path(path), path)
                .with_context(|| format!("failed to rename into {}", path.display()))?;
        }
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}

/// 32 random characters in 0x40..=0x5a, so two builds of the same input can
/// be told apart by their descriptor record.
fn random_file_id() -> String {
    let mut rng = rand::thread_rng();
    (0..32)
        .map(|_| rng.gen_range(0x40u8..=0x5a) as char)
        .collect()
}

const AM_BOILERPLATE: &str = r#"# Boilerplate generated by vmodgen - changes will be overwritten

AM_LDFLAGS  = $(AM_LT_LDFLAGS)

AM_CPPFLAGS = \
	-I$(top_srcdir)/include \
	-I$(top_srcdir)/bin/varnishd \
	-I$(top_builddir)/include

vmoddir = $(pkglibdir)/vmods
vmodgenargs = %{STRICT} --boilerplate --output vcc_%{NAME}_if

vmod_LTLIBRARIES = libvmod_%{NAME}.la

libvmod_%{NAME}_la_CFLAGS = \
	@SAN_CFLAGS@

libvmod_%{NAME}_la_LDFLAGS = \
	$(AM_LDFLAGS) \
	$(VMOD_LDFLAGS) \
	@SAN_LDFLAGS@

nodist_libvmod_%{NAME}_la_SOURCES = vcc_%{NAME}_if.c vcc_%{NAME}_if.h

$(libvmod_%{NAME}_la_OBJECTS): vcc_%{NAME}_if.h

vcc_%{NAME}_if.h vmod_%{NAME}.rst vmod_%{NAME}.man.rst: vcc_%{NAME}_if.c

vcc_%{NAME}_if.c: $(srcdir)/vmod.vcc
	vmodgen $(vmodgenargs) $(srcdir)/vmod.vcc

EXTRA_DIST = vmod.vcc automake_boilerplate.am

CLEANFILES = \
	$(builddir)/vcc_%{NAME}_if.c \
	$(builddir)/vcc_%{NAME}_if.h \
	$(builddir)/vmod_%{NAME}.rst \
	$(builddir)/vmod_%{NAME}.man.rst
"#;

fn am_boilerplate(name: &str, strict: bool) -> String {
    AM_BOILERPLATE
        .replace("%{NAME}", name)
        .replace("%{STRICT}", if strict { "--strict" } else { "" })
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &str = concat!(
        "# Copyright (c) holders\n\n",
        "$Module foo 3 \"Foo functions\"\n\nDocs.\n\n",
        "$Function INT add(INT a, INT b)\n\nAdds.\n",
    );

    fn write_input(dir: &std::path::Path, text: &str) -> PathBuf {
        let p = dir.join("vmod.vcc");
        fs::write(&p, text).unwrap();
        p
    }

    fn options(dir: &std::path::Path, text: &str) -> Options {
        Options {
            input: write_input(dir, text),
            output_prefix: dir.join("vcc_if").to_string_lossy().into_owned(),
            rstdir: dir.to_path_buf(),
            strict: false,
            boilerplate: false,
        }
    }

    #[test]
    fn compile_commits_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        compile(&options(dir.path(), INPUT)).unwrap();
        for name in ["vcc_if.h", "vcc_if.c", "vmod_foo.rst", "vmod_foo.man.rst"] {
            assert!(dir.path().join(name).exists(), "missing {}", name);
            assert!(!dir.path().join(format!("{}.tmp", name)).exists());
        }
    }

    #[test]
    fn failed_compile_commits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let bad = "$Module foo 3 \"desc\"\n\nDocs.\n\n$Bogus x\n";
        assert!(compile(&options(dir.path(), bad)).is_err());
        assert!(!dir.path().join("vcc_if.h").exists());
        assert!(!dir.path().join("vmod_foo.rst").exists());
    }

    #[test]
    fn boilerplate_substitutes_name_and_strict() {
        let am = am_boilerplate("foo", true);
        assert!(am.contains("libvmod_foo.la"));
        assert!(am.contains("--strict --boilerplate --output vcc_foo_if"));
        assert!(!am_boilerplate("foo", false).contains("--strict --boilerplate"));
    }

    #[test]
    fn file_id_shape() {
        let id = random_file_id();
        assert_eq!(id.len(), 32);
        assert!(id.bytes().all(|b| (0x40..=0x5a).contains(&b)));
    }

    #[test]
    fn tmp_path_appends_suffix() {
        assert_eq!(
            tmp_path(&PathBuf::from("out/vcc_if.h")),
            PathBuf::from("out/vcc_if.h.tmp")
        );
    }
}
