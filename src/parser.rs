//! Structural parser: splits the input into `$` stanzas, dispatches on the
//! stanza keyword, and parses signatures and argument lists.
//!
//! A stanza is a line starting with `$`, plus any immediately following
//! indented non-empty lines (declaration continuation). Everything after
//! that, up to the next `$` line, is the stanza's documentation text. Text
//! before the first stanza is the copyright block.

use std::collections::BTreeSet;
use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, VccError};
use crate::lexer::{self, unquote, Token};
use crate::model::*;
use crate::types::VccType;

static RE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z.][a-zA-Z0-9_]*$").unwrap());

static RE_C_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap());

/// A non-fatal diagnostic, promoted to a FormatError under `--strict`.
#[derive(Debug)]
pub struct Warning {
    pub line: u32,
    pub msg: String,
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.msg)
    }
}

#[derive(Debug)]
pub struct ParseOutput {
    pub module: Module,
    pub warnings: Vec<Warning>,
}

/// Parse a complete .vcc input text.
pub fn parse(input: &str, strict: bool) -> Result<ParseOutput> {
    let (copyright, stanzas) = split_stanzas(input);

    let mut stanzas = stanzas.into_iter();
    let first = match stanzas.next() {
        Some(s) => s,
        None => return Err(VccError::format(1, "empty input, expected $Module")),
    };
    if first.keyword != "Module" {
        return Err(VccError::format(
            first.line,
            format!("\"$Module\" must be the first stanza, got \"${}\"", first.keyword),
        ));
    }

    let mut p = Parser {
        module: parse_module_header(&first)?,
        warnings: Vec::new(),
        strict,
        object_open: false,
        have_event: false,
    };
    p.module.copyright = copyright;
    p.module.declarations.push(Declaration {
        kind: DeclKind::Module,
        docs: first.docs,
        line: first.line,
    });

    for stanza in stanzas {
        p.dispatch(stanza)?;
    }

    Ok(ParseOutput {
        module: p.module,
        warnings: p.warnings,
    })
}

// -- Stanza splitting ---------------------------------------------------------

struct Stanza {
    keyword: String,
    /// Declaration text after the keyword, continuation lines joined with
    /// newlines.
    header: String,
    /// Input line the keyword appears on.
    line: u32,
    docs: Vec<String>,
}

fn split_stanzas(input: &str) -> (String, Vec<Stanza>) {
    let mut copyright = String::new();
    let mut stanzas: Vec<Stanza> = Vec::new();
    let mut in_header = false;

    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx as u32 + 1;
        if let Some(rest) = raw.strip_prefix('$') {
            let mut words = rest.splitn(2, char::is_whitespace);
            let keyword = words.next().unwrap_or("").to_string();
            let header = words.next().unwrap_or("").to_string();
            stanzas.push(Stanza {
                keyword,
                header,
                line: line_no,
                docs: Vec::new(),
            });
            in_header = true;
            continue;
        }
        match stanzas.last_mut() {
            None => {
                copyright.push_str(raw);
                copyright.push('\n');
            }
            Some(stanza) => {
                let continuation = in_header
                    && !raw.trim().is_empty()
                    && raw.starts_with(|c| c == ' ' || c == '\t');
                if continuation {
                    stanza.header.push('\n');
                    stanza.header.push_str(raw);
                } else {
                    in_header = false;
                    stanza.docs.push(raw.to_string());
                }
            }
        }
    }

    for stanza in &mut stanzas {
        trim_blank_edges(&mut stanza.docs);
    }
    (copyright.trim().to_string(), stanzas)
}

fn trim_blank_edges(docs: &mut Vec<String>) {
    while docs.first().is_some_and(|l| l.trim().is_empty()) {
        docs.remove(0);
    }
    while docs.last().is_some_and(|l| l.trim().is_empty()) {
        docs.pop();
    }
}

// -- Module header ------------------------------------------------------------

fn parse_module_header(stanza: &Stanza) -> Result<Module> {
    let mut parts = stanza.header.splitn(3, char::is_whitespace);
    let name = parts.next().unwrap_or("").to_string();
    let section = parts.next().unwrap_or("").to_string();
    let desc = parts.next().unwrap_or("").trim().to_string();
    if name.is_empty() || section.is_empty() || desc.is_empty() {
        return Err(VccError::format(
            stanza.line,
            "$Module takes <name> <man-section> <description>",
        ));
    }
    if !RE_C_NAME.is_match(&name) {
        return Err(VccError::format(
            stanza.line,
            format!("illegal module name '{}'", name),
        ));
    }
    Ok(Module {
        name,
        man_section: section,
        description: unquote(&desc).to_string(),
        prefix: "vmod_".to_string(),
        strict_abi: true,
        auto_synopsis: true,
        copyright: String::new(),
        enums: BTreeSet::new(),
        declarations: Vec::new(),
    })
}

// -- Keyword dispatch ---------------------------------------------------------

struct Parser {
    module: Module,
    warnings: Vec<Warning>,
    strict: bool,
    /// Whether the most recent declaration is an Object accepting methods.
    object_open: bool,
    have_event: bool,
}

impl Parser {
    fn warn(&mut self, line: u32, msg: impl Into<String>) -> Result<()> {
        if self.strict {
            return Err(VccError::format(line, msg));
        }
        self.warnings.push(Warning {
            line,
            msg: msg.into(),
        });
        Ok(())
    }

    fn dispatch(&mut self, stanza: Stanza) -> Result<()> {
        if stanza.keyword != "Method" {
            self.object_open = false;
        }
        match stanza.keyword.as_str() {
            "Module" => Err(VccError::format(stanza.line, "duplicate $Module stanza")),
            "Prefix" => self.s_prefix(stanza),
            "ABI" => self.s_abi(stanza),
            "Synopsis" => self.s_synopsis(stanza),
            "Event" => self.s_event(stanza),
            "Function" => self.s_function(stanza),
            "Object" => self.s_object(stanza),
            "Method" => self.s_method(stanza),
            other => Err(VccError::format(
                stanza.line,
                format!("unknown stanza \"${}\"", other),
            )),
        }
    }

    fn push(&mut self, kind: DeclKind, stanza: Stanza) {
        self.module.declarations.push(Declaration {
            kind,
            docs: stanza.docs,
            line: stanza.line,
        });
    }

    fn s_prefix(&mut self, stanza: Stanza) -> Result<()> {
        let word = stanza.header.trim();
        if !RE_C_NAME.is_match(word) {
            return Err(VccError::format(
                stanza.line,
                format!("illegal prefix '{}'", word),
            ));
        }
        // Last write wins, as in the source behavior.
        self.module.prefix = format!("{}_", word);
        self.push(DeclKind::Prefix, stanza);
        Ok(())
    }

    fn s_abi(&mut self, stanza: Stanza) -> Result<()> {
        let word = stanza.header.trim().to_string();
        if word != "strict" && word != "vrt" {
            self.warn(
                stanza.line,
                format!("valid ABI types are 'strict' or 'vrt', got '{}'", word),
            )?;
        }
        self.module.strict_abi = word == "strict";
        self.push(DeclKind::Abi, stanza);
        Ok(())
    }

    fn s_synopsis(&mut self, stanza: Stanza) -> Result<()> {
        let word = stanza.header.trim().to_string();
        if word != "auto" && word != "manual" {
            self.warn(
                stanza.line,
                format!("valid Synopsis values are 'auto' or 'manual', got '{}'", word),
            )?;
        }
        self.module.auto_synopsis = word == "auto";
        self.push(DeclKind::Synopsis, stanza);
        Ok(())
    }

    fn s_event(&mut self, stanza: Stanza) -> Result<()> {
        if self.have_event {
            return Err(VccError::format(
                stanza.line,
                format!("module {} already has an $Event", self.module.name),
            ));
        }
        let name = stanza.header.trim().to_string();
        if !RE_C_NAME.is_match(&name) {
            return Err(VccError::format(
                stanza.line,
                format!("illegal event name '{}'", name),
            ));
        }
        if !stanza.docs.is_empty() {
            self.warn(
                stanza.line,
                format!("documentation on $Event {} is not emitted", name),
            )?;
        }
        self.have_event = true;
        self.push(DeclKind::Event { name }, stanza);
        Ok(())
    }

    fn s_function(&mut self, stanza: Stanza) -> Result<()> {
        let proto = self.parse_signature(&stanza, true, "")?;
        if stanza.docs.is_empty() {
            self.warn(
                stanza.line,
                format!("no documentation for $Function {}", proto.name),
            )?;
        }
        self.push(DeclKind::Function { proto }, stanza);
        Ok(())
    }

    fn s_object(&mut self, stanza: Stanza) -> Result<()> {
        let constructor = self.parse_signature(&stanza, false, "")?;
        if stanza.docs.is_empty() {
            self.warn(
                stanza.line,
                format!("no documentation for $Object {}", constructor.name),
            )?;
        }

        let mut init = constructor.clone();
        init.name = format!("{}__init", constructor.name);

        let mut fini = constructor.clone();
        fini.name = format!("{}__fini", constructor.name);
        fini.args = Vec::new();
        fini.uses_argstruct = false;

        self.push(
            DeclKind::Object(Box::new(ObjectDecl {
                constructor,
                init,
                fini,
                methods: Vec::new(),
            })),
            stanza,
        );
        self.object_open = true;
        Ok(())
    }

    fn s_method(&mut self, stanza: Stanza) -> Result<()> {
        if !self.object_open {
            return Err(VccError::format(
                stanza.line,
                "$Method outside $Object",
            ));
        }
        let obj_name = match self.module.declarations.last() {
            Some(Declaration {
                kind: DeclKind::Object(obj),
                ..
            }) => obj.constructor.name.clone(),
            _ => unreachable!("object_open implies last declaration is an Object"),
        };

        let proto = self.parse_signature(&stanza, true, &obj_name)?;
        if !proto.base_name.starts_with('.') {
            return Err(VccError::format(
                stanza.line,
                format!(
                    "$Method {}: method names must start with . (dot)",
                    proto.base_name
                ),
            ));
        }
        if stanza.docs.is_empty() {
            self.warn(
                stanza.line,
                format!("no documentation for $Method {}", proto.name),
            )?;
        }

        if let Some(Declaration {
            kind: DeclKind::Object(obj),
            ..
        }) = self.module.declarations.last_mut()
        {
            obj.methods.push(MethodDecl {
                proto,
                docs: stanza.docs,
            });
        }
        Ok(())
    }

    // -- Signatures -----------------------------------------------------------

    /// Parse `<RET> <name> ( <arglist> )` from a stanza header. When
    /// `has_retval` is false the return type is fixed to VOID (object
    /// constructors). `prefix` is the owning object's name for methods.
    fn parse_signature(&mut self, stanza: &Stanza, has_retval: bool, prefix: &str) -> Result<Signature> {
        let tokens = lexer::tokenize(&stanza.header, stanza.line)?;
        let mut cur = Cursor::new(&tokens, stanza.line);

        let return_type = if has_retval {
            parse_ctype(&mut cur, &mut self.module.enums)?
        } else {
            CType::void()
        };

        let base = cur.next()?;
        if !RE_NAME.is_match(&base.text) {
            return Err(VccError::format(
                base.line,
                format!("{}(): illegal name", base.text),
            ));
        }
        let base_name = base.text.clone();
        let name = if base_name.starts_with('.') {
            format!("{}{}", prefix, base_name)
        } else {
            base_name.clone()
        };
        let c_name = name.replace('.', "_");
        if !RE_C_NAME.is_match(&c_name) {
            return Err(VccError::format(
                base.line,
                format!("{}(): illegal C name", c_name),
            ));
        }

        cur.expect("(")?;
        let mut sig = Signature {
            base_name,
            name,
            return_type,
            args: Vec::new(),
            uses_argstruct: false,
        };
        let mut names: HashSet<String> = HashSet::new();

        if cur.peek_is(")") {
            cur.expect(")")?;
        } else {
            loop {
                if cur.peek_is("[") {
                    cur.expect("[")?;
                    let opt_line = cur.line_hint();
                    let mut arg =
                        parse_argument(&mut cur, &mut names, &mut self.module.enums, &["]"])?;
                    if arg.name.is_none() {
                        return Err(VccError::format(
                            opt_line,
                            "optional arguments must have names",
                        ));
                    }
                    arg.optional = true;
                    cur.expect("]")?;
                    sig.uses_argstruct = true;
                    sig.args.push(arg);
                } else {
                    let arg =
                        parse_argument(&mut cur, &mut names, &mut self.module.enums, &[",", ")"])?;
                    sig.args.push(arg);
                }
                let sep = cur.next()?;
                match sep.text.as_str() {
                    ")" => break,
                    "," => continue,
                    other => {
                        return Err(VccError::format(
                            sep.line,
                            format!("expected ',' or ')', got '{}'", other),
                        ));
                    }
                }
            }
        }

        if let Some(extra) = cur.remainder() {
            return Err(VccError::format(
                extra.line,
                format!("trailing tokens after ')': '{}'", extra.text),
            ));
        }
        Ok(sig)
    }
}

/// Parse one `<TYPE>` or `ENUM { ... }` annotation.
fn parse_ctype(cur: &mut Cursor, enums: &mut BTreeSet<String>) -> Result<CType> {
    let tok = cur.next()?;
    let vtype = VccType::lookup(&tok.text).ok_or_else(|| {
        VccError::type_error(tok.line, format!("expected type, got '{}'", tok.text))
    })?;

    let mut ctype = CType::plain(vtype);
    if cur.peek_is("{") {
        if vtype != VccType::Enum {
            return Err(VccError::format(
                tok.line,
                format!("only ENUM takes a {{...}} value set, not {}", vtype.name()),
            ));
        }
        cur.expect("{")?;
        loop {
            let lit_tok = cur.next()?;
            let lit = unquote(&lit_tok.text).to_string();
            if lit.is_empty() {
                return Err(VccError::format(lit_tok.line, "empty enum value"));
            }
            if ctype.enum_values.contains(&lit) {
                return Err(VccError::format(
                    lit_tok.line,
                    format!("duplicate enum value '{}'", lit),
                ));
            }
            enums.insert(lit.clone());
            ctype.enum_values.push(lit);
            let sep = cur.next()?;
            match sep.text.as_str() {
                "}" => break,
                "," => continue,
                other => {
                    return Err(VccError::format(
                        sep.line,
                        format!("expected '}}' or ',', got '{}'", other),
                    ));
                }
            }
        }
    }
    Ok(ctype)
}

/// Parse one argument: type, optional name, optional `= default`. Leaves the
/// cursor on the closing delimiter (one of `enders`).
fn parse_argument(
    cur: &mut Cursor,
    names: &mut HashSet<String>,
    enums: &mut BTreeSet<String>,
    enders: &[&str],
) -> Result<Argument> {
    let ctype = parse_ctype(cur, enums)?;
    let mut arg = Argument {
        ctype,
        name: None,
        default: None,
        optional: false,
    };

    if enders.iter().any(|e| cur.peek_is(e)) {
        return Ok(arg);
    }

    let name_tok = cur.next()?;
    if !RE_C_NAME.is_match(&name_tok.text) {
        return Err(VccError::format(
            name_tok.line,
            format!("illegal argument name '{}'", name_tok.text),
        ));
    }
    if !names.insert(name_tok.text.clone()) {
        return Err(VccError::format(
            name_tok.line,
            format!("duplicate argument name '{}'", name_tok.text),
        ));
    }
    arg.name = Some(name_tok.text.clone());

    if enders.iter().any(|e| cur.peek_is(e)) {
        return Ok(arg);
    }

    let eq = cur.next()?;
    if eq.text != "=" {
        return Err(VccError::format(
            eq.line,
            format!("expected '=', got '{}'", eq.text),
        ));
    }
    let val = cur.next()?;
    arg.default = Some(unquote(&val.text).to_string());
    Ok(arg)
}

// -- Token cursor -------------------------------------------------------------

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
    stanza_line: u32,
}

impl<'a> Cursor<'a> {
    fn new(tokens: &'a [Token], stanza_line: u32) -> Self {
        Cursor {
            tokens,
            pos: 0,
            stanza_line,
        }
    }

    fn next(&mut self) -> Result<&'a Token> {
        match self.tokens.get(self.pos) {
            Some(tok) => {
                self.pos += 1;
                Ok(tok)
            }
            None => Err(VccError::format(
                self.line_hint(),
                "unexpected end of declaration",
            )),
        }
    }

    fn peek_is(&self, text: &str) -> bool {
        self.tokens.get(self.pos).is_some_and(|t| t.text == text)
    }

    fn expect(&mut self, text: &str) -> Result<&'a Token> {
        let tok = self.next()?;
        if tok.text != text {
            return Err(VccError::format(
                tok.line,
                format!("expected '{}', got '{}'", text, tok.text),
            ));
        }
        Ok(tok)
    }

    /// Line of the next token, or the last consumed one, for diagnostics.
    fn line_hint(&self) -> u32 {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(self.stanza_line, |t| t.line)
    }

    fn remainder(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }
}
