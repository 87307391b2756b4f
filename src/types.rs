//! The VCC type table: every type name the DSL accepts and its C
//! representation. Fixed at compile time; lookup misses are the caller's
//! error, never a default substitution.

/// One entry per DSL type. The PRIV_* kinds are opaque per-scope private
/// pointers and all share one C type; they are hidden from VCL-level
/// prototypes in the documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VccType {
    Acl,
    Backend,
    Blob,
    Body,
    Bool,
    Bytes,
    Duration,
    Enum,
    Header,
    Http,
    Int,
    Ip,
    Probe,
    Real,
    Stevedore,
    Strands,
    String,
    Time,
    Void,
    PrivCall,
    PrivVcl,
    PrivTask,
    PrivTop,
}

impl VccType {
    /// Resolve a DSL type token. `None` when the token is not a type.
    pub fn lookup(token: &str) -> Option<VccType> {
        use VccType::*;
        Some(match token {
            "ACL" => Acl,
            "BACKEND" => Backend,
            "BLOB" => Blob,
            "BODY" => Body,
            "BOOL" => Bool,
            "BYTES" => Bytes,
            "DURATION" => Duration,
            "ENUM" => Enum,
            "HEADER" => Header,
            "HTTP" => Http,
            "INT" => Int,
            "IP" => Ip,
            "PROBE" => Probe,
            "REAL" => Real,
            "STEVEDORE" => Stevedore,
            "STRANDS" => Strands,
            "STRING" => String,
            "TIME" => Time,
            "VOID" => Void,
            "PRIV_CALL" => PrivCall,
            "PRIV_VCL" => PrivVcl,
            "PRIV_TASK" => PrivTask,
            "PRIV_TOP" => PrivTop,
            _ => return None,
        })
    }

    /// The DSL spelling, as used in spec records and documentation.
    pub fn name(self) -> &'static str {
        use VccType::*;
        match self {
            Acl => "ACL",
            Backend => "BACKEND",
            Blob => "BLOB",
            Body => "BODY",
            Bool => "BOOL",
            Bytes => "BYTES",
            Duration => "DURATION",
            Enum => "ENUM",
            Header => "HEADER",
            Http => "HTTP",
            Int => "INT",
            Ip => "IP",
            Probe => "PROBE",
            Real => "REAL",
            Stevedore => "STEVEDORE",
            Strands => "STRANDS",
            String => "STRING",
            Time => "TIME",
            Void => "VOID",
            PrivCall => "PRIV_CALL",
            PrivVcl => "PRIV_VCL",
            PrivTask => "PRIV_TASK",
            PrivTop => "PRIV_TOP",
        }
    }

    /// The C type used in generated prototypes and typedefs.
    pub fn ctype(self) -> &'static str {
        use VccType::*;
        match self {
            Acl => "VCL_ACL",
            Backend => "VCL_BACKEND",
            Blob => "VCL_BLOB",
            Body => "VCL_BODY",
            Bool => "VCL_BOOL",
            Bytes => "VCL_BYTES",
            Duration => "VCL_DURATION",
            Enum => "VCL_ENUM",
            Header => "VCL_HEADER",
            Http => "VCL_HTTP",
            Int => "VCL_INT",
            Ip => "VCL_IP",
            Probe => "VCL_PROBE",
            Real => "VCL_REAL",
            Stevedore => "VCL_STEVEDORE",
            Strands => "VCL_STRANDS",
            String => "VCL_STRING",
            Time => "VCL_TIME",
            Void => "VCL_VOID",
            PrivCall | PrivVcl | PrivTask | PrivTop => "struct vmod_priv *",
        }
    }

    /// Private-data kinds are call plumbing, not VCL-visible arguments.
    pub fn is_priv(self) -> bool {
        matches!(
            self,
            VccType::PrivCall | VccType::PrivVcl | VccType::PrivTask | VccType::PrivTop
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_types() {
        assert_eq!(VccType::lookup("INT"), Some(VccType::Int));
        assert_eq!(VccType::lookup("PRIV_TASK"), Some(VccType::PrivTask));
        assert_eq!(VccType::lookup("STRANDS"), Some(VccType::Strands));
    }

    #[test]
    fn lookup_rejects_unknown() {
        assert_eq!(VccType::lookup("int"), None);
        assert_eq!(VccType::lookup("FLOAT"), None);
        assert_eq!(VccType::lookup(""), None);
    }

    #[test]
    fn lookup_matches_name() {
        // Every accepted token resolves to exactly the entry that spells it.
        for t in [
            "ACL", "BACKEND", "BLOB", "BODY", "BOOL", "BYTES", "DURATION", "ENUM", "HEADER",
            "HTTP", "INT", "IP", "PROBE", "REAL", "STEVEDORE", "STRANDS", "STRING", "TIME",
            "VOID", "PRIV_CALL", "PRIV_VCL", "PRIV_TASK", "PRIV_TOP",
        ] {
            assert_eq!(VccType::lookup(t).unwrap().name(), t);
        }
    }

    #[test]
    fn priv_types_share_ctype() {
        assert_eq!(VccType::PrivCall.ctype(), "struct vmod_priv *");
        assert_eq!(VccType::PrivTop.ctype(), "struct vmod_priv *");
        assert!(VccType::PrivVcl.is_priv());
        assert!(!VccType::String.is_priv());
    }
}
