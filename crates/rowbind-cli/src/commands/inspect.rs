//! `rowbind inspect`: show a type's capability table.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{anyhow, Context};
use rowbind_engine::Configuration;

use super::load_model;

pub fn execute(manifest: &Path, type_name: &str) -> anyhow::Result<()> {
    let model = load_model(manifest)?;
    print!("{}", describe(&model.configuration, type_name)?);
    Ok(())
}

/// Readable and writable properties of a type (or alias), one per line
pub fn describe(config: &Configuration, type_name: &str) -> anyhow::Result<String> {
    let ty = config.resolve_type(type_name)?;
    let name = ty
        .raw_name()
        .ok_or_else(|| anyhow!("{} has no properties to inspect", ty))?;
    let metadata = config
        .reflector()
        .metadata_for(name)
        .with_context(|| format!("cannot reflect on {}", name))?;

    let mut out = String::new();
    let _ = writeln!(out, "{}", metadata.type_name());
    let _ = writeln!(
        out,
        "  default constructor: {}",
        if metadata.has_default_constructor() { "yes" } else { "no" }
    );

    let mut readable = metadata.readable_properties();
    readable.sort_unstable();
    let _ = writeln!(out, "  readable:");
    for property in readable {
        let _ = writeln!(out, "    {:<20} {}", property, metadata.getter_type(property)?);
    }

    let mut writable = metadata.writable_properties();
    writable.sort_unstable();
    let _ = writeln!(out, "  writable:");
    for property in writable {
        let _ = writeln!(out, "    {:<20} {}", property, metadata.setter_type(property)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{fixture, load_model};

    #[test]
    fn test_describe_through_alias() {
        let dir = fixture::project();
        let model = load_model(dir.path()).unwrap();
        let text = describe(&model.configuration, "blog").unwrap();

        assert!(text.starts_with("demo.Blog\n"), "{}", text);
        assert!(text.contains("default constructor: yes"));
        let readable = text.split("  writable:").next().unwrap();
        assert!(readable.contains("published"));
        assert!(readable.contains("title"));
        assert!(text.lines().any(|l| l.trim_start().starts_with("id") && l.trim_end().ends_with("int")));
    }

    #[test]
    fn test_unknown_type() {
        let dir = fixture::project();
        let model = load_model(dir.path()).unwrap();
        assert!(describe(&model.configuration, "demo.Nothing").is_err());
        assert!(describe(&model.configuration, "_int").is_err());
    }
}
