//! `rowbind statements`: list committed statements.

use std::fmt::Write as _;
use std::path::Path;

use rowbind_engine::Configuration;

use super::load_model;

pub fn execute(manifest: &Path) -> anyhow::Result<()> {
    let model = load_model(manifest)?;
    print!("{}", listing(&model.configuration));
    Ok(())
}

/// One line per statement, sorted by id: id, command kind, result maps
pub fn listing(config: &Configuration) -> String {
    let mut statements: Vec<_> = config.statements().collect();
    statements.sort_by(|a, b| a.id.cmp(&b.id));

    let mut out = String::new();
    for statement in statements {
        let result_maps: Vec<&str> = statement.result_maps.iter().map(|m| m.id()).collect();
        let _ = writeln!(
            out,
            "{:<40} {:<8} {}",
            statement.id,
            format!("{:?}", statement.command).to_uppercase(),
            if result_maps.is_empty() { "-".to_string() } else { result_maps.join(", ") }
        );
    }
    out
}
