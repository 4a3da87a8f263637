//! Units-per-em correction through a ttx round trip

use crate::compiler::error::BuildError;
use crate::compiler::toolchain::{Toolchain, TTX};
use std::ffi::OsStr;
use std::path::Path;
use tracing::debug;

/// Smallest and largest UPEM the `head` table allows
pub const UNITS_PER_EM_RANGE: (u16, u16) = (16, 16384);

const UNITS_PER_EM_TAG: &str = "<unitsPerEm value=\"";

/// `value` rounded and limited to what the `head` table can hold
pub fn head_units_per_em(value: f64) -> u16 {
    let (min, max) = UNITS_PER_EM_RANGE;
    value.round().max(f64::from(min)).min(f64::from(max)) as u16
}

/// Replace the `unitsPerEm` value in a ttx dump. `None` if the dump has none.
pub fn rewrite_units_per_em(xml: &str, units_per_em: u16) -> Option<String> {
    let start = xml.find(UNITS_PER_EM_TAG)? + UNITS_PER_EM_TAG.len();
    let len = xml[start..].find('"')?;
    let mut out = String::with_capacity(xml.len());
    out.push_str(&xml[..start]);
    out.push_str(&units_per_em.to_string());
    out.push_str(&xml[start + len..]);
    Some(out)
}

/// Decompile `binary`, set its UPEM and compile it back in place.
///
/// Runs without a cancellation receiver.
pub async fn correct_units_per_em(
    toolchain: &Toolchain,
    binary: &Path,
    units_per_em: f64,
    work_dir: &Path,
) -> Result<(), BuildError> {
    let value = head_units_per_em(units_per_em);
    let dump = binary.with_extension("ttx");
    debug!("Setting unitsPerEm of {} to {}", binary.display(), value);

    toolchain
        .run(TTX, ttx_args(&dump, binary), work_dir, None)
        .await?;

    let xml = tokio::fs::read_to_string(&dump)
        .await
        .map_err(|e| BuildError::compilation(TTX, e))?;
    let xml = rewrite_units_per_em(&xml, value)
        .ok_or_else(|| BuildError::compilation(TTX, "decompiled font has no unitsPerEm"))?;
    tokio::fs::write(&dump, xml)
        .await
        .map_err(|e| BuildError::compilation(TTX, e))?;

    toolchain
        .run(TTX, ttx_args(binary, &dump), work_dir, None)
        .await?;
    Ok(())
}

/// `ttx -f -o <output> <input>`
fn ttx_args<'a>(output: &'a Path, input: &'a Path) -> [&'a OsStr; 4] {
    [
        OsStr::new("-f"),
        OsStr::new("-o"),
        output.as_os_str(),
        input.as_os_str(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_only_the_value() {
        let xml = "<head>\n  <unitsPerEm value=\"1000\"/>\n  <created value=\"x\"/>\n</head>";
        assert_eq!(
            rewrite_units_per_em(xml, 700).unwrap(),
            "<head>\n  <unitsPerEm value=\"700\"/>\n  <created value=\"x\"/>\n</head>"
        );
    }

    #[test]
    fn dump_without_head_is_rejected() {
        assert_eq!(rewrite_units_per_em("<ttFont/>", 700), None);
    }

    #[test]
    fn value_is_rounded_and_limited() {
        assert_eq!(head_units_per_em(699.6), 700);
        assert_eq!(head_units_per_em(3.0), 16);
        assert_eq!(head_units_per_em(1e6), 16384);
    }
}
