use anyhow::{anyhow, Context, Result};

/// Parses a decimal or `0x`-prefixed hex seed.
pub fn parse_seed(seed: &str) -> Result<u32> {
    let s = seed.trim();
    if s.is_empty() {
        return Err(anyhow!("empty seed"));
    }
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).with_context(|| format!("invalid hex seed: {s}"))
    } else {
        s.parse::<u32>()
            .with_context(|| format!("invalid decimal seed: {s}"))
    }
}

pub fn seed_to_hex(seed: u32) -> String {
    format!("0x{seed:08x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_radixes() -> Result<()> {
        assert_eq!(parse_seed("42")?, 42);
        assert_eq!(parse_seed(" 0xDEADBEEF ")?, 0xDEAD_BEEF);
        assert_eq!(parse_seed("0X10")?, 16);
        assert!(parse_seed("").is_err());
        assert!(parse_seed("0xZZ").is_err());
        assert!(parse_seed("-1").is_err());
        Ok(())
    }

    #[test]
    fn hex_round_trips() -> Result<()> {
        assert_eq!(seed_to_hex(255), "0x000000ff");
        assert_eq!(parse_seed(&seed_to_hex(0x1234_5678))?, 0x1234_5678);
        Ok(())
    }
}
