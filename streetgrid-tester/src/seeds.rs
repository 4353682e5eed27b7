use anyhow::{Context, Result, bail};

/// Split a comma-separated CLI argument, dropping blanks.
pub fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolve seed tokens (decimal or `0x`-prefixed hex) into unique seeds, keeping first-seen order.
pub fn resolve_seeds(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();
    for token in tokens {
        let seed = if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            u64::from_str_radix(&hex.replace('_', ""), 16)
                .with_context(|| format!("invalid hex seed {token}"))?
        } else {
            token
                .replace('_', "")
                .parse::<u64>()
                .with_context(|| format!("invalid seed {token}"))?
        };
        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }
    if seeds.is_empty() {
        bail!("no seeds provided");
    }
    Ok(seeds)
}

/// Parse a `x,y` start cell.
pub fn parse_cell(raw: &str) -> Result<(usize, usize)> {
    let parts = split_csv(raw);
    let [x, y] = parts.as_slice() else {
        bail!("start cell must look like x,y (got {raw})");
    };
    let x = x.parse().with_context(|| format!("invalid x coordinate {x}"))?;
    let y = y.parse().with_context(|| format!("invalid y coordinate {y}"))?;
    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_csv_trims_and_drops_blanks() {
        assert_eq!(split_csv(" 1, 2,,3 "), vec!["1", "2", "3"]);
        assert!(split_csv("").is_empty());
    }

    #[test]
    fn seeds_accept_decimal_and_hex() {
        let tokens = split_csv("1337,0xC0FFEE,1_000,1337");
        assert_eq!(resolve_seeds(&tokens).unwrap(), vec![1337, 0x00C0_FFEE, 1000]);
    }

    #[test]
    fn bad_seeds_are_reported() {
        assert!(resolve_seeds(&split_csv("abc")).is_err());
        assert!(resolve_seeds(&split_csv("0xZZ")).is_err());
        assert!(resolve_seeds(&[]).is_err());
    }

    #[test]
    fn start_cells_parse() {
        assert_eq!(parse_cell("2, 3").unwrap(), (2, 3));
        assert!(parse_cell("2").is_err());
        assert!(parse_cell("a,b").is_err());
    }
}
