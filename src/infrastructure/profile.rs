//! Reader for Go cover profiles.
//!
//! The format is line oriented: a `mode:` header, then one block per line,
//! `file.go:startLine.startCol,endLine.endCol numStmts count`. The file name
//! is everything before the last colon, since import paths may themselves
//! contain colons. Blocks are grouped per file and sorted by range; the
//! profile writer emits them in order, but nothing downstream should depend
//! on that.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::domain::position::{CodeRange, SourcePos};
use crate::domain::ranges::CoverageBlock;

#[derive(Debug, Clone)]
pub struct CoverProfile {
    /// `set`, `count` or `atomic`. Only presence is validated; every mode
    /// marks uncovered blocks with a zero count.
    pub mode: String,
    /// Blocks per profiled file, keyed by the path as written in the profile,
    /// sorted by (start, end).
    pub files: BTreeMap<String, Vec<CoverageBlock>>,
}

pub fn read_profile(path: &Path) -> Result<CoverProfile> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading coverage profile {}", path.display()))?;
    parse_profile(&text).with_context(|| format!("parsing coverage profile {}", path.display()))
}

pub fn parse_profile(text: &str) -> Result<CoverProfile> {
    let mut lines = text.lines().enumerate();

    let mode = loop {
        let Some((idx, line)) = lines.next() else {
            bail!("missing `mode:` header");
        };
        if line.trim().is_empty() {
            continue;
        }
        let Some(mode) = line.strip_prefix("mode: ") else {
            bail!("line {}: expected `mode:` header, found {:?}", idx + 1, line);
        };
        break mode.trim().to_string();
    };

    let mut files: BTreeMap<String, Vec<CoverageBlock>> = BTreeMap::new();
    for (idx, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let (file, block) = parse_block(line).with_context(|| format!("line {}", idx + 1))?;
        files.entry(file).or_default().push(block);
    }

    for blocks in files.values_mut() {
        blocks.sort_by_key(|b| (b.range.start, b.range.end));
    }

    Ok(CoverProfile { mode, files })
}

fn parse_block(line: &str) -> Result<(String, CoverageBlock)> {
    let mut parts = line.split_whitespace();
    let (Some(spec), Some(_num_stmts), Some(count), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        bail!("expected `file:range numStmts count`, found {:?}", line);
    };

    let Some((file, range)) = spec.rsplit_once(':') else {
        bail!("missing `:` between file name and range in {:?}", spec);
    };

    let Some((start, end)) = range.split_once(',') else {
        bail!("missing `,` between range endpoints in {:?}", range);
    };

    let hits: u64 = count
        .parse()
        .with_context(|| format!("invalid hit count {:?}", count))?;

    Ok((
        file.to_string(),
        CoverageBlock {
            range: CodeRange::new(parse_pos(start)?, parse_pos(end)?),
            hits,
        },
    ))
}

fn parse_pos(text: &str) -> Result<SourcePos> {
    let Some((line, col)) = text.split_once('.') else {
        bail!("expected `line.col` position, found {:?}", text);
    };
    let line: u32 = line
        .parse()
        .with_context(|| format!("invalid line number {:?}", text))?;
    let col: u32 = col
        .parse()
        .with_context(|| format!("invalid column number {:?}", text))?;
    if line == 0 {
        bail!("line numbers are 1-based, found {:?}", text);
    }
    Ok(SourcePos::new(line, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_mode_and_blocks() {
        let text = "mode: set\n\
                    example.com/m/rpn.go:10.25,12.3 2 1\n\
                    example.com/m/rpn.go:14.2,14.9 1 0\n";
        let profile = parse_profile(text).unwrap();
        assert_eq!(profile.mode, "set");
        let blocks = &profile.files["example.com/m/rpn.go"];
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].range.start, SourcePos::new(10, 25));
        assert_eq!(blocks[0].hits, 1);
        assert_eq!(blocks[1].hits, 0);
    }

    #[test]
    fn test_blocks_sorted_even_when_profile_is_not() {
        let text = "mode: count\n\
                    a.go:20.1,21.5 1 0\n\
                    a.go:3.1,4.5 1 7\n";
        let profile = parse_profile(text).unwrap();
        let blocks = &profile.files["a.go"];
        assert_eq!(blocks[0].range.start.line, 3);
        assert_eq!(blocks[1].range.start.line, 20);
    }

    #[test]
    fn test_groups_by_file() {
        let text = "mode: atomic\n\
                    a.go:1.1,2.2 1 0\n\
                    b.go:1.1,2.2 1 0\n\
                    a.go:5.1,6.2 1 3\n";
        let profile = parse_profile(text).unwrap();
        assert_eq!(profile.files.len(), 2);
        assert_eq!(profile.files["a.go"].len(), 2);
        assert_eq!(profile.files["b.go"].len(), 1);
    }

    #[test]
    fn test_file_name_is_text_before_last_colon() {
        let text = "mode: set\nc:/odd/path.go:1.1,2.2 1 0\n";
        let profile = parse_profile(text).unwrap();
        assert!(profile.files.contains_key("c:/odd/path.go"));
    }

    #[test]
    fn test_missing_header_is_an_error() {
        let err = parse_profile("a.go:1.1,2.2 1 0\n").unwrap_err();
        assert!(err.to_string().contains("mode"));
    }

    #[test]
    fn test_malformed_block_names_its_line() {
        let err = parse_profile("mode: set\na.go:1.1,2.2 1 0\nnonsense\n").unwrap_err();
        assert!(format!("{:#}", err).contains("line 3"));
    }

    #[test]
    fn test_zero_line_number_rejected() {
        let err = parse_profile("mode: set\na.go:0.1,2.2 1 0\n").unwrap_err();
        assert!(format!("{:#}", err).contains("1-based"));
    }
}
