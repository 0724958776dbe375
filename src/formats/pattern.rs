use crate::formats::ParserError;

/// A music pattern list: the ordered segment names a playback layer cycles
/// through. Stored as plain text, one segment per line, `;` starts a comment.
#[derive(Debug, Clone, Default)]
pub struct PatternList {
    pub name: String,
    pub segments: Vec<String>,
}

impl PatternList {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

pub fn parse_pattern_list(name: &str, data: &[u8]) -> Result<PatternList, ParserError> {
    let text = String::from_utf8(data.to_vec())?;
    let segments = text
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with(';'))
        .map(|line| line.to_string())
        .collect();

    Ok(PatternList {
        name: name.to_string(),
        segments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_blank_lines() -> Result<(), anyhow::Error> {
        let list = parse_pattern_list("TAVERN", b"; day rotation\nTAVERN_DAY_01.SGT\n\nTAVERN_DAY_02.SGT\n")?;
        assert_eq!(list.name, "TAVERN");
        assert_eq!(list.segments, ["TAVERN_DAY_01.SGT", "TAVERN_DAY_02.SGT"]);
        Ok(())
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert!(parse_pattern_list("X", &[0xFF, 0xFE, 0x00]).is_err());
    }
}
