use validator::ValidationError;

pub const MAX_SKILL_LENGTH: usize = 50;

pub fn skill_list(skills: &[String]) -> Result<(), ValidationError> {
    if skills
        .iter()
        .any(|s| s.trim().is_empty() || s.chars().count() > MAX_SKILL_LENGTH)
    {
        return Err(ValidationError::new("invalid_skill"));
    }
    Ok(())
}

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skills_reject_blank_or_oversized_entries() {
        assert!(skill_list(&["rust".into(), "sql".into()]).is_ok());
        assert!(skill_list(&["rust".into(), " ".into()]).is_err());
        assert!(skill_list(&["x".repeat(51)]).is_err());
    }

    #[test]
    fn whitespace_is_blank() {
        assert!(not_blank(" \t").is_err());
        assert!(not_blank("Ada").is_ok());
    }
}
