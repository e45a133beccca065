use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The required "first choice" subject, which also selects the ranking track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FirstSubject {
    Physics,
    History,
}

/// Subjects that fill the two remaining slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionalSubject {
    Chemistry,
    Biology,
    Politics,
    Geography,
}

impl FirstSubject {
    pub const ALL: [FirstSubject; 2] = [FirstSubject::Physics, FirstSubject::History];

    pub fn code(self) -> &'static str {
        match self {
            FirstSubject::Physics => "physics",
            FirstSubject::History => "history",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FirstSubject::Physics => "物理",
            FirstSubject::History => "历史",
        }
    }

    /// Accepts the code ("physics") or the label ("物理")
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|subject| s.eq_ignore_ascii_case(subject.code()) || s == subject.label())
    }
}

impl OptionalSubject {
    pub const ALL: [OptionalSubject; 4] = [
        OptionalSubject::Chemistry,
        OptionalSubject::Biology,
        OptionalSubject::Politics,
        OptionalSubject::Geography,
    ];

    pub fn code(self) -> &'static str {
        match self {
            OptionalSubject::Chemistry => "chemistry",
            OptionalSubject::Biology => "biology",
            OptionalSubject::Politics => "politics",
            OptionalSubject::Geography => "geography",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OptionalSubject::Chemistry => "化学",
            OptionalSubject::Biology => "生物",
            OptionalSubject::Politics => "政治",
            OptionalSubject::Geography => "地理",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|subject| s.eq_ignore_ascii_case(subject.code()) || s == subject.label())
    }
}

impl fmt::Display for FirstSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for OptionalSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubjectError {
    #[error("unknown subject '{0}'")]
    Unknown(String),
    #[error("subject '{0}' selected more than once")]
    Duplicate(String),
    #[error("one of physics or history is required")]
    MissingFirst,
    #[error("only one of physics or history may be selected")]
    MultipleFirst,
    #[error("at most two optional subjects may be selected (got {0})")]
    TooManyOptional(usize),
}

/// One first subject plus up to two optional subjects
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectSelection {
    pub first: FirstSubject,
    pub optional: Vec<OptionalSubject>,
}

impl SubjectSelection {
    pub fn parse<S: AsRef<str>>(subjects: &[S]) -> Result<Self, SubjectError> {
        let mut first = None;
        let mut optional = Vec::new();

        for raw in subjects {
            let raw = raw.as_ref();
            if let Some(subject) = FirstSubject::parse(raw) {
                match first {
                    Some(existing) if existing == subject => {
                        return Err(SubjectError::Duplicate(raw.trim().to_string()))
                    }
                    Some(_) => return Err(SubjectError::MultipleFirst),
                    None => first = Some(subject),
                }
            } else if let Some(subject) = OptionalSubject::parse(raw) {
                if optional.contains(&subject) {
                    return Err(SubjectError::Duplicate(raw.trim().to_string()));
                }
                optional.push(subject);
            } else {
                return Err(SubjectError::Unknown(raw.trim().to_string()));
            }
        }

        let first = first.ok_or(SubjectError::MissingFirst)?;
        if optional.len() > 2 {
            return Err(SubjectError::TooManyOptional(optional.len()));
        }
        Ok(Self { first, optional })
    }

    /// Both optional slots are filled
    pub fn is_complete(&self) -> bool {
        self.optional.len() == 2
    }

    /// Labels in selection order, first subject leading
    pub fn labels(&self) -> Vec<&'static str> {
        std::iter::once(self.first.label())
            .chain(self.optional.iter().map(|s| s.label()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels() {
        let selection = SubjectSelection::parse(&["物理", "化学", "生物"]).unwrap();
        assert_eq!(selection.first, FirstSubject::Physics);
        assert_eq!(
            selection.optional,
            vec![OptionalSubject::Chemistry, OptionalSubject::Biology]
        );
        assert!(selection.is_complete());
    }

    #[test]
    fn test_parse_codes_any_order() {
        let selection = SubjectSelection::parse(&["geography", "History"]).unwrap();
        assert_eq!(selection.first, FirstSubject::History);
        assert!(!selection.is_complete());
        assert_eq!(selection.labels(), vec!["历史", "地理"]);
    }

    #[test]
    fn test_first_subject_required() {
        assert_eq!(
            SubjectSelection::parse(&["化学", "生物"]),
            Err(SubjectError::MissingFirst)
        );
        let empty: [&str; 0] = [];
        assert_eq!(SubjectSelection::parse(&empty), Err(SubjectError::MissingFirst));
    }

    #[test]
    fn test_only_one_first_subject() {
        assert_eq!(
            SubjectSelection::parse(&["物理", "历史"]),
            Err(SubjectError::MultipleFirst)
        );
    }

    #[test]
    fn test_too_many_optional() {
        assert_eq!(
            SubjectSelection::parse(&["物理", "化学", "生物", "地理"]),
            Err(SubjectError::TooManyOptional(3))
        );
    }

    #[test]
    fn test_duplicates_and_unknown() {
        assert_eq!(
            SubjectSelection::parse(&["物理", "化学", "化学"]),
            Err(SubjectError::Duplicate("化学".to_string()))
        );
        assert_eq!(
            SubjectSelection::parse(&["物理", "physics"]),
            Err(SubjectError::Duplicate("physics".to_string()))
        );
        assert_eq!(
            SubjectSelection::parse(&["物理", "art"]),
            Err(SubjectError::Unknown("art".to_string()))
        );
    }

    #[test]
    fn test_first_subject_codes() {
        assert_eq!(FirstSubject::parse("physics"), Some(FirstSubject::Physics));
        assert_eq!(FirstSubject::parse("历史"), Some(FirstSubject::History));
        assert_eq!(FirstSubject::parse("chemistry"), None);
        assert_eq!(FirstSubject::History.code(), "history");
    }
}
