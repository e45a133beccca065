use super::subjects::SubjectSelection;
use super::types::UniversityQuery;

/// Check a university query before it reaches the backend.
/// Returns all validation errors at once (not just the first).
pub fn validate_university_query(query: &UniversityQuery) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if query.province.trim().is_empty() {
        errors.push("province: required".to_string());
    }

    // A score or a rank is needed to place the student
    if !query.score.is_finite() || query.score < 0.0 {
        errors.push(format!("score: must be a non-negative number, got {}", query.score));
    } else if query.score == 0.0 && query.rank.is_none() {
        errors.push("score: a positive score or a rank is required".to_string());
    }
    if query.rank == Some(0) {
        errors.push("rank: must be positive".to_string());
    }

    // Three subjects: physics or history plus two optional ones
    match SubjectSelection::parse(&query.subjects) {
        Ok(selection) if !selection.is_complete() => {
            errors.push(format!(
                "subjects: exactly three subjects are required, got {}",
                query.subjects.len()
            ));
        }
        Ok(_) => {}
        Err(e) => errors.push(format!("subjects: {}", e)),
    }

    for (name, value) in [("minScore", query.min_score), ("maxScore", query.max_score)] {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                errors.push(format!("{}: must be a non-negative number, got {}", name, v));
            }
        }
    }
    if let (Some(min), Some(max)) = (query.min_score, query.max_score) {
        if min > max {
            errors.push(format!(
                "minScore: must not exceed maxScore ({} > {})",
                min, max
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
