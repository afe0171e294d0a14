use serde::Serialize;

use crate::validation::Validator;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 50;

/// Pagination block returned alongside every job listing page.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current: i64,
    pub total: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Computes the pagination block for a page of `limit` items out of `total`
/// matches. `total` pages is ceil(total / limit).
pub fn paginate(page: i64, limit: i64, total: i64) -> Pagination {
    Pagination {
        current: page,
        total: (total + limit - 1) / limit,
        has_next: page * limit < total,
        has_prev: page > 1,
    }
}

/// Parses optional raw `page`/`limit` query values, collecting failures into
/// the validator. Defaults: page 1, limit 10; limit capped at 50.
pub fn parse_page_params(
    v: &mut Validator,
    page: Option<&str>,
    limit: Option<&str>,
) -> (i64, i64) {
    let page = match page {
        None => 1,
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) if n >= 1 => n,
            _ => {
                v.error("page", "page must be a positive integer");
                1
            }
        },
    };
    let limit = match limit {
        None => DEFAULT_LIMIT,
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) if (1..=MAX_LIMIT).contains(&n) => n,
            _ => {
                v.error("limit", &format!("limit must be between 1 and {MAX_LIMIT}"));
                DEFAULT_LIMIT
            }
        },
    };
    (page, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twelve_jobs_page_two_limit_five() {
        let p = paginate(2, 5, 12);
        assert_eq!(p.current, 2);
        assert_eq!(p.total, 3);
        assert!(p.has_next);
        assert!(p.has_prev);
    }

    #[test]
    fn test_first_page() {
        let p = paginate(1, 10, 25);
        assert_eq!(p.total, 3);
        assert!(p.has_next);
        assert!(!p.has_prev);
    }

    #[test]
    fn test_last_page() {
        let p = paginate(3, 10, 25);
        assert!(!p.has_next);
        assert!(p.has_prev);
    }

    #[test]
    fn test_zero_matches() {
        let p = paginate(1, 10, 0);
        assert_eq!(p.total, 0);
        assert!(!p.has_next);
        assert!(!p.has_prev);
    }

    #[test]
    fn test_exact_multiple() {
        let p = paginate(2, 5, 10);
        assert_eq!(p.total, 2);
        assert!(!p.has_next);
    }

    #[test]
    fn test_parse_defaults() {
        let mut v = Validator::new();
        assert_eq!(parse_page_params(&mut v, None, None), (1, DEFAULT_LIMIT));
        assert!(v.is_empty());
    }

    #[test]
    fn test_parse_valid_values() {
        let mut v = Validator::new();
        assert_eq!(parse_page_params(&mut v, Some("3"), Some("25")), (3, 25));
        assert!(v.is_empty());
    }

    #[test]
    fn test_parse_rejects_zero_page() {
        let mut v = Validator::new();
        parse_page_params(&mut v, Some("0"), None);
        assert!(!v.is_empty());
    }

    #[test]
    fn test_parse_rejects_limit_over_cap() {
        let mut v = Validator::new();
        parse_page_params(&mut v, None, Some("51"));
        assert!(!v.is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let mut v = Validator::new();
        parse_page_params(&mut v, Some("abc"), Some("ten"));
        assert_eq!(v.is_empty(), false);
    }

    #[test]
    fn test_pagination_serializes_camel_case() {
        let p = paginate(1, 10, 0);
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("hasNext").is_some());
        assert!(json.get("hasPrev").is_some());
    }
}
