use serde::Serialize;
use std::fmt;

/// Columns the user listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Id,
    Name,
    Email,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortKey::Id => "id",
            SortKey::Name => "name",
            SortKey::Email => "email",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        })
    }
}

/// A fully resolved sort order for the user listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortOrder {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortOrder {
    /// Resolves a caller-supplied (order_by, direction) pair. Only the six
    /// recognized combinations map to themselves; anything else falls back
    /// to id ascending. The fallback is deliberate and silent, not an error.
    pub fn parse(order_by: &str, direction: &str) -> SortOrder {
        let order_by = order_by.trim().to_ascii_lowercase();
        let direction = direction.trim().to_ascii_lowercase();

        let (key, direction) = match (order_by.as_str(), direction.as_str()) {
            ("id", "asc") => (SortKey::Id, SortDirection::Asc),
            ("id", "desc") => (SortKey::Id, SortDirection::Desc),
            ("name", "asc") => (SortKey::Name, SortDirection::Asc),
            ("name", "desc") => (SortKey::Name, SortDirection::Desc),
            ("email", "asc") => (SortKey::Email, SortDirection::Asc),
            ("email", "desc") => (SortKey::Email, SortDirection::Desc),
            _ => (SortKey::Id, SortDirection::Asc),
        };

        SortOrder { key, direction }
    }

    /// ORDER BY fragment for this sort order. Driven entirely by the enum so
    /// caller strings never reach the SQL text.
    pub fn sql(&self) -> &'static str {
        match (self.key, self.direction) {
            (SortKey::Id, SortDirection::Asc) => "id ASC",
            (SortKey::Id, SortDirection::Desc) => "id DESC",
            (SortKey::Name, SortDirection::Asc) => "name ASC",
            (SortKey::Name, SortDirection::Desc) => "name DESC",
            (SortKey::Email, SortDirection::Asc) => "email ASC",
            (SortKey::Email, SortDirection::Desc) => "email DESC",
        }
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder {
            key: SortKey::Id,
            direction: SortDirection::Asc,
        }
    }
}

/// One page of an ordered listing plus the totals needed to render
/// pagination controls. Never persisted; recomputed per query.
#[derive(Debug, Clone, Serialize)]
pub struct Paged<T> {
    pub data: Vec<T>,
    pub total_rows: i64,
    pub current_page: i64,
    pub page_size: i64,
    pub order_by: SortKey,
    pub direction: SortDirection,
}

impl<T> Paged<T> {
    pub fn total_pages(&self) -> i64 {
        if self.page_size <= 0 {
            return 0;
        }
        (self.total_rows + self.page_size - 1) / self.page_size
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_recognizes_all_six_pairs() {
        let order = SortOrder::parse("name", "desc");
        assert_eq!(order.key, SortKey::Name);
        assert_eq!(order.direction, SortDirection::Desc);
        assert_eq!(order.sql(), "name DESC");

        let order = SortOrder::parse("EMAIL", "Asc");
        assert_eq!(order.key, SortKey::Email);
        assert_eq!(order.direction, SortDirection::Asc);
    }

    #[test]
    fn parse_falls_back_to_id_ascending() {
        for (key, dir) in [
            ("rowid", "asc"),
            ("name", "sideways"),
            ("", ""),
            ("id", "descending"),
        ] {
            let order = SortOrder::parse(key, dir);
            assert_eq!(order, SortOrder::default(), "({key:?}, {dir:?})");
        }
    }

    #[test]
    fn paged_totals() {
        let paged = Paged::<i64> {
            data: vec![],
            total_rows: 7,
            current_page: 2,
            page_size: 3,
            order_by: SortKey::Id,
            direction: SortDirection::Asc,
        };
        assert_eq!(paged.total_pages(), 3);
        assert!(paged.has_prev());
        assert!(paged.has_next());
    }
}
