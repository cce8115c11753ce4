//! Ordering of query results.

/// Sort direction for ordering results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Ascending order (A-Z, 0-9).
    #[default]
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

/// Ordering on a single field, rendered as the `orderby` parameter.
///
/// Descending order prefixes the field with `-`.
///
/// # Example
///
/// ```
/// use fortify_lib::api::query::OrderBy;
///
/// assert_eq!(OrderBy::asc("name").to_param(), "name");
/// assert_eq!(OrderBy::desc("creationDate").to_param(), "-creationDate");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    field: String,
    direction: Direction,
}

impl OrderBy {
    /// Creates an ordering on a field.
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Creates an ascending order on a field.
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, Direction::Asc)
    }

    /// Creates a descending order on a field.
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, Direction::Desc)
    }

    /// Returns the field name.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Renders the `orderby` parameter value.
    pub fn to_param(&self) -> String {
        match self.direction {
            Direction::Asc => self.field.clone(),
            Direction::Desc => format!("-{}", self.field),
        }
    }
}
