/// Compute effective limit with precedence: local arg -> global flag.
///
/// `None` leaves the page size to `audit.default_limit`.
#[must_use]
pub fn effective_limit(local: Option<u32>, global: Option<u32>) -> Option<usize> {
    local
        .or(global)
        .map(|limit| usize::try_from(limit).unwrap_or(usize::MAX))
}

#[cfg(test)]
mod tests {
    use super::effective_limit;

    #[test]
    fn local_takes_precedence() {
        assert_eq!(effective_limit(Some(5), Some(10)), Some(5));
    }

    #[test]
    fn global_used_when_local_missing() {
        assert_eq!(effective_limit(None, Some(10)), Some(10));
    }

    #[test]
    fn none_when_neither_set() {
        assert_eq!(effective_limit(None, None), None);
    }
}
