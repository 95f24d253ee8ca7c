/// Correlation id attached to one ingestion request and every delivery it
/// fans out to.
pub fn new_correlation_id() -> String {
    format!("corr-{}", uuid::Uuid::new_v4())
}

pub fn new_dead_letter_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_ids_are_unique() {
        assert_ne!(new_correlation_id(), new_correlation_id());
    }

    #[test]
    fn correlation_id_has_prefix() {
        assert!(new_correlation_id().starts_with("corr-"));
    }
}
