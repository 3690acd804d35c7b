use uuid::Uuid;

/// Generates a fresh snippet id: 32 lowercase hex characters from a random v4 UUID.
pub fn generate_snippet_id() -> String {
    Uuid::new_v4().simple().to_string()
}
