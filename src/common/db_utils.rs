// src/common/db_utils.rs

// ---
// Helpers para classificar erros do Postgres nos repositórios
// ---

/// `true` quando o erro é uma violação de UNIQUE.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}

/// `true` quando o erro é uma violação de FOREIGN KEY.
/// Se `constraint_hint` vier, o nome da constraint precisa contê-lo.
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error, constraint_hint: Option<&str>) -> bool {
    match err.as_database_error() {
        Some(db_err) if db_err.is_foreign_key_violation() => match constraint_hint {
            Some(hint) => db_err.constraint().map(|c| c.contains(hint)).unwrap_or(false),
            None => true,
        },
        _ => false,
    }
}
