use crate::error::SdbLockError;

pub fn get_exit_code(error: &SdbLockError) -> i32 {
    match error {
        SdbLockError::InvalidResourceName(_)
        | SdbLockError::InvalidAttribute(_)
        | SdbLockError::InvalidDomainName(_) => 2,

        SdbLockError::DomainNotFound(_) => 3,

        SdbLockError::Io(_) | SdbLockError::Json(_) | SdbLockError::Store { .. } => 74,

        SdbLockError::ResourceBusy(_) => 75, // EX_TEMPFAIL: try again later

        SdbLockError::ConfigError(_) | SdbLockError::InvalidConfig(_) => 78,

        _ => 1,
    }
}
