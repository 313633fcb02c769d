//! Field-level format checks shared by the create/edit modals. These run
//! before anything reaches the network.

pub fn is_valid_dni(dni: &str) -> bool {
    dni.len() == 8 && dni.chars().all(|c| c.is_ascii_digit())
}

/// Accepts `local@domain` where the domain has at least one dot-separated
/// segment on each side.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    domain.split('.').count() >= 2 && domain.split('.').all(|part| !part.is_empty())
}

pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= 6
}

pub fn required(value: &str) -> bool {
    !value.trim().is_empty()
}
