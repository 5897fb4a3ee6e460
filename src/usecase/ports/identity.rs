/// The operator as reported by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
    pub is_authenticated: bool,
}

impl Principal {
    pub fn authenticated(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_authenticated: true,
        }
    }
}

pub trait IdentityProvider: Send + Sync {
    /// `None` while nobody has logged in.
    fn current_principal(&self) -> Option<Principal>;
}
