/// How the items of a requirement combine.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum Logical {
    #[default]
    And,
    Or,
}

/// Permission codes and roles a handler demands. Empty lists always pass.
#[derive(Debug, Clone, Default)]
pub struct Requirement {
    pub permissions: Vec<String>,
    pub permission_logical: Logical,
    pub roles: Vec<String>,
    pub role_logical: Logical,
}

impl Requirement {
    pub fn permissions<I, S>(logical: Logical, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Requirement {
            permissions: items.into_iter().map(Into::into).collect(),
            permission_logical: logical,
            ..Default::default()
        }
    }

    pub fn roles<I, S>(logical: Logical, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Requirement {
            roles: items.into_iter().map(Into::into).collect(),
            role_logical: logical,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty() && self.roles.is_empty()
    }
}
