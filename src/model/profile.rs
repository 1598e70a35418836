use serde::{Deserialize, Serialize};

/// Employee profile. One per user, overwritten wholesale on save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub emp_id: String,
    pub name: String,
    pub email: String,
    pub department: String,
}

impl Profile {
    /// True when nothing has been filled in yet (first login).
    pub fn is_blank(&self) -> bool {
        self.emp_id.is_empty()
            && self.name.is_empty()
            && self.email.is_empty()
            && self.department.is_empty()
    }
}
