use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "documents:read")]
    DocumentsRead,
    #[serde(rename = "documents:write")]
    DocumentsWrite,
    #[serde(rename = "documents:delete")]
    DocumentsDelete,
    #[serde(rename = "analytics:view")]
    AnalyticsView,
    #[serde(rename = "users:manage")]
    UsersManage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

impl Role {
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Editor => "Editor",
            Role::Viewer => "Viewer",
        }
    }

    pub fn default_permissions(&self) -> Vec<Permission> {
        match self {
            Role::Admin => vec![
                Permission::DocumentsRead,
                Permission::DocumentsWrite,
                Permission::DocumentsDelete,
                Permission::AnalyticsView,
                Permission::UsersManage,
            ],
            Role::Editor => vec![
                Permission::DocumentsRead,
                Permission::DocumentsWrite,
                Permission::AnalyticsView,
            ],
            Role::Viewer => vec![Permission::DocumentsRead],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub permissions: Vec<Permission>,
}

impl User {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display_name_and_wire_name_differ() {
        assert_eq!(Role::Admin.display_name(), "Administrator");
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(Role::Viewer.display_name(), "Viewer");
    }
}
