use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Navigation entry kind as rendered by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum NavKind {
    Link,
    Group,
    Settings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct NavItem {
    pub label: String,
    pub href: String,
    pub icon: String,
    pub kind: NavKind,
    /// Nested entries, only meaningful for `NavKind::Group`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NavItem>,
    /// Roles allowed to see this entry; `None` means visible to everyone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_category: Option<String>,
}

impl NavItem {
    pub fn link(label: impl Into<String>, href: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: href.into(),
            icon: icon.into(),
            kind: NavKind::Link,
            children: Vec::new(),
            roles: None,
            settings_category: None,
        }
    }
}

/// What a module announces about itself when it registers with the host.
///
/// `module_name` is the registry key; re-registering under the same name
/// replaces the previous announcement wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ModuleInfo {
    #[schema(example = "Faktura")]
    pub module_name: String,
    #[schema(example = "Rechnungen")]
    pub display_name: String,
    pub version: String,
    pub logo_url: String,
    pub health_check_url: String,
    #[serde(default)]
    pub navigation_items: Vec<NavItem>,
}

impl ModuleInfo {
    pub fn new(
        module_name: impl Into<String>,
        display_name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            module_name: module_name.into(),
            display_name: display_name.into(),
            version: version.into(),
            logo_url: String::new(),
            health_check_url: String::new(),
            navigation_items: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ModuleInfo {
        ModuleInfo {
            module_name: "Faktura".to_string(),
            display_name: "Rechnungen".to_string(),
            version: "1.4.2".to_string(),
            logo_url: "/faktura/logo.svg".to_string(),
            health_check_url: "/faktura/health".to_string(),
            navigation_items: vec![
                NavItem {
                    label: "Rechnungen".to_string(),
                    href: "/faktura".to_string(),
                    icon: "invoice".to_string(),
                    kind: NavKind::Group,
                    children: vec![NavItem {
                        label: "Entwürfe".to_string(),
                        href: "/faktura/drafts".to_string(),
                        icon: "draft".to_string(),
                        kind: NavKind::Link,
                        children: Vec::new(),
                        roles: Some(vec!["Admin".to_string(), "Buchhaltung".to_string()]),
                        settings_category: None,
                    }],
                    roles: None,
                    settings_category: None,
                },
                NavItem {
                    label: "Nummernkreise".to_string(),
                    href: "/faktura/settings".to_string(),
                    icon: "gear".to_string(),
                    kind: NavKind::Settings,
                    children: Vec::new(),
                    roles: Some(vec!["Admin".to_string()]),
                    settings_category: Some("Faktura".to_string()),
                },
            ],
        }
    }

    #[test]
    fn registration_payload_round_trips() {
        let info = sample();
        let json = serde_json::to_string(&info).unwrap();
        let back: ModuleInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(info, back);
    }

    #[test]
    fn payload_uses_pascal_case_keys() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("ModuleName").is_some());
        assert!(json.get("HealthCheckUrl").is_some());
        let nav = &json["NavigationItems"][0];
        assert_eq!(nav["Kind"], "Group");
        assert_eq!(nav["Children"][0]["Roles"][1], "Buchhaltung");
    }

    #[test]
    fn missing_navigation_defaults_to_empty() {
        let json = r#"{
            "ModuleName": "Belege",
            "DisplayName": "Belege",
            "Version": "0.9.0",
            "LogoUrl": "",
            "HealthCheckUrl": "/belege/health"
        }"#;
        let info: ModuleInfo = serde_json::from_str(json).unwrap();
        assert!(info.navigation_items.is_empty());
    }
}
