use std::fmt;

/// The wire-visible kind string on a vertex or edge (§6). These strings must
/// stay bit-exact with the rest of the ecosystem — never derive them, always
/// spell them out.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    ComponentType,
    ComponentVersion,
    Component,
    PropertyType,
    Property,
    FlagType,
    FlagSeverity,
    Flag,
    Permission,
    UserGroup,
    User,

    RelComponentType,
    RelVersion,
    RelVersionAllowedType,
    RelProperty,
    RelPropertyType,
    RelPropertyAllowedType,
    RelConnection,
    RelSubcomponent,
    RelFlagComponent,
    RelFlagType,
    RelFlagSeverity,
    RelUserGroup,
    RelGroupPermission,
}

impl Category {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ComponentType => "component_type",
            Self::ComponentVersion => "component_version",
            Self::Component => "component",
            Self::PropertyType => "property_type",
            Self::Property => "property",
            Self::FlagType => "flag_type",
            Self::FlagSeverity => "flag_severity",
            Self::Flag => "flag",
            Self::Permission => "permission",
            Self::UserGroup => "user_group",
            Self::User => "user",

            Self::RelComponentType => "rel_component_type",
            Self::RelVersion => "rel_version",
            Self::RelVersionAllowedType => "rel_version_allowed_type",
            Self::RelProperty => "rel_property",
            Self::RelPropertyType => "rel_property_type",
            Self::RelPropertyAllowedType => "rel_property_allowed_type",
            Self::RelConnection => "rel_connection",
            Self::RelSubcomponent => "rel_subcomponent",
            Self::RelFlagComponent => "rel_flag_component",
            Self::RelFlagType => "rel_flag_type",
            Self::RelFlagSeverity => "rel_flag_severity",
            Self::RelUserGroup => "rel_user_group",
            Self::RelGroupPermission => "rel_group_permission",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

impl AsRef<str> for Category {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_strings_are_bit_exact() {
        assert_eq!(Category::Component.as_str(), "component");
        assert_eq!(Category::RelSubcomponent.as_str(), "rel_subcomponent");
        assert_eq!(Category::RelFlagSeverity.as_str(), "rel_flag_severity");
    }
}
