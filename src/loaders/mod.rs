//! Leaf stages that seed the model from raw plan resources: the resource
//! mapper plus the specialized loaders for security groups, launch templates
//! and plan variables.

pub mod launch_templates;
pub mod mapper;
pub mod security_groups;
pub mod variables;

pub use launch_templates::LaunchTemplatesLoader;
pub use mapper::ResourceMapper;
pub use security_groups::SecurityGroupsLoader;
pub use variables::VariablesLoader;

/// Resource types owned by the security groups loader. The mapper never
/// materializes these as components.
pub const SECURITY_GROUP_TYPES: &[&str] = &["aws_security_group"];

pub const LAUNCH_TEMPLATE_TYPES: &[&str] = &["aws_launch_template"];

pub fn is_security_group_type(resource_type: &str) -> bool {
    SECURITY_GROUP_TYPES.contains(&resource_type)
}

pub fn is_launch_template_type(resource_type: &str) -> bool {
    LAUNCH_TEMPLATE_TYPES.contains(&resource_type)
}
