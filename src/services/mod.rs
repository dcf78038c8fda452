pub mod bootstrap;
pub mod resource_locator;

pub use resource_locator::{find_lxc, find_resource, find_vm, locate, ResourceError, ResourceFilter};
