// handlers/protected/mod.rs - Protected handlers (bearer session required)
//
// Every route here runs behind `require_session`, which places the
// resolved `User` in request extensions.

pub mod items;
pub mod lxc;
pub mod resources;
pub mod session;
pub mod vm;

pub use items::{create_item, delete_item, read_item, read_items, update_item};
pub use lxc::lxc_terminal;
pub use resources::{get_resource, list_nodes, list_resources, resource_action};
pub use session::{read_user_me, test_token};
pub use vm::{vm_console, ConsoleInfo};
