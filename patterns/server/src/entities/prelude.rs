pub use super::city::Entity as City;
pub use super::contact::Entity as Contact;
pub use super::country::Entity as Country;
pub use super::location::Entity as Location;
pub use super::product::Entity as Product;
pub use super::state::Entity as State;
pub use super::system_status::Entity as SystemStatus;
pub use super::task::Entity as Task;
