pub mod prelude;

pub mod city;
pub mod contact;
pub mod country;
pub mod location;
pub mod product;
pub mod sea_orm_active_enums;
pub mod state;
pub mod system_status;
pub mod task;
