pub use sea_orm_migration::prelude::*;

mod m20251016_000001_create_locality_tables;
mod m20251016_000002_create_tasks_table;
mod m20251016_000003_create_contacts_table;
mod m20251016_000004_create_products_table;
mod m20251016_000005_create_system_statuses_table;
mod m20251016_000006_create_locations_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251016_000001_create_locality_tables::Migration),
            Box::new(m20251016_000002_create_tasks_table::Migration),
            Box::new(m20251016_000003_create_contacts_table::Migration),
            Box::new(m20251016_000004_create_products_table::Migration),
            Box::new(m20251016_000005_create_system_statuses_table::Migration),
            Box::new(m20251016_000006_create_locations_table::Migration),
        ]
    }
}
