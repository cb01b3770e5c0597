pub use super::cases::Entity as Cases;
pub use super::files::Entity as Files;
pub use super::interventions::Entity as Interventions;
pub use super::invoices::Entity as Invoices;
pub use super::local_files::Entity as LocalFiles;
pub use super::offers::Entity as Offers;
pub use super::orders::Entity as Orders;
pub use super::remote_files::Entity as RemoteFiles;
pub use super::sessions::Entity as Sessions;
