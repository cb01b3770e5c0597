pub mod prelude;

pub mod files;
pub mod local_files;
pub mod remote_files;
pub mod sessions;

pub mod cases;
pub mod interventions;
pub mod invoices;
pub mod offers;
pub mod orders;
