pub mod user_repo;
pub use user_repo::UserRepository;
pub mod client_repo;
pub use client_repo::ClientRepository;
pub mod invoice_repo;
pub use invoice_repo::InvoiceRepository;
