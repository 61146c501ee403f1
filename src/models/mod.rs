pub mod tender;

pub use tender::{Tender, TenderPayload, TenderQuery, Urgency};
